//! Transfer-starting commands: import, export, pull.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use import1::{Manager, Transfer};

use crate::OutputFormat;

/// Arguments for `importctl import-{tar,raw,fs}`.
#[derive(clap::Args)]
pub struct ImportArgs {
    /// File (or directory, for import-fs) to import.
    pub file: PathBuf,

    /// Local image name (default: derived from the file name).
    pub name: Option<String>,

    /// Replace an existing image with the same name.
    #[arg(long)]
    pub force: bool,

    /// Mark the imported image read-only.
    #[arg(long)]
    pub read_only: bool,
}

/// Arguments for `importctl export-{tar,raw}`.
#[derive(clap::Args)]
pub struct ExportArgs {
    /// Local image to export.
    pub name: String,

    /// Destination file, created or truncated.
    pub file: PathBuf,

    /// Compression (default: guessed from the file extension).
    #[arg(long, value_enum)]
    pub compress: Option<Compression>,
}

/// Arguments for `importctl pull-{tar,raw}`.
#[derive(clap::Args)]
pub struct PullArgs {
    /// URL to download from.
    pub url: String,

    /// Local image name (default: derived from the URL).
    pub name: Option<String>,

    /// Verification applied to the download.
    #[arg(long, value_enum, default_value = "signature")]
    pub verify: Verify,

    /// Replace an existing image with the same name.
    #[arg(long)]
    pub force: bool,
}

/// Download verification mode understood by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Verify {
    /// No verification.
    No,
    /// Verify the SHA256SUMS checksum only.
    Checksum,
    /// Verify the checksum and its GPG signature.
    Signature,
}

impl Verify {
    const fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Checksum => "checksum",
            Self::Signature => "signature",
        }
    }
}

/// Compression of an exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Compression {
    /// Uncompressed output.
    None,
    /// xz.
    Xz,
    /// gzip.
    Gzip,
    /// bzip2.
    Bzip2,
}

impl Compression {
    /// Guesses the compression from a file extension.
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xz") => Self::Xz,
            Some("gz") => Self::Gzip,
            Some("bz2") => Self::Bzip2,
            _ => Self::None,
        }
    }

    /// Format string sent to the manager.
    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Xz => "xz",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }
}

/// Suffixes stripped when deriving an image name.
const SUFFIXES: &[&str] = &[
    ".xz", ".gz", ".bz2", ".zst", ".tar", ".raw", ".qcow2", ".img", ".nspawn",
];

/// Derives an image name from a path or URL.
///
/// - `/var/tmp/fedora-40.tar.xz` → `fedora-40`
/// - `https://example.com/images/base.raw?dl=1` → `base`
fn derive_name(source: &str) -> Option<String> {
    let source = source.split(['?', '#']).next().unwrap_or(source);
    let mut name = source.rsplit('/').find(|s| !s.is_empty())?;
    while let Some(stripped) = SUFFIXES.iter().find_map(|s| name.strip_suffix(s)) {
        name = stripped;
    }
    (!name.is_empty()).then(|| name.to_owned())
}

fn local_name(explicit: Option<&String>, source: &str) -> Result<String> {
    match explicit {
        Some(name) => Ok(name.clone()),
        None => derive_name(source)
            .with_context(|| format!("cannot derive an image name from {source:?}, pass one explicitly")),
    }
}

fn print_transfer(transfer: &Transfer, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(transfer)?);
    } else {
        println!("{} {}", transfer.id, transfer.path);
    }
    Ok(())
}

fn open_source(args: &ImportArgs) -> Result<(File, String)> {
    let file = File::open(&args.file).with_context(|| format!("open {}", args.file.display()))?;
    let name = local_name(args.name.as_ref(), &args.file.to_string_lossy())?;
    Ok((file, name))
}

pub fn import_tar(manager: &Manager, args: &ImportArgs, format: OutputFormat) -> Result<()> {
    let (file, name) = open_source(args)?;
    let transfer = manager.import_tar(&file, &name, args.force, args.read_only)?;
    print_transfer(&transfer, format)
}

pub fn import_raw(manager: &Manager, args: &ImportArgs, format: OutputFormat) -> Result<()> {
    let (file, name) = open_source(args)?;
    let transfer = manager.import_raw(&file, &name, args.force, args.read_only)?;
    print_transfer(&transfer, format)
}

pub fn import_fs(manager: &Manager, args: &ImportArgs, format: OutputFormat) -> Result<()> {
    let (dir, name) = open_source(args)?;
    let transfer = manager.import_file_system(&dir, &name, args.force, args.read_only)?;
    print_transfer(&transfer, format)
}

fn open_destination(args: &ExportArgs) -> Result<(File, Compression)> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&args.file)
        .with_context(|| format!("create {}", args.file.display()))?;
    let compress = args
        .compress
        .unwrap_or_else(|| Compression::from_path(&args.file));
    Ok((file, compress))
}

pub fn export_tar(manager: &Manager, args: &ExportArgs, format: OutputFormat) -> Result<()> {
    let (file, compress) = open_destination(args)?;
    let transfer = manager.export_tar(&args.name, &file, compress.as_str())?;
    print_transfer(&transfer, format)
}

pub fn export_raw(manager: &Manager, args: &ExportArgs, format: OutputFormat) -> Result<()> {
    let (file, compress) = open_destination(args)?;
    let transfer = manager.export_raw(&args.name, &file, compress.as_str())?;
    print_transfer(&transfer, format)
}

pub fn pull_tar(manager: &Manager, args: &PullArgs, format: OutputFormat) -> Result<()> {
    let name = local_name(args.name.as_ref(), &args.url)?;
    let transfer = manager.pull_tar(&args.url, &name, args.verify.as_str(), args.force)?;
    print_transfer(&transfer, format)
}

pub fn pull_raw(manager: &Manager, args: &PullArgs, format: OutputFormat) -> Result<()> {
    let name = local_name(args.name.as_ref(), &args.url)?;
    let transfer = manager.pull_raw(&args.url, &name, args.verify.as_str(), args.force)?;
    print_transfer(&transfer, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_paths_and_urls() {
        assert_eq!(derive_name("/var/tmp/fedora-40.tar.xz").as_deref(), Some("fedora-40"));
        assert_eq!(
            derive_name("https://example.com/images/base.raw?dl=1").as_deref(),
            Some("base")
        );
        assert_eq!(derive_name("https://example.com/images/rootfs/").as_deref(), Some("rootfs"));
        assert_eq!(derive_name("debian.qcow2").as_deref(), Some("debian"));
    }

    #[test]
    fn underivable_names() {
        assert_eq!(derive_name("/"), None);
        assert_eq!(derive_name(".tar.gz"), None);
        assert!(local_name(None, "/").is_err());
        assert_eq!(local_name(Some(&"x".to_owned()), "/").unwrap(), "x");
    }

    #[test]
    fn compression_from_extension() {
        assert_eq!(Compression::from_path(Path::new("out.tar.xz")), Compression::Xz);
        assert_eq!(Compression::from_path(Path::new("out.raw.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("out.tar.bz2")), Compression::Bzip2);
        assert_eq!(Compression::from_path(Path::new("out.tar")), Compression::None);
        assert_eq!(Compression::None.as_str(), "");
    }

    #[test]
    fn verify_modes_match_manager_strings() {
        assert_eq!(Verify::No.as_str(), "no");
        assert_eq!(Verify::Checksum.as_str(), "checksum");
        assert_eq!(Verify::Signature.as_str(), "signature");
    }
}
