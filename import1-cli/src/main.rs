//! CLI for the systemd-importd image transfer manager.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod image;
mod transfer;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use import1::{Manager, Session, SystemBus};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(
    name = "importctl",
    version,
    about = "Import, export and download machine images through systemd-importd"
)]
struct Cli {
    /// D-Bus address of the system bus (default: $DBUS_SYSTEM_BUS_ADDRESS).
    #[arg(long, global = true, env = "IMPORTCTL_BUS_ADDRESS")]
    address: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a tarball as a container image.
    ImportTar(image::ImportArgs),

    /// Import a raw disk image.
    ImportRaw(image::ImportArgs),

    /// Import a directory tree.
    #[command(name = "import-fs")]
    ImportFs(image::ImportArgs),

    /// Export an image as a tarball.
    ExportTar(image::ExportArgs),

    /// Export an image as a raw disk image.
    ExportRaw(image::ExportArgs),

    /// Download a tarball and import it.
    PullTar(image::PullArgs),

    /// Download a raw disk image and import it.
    PullRaw(image::PullArgs),

    /// List running transfers.
    #[command(visible_alias = "ls")]
    List(transfer::ListArgs),

    /// Cancel one or more transfers.
    Cancel(transfer::CancelArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for transfer handles and listings.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("importctl: {e:#}");
        std::process::exit(1);
    }
}

/// Logs to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        let Self {
            address,
            format,
            command,
            ..
        } = self;
        let address = address.as_deref();
        match command {
            Command::ImportTar(args) => image::import_tar(&connect(address)?, &args, format),
            Command::ImportRaw(args) => image::import_raw(&connect(address)?, &args, format),
            Command::ImportFs(args) => image::import_fs(&connect(address)?, &args, format),
            Command::ExportTar(args) => image::export_tar(&connect(address)?, &args, format),
            Command::ExportRaw(args) => image::export_raw(&connect(address)?, &args, format),
            Command::PullTar(args) => image::pull_tar(&connect(address)?, &args, format),
            Command::PullRaw(args) => image::pull_raw(&connect(address)?, &args, format),
            Command::List(args) => transfer::list(&connect(address)?, &args, format),
            Command::Cancel(args) => transfer::cancel(&connect(address)?, &args),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "importctl", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}

/// Opens a manager session on `address`, or on the system bus from the environment.
fn connect(address: Option<&str>) -> Result<Manager> {
    let bus = address.map_or_else(SystemBus::from_env, SystemBus::new);
    tracing::debug!(address = bus.address(), "connecting");
    let session = Session::connect_with(&bus)
        .with_context(|| format!("cannot connect to {}", bus.address()))?;
    Ok(Manager::new(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "importctl",
            "pull-raw",
            "https://example.com/img.raw.xz",
            "--format",
            "json",
            "-vv",
            "--address",
            "unix:path=/tmp/bus",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.address.as_deref(), Some("unix:path=/tmp/bus"));
        assert!(matches!(cli.command, Command::PullRaw(_)));
    }
}
