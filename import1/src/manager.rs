//! Typed operations on the `org.freedesktop.import1.Manager` interface.

use std::os::fd::{AsFd, BorrowedFd};

use import1_proto::{Arg, Method, Reply};
use tracing::debug;

use crate::bus::Connection;
use crate::error::Result;
use crate::session::Session;
use crate::system::SystemConnection;
use crate::transfer::{Transfer, TransferInfo};

/// Client for the image transfer manager.
///
/// Import and export calls take a descriptor the caller already opened;
/// the manager reads or writes through it instead of opening a path
/// itself. The descriptor is only borrowed for the duration of the call.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// let manager = import1::Manager::connect()?;
/// let image = File::open("/var/tmp/fedora.tar.xz")?;
/// let transfer = manager.import_tar(&image, "fedora", false, true)?;
/// println!("transfer {} at {}", transfer.id, transfer.path);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Manager<C: Connection = SystemConnection> {
    /// Session every manager call goes through.
    session: Session<C>,
}

impl Manager {
    /// Opens a session on the system bus and wraps it.
    pub fn connect() -> Result<Self> {
        Session::connect().map(Self::new)
    }
}

impl<C: Connection> Manager<C> {
    /// Wraps an established session.
    pub fn new(session: Session<C>) -> Self {
        Self { session }
    }

    /// Returns the underlying session.
    pub const fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Imports a tarball read from `fd` as `local_name`.
    ///
    /// `force` replaces an existing image of the same name; `read_only`
    /// marks the new image immutable.
    pub fn import_tar(
        &self,
        fd: impl AsFd,
        local_name: &str,
        force: bool,
        read_only: bool,
    ) -> Result<Transfer> {
        self.import(Method::ImportTar, fd.as_fd(), local_name, force, read_only)
    }

    /// Imports a raw disk image read from `fd` as `local_name`.
    pub fn import_raw(
        &self,
        fd: impl AsFd,
        local_name: &str,
        force: bool,
        read_only: bool,
    ) -> Result<Transfer> {
        self.import(Method::ImportRaw, fd.as_fd(), local_name, force, read_only)
    }

    /// Imports the directory tree behind the directory descriptor `fd`.
    pub fn import_file_system(
        &self,
        fd: impl AsFd,
        local_name: &str,
        force: bool,
        read_only: bool,
    ) -> Result<Transfer> {
        self.import(Method::ImportFileSystem, fd.as_fd(), local_name, force, read_only)
    }

    /// Exports `local_name` as a tarball written to `fd`.
    ///
    /// `format` selects the compression (`""`, `"xz"`, `"gzip"`, `"bzip2"`)
    /// and is forwarded without validation.
    pub fn export_tar(&self, local_name: &str, fd: impl AsFd, format: &str) -> Result<Transfer> {
        self.export(Method::ExportTar, local_name, fd.as_fd(), format)
    }

    /// Exports `local_name` as a raw disk image written to `fd`.
    pub fn export_raw(&self, local_name: &str, fd: impl AsFd, format: &str) -> Result<Transfer> {
        self.export(Method::ExportRaw, local_name, fd.as_fd(), format)
    }

    /// Downloads a tarball from `url` into `local_name`.
    ///
    /// `verify_mode` (`"no"`, `"checksum"`, `"signature"`) is interpreted by
    /// the manager only.
    pub fn pull_tar(
        &self,
        url: &str,
        local_name: &str,
        verify_mode: &str,
        force: bool,
    ) -> Result<Transfer> {
        self.pull(Method::PullTar, url, local_name, verify_mode, force)
    }

    /// Downloads a raw disk image from `url` into `local_name`.
    pub fn pull_raw(
        &self,
        url: &str,
        local_name: &str,
        verify_mode: &str,
        force: bool,
    ) -> Result<Transfer> {
        self.pull(Method::PullRaw, url, local_name, verify_mode, force)
    }

    /// Returns the raw `ListTransfers` reply, undecoded.
    pub fn list_transfers(&self) -> Result<Reply> {
        self.session.call(Method::ListTransfers.as_str(), &[])
    }

    /// Lists current transfers, decoded from the `a(usssdo)` reply.
    pub fn transfers(&self) -> Result<Vec<TransferInfo>> {
        Ok(TransferInfo::decode_list(&self.list_transfers()?)?)
    }

    /// Cancels transfer `id`. Whatever the manager replies with is ignored.
    pub fn cancel_transfer(&self, id: u32) -> Result<()> {
        self.session
            .call(Method::CancelTransfer.as_str(), &[Arg::U32(id)])
            .map(drop)
    }

    /// Sends `(fd, local_name, force, read_only)`.
    fn import(
        &self,
        method: Method,
        fd: BorrowedFd<'_>,
        local_name: &str,
        force: bool,
        read_only: bool,
    ) -> Result<Transfer> {
        self.transfer(
            method,
            &[
                Arg::Fd(fd),
                Arg::Str(local_name),
                Arg::Bool(force),
                Arg::Bool(read_only),
            ],
        )
    }

    /// Sends `(local_name, fd, format)`.
    fn export(
        &self,
        method: Method,
        local_name: &str,
        fd: BorrowedFd<'_>,
        format: &str,
    ) -> Result<Transfer> {
        self.transfer(
            method,
            &[Arg::Str(local_name), Arg::Fd(fd), Arg::Str(format)],
        )
    }

    /// Sends `(url, local_name, verify_mode, force)`.
    fn pull(
        &self,
        method: Method,
        url: &str,
        local_name: &str,
        verify_mode: &str,
        force: bool,
    ) -> Result<Transfer> {
        self.transfer(
            method,
            &[
                Arg::Str(url),
                Arg::Str(local_name),
                Arg::Str(verify_mode),
                Arg::Bool(force),
            ],
        )
    }

    /// Invokes a transfer-initiating `method` and decodes its `(id, path)`.
    fn transfer(&self, method: Method, args: &[Arg<'_>]) -> Result<Transfer> {
        let reply = self.session.call(method.as_str(), args)?;
        let transfer = Transfer::decode(&reply)?;
        debug!(%method, id = transfer.id, path = %transfer.path, "transfer accepted");
        Ok(transfer)
    }
}
