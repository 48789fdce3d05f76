//! Fixed manager endpoint and the methods consumed from it.

use std::fmt;

/// Well-known bus name of the import manager.
pub const SERVICE: &str = "org.freedesktop.import1";

/// Object path of the manager object.
pub const PATH: &str = "/org/freedesktop/import1";

/// Interface implemented by the manager object.
pub const INTERFACE: &str = "org.freedesktop.import1.Manager";

/// A remote object reference: destination, object path and interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct ObjectRef {
    /// Destination bus name.
    pub service: &'static str,
    /// Object path on the destination.
    pub path: &'static str,
    /// Interface method calls are qualified with.
    pub interface: &'static str,
}

impl ObjectRef {
    /// The import manager object.
    pub const MANAGER: Self = Self {
        service: SERVICE,
        path: PATH,
        interface: INTERFACE,
    };

    /// Returns the interface-qualified form of `method`
    /// (`org.freedesktop.import1.Manager.ImportTar`).
    pub fn qualify(&self, method: &str) -> String {
        format!("{}.{method}", self.interface)
    }
}

/// Manager methods invoked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Method {
    /// `ImportTar(h fd, s local_name, b force, b read_only) -> (u id, o path)`.
    ImportTar,
    /// `ImportRaw(h fd, s local_name, b force, b read_only) -> (u id, o path)`.
    ImportRaw,
    /// `ImportFileSystem(h fd, s local_name, b force, b read_only) -> (u id, o path)`.
    ImportFileSystem,
    /// `ExportTar(s local_name, h fd, s format) -> (u id, o path)`.
    ExportTar,
    /// `ExportRaw(s local_name, h fd, s format) -> (u id, o path)`.
    ExportRaw,
    /// `PullTar(s url, s local_name, s verify_mode, b force) -> (u id, o path)`.
    PullTar,
    /// `PullRaw(s url, s local_name, s verify_mode, b force) -> (u id, o path)`.
    PullRaw,
    /// `ListTransfers() -> a(usssdo)`.
    ListTransfers,
    /// `CancelTransfer(u id)`.
    CancelTransfer,
}

impl Method {
    /// Member name as sent on the bus.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImportTar => "ImportTar",
            Self::ImportRaw => "ImportRaw",
            Self::ImportFileSystem => "ImportFileSystem",
            Self::ExportTar => "ExportTar",
            Self::ExportRaw => "ExportRaw",
            Self::PullTar => "PullTar",
            Self::PullRaw => "PullRaw",
            Self::ListTransfers => "ListTransfers",
            Self::CancelTransfer => "CancelTransfer",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
