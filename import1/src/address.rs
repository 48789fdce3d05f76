//! System bus address resolution.
//!
//! Handles D-Bus server addresses of the form
//! `unix:path=/run/dbus/system_bus_socket`, including `;`-separated lists.
//! Entries are parsed by [`zbus::Address`]; only `unix:path=` is usable.

use std::path::PathBuf;

use zbus::Address;
use zbus::address::transport::{Transport, UnixSocket};

use crate::error::BusError;

/// Environment variable overriding the system bus address.
pub const SYSTEM_BUS_ADDRESS_ENV: &str = "DBUS_SYSTEM_BUS_ADDRESS";

/// Well-known system bus address.
pub const DEFAULT_SYSTEM_BUS_ADDRESS: &str = "unix:path=/run/dbus/system_bus_socket";

/// Returns `$DBUS_SYSTEM_BUS_ADDRESS`, or the well-known default.
pub(crate) fn system_from_env() -> String {
    std::env::var(SYSTEM_BUS_ADDRESS_ENV)
        .ok()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_BUS_ADDRESS.to_owned())
}

/// Picks the socket path of the first `unix:path=` entry in `address`.
pub(crate) fn socket_path(address: &str) -> Result<PathBuf, BusError> {
    for entry in address.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let parsed: Address = entry
            .parse()
            .map_err(|e: zbus::Error| BusError::Address(format!("{entry:?}: {e}")))?;
        if let Transport::Unix(unix) = parsed.transport()
            && let UnixSocket::File(path) = unix.path()
        {
            return Ok(path.clone());
        }
    }
    Err(BusError::Address(format!("no unix:path= entry in {address:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_address() {
        assert_eq!(
            socket_path(DEFAULT_SYSTEM_BUS_ADDRESS).unwrap(),
            PathBuf::from("/run/dbus/system_bus_socket")
        );
    }

    #[test]
    fn skips_other_transports() {
        let path = socket_path("tcp:host=localhost,port=1234;unix:path=/tmp/bus").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/bus"));
    }

    #[test]
    fn skips_unix_entries_without_a_path() {
        let path = socket_path("unix:tmpdir=/tmp; unix:path=/run/bus").unwrap();
        assert_eq!(path, PathBuf::from("/run/bus"));
    }

    #[test]
    fn rejects_unusable_addresses() {
        for bad in ["", ";", "tcp:host=h,port=1", "nocolon", "unix:foo=bar"] {
            assert!(
                matches!(socket_path(bad), Err(BusError::Address(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
