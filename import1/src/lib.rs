//! Client for the systemd-importd image transfer manager.
//!
//! `import1` talks to `org.freedesktop.import1` over a private system bus
//! connection to import, export and pull machine and container images,
//! and to list or cancel the transfers the manager runs on our behalf.
//!
//! The manager does all image I/O itself; this crate only starts
//! transfers and hands back [`Transfer`] handles describing them.
//!
//! # Quick start
//!
//! ```no_run
//! use import1::Manager;
//!
//! let manager = Manager::connect()?;
//! let transfer = manager.pull_raw(
//!     "https://download.example.org/images/base.raw.xz",
//!     "base",
//!     "signature",
//!     false,
//! )?;
//! println!("started transfer {} ({})", transfer.id, transfer.path);
//!
//! for info in manager.transfers()? {
//!     println!("{} {} {:.0}%", info.id, info.kind, info.progress * 100.0);
//! }
//! # Ok::<(), import1::Error>(())
//! ```
//!
//! # Transports
//!
//! [`Session`] is generic over the [`Bus`]/[`Connection`] traits. The
//! default, [`SystemBus`], resolves `$DBUS_SYSTEM_BUS_ADDRESS` and speaks
//! D-Bus through `zbus`.

pub mod address;
mod bus;
mod error;
mod manager;
mod session;
mod system;
#[cfg(test)]
mod testing;
mod transfer;

pub use bus::{Auth, Bus, Connection};
pub use error::{BusError, DecodeError, Error, Result, Stage};
pub use import1_proto::{
    Arg, INTERFACE, Method, ObjectPath, ObjectRef, PATH, Reply, SERVICE, Value,
};
pub use manager::Manager;
pub use session::Session;
pub use system::{SystemBus, SystemConnection};
pub use transfer::{Transfer, TransferInfo};
