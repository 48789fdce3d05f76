//! Bus transport abstraction.
//!
//! A [`Session`](crate::Session) only relies on five primitives: open a
//! private connection, authenticate, say hello, call a method and close.
//! [`SystemBus`](crate::SystemBus) provides them on top of `zbus`; tests
//! provide scripted ones.

use import1_proto::{Arg, ObjectRef, Reply};

use crate::error::BusError;

/// SASL mechanism used to authenticate a fresh connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Auth {
    /// `EXTERNAL`: the peer credentials of the socket, keyed by uid.
    External {
        /// The user id sent in the `AUTH EXTERNAL` command. The bus rejects
        /// it unless it matches the socket's peer credentials.
        uid: u32,
    },
}

impl Auth {
    /// `EXTERNAL` authentication as the effective user of this process.
    pub fn external() -> Self {
        Self::External {
            uid: nix::unistd::geteuid().as_raw(),
        }
    }
}

/// A bus that hands out private connections.
pub trait Bus {
    /// Connection type produced by [`Bus::open_private`].
    type Conn: Connection;

    /// Opens a new connection that is not shared with anyone else.
    fn open_private(&self) -> Result<Self::Conn, BusError>;
}

/// A single connection to a message bus.
///
/// `call` and `close` take `&self`: closing from another thread must make
/// any blocked `call` return.
pub trait Connection {
    /// Authenticates the connection.
    fn authenticate(&mut self, auth: &Auth) -> Result<(), BusError>;

    /// Registers on the bus, returning the unique name assigned to us.
    fn hello(&mut self) -> Result<String, BusError>;

    /// Invokes `method` on `object` and blocks until the reply arrives.
    fn call(&self, object: &ObjectRef, method: &str, args: &[Arg<'_>]) -> Result<Reply, BusError>;

    /// Closes the connection. Must be idempotent.
    fn close(&self);
}
