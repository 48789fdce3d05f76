//! Authenticated bus session bound to the import manager.

use std::sync::atomic::{AtomicBool, Ordering};

use import1_proto::{Arg, ObjectRef, Reply};
use tracing::{debug, trace};

use crate::bus::{Auth, Bus, Connection};
use crate::error::{BusError, Error, Result, Stage};
use crate::system::{SystemBus, SystemConnection};

/// A private, authenticated connection to the bus with the manager object
/// resolved.
///
/// Every call is a single blocking round-trip; nothing is retried. The
/// connection is closed when the session is dropped, or earlier through
/// [`Session::close`], which also releases calls blocked in other threads.
#[derive(Debug)]
pub struct Session<C: Connection = SystemConnection> {
    /// The exclusively owned connection.
    conn: C,
    /// Manager object all calls are addressed to.
    object: ObjectRef,
    /// Unique bus name assigned by `Hello`.
    unique_name: String,
    /// Set by [`Session::close`].
    closed: AtomicBool,
}

impl Session {
    /// Connects to the system bus named by `$DBUS_SYSTEM_BUS_ADDRESS`
    /// (or the well-known socket).
    pub fn connect() -> Result<Self> {
        Self::connect_with(&SystemBus::from_env())
    }
}

impl<C: Connection> Session<C> {
    /// Opens a private connection on `bus`, authenticates as the effective
    /// user and registers with `Hello`.
    ///
    /// If authentication or registration fails the connection is closed
    /// before the error is returned.
    pub fn connect_with<B: Bus<Conn = C>>(bus: &B) -> Result<Self> {
        let mut conn = bus
            .open_private()
            .map_err(|e| Error::connection(Stage::Open, e))?;

        if let Err(e) = conn.authenticate(&Auth::external()) {
            conn.close();
            return Err(Error::connection(Stage::Authenticate, e));
        }

        let unique_name = match conn.hello() {
            Ok(name) => name,
            Err(e) => {
                conn.close();
                return Err(Error::connection(Stage::Hello, e));
            }
        };
        debug!(%unique_name, "session established");

        Ok(Self {
            conn,
            object: ObjectRef::MANAGER,
            unique_name,
            closed: AtomicBool::new(false),
        })
    }

    /// Invokes `method` on the manager interface and waits for its reply.
    ///
    /// Failures reported by the transport or the service come back as
    /// [`Error::RemoteCall`]; once the session is closed every call fails
    /// with [`Error::Connection`] at [`Stage::Closed`].
    pub fn call(&self, method: &str, args: &[Arg<'_>]) -> Result<Reply> {
        if self.is_closed() {
            return Err(Error::connection(Stage::Closed, BusError::Closed));
        }
        trace!(method, args = args.len(), "dispatching");
        self.conn
            .call(&self.object, method, args)
            .map_err(|source| {
                if self.is_closed() {
                    Error::connection(Stage::Closed, source)
                } else {
                    Error::RemoteCall {
                        method: self.object.qualify(method),
                        source,
                    }
                }
            })
    }

    /// Closes the connection. Calls in flight on other threads return
    /// [`Error::Connection`]. Closing twice is a no-op.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(unique_name = %self.unique_name, "closing session");
            self.conn.close();
        }
    }

    /// Returns `true` once [`Session::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Unique bus name assigned to this connection.
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// The remote object calls are addressed to.
    pub const fn object(&self) -> &ObjectRef {
        &self.object
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}
