//! System bus transport backed by `zbus`.
//!
//! Each [`SystemBus::open_private`] call connects a fresh Unix socket, so
//! every session owns its connection exclusively. `zbus` drives SASL
//! authentication in peer mode, presenting the uid from [`Auth`];
//! registration (`Hello`) is sent explicitly so the two steps fail
//! independently.

use std::fmt;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;

use import1_proto::{Arg, ObjectRef, Reply, Value};
use tracing::{debug, trace};
use zbus::zvariant::{self, StructureBuilder};

use crate::address;
use crate::bus::{Auth, Bus, Connection};
use crate::error::BusError;

/// Bus name of the message bus itself.
const DBUS_SERVICE: &str = "org.freedesktop.DBus";
/// Object path of the message bus itself.
const DBUS_PATH: &str = "/org/freedesktop/DBus";

/// The system message bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemBus {
    /// D-Bus server address, resolved to a socket path on open.
    address: String,
}

impl SystemBus {
    /// Uses `$DBUS_SYSTEM_BUS_ADDRESS`, falling back to the well-known socket.
    pub fn from_env() -> Self {
        Self {
            address: address::system_from_env(),
        }
    }

    /// Uses an explicit D-Bus address (e.g. `unix:path=/run/dbus/system_bus_socket`).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Returns the configured address.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Bus for SystemBus {
    type Conn = SystemConnection;

    fn open_private(&self) -> Result<SystemConnection, BusError> {
        let path = address::socket_path(&self.address)?;
        debug!(path = %path.display(), "opening private system bus connection");
        let stream = UnixStream::connect(&path)?;
        Ok(SystemConnection { stream, conn: None })
    }
}

/// A private connection to the system bus.
pub struct SystemConnection {
    /// Our handle on the socket, kept to shut it down from any thread.
    stream: UnixStream,
    /// Set once authentication succeeded.
    conn: Option<zbus::blocking::Connection>,
}

impl SystemConnection {
    /// The authenticated connection, or `NotAuthenticated`.
    fn connected(&self) -> Result<&zbus::blocking::Connection, BusError> {
        self.conn.as_ref().ok_or(BusError::NotAuthenticated)
    }
}

impl fmt::Debug for SystemConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemConnection")
            .field("stream", &self.stream)
            .field("authenticated", &self.conn.is_some())
            .finish()
    }
}

impl Connection for SystemConnection {
    fn authenticate(&mut self, auth: &Auth) -> Result<(), BusError> {
        let Auth::External { uid } = *auth;
        debug!(uid, "authenticating with EXTERNAL");
        let conn = zbus::blocking::connection::Builder::async_io_unix_stream(self.stream.try_clone()?)
            .auth_mechanism(zbus::AuthMechanism::External)
            .user_id(uid)
            .p2p()
            .build()
            .map_err(from_zbus)?;
        self.conn = Some(conn);
        Ok(())
    }

    fn hello(&mut self) -> Result<String, BusError> {
        let reply = self
            .connected()?
            .call_method(
                Some(DBUS_SERVICE),
                DBUS_PATH,
                Some(DBUS_SERVICE),
                "Hello",
                &(),
            )
            .map_err(from_zbus)?;
        let name: String = reply.body().deserialize().map_err(from_zbus)?;
        debug!(%name, "registered on system bus");
        Ok(name)
    }

    fn call(&self, object: &ObjectRef, method: &str, args: &[Arg<'_>]) -> Result<Reply, BusError> {
        let conn = self.connected()?;
        trace!(
            destination = object.service,
            path = object.path,
            interface = object.interface,
            method,
            args = args.len(),
            "method call"
        );
        let reply = if args.is_empty() {
            conn.call_method(
                Some(object.service),
                object.path,
                Some(object.interface),
                method,
                &(),
            )
        } else {
            let body = body(args)?;
            conn.call_method(
                Some(object.service),
                object.path,
                Some(object.interface),
                method,
                &body,
            )
        }
        .map_err(from_zbus)?;
        reply_values(&reply)
    }

    fn close(&self) {
        // Blocked readers see EOF once the socket is shut down.
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            trace!(error = %e, "socket shutdown failed");
        }
    }
}

/// Marshals non-empty `args` into a single structure body.
fn body<'a>(args: &[Arg<'a>]) -> Result<zvariant::Structure<'a>, BusError> {
    args.iter()
        .fold(StructureBuilder::new(), |b, arg| b.append_field(to_variant(*arg)))
        .build()
        .map_err(|e| from_zbus(e.into()))
}

/// Converts one call argument to its wire value.
fn to_variant(arg: Arg<'_>) -> zvariant::Value<'_> {
    match arg {
        Arg::Fd(fd) => zvariant::Value::Fd(zvariant::Fd::from(fd)),
        Arg::Str(s) => zvariant::Value::from(s),
        Arg::Bool(b) => zvariant::Value::Bool(b),
        Arg::U32(n) => zvariant::Value::U32(n),
    }
}

/// Converts a reply body into transport-independent values.
fn reply_values(msg: &zbus::Message) -> Result<Reply, BusError> {
    let body = msg.body();
    if body.signature().to_string().is_empty() {
        return Ok(Reply::default());
    }
    let fields: zvariant::Structure<'_> = body.deserialize().map_err(from_zbus)?;
    Ok(fields.fields().iter().map(from_variant).collect())
}

/// Converts a wire value, keeping unknown kinds as their debug form.
fn from_variant(value: &zvariant::Value<'_>) -> Value {
    match value {
        zvariant::Value::Bool(b) => Value::Bool(*b),
        zvariant::Value::U8(n) => Value::U8(*n),
        zvariant::Value::I16(n) => Value::I16(*n),
        zvariant::Value::U16(n) => Value::U16(*n),
        zvariant::Value::I32(n) => Value::I32(*n),
        zvariant::Value::U32(n) => Value::U32(*n),
        zvariant::Value::I64(n) => Value::I64(*n),
        zvariant::Value::U64(n) => Value::U64(*n),
        zvariant::Value::F64(n) => Value::F64(*n),
        zvariant::Value::Str(s) => Value::Str(s.as_str().to_owned()),
        zvariant::Value::ObjectPath(p) => Value::ObjectPath(p.as_str().to_owned()),
        zvariant::Value::Signature(s) => Value::Signature(s.to_string()),
        zvariant::Value::Value(inner) => Value::Variant(Box::new(from_variant(inner))),
        zvariant::Value::Array(items) => Value::Array(items.iter().map(from_variant).collect()),
        zvariant::Value::Structure(s) => Value::Struct(s.fields().iter().map(from_variant).collect()),
        other => Value::Other(format!("{other:?}")),
    }
}

/// Maps a `zbus` failure onto the transport error taxonomy.
#[allow(clippy::needless_pass_by_value)]
fn from_zbus(e: zbus::Error) -> BusError {
    match e {
        zbus::Error::MethodError(name, message, _) => BusError::Remote {
            name: name.to_string(),
            message: message.unwrap_or_default(),
        },
        zbus::Error::InputOutput(io) => BusError::Io(std::io::Error::new(io.kind(), io.to_string())),
        other => BusError::Protocol(other.to_string()),
    }
}
