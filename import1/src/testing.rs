//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::os::fd::AsRawFd;
use std::sync::{Arc, Mutex};

use import1_proto::{Arg, ObjectRef, Reply};

use crate::bus::{Auth, Bus, Connection};
use crate::error::{BusError, Stage};

/// Something the transport was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    /// A private connection was opened.
    Open,
    /// `EXTERNAL` authentication with the given uid.
    Authenticate(u32),
    /// Bus registration.
    Hello,
    /// A method call.
    Call {
        /// Interface-qualified method name.
        method: String,
        /// Arguments as rendered by [`render`].
        args: Vec<String>,
    },
    /// The connection was closed.
    Close,
}

/// Shared record of transport events.
#[derive(Debug, Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<Event>>>);

impl Log {
    /// Records `event`.
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    /// Every event so far, in order.
    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Method calls only, as `(method, args)`.
    pub(crate) fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Call { method, args } => Some((method, args)),
                _ => None,
            })
            .collect()
    }

    /// Number of close events.
    pub(crate) fn closes(&self) -> usize {
        self.events().iter().filter(|e| **e == Event::Close).count()
    }
}

/// Replies handed out to successive calls, shared by every connection.
type Script = Arc<Mutex<VecDeque<Result<Reply, BusError>>>>;

/// A bus whose connections answer calls from a script.
#[derive(Debug, Default)]
pub(crate) struct MockBus {
    /// Events from every connection this bus opened.
    pub(crate) log: Log,
    /// Connection stage that fails, if any.
    fail_at: Option<Stage>,
    /// Call replies.
    script: Script,
}

impl MockBus {
    /// Answers successive calls with `replies`, in order.
    pub(crate) fn replying(replies: Vec<Result<Reply, BusError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into())),
            ..Self::default()
        }
    }

    /// Fails the given connection stage.
    pub(crate) fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }
}

impl Bus for MockBus {
    type Conn = MockConn;

    fn open_private(&self) -> Result<MockConn, BusError> {
        if self.fail_at == Some(Stage::Open) {
            return Err(BusError::Io(std::io::ErrorKind::NotFound.into()));
        }
        self.log.push(Event::Open);
        Ok(MockConn {
            log: self.log.clone(),
            fail_at: self.fail_at,
            script: Arc::clone(&self.script),
        })
    }
}

/// A connection opened by [`MockBus`].
#[derive(Debug)]
pub(crate) struct MockConn {
    /// Shared with the bus.
    log: Log,
    /// Copied from the bus.
    fail_at: Option<Stage>,
    /// Shared with the bus.
    script: Script,
}

impl Connection for MockConn {
    fn authenticate(&mut self, auth: &Auth) -> Result<(), BusError> {
        let Auth::External { uid } = *auth;
        self.log.push(Event::Authenticate(uid));
        if self.fail_at == Some(Stage::Authenticate) {
            return Err(BusError::Protocol("Rejected EXTERNAL".into()));
        }
        Ok(())
    }

    fn hello(&mut self) -> Result<String, BusError> {
        self.log.push(Event::Hello);
        if self.fail_at == Some(Stage::Hello) {
            return Err(BusError::Remote {
                name: "org.freedesktop.DBus.Error.AccessDenied".into(),
                message: "Hello denied".into(),
            });
        }
        Ok(":1.42".into())
    }

    fn call(&self, object: &ObjectRef, method: &str, args: &[Arg<'_>]) -> Result<Reply, BusError> {
        self.log.push(Event::Call {
            method: object.qualify(method),
            args: args.iter().map(render).collect(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BusError::Protocol("no scripted reply".into())))
    }

    fn close(&self) {
        self.log.push(Event::Close);
    }
}

/// Renders an argument for comparison: descriptors as `fd:N`, strings quoted.
fn render(arg: &Arg<'_>) -> String {
    match arg {
        Arg::Fd(fd) => format!("fd:{}", fd.as_raw_fd()),
        Arg::Str(s) => format!("{s:?}"),
        Arg::Bool(b) => b.to_string(),
        Arg::U32(n) => n.to_string(),
    }
}
