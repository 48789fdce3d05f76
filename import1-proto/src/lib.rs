//! Message model for the `org.freedesktop.import1` manager.
//!
//! Describes what travels over the bus without touching the bus itself:
//! the fixed manager endpoint, the methods it exposes, the arguments a
//! call carries and the values a reply is made of. The transport lives
//! in the `import1` crate.

mod endpoint;
mod path;
mod value;

pub use endpoint::{INTERFACE, Method, ObjectRef, PATH, SERVICE};
pub use path::{InvalidObjectPath, ObjectPath};
pub use value::{Arg, Reply, Value};
