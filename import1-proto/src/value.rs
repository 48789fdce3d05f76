//! Call arguments and reply values.

use std::fmt;
use std::os::fd::BorrowedFd;

use serde::Serialize;

/// A positional argument of a manager method call.
///
/// Descriptors are borrowed: the caller keeps ownership and the transport
/// passes them to the service as ancillary data.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::exhaustive_enums)]
pub enum Arg<'a> {
    /// Unix file descriptor (`h`).
    Fd(BorrowedFd<'a>),
    /// UTF-8 string (`s`).
    Str(&'a str),
    /// Boolean (`b`).
    Bool(bool),
    /// Unsigned 32-bit integer (`u`).
    U32(u32),
}

/// A single value of a method reply, detached from the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Value {
    /// Boolean (`b`).
    Bool(bool),
    /// Byte (`y`).
    U8(u8),
    /// Signed 16-bit integer (`n`).
    I16(i16),
    /// Unsigned 16-bit integer (`q`).
    U16(u16),
    /// Signed 32-bit integer (`i`).
    I32(i32),
    /// Unsigned 32-bit integer (`u`).
    U32(u32),
    /// Signed 64-bit integer (`x`).
    I64(i64),
    /// Unsigned 64-bit integer (`t`).
    U64(u64),
    /// IEEE 754 double (`d`).
    F64(f64),
    /// String (`s`).
    Str(String),
    /// Object path (`o`), not yet validated.
    ObjectPath(String),
    /// Type signature (`g`).
    Signature(String),
    /// Variant (`v`) wrapping another value.
    Variant(Box<Value>),
    /// Array (`a…`).
    Array(Vec<Value>),
    /// Structure (`(…)`).
    Struct(Vec<Value>),
    /// Any other value, rendered as text by the transport.
    Other(String),
}

impl Value {
    /// Returns the value as a `u32` if it is an integer in range.
    ///
    /// Any integer width is accepted as long as the value is non-negative
    /// and fits; variants are unwrapped.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U8(n) => Some(u32::from(*n)),
            Self::U16(n) => Some(u32::from(*n)),
            Self::U32(n) => Some(*n),
            Self::U64(n) => u32::try_from(*n).ok(),
            Self::I16(n) => u32::try_from(*n).ok(),
            Self::I32(n) => u32::try_from(*n).ok(),
            Self::I64(n) => u32::try_from(*n).ok(),
            Self::Variant(v) => v.as_u32(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(n) => Some(*n),
            Self::Variant(v) => v.as_f64(),
            _ => None,
        }
    }

    /// Returns the string contents of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Variant(v) => v.as_str(),
            _ => None,
        }
    }

    /// Returns the text of an object path, or of a string that may hold one.
    pub fn as_path_str(&self) -> Option<&str> {
        match self {
            Self::ObjectPath(s) | Self::Str(s) => Some(s),
            Self::Variant(v) => v.as_path_str(),
            _ => None,
        }
    }

    /// Returns the elements of an array.
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            Self::Variant(v) => v.as_array(),
            _ => None,
        }
    }

    /// Returns the fields of a structure.
    pub fn as_struct(&self) -> Option<&[Self]> {
        match self {
            Self::Struct(fields) => Some(fields),
            Self::Variant(v) => v.as_struct(),
            _ => None,
        }
    }
}

/// Writes `items` separated by `", "`.
fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::U8(n) => write!(f, "{n}"),
            Self::I16(n) => write!(f, "{n}"),
            Self::U16(n) => write!(f, "{n}"),
            Self::I32(n) => write!(f, "{n}"),
            Self::U32(n) => write!(f, "{n}"),
            Self::I64(n) => write!(f, "{n}"),
            Self::U64(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::ObjectPath(p) => write!(f, "objectpath '{p}'"),
            Self::Signature(s) => write!(f, "signature '{s}'"),
            Self::Variant(v) => write!(f, "<{v}>"),
            Self::Array(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Self::Struct(fields) => {
                f.write_str("(")?;
                join(f, fields)?;
                f.write_str(")")
            }
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// The ordered values of a method reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reply(Vec<Value>);

impl Reply {
    /// Creates a reply from its positional values.
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the value at `position`, if present.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.0.get(position)
    }

    /// Number of positional values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the reply carries no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Consumes the reply, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Reply {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Reply {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Reply {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Reply {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
