//! D-Bus object path validation.
//!
//! A valid object path is either `/` or a sequence of `/`-prefixed,
//! non-empty elements made of `[A-Za-z0-9_]`:
//! - `/org/freedesktop/import1` → valid
//! - `/org/freedesktop/import1/transfer/_32` → valid
//! - `/org//import1`, `/trailing/`, `relative` → invalid

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The string was not a well-formed object path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object path: {0:?}")]
pub struct InvalidObjectPath(pub String);

/// A validated D-Bus object path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Validates `input` as an object path.
    pub fn parse(input: &str) -> Result<Self, InvalidObjectPath> {
        if is_valid(input) {
            Ok(Self(input.to_owned()))
        } else {
            Err(InvalidObjectPath(input.to_owned()))
        }
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_valid(s: &str) -> bool {
    if s == "/" {
        return true;
    }
    let Some(rest) = s.strip_prefix('/') else {
        return false;
    };
    rest.split('/').all(|element| {
        !element.is_empty()
            && element
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

impl FromStr for ObjectPath {
    type Err = InvalidObjectPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = InvalidObjectPath;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid(&s) { Ok(Self(s)) } else { Err(InvalidObjectPath(s)) }
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
