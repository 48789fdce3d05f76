//! Transfer handles decoded from manager replies.

use import1_proto::{ObjectPath, Reply, Value};
use serde::Serialize;

use crate::error::DecodeError;

const ID: &str = "unsigned 32-bit integer";
const PATH: &str = "object path";
const LIST: &str = "array of (usssdo) transfer entries";
const ENTRY: &str = "(usssdo) transfer entry";

/// Handle to a transfer accepted by the manager.
///
/// A passive descriptor: the manager owns the transfer itself, and the
/// handle is never updated after the fact. Progress is observed through
/// [`Manager::transfers`](crate::Manager::transfers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub struct Transfer {
    /// Transfer id assigned by the manager.
    pub id: u32,
    /// Bus object representing the transfer.
    pub path: ObjectPath,
}

impl Transfer {
    /// Decodes the `(u id, o path)` reply of a transfer-initiating call.
    ///
    /// Values past the second are ignored. A missing or mistyped value is
    /// reported with its position; no partial transfer is ever returned.
    pub fn decode(reply: &Reply) -> Result<Self, DecodeError> {
        Ok(Self {
            id: id_at(reply, 0)?,
            path: path_at(reply, 1)?,
        })
    }
}

fn id_at(reply: &Reply, position: usize) -> Result<u32, DecodeError> {
    let value = reply.get(position);
    value
        .and_then(Value::as_u32)
        .ok_or_else(|| DecodeError::new(position, ID, value))
}

fn path_at(reply: &Reply, position: usize) -> Result<ObjectPath, DecodeError> {
    let value = reply.get(position);
    value
        .and_then(parse_path)
        .ok_or_else(|| DecodeError::new(position, PATH, value))
}

fn parse_path(value: &Value) -> Option<ObjectPath> {
    value.as_path_str().and_then(|s| ObjectPath::parse(s).ok())
}

/// One entry of the manager's transfer list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct TransferInfo {
    /// Transfer id.
    pub id: u32,
    /// Transfer type as reported by the manager (`import-tar`, `pull-raw`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Remote side: source URL for pulls, empty or a description otherwise.
    pub remote: String,
    /// Local image name.
    pub local: String,
    /// Completion ratio between `0.0` and `1.0`.
    pub progress: f64,
    /// Bus object representing the transfer.
    pub path: ObjectPath,
}

impl TransferInfo {
    /// Decodes a `ListTransfers` reply (`a(usssdo)`).
    pub fn decode_list(reply: &Reply) -> Result<Vec<Self>, DecodeError> {
        let entries = reply
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| DecodeError::new(0, LIST, reply.get(0)))?;
        entries.iter().map(Self::decode_entry).collect()
    }

    fn decode_entry(entry: &Value) -> Result<Self, DecodeError> {
        let bad = || DecodeError::new(0, ENTRY, Some(entry));
        let Some([id, kind, remote, local, progress, path]) = entry.as_struct() else {
            return Err(bad());
        };
        Ok(Self {
            id: id.as_u32().ok_or_else(bad)?,
            kind: kind.as_str().ok_or_else(bad)?.to_owned(),
            remote: remote.as_str().ok_or_else(bad)?.to_owned(),
            local: local.as_str().ok_or_else(bad)?.to_owned(),
            progress: progress.as_f64().ok_or_else(bad)?,
            path: parse_path(path).ok_or_else(bad)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER_32: &str = "/org/freedesktop/import1/transfer/_32";

    fn reply(values: Vec<Value>) -> Reply {
        Reply::new(values)
    }

    #[test]
    fn decodes_id_and_path() {
        let t = Transfer::decode(&reply(vec![
            Value::U32(42),
            Value::ObjectPath(TRANSFER_32.into()),
        ]))
        .unwrap();
        assert_eq!(t.id, 42);
        assert_eq!(t.path.as_str(), TRANSFER_32);
    }

    #[test]
    fn accepts_path_shaped_string() {
        let t = Transfer::decode(&reply(vec![Value::U64(3), Value::Str(TRANSFER_32.into())])).unwrap();
        assert_eq!(t.id, 3);
    }

    #[test]
    fn decode_is_repeatable() {
        let r = reply(vec![Value::U32(9), Value::ObjectPath(TRANSFER_32.into())]);
        assert_eq!(Transfer::decode(&r).unwrap(), Transfer::decode(&r).unwrap());
    }

    #[test]
    fn non_integer_id_names_position_zero() {
        let err = Transfer::decode(&reply(vec![
            Value::Str("42".into()),
            Value::ObjectPath(TRANSFER_32.into()),
        ]))
        .unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.expected, ID);
        assert_eq!(err.actual.as_deref(), Some("\"42\""));
    }

    #[test]
    fn negative_id_is_rejected() {
        let err = Transfer::decode(&reply(vec![
            Value::I32(-1),
            Value::ObjectPath(TRANSFER_32.into()),
        ]))
        .unwrap_err();
        assert_eq!(err.position, 0);
    }

    #[test]
    fn bad_path_names_position_one() {
        for bad in [Value::U32(1), Value::Str("not a path".into()), Value::ObjectPath("/x/".into())] {
            let err = Transfer::decode(&reply(vec![Value::U32(1), bad.clone()])).unwrap_err();
            assert_eq!(err.position, 1);
            assert_eq!(err.expected, PATH);
            assert_eq!(err.actual, Some(bad.to_string()));
        }
    }

    #[test]
    fn short_reply_is_decode_error() {
        let err = Transfer::decode(&reply(vec![Value::U32(1)])).unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.actual, None);

        let err = Transfer::decode(&Reply::default()).unwrap_err();
        assert_eq!(err.position, 0);
    }

    fn entry(id: u32, kind: &str, progress: f64) -> Value {
        Value::Struct(vec![
            Value::U32(id),
            Value::Str(kind.into()),
            Value::Str("https://example.com/img.raw".into()),
            Value::Str("img1".into()),
            Value::F64(progress),
            Value::ObjectPath(format!("/org/freedesktop/import1/transfer/_{id}")),
        ])
    }

    #[test]
    fn decodes_transfer_list() {
        let list = TransferInfo::decode_list(&reply(vec![Value::Array(vec![
            entry(1, "pull-raw", 0.5),
            entry(2, "import-tar", 0.0),
        ])]))
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].kind, "pull-raw");
        assert_eq!(list[0].local, "img1");
        assert!((list[0].progress - 0.5).abs() < f64::EPSILON);
        assert_eq!(list[1].path.as_str(), "/org/freedesktop/import1/transfer/_2");
    }

    #[test]
    fn empty_transfer_list() {
        let list = TransferInfo::decode_list(&reply(vec![Value::Array(Vec::new())])).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn malformed_transfer_list() {
        let err = TransferInfo::decode_list(&reply(vec![Value::U32(1)])).unwrap_err();
        assert_eq!(err.expected, LIST);

        let short = Value::Struct(vec![Value::U32(1), Value::Str("pull-raw".into())]);
        let err = TransferInfo::decode_list(&reply(vec![Value::Array(vec![short])])).unwrap_err();
        assert_eq!(err.expected, ENTRY);
    }

    #[test]
    fn transfer_serializes_for_output() {
        let t = Transfer::decode(&reply(vec![
            Value::U32(42),
            Value::ObjectPath(TRANSFER_32.into()),
        ]))
        .unwrap();
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            format!("{{\"id\":42,\"path\":\"{TRANSFER_32}\"}}")
        );
    }
}
