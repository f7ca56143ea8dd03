use std::fmt;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{FrameError, Result};

/// A JSON array payload.
pub type JsonArray = Vec<Value>;

/// A JSON object payload.
pub type JsonObject = serde_json::Map<String, Value>;

/// The logical type of a message body, carried in the frame's data-kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Binary,
    Text,
    JsonArray,
    JsonObject,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [
        DataKind::Binary,
        DataKind::Text,
        DataKind::JsonArray,
        DataKind::JsonObject,
    ];

    /// Wire tag for this kind.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Binary => 1,
            Self::Text => 2,
            Self::JsonArray => 3,
            Self::JsonObject => 4,
        }
    }

    /// Kind for a wire tag, or `None` for an unknown tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Binary),
            2 => Some(Self::Text),
            3 => Some(Self::JsonArray),
            4 => Some(Self::JsonObject),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
            Self::JsonArray => "json-array",
            Self::JsonObject => "json-object",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Binary(Bytes),
    Text(String),
    JsonArray(JsonArray),
    JsonObject(JsonObject),
}

impl Payload {
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Binary(_) => DataKind::Binary,
            Self::Text(_) => DataKind::Text,
            Self::JsonArray(_) => DataKind::JsonArray,
            Self::JsonObject(_) => DataKind::JsonObject,
        }
    }
}

/// Arrays and objects become JSON payloads; any other value is handed back.
impl TryFrom<Value> for Payload {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Array(items) => Ok(Self::JsonArray(items)),
            Value::Object(map) => Ok(Self::JsonObject(map)),
            other => Err(other),
        }
    }
}

/// The unit of exchange: a typed payload tagged with an application-defined
/// message class.
///
/// The class is opaque to the codec. It must fit the non-negative range of
/// the wire's signed 32-bit field, i.e. at most [`crate::MAX_MESSAGE_CLASS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub payload: Payload,
    pub message_class: u32,
}

impl Message {
    pub fn new(payload: Payload, message_class: u32) -> Self {
        Self {
            payload,
            message_class,
        }
    }

    pub fn binary(data: impl Into<Bytes>, message_class: u32) -> Self {
        Self::new(Payload::Binary(data.into()), message_class)
    }

    pub fn text(text: impl Into<String>, message_class: u32) -> Self {
        Self::new(Payload::Text(text.into()), message_class)
    }

    pub fn json_array(array: JsonArray, message_class: u32) -> Self {
        Self::new(Payload::JsonArray(array), message_class)
    }

    pub fn json_object(object: JsonObject, message_class: u32) -> Self {
        Self::new(Payload::JsonObject(object), message_class)
    }

    pub fn kind(&self) -> DataKind {
        self.payload.kind()
    }

    pub fn into_binary(self) -> Result<Bytes> {
        match self.payload {
            Payload::Binary(data) => Ok(data),
            other => Err(wrong_kind(DataKind::Binary, other.kind())),
        }
    }

    pub fn into_text(self) -> Result<String> {
        match self.payload {
            Payload::Text(text) => Ok(text),
            other => Err(wrong_kind(DataKind::Text, other.kind())),
        }
    }

    pub fn into_json_array(self) -> Result<JsonArray> {
        match self.payload {
            Payload::JsonArray(array) => Ok(array),
            other => Err(wrong_kind(DataKind::JsonArray, other.kind())),
        }
    }

    pub fn into_json_object(self) -> Result<JsonObject> {
        match self.payload {
            Payload::JsonObject(object) => Ok(object),
            other => Err(wrong_kind(DataKind::JsonObject, other.kind())),
        }
    }
}

fn wrong_kind(expected: DataKind, found: DataKind) -> FrameError {
    FrameError::WrongDataKind { expected, found }
}

/// Serialize a payload to its uncompressed body bytes.
///
/// Binary passes through, text is UTF-8, JSON is its compact text form.
pub fn encode_payload(payload: &Payload) -> Result<Bytes> {
    let encoded = match payload {
        Payload::Binary(data) => data.clone(),
        Payload::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
        Payload::JsonArray(array) => Bytes::from(
            serde_json::to_vec(array).map_err(|err| serialize_err(DataKind::JsonArray, err))?,
        ),
        Payload::JsonObject(object) => Bytes::from(
            serde_json::to_vec(object).map_err(|err| serialize_err(DataKind::JsonObject, err))?,
        ),
    };
    Ok(encoded)
}

/// Rebuild a typed payload from uncompressed body bytes.
pub fn decode_payload(kind: DataKind, body: Bytes) -> Result<Payload> {
    match kind {
        DataKind::Binary => Ok(Payload::Binary(body)),
        DataKind::Text => String::from_utf8(body.to_vec())
            .map(Payload::Text)
            .map_err(|err| deserialize_err(kind, err.to_string())),
        DataKind::JsonArray => match parse_json(kind, &body)? {
            Value::Array(array) => Ok(Payload::JsonArray(array)),
            other => Err(deserialize_err(
                kind,
                format!("expected a JSON array, found {}", json_type_name(&other)),
            )),
        },
        DataKind::JsonObject => match parse_json(kind, &body)? {
            Value::Object(object) => Ok(Payload::JsonObject(object)),
            other => Err(deserialize_err(
                kind,
                format!("expected a JSON object, found {}", json_type_name(&other)),
            )),
        },
    }
}

fn parse_json(kind: DataKind, body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|err| deserialize_err(kind, err.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn deserialize_err(kind: DataKind, reason: String) -> FrameError {
    FrameError::Deserialize { kind, reason }
}

fn serialize_err(kind: DataKind, err: serde_json::Error) -> FrameError {
    FrameError::Serialize {
        kind,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tags_match_wire_values() {
        let tags: Vec<u8> = DataKind::ALL.iter().map(|kind| kind.tag()).collect();
        assert_eq!(tags, vec![1, 2, 3, 4]);
        for kind in DataKind::ALL {
            assert_eq!(DataKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(DataKind::from_tag(0), None);
        assert_eq!(DataKind::from_tag(5), None);
    }

    #[test]
    fn text_encodes_as_utf8() {
        let body = encode_payload(&Payload::Text("žluťoučký".to_string())).unwrap();
        assert_eq!(body.as_ref(), "žluťoučký".as_bytes());
    }

    #[test]
    fn json_encodes_compactly() {
        let object = json!({"i": 5, "close_connection": true});
        let Value::Object(map) = object else {
            unreachable!()
        };
        let body = encode_payload(&Payload::JsonObject(map.clone())).unwrap();
        let reparsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(reparsed, Value::Object(map));
        assert!(!body.contains(&b'\n'));
    }

    #[test]
    fn decode_rejects_invalid_utf8_text() {
        let err = decode_payload(DataKind::Text, Bytes::from_static(&[0xff, 0xfe])).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Deserialize {
                kind: DataKind::Text,
                ..
            }
        ));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode_payload(DataKind::JsonObject, Bytes::from_static(b"{\"a\":")).unwrap_err();
        assert!(matches!(err, FrameError::Deserialize { .. }));
    }

    #[test]
    fn decode_rejects_wrong_json_shape() {
        let err = decode_payload(DataKind::JsonArray, Bytes::from_static(b"{}")).unwrap_err();
        match err {
            FrameError::Deserialize { kind, reason } => {
                assert_eq!(kind, DataKind::JsonArray);
                assert!(reason.contains("an object"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = decode_payload(DataKind::JsonObject, Bytes::from_static(b"42")).unwrap_err();
        assert!(matches!(err, FrameError::Deserialize { .. }));
    }

    #[test]
    fn decode_accepts_empty_containers() {
        assert_eq!(
            decode_payload(DataKind::JsonArray, Bytes::from_static(b"[]")).unwrap(),
            Payload::JsonArray(Vec::new())
        );
        assert_eq!(
            decode_payload(DataKind::JsonObject, Bytes::from_static(b"{}")).unwrap(),
            Payload::JsonObject(JsonObject::new())
        );
        assert_eq!(
            decode_payload(DataKind::Text, Bytes::new()).unwrap(),
            Payload::Text(String::new())
        );
    }

    #[test]
    fn projections_check_kind() {
        let message = Message::text("hi", 1);
        let err = message.clone().into_binary().unwrap_err();
        assert!(matches!(
            err,
            FrameError::WrongDataKind {
                expected: DataKind::Binary,
                found: DataKind::Text,
            }
        ));
        assert_eq!(message.into_text().unwrap(), "hi");
    }

    #[test]
    fn json_values_convert_by_shape() {
        assert_eq!(
            Payload::try_from(json!([1, 2])).unwrap().kind(),
            DataKind::JsonArray
        );
        assert_eq!(
            Payload::try_from(json!({"a": 1})).unwrap().kind(),
            DataKind::JsonObject
        );
        assert_eq!(Payload::try_from(json!("str")).unwrap_err(), json!("str"));
    }
}
