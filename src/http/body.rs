//! Request body decoding.
//!
//! # Responsibilities
//! - Decode the buffered body according to its declared content type
//! - Merge hook-injected data into the decoded body
//!
//! # Design Decisions
//! - Empty or absent body → empty mapping, whatever the content type
//! - Malformed JSON degrades to an empty mapping; the failure is only logged
//! - Unsupported content types decode to `Null`, distinct from an empty mapping

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A request body after content-type decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedBody {
    /// A JSON object, a form, or an empty body.
    Map(Map<String, Value>),
    /// Valid JSON that is not an object.
    Value(Value),
    /// The content type is not one the decoder understands.
    Null,
}

impl Default for DecodedBody {
    fn default() -> Self {
        DecodedBody::Map(Map::new())
    }
}

impl DecodedBody {
    pub fn is_null(&self) -> bool {
        matches!(self, DecodedBody::Null)
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            DecodedBody::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a top-level key of a mapping body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Shallow-merge `data` into the body; keys in `data` win.
    ///
    /// A `Null` or non-object body is replaced by the data when there is any.
    pub fn merge(&mut self, data: Map<String, Value>) {
        if data.is_empty() {
            return;
        }
        match self {
            DecodedBody::Map(map) => map.extend(data),
            _ => *self = DecodedBody::Map(data),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DecodedBody::Map(map) => Value::Object(map.clone()),
            DecodedBody::Value(value) => value.clone(),
            DecodedBody::Null => Value::Null,
        }
    }
}

/// Body decode failure. Never propagated out of the pipeline.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Media type of a `Content-Type` value, without parameters, lowercased.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Decode a buffered body.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedBody {
    if bytes.is_empty() {
        return DecodedBody::default();
    }

    match content_type.map(media_type).as_deref() {
        Some(APPLICATION_JSON) => match decode_json(bytes) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Body decode failed; continuing with an empty body");
                DecodedBody::default()
            }
        },
        Some(FORM_URLENCODED) => decode_form(bytes),
        other => {
            tracing::debug!(content_type = ?other, "Unsupported content type; body decoded as null");
            DecodedBody::Null
        }
    }
}

fn decode_json(bytes: &[u8]) -> Result<DecodedBody, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(match value {
        Value::Object(map) => DecodedBody::Map(map),
        other => DecodedBody::Value(other),
    })
}

fn decode_form(bytes: &[u8]) -> DecodedBody {
    let map = url::form_urlencoded::parse(bytes)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    DecodedBody::Map(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_empty_map() {
        for content_type in [None, Some("application/json"), Some("text/plain")] {
            let body = decode_body(b"", content_type);
            assert_eq!(body, DecodedBody::Map(Map::new()));
            assert!(!body.is_null());
        }
    }

    #[test]
    fn test_unsupported_content_type_is_null() {
        let body = decode_body(b"<xml/>", Some("application/xml"));
        assert!(body.is_null());
        assert_ne!(body, DecodedBody::default());

        assert!(decode_body(b"hello", None).is_null());
    }

    #[test]
    fn test_json_object() {
        let body = decode_body(br#"{"name":"trestle","n":2}"#, Some("application/json"));
        assert_eq!(body.get("name"), Some(&json!("trestle")));
        assert_eq!(body.get("n"), Some(&json!(2)));
    }

    #[test]
    fn test_json_with_charset_parameter() {
        let body = decode_body(br#"{"a":1}"#, Some("Application/JSON; charset=utf-8"));
        assert_eq!(body.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_json_non_object() {
        let body = decode_body(b"[1,2,3]", Some("application/json"));
        assert_eq!(body, DecodedBody::Value(json!([1, 2, 3])));
    }

    #[test]
    fn test_malformed_json_degrades_to_empty() {
        let body = decode_body(b"{not json", Some("application/json"));
        assert_eq!(body, DecodedBody::default());
    }

    #[test]
    fn test_form_decoding() {
        let body = decode_body(
            b"name=John+Smith&city=S%C3%A3o%20Paulo&empty=",
            Some("application/x-www-form-urlencoded"),
        );
        assert_eq!(body.get("name"), Some(&json!("John Smith")));
        assert_eq!(body.get("city"), Some(&json!("São Paulo")));
        assert_eq!(body.get("empty"), Some(&json!("")));
    }

    #[test]
    fn test_merge() {
        let mut body = decode_body(br#"{"a":1,"b":1}"#, Some("application/json"));
        let mut data = Map::new();
        data.insert("b".into(), json!(2));
        data.insert("c".into(), json!(3));
        body.merge(data);
        assert_eq!(body.to_value(), json!({"a": 1, "b": 2, "c": 3}));
    }

    #[test]
    fn test_merge_into_null() {
        let mut body = DecodedBody::Null;
        body.merge(Map::new());
        assert!(body.is_null());

        let mut data = Map::new();
        data.insert("user".into(), json!("alice"));
        body.merge(data);
        assert_eq!(body.to_value(), json!({"user": "alice"}));
    }

    #[test]
    fn test_serialize_untagged() {
        assert_eq!(serde_json::to_value(DecodedBody::Null).unwrap(), Value::Null);
        assert_eq!(serde_json::to_value(DecodedBody::default()).unwrap(), json!({}));
    }
}
