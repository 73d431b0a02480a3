//! Response construction.
//!
//! # Responsibilities
//! - Build the JSON envelope `{status, data, message?, code?}`
//! - Derive `status` from the numeric status code
//! - Provide the helper set handed to route handlers (`Reply`)
//!
//! # Design Decisions
//! - `status` is never set by callers; it is a pure function of the code
//! - A message is rendered as `[code] message` whenever a code is present
//! - Extra envelope fields cannot shadow the four core keys

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome class carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
    Error,
}

impl ResponseStatus {
    pub fn from_code(code: StatusCode) -> Self {
        match code.as_u16() {
            0..=399 => ResponseStatus::Success,
            400..=499 => ResponseStatus::Fail,
            _ => ResponseStatus::Error,
        }
    }
}

/// Structured JSON response body.
#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    data: Value,
    message: Option<String>,
    code: Option<String>,
    extra: Map<String, Value>,
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    status: ResponseStatus,
    data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Envelope {
    /// An envelope with `data: null` for the given status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            data: Value::Null,
            message: None,
            code: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add a field to the envelope. `data`, `message` and `code` are routed to
    /// their own slots; `status` is ignored.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        match key.as_str() {
            "status" => {}
            "data" => self.data = value,
            "message" => self.message = Some(value_to_text(value)),
            "code" => self.code = Some(value_to_text(value)),
            _ => {
                self.extra.insert(key, value);
            }
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Rendered message, prefixed with `[code]` when a code is present.
    pub fn rendered_message(&self) -> Option<String> {
        self.message.as_ref().map(|message| match &self.code {
            Some(code) => format!("[{code}] {message}"),
            None => message.clone(),
        })
    }

    /// The JSON body as a value.
    pub fn body(&self) -> Value {
        serde_json::to_value(self.wire()).unwrap_or(Value::Null)
    }

    fn wire(&self) -> WireEnvelope<'_> {
        WireEnvelope {
            status: ResponseStatus::from_code(self.status),
            data: &self.data,
            message: self.rendered_message(),
            code: self.code.as_deref(),
            extra: &self.extra,
        }
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.wire())).into_response()
    }
}

/// Response helper set for route handlers.
#[derive(Debug)]
pub struct Reply(Response);

impl Reply {
    /// Empty acknowledgment: `200 {"status":"success","data":null}`.
    pub fn ok() -> Self {
        Self::from(Envelope::new(StatusCode::OK))
    }

    /// Plain-text `200` response.
    pub fn text(body: impl Into<String>) -> Self {
        Self(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body.into(),
            )
                .into_response(),
        )
    }

    /// `200` envelope carrying `data`.
    pub fn json<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::from(Envelope::new(StatusCode::OK).data(value)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response data");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Response serialization failed")
            }
        }
    }

    /// `302 Found` with a `Location` header.
    pub fn redirect(location: &str) -> Self {
        match HeaderValue::try_from(location) {
            Ok(value) => Self((StatusCode::FOUND, [(header::LOCATION, value)]).into_response()),
            Err(_) => {
                tracing::error!(location = %location, "Invalid redirect location");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect location")
            }
        }
    }

    /// Error envelope with a message.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::from(Envelope::new(status).message(message))
    }

    /// Error envelope with a message and extra envelope fields (a `code` field
    /// becomes the envelope code).
    pub fn error_with(status: StatusCode, message: impl Into<String>, fields: Map<String, Value>) -> Self {
        let envelope = fields
            .into_iter()
            .fold(Envelope::new(status), |env, (k, v)| env.field(k, v))
            .message(message);
        Self::from(envelope)
    }

    pub fn into_inner(self) -> Response {
        self.0
    }
}

impl From<Envelope> for Reply {
    fn from(envelope: Envelope) -> Self {
        Self(envelope.into_response())
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        self.0
    }
}
