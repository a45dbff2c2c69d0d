//! Error types for the client SDK.
//!
//! Two families live here:
//!
//! - [`ClientError`] covers fallible setup work (config files, URLs, transports)
//!   and is returned through `Result` like any other Rust error.
//! - [`NakamaError`] and [`RtError`] are the payloads handed to error callbacks.
//!   Per-request failures never surface as `Err` from an operation method; they
//!   are delivered during `tick()` to exactly one callback.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Message used when a server error body carries no usable `message` field.
pub const MISSING_MESSAGE: &str = "Invalid or missing 'message' field";

/// Errors raised while setting up clients, transports or configuration.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

/// Error codes for HTTP requests.
///
/// Non-negative values mirror the gRPC status codes returned by the server.
/// Negative values are produced locally and never come from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,

    /// No response was received from the server.
    ConnectionError = -1,
    /// The request was cancelled locally before it completed.
    CancelledByUser = -2,
    /// The response could not be understood.
    InternalError = -3,
    /// The session is missing or expired.
    InvalidSession = -4,
    /// The outgoing request could not be serialized.
    SerializationError = -5,
}

impl ErrorCode {
    /// Maps a numeric code to an [`ErrorCode`]. Values outside the known
    /// table become [`ErrorCode::Unknown`].
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Cancelled,
            2 => Self::Unknown,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            -1 => Self::ConnectionError,
            -2 => Self::CancelledByUser,
            -3 => Self::InternalError,
            -4 => Self::InvalidSession,
            -5 => Self::SerializationError,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> i32 {
        self as i32
    }

    /// Whether the code was produced on this side of the connection.
    pub fn is_local(self) -> bool {
        self.as_code() < 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_code())
    }
}

/// A failed HTTP request, as delivered to an error callback.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct NakamaError {
    pub code: ErrorCode,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl NakamaError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Builds an error from a non-200 response body of the form
    /// `{"code": 3, "message": "..."}`.
    ///
    /// A body that is not a JSON object yields [`ErrorCode::InternalError`]
    /// with the raw body kept in the context under `"body"`.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let parsed: Result<Value, _> = serde_json::from_str(body);
        let object = match parsed {
            Ok(Value::Object(object)) => object,
            _ => {
                return Self::new(ErrorCode::InternalError, format!("unparseable error response (HTTP {status})"))
                    .with_context("body", body)
                    .with_context("status", status.to_string());
            }
        };

        let code = object
            .get("code")
            .and_then(json_integer)
            .map(ErrorCode::from_code)
            .unwrap_or(ErrorCode::Unknown);
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| MISSING_MESSAGE.to_string());

        Self::new(code, message).with_context("status", status.to_string())
    }
}

/// Error codes for realtime requests and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RtErrorCode {
    Unknown = -100,
    ConnectError = -1,
    TransportError = -2,
    Disconnected = -3,

    RuntimeException = 0,
    UnrecognizedPayload = 1,
    MissingPayload = 2,
    BadInput = 3,
    MatchNotFound = 4,
    MatchJoinRejected = 5,
    RuntimeFunctionNotFound = 6,
    RuntimeFunctionException = 7,
}

impl RtErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::ConnectError,
            -2 => Self::TransportError,
            -3 => Self::Disconnected,
            0 => Self::RuntimeException,
            1 => Self::UnrecognizedPayload,
            2 => Self::MissingPayload,
            3 => Self::BadInput,
            4 => Self::MatchNotFound,
            5 => Self::MatchJoinRejected,
            6 => Self::RuntimeFunctionNotFound,
            7 => Self::RuntimeFunctionException,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for RtErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_code())
    }
}

/// A realtime failure: either a server `error` envelope or a local
/// connection problem.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct RtError {
    pub code: RtErrorCode,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl RtError {
    pub fn new(code: RtErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Parses the object found under the envelope's `error` field.
    pub fn from_json(value: &Value) -> Self {
        let code = value
            .get("code")
            .and_then(json_integer)
            .map(RtErrorCode::from_code)
            .unwrap_or(RtErrorCode::RuntimeException);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let context = value
            .get("context")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                        (k.clone(), v)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { code, message, context }
    }
}

/// Reads an integer that the gateway may have encoded as a string.
fn json_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_table() {
        assert_eq!(ErrorCode::from_code(3), ErrorCode::InvalidArgument);
        assert_eq!(ErrorCode::from_code(16), ErrorCode::Unauthenticated);
        assert_eq!(ErrorCode::from_code(99), ErrorCode::Unknown);
        assert_eq!(ErrorCode::ConnectionError.as_code(), -1);
        assert!(ErrorCode::InvalidSession.is_local());
        assert!(!ErrorCode::NotFound.is_local());
    }

    #[test]
    fn test_error_from_response_body() {
        let err = NakamaError::from_response_body(400, r#"{"code":3,"message":"Bad Input"}"#);
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert_eq!(err.message, "Bad Input");
        assert_eq!(err.context.get("status").map(String::as_str), Some("400"));
    }

    #[test]
    fn test_error_from_response_body_missing_message() {
        let err = NakamaError::from_response_body(404, r#"{"code":5}"#);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, MISSING_MESSAGE);
    }

    #[test]
    fn test_error_from_unparseable_body() {
        let err = NakamaError::from_response_body(502, "<html>bad gateway</html>");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.context.get("body").map(String::as_str), Some("<html>bad gateway</html>"));
    }

    #[test]
    fn test_rt_error_from_json() {
        let err = RtError::from_json(&json!({
            "code": 3,
            "message": "Bad Input",
            "context": { "field": "match_id" }
        }));
        assert_eq!(err.code, RtErrorCode::BadInput);
        assert_eq!(err.message, "Bad Input");
        assert_eq!(err.context.get("field").map(String::as_str), Some("match_id"));
    }

    #[test]
    fn test_rt_error_string_code() {
        let err = RtError::from_json(&json!({ "code": "4", "message": "gone" }));
        assert_eq!(err.code, RtErrorCode::MatchNotFound);
    }
}
