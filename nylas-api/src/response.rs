//! Turns status/body pairs into decoded values or typed errors.
//!
//! Every response the crate receives goes through [`interpret`]. Nothing else in the crate looks
//! at status codes.

use crate::errors::{ApiError, Error, Result};
use nylas_http::RawResponse;
use serde_json::Value;
use tracing::error;

/// Shape the caller expects the decoded body to have.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// How a response should be interpreted.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Options {
    /// Expected shape of the decoded body. `None` accepts any json value.
    pub expected: Option<Shape>,
    /// Pass a successful body through without decoding it.
    pub raw_response: bool,
}

impl Options {
    /// Expect a json object.
    #[must_use]
    pub fn object() -> Self {
        Self {
            expected: Some(Shape::Object),
            raw_response: false,
        }
    }

    /// Expect a json array.
    #[must_use]
    pub fn array() -> Self {
        Self {
            expected: Some(Shape::Array),
            raw_response: false,
        }
    }

    /// Keep the body of a successful response as is.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            expected: None,
            raw_response: true,
        }
    }
}

/// Successfully interpreted body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Vec<u8>),
}

impl Payload {
    /// Decoded json value. A raw payload is converted into a json string.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Raw(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Body bytes. A json payload is serialized back.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Json(v) => v.to_string().into_bytes(),
            Self::Raw(bytes) => bytes,
        }
    }
}

const STATUS_OK: u16 = 200;

/// Whether a response with `status` carries a usable body.
#[must_use]
pub fn is_success(status: u16) -> bool {
    status == STATUS_OK
}

/// Interpret `status` and `body` according to `options`.
///
/// # Errors
/// Returns [`Error::Api`] for any status other than 200, classified by status code when the body
/// is a json object describing the error. Returns [`Error::UnexpectedResponse`] when a successful
/// body is empty, can not be decoded, or does not match the expected shape.
pub fn interpret(status: u16, body: &[u8], options: &Options) -> Result<Payload> {
    if !is_success(status) {
        let error = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(description)) => ApiError::with_description(status, &description),
            _ => ApiError::generic(status),
        };
        error!("Request failed: {error}");
        return Err(error.into());
    }

    if options.expected.is_some() && body.is_empty() {
        return Err(Error::unexpected("empty body"));
    }

    if options.raw_response {
        return Ok(Payload::Raw(body.to_vec()));
    }

    let value = serde_json::from_slice::<Value>(body).map_err(|e| Error::unexpected(e.to_string()))?;
    interpret_parsed(value, options).map(Payload::Json)
}

/// Interpret a [`RawResponse`].
///
/// # Errors
/// See [`interpret`].
pub fn interpret_response(response: &RawResponse, options: &Options) -> Result<Payload> {
    interpret(response.status, &response.body, options)
}

/// Check an already decoded value, e.g. a single frame of a stream, against `options`.
///
/// # Errors
/// Returns [`Error::UnexpectedResponse`] if the value does not match the expected shape.
pub fn interpret_parsed(value: Value, options: &Options) -> Result<Value> {
    match options.expected {
        Some(shape) if !shape.matches(&value) => Err(Error::unexpected(format!(
            "expected {shape:?}, got {}",
            kind_name(&value)
        ))),
        _ => Ok(value),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorKind;
    use serde_json::json;

    fn api_error(result: Result<Payload>) -> ApiError {
        match result {
            Err(Error::Api(e)) => e,
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn status_table_maps_to_kinds() {
        let table = [
            (400, ApiErrorKind::InvalidRequest),
            (402, ApiErrorKind::MessageRejected),
            (403, ApiErrorKind::AccessDenied),
            (404, ApiErrorKind::ResourceNotFound),
            (422, ApiErrorKind::MailProviderError),
            (429, ApiErrorKind::SendingQuotaExceeded),
            (500, ApiErrorKind::InternalError),
            (502, ApiErrorKind::BadGateway),
            (503, ApiErrorKind::ServiceUnavailable),
            (418, ApiErrorKind::Generic),
        ];

        for (status, kind) in table {
            let body = br#"{"type":"rn","message":"missing"}"#;
            let error = api_error(interpret(status, body, &Options::object()));
            assert_eq!(error.kind, kind, "status {status}");
            assert_eq!(error.http_code, status);
            assert_eq!(error.error_type.as_deref(), Some("rn"));
            assert_eq!(error.message.as_deref(), Some("missing"));
            assert!(error.server_error.is_none());
        }
    }

    #[test]
    fn server_error_is_kept() {
        let body = br#"{"type":"api_error","message":"boom","server_error":{"code":7}}"#;
        let error = api_error(interpret(422, body, &Options::default()));
        assert_eq!(error.kind, ApiErrorKind::MailProviderError);
        assert_eq!(error.server_error, Some(json!({"code": 7})));
    }

    #[test]
    fn error_without_object_body_is_generic() {
        for body in [&b""[..], b"not json", b"[1,2]"] {
            let error = api_error(interpret(404, body, &Options::array()));
            assert_eq!(error.kind, ApiErrorKind::Generic);
            assert_eq!(error.http_code, 404);
            assert!(error.error_type.is_none());
            assert!(error.message.is_none());
        }
    }

    #[test]
    fn raw_response_is_not_decoded_on_success() {
        let payload = interpret(200, b"From: a@b.c\r\n", &Options::raw()).unwrap();
        assert_eq!(payload, Payload::Raw(b"From: a@b.c\r\n".to_vec()));
    }

    #[test]
    fn raw_response_still_reports_errors() {
        let error = api_error(interpret(
            403,
            br#"{"type":"x","message":"no"}"#,
            &Options::raw(),
        ));
        assert_eq!(error.kind, ApiErrorKind::AccessDenied);
    }

    #[test]
    fn empty_body_with_expected_shape_is_unexpected() {
        assert!(matches!(
            interpret(200, b"", &Options::object()),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn undecodable_body_is_unexpected() {
        assert!(matches!(
            interpret(200, b"{nope", &Options::default()),
            Err(Error::UnexpectedResponse(Some(_)))
        ));
    }

    #[test]
    fn shape_mismatch_is_unexpected() {
        assert!(matches!(
            interpret(200, b"[]", &Options::object()),
            Err(Error::UnexpectedResponse(Some(_)))
        ));
        assert!(matches!(
            interpret_parsed(json!({"a": 1}), &Options::array()),
            Err(Error::UnexpectedResponse(Some(_)))
        ));
    }

    #[test]
    fn array_body_is_returned_unmodified() {
        let body = br#"[{"id":"a"},{"id":"b","unread":true}]"#;
        let payload = interpret(200, body, &Options::array()).unwrap();
        assert_eq!(
            payload,
            Payload::Json(json!([{"id": "a"}, {"id": "b", "unread": true}]))
        );
    }
}
