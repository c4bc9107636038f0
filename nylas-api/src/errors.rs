use serde_json::Value;
use thiserror::Error;

/// Errors produced by the API layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure, the request did not complete.
    #[error("Http: {0}")]
    Http(#[from] nylas_http::Error),
    /// The server answered with an error status.
    #[error("API: {0}")]
    Api(#[from] ApiError),
    /// The server answered but the body did not have the expected shape.
    #[error("Unexpected response: {}", .0.as_deref().unwrap_or("no details"))]
    UnexpectedResponse(Option<String>),
}

impl Error {
    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(Some(message.into()))
    }

    /// The api error, if this is one.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the server reported that the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.api_error()
            .is_some_and(|e| e.kind == ApiErrorKind::ResourceNotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an error status returned by the server.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ApiErrorKind {
    InvalidRequest,
    MessageRejected,
    AccessDenied,
    ResourceNotFound,
    MailProviderError,
    SendingQuotaExceeded,
    InternalError,
    BadGateway,
    ServiceUnavailable,
    /// Status without a dedicated kind, or a body that carried no error description.
    Generic,
}

impl ApiErrorKind {
    /// Map an http status code to its error kind.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            402 => Self::MessageRejected,
            403 => Self::AccessDenied,
            404 => Self::ResourceNotFound,
            422 => Self::MailProviderError,
            429 => Self::SendingQuotaExceeded,
            500 => Self::InternalError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            _ => Self::Generic,
        }
    }
}

/// Error returned by the Nylas API.
#[derive(Debug, Error)]
pub struct ApiError {
    /// Classification derived from the status code.
    pub kind: ApiErrorKind,
    /// Http code for the error.
    pub http_code: u16,
    /// Error type reported by the server, e.g. `invalid_request_error`.
    pub error_type: Option<String>,
    /// Optional human readable message.
    pub message: Option<String>,
    /// Upstream provider error, when the server forwarded one.
    pub server_error: Option<Value>,
}

impl ApiError {
    /// Create an error that carries no description.
    #[must_use]
    pub fn generic(http_code: u16) -> Self {
        Self {
            kind: ApiErrorKind::Generic,
            http_code,
            error_type: None,
            message: None,
            server_error: None,
        }
    }

    /// Create a new instance from an error description sent along with `http_code`.
    #[must_use]
    pub fn with_description(http_code: u16, description: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| {
            description
                .get(key)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        };

        Self {
            kind: ApiErrorKind::from_status(http_code),
            http_code,
            error_type: text("type"),
            message: text("message"),
            server_error: description
                .get("server_error")
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(m) = &self.message {
            write!(f, "{:?}: {m}", self.kind)
        } else {
            write!(f, "{:?} http={}", self.kind, self.http_code)
        }
    }
}
