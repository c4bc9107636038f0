#![allow(clippy::result_large_err)]
//! Blocking HTTP executor for the Nylas API client.
//!
//! Requests are described with the [`Request`] trait and executed on a [`Client`] which is
//! configured once through a [`ClientBuilder`]. The client never interprets status codes: every
//! completed round trip is returned as a [`RawResponse`] so that the caller can decide what a
//! status/body pair means. Long-lived responses are exposed as a [`Streaming`] body instead.

use anyhow::anyhow;
pub use http;
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::io;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
pub use ureq;
use ureq::Body;
use ureq::typestate::{WithBody, WithoutBody};
pub use url;
use url::Url;

/// Errors that may arise while executing a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP Transport error.
    #[error("Ureq: {0}")]
    Ureq(#[from] ureq::Error),
    /// Json serialization error.
    #[error("Json Serialization: {0}")]
    Json(#[from] serde_json::Error),
    /// IO Error
    #[error("IO: {0}")]
    IO(#[from] io::Error),
    /// Parsing or manipulation of Urls.
    #[error("Url: {0}")]
    Url(#[from] url::ParseError),
    /// Unexpected use case.
    #[error("Unexpected: {0}")]
    Unexpected(anyhow::Error),
}

impl Error {
    /// Whether the current error is a connection error that may indicate there are issues
    /// connecting to the server.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        let Self::Ureq(err) = self else {
            return false;
        };
        matches!(
            err,
            ureq::Error::Io(_)
                | ureq::Error::Timeout(_)
                | ureq::Error::ConnectionFailed
                | ureq::Error::TooManyRedirects
                | ureq::Error::ConnectProxyFailed(_)
        )
    }

    /// Whether the request or the body read was interrupted by a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Ureq(ureq::Error::Timeout(_)) => true,
            Self::Ureq(ureq::Error::Io(e)) | Self::IO(e) => io_timed_out(e),
            _ => false,
        }
    }
}

/// Ureq reports timeouts hit while reading a body as an [`io::Error`] that wraps the
/// [`ureq::Error`], so the kind alone is not enough.
fn io_timed_out(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::TimedOut {
        return true;
    }
    match e.get_ref().and_then(|inner| inner.downcast_ref::<ureq::Error>()) {
        Some(ureq::Error::Timeout(_)) => true,
        Some(ureq::Error::Io(inner)) => io_timed_out(inner),
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// HTTP method for the request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

/// Defines an Http Request.
pub trait Request {
    /// Http Method.
    const METHOD: Method;

    /// The relative url of the request without query components.
    fn url(&self) -> String;

    /// Build the request.
    ///
    /// Query parameters, headers and body should be set here.
    ///
    /// # Errors
    /// Returns error if building the operation failed.
    fn build(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(builder)
    }
}

enum RequestWrapper {
    WithBody(ureq::RequestBuilder<WithBody>),
    WithOutBody(ureq::RequestBuilder<WithoutBody>),
}

pub struct RequestBuilder {
    request: RequestWrapper,
    body: Option<Vec<u8>>,
}

impl From<ureq::RequestBuilder<WithBody>> for RequestBuilder {
    fn from(request: ureq::RequestBuilder<WithBody>) -> Self {
        Self {
            request: RequestWrapper::WithBody(request),
            body: None,
        }
    }
}

impl From<ureq::RequestBuilder<WithoutBody>> for RequestBuilder {
    fn from(request: ureq::RequestBuilder<WithoutBody>) -> Self {
        Self {
            request: RequestWrapper::WithOutBody(request),
            body: None,
        }
    }
}

impl RequestBuilder {
    /// Set a header with `key` and `value`.
    #[must_use]
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = match self.request {
            RequestWrapper::WithBody(r) => {
                RequestWrapper::WithBody(r.header(key.as_ref(), value.as_ref()))
            }
            RequestWrapper::WithOutBody(r) => {
                RequestWrapper::WithOutBody(r.header(key.as_ref(), value.as_ref()))
            }
        };
        self
    }

    /// Set bearer authentication `token`.
    #[must_use]
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header("authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Set the body as a collection of bytes.
    #[must_use]
    pub fn bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(bytes);
        self
    }

    /// Set the body as a serialized json object.
    ///
    /// # Errors
    /// Returns error if the value can not be serialized to json.
    pub fn json(self, value: impl Serialize) -> Result<Self> {
        let bytes = serde_json::to_vec(&value)?;
        Ok(self.json_bytes(bytes))
    }

    #[must_use]
    fn json_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(bytes);
        self.header("Content-Type", "application/json")
    }

    /// Set a query parameter with `key` and `value`.
    #[must_use]
    pub fn query(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = match self.request {
            RequestWrapper::WithBody(r) => {
                RequestWrapper::WithBody(r.query(key.as_ref(), value.as_ref()))
            }
            RequestWrapper::WithOutBody(r) => {
                RequestWrapper::WithOutBody(r.query(key.as_ref(), value.as_ref()))
            }
        };
        self
    }

    /// Limit the whole request, including reading the body, to `duration`.
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.request = match self.request {
            RequestWrapper::WithBody(r) => {
                RequestWrapper::WithBody(r.config().timeout_global(Some(duration)).build())
            }
            RequestWrapper::WithOutBody(r) => {
                RequestWrapper::WithOutBody(r.config().timeout_global(Some(duration)).build())
            }
        };
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProxyProtocol {
    Http,
    Socks5,
}

/// Proxy authentication information.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyAuth {
    /// Username.
    pub username: String,
    /// User password.
    pub password: SecretString,
}

impl PartialEq for ProxyAuth {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for ProxyAuth {}

impl Serialize for ProxyAuth {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ProxyAuth", 2)?;
        state.serialize_field("username", self.username.as_str())?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.end()
    }
}

/// HTTP proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Proxy {
    /// Protocol of the proxy.
    pub protocol: ProxyProtocol,
    /// Optional proxy authentication.
    pub auth: Option<ProxyAuth>,
    /// Url of the proxy.
    pub host: String,
    /// Port of the proxy.
    pub port: u16,
}

impl Proxy {
    /// Convert the proxy configuration into a usable url.
    ///
    /// # Errors
    /// Returns error if the generated url is not valid.
    pub fn to_url(&self) -> Result<Url> {
        let protocol = match self.protocol {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Socks5 => "socks5",
        };

        let auth = if let Some(auth) = &self.auth {
            format!("{}:{}@", auth.username, auth.password.expose_secret())
        } else {
            String::new()
        };

        Ok(Url::parse(&format!(
            "{protocol}://{auth}{}:{}",
            self.host.as_str(),
            self.port
        ))?)
    }
}

/// Http client builder.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Url,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: String,
    proxy: Option<Proxy>,
    allow_http: bool,
    default_headers: HashMap<String, String>,
}

impl ClientBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            user_agent: "NoClient/0.1.0".to_string(),
            base_url,
            request_timeout: None,
            connect_timeout: None,
            proxy: None,
            allow_http: false,
            default_headers: HashMap::new(),
        }
    }

    /// Set the user agent to be submitted with every request.
    #[must_use]
    pub fn user_agent(mut self, agent: &str) -> Self {
        self.user_agent = agent.to_string();
        self
    }

    /// Set the full request timeout. By default there is no timeout.
    ///
    /// Streaming requests ignore this value and use the timeout given to [`Client::stream`].
    #[must_use]
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the connection timeout. By default there is no timeout.
    #[must_use]
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Specify proxy URL for the builder.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Allow plain http requests.
    #[must_use]
    pub fn allow_http(mut self) -> Self {
        self.allow_http = true;
        self
    }

    /// Set a header with `key` and `value`.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Create the client.
    ///
    /// # Errors
    /// Returns error if the construction failed.
    pub fn build(self) -> Result<Arc<Client>> {
        let mut builder = ureq::Agent::config_builder();

        if let Some(d) = self.connect_timeout {
            builder = builder.timeout_connect(Some(d));
        }

        if let Some(proxy) = &self.proxy {
            let proxy = ureq::Proxy::new(proxy.to_url()?.as_str())?;
            builder = builder.proxy(Some(proxy));
        }

        if !self.allow_http {
            builder = builder.https_only(true);
        }

        let agent = builder
            .user_agent(&self.user_agent)
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            // status codes are classified by the caller.
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Arc::new(Client {
            agent,
            base_url: self.base_url,
            request_timeout: self.request_timeout,
            default_headers: self.default_headers,
            proxy: self.proxy,
        }))
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawResponse {
    /// Http status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: Vec<u8>,
}

/// Response whose body is consumed incrementally while the server keeps the connection open.
pub struct Streaming {
    status: u16,
    body: Body,
}

impl Streaming {
    /// Http status code of the response.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Read the remainder of the body, bounded like a regular response.
    ///
    /// # Errors
    /// Returns error if the body could not be read.
    pub fn into_raw(self) -> Result<RawResponse> {
        let mut response = http::Response::new(self.body);
        let mut body = Vec::new();
        response.safe_reader().read_to_end(&mut body)?;
        Ok(RawResponse {
            status: self.status,
            body,
        })
    }

    /// Unbounded reader over the body. The connection is released when the reader is dropped.
    #[must_use]
    pub fn into_reader(self) -> impl Read + 'static {
        self.body.into_reader()
    }
}

/// HTTP Client on which to execute requests.
///
/// All request executed on this client will be appended to the base url.
pub struct Client {
    agent: ureq::Agent,
    base_url: Url,
    request_timeout: Option<Duration>,
    default_headers: HashMap<String, String>,
    proxy: Option<Proxy>,
}

impl Client {
    /// Create a new builder with the given `base_url`.
    #[must_use]
    pub fn builder(base_url: Url) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// The base url in use by the client.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The proxy configuration in use by the client
    #[must_use]
    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Execute the request and return the status and body.
    ///
    /// Status codes are not inspected, a 404 is as much a valid result as a 200.
    ///
    /// # Errors
    /// Returns an error if the request construction, execution or body read failed.
    pub fn execute<R: Request>(&self, request: &R) -> Result<RawResponse> {
        let mut builder = self.prepare(request)?;
        if let Some(d) = self.request_timeout {
            builder = builder.timeout(d);
        }

        let mut response = Self::send(builder)?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        response.safe_reader().read_to_end(&mut body)?;
        debug!(status, len = body.len(), "{:?} {}", R::METHOD, request.url());

        Ok(RawResponse { status, body })
    }

    /// Execute the request and hand back the body without reading it.
    ///
    /// `timeout`, when set, bounds the whole connection including the body read.
    ///
    /// # Errors
    /// Returns an error if the request construction or execution failed.
    pub fn stream<R: Request>(&self, request: &R, timeout: Option<Duration>) -> Result<Streaming> {
        let mut builder = self.prepare(request)?;
        if let Some(d) = timeout {
            builder = builder.timeout(d);
        }

        let response = Self::send(builder)?;
        let status = response.status().as_u16();
        debug!(status, "{:?} {} (streaming)", R::METHOD, request.url());

        Ok(Streaming {
            status,
            body: response.into_body(),
        })
    }

    fn prepare<R: Request>(&self, request: &R) -> Result<RequestBuilder> {
        let url = self.base_url.join(&request.url())?;
        let mut builder: RequestBuilder = match R::METHOD {
            Method::Get => self.agent.get(url.as_str()).into(),
            Method::Put => self.agent.put(url.as_str()).into(),
            Method::Post => self.agent.post(url.as_str()).into(),
            Method::Delete => self.agent.delete(url.as_str()).into(),
            Method::Patch => self.agent.patch(url.as_str()).into(),
        };

        for (key, value) in &self.default_headers {
            builder = builder.header(key, value);
        }

        request.build(builder)
    }

    fn send(builder: RequestBuilder) -> Result<http::Response<Body>> {
        let response = match builder.request {
            RequestWrapper::WithBody(r) => {
                let body = builder
                    .body
                    .ok_or(Error::Unexpected(anyhow!("Body request without body")))?;
                r.send(body)?
            }
            RequestWrapper::WithOutBody(r) => r.call()?,
        };
        Ok(response)
    }
}

/// Extension trait to read the body with safe upper limit.
pub trait ExtSafeResponse {
    /// Create a safe reader that reads up to a maximum number of bytes from the server.
    fn safe_reader(&mut self) -> impl Read;
}

const MAX_BYTES_FROM_RESPONSE: u64 = 10_000_000;

impl ExtSafeResponse for http::Response<Body> {
    fn safe_reader(&mut self) -> impl Read {
        self.body_mut()
            .with_config()
            .limit(MAX_BYTES_FROM_RESPONSE)
            .reader()
    }
}
