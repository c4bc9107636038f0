//! Handle tying an http [`Client`] to an account.

use crate::collection::Collection;
use crate::delta::Deltas;
use crate::domain::account::Account;
use crate::domain::calendar::Calendar;
use crate::domain::contact::Contact;
use crate::domain::draft::Draft;
use crate::domain::event::Event;
use crate::domain::file::File;
use crate::domain::folder::{Folder, Label};
use crate::domain::message::Message;
use crate::domain::thread::Thread;
use crate::domain::{Cursor, ExposeSecret, Model, SecretString, Updatable};
use crate::errors::{Error, Result};
use crate::materialize::Context;
use crate::registry::ObjectRegistry;
use crate::requests::{
    CursorResponse, DeleteRecordRequest, GetAccountRequest, GetRawMessageRequest,
    GetRecordRequest, PostGenerateCursorRequest, PostLatestCursorRequest, PostRecordRequest,
    PutRecordRequest,
};
use crate::response::{Options, Payload, interpret_response};
use chrono::{DateTime, Utc};
use nylas_http::{Client, Method, Proxy, Request, RequestBuilder, Streaming};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const DEFAULT_API_SERVER: &str = "https://api.nylas.com/";
pub(crate) const X_NYLAS_API_WRAPPER_HEADER: &str = "X-Nylas-API-Wrapper";
pub(crate) const API_WRAPPER: &str = "rust";

/// User agent sent with every request.
#[must_use]
pub fn user_agent() -> String {
    format!("Nylas Rust SDK {}", env!("CARGO_PKG_VERSION"))
}

/// Access to the resources of one account.
///
/// Cloning is cheap, clones share the client and the access token.
#[derive(Clone)]
pub struct Api {
    client: Arc<Client>,
    access_token: Arc<RwLock<Option<SecretString>>>,
    registry: Arc<ObjectRegistry>,
    context: Context,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.client.base_url().as_str())
            .field("account_id", &self.context.account_id)
            .finish_non_exhaustive()
    }
}

struct NylasRequest<'a, T: Request> {
    access_token: &'a RwLock<Option<SecretString>>,
    request: T,
}

impl<T: Request> Request for NylasRequest<'_, T> {
    const METHOD: Method = T::METHOD;

    fn url(&self) -> String {
        self.request.url()
    }

    fn build(&self, mut builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        if let Some(token) = self.access_token.read().as_ref() {
            builder = builder.bearer_token(token.expose_secret());
        } else {
            warn!("Request without access token");
        }
        builder = builder.header(X_NYLAS_API_WRAPPER_HEADER, API_WRAPPER);
        self.request.build(builder)
    }
}

impl Api {
    #[must_use]
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    /// Create a new instance over `client` with the default registry.
    #[must_use]
    pub fn new(client: Arc<Client>, access_token: Option<SecretString>) -> Self {
        Self {
            client,
            access_token: Arc::new(RwLock::new(access_token)),
            registry: Arc::new(ObjectRegistry::default()),
            context: Context::default(),
        }
    }

    /// Bind records without an account to `account_id`.
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.context.account_id = Some(account_id.into());
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ObjectRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    #[must_use]
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.context.account_id.as_deref()
    }

    /// Replace the access token, for this instance and all its clones.
    pub fn set_access_token(&self, access_token: Option<SecretString>) {
        *self.access_token.write() = access_token;
    }

    /// Execute `request` and interpret the response.
    ///
    /// # Errors
    /// Returns error if the request failed or the response does not satisfy `options`.
    pub fn execute<T: Request>(&self, request: T, options: &Options) -> Result<Payload> {
        let request = NylasRequest {
            access_token: &self.access_token,
            request,
        };
        let response = self.client.execute(&request)?;
        interpret_response(&response, options)
    }

    pub(crate) fn stream<T: Request>(
        &self,
        request: T,
        timeout: Option<Duration>,
    ) -> Result<Streaming> {
        let request = NylasRequest {
            access_token: &self.access_token,
            request,
        };
        Ok(self.client.stream(&request, timeout)?)
    }

    /// Inflate a json object sent by the server into `M`.
    ///
    /// # Errors
    /// Returns error if `value` is not an object or has invalid attributes.
    pub fn materialize<M: Model>(&self, value: Value) -> Result<M> {
        let Value::Object(attributes) = value else {
            return Err(Error::unexpected(format!("expected {} object", M::OBJECT)));
        };
        let mut model = M::from_attributes(attributes)
            .map_err(|e| Error::unexpected(format!("invalid {} attributes: {e}", M::OBJECT)))?;
        let meta = model.meta_mut();
        if meta.account_id.is_none() {
            meta.account_id.clone_from(&self.context.account_id);
        }
        Ok(model)
    }

    /// Cursor pointing at the most recent change.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn latest_cursor(&self) -> Result<Cursor> {
        self.cursor_from(PostLatestCursorRequest)
    }

    /// Cursor pointing at the changes made since `start`.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn generate_cursor(&self, start: DateTime<Utc>) -> Result<Cursor> {
        self.cursor_from(PostGenerateCursorRequest::new(start.timestamp()))
    }

    fn cursor_from<T: Request>(&self, request: T) -> Result<Cursor> {
        let value = self.execute(request, &Options::object())?.into_json();
        let response: CursorResponse =
            serde_json::from_value(value).map_err(|e| Error::unexpected(e.to_string()))?;
        Ok(response.cursor)
    }

    /// Changes made after `cursor`.
    #[must_use]
    pub fn deltas(&self, cursor: impl Into<Cursor>) -> Deltas {
        Deltas::new(self.clone(), cursor.into())
    }

    /// The account the access token belongs to.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn account(&self) -> Result<Account> {
        let value = self
            .execute(GetAccountRequest, &Options::object())?
            .into_json();
        self.materialize(value)
    }

    #[must_use]
    pub fn collection<M: Model>(&self) -> Collection<M> {
        Collection::new(self.clone())
    }

    #[must_use]
    pub fn threads(&self) -> Collection<Thread> {
        self.collection()
    }

    #[must_use]
    pub fn messages(&self) -> Collection<Message> {
        self.collection()
    }

    #[must_use]
    pub fn drafts(&self) -> Collection<Draft> {
        self.collection()
    }

    #[must_use]
    pub fn contacts(&self) -> Collection<Contact> {
        self.collection()
    }

    #[must_use]
    pub fn calendars(&self) -> Collection<Calendar> {
        self.collection()
    }

    #[must_use]
    pub fn events(&self) -> Collection<Event> {
        self.collection()
    }

    #[must_use]
    pub fn files(&self) -> Collection<File> {
        self.collection()
    }

    #[must_use]
    pub fn folders(&self) -> Collection<Folder> {
        self.collection()
    }

    #[must_use]
    pub fn labels(&self) -> Collection<Label> {
        self.collection()
    }

    /// Record of type `M` with `id`.
    ///
    /// # Errors
    /// Returns error if the request failed, the error is not found if the record does not exist.
    pub fn find<M: Model>(&self, id: &str) -> Result<M> {
        let mut model = M::with_id(id);
        self.reload(&mut model)?;
        Ok(model)
    }

    /// Replace the attributes of `model` with those stored on the server.
    ///
    /// # Errors
    /// Returns error if `model` has no id or the request failed.
    pub fn reload<M: Model>(&self, model: &mut M) -> Result<()> {
        self.reload_with_view(model, None)
    }

    pub(crate) fn reload_with_view<M: Model>(&self, model: &mut M, view: Option<&str>) -> Result<()> {
        let id = require_id(model)?;
        let request = GetRecordRequest::new(M::COLLECTION, &id).with_view(view);
        let value = self.execute(request, &Options::object())?.into_json();
        *model = self.materialize(value)?;
        Ok(())
    }

    /// Create `model` on the server and refresh it from the response, which assigns its id.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn create<M: Updatable>(&self, model: &mut M) -> Result<()> {
        let request = PostRecordRequest::new(M::COLLECTION, model.update_payload());
        let value = self.execute(request, &Options::object())?.into_json();
        *model = self.materialize(value)?;
        Ok(())
    }

    /// Create `model` if it has no id yet, update it otherwise.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn save<M: Updatable>(&self, model: &mut M) -> Result<()> {
        if model.id().is_some() {
            self.update(model)
        } else {
            self.create(model)
        }
    }

    /// Save the modifiable attributes of `model` and refresh it from the response.
    ///
    /// # Errors
    /// Returns error if `model` has no id or the request failed.
    pub fn update<M: Updatable>(&self, model: &mut M) -> Result<()> {
        let id = require_id(model)?;
        let request = PutRecordRequest::new(M::COLLECTION, &id, model.update_payload());
        let value = self.execute(request, &Options::object())?.into_json();
        *model = self.materialize(value)?;
        Ok(())
    }

    /// Delete `model` on the server.
    ///
    /// # Errors
    /// Returns error if `model` has no id or the request failed.
    pub fn destroy<M: Model>(&self, model: &M) -> Result<()> {
        let id = require_id(model)?;
        self.execute(DeleteRecordRequest::new(M::COLLECTION, &id), &Options::raw())?;
        Ok(())
    }

    /// RFC 822 source of the message with `id`.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn raw_message(&self, id: &str) -> Result<Vec<u8>> {
        Ok(self
            .execute(GetRawMessageRequest::new(id), &Options::raw())?
            .into_bytes())
    }
}

fn require_id<M: Model>(model: &M) -> Result<String> {
    model
        .id()
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::unexpected(format!("{} has no id", M::OBJECT)))
}

/// Builder for [`Api`].
#[derive(Debug)]
pub struct ApiBuilder {
    api_server: String,
    access_token: Option<SecretString>,
    account_id: Option<String>,
    registry: Option<ObjectRegistry>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    proxy: Option<Proxy>,
    allow_http: bool,
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self {
            api_server: DEFAULT_API_SERVER.to_owned(),
            access_token: None,
            account_id: None,
            registry: None,
            request_timeout: None,
            connect_timeout: None,
            proxy: None,
            allow_http: false,
        }
    }
}

impl ApiBuilder {
    #[must_use]
    pub fn api_server(mut self, url: impl Into<String>) -> Self {
        self.api_server = url.into();
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: ObjectRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Allow a plain http api server.
    #[must_use]
    pub fn allow_http(mut self) -> Self {
        self.allow_http = true;
        self
    }

    /// Create the api and its http client.
    ///
    /// # Errors
    /// Returns error if the api server url is invalid or the client could not be created.
    pub fn build(self) -> Result<Api> {
        let mut server = self.api_server;
        if !server.ends_with('/') {
            server.push('/');
        }
        let url = Url::parse(&server).map_err(nylas_http::Error::from)?;

        let mut builder = Client::builder(url).user_agent(&user_agent());
        if let Some(d) = self.request_timeout {
            builder = builder.request_timeout(d);
        }
        if let Some(d) = self.connect_timeout {
            builder = builder.connect_timeout(d);
        }
        if let Some(proxy) = self.proxy {
            builder = builder.with_proxy(proxy);
        }
        if self.allow_http {
            builder = builder.allow_http();
        }

        let mut api = Api::new(builder.build()?, self.access_token);
        if let Some(account_id) = self.account_id {
            api = api.with_account_id(account_id);
        }
        if let Some(registry) = self.registry {
            api = api.with_registry(registry);
        }
        Ok(api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_trailing_slash() {
        let api = Api::builder()
            .api_server("https://eu.api.nylas.com")
            .account_id("acc")
            .build()
            .unwrap();
        assert_eq!(api.client().base_url().as_str(), "https://eu.api.nylas.com/");
        assert_eq!(api.account_id(), Some("acc"));
    }

    #[test]
    fn invalid_server_is_rejected() {
        assert!(matches!(
            Api::builder().api_server("not a url").build(),
            Err(Error::Http(nylas_http::Error::Url(_)))
        ));
    }

    #[test]
    fn materialize_binds_account() {
        let api = Api::builder().account_id("acc").build().unwrap();
        let thread: Thread = api
            .materialize(serde_json::json!({"id": "t1"}))
            .unwrap();
        assert_eq!(thread.account_id(), Some("acc"));
        assert!(api.materialize::<Thread>(serde_json::json!([])).is_err());
    }
}
