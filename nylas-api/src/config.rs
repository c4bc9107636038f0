use crate::api::{Api, DEFAULT_API_SERVER};
use crate::domain::SecretString;
use crate::errors::Result;
use nylas_http::Proxy;
use serde::Deserialize;
use std::time::Duration;

/// Settings from which an [`Api`] is created.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_server: String,
    pub access_token: Option<SecretString>,
    pub account_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub proxy: Option<Proxy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_server: DEFAULT_API_SERVER.to_owned(),
            access_token: None,
            account_id: None,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            proxy: None,
        }
    }
}

impl Config {
    /// Create the [`Api`] described by this configuration.
    ///
    /// # Errors
    /// Returns error if the api server url is invalid or the client could not be created.
    pub fn into_api(self) -> Result<Api> {
        let mut builder = Api::builder().api_server(self.api_server);
        if let Some(token) = self.access_token {
            builder = builder.access_token(token);
        }
        if let Some(account_id) = self.account_id {
            builder = builder.account_id(account_id);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(proxy) = self.proxy {
            builder = builder.proxy(proxy);
        }
        builder.build()
    }
}
