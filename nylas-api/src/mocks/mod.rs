//! Mock server helpers for tests of code built on this crate.

pub mod collections;
pub mod deltas;

use crate::api::{API_WRAPPER, X_NYLAS_API_WRAPPER_HEADER};
pub use mockito;
use mockito::{Matcher, Mock, Server, ServerOpts};

/// Access token expected by [`MatchExtension::match_auth`].
pub const ACCESS_TOKEN: &str = "mock-access-token";
/// Account the mocked records belong to.
pub const ACCOUNT_ID: &str = "mock-account";

/// Create new server.
#[must_use]
pub fn new() -> Server {
    Server::new_with_opts(ServerOpts {
        host: "127.0.0.1",
        port: 0,
        assert_on_drop: true,
    })
}

pub trait MatchExtension {
    /// Match against the access token and client headers.
    #[must_use]
    fn match_auth(self) -> Self;

    /// Match the request when all `params` are present in the query.
    #[must_use]
    fn match_params(self, params: &[(&str, &str)]) -> Self;
}

impl MatchExtension for Mock {
    fn match_auth(self) -> Self {
        self.match_header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str())
            .match_header(X_NYLAS_API_WRAPPER_HEADER, API_WRAPPER)
    }

    fn match_params(self, params: &[(&str, &str)]) -> Self {
        self.match_query(Matcher::AllOf(
            params
                .iter()
                .map(|(k, v)| Matcher::UrlEncoded((*k).to_owned(), (*v).to_owned()))
                .collect(),
        ))
    }
}

/// Mock an error response with the description `{type, message}`.
pub fn api_error(
    server: &mut Server,
    method: &str,
    path: &str,
    status: usize,
    error_type: &str,
    message: &str,
) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .match_auth()
        .with_status(status)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::json!({"type": error_type, "message": message}).to_string())
        .create()
}
