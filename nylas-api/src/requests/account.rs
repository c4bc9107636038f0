use nylas_http::{Method, Request};

/// Account the access token belongs to.
#[derive(Copy, Clone)]
pub struct GetAccountRequest;

impl Request for GetAccountRequest {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        "account".to_owned()
    }
}
