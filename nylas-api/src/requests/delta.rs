use crate::delta::ChangeRecord;
use crate::domain::Cursor;
use nylas_http::{Method, Request, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

#[doc(hidden)]
#[derive(Deserialize)]
#[cfg_attr(feature = "mocks", derive(serde::Serialize))]
pub struct CursorResponse {
    pub cursor: Cursor,
}

/// One batch of changes.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "mocks", derive(serde::Serialize))]
pub struct DeltaPage {
    pub cursor_start: Cursor,
    pub cursor_end: Cursor,
    #[serde(default, deserialize_with = "crate::domain::nullable")]
    pub deltas: Vec<ChangeRecord>,
}

impl DeltaPage {
    /// No changes are left after this page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor_start == self.cursor_end
    }
}

#[derive(Copy, Clone)]
pub struct PostLatestCursorRequest;

impl Request for PostLatestCursorRequest {
    const METHOD: Method = Method::Post;

    fn url(&self) -> String {
        "delta/latest_cursor".to_owned()
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        Ok(builder.bytes(Vec::new()))
    }
}

/// Cursor positioned at `start`, a unix timestamp.
#[derive(Copy, Clone)]
pub struct PostGenerateCursorRequest {
    start: i64,
}

impl PostGenerateCursorRequest {
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self { start }
    }
}

impl Request for PostGenerateCursorRequest {
    const METHOD: Method = Method::Post;

    fn url(&self) -> String {
        "delta/generate_cursor".to_owned()
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        builder.json(serde_json::json!({ "start": self.start }))
    }
}

/// Query shared by the polling and streaming endpoints.
#[derive(Debug, Clone)]
pub struct DeltaQuery<'a> {
    pub cursor: &'a Cursor,
    pub exclude_types: Option<&'a str>,
    pub expanded: bool,
}

impl DeltaQuery<'_> {
    fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        builder = builder.query("cursor", self.cursor.as_str());
        if let Some(types) = self.exclude_types {
            builder = builder.query("exclude_types", types);
        }
        if self.expanded {
            builder = builder.query("view", "expanded");
        }
        builder
    }
}

pub struct GetDeltaRequest<'a> {
    query: DeltaQuery<'a>,
}

impl<'a> GetDeltaRequest<'a> {
    #[must_use]
    pub fn new(query: DeltaQuery<'a>) -> Self {
        Self { query }
    }
}

impl Request for GetDeltaRequest<'_> {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        "delta".to_owned()
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        Ok(self
            .query
            .apply(builder)
            .query("exclude_folders", "false"))
    }
}

/// Long-lived request for changes pushed by the server. Without a timeout the server keeps the
/// connection open until the client goes away.
pub struct GetDeltaStreamRequest<'a> {
    query: DeltaQuery<'a>,
    timeout: Option<Duration>,
}

impl<'a> GetDeltaStreamRequest<'a> {
    #[must_use]
    pub fn new(query: DeltaQuery<'a>, timeout: Option<Duration>) -> Self {
        Self { query, timeout }
    }
}

impl Request for GetDeltaStreamRequest<'_> {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        "delta/streaming".to_owned()
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        Ok(self
            .query
            .apply(builder)
            .query("timeout", timeout_secs(self.timeout).to_string()))
    }
}

/// Whole seconds for the `timeout` parameter, rounded up so that sub-second timeouts do not turn
/// into `0`, which the server reads as no timeout.
fn timeout_secs(timeout: Option<Duration>) -> u64 {
    timeout.map_or(0, |d| d.as_secs() + u64::from(d.subsec_nanos() > 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_rounded_up_to_seconds() {
        assert_eq!(timeout_secs(None), 0);
        assert_eq!(timeout_secs(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_secs(Some(Duration::from_millis(500))), 1);
        assert_eq!(timeout_secs(Some(Duration::from_secs(60))), 60);
        assert_eq!(timeout_secs(Some(Duration::from_millis(60_001))), 61);
    }
}
