use nylas_http::{Method, Request, RequestBuilder};
use serde_json::{Map, Value};

/// One page of a collection.
pub struct GetCollectionRequest {
    collection: &'static str,
    query: Vec<(String, String)>,
}

impl GetCollectionRequest {
    #[must_use]
    pub fn new(collection: &'static str, query: Vec<(String, String)>) -> Self {
        Self { collection, query }
    }
}

impl Request for GetCollectionRequest {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        self.collection.to_owned()
    }

    fn build(&self, mut builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        for (key, value) in &self.query {
            builder = builder.query(key, value);
        }
        Ok(builder)
    }
}

pub struct GetRecordRequest<'a> {
    collection: &'static str,
    id: &'a str,
    view: Option<&'a str>,
}

impl<'a> GetRecordRequest<'a> {
    #[must_use]
    pub fn new(collection: &'static str, id: &'a str) -> Self {
        Self {
            collection,
            id,
            view: None,
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: Option<&'a str>) -> Self {
        self.view = view;
        self
    }
}

impl Request for GetRecordRequest<'_> {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        Ok(match self.view {
            Some(view) => builder.query("view", view),
            None => builder,
        })
    }
}

/// Message as RFC 822 text.
pub struct GetRawMessageRequest<'a> {
    id: &'a str,
}

impl<'a> GetRawMessageRequest<'a> {
    #[must_use]
    pub fn new(id: &'a str) -> Self {
        Self { id }
    }
}

impl Request for GetRawMessageRequest<'_> {
    const METHOD: Method = Method::Get;

    fn url(&self) -> String {
        format!("messages/{}", self.id)
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        Ok(builder.header("Accept", "message/rfc822"))
    }
}

pub struct PostRecordRequest {
    collection: &'static str,
    payload: Map<String, Value>,
}

impl PostRecordRequest {
    #[must_use]
    pub fn new(collection: &'static str, payload: Map<String, Value>) -> Self {
        Self {
            collection,
            payload,
        }
    }
}

impl Request for PostRecordRequest {
    const METHOD: Method = Method::Post;

    fn url(&self) -> String {
        self.collection.to_owned()
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        builder.json(&self.payload)
    }
}

pub struct PutRecordRequest<'a> {
    collection: &'static str,
    id: &'a str,
    payload: Map<String, Value>,
}

impl<'a> PutRecordRequest<'a> {
    #[must_use]
    pub fn new(collection: &'static str, id: &'a str, payload: Map<String, Value>) -> Self {
        Self {
            collection,
            id,
            payload,
        }
    }
}

impl Request for PutRecordRequest<'_> {
    const METHOD: Method = Method::Put;

    fn url(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    fn build(&self, builder: RequestBuilder) -> nylas_http::Result<RequestBuilder> {
        builder.json(&self.payload)
    }
}

pub struct DeleteRecordRequest<'a> {
    collection: &'static str,
    id: &'a str,
}

impl<'a> DeleteRecordRequest<'a> {
    #[must_use]
    pub fn new(collection: &'static str, id: &'a str) -> Self {
        Self { collection, id }
    }
}

impl Request for DeleteRecordRequest<'_> {
    const METHOD: Method = Method::Delete;

    fn url(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}
