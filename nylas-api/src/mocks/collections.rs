use crate::mocks::MatchExtension;
use mockito::{Mock, Server};
use serde_json::Value;

/// Mock the page of `collection` starting at `offset`.
pub fn page(server: &mut Server, collection: &str, offset: u64, records: &[Value]) -> Mock {
    server
        .mock("GET", format!("/{collection}").as_str())
        .match_auth()
        .match_params(&[("offset", offset.to_string().as_str())])
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(Value::from(records.to_vec()).to_string())
        .create()
}

/// Mock the count view of `collection`.
pub fn count(server: &mut Server, collection: &str, count: u64) -> Mock {
    server
        .mock("GET", format!("/{collection}").as_str())
        .match_auth()
        .match_params(&[("view", "count")])
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::json!({ "count": count }).to_string())
        .create()
}

/// Mock fetching the record `id` of `collection`.
pub fn get(server: &mut Server, collection: &str, id: &str, record: &Value) -> Mock {
    server
        .mock("GET", format!("/{collection}/{id}").as_str())
        .match_auth()
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(record.to_string())
        .create()
}
