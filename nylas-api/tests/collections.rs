use crate::utils::new_mock_api_and_server;
use nylas_api::domain::Model;
use nylas_api::domain::thread::Thread;
use nylas_api::mocks::MatchExtension;
use nylas_api::mocks::collections::{count, get, page};
use nylas_api::mocks::{ACCOUNT_ID, api_error};
use nylas_api::{ApiErrorKind, Error};
use serde_json::json;

mod utils;

fn threads(ids: &[&str]) -> Vec<serde_json::Value> {
    ids.iter()
        .map(|id| json!({"id": id, "object": "thread", "subject": format!("subject {id}")}))
        .collect()
}

#[test]
fn execute_returns_page_unmodified() {
    let (api, mut server) = new_mock_api_and_server();
    let records = vec![
        json!({"id": "t1", "subject": "a", "labels": [{"id": "l1"}]}),
        json!({"id": "t2", "future_field": {"nested": [1, 2]}}),
    ];
    let _mock = page(&mut server, "threads", 0, &records);

    assert_eq!(api.threads().execute().unwrap(), records);
}

#[test]
fn find_each_stops_on_short_page() {
    let (api, mut server) = new_mock_api_and_server();
    let first = page(&mut server, "threads", 0, &threads(&["t1", "t2"]));
    let second = page(&mut server, "threads", 2, &threads(&["t3"]));

    let found = api
        .threads()
        .per_page(2)
        .find_each()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    first.assert();
    second.assert();

    let ids: Vec<_> = found.iter().filter_map(Model::id).collect();
    assert_eq!(ids, ["t1", "t2", "t3"]);
    assert!(found.iter().all(|t| t.account_id() == Some(ACCOUNT_ID)));
}

#[test]
fn find_each_stops_on_empty_page() {
    let (api, mut server) = new_mock_api_and_server();
    let _first = page(&mut server, "threads", 0, &threads(&["t1", "t2"]));
    let _second = page(&mut server, "threads", 2, &[]);

    let found = api
        .threads()
        .per_page(2)
        .find_each()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn find_each_uses_default_page_size_for_zero() {
    let (api, mut server) = new_mock_api_and_server();
    let mock = server
        .mock("GET", "/threads")
        .match_auth()
        .match_params(&[("offset", "0"), ("limit", "100")])
        .with_status(200)
        .with_body(serde_json::Value::from(threads(&["t1", "t2"])).to_string())
        .create();

    let found = api
        .threads()
        .per_page(0)
        .find_each()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    mock.assert();
    assert_eq!(found.len(), 2);
}

#[test]
fn find_each_honors_limit() {
    let (api, mut server) = new_mock_api_and_server();
    let first = server
        .mock("GET", "/threads")
        .match_auth()
        .match_params(&[("offset", "0"), ("limit", "2")])
        .with_status(200)
        .with_body(serde_json::Value::from(threads(&["t1", "t2"])).to_string())
        .create();

    let found = api
        .threads()
        .per_page(2)
        .limit(2)
        .find_each()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    first.assert();
    assert_eq!(found.len(), 2);
}

#[test]
fn find_each_truncates_page_at_limit() {
    let (api, mut server) = new_mock_api_and_server();
    let _first = page(&mut server, "threads", 0, &threads(&["t1", "t2", "t3"]));

    let found = api
        .threads()
        .per_page(3)
        .limit(2)
        .find_each()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn each_reads_a_single_page() {
    let (api, mut server) = new_mock_api_and_server();
    let _first = page(&mut server, "threads", 4, &threads(&["t5", "t6"]));

    let found = api
        .threads()
        .offset(4)
        .per_page(2)
        .each()
        .unwrap()
        .collect::<Result<Vec<Thread>, _>>()
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].subject.as_deref(), Some("subject t5"));
}

#[test]
fn filters_are_sent_verbatim() {
    let (api, mut server) = new_mock_api_and_server();
    let mock = server
        .mock("GET", "/messages")
        .match_auth()
        .match_params(&[
            ("thread_id", "t1"),
            ("unread", "true"),
            ("in", "inbox"),
            ("limit", "1"),
        ])
        .with_status(200)
        .with_body(json!([{"id": "m1", "thread_id": "t1"}]).to_string())
        .create();

    let thread = Thread::with_id("t1");
    let message = thread
        .messages(&api)
        .filter("unread", true)
        .filters([("in", "inbox")])
        .filter("unread", true)
        .first()
        .unwrap()
        .unwrap();
    mock.assert();
    assert_eq!(message.thread_id.as_deref(), Some("t1"));
}

#[test]
fn first_of_empty_page_is_none() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = page(&mut server, "contacts", 0, &[]);
    assert!(api.contacts().first().unwrap().is_none());
}

#[test]
fn count_uses_count_view() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = count(&mut server, "threads", 42);
    assert_eq!(api.threads().filter("unread", true).count().unwrap(), 42);
}

#[test]
fn find_fetches_by_id() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = get(
        &mut server,
        "threads",
        "t1",
        &json!({"id": "t1", "subject": "hello", "account_id": "other"}),
    );

    let thread = api.threads().find("t1").unwrap();
    assert_eq!(thread.subject.as_deref(), Some("hello"));
    assert_eq!(thread.account_id(), Some("other"));
}

#[test]
fn find_missing_record_is_not_found() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = api_error(
        &mut server,
        "GET",
        "/threads/nope",
        404,
        "invalid_request_error",
        "Couldn't find thread",
    );

    let error = api.threads().find("nope").unwrap_err();
    assert!(error.is_not_found());
    let Error::Api(error) = error else {
        panic!("expected api error");
    };
    assert_eq!(error.kind, ApiErrorKind::ResourceNotFound);
    assert_eq!(error.message.as_deref(), Some("Couldn't find thread"));
}

#[test]
fn non_array_page_is_unexpected() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = server
        .mock("GET", "/threads")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id": "t1"}"#)
        .create();

    assert!(matches!(
        api.threads().execute(),
        Err(Error::UnexpectedResponse(Some(_)))
    ));
}
