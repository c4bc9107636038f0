use crate::utils::{new_mock_api_and_server, new_single_response_api};
use nylas_api::delta::{ChangeEvent, Delta, StopHandle};
use nylas_api::domain::contact::Contact;
use nylas_api::domain::message::{ExpandedMessage, Message};
use nylas_api::domain::thread::Thread;
use nylas_api::domain::{Cursor, Record};
use nylas_api::mocks::deltas::{change, page};
use nylas_api::mocks::{ACCOUNT_ID, MatchExtension};
use mockito::Matcher;
use nylas_api::{ApiErrorKind, Error};
use serde_json::json;
use std::ops::ControlFlow;
use std::time::Duration;

mod utils;

#[test]
fn poll_stops_when_caught_up() {
    let (api, mut server) = new_mock_api_and_server();
    let first = page(
        &mut server,
        "c0",
        "c2",
        vec![
            change("thread", "create", "t1", "c1", json!({"subject": "hi"})),
            change("message", "modify", "m1", "c2", json!({"unread": true})),
        ],
    );
    let second = page(
        &mut server,
        "c2",
        "c2",
        vec![change("thread", "delete", "t1", "c3", json!(null))],
    );

    let mut poll = api.deltas("c0").poll();
    let deltas = poll.by_ref().collect::<Result<Vec<Delta>, _>>().unwrap();
    first.assert();
    second.assert();

    assert_eq!(poll.pages(), 2);
    assert_eq!(poll.cursor(), &Cursor::from("c2"));
    assert_eq!(deltas.len(), 3);

    assert_eq!(deltas[0].event, ChangeEvent::Create);
    let Record::Thread(thread) = &deltas[0].record else {
        panic!("expected thread, got {:?}", deltas[0].record);
    };
    assert_eq!(thread.subject.as_deref(), Some("hi"));
    assert_eq!(deltas[0].record.account_id(), Some(ACCOUNT_ID));
    assert_eq!(deltas[0].record.cursor(), Some(&Cursor::from("c1")));

    assert_eq!(deltas[1].event, ChangeEvent::Modify);
    let message: Message = deltas[1].record.clone().into_model().unwrap();
    assert_eq!(message.unread, Some(true));

    assert_eq!(deltas[2].event, ChangeEvent::Delete);
    assert_eq!(deltas[2].record.id(), Some("t1"));
    assert!(deltas[2].record.account_id().is_none());
}

#[test]
fn poll_skips_unknown_objects() {
    let (api, mut server) = new_mock_api_and_server();
    let _page = page(
        &mut server,
        "c0",
        "c0",
        vec![
            change("widget", "create", "w1", "c1", json!({})),
            change("contact", "create", "p1", "c2", json!({"given_name": "Ann"})),
        ],
    );

    let deltas = api
        .deltas("c0")
        .poll()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(deltas.len(), 1);
    let contact: Contact = deltas[0].record.clone().into_model().unwrap();
    assert_eq!(contact.given_name.as_deref(), Some("Ann"));
}

#[test]
fn poll_sends_exclusions_and_view() {
    let (api, mut server) = new_mock_api_and_server();
    let mock = server
        .mock("GET", "/delta")
        .match_auth()
        .match_params(&[
            ("cursor", "c0"),
            ("exclude_types", "contact,event"),
            ("view", "expanded"),
        ])
        .with_status(200)
        .with_body(
            json!({
                "cursor_start": "c0",
                "cursor_end": "c0",
                "deltas": [{
                    "object": "message",
                    "event": "create",
                    "id": "m1",
                    "cursor": "c1",
                    "attributes": {
                        "id": "m1",
                        "headers": {"Message-Id": "<a@b.c>", "References": null},
                    },
                }],
            })
            .to_string(),
        )
        .create();

    let deltas = api
        .deltas("c0")
        .exclude_model::<Contact>()
        .exclude(["event", "contact", "widget"])
        .expanded(true)
        .poll()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    mock.assert();

    let message: ExpandedMessage = deltas[0].record.clone().into_model().unwrap();
    let headers = message.headers.unwrap();
    assert_eq!(headers.message_id.as_deref(), Some("<a@b.c>"));
    assert!(headers.references.is_empty());
}

#[test]
fn poll_gives_up_after_max_pages() {
    let (api, mut server) = new_mock_api_and_server();
    let _first = page(
        &mut server,
        "c0",
        "c1",
        vec![change("thread", "create", "t1", "c1", json!({}))],
    );

    let mut poll = api.deltas("c0").max_pages(1).poll();
    assert!(poll.next().unwrap().is_ok());
    assert!(poll.next().is_none());
    assert_eq!(poll.cursor(), &Cursor::from("c1"));
}

#[test]
fn poll_resumes_at_page_start_after_invalid_record() {
    let (api, mut server) = new_mock_api_and_server();
    let _page = page(
        &mut server,
        "c0",
        "c3",
        vec![
            change("thread", "create", "t1", "c1", json!({})),
            change("thread", "create", "t2", "c2", json!({"subject": 12})),
            change("thread", "create", "t3", "c3", json!({})),
        ],
    );

    let mut poll = api.deltas("c0").poll();
    assert!(poll.next().unwrap().is_ok());
    assert_eq!(poll.cursor(), &Cursor::from("c0"));
    assert!(matches!(poll.next(), Some(Err(Error::UnexpectedResponse(_)))));
    assert_eq!(poll.cursor(), &Cursor::from("c0"));
    assert!(poll.next().is_none());
    assert_eq!(poll.cursor(), &Cursor::from("c0"));
}

#[test]
fn poll_reports_api_errors() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = nylas_api::mocks::api_error(
        &mut server,
        "GET",
        "/delta",
        403,
        "invalid_request_error",
        "Token revoked",
    );

    let mut poll = api.deltas("c0").poll();
    let Some(Err(Error::Api(error))) = poll.next() else {
        panic!("expected api error");
    };
    assert_eq!(error.kind, ApiErrorKind::AccessDenied);
    assert_eq!(error.message.as_deref(), Some("Token revoked"));
    assert!(poll.next().is_none());
}

#[test]
fn stream_delivers_records_until_closed() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = nylas_api::mocks::deltas::stream(
        &mut server,
        "c0",
        &[
            change("thread", "create", "t1", "c1", json!({"subject": "one"})),
            change("widget", "create", "w1", "c2", json!({})),
            change("thread", "modify", "t1", "c3", json!({"subject": "two"})),
        ],
    );

    let mut received = Vec::new();
    api.deltas("c0")
        .stream(Duration::from_secs(5), &StopHandle::new(), |delta| {
            received.push(delta);
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(received.len(), 2);
    let subjects: Vec<_> = received
        .into_iter()
        .map(|d| d.record.into_model::<Thread>().unwrap().subject)
        .collect();
    assert_eq!(subjects, [Some("one".to_owned()), Some("two".to_owned())]);
}

fn mock_three_threads(server: &mut mockito::Server) -> mockito::Mock {
    nylas_api::mocks::deltas::stream(
        server,
        "c0",
        &[
            change("thread", "create", "t1", "c1", json!({})),
            change("thread", "create", "t2", "c2", json!({})),
            change("thread", "create", "t3", "c3", json!({})),
        ],
    )
}

#[test]
fn stream_stops_when_callback_breaks() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = mock_three_threads(&mut server);

    let mut count = 0;
    api.deltas("c0")
        .stream(Duration::from_secs(5), &StopHandle::new(), |_| {
            count += 1;
            ControlFlow::Break(())
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn stream_stops_when_signalled() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = mock_three_threads(&mut server);

    let stop = StopHandle::new();
    let mut count = 0;
    api.deltas("c0")
        .stream(Duration::from_secs(5), &stop, |_| {
            count += 1;
            if count == 2 {
                stop.stop();
            }
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn stream_ends_cleanly_when_timeout_elapses_between_frames() {
    let frame = serde_json::to_string(&change("thread", "create", "t1", "c1", json!({}))).unwrap();
    let chunk = format!("{frame}\n");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{chunk}\r\n",
        chunk.len()
    );
    let api = new_single_response_api(response.into_bytes(), Duration::from_secs(5));

    let mut received = Vec::new();
    api.deltas("c0")
        .stream(Duration::from_secs(1), &StopHandle::new(), |delta| {
            received.push(delta);
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].record.id(), Some("t1"));
}

#[test]
fn stream_ends_cleanly_when_timeout_elapses_before_response() {
    let api = new_single_response_api(Vec::new(), Duration::from_secs(5));

    let mut count = 0;
    api.deltas("c0")
        .stream(Duration::from_secs(1), &StopHandle::new(), |_| {
            count += 1;
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn stream_reports_frame_cut_off_by_close() {
    let (api, mut server) = new_mock_api_and_server();
    let frame = serde_json::to_string(&change("thread", "create", "t1", "c1", json!({}))).unwrap();
    let _mock = server
        .mock("GET", "/delta/streaming")
        .match_auth()
        .match_params(&[("cursor", "c0")])
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(format!("{frame}\n{{\"object\":\"thread\",\"eve"))
        .create();

    let mut count = 0;
    let result = api
        .deltas("c0")
        .stream(Duration::from_secs(5), &StopHandle::new(), |_| {
            count += 1;
            ControlFlow::Continue(())
        });
    assert!(matches!(result, Err(Error::UnexpectedResponse(_))));
    assert_eq!(count, 1);
}

#[test]
fn stream_without_timeout() {
    let (api, mut server) = new_mock_api_and_server();
    let mock = server
        .mock("GET", "/delta/streaming")
        .match_auth()
        .match_params(&[("cursor", "c0"), ("timeout", "0")])
        .with_status(200)
        .with_body("")
        .create();

    api.deltas("c0")
        .stream(Duration::ZERO, &StopHandle::new(), |_| ControlFlow::Continue(()))
        .unwrap();
    mock.assert();
}

#[test]
fn stream_rounds_timeout_up_to_seconds() {
    let (api, mut server) = new_mock_api_and_server();
    let mock = server
        .mock("GET", "/delta/streaming")
        .match_auth()
        .match_query(Matcher::UrlEncoded("timeout".into(), "1".into()))
        .with_status(200)
        .with_body("")
        .create();

    api.deltas("c0")
        .stream(Duration::from_millis(500), &StopHandle::new(), |_| {
            ControlFlow::Continue(())
        })
        .unwrap();
    mock.assert();
}

#[test]
fn stream_reports_api_errors() {
    let (api, mut server) = new_mock_api_and_server();
    let _mock = nylas_api::mocks::api_error(
        &mut server,
        "GET",
        "/delta/streaming",
        429,
        "api_error",
        "Slow down",
    );

    let result = api
        .deltas("c0")
        .stream(Duration::from_secs(5), &StopHandle::new(), |_| {
            ControlFlow::Continue(())
        });
    let Err(Error::Api(error)) = result else {
        panic!("expected api error");
    };
    assert_eq!(error.kind, ApiErrorKind::SendingQuotaExceeded);
}

#[test]
fn cursors() {
    let (api, mut server) = new_mock_api_and_server();
    let _latest = nylas_api::mocks::deltas::latest_cursor(&mut server, "latest");
    let _generated = nylas_api::mocks::deltas::generate_cursor(&mut server, 1_600_000_000, "gen");

    assert_eq!(api.latest_cursor().unwrap(), Cursor::from("latest"));
    let start = chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap();
    assert_eq!(api.generate_cursor(start).unwrap(), Cursor::from("gen"));
}
