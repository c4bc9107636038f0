use crate::delta::ChangeRecord;
use crate::domain::Cursor;
use crate::mocks::MatchExtension;
use crate::requests::{CursorResponse, DeltaPage};
use mockito::{Matcher, Mock, Server};
use serde_json::{Map, Value};

/// Change record of `object` with `attributes`.
#[must_use]
pub fn change(object: &str, event: &str, id: &str, cursor: &str, attributes: Value) -> ChangeRecord {
    let attributes = match attributes {
        Value::Object(mut map) => {
            map.entry("id").or_insert_with(|| Value::from(id));
            Some(map)
        }
        Value::Null => None,
        _ => Some(Map::new()),
    };
    ChangeRecord {
        object: object.to_owned(),
        event: event.to_owned(),
        id: Some(id.to_owned()),
        cursor: Some(cursor.to_owned()),
        attributes,
    }
}

/// Mock the latest cursor request.
pub fn latest_cursor(server: &mut Server, cursor: &str) -> Mock {
    server
        .mock("POST", "/delta/latest_cursor")
        .match_auth()
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::to_vec(&CursorResponse { cursor: Cursor::from(cursor) }).unwrap())
        .create()
}

/// Mock the generate cursor request for `start`.
pub fn generate_cursor(server: &mut Server, start: i64, cursor: &str) -> Mock {
    server
        .mock("POST", "/delta/generate_cursor")
        .match_auth()
        .match_body(Matcher::Json(serde_json::json!({ "start": start })))
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::to_vec(&CursorResponse { cursor: Cursor::from(cursor) }).unwrap())
        .create()
}

/// Mock the delta page requested with `cursor`.
pub fn page(server: &mut Server, cursor: &str, cursor_end: &str, deltas: Vec<ChangeRecord>) -> Mock {
    let page = DeltaPage {
        cursor_start: Cursor::from(cursor),
        cursor_end: Cursor::from(cursor_end),
        deltas,
    };
    server
        .mock("GET", "/delta")
        .match_auth()
        .match_params(&[("cursor", cursor), ("exclude_folders", "false")])
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::to_vec(&page).unwrap())
        .create()
}

/// Mock the streaming endpoint for `cursor`, sending `deltas` as newline separated frames.
pub fn stream(server: &mut Server, cursor: &str, deltas: &[ChangeRecord]) -> Mock {
    let mut body = String::new();
    for change in deltas {
        body.push_str(&serde_json::to_string(change).unwrap());
        body.push('\n');
    }
    server
        .mock("GET", "/delta/streaming")
        .match_auth()
        .match_params(&[("cursor", cursor)])
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(body)
        .create()
}
