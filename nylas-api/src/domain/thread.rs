use crate::api::Api;
use crate::collection::Collection;
use crate::domain::draft::Draft;
use crate::domain::folder::{Folder, Label};
use crate::domain::message::{ExpandedMessage, Flags, Message, organization_payload};
use crate::domain::{Embedded, Meta, Model, Participant, Updatable, nullable, timestamp};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Conversation grouping related messages and drafts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thread {
    #[serde(flatten)]
    pub meta: Meta,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub participants: Vec<Participant>,
    #[serde(deserialize_with = "nullable")]
    pub message_ids: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub draft_ids: Vec<String>,
    pub folder: Embedded<Folder>,
    #[serde(deserialize_with = "nullable")]
    pub labels: Vec<Embedded<Label>>,
    pub starred: Option<bool>,
    pub unread: Option<bool>,
    pub version: Option<u64>,
    pub has_attachments: Option<bool>,
    pub first_message_timestamp: Option<i64>,
    pub last_message_timestamp: Option<i64>,
    pub last_message_received_timestamp: Option<i64>,
    pub last_message_sent_timestamp: Option<i64>,
}

impl Thread {
    #[must_use]
    pub fn first_message_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.first_message_timestamp)
    }

    #[must_use]
    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.last_message_timestamp)
    }

    #[must_use]
    pub fn last_message_received_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.last_message_received_timestamp)
    }

    #[must_use]
    pub fn last_message_sent_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.last_message_sent_timestamp)
    }

    /// Messages of this thread.
    #[must_use]
    pub fn messages(&self, api: &Api) -> Collection<Message> {
        api.messages().filter("thread_id", self.thread_id())
    }

    /// Messages of this thread, with threading headers.
    #[must_use]
    pub fn expanded_messages(&self, api: &Api) -> Collection<ExpandedMessage> {
        Collection::new(api.clone())
            .filter("thread_id", self.thread_id())
            .view("expanded")
    }

    /// Drafts replying to this thread.
    #[must_use]
    pub fn drafts(&self, api: &Api) -> Collection<Draft> {
        api.drafts().filter("thread_id", self.thread_id())
    }

    fn thread_id(&self) -> String {
        self.meta.id.clone().unwrap_or_default()
    }
}

impl Model for Thread {
    const OBJECT: &'static str = "thread";
    const COLLECTION: &'static str = "threads";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn normalize(&mut self) -> serde_json::Result<()> {
        self.folder.normalize()?;
        for label in &mut self.labels {
            label.normalize()?;
        }
        Ok(())
    }
}

impl Updatable for Thread {
    fn update_payload(&self) -> Map<String, Value> {
        organization_payload(self.unread, self.starred, &self.labels, &self.folder)
    }
}

impl Flags for Thread {
    fn set_unread(&mut self, unread: bool) {
        self.unread = Some(unread);
    }

    fn set_starred(&mut self, starred: bool) {
        self.starred = Some(starred);
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn inflate_assigns_known_fields_and_keeps_raw() {
        let thread = Thread::from_attributes(attributes(json!({
            "id": "t1",
            "account_id": "acc",
            "subject": "hi",
            "unread": true,
            "participants": [{"name": "Ann", "email": "ann@example.com"}],
            "last_message_timestamp": 1_600_000_000,
            "shiny_new_field": 42,
        })))
        .unwrap();

        assert_eq!(thread.id(), Some("t1"));
        assert_eq!(thread.account_id(), Some("acc"));
        assert_eq!(thread.subject.as_deref(), Some("hi"));
        assert_eq!(thread.unread, Some(true));
        assert_eq!(thread.participants[0].email.as_deref(), Some("ann@example.com"));
        assert_eq!(
            thread.last_message_at().map(|t| t.timestamp()),
            Some(1_600_000_000)
        );
        assert_eq!(thread.raw().get("shiny_new_field"), Some(&json!(42)));
        assert!(thread.cursor().is_none());
    }

    #[test]
    fn embedded_labels_are_typed_after_inflate() {
        let thread = Thread::from_attributes(attributes(json!({
            "id": "t1",
            "labels": [{"id": "l1", "name": "inbox", "display_name": "Inbox"}],
            "folder": null,
            "message_ids": null,
        })))
        .unwrap();

        assert_eq!(thread.labels.len(), 1);
        let label = thread.labels[0].typed().unwrap();
        assert_eq!(label.id(), Some("l1"));
        assert_eq!(label.display_name.as_deref(), Some("Inbox"));
        assert_eq!(thread.folder, Embedded::NotLoaded);
        assert!(thread.message_ids.is_empty());
    }

    #[test]
    fn update_payload_only_has_mutable_fields() {
        let mut thread = Thread::from_attributes(attributes(json!({
            "id": "t1",
            "subject": "hi",
            "snippet": "hello there",
            "labels": [{"id": "l1"}, {"id": "l2"}],
            "folder": {"id": "f1", "name": "archive"},
        })))
        .unwrap();
        thread.starred = Some(true);

        let payload = thread.update_payload();
        assert!(!payload.contains_key("subject"));
        assert!(!payload.contains_key("snippet"));
        assert!(!payload.contains_key("unread"));
        assert_eq!(payload.get("starred"), Some(&json!(true)));
        assert_eq!(payload.get("label_ids"), Some(&json!(["l1", "l2"])));
        assert_eq!(payload.get("folder_id"), Some(&json!("f1")));
    }

    #[test]
    fn equality_is_identity() {
        let a = Thread::from_attributes(attributes(json!({"id": "t1", "subject": "a"}))).unwrap();
        let b = Thread::from_attributes(attributes(json!({"id": "t1", "subject": "b"}))).unwrap();
        let c = Thread::from_attributes(attributes(json!({"id": "t2", "subject": "a"}))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
