use crate::api::Api;
use crate::collection::Collection;
use crate::domain::file::File;
use crate::domain::folder::{Folder, Label};
use crate::domain::{
    Embedded, Meta, Model, Participant, Updatable, embedded_ids, insert_some, nullable, timestamp,
};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Represents an email message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Message {
    #[serde(flatten)]
    pub meta: Meta,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    pub body: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub from: Vec<Participant>,
    #[serde(deserialize_with = "nullable")]
    pub to: Vec<Participant>,
    #[serde(deserialize_with = "nullable")]
    pub cc: Vec<Participant>,
    #[serde(deserialize_with = "nullable")]
    pub bcc: Vec<Participant>,
    #[serde(deserialize_with = "nullable")]
    pub reply_to: Vec<Participant>,
    /// Unix timestamp.
    pub date: Option<i64>,
    pub unread: Option<bool>,
    pub starred: Option<bool>,
    pub folder: Embedded<Folder>,
    #[serde(deserialize_with = "nullable")]
    pub labels: Vec<Embedded<Label>>,
    #[serde(deserialize_with = "nullable")]
    pub files: Vec<File>,
}

impl Message {
    #[must_use]
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        timestamp(self.date)
    }

    #[must_use]
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Attachments of this message.
    #[must_use]
    pub fn files(&self, api: &Api) -> Collection<File> {
        api.files()
            .filter("message_id", self.meta.id.clone().unwrap_or_default())
    }
}

impl Model for Message {
    const OBJECT: &'static str = "message";
    const COLLECTION: &'static str = "messages";

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

impl Updatable for Message {
    fn update_payload(&self) -> Map<String, Value> {
        organization_payload(self.unread, self.starred, &self.labels, &self.folder)
    }
}

impl Flags for Message {
    fn set_unread(&mut self, unread: bool) {
        self.unread = Some(unread);
    }

    fn set_starred(&mut self, starred: bool) {
        self.starred = Some(starred);
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}

/// Headers included in the expanded view of a message.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct Headers {
    #[serde(rename = "Message-Id")]
    pub message_id: Option<String>,
    #[serde(rename = "In-Reply-To")]
    pub in_reply_to: Option<String>,
    #[serde(rename = "References", deserialize_with = "nullable")]
    pub references: Vec<String>,
}

/// Message as returned by the expanded view, which adds threading headers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpandedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub headers: Option<Headers>,
}

impl Model for ExpandedMessage {
    const OBJECT: &'static str = "message";
    const COLLECTION: &'static str = "messages";

    fn meta(&self) -> &Meta {
        &self.message.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.message.meta
    }

    fn normalize(&mut self) -> serde_json::Result<()> {
        self.message.normalize()
    }
}

impl PartialEq for ExpandedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

/// Read and star state of messages and threads, saved as soon as it changes.
pub trait Flags: Updatable + Sized {
    fn set_unread(&mut self, unread: bool);

    fn set_starred(&mut self, starred: bool);

    /// # Errors
    /// Returns error if saving failed.
    fn mark_as_read(&mut self, api: &Api) -> Result<()> {
        self.set_unread(false);
        api.update(self)
    }

    /// # Errors
    /// Returns error if saving failed.
    fn mark_as_unread(&mut self, api: &Api) -> Result<()> {
        self.set_unread(true);
        api.update(self)
    }

    /// # Errors
    /// Returns error if saving failed.
    fn star(&mut self, api: &Api) -> Result<()> {
        self.set_starred(true);
        api.update(self)
    }

    /// # Errors
    /// Returns error if saving failed.
    fn unstar(&mut self, api: &Api) -> Result<()> {
        self.set_starred(false);
        api.update(self)
    }
}

/// Read state and placement, the only attributes of messages and threads the server accepts.
pub(crate) fn organization_payload(
    unread: Option<bool>,
    starred: Option<bool>,
    labels: &[Embedded<Label>],
    folder: &Embedded<Folder>,
) -> Map<String, Value> {
    let mut map = Map::new();
    insert_some(&mut map, "unread", unread);
    insert_some(&mut map, "starred", starred);
    let label_ids = embedded_ids(labels);
    if !label_ids.is_empty() {
        insert_some(&mut map, "label_ids", Some(label_ids));
    }
    insert_some(&mut map, "folder_id", folder.id());
    map
}
