use crate::domain::file::File;
use crate::domain::{Meta, Model, Participant, Updatable, insert_some, nullable};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Unsent message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Draft {
    #[serde(flatten)]
    pub meta: Meta,
    pub thread_id: Option<String>,
    pub reply_to_message_id: Option<String>,
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
    pub date: Option<i64>,
    /// Incremented by the server on every change, required when saving.
    pub version: Option<u64>,
    #[serde(deserialize_with = "nullable")]
    pub files: Vec<File>,
}

impl Model for Draft {
    const OBJECT: &'static str = "draft";
    const COLLECTION: &'static str = "drafts";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Updatable for Draft {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "thread_id", self.thread_id.as_ref());
        insert_some(&mut map, "reply_to_message_id", self.reply_to_message_id.as_ref());
        insert_some(&mut map, "subject", self.subject.as_ref());
        insert_some(&mut map, "body", self.body.as_ref());
        insert_some(&mut map, "from", Some(&self.from));
        insert_some(&mut map, "to", Some(&self.to));
        insert_some(&mut map, "cc", Some(&self.cc));
        insert_some(&mut map, "bcc", Some(&self.bcc));
        insert_some(&mut map, "reply_to", Some(&self.reply_to));
        insert_some(&mut map, "version", self.version);
        let file_ids: Vec<&str> = self.files.iter().filter_map(Model::id).collect();
        insert_some(&mut map, "file_ids", Some(file_ids));
        map
    }
}

impl PartialEq for Draft {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
