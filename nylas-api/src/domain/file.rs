use crate::domain::{Meta, Model, nullable};
use serde::Deserialize;

/// Attachment metadata. File content is not part of the model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct File {
    #[serde(flatten)]
    pub meta: Meta,
    pub filename: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub content_id: Option<String>,
    pub content_disposition: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub message_ids: Vec<String>,
}

impl Model for File {
    const OBJECT: &'static str = "file";
    const COLLECTION: &'static str = "files";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
