use crate::domain::{Meta, Model, Updatable, insert_some};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Mailbox folder, for providers where a message lives in exactly one place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Folder {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: Option<String>,
    pub display_name: Option<String>,
}

/// Label, for providers where a message may carry several.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Label {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: Option<String>,
    pub display_name: Option<String>,
}

impl Model for Folder {
    const OBJECT: &'static str = "folder";
    const COLLECTION: &'static str = "folders";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Model for Label {
    const OBJECT: &'static str = "label";
    const COLLECTION: &'static str = "labels";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Updatable for Folder {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "display_name", self.display_name.as_ref());
        map
    }
}

impl Updatable for Label {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "display_name", self.display_name.as_ref());
        map
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
