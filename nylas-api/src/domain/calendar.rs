use crate::domain::{Meta, Model, Updatable, insert_some};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Calendar {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: Option<String>,
    pub description: Option<String>,
    pub read_only: Option<bool>,
    pub timezone: Option<String>,
}

impl Model for Calendar {
    const OBJECT: &'static str = "calendar";
    const COLLECTION: &'static str = "calendars";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Updatable for Calendar {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "name", self.name.as_ref());
        insert_some(&mut map, "description", self.description.as_ref());
        map
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
