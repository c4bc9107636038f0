use crate::domain::{Meta, Model, Updatable, insert_some, nullable, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Time span of an event. Which fields are set depends on `object`: `time`, `timespan`, `date`
/// or `datespan`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct When {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl When {
    #[must_use]
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.start_time.or(self.time))
    }

    #[must_use]
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.end_time.or(self.time))
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventParticipant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// One of `yes`, `no`, `maybe` or `noreply`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(flatten)]
    pub meta: Meta,
    pub calendar_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub busy: Option<bool>,
    pub read_only: Option<bool>,
    pub status: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub participants: Vec<EventParticipant>,
    pub when: Option<When>,
}

impl Model for Event {
    const OBJECT: &'static str = "event";
    const COLLECTION: &'static str = "events";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Updatable for Event {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "calendar_id", self.calendar_id.as_ref());
        insert_some(&mut map, "title", self.title.as_ref());
        insert_some(&mut map, "description", self.description.as_ref());
        insert_some(&mut map, "location", self.location.as_ref());
        insert_some(&mut map, "busy", self.busy);
        insert_some(&mut map, "participants", Some(&self.participants));
        insert_some(&mut map, "when", self.when.as_ref());
        map
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
