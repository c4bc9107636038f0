//! Domain Types.
//!
//! Every resource the API exposes is a [`Model`]. Models are inflated from the json attributes
//! sent by the server: known fields are assigned, unknown ones are kept only in the raw attribute
//! map so that newer server versions do not break older clients.

pub mod account;
pub mod calendar;
pub mod contact;
pub mod draft;
pub mod event;
pub mod file;
pub mod folder;
pub mod message;
mod record;
pub mod thread;

pub use record::Record;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

pub type SecretString = secrecy::SecretString;
pub use secrecy::ExposeSecret;

/// Position in the change history of an account.
///
/// Cursors are issued by the server and have no meaning to the client besides equality.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Hash, Clone)]
pub struct Cursor(pub String);

impl Cursor {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity and bookkeeping shared by every model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub id: Option<String>,
    pub account_id: Option<String>,
    /// Set when the model was produced by the delta feed.
    #[serde(skip)]
    pub cursor: Option<Cursor>,
    /// Attributes the model was inflated from.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

/// A resource of the Nylas API.
pub trait Model:
    DeserializeOwned + Default + Clone + Into<Record> + TryFrom<Record, Error = Record>
{
    /// Object type name used by the server, e.g. `thread`.
    const OBJECT: &'static str;
    /// Path of the collection endpoint relative to the api server.
    const COLLECTION: &'static str;

    fn meta(&self) -> &Meta;

    fn meta_mut(&mut self) -> &mut Meta;

    /// Resolve embedded attributes into typed models.
    ///
    /// Called once when the model is inflated.
    ///
    /// # Errors
    /// Returns error if an embedded object has invalid attributes.
    fn normalize(&mut self) -> serde_json::Result<()> {
        Ok(())
    }

    /// Inflate a model from `attributes`.
    ///
    /// # Errors
    /// Returns error if a known attribute has an unexpected type.
    fn from_attributes(attributes: Map<String, Value>) -> serde_json::Result<Self> {
        let mut model: Self = serde_json::from_value(Value::Object(attributes.clone()))?;
        model.meta_mut().raw = attributes;
        model.normalize()?;
        Ok(model)
    }

    /// Create a model that only knows its `id`.
    #[must_use]
    fn with_id(id: impl Into<String>) -> Self {
        let mut model = Self::default();
        model.meta_mut().id = Some(id.into());
        model
    }

    fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }

    fn account_id(&self) -> Option<&str> {
        self.meta().account_id.as_deref()
    }

    fn cursor(&self) -> Option<&Cursor> {
        self.meta().cursor.as_ref()
    }

    fn raw(&self) -> &Map<String, Value> {
        &self.meta().raw
    }
}

/// Models which can be modified through the API.
pub trait Updatable: Model {
    /// Attributes sent to the server when saving the model.
    ///
    /// Only the fields the server accepts for modification are included.
    fn update_payload(&self) -> Map<String, Value>;
}

/// Attribute holding another model which may arrive as plain json.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Embedded<T> {
    #[default]
    NotLoaded,
    Raw(Map<String, Value>),
    Typed(T),
}

impl<T: Model> Embedded<T> {
    /// Inflate a raw value into its model.
    ///
    /// # Errors
    /// Returns error if the raw attributes are invalid for `T`.
    pub fn normalize(&mut self) -> serde_json::Result<()> {
        if let Self::Raw(attributes) = self {
            let model = T::from_attributes(std::mem::take(attributes))?;
            *self = Self::Typed(model);
        }
        Ok(())
    }

    /// Id of the embedded model.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::NotLoaded => None,
            Self::Raw(attributes) => attributes.get("id").and_then(Value::as_str),
            Self::Typed(model) => model.id(),
        }
    }

    /// The typed model, once normalized.
    #[must_use]
    pub fn typed(&self) -> Option<&T> {
        match self {
            Self::Typed(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::NotLoaded)
    }
}

impl<'de, T> Deserialize<'de> for Embedded<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Map<String, Value>>::deserialize(deserializer)? {
            Some(attributes) => Self::Raw(attributes),
            None => Self::NotLoaded,
        })
    }
}

/// Name and address of a message or thread participant.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Treat `null` like a missing attribute.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

pub(crate) fn insert_some<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value.and_then(|v| serde_json::to_value(v).ok()) {
        map.insert(key.to_owned(), value);
    }
}

pub(crate) fn embedded_ids<T: Model>(items: &[Embedded<T>]) -> Vec<String> {
    items
        .iter()
        .filter_map(Embedded::id)
        .map(ToOwned::to_owned)
        .collect()
}
