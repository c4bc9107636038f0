//! Maps object type names sent by the server to the models they inflate into.

use crate::domain::account::Account;
use crate::domain::calendar::Calendar;
use crate::domain::contact::Contact;
use crate::domain::draft::Draft;
use crate::domain::event::Event;
use crate::domain::file::File;
use crate::domain::folder::{Folder, Label};
use crate::domain::message::{ExpandedMessage, Message};
use crate::domain::thread::Thread;
use crate::domain::{Model, Record};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Creates records of one model type.
#[derive(Debug, Copy, Clone)]
pub struct Constructor {
    /// Object type name the constructor was registered for.
    pub object: &'static str,
    blank: fn() -> Record,
    inflate: fn(Map<String, Value>) -> serde_json::Result<Record>,
}

fn blank<M: Model>() -> Record {
    M::default().into()
}

fn inflate<M: Model>(attributes: Map<String, Value>) -> serde_json::Result<Record> {
    M::from_attributes(attributes).map(Into::into)
}

impl Constructor {
    #[must_use]
    pub fn of<M: Model>() -> Self {
        Self {
            object: M::OBJECT,
            blank: blank::<M>,
            inflate: inflate::<M>,
        }
    }

    /// A record with no attributes set.
    #[must_use]
    pub fn blank(&self) -> Record {
        (self.blank)()
    }

    /// A record populated from `attributes`.
    ///
    /// # Errors
    /// Returns error if a known attribute has an unexpected type.
    pub fn inflate(&self, attributes: Map<String, Value>) -> serde_json::Result<Record> {
        (self.inflate)(attributes)
    }
}

/// Two lookup tables: the regular one and the one used when expanded records are requested.
#[derive(Debug, Clone)]
pub struct ObjectRegistry {
    regular: HashMap<&'static str, Constructor>,
    expanded: HashMap<&'static str, Constructor>,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register::<Account>();
        registry.register::<Calendar>();
        registry.register::<Draft>();
        registry.register::<Thread>();
        registry.register::<Contact>();
        registry.register::<Event>();
        registry.register::<File>();
        registry.register::<Message>();
        registry.register::<Folder>();
        registry.register::<Label>();
        registry.register_expanded::<ExpandedMessage>();
        registry
    }
}

impl ObjectRegistry {
    /// Registry without any mapping.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            regular: HashMap::new(),
            expanded: HashMap::new(),
        }
    }

    /// Map `M::OBJECT` to `M`, replacing a previous mapping.
    pub fn register<M: Model>(&mut self) -> &mut Self {
        self.regular.insert(M::OBJECT, Constructor::of::<M>());
        self
    }

    /// Map `M::OBJECT` to `M` for expanded lookups.
    pub fn register_expanded<M: Model>(&mut self) -> &mut Self {
        self.expanded.insert(M::OBJECT, Constructor::of::<M>());
        self
    }

    /// Constructor for `object`.
    ///
    /// Expanded lookups fall back to the regular table when the type has no expanded form.
    #[must_use]
    pub fn resolve(&self, object: &str, expanded: bool) -> Option<Constructor> {
        expanded
            .then(|| self.expanded.get(object))
            .flatten()
            .or_else(|| self.regular.get(object))
            .copied()
    }

    /// Whether `object` is a known type name.
    #[must_use]
    pub fn contains(&self, object: &str) -> bool {
        self.regular.contains_key(object) || self.expanded.contains_key(object)
    }

    /// Comma separated list of the known names in `objects`, without duplicates.
    ///
    /// Unknown names are dropped. Returns `None` when nothing is left.
    #[must_use]
    pub fn exclude_param<'a>(&self, objects: impl IntoIterator<Item = &'a str>) -> Option<String> {
        let mut names: Vec<&str> = Vec::new();
        for object in objects {
            if self.regular.contains_key(object) && !names.contains(&object) {
                names.push(object);
            } else if !self.regular.contains_key(object) {
                tracing::debug!(object, "Ignoring unknown object type in exclusion list");
            }
        }
        (!names.is_empty()).then(|| names.join(","))
    }
}
