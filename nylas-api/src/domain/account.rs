use crate::domain::{Meta, Model};
use serde::Deserialize;

/// Account the access token belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Account {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: Option<String>,
    pub email_address: Option<String>,
    pub provider: Option<String>,
    /// Either `folder` or `label`, depending on how the provider organizes mail.
    pub organization_unit: Option<String>,
    pub sync_state: Option<String>,
}

impl Account {
    /// Whether the provider organizes messages with labels rather than folders.
    #[must_use]
    pub fn uses_labels(&self) -> bool {
        self.organization_unit.as_deref() == Some("label")
    }
}

impl Model for Account {
    const OBJECT: &'static str = "account";
    const COLLECTION: &'static str = "accounts";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
