use crate::domain::{Meta, Model, Updatable, insert_some, nullable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(flatten)]
    pub meta: Meta,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
    pub nickname: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(deserialize_with = "nullable")]
    pub phone_numbers: Vec<PhoneNumber>,
}

impl Contact {
    /// First known email address.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .iter()
            .find_map(|e| e.email.as_deref())
    }
}

impl Model for Contact {
    const OBJECT: &'static str = "contact";
    const COLLECTION: &'static str = "contacts";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Updatable for Contact {
    fn update_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert_some(&mut map, "given_name", self.given_name.as_ref());
        insert_some(&mut map, "middle_name", self.middle_name.as_ref());
        insert_some(&mut map, "surname", self.surname.as_ref());
        insert_some(&mut map, "nickname", self.nickname.as_ref());
        insert_some(&mut map, "company_name", self.company_name.as_ref());
        insert_some(&mut map, "job_title", self.job_title.as_ref());
        insert_some(&mut map, "notes", self.notes.as_ref());
        insert_some(&mut map, "email_addresses", Some(&self.email_addresses));
        insert_some(&mut map, "phone_numbers", Some(&self.phone_numbers));
        map
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}
