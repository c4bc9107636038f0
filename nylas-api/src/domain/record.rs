use crate::domain::account::Account;
use crate::domain::calendar::Calendar;
use crate::domain::contact::Contact;
use crate::domain::draft::Draft;
use crate::domain::event::Event;
use crate::domain::file::File;
use crate::domain::folder::{Folder, Label};
use crate::domain::message::{ExpandedMessage, Message};
use crate::domain::thread::Thread;
use crate::domain::{Cursor, Meta, Model};
use serde_json::{Map, Value};

macro_rules! records {
    ($($variant:ident),+ $(,)?) => {
        /// Any model produced by the delta feed.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Record {
            $($variant($variant),)+
        }

        impl Record {
            /// Object type name of the contained model.
            #[must_use]
            pub fn object(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $variant::OBJECT,)+
                }
            }

            #[must_use]
            pub fn meta(&self) -> &Meta {
                match self {
                    $(Self::$variant(m) => m.meta(),)+
                }
            }

            pub fn meta_mut(&mut self) -> &mut Meta {
                match self {
                    $(Self::$variant(m) => m.meta_mut(),)+
                }
            }
        }

        $(
            impl From<$variant> for Record {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }

            impl TryFrom<Record> for $variant {
                type Error = Record;

                fn try_from(value: Record) -> Result<Self, Self::Error> {
                    match value {
                        Record::$variant(m) => Ok(m),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

records!(
    Account,
    Calendar,
    Contact,
    Draft,
    Event,
    File,
    Folder,
    Label,
    Message,
    ExpandedMessage,
    Thread,
);

impl Record {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }

    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.meta().account_id.as_deref()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.meta().cursor.as_ref()
    }

    #[must_use]
    pub fn raw(&self) -> &Map<String, Value> {
        &self.meta().raw
    }

    /// Convert into a concrete model, returning the record back if the type does not match.
    ///
    /// # Errors
    /// Returns `self` if the record does not hold an `M`.
    pub fn into_model<M: Model>(self) -> Result<M, Self> {
        M::try_from(self)
    }
}
