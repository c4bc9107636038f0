//! Turns change records of the delta feed into models.

use crate::delta::{ChangeEvent, ChangeRecord, Delta};
use crate::domain::Cursor;
use crate::errors::{Error, Result};
use crate::registry::Constructor;
use tracing::debug;

/// Values bound to every record materialized for an account.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub account_id: Option<String>,
}

/// Build the record described by `change` with `constructor`.
///
/// Returns `None` for events other than create, modify and delete.
///
/// # Errors
/// Returns error if the attributes of a create or modify can not be assigned to the model.
pub fn inflate(
    constructor: &Constructor,
    context: &Context,
    change: ChangeRecord,
) -> Result<Option<Delta>> {
    let Some(event) = ChangeEvent::parse(&change.event) else {
        debug!(event = %change.event, object = %change.object, "Skipping unknown change event");
        return Ok(None);
    };

    let cursor = change.cursor.map(Cursor);
    let mut record = match event {
        ChangeEvent::Create | ChangeEvent::Modify => {
            let attributes = change.attributes.unwrap_or_default();
            let mut record = constructor.inflate(attributes).map_err(|e| {
                Error::unexpected(format!("invalid {} attributes: {e}", constructor.object))
            })?;
            let meta = record.meta_mut();
            if meta.account_id.is_none() {
                meta.account_id.clone_from(&context.account_id);
            }
            record
        }
        ChangeEvent::Delete => {
            let mut record = constructor.blank();
            record.meta_mut().id = change.id;
            record
        }
    };

    record.meta_mut().cursor = cursor;
    Ok(Some(Delta { event, record }))
}
