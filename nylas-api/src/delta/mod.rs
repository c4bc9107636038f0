//! Change feed of an account.
//!
//! Changes are read from a [`Cursor`] either page by page with [`Deltas::poll`] until the feed has
//! caught up, or from a long lived connection with [`Deltas::stream`]. Both modes resolve every
//! change through the [`ObjectRegistry`](crate::registry::ObjectRegistry) and hand out typed
//! [`Record`]s. Changes of unknown object types are skipped.

mod poll;
mod stream;

pub use poll::DeltaPoll;

use crate::api::Api;
use crate::domain::{Cursor, Model, Record};
use crate::errors::Result;
use crate::materialize::{Context, inflate};
use crate::registry::ObjectRegistry;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

/// Upper bound on the pages a single poll requests.
pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChangeEvent {
    Create,
    Modify,
    Delete,
}

impl ChangeEvent {
    /// Parse the event name used by the server.
    #[must_use]
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Change as sent by the server, before resolution.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "mocks", derive(serde::Serialize))]
pub struct ChangeRecord {
    pub object: String,
    pub event: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

/// Resolved change.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub event: ChangeEvent,
    pub record: Record,
}

/// Signal to end a running stream.
///
/// The stream checks the signal whenever a frame arrives or the connection times out.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options of a change feed read, created with [`Api::deltas`].
#[derive(Clone)]
pub struct Deltas {
    api: Api,
    cursor: Cursor,
    exclude: Vec<String>,
    expanded: bool,
    max_pages: usize,
}

impl Deltas {
    pub(crate) fn new(api: Api, cursor: Cursor) -> Self {
        Self {
            api,
            cursor,
            exclude: Vec::new(),
            expanded: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Skip changes of the given object types.
    #[must_use]
    pub fn exclude<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(objects.into_iter().map(Into::into));
        self
    }

    /// Skip changes of model `M`.
    #[must_use]
    pub fn exclude_model<M: Model>(mut self) -> Self {
        self.exclude.push(M::OBJECT.to_owned());
        self
    }

    /// Request the expanded view of records, e.g. messages with their headers.
    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Limit how many pages [`Self::poll`] requests before giving up on catching up.
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Read changes page by page until the feed has caught up.
    ///
    /// Nothing is requested until the returned iterator is advanced.
    #[must_use]
    pub fn poll(self) -> DeltaPoll {
        DeltaPoll::new(self)
    }

    /// Consume changes pushed by the server, calling `on_record` for each as it arrives.
    ///
    /// Blocks until the server closes the connection, `timeout` elapses, `stop` is signalled or
    /// `on_record` returns [`ControlFlow::Break`]. An elapsed timeout is not an error, whether it
    /// fires while waiting for the response or while reading frames. A `timeout` of `None` or
    /// [`Duration::ZERO`] means no timeout.
    ///
    /// # Errors
    /// Returns error if the request failed or a frame could not be interpreted.
    #[tracing::instrument(level = "debug", skip(self, timeout, stop, on_record), fields(cursor = %self.cursor))]
    pub fn stream<F>(
        self,
        timeout: impl Into<Option<Duration>>,
        stop: &StopHandle,
        on_record: F,
    ) -> Result<()>
    where
        F: FnMut(Delta) -> ControlFlow<()>,
    {
        let timeout: Option<Duration> = timeout.into();
        let timeout = timeout.filter(|d| !d.is_zero());
        stream::run(&self, timeout, stop, on_record)
    }

    fn exclude_param(&self) -> Option<String> {
        self.api
            .registry()
            .exclude_param(self.exclude.iter().map(String::as_str))
    }
}

/// Resolve and materialize one change. Unknown object types yield `None`.
pub(crate) fn resolve(
    registry: &ObjectRegistry,
    context: &Context,
    expanded: bool,
    change: ChangeRecord,
) -> Result<Option<Delta>> {
    let Some(constructor) = registry.resolve(&change.object, expanded) else {
        warn!(object = %change.object, "Skipping change of unknown object type");
        return Ok(None);
    };
    inflate(&constructor, context, change)
}
