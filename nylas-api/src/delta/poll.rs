use crate::delta::{ChangeRecord, Delta, Deltas, resolve};
use crate::domain::Cursor;
use crate::errors::{Error, Result};
use crate::requests::{DeltaPage, DeltaQuery, GetDeltaRequest};
use crate::response::Options;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lazy sequence of changes, requesting one page at a time.
///
/// Ends once a page reports that the feed has caught up, after the configured number of pages, or
/// after the first error.
pub struct DeltaPoll {
    deltas: Deltas,
    exclude_types: Option<String>,
    page_cursor: Cursor,
    pending: VecDeque<ChangeRecord>,
    pages: usize,
    done: bool,
    failed: bool,
}

impl DeltaPoll {
    pub(crate) fn new(deltas: Deltas) -> Self {
        let exclude_types = deltas.exclude_param();
        let page_cursor = deltas.cursor.clone();
        Self {
            deltas,
            exclude_types,
            page_cursor,
            pending: VecDeque::new(),
            pages: 0,
            done: false,
            failed: false,
        }
    }

    /// Cursor to resume from.
    ///
    /// While changes of a page are still pending, or after a change of the page failed to
    /// materialize, this is the start of that page, so that no change is lost.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        if self.pending.is_empty() && !self.failed {
            &self.deltas.cursor
        } else {
            &self.page_cursor
        }
    }

    /// Number of pages requested so far.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages
    }

    #[tracing::instrument(level = "debug", skip(self), fields(cursor = %self.deltas.cursor))]
    fn fetch_page(&mut self) -> Result<()> {
        let request = GetDeltaRequest::new(DeltaQuery {
            cursor: &self.deltas.cursor,
            exclude_types: self.exclude_types.as_deref(),
            expanded: self.deltas.expanded,
        });
        let value = self
            .deltas
            .api
            .execute(request, &Options::object())?
            .into_json();
        let page: DeltaPage =
            serde_json::from_value(value).map_err(|e| Error::unexpected(e.to_string()))?;

        self.pages += 1;
        debug!(
            deltas = page.deltas.len(),
            cursor_end = %page.cursor_end,
            "Received delta page"
        );

        self.done = page.is_last();
        self.page_cursor = std::mem::replace(&mut self.deltas.cursor, page.cursor_end);
        self.pending.extend(page.deltas);
        Ok(())
    }
}

impl Iterator for DeltaPoll {
    type Item = Result<Delta>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(change) = self.pending.pop_front() {
                let api = &self.deltas.api;
                match resolve(api.registry(), api.context(), self.deltas.expanded, change) {
                    Ok(Some(delta)) => return Some(Ok(delta)),
                    Ok(None) => continue,
                    Err(e) => {
                        self.pending.clear();
                        self.failed = true;
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            if self.done {
                return None;
            }

            if self.pages >= self.deltas.max_pages {
                warn!(
                    pages = self.pages,
                    cursor = %self.deltas.cursor,
                    "Delta feed has not caught up, giving up"
                );
                self.done = true;
                return None;
            }

            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
