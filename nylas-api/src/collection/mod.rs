//! Filterable, paginated views over the collections of the API.

mod constraints;

pub use constraints::Constraints;

use crate::api::Api;
use crate::domain::{Model, Updatable};
use crate::errors::{Error, Result};
use crate::requests::GetCollectionRequest;
use crate::response::Options;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// Page size used by [`Collection::find_each`] when none was configured.
pub const DEFAULT_PER_PAGE: u64 = 100;

/// Remote collection of `M`.
///
/// Builder methods return a new collection and perform no request.
pub struct Collection<M> {
    api: Api,
    constraints: Constraints,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Collection<M> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            constraints: self.constraints.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for Collection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

impl<M: Model> Collection<M> {
    #[must_use]
    pub fn new(api: Api) -> Self {
        Self {
            api,
            constraints: Constraints::default(),
            _model: PhantomData,
        }
    }

    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn filter(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map_constraints(|c| c.filter(key, value))
    }

    #[must_use]
    pub fn filters<I, K, V>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.map_constraints(|c| c.filters(filters))
    }

    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.map_constraints(|c| c.limit(limit))
    }

    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        self.map_constraints(|c| c.offset(offset))
    }

    #[must_use]
    pub fn per_page(self, per_page: u64) -> Self {
        self.map_constraints(|c| c.per_page(per_page))
    }

    #[must_use]
    pub fn view(self, view: impl Into<String>) -> Self {
        self.map_constraints(|c| c.view(view))
    }

    fn map_constraints(mut self, f: impl FnOnce(Constraints) -> Constraints) -> Self {
        self.constraints = f(self.constraints);
        self
    }

    /// Request the current page and return its elements as sent by the server.
    ///
    /// # Errors
    /// Returns error if the request failed or the body is not an array.
    pub fn execute(&self) -> Result<Vec<Value>> {
        fetch::<M>(&self.api, &self.constraints)
    }

    /// First record of the current page.
    ///
    /// # Errors
    /// Returns error if the request failed or the record could not be inflated.
    pub fn first(&self) -> Result<Option<M>> {
        let page = fetch::<M>(&self.api, &self.constraints.clone().limit(1))?;
        page.into_iter()
            .next()
            .map(|value| self.api.materialize(value))
            .transpose()
    }

    /// Records of the current page. Only one request is made.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn each(&self) -> Result<Each<M>> {
        Ok(Each {
            api: self.api.clone(),
            values: self.execute()?.into_iter(),
            _model: PhantomData,
        })
    }

    /// Every record matching the constraints, requesting pages as the iterator advances.
    ///
    /// Each call starts again from the configured offset. Without a page size, or with a page
    /// size of `0`, pages of [`DEFAULT_PER_PAGE`] records are requested.
    #[must_use]
    pub fn find_each(&self) -> FindEach<M> {
        let constraints = match self.constraints.page_size() {
            Some(per_page) if per_page > 0 => self.constraints.clone(),
            _ => self.constraints.clone().per_page(DEFAULT_PER_PAGE),
        };
        FindEach {
            api: self.api.clone(),
            constraints,
            yielded: 0,
            state: State::Fetching,
            _model: PhantomData,
        }
    }

    /// Record with `id`.
    ///
    /// # Errors
    /// Returns error if the request failed, the error is not found if the record does not exist.
    pub fn find(&self, id: &str) -> Result<M> {
        let mut model = M::with_id(id);
        self.api
            .reload_with_view(&mut model, self.constraints.view_name())?;
        Ok(model)
    }

    /// Create `model` in this collection and return it with the attributes assigned by the server.
    ///
    /// # Errors
    /// Returns error if the request failed.
    pub fn create(&self, mut model: M) -> Result<M>
    where
        M: Updatable,
    {
        self.api.create(&mut model)?;
        Ok(model)
    }

    /// Number of records matching the filters.
    ///
    /// # Errors
    /// Returns error if the request failed or the response has no count.
    pub fn count(&self) -> Result<u64> {
        let constraints = Constraints::new()
            .filters(self.constraints.filter_values().clone())
            .view("count");
        let request = GetCollectionRequest::new(M::COLLECTION, constraints.to_query());
        self.api
            .execute(request, &Options::object())?
            .into_json()
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::unexpected("missing count"))
    }
}

fn fetch<M: Model>(api: &Api, constraints: &Constraints) -> Result<Vec<Value>> {
    let request = GetCollectionRequest::new(M::COLLECTION, constraints.to_query());
    match api.execute(request, &Options::array())?.into_json() {
        Value::Array(values) => {
            debug!(
                collection = M::COLLECTION,
                offset = constraints.start(),
                len = values.len(),
                "Received page"
            );
            Ok(values)
        }
        _ => Err(Error::unexpected("expected array")),
    }
}

/// Records of a single page.
pub struct Each<M> {
    api: Api,
    values: std::vec::IntoIter<Value>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Iterator for Each<M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next().map(|value| self.api.materialize(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

enum State {
    Fetching,
    Yielding {
        values: std::vec::IntoIter<Value>,
        len: u64,
    },
    Deciding {
        len: u64,
    },
    Done,
}

/// Records of all pages, see [`Collection::find_each`].
pub struct FindEach<M> {
    api: Api,
    constraints: Constraints,
    yielded: u64,
    state: State,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> FindEach<M> {
    fn limit_reached(&self) -> bool {
        self.constraints
            .max_records()
            .is_some_and(|limit| self.yielded >= limit)
    }
}

impl<M: Model> Iterator for FindEach<M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Fetching => match fetch::<M>(&self.api, &self.constraints) {
                    Ok(values) if values.is_empty() => return None,
                    Ok(values) => {
                        self.state = State::Yielding {
                            len: u64::try_from(values.len()).unwrap_or(u64::MAX),
                            values: values.into_iter(),
                        };
                    }
                    Err(e) => return Some(Err(e)),
                },
                State::Yielding { mut values, len } => {
                    if self.limit_reached() {
                        return None;
                    }
                    if let Some(value) = values.next() {
                        self.yielded += 1;
                        self.state = State::Yielding { values, len };
                        return Some(self.api.materialize(value));
                    }
                    self.state = State::Deciding { len };
                }
                State::Deciding { len } => {
                    let short_page = self.constraints.page_size().is_some_and(|p| len < p);
                    if short_page || self.limit_reached() {
                        return None;
                    }
                    self.constraints = std::mem::take(&mut self.constraints).next_page(len);
                    self.state = State::Fetching;
                }
                State::Done => return None,
            }
        }
    }
}
