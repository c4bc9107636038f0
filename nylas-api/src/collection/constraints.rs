use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameters shaping a collection request.
///
/// Every builder method returns a new value, constraints can be shared freely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    filters: BTreeMap<String, Value>,
    limit: Option<u64>,
    offset: u64,
    per_page: Option<u64>,
    view: Option<String>,
}

impl Constraints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. A filter with the same key is replaced.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Add several filters, replacing those with the same key.
    #[must_use]
    pub fn filters<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.filters
            .extend(filters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Maximum number of records over all pages.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Number of records requested per page.
    #[must_use]
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Combine with `other`. Values set in `other` win.
    #[must_use]
    pub fn merge(mut self, other: &Self) -> Self {
        self.filters
            .extend(other.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.limit = other.limit.or(self.limit);
        self.per_page = other.per_page.or(self.per_page);
        self.view = other.view.clone().or(self.view);
        if other.offset != 0 {
            self.offset = other.offset;
        }
        self
    }

    /// Constraints for the page following one that returned `last_len` records.
    #[must_use]
    pub fn next_page(mut self, last_len: u64) -> Self {
        self.offset += self.per_page.unwrap_or(last_len);
        self
    }

    #[must_use]
    pub fn filter_values(&self) -> &BTreeMap<String, Value> {
        &self.filters
    }

    #[must_use]
    pub fn max_records(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u64> {
        self.per_page
    }

    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Query parameters of the request for these constraints.
    ///
    /// The page size sent to the server never exceeds the overall limit.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect();

        let limit = match (self.per_page, self.limit) {
            (Some(per_page), Some(limit)) => Some(per_page.min(limit)),
            (per_page, limit) => per_page.or(limit),
        };
        if let Some(limit) = limit {
            query.push(("limit".to_owned(), limit.to_string()));
        }
        query.push(("offset".to_owned(), self.offset.to_string()));
        if let Some(view) = &self.view {
            query.push(("view".to_owned(), view.clone()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn same_filter_twice_is_applied_once() {
        let once = Constraints::new().filter("unread", true);
        let twice = Constraints::new().filter("unread", true).filter("unread", true);
        assert_eq!(once, twice);
        assert_eq!(twice.filter_values().len(), 1);
    }

    #[test]
    fn filter_replaces_value_for_key() {
        let constraints = Constraints::new()
            .filters([("in", "inbox"), ("from", "a@b.c")])
            .filter("in", "sent");
        let query = constraints.to_query();
        assert_eq!(param(&query, "in"), Some("sent"));
        assert_eq!(param(&query, "from"), Some("a@b.c"));
    }

    #[test]
    fn builder_leaves_original_untouched() {
        let base = Constraints::new().per_page(10);
        let limited = base.clone().limit(5).offset(20);
        assert_eq!(base.max_records(), None);
        assert_eq!(base.start(), 0);
        assert_eq!(limited.max_records(), Some(5));
        assert_eq!(limited.start(), 20);
    }

    #[test]
    fn next_page_advances_by_page_size() {
        let constraints = Constraints::new().per_page(2).offset(4);
        assert_eq!(constraints.next_page(7).start(), 6);

        let constraints = Constraints::new().offset(4);
        assert_eq!(constraints.next_page(7).start(), 11);
    }

    #[test]
    fn merge_prefers_other() {
        let base = Constraints::new()
            .filter("in", "inbox")
            .filter("unread", true)
            .limit(10)
            .offset(5);
        let other = Constraints::new().filter("in", "sent").per_page(3);
        let merged = base.merge(&other);
        assert_eq!(merged.filter_values().get("in"), Some(&Value::from("sent")));
        assert_eq!(merged.filter_values().get("unread"), Some(&Value::from(true)));
        assert_eq!(merged.max_records(), Some(10));
        assert_eq!(merged.page_size(), Some(3));
        assert_eq!(merged.start(), 5);
    }

    #[test]
    fn query_parameters() {
        let query = Constraints::new()
            .filter("unread", true)
            .filter("any_email", "a@b.c")
            .per_page(50)
            .limit(20)
            .offset(40)
            .view("ids")
            .to_query();
        assert_eq!(param(&query, "unread"), Some("true"));
        assert_eq!(param(&query, "any_email"), Some("a@b.c"));
        assert_eq!(param(&query, "limit"), Some("20"));
        assert_eq!(param(&query, "offset"), Some("40"));
        assert_eq!(param(&query, "view"), Some("ids"));

        let query = Constraints::new().to_query();
        assert_eq!(param(&query, "limit"), None);
        assert_eq!(param(&query, "offset"), Some("0"));
        assert_eq!(param(&query, "view"), None);
    }
}
