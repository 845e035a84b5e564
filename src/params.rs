//! Query parameter construction.
//!
//! Each endpoint turns its typed arguments into a [`QueryParams`]: `api_key`
//! first, then the endpoint's required field, then whichever optional fields
//! the caller supplied. Values are passed through as given; range checking is
//! left to the server.

use std::fmt::Display;

/// An ordered set of query parameters with unique keys.
///
/// # Examples
///
/// ```
/// use giphy_core::QueryParams;
///
/// let mut params = QueryParams::new("key");
/// params.insert("q", "cats");
/// params.insert_opt("limit", Some(5));
/// params.insert_opt("offset", None::<u32>);
///
/// assert_eq!(params.get("limit"), Some("5"));
/// assert!(!params.contains("offset"));
/// assert_eq!(params.keys().collect::<Vec<_>>(), ["api_key", "q", "limit"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates a parameter set seeded with the `api_key` parameter.
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut params = Self::empty();
        params.insert("api_key", api_key);
        params
    }

    /// Creates a parameter set with no parameters at all.
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Inserts a parameter, replacing the value in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Inserts a parameter only if a value is present.
    ///
    /// `Some("")` is still inserted; only `None` is skipped.
    pub fn insert_opt<V: Display>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value.to_string());
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Joins identifiers with `,`, keeping the caller's order.
///
/// ```
/// use giphy_core::params::join_ids;
///
/// assert_eq!(join_ids(&["a", "b", "c"]), "a,b,c");
/// assert_eq!(join_ids(&["only"]), "only");
/// assert_eq!(join_ids::<&str>(&[]), "");
/// ```
pub fn join_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

/// Optional arguments for `search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub rating: Option<String>,
    pub lang: Option<String>,
}

impl SearchOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params.insert_opt("limit", self.limit);
        params.insert_opt("offset", self.offset);
        params.insert_opt("rating", self.rating.as_deref());
        params.insert_opt("lang", self.lang.as_deref());
    }
}

/// Optional arguments for `trending`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendingOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub rating: Option<String>,
}

impl TrendingOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params.insert_opt("limit", self.limit);
        params.insert_opt("offset", self.offset);
        params.insert_opt("rating", self.rating.as_deref());
    }
}

/// Optional arguments for `translate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    pub rating: Option<String>,
    pub lang: Option<String>,
}

impl TranslateOptions {
    pub fn rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params.insert_opt("rating", self.rating.as_deref());
        params.insert_opt("lang", self.lang.as_deref());
    }
}

/// Optional arguments for `random`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RandomOptions {
    pub rating: Option<String>,
}

impl RandomOptions {
    pub fn rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params.insert_opt("rating", self.rating.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_options_never_become_keys() {
        let mut params = QueryParams::new("k");
        params.insert("q", "cats");
        SearchOptions::default().limit(5).apply(&mut params);

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, [("api_key", "k"), ("q", "cats"), ("limit", "5")]);
    }

    #[test]
    fn empty_string_option_is_kept() {
        let mut params = QueryParams::new("k");
        TranslateOptions::default().lang("").apply(&mut params);

        assert_eq!(params.get("lang"), Some(""));
        assert!(!params.contains("rating"));
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let mut params = QueryParams::new("k");
        params.insert("tag", "a");
        params.insert("api_key", "other");

        assert_eq!(params.len(), 2);
        assert_eq!(params.keys().collect::<Vec<_>>(), ["api_key", "tag"]);
        assert_eq!(params.get("api_key"), Some("other"));
    }

    #[test]
    fn all_search_options_in_wire_order() {
        let mut params = QueryParams::new("k");
        params.insert("q", "dogs");
        SearchOptions::default()
            .lang("es")
            .rating("g")
            .offset(10)
            .limit(25)
            .apply(&mut params);

        assert_eq!(
            params.keys().collect::<Vec<_>>(),
            ["api_key", "q", "limit", "offset", "rating", "lang"]
        );
        assert_eq!(params.get("offset"), Some("10"));
    }

    #[test]
    fn join_ids_has_no_stray_separators() {
        let ids = vec!["x".to_string(), "y".to_string()];
        let joined = join_ids(&ids);
        assert_eq!(joined, "x,y");
        assert!(!joined.starts_with(',') && !joined.ends_with(','));
    }
}
