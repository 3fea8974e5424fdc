//! Path parameters extracted from a matched route.

use std::ops::Index;

/// Ordered path parameters extracted from the matched route.
///
/// Entries appear in the order the parameters are declared in the route
/// template. Names are unique within a route, so lookups by name are
/// unambiguous.
///
/// # Examples
///
/// ```
/// use waypath::{HandlerRef, Method, Route};
///
/// let route = Route::compile(
///     Method::Get,
///     "/{name}/{id}/dashboard",
///     HandlerRef::new("Dashboard", "show"),
/// )
/// .unwrap();
///
/// let params = route.extract_parameters("/John/20/dashboard").unwrap();
/// assert_eq!(params.get("name"), Some("John"));
/// assert_eq!(params.get("id"), Some("20"));
/// assert_eq!(params.names().collect::<Vec<_>>(), ["name", "id"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    /// Create a new empty parameters map
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    // Callers guarantee names are unique (the route rejects duplicates at compile time).
    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Get a value from the parameters map
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a parameter with this name was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == name)
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of captured parameters.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the route declared no parameters.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Index<&str> for PathParams {
    type Output = str;

    /// # Panics
    ///
    /// Panics if no parameter named `name` was captured.
    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no path parameter named `{name}`"),
        }
    }
}

impl IntoIterator for PathParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathParams {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn as_pair(entry: &(String, String)) -> (&str, &str) {
            (entry.0.as_str(), entry.1.as_str())
        }
        self.inner
            .iter()
            .map(as_pair as fn(&'a (String, String)) -> (&'a str, &'a str))
    }
}
