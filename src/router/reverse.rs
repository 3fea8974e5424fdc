//! Reverse routing — build URLs from handler identities.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use super::Router;
use super::encoding::encode_query_component;
use super::error::UrlError;
use super::route::Insert;
use crate::handler::HandlerRef;

/// Builds URLs for the routes of a compiled [`Router`].
///
/// # Examples
///
/// ```rust
/// use waypath::{HandlerRef, Router};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut router = Router::new();
/// router.with_context_path("/app")?;
/// router.get("/user/{id}/{name}").with(HandlerRef::new("Users", "profile"))?;
/// router.compile()?;
///
/// let url = router
///     .reverse_router()
///     .with(HandlerRef::new("Users", "profile"))
///     .path_param("id", 42)
///     .path_param("name", "John Doe")
///     .query_param("email", "test@example.com")
///     .raw_query_param("next", "/home")
///     .absolute("https", "example.com")
///     .build()?;
///
/// assert_eq!(
///     url,
///     "https://example.com/app/user/42/John%20Doe?email=test%40example.com&next=/home"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReverseRouter<'r> {
    router: &'r Router,
}

impl<'r> ReverseRouter<'r> {
    /// Wrap `router`. URLs can only be built once it is compiled.
    pub fn new(router: &'r Router) -> Self {
        Self { router }
    }

    /// Start building the URL of the first route declared for `handler`.
    ///
    /// The route is looked up when [`UrlBuilder::build`] runs.
    pub fn with(&self, handler: HandlerRef) -> UrlBuilder<'r> {
        UrlBuilder {
            router: self.router,
            handler,
            path_params: IndexMap::new(),
            query_params: IndexMap::new(),
            origin: None,
        }
    }
}

// A value supplied to the builder, with whether to insert it as-is.
#[derive(Debug, Clone)]
struct Value {
    text: String,
    raw: bool,
}

impl Value {
    fn encoded(text: impl fmt::Display) -> Self {
        Self {
            text: text.to_string(),
            raw: false,
        }
    }

    fn raw(text: impl fmt::Display) -> Self {
        Self {
            text: text.to_string(),
            raw: true,
        }
    }

    fn insert(&self) -> Insert {
        if self.raw { Insert::Raw } else { Insert::Encoded }
    }

    // Text for a query string name or value position.
    fn query_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.raw {
            Cow::Borrowed(text)
        } else {
            encode_query_component(text)
        }
    }
}

/// A URL under construction for one handler.
///
/// Path parameters must cover the route's declared parameters exactly. Query
/// parameters are appended in insertion order; setting a name again replaces its
/// value but keeps its original position. Values are percent-encoded unless set
/// through one of the `raw_` methods.
#[derive(Debug, Clone)]
#[must_use = "call `build` to produce the URL"]
pub struct UrlBuilder<'r> {
    router: &'r Router,
    handler: HandlerRef,
    path_params: IndexMap<String, Value>,
    query_params: IndexMap<String, Value>,
    origin: Option<(String, String)>,
}

impl UrlBuilder<'_> {
    /// Set a path parameter, percent-encoded as a path segment (`@`, `:`, `+`, `=`
    /// and the other sub-delimiters stay readable).
    pub fn path_param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.path_params.insert(name.into(), Value::encoded(value));
        self
    }

    /// Set a path parameter inserted verbatim (already encoded, or spanning segments).
    pub fn raw_path_param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.path_params.insert(name.into(), Value::raw(value));
        self
    }

    /// Append a query parameter; name and value are percent-encoded.
    pub fn query_param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query_params.insert(name.into(), Value::encoded(value));
        self
    }

    /// Append a query parameter inserted verbatim.
    pub fn raw_query_param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query_params.insert(name.into(), Value::raw(value));
        self
    }

    /// Make the URL absolute: `scheme://host` is prepended.
    pub fn absolute(mut self, scheme: impl Into<String>, host: impl Into<String>) -> Self {
        self.origin = Some((scheme.into(), host.into()));
        self
    }

    /// Produce the URL.
    ///
    /// # Errors
    ///
    /// - [`UrlError::NotCompiled`] — the router is not compiled yet.
    /// - [`UrlError::NoRouteForHandler`] — no route is bound to the handler.
    /// - [`UrlError::MissingParameter`] / [`UrlError::UnknownParameter`] — the path
    ///   parameters differ from the ones the route declares.
    /// - [`UrlError::InvalidParameterValue`] — a value breaks its parameter's pattern.
    /// - [`UrlError::NotReversible`] — the route's literal text is a pattern, so the
    ///   built path would not resolve back to it.
    pub fn build(&self) -> Result<String, UrlError> {
        let route = self.router.route_for_reverse(&self.handler)?;
        let path = route.render(
            self.path_params
                .iter()
                .map(|(name, value)| (name.as_str(), value.text.as_str(), value.insert())),
        )?;

        let mut url = String::new();
        if let Some((scheme, host)) = &self.origin {
            url.push_str(scheme);
            url.push_str("://");
            url.push_str(host);
        }
        url.push_str(self.router.context_path());
        url.push_str(&path);

        for (i, (name, value)) in self.query_params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&value.query_text(name));
            url.push('=');
            url.push_str(&value.query_text(&value.text));
        }

        Ok(url)
    }
}
