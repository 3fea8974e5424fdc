//! Route table: compile path templates, resolve requests, build URLs back.
//!
//! This module provides [`Router`], an ordered table of [`Route`]s. Each route binds an
//! HTTP method and a path template to a [`HandlerRef`]. Templates declare parameters with
//! `{name}` (one path segment) or `{name: regex}` (any pattern):
//!
//! | Template                 | Example match              | Captured params              |
//! |--------------------------|----------------------------|------------------------------|
//! | `/users`                 | `/users`                   | *(none)*                     |
//! | `/users/{id}`            | `/users/42`                | `id → "42"`                  |
//! | `/users/{id: [0-9]+}`    | `/users/42` (not `/users/x`) | `id → "42"`                |
//! | `/assets/{file: .*}`     | `/assets/css/site.css`     | `file → "css/site.css"`      |
//!
//! Routes are matched in registration order; the first route whose method and pattern both
//! match the incoming request wins. Patterns must match the whole path.
//!
//! A router moves through three states, one way only:
//!
//! ```text
//! Empty ──add──▶ Building ──compile()──▶ Compiled
//! ```
//!
//! Routes can only be added before [`Router::compile`]; requests can only be resolved and
//! URLs only built after it.

mod builder;
mod encoding;
mod error;
mod parameter;
mod reverse;
mod route;

use tracing::{debug, info, trace};

pub use builder::RouteBuilder;
pub use error::{RouterError, TemplateError, UrlError};
pub use parameter::{DEFAULT_PATTERN, RouteParameter};
pub use reverse::{ReverseRouter, UrlBuilder};
pub use route::Route;

use crate::handler::HandlerRef;
use crate::http::Method;
use crate::params::PathParams;

/// Lifecycle state of a [`Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// No routes registered yet.
    Empty,
    /// At least one route registered; still accepting more.
    Building,
    /// Frozen; serving lookups.
    Compiled,
}

/// Result of a successful [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct RouteMatch<'r> {
    route: &'r Route,
    params: PathParams,
    raw_params: PathParams,
}

impl<'r> RouteMatch<'r> {
    /// The matched route.
    pub fn route(&self) -> &'r Route {
        self.route
    }

    /// The handler the matched route is bound to.
    pub fn handler(&self) -> &'r HandlerRef {
        self.route.handler()
    }

    /// Percent-decoded path parameters, in declaration order.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Path parameters exactly as they appeared in the request path.
    pub fn raw_params(&self) -> &PathParams {
        &self.raw_params
    }

    /// Consume the match, keeping the decoded parameters.
    pub fn into_params(self) -> PathParams {
        self.params
    }
}

/// Ordered route table that resolves `(method, path)` pairs to handlers.
///
/// Routes are evaluated in registration order; the first route whose HTTP method and path
/// pattern both match the incoming request is used. When no route matches,
/// [`resolve`](Self::resolve) returns `Ok(None)` for the caller to turn into a 404.
///
/// A compiled router is read-only and `Send + Sync`; wrap it in an `Arc` to share it
/// between request-handling threads.
///
/// # Examples
///
/// ```rust
/// use waypath::{HandlerRef, Method, Router};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut router = Router::new();
///
/// router.get("/ping").with(HandlerRef::new("Health", "ping"))?;
/// router
///     .get("/users/{id: [0-9]+}")
///     .args(["id"])
///     .with(HandlerRef::new("Users", "show"))?;
///
/// router.compile()?;
///
/// let found = router.resolve(&Method::Get, "/users/42")?.unwrap();
/// assert_eq!(found.handler(), &HandlerRef::new("Users", "show"));
/// assert_eq!(found.params().get("id"), Some("42"));
///
/// assert!(router.resolve(&Method::Get, "/users/abc")?.is_none());
///
/// let url = router.reverse(&HandlerRef::new("Users", "show"), [("id", "7")])?;
/// assert_eq!(url, "/users/7");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    compiled: bool,
    context_path: String,
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waypath::{Router, RouterState};
    ///
    /// let router = Router::new();
    /// assert!(router.is_empty());
    /// assert_eq!(router.state(), RouterState::Empty);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path prefix the application is mounted under.
    ///
    /// The prefix is prepended to every URL built by reverse routing; it does not take
    /// part in matching (the surrounding server strips it before resolving). `""` and
    /// `"/"` mean "mounted at the root"; a trailing slash is dropped.
    ///
    /// # Errors
    ///
    /// - [`RouterError::AlreadyCompiled`] — the router is frozen.
    /// - [`RouterError::InvalidContextPath`] — `path` is non-empty and does not start
    ///   with `/`.
    pub fn with_context_path(&mut self, path: &str) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;

        let trimmed = path.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('/') {
            return Err(RouterError::InvalidContextPath(path.to_owned()));
        }

        self.context_path = trimmed.trim_end_matches('/').to_owned();
        Ok(self)
    }

    /// The context path prepended to built URLs (empty when mounted at the root).
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Start registering a route for `GET` requests matching `template`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waypath::{HandlerRef, Router};
    ///
    /// let mut router = Router::new();
    /// router.get("/hello").with(HandlerRef::new("Hello", "index")).unwrap();
    /// assert_eq!(router.len(), 1);
    /// ```
    pub fn get(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Get, template)
    }

    /// Start registering a route for `POST` requests matching `template`.
    pub fn post(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Post, template)
    }

    /// Start registering a route for `PUT` requests matching `template`.
    pub fn put(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Put, template)
    }

    /// Start registering a route for `DELETE` requests matching `template`.
    pub fn delete(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Delete, template)
    }

    /// Start registering a route for `PATCH` requests matching `template`.
    pub fn patch(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Patch, template)
    }

    /// Start registering a route for `HEAD` requests matching `template`.
    pub fn head(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Head, template)
    }

    /// Start registering a route for `OPTIONS` requests matching `template`.
    pub fn options(&mut self, template: &str) -> RouteBuilder<'_> {
        self.method(Method::Options, template)
    }

    /// Start registering a route for an arbitrary method, including extension methods.
    pub fn method(&mut self, method: Method, template: &str) -> RouteBuilder<'_> {
        RouteBuilder::new(self, method, template)
    }

    /// Compile `template` and append it to the table, bound to `handler`.
    ///
    /// Declaration order is match priority: earlier routes win over later ones.
    ///
    /// # Errors
    ///
    /// - [`RouterError::AlreadyCompiled`] — the router is frozen.
    /// - [`RouterError::Template`] — the template is malformed.
    pub fn add_route(
        &mut self,
        method: Method,
        template: &str,
        handler: HandlerRef,
    ) -> Result<&Route, RouterError> {
        self.ensure_building()?;
        let route = Route::compile(method, template, handler)?;
        Ok(self.push(route))
    }

    // Append an already compiled route. Callers have checked the state.
    fn push(&mut self, route: Route) -> &Route {
        debug!(
            method = %route.method(),
            template = route.template(),
            handler = %route.handler(),
            "route registered"
        );
        self.routes.push(route);
        &self.routes[self.routes.len() - 1]
    }

    fn ensure_building(&self) -> Result<(), RouterError> {
        if self.compiled {
            Err(RouterError::AlreadyCompiled)
        } else {
            Ok(())
        }
    }

    /// Freeze the route table.
    ///
    /// After this call no routes can be added and lookups are allowed. The full table is
    /// logged at `info` level, one line per route, in match order.
    ///
    /// # Errors
    ///
    /// [`RouterError::AlreadyCompiled`] if called twice.
    pub fn compile(&mut self) -> Result<(), RouterError> {
        self.ensure_building()?;
        self.compiled = true;

        info!(routes = self.routes.len(), context_path = %self.context_path, "route table compiled");
        for route in &self.routes {
            info!("  {route}");
        }

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RouterState {
        if self.compiled {
            RouterState::Compiled
        } else if self.routes.is_empty() {
            RouterState::Empty
        } else {
            RouterState::Building
        }
    }

    /// Returns `true` once [`compile`](Self::compile) has been called.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All routes, in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// Routes are tested in registration order and the first whose method and pattern
    /// both match wins, even when a later route would be more specific. The path is
    /// matched as given: strip the query string and context path beforehand.
    ///
    /// # Returns
    ///
    /// `Ok(Some(match))` with the route and its extracted parameters, or `Ok(None)` when
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// [`RouterError::NotCompiled`] if called before [`compile`](Self::compile).
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<Option<RouteMatch<'_>>, RouterError> {
        if !self.compiled {
            return Err(RouterError::NotCompiled);
        }

        for route in &self.routes {
            if route.method() != method {
                continue;
            }
            if let Some((params, raw_params)) = route.extract_all(path) {
                trace!(%method, path, template = route.template(), "route resolved");
                return Ok(Some(RouteMatch {
                    route,
                    params,
                    raw_params,
                }));
            }
        }

        trace!(%method, path, "no route matched");
        Ok(None)
    }

    /// The first route declared for `handler`, if any.
    ///
    /// When several routes share a handler, the earliest declared one is the canonical
    /// route for reverse routing.
    pub fn reverse_route(&self, handler: &HandlerRef) -> Option<&Route> {
        self.routes.iter().find(|route| route.handler() == handler)
    }

    /// Build the URL of `handler`'s route from path parameter values.
    ///
    /// Values are percent-encoded and the context path is prepended. For query strings,
    /// raw values or absolute URLs use [`reverse_router`](Self::reverse_router).
    ///
    /// # Errors
    ///
    /// - [`UrlError::NotCompiled`] — the router is not compiled yet.
    /// - [`UrlError::NoRouteForHandler`] — no route is bound to `handler`.
    /// - Any parameter error from [`Route::build_url`].
    pub fn reverse<I, K, V>(&self, handler: &HandlerRef, values: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let route = self.route_for_reverse(handler)?;
        let path = route.build_url(values)?;
        Ok(format!("{}{path}", self.context_path))
    }

    /// URL builder facade over this router.
    pub fn reverse_router(&self) -> ReverseRouter<'_> {
        ReverseRouter::new(self)
    }

    pub(crate) fn route_for_reverse(&self, handler: &HandlerRef) -> Result<&Route, UrlError> {
        if !self.compiled {
            return Err(UrlError::NotCompiled);
        }
        self.reverse_route(handler)
            .ok_or_else(|| UrlError::NoRouteForHandler(handler.clone()))
    }
}
