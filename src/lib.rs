//! # waypath
//!
//! A route table for web frameworks: compile path templates, resolve requests to
//! handlers, and build URLs back from handlers (reverse routing).
//!
//! Templates declare parameters with `{name}` (one path segment) or
//! `{name: regex}` (any pattern). Routes are matched in declaration order and the
//! first match wins. The table is built once at startup, frozen with
//! [`Router::compile`], and then shared read-only between request handlers.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use waypath::{HandlerRef, Method, Router};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.get("/").with(HandlerRef::new("Home", "index"))?;
//! router.get("/user/{name}/dashboard").with(HandlerRef::new("Users", "dashboard"))?;
//! router.compile()?;
//!
//! let router = Arc::new(router);
//!
//! // Per request: (method, path) in, handler + parameters out.
//! let found = router.resolve(&"GET".parse::<Method>()?, "/user/John/dashboard")?;
//! let found = found.expect("route exists");
//! assert_eq!(found.handler().action(), "dashboard");
//! assert_eq!(found.params().get("name"), Some("John"));
//!
//! // No match is not an error: the caller renders its 404.
//! assert!(router.resolve(&Method::Get, "/dashboard")?.is_none());
//!
//! // And back again.
//! let url = router
//!     .reverse_router()
//!     .with(HandlerRef::new("Users", "dashboard"))
//!     .path_param("name", "Jane")
//!     .query_param("tab", "settings")
//!     .build()?;
//! assert_eq!(url, "/user/Jane/dashboard?tab=settings");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod handler;
pub mod http;
pub mod params;
pub mod router;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{ConfigError, RouteEntry, RouterConfig};
pub use handler::{HandlerRef, HandlerRefError};
pub use http::Method;
pub use params::PathParams;
pub use router::{
    ReverseRouter, Route, RouteBuilder, RouteMatch, RouteParameter, Router, RouterError,
    RouterState, TemplateError, UrlBuilder, UrlError,
};
