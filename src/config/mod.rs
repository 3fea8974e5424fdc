//! Route table configuration.
//!
//! Applications can declare their routes as data instead of code. The JSON form is:
//!
//! ```json
//! {
//!   "context_path": "/app",
//!   "routes": [
//!     { "method": "GET",  "path": "/",                    "handler": "Home::index" },
//!     { "method": "GET",  "path": "/user/{id: [0-9]+}",  "handler": "Users::show", "args": ["id"] },
//!     { "method": "POST", "path": "/user",                "handler": "Users::create" }
//!   ]
//! }
//! ```
//!
//! Entries keep their order, which is also their match priority.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::handler::HandlerRef;
use crate::http::Method;
use crate::router::{Router, RouterError};

/// Errors produced while loading a route table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read route table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("route #{index} ({method} {path}): {source}")]
    Route {
        index: usize,
        method: Method,
        path: String,
        #[source]
        source: RouterError,
    },

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    /// HTTP method, any case.
    pub method: Method,
    /// Path template.
    pub path: String,
    /// Handler in `Controller::action` form.
    pub handler: HandlerRef,
    /// Path parameters the handler reads; each must appear in `path`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// A declarative route table.
///
/// # Examples
///
/// ```rust
/// use waypath::{HandlerRef, Method};
/// use waypath::config::RouterConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let router = RouterConfig::from_json(r#"{
///     "context_path": "/app",
///     "routes": [
///         { "method": "get", "path": "/user/{id: [0-9]+}", "handler": "Users::show", "args": ["id"] }
///     ]
/// }"#)?
/// .into_router()?;
///
/// let found = router.resolve(&Method::Get, "/user/5")?.unwrap();
/// assert_eq!(found.handler(), &HandlerRef::new("Users", "show"));
/// assert_eq!(router.reverse(found.handler(), [("id", "6")])?, "/app/user/6");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Prefix prepended to URLs built by reverse routing.
    #[serde(default)]
    pub context_path: String,
    /// Routes in match order.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouterConfig {
    /// Parse a route table from JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] for malformed JSON, unknown fields or invalid handler
    /// references.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON route table file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), "loading route table");
        Self::from_json(&json)
    }

    /// Register the configured context path and routes on `router`, in order.
    ///
    /// The router is left open so code can add more routes before compiling it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Router`] for an invalid context path or a frozen router, and
    /// [`ConfigError::Route`] naming the first entry that fails to register.
    pub fn apply(&self, router: &mut Router) -> Result<(), ConfigError> {
        if !self.context_path.is_empty() {
            router.with_context_path(&self.context_path)?;
        }

        for (index, entry) in self.routes.iter().enumerate() {
            router
                .method(entry.method.clone(), &entry.path)
                .args(entry.args.iter().cloned())
                .with(entry.handler.clone())
                .map_err(|source| ConfigError::Route {
                    index,
                    method: entry.method.clone(),
                    path: entry.path.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Build a new router from this table and compile it.
    ///
    /// # Errors
    ///
    /// As [`apply`](Self::apply).
    pub fn into_router(self) -> Result<Router, ConfigError> {
        let mut router = Router::new();
        self.apply(&mut router)?;
        router.compile()?;
        Ok(router)
    }
}
