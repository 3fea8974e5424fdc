//! Error types for template compilation, route table state and URL building.

use thiserror::Error;

use crate::handler::HandlerRef;

/// A route template that cannot be compiled.
///
/// All of these are configuration mistakes and surface while the route table is
/// being built, never while serving requests.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("route `{template}`: unclosed `{{` at offset {index}")]
    UnclosedBrace { template: String, index: usize },

    #[error("route `{template}`: unexpected `}}` at offset {index}")]
    UnexpectedClosingBrace { template: String, index: usize },

    #[error("route `{template}`: `{name}` is not a valid parameter name")]
    InvalidName { template: String, name: String },

    #[error("route `{template}`: parameter `{name}` has an empty regex constraint")]
    EmptyConstraint { template: String, name: String },

    #[error("route `{template}`: parameter `{name}` is declared more than once")]
    DuplicateParameter { template: String, name: String },

    #[error("route `{template}`: invalid pattern: {source}")]
    InvalidRegex {
        template: String,
        #[source]
        source: regex::Error,
    },

    #[error("route `{template}`: parameter `{name}` has no capture group in the compiled pattern")]
    MissingCaptureGroup { template: String, name: String },
}

/// Errors raised by the [`Router`](super::Router) while building or serving
/// the route table.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("route table is already compiled; no further changes are accepted")]
    AlreadyCompiled,

    #[error("route table has not been compiled yet")]
    NotCompiled,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("handler `{handler}` expects path parameter `{argument}`, which route `{template}` does not declare")]
    UnknownHandlerArgument {
        template: String,
        handler: HandlerRef,
        argument: String,
    },

    #[error("context path `{0}` must be empty or start with `/`")]
    InvalidContextPath(String),
}

/// Errors raised while building a URL from a route (reverse routing).
///
/// These indicate a caller bug: values are never silently dropped or defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("route `{template}`: missing value for path parameter `{name}`")]
    MissingParameter { template: String, name: String },

    #[error("route `{template}`: unknown path parameter `{name}`")]
    UnknownParameter { template: String, name: String },

    #[error("route `{template}`: path parameter `{name}` supplied more than once")]
    DuplicateParameter { template: String, name: String },

    #[error("path parameter `{name}`: value `{value}` does not match `{constraint}`")]
    InvalidParameterValue {
        name: String,
        value: String,
        constraint: String,
    },

    #[error("route `{template}`: built path `{path}` does not match the route's own pattern")]
    NotReversible { template: String, path: String },

    #[error("no route is bound to handler `{0}`")]
    NoRouteForHandler(HandlerRef),

    #[error("route table has not been compiled yet")]
    NotCompiled,
}
