//! Handler identities — the opaque values routes are bound to.
//!
//! The route table never invokes handlers. It only needs a value it can store
//! alongside each route, hand back on a match, and compare during reverse
//! lookup. [`HandlerRef`] is that value: a `(controller, action)` pair written
//! `Controller::action` in its textual form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a `Controller::action` string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerRefError {
    #[error("handler reference `{0}` must have the form `Controller::action`")]
    MissingSeparator(String),

    #[error("handler reference `{0}` has an empty controller or action")]
    EmptyPart(String),
}

/// Identity of the handler a route dispatches to.
///
/// Two references are equal when both controller and action match, which is
/// what reverse routing keys on.
///
/// # Examples
///
/// ```
/// use waypath::HandlerRef;
///
/// let by_parts = HandlerRef::new("UserController", "show");
/// let parsed: HandlerRef = "UserController::show".parse().unwrap();
///
/// assert_eq!(by_parts, parsed);
/// assert_eq!(parsed.to_string(), "UserController::show");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandlerRef {
    controller: String,
    action: String,
}

impl HandlerRef {
    /// Creates a handler reference from its two parts.
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// The controller (type, module or group) part.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The action (method or function) part.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.action)
    }
}

impl FromStr for HandlerRef {
    type Err = HandlerRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the last separator so controllers may carry module paths.
        let (controller, action) = s
            .rsplit_once("::")
            .ok_or_else(|| HandlerRefError::MissingSeparator(s.to_owned()))?;

        let (controller, action) = (controller.trim(), action.trim());
        if controller.is_empty() || action.is_empty() {
            return Err(HandlerRefError::EmptyPart(s.to_owned()));
        }

        Ok(Self::new(controller, action))
    }
}

impl TryFrom<String> for HandlerRef {
    type Error = HandlerRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandlerRef> for String {
    fn from(handler: HandlerRef) -> Self {
        handler.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let h: HandlerRef = "Home::index".parse().unwrap();
        assert_eq!(h.controller(), "Home");
        assert_eq!(h.action(), "index");
    }

    #[test]
    fn parse_keeps_module_path_in_controller() {
        let h: HandlerRef = "app::users::UserController::show".parse().unwrap();
        assert_eq!(h.controller(), "app::users::UserController");
        assert_eq!(h.action(), "show");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert_eq!(
            "index".parse::<HandlerRef>(),
            Err(HandlerRefError::MissingSeparator("index".to_owned()))
        );
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(matches!(
            "::index".parse::<HandlerRef>(),
            Err(HandlerRefError::EmptyPart(_))
        ));
        assert!(matches!(
            "Home::".parse::<HandlerRef>(),
            Err(HandlerRefError::EmptyPart(_))
        ));
    }

    #[test]
    fn equality_covers_both_parts() {
        assert_eq!(HandlerRef::new("A", "b"), HandlerRef::new("A", "b"));
        assert_ne!(HandlerRef::new("A", "b"), HandlerRef::new("A", "c"));
        assert_ne!(HandlerRef::new("A", "b"), HandlerRef::new("B", "b"));
    }

    #[test]
    fn serde_uses_textual_form() {
        let h: HandlerRef = serde_json::from_str("\"Blog::post\"").unwrap();
        assert_eq!(h, HandlerRef::new("Blog", "post"));
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"Blog::post\"");
        assert!(serde_json::from_str::<HandlerRef>("\"nope\"").is_err());
    }
}
