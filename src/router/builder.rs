//! Fluent route registration.

use super::error::RouterError;
use super::route::Route;
use super::Router;
use crate::handler::HandlerRef;
use crate::http::Method;

/// A route being registered on a [`Router`].
///
/// Obtained from [`Router::get`], [`Router::post`] and friends; the route is compiled
/// and appended only when [`with`](Self::with) binds it to a handler.
///
/// # Examples
///
/// ```rust
/// use waypath::{HandlerRef, Router, RouterError};
///
/// let mut router = Router::new();
///
/// router
///     .get("/posts/{post_id}/comments/{id}")
///     .args(["post_id", "id"])
///     .with(HandlerRef::new("Comments", "show"))
///     .unwrap();
///
/// // The handler asks for a parameter the template does not declare.
/// let err = router
///     .get("/posts/{id}")
///     .args(["slug"])
///     .with(HandlerRef::new("Posts", "show"))
///     .unwrap_err();
/// assert!(matches!(err, RouterError::UnknownHandlerArgument { .. }));
/// ```
#[must_use = "a route is only registered once `with` binds it to a handler"]
pub struct RouteBuilder<'r> {
    router: &'r mut Router,
    method: Method,
    template: String,
    args: Vec<String>,
}

impl<'r> RouteBuilder<'r> {
    pub(super) fn new(router: &'r mut Router, method: Method, template: &str) -> Self {
        Self {
            router,
            method,
            template: template.to_owned(),
            args: Vec::new(),
        }
    }

    /// Declare the path parameters the handler reads.
    ///
    /// Each name must be declared by the template; [`with`](Self::with) fails otherwise,
    /// so a handler wired to the wrong route is caught at startup instead of on the
    /// first request.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bind the route to `handler`, compile it and append it to the router.
    ///
    /// # Errors
    ///
    /// - [`RouterError::AlreadyCompiled`] — the router is frozen.
    /// - [`RouterError::Template`] — the template is malformed.
    /// - [`RouterError::UnknownHandlerArgument`] — a name given to [`args`](Self::args)
    ///   is not a parameter of the template.
    pub fn with(self, handler: HandlerRef) -> Result<&'r Route, RouterError> {
        let Self {
            router,
            method,
            template,
            args,
        } = self;

        router.ensure_building()?;
        let route = Route::compile(method, &template, handler)?;

        if let Some(argument) = args
            .into_iter()
            .find(|arg| !route.parameter_names().any(|name| name == arg.as_str()))
        {
            return Err(RouterError::UnknownHandlerArgument {
                template,
                handler: route.handler().clone(),
                argument,
            });
        }

        Ok(router.push(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_registers_route() {
        let mut router = Router::new();
        let route = router
            .method(Method::Custom("PURGE".to_owned()), "/cache/{key}")
            .with(HandlerRef::new("Cache", "purge"))
            .unwrap();
        assert_eq!(route.method().as_str(), "PURGE");
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn args_must_exist_in_template() {
        let mut router = Router::new();
        let err = router
            .get("/user/{id}")
            .args(["id", "name"])
            .with(HandlerRef::new("Users", "show"))
            .unwrap_err();
        match err {
            RouterError::UnknownHandlerArgument {
                template,
                handler,
                argument,
            } => {
                assert_eq!(template, "/user/{id}");
                assert_eq!(handler, HandlerRef::new("Users", "show"));
                assert_eq!(argument, "name");
            }
            other => panic!("expected UnknownHandlerArgument, got {other:?}"),
        }
        assert!(router.is_empty());
    }

    #[test]
    fn args_accept_owned_strings() {
        let mut router = Router::new();
        let names = vec!["a".to_owned(), "b".to_owned()];
        router
            .put("/{a}/{b}")
            .args(names)
            .with(HandlerRef::new("Pairs", "update"))
            .unwrap();
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn every_method_helper_sets_its_method() {
        let mut router = Router::new();
        router.get("/").with(HandlerRef::new("M", "get")).unwrap();
        router.post("/").with(HandlerRef::new("M", "post")).unwrap();
        router.put("/").with(HandlerRef::new("M", "put")).unwrap();
        router.delete("/").with(HandlerRef::new("M", "delete")).unwrap();
        router.patch("/").with(HandlerRef::new("M", "patch")).unwrap();
        router.head("/").with(HandlerRef::new("M", "head")).unwrap();
        router.options("/").with(HandlerRef::new("M", "options")).unwrap();

        let methods: Vec<_> = router.routes().iter().map(|r| r.method().as_str()).collect();
        assert_eq!(
            methods,
            ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"]
        );
    }
}
