//! A single compiled route: matcher plus reverse template.

use std::borrow::Cow;
use std::fmt::{self, Write as _};

use regex::{Captures, Regex};

use super::encoding::{decode, encode_path_segment, unescape_literal};
use super::error::{TemplateError, UrlError};
use super::parameter::RouteParameter;
use crate::handler::HandlerRef;
use crate::http::Method;
use crate::params::PathParams;

// Name given to the capture group wrapping the parameter at position `i`.
fn group_name(i: usize) -> String {
    format!("__wp{i}")
}

// Binding between a declared parameter and where to find it in a match.
#[derive(Debug, Clone)]
struct Capture {
    // Index of the parameter's capture group in the compiled pattern.
    group: usize,
    // The parameter's pattern anchored on both ends; checked when building URLs.
    constraint: Regex,
}

/// How a value is written into a built path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insert {
    /// Percent-encoded as a path segment.
    Encoded,
    /// Verbatim.
    Raw,
}

/// A route template compiled for one HTTP method and bound to a handler.
///
/// Template text outside `{…}` tokens is used as a regular expression, so
/// `/assets/.*` is a valid template. The compiled pattern is anchored and has to
/// match the whole path.
///
/// Routes are immutable once compiled and are `Send + Sync`, so a route table can
/// be shared across request threads without locking.
///
/// # Examples
///
/// ```
/// use waypath::{HandlerRef, Method, Route};
///
/// let route = Route::compile(
///     Method::Get,
///     "/user/{id: [0-9]+}",
///     HandlerRef::new("UserController", "show"),
/// )
/// .unwrap();
///
/// assert!(route.matches(&Method::Get, "/user/123"));
/// assert!(!route.matches(&Method::Get, "/user/abc"));
/// assert_eq!(route.extract_parameters("/user/123").unwrap().get("id"), Some("123"));
/// assert_eq!(route.build_url([("id", "7")]).unwrap(), "/user/7");
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    template: String,
    handler: HandlerRef,
    regex: Regex,
    parameters: Vec<RouteParameter>,
    // Parallel to `parameters`.
    captures: Vec<Capture>,
    // Template text around the tokens with regex escapes removed; one more
    // entry than `parameters`.
    literals: Vec<String>,
}

impl Route {
    /// Compile `template` into a route for `method`, bound to `handler`.
    ///
    /// Each parameter token becomes a capturing group holding its pattern, in
    /// declaration order, and the whole expression is anchored. The position of
    /// every parameter's group is resolved here, once, so extraction never
    /// depends on how groups inside user-supplied regexes are numbered.
    ///
    /// # Errors
    ///
    /// Any [`TemplateError`] from tokenizing the template, or
    /// [`TemplateError::InvalidRegex`] when the resulting pattern does not compile.
    pub fn compile(
        method: Method,
        template: &str,
        handler: HandlerRef,
    ) -> Result<Self, TemplateError> {
        let parameters = RouteParameter::parse(template)?;
        let invalid = |source: regex::Error| TemplateError::InvalidRegex {
            template: template.to_owned(),
            source,
        };

        let mut pattern = String::with_capacity(template.len() + 8 * parameters.len() + 6);
        let mut literals = Vec::with_capacity(parameters.len() + 1);
        pattern.push_str("^(?:");
        let mut cursor = 0;
        for (i, param) in parameters.iter().enumerate() {
            let literal = &template[cursor..param.index()];
            pattern.push_str(literal);
            literals.push(unescape_literal(literal));
            // Writing to a String cannot fail.
            let _ = write!(pattern, "(?P<{}>{})", group_name(i), param.pattern());
            cursor = param.index() + param.token().len();
        }
        pattern.push_str(&template[cursor..]);
        literals.push(unescape_literal(&template[cursor..]));
        pattern.push_str(")$");

        let regex = Regex::new(&pattern).map_err(invalid)?;

        let names: Vec<Option<&str>> = regex.capture_names().collect();
        let captures = parameters
            .iter()
            .enumerate()
            .map(|(i, param)| -> Result<Capture, TemplateError> {
                let wanted = group_name(i);
                let group = names
                    .iter()
                    .position(|name| *name == Some(wanted.as_str()))
                    .ok_or_else(|| TemplateError::MissingCaptureGroup {
                        template: template.to_owned(),
                        name: param.name().to_owned(),
                    })?;
                let constraint =
                    Regex::new(&format!("^(?:{})$", param.pattern())).map_err(invalid)?;
                Ok(Capture { group, constraint })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            method,
            template: template.to_owned(),
            handler,
            regex,
            parameters,
            captures,
            literals,
        })
    }

    /// The HTTP method this route answers.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The template exactly as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The handler this route is bound to.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The parameters declared by the template, in declaration order.
    pub fn parameters(&self) -> &[RouteParameter] {
        &self.parameters
    }

    /// Declared parameter names, in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(RouteParameter::name)
    }

    /// Source of the compiled, anchored pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns `true` if `method` is this route's method and `path` matches the
    /// whole pattern.
    ///
    /// Methods compare case-insensitively because [`Method`] normalises case
    /// when parsed.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.regex.is_match(path)
    }

    /// Returns `true` if `path` matches the pattern, whatever the method.
    pub fn matches_path(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extract the percent-decoded parameter values from `path`.
    ///
    /// Returns `None` when `path` does not match. The result holds exactly the
    /// declared parameter names in declaration order. `+` is kept as-is (it is
    /// not a space in a path) and byte sequences that are not valid UTF-8 after
    /// decoding are replaced lossily.
    pub fn extract_parameters(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        Some(self.collect(&caps, decode))
    }

    /// Extract the parameter values from `path` without percent-decoding them.
    pub fn extract_raw_parameters(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        Some(self.collect(&caps, str::to_owned))
    }

    /// Match `path` once and return its `(decoded, raw)` parameters.
    pub(crate) fn extract_all(&self, path: &str) -> Option<(PathParams, PathParams)> {
        let caps = self.regex.captures(path)?;
        Some((self.collect(&caps, decode), self.collect(&caps, str::to_owned)))
    }

    fn collect(&self, caps: &Captures<'_>, convert: impl Fn(&str) -> String) -> PathParams {
        let mut params = PathParams::with_capacity(self.parameters.len());
        for (param, capture) in self.parameters.iter().zip(&self.captures) {
            let raw = caps.get(capture.group).map_or("", |m| m.as_str());
            params.push(param.name(), convert(raw));
        }
        params
    }

    /// Build a concrete path from this route's template, percent-encoding each
    /// value as a path segment.
    ///
    /// `values` must name every declared parameter exactly once and nothing else.
    /// Characters a path segment allows unescaped (`@`, `:`, `+`, `=` and the
    /// other sub-delimiters) are kept as they are. Regex escapes in the literal
    /// template text are dropped, so `/v1\.0/{id}` builds `/v1.0/…`.
    ///
    /// # Errors
    ///
    /// - [`UrlError::MissingParameter`] — a declared parameter has no value.
    /// - [`UrlError::UnknownParameter`] — a key is not declared by the template.
    /// - [`UrlError::DuplicateParameter`] — a key appears twice.
    /// - [`UrlError::InvalidParameterValue`] — the value, as written into the
    ///   path, does not satisfy the parameter's pattern.
    /// - [`UrlError::NotReversible`] — the built path does not match the route,
    ///   because the literal template text is a pattern rather than fixed text.
    pub fn build_url<I, K, V>(&self, values: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let owned: Vec<(K, V)> = values.into_iter().collect();
        self.render(
            owned
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_ref(), Insert::Encoded)),
        )
    }

    /// Like [`build_url`](Self::build_url), but inserts values exactly as given.
    ///
    /// Use this for values that are already encoded or that intentionally span
    /// several segments (`.*`-style parameters).
    pub fn build_raw_url<I, K, V>(&self, values: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let owned: Vec<(K, V)> = values.into_iter().collect();
        self.render(
            owned
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_ref(), Insert::Raw)),
        )
    }

    // Substitute values into the template and check the result against the route.
    pub(crate) fn render<'v, I>(&self, values: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (&'v str, &'v str, Insert)>,
    {
        let mut slots: Vec<Option<(&'v str, Insert)>> = vec![None; self.parameters.len()];

        for (name, value, insert) in values {
            let pos = self
                .parameters
                .iter()
                .position(|p| p.name() == name)
                .ok_or_else(|| UrlError::UnknownParameter {
                    template: self.template.clone(),
                    name: name.to_owned(),
                })?;

            if slots[pos].is_some() {
                return Err(UrlError::DuplicateParameter {
                    template: self.template.clone(),
                    name: name.to_owned(),
                });
            }
            slots[pos] = Some((value, insert));
        }

        let mut url = String::with_capacity(self.template.len());
        for (((param, capture), slot), literal) in self
            .parameters
            .iter()
            .zip(&self.captures)
            .zip(slots)
            .zip(&self.literals)
        {
            let (value, insert) = slot.ok_or_else(|| UrlError::MissingParameter {
                template: self.template.clone(),
                name: param.name().to_owned(),
            })?;

            let text = match insert {
                Insert::Encoded => encode_path_segment(value),
                Insert::Raw => Cow::Borrowed(value),
            };
            if !capture.constraint.is_match(&text) {
                return Err(UrlError::InvalidParameterValue {
                    name: param.name().to_owned(),
                    value: value.to_owned(),
                    constraint: param.pattern().to_owned(),
                });
            }

            url.push_str(literal);
            url.push_str(&text);
        }
        if let Some(tail) = self.literals.last() {
            url.push_str(tail);
        }

        if !self.regex.is_match(&url) {
            return Err(UrlError::NotReversible {
                template: self.template.clone(),
                path: url,
            });
        }

        Ok(url)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {} => {}", self.method.as_str(), self.template, self.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(template: &str) -> Route {
        Route::compile(Method::Get, template, HandlerRef::new("Test", "handle")).unwrap()
    }

    // ── compile ───────────────────────────────────────────────────────────────

    #[test]
    fn compile_anchors_pattern() {
        let r = route("/user/{name}");
        assert_eq!(r.pattern(), "^(?:/user/(?P<__wp0>[^/]*))$");
    }

    #[test]
    fn compile_rejects_invalid_regex() {
        let err = Route::compile(Method::Get, "/x/{id: [0-9}", HandlerRef::new("A", "b"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRegex { .. }));
    }

    #[test]
    fn compile_propagates_template_errors() {
        let err =
            Route::compile(Method::Get, "/{a}/{a}", HandlerRef::new("A", "b")).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateParameter { .. }));
    }

    #[test]
    fn static_template_has_no_parameters() {
        let r = route("/home/index");
        assert_eq!(r.parameters().len(), 0);
        assert!(r.matches(&Method::Get, "/home/index"));
        assert!(r.extract_parameters("/home/index").unwrap().is_empty());
    }

    // ── matches ───────────────────────────────────────────────────────────────

    #[test]
    fn named_parameter_matches_single_segment() {
        let r = route("/user/{name}/dashboard");
        assert!(r.matches(&Method::Get, "/user/John/dashboard"));
        assert!(!r.matches(&Method::Get, "/dashboard"));
        assert!(!r.matches(&Method::Get, "/user/dashboard"));
        assert!(!r.matches(&Method::Get, "/user/John/Doe/dashboard"));
    }

    #[test]
    fn match_is_anchored_at_both_ends() {
        let r = route("/home");
        assert!(r.matches(&Method::Get, "/home"));
        assert!(!r.matches(&Method::Get, "/home/index"));
        assert!(!r.matches(&Method::Get, "/prefix/home"));
    }

    #[test]
    fn top_level_alternation_stays_anchored() {
        let r = route("/a|/b");
        assert!(r.matches(&Method::Get, "/a"));
        assert!(r.matches(&Method::Get, "/b"));
        assert!(!r.matches(&Method::Get, "/a/x"));
        assert!(!r.matches(&Method::Get, "/x/b"));
    }

    #[test]
    fn method_must_match() {
        let r = route("/home");
        assert!(!r.matches(&Method::Post, "/home"));
        assert!(r.matches(&"get".parse().unwrap(), "/home"));
        assert!(r.matches_path("/home"));
    }

    #[test]
    fn regex_constraint_filters_values() {
        let r = route("/user/{id: [0-9]+}");
        assert!(!r.matches(&Method::Get, "/user/abc"));
        assert!(!r.matches(&Method::Get, "/user/"));
        assert!(r.matches(&Method::Get, "/user/123"));
    }

    #[test]
    fn regex_parameter_may_span_segments() {
        let r = route("/assets/{file: .*}");
        let params = r.extract_parameters("/assets/css/site.css").unwrap();
        assert_eq!(params.get("file"), Some("css/site.css"));
    }

    #[test]
    fn literal_regex_outside_tokens() {
        let r = route("/assets/.*");
        assert!(r.matches(&Method::Get, "/assets/js/app.js"));
        assert!(!r.matches(&Method::Get, "/other/js/app.js"));
    }

    // ── extract_parameters ────────────────────────────────────────────────────

    #[test]
    fn extracts_single_parameter() {
        let r = route("/user/{name}/dashboard");
        let p = r.extract_parameters("/user/John/dashboard").unwrap();
        assert_eq!(p.iter().collect::<Vec<_>>(), [("name", "John")]);
    }

    #[test]
    fn extracts_multiple_parameters_in_order() {
        let r = route("/{name}/{id}/dashboard");
        let p = r.extract_parameters("/John/20/dashboard").unwrap();
        assert_eq!(p.iter().collect::<Vec<_>>(), [("name", "John"), ("id", "20")]);
    }

    #[test]
    fn extract_returns_none_on_mismatch() {
        let r = route("/{name}/{id}/dashboard");
        assert!(r.extract_parameters("/John/dashboard").is_none());
    }

    #[test]
    fn user_capture_groups_do_not_shift_parameters() {
        let r = route("/(en|de)/{lang: (x|y)(z)?}/{id}");
        let p = r.extract_parameters("/en/xz/42").unwrap();
        assert_eq!(p.get("lang"), Some("xz"));
        assert_eq!(p.get("id"), Some("42"));
    }

    #[test]
    fn user_named_groups_do_not_shift_parameters() {
        let r = route("/(?P<lang>en|de)/{id}/(?P<fmt>json|xml)");
        let p = r.extract_parameters("/de/42/json").unwrap();
        assert_eq!(p.iter().collect::<Vec<_>>(), [("id", "42")]);
    }

    #[test]
    fn reserved_group_name_is_rejected() {
        let err = Route::compile(Method::Get, "/(?P<__wp0>x)/{id}", HandlerRef::new("A", "b"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRegex { .. }));
    }

    #[test]
    fn extract_all_returns_decoded_and_raw_from_one_match() {
        let r = route("/files/{dir}/{name}");
        let (decoded, raw) = r.extract_all("/files/my%20docs/a%2Bb").unwrap();
        assert_eq!(decoded.iter().collect::<Vec<_>>(), [("dir", "my docs"), ("name", "a+b")]);
        assert_eq!(raw.iter().collect::<Vec<_>>(), [("dir", "my%20docs"), ("name", "a%2Bb")]);
        assert!(r.extract_all("/files/only-one").is_none());
    }

    #[test]
    fn decoded_and_raw_extraction() {
        let r = route("/search/{term}");
        let path = "/search/hello%20world%2Bmore+plus";
        let decoded = r.extract_parameters(path).unwrap();
        let raw = r.extract_raw_parameters(path).unwrap();
        assert_eq!(decoded.get("term"), Some("hello world+more+plus"));
        assert_eq!(raw.get("term"), Some("hello%20world%2Bmore+plus"));
    }

    #[test]
    fn invalid_utf8_decodes_lossily() {
        let r = route("/x/{v}");
        let p = r.extract_parameters("/x/a%FFb").unwrap();
        assert_eq!(p.get("v"), Some("a\u{FFFD}b"));
    }

    // ── build_url ─────────────────────────────────────────────────────────────

    #[test]
    fn build_replaces_tokens() {
        let r = route("/{name}/{id: [0-9]+}/dashboard");
        let url = r.build_url([("id", "20"), ("name", "John")]).unwrap();
        assert_eq!(url, "/John/20/dashboard");
    }

    #[test]
    fn build_encodes_values() {
        let r = route("/user/{name}");
        assert_eq!(
            r.build_url([("name", "John Doe/x")]).unwrap(),
            "/user/John%20Doe%2Fx"
        );
    }

    #[test]
    fn build_raw_leaves_values_alone() {
        let r = route("/assets/{file: .*}");
        assert_eq!(
            r.build_raw_url([("file", "css/site.css")]).unwrap(),
            "/assets/css/site.css"
        );
    }

    #[test]
    fn build_rejects_missing_parameter() {
        let r = route("/{name}/{id}");
        assert_eq!(
            r.build_url([("name", "John")]).unwrap_err(),
            UrlError::MissingParameter {
                template: "/{name}/{id}".to_owned(),
                name: "id".to_owned(),
            }
        );
    }

    #[test]
    fn build_rejects_unknown_parameter() {
        let r = route("/{name}");
        assert!(matches!(
            r.build_url([("name", "John"), ("age", "3")]).unwrap_err(),
            UrlError::UnknownParameter { name, .. } if name == "age"
        ));
    }

    #[test]
    fn build_rejects_duplicate_parameter() {
        let r = route("/{name}");
        assert!(matches!(
            r.build_url([("name", "a"), ("name", "b")]).unwrap_err(),
            UrlError::DuplicateParameter { .. }
        ));
    }

    #[test]
    fn build_rejects_value_violating_constraint() {
        let r = route("/user/{id: [0-9]+}");
        assert!(matches!(
            r.build_url([("id", "abc")]).unwrap_err(),
            UrlError::InvalidParameterValue { name, constraint, .. }
                if name == "id" && constraint == "[0-9]+"
        ));
    }

    #[test]
    fn build_raw_rejects_slash_in_default_parameter() {
        let r = route("/user/{name}");
        assert!(r.build_raw_url([("name", "a/b")]).is_err());
    }

    #[test]
    fn build_accepts_owned_pairs() {
        let r = route("/user/{id}");
        let values = vec![("id".to_owned(), 42.to_string())];
        assert_eq!(r.build_url(values).unwrap(), "/user/42");
    }

    #[test]
    fn build_keeps_segment_safe_characters() {
        let r = route("/user/{email: [^/]+@[^/]+}");
        assert_eq!(r.build_url([("email", "a@b.com")]).unwrap(), "/user/a@b.com");

        let r = route("/q/{expr}");
        assert_eq!(r.build_url([("expr", "a+b=c;d,e:f")]).unwrap(), "/q/a+b=c;d,e:f");
    }

    #[test]
    fn constraint_error_reports_the_given_value() {
        let r = route("/user/{email: [^/]+@[^/]+}");
        assert_eq!(
            r.build_url([("email", "not-an-address")]).unwrap_err(),
            UrlError::InvalidParameterValue {
                name: "email".to_owned(),
                value: "not-an-address".to_owned(),
                constraint: "[^/]+@[^/]+".to_owned(),
            }
        );
    }

    #[test]
    fn build_drops_escapes_from_literal_text() {
        let r = route(r"/files/v1\.0/{id}");
        let url = r.build_url([("id", "5")]).unwrap();
        assert_eq!(url, "/files/v1.0/5");
        assert!(r.matches_path(&url));

        let r = route(r"/lit\{x\}/{id}");
        let url = r.build_url([("id", "5")]).unwrap();
        assert_eq!(url, "/lit{x}/5");
        assert!(r.matches_path(&url));
    }

    #[test]
    fn pattern_literals_cannot_be_reversed() {
        for template in ["/a|/b", r"/x/\d+/{id}", "/opt/?"] {
            let r = route(template);
            let values: Vec<(&str, &str)> =
                r.parameter_names().map(|name| (name, "1")).collect();
            assert!(
                matches!(
                    r.build_url(values).unwrap_err(),
                    UrlError::NotReversible { template: t, .. } if t == template
                ),
                "{template}"
            );
        }
    }

    // ── round trip ────────────────────────────────────────────────────────────

    #[test]
    fn extracted_parameters_rebuild_a_matching_path() {
        for (template, path) in [
            ("/user/{name}/dashboard", "/user/John/dashboard"),
            ("/{name}/{id}/dashboard", "/John%20Smith/20/dashboard"),
            ("/user/{id: [0-9]+}", "/user/123"),
            ("/tag/{tag}", "/tag/caf%C3%A9"),
            ("/user/{email: [^/]+@[^/]+}", "/user/a@b.com"),
            ("/k/{pair: [a-z]+=[0-9]+}", "/k/x=1"),
            (r"/files/v1\.0/{id}", "/files/v1.0/5"),
            (r"/lit\{x\}/{id}", "/lit{x}/5"),
            ("/name/{name}", "/name/a%2Fb"),
        ] {
            let r = route(template);
            let params = r.extract_parameters(path).unwrap();
            let rebuilt = r.build_url(&params).unwrap();
            assert!(r.matches(&Method::Get, &rebuilt), "{template}: {rebuilt}");
            assert_eq!(r.extract_parameters(&rebuilt).unwrap(), params);
        }
    }

    #[test]
    fn display_lists_method_template_and_handler() {
        assert_eq!(route("/x").to_string(), "GET     /x => Test::handle");
    }
}
