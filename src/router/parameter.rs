//! Path template tokenizer.
//!
//! A template is a path pattern in which `{name}` and `{name: regex}` tokens mark
//! the parameters. Everything outside the tokens is kept as written.

use std::collections::HashSet;

use super::error::TemplateError;

/// Pattern used for parameters declared without an explicit regex.
///
/// Matches within a single path segment.
pub const DEFAULT_PATTERN: &str = "[^/]*";

/// One `{name}` or `{name: regex}` token of a route template.
///
/// # Examples
///
/// ```
/// use waypath::router::RouteParameter;
///
/// let params = RouteParameter::parse("/user/{id: [0-9]+}/{tab}").unwrap();
///
/// assert_eq!(params[0].name(), "id");
/// assert_eq!(params[0].regex(), Some("[0-9]+"));
/// assert_eq!(params[0].token(), "{id: [0-9]+}");
/// assert_eq!(params[0].index(), 6);
///
/// assert_eq!(params[1].name(), "tab");
/// assert_eq!(params[1].regex(), None);
/// assert_eq!(params[1].pattern(), "[^/]*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParameter {
    index: usize,
    token: String,
    name: String,
    regex: Option<String>,
}

impl RouteParameter {
    /// Parse every parameter token in `template`, left to right.
    ///
    /// The regex part of a token extends to the matching closing brace, so
    /// constraints may contain balanced braces (`{code: [0-9]{3}}`). A backslash
    /// escapes the following character both inside and outside tokens; `\{`
    /// outside a token is a literal brace rather than the start of a parameter.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::UnclosedBrace`] — a `{` with no matching `}`.
    /// - [`TemplateError::UnexpectedClosingBrace`] — a `}` outside any token.
    /// - [`TemplateError::InvalidName`] — the name is empty or not an identifier.
    /// - [`TemplateError::EmptyConstraint`] — a `:` with nothing after it.
    /// - [`TemplateError::DuplicateParameter`] — two tokens share a name.
    pub fn parse(template: &str) -> Result<Vec<RouteParameter>, TemplateError> {
        let bytes = template.as_bytes();
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'\\' => pos += 2,
                b'}' => {
                    return Err(TemplateError::UnexpectedClosingBrace {
                        template: template.to_owned(),
                        index: pos,
                    });
                }
                b'{' => {
                    let end = closing_brace(template, pos)?;
                    let param = Self::from_token(template, pos, end)?;

                    if !seen.insert(param.name.clone()) {
                        return Err(TemplateError::DuplicateParameter {
                            template: template.to_owned(),
                            name: param.name,
                        });
                    }

                    params.push(param);
                    pos = end + 1;
                }
                _ => pos += 1,
            }
        }

        Ok(params)
    }

    // Build a parameter from the token spanning `start..=end` (both braces included).
    fn from_token(template: &str, start: usize, end: usize) -> Result<Self, TemplateError> {
        let token = &template[start..=end];
        let body = &template[start + 1..end];

        let (name, regex) = match body.split_once(':') {
            Some((name, regex)) => (name.trim(), Some(regex.trim())),
            None => (body.trim(), None),
        };

        if !is_identifier(name) {
            return Err(TemplateError::InvalidName {
                template: template.to_owned(),
                name: name.to_owned(),
            });
        }

        if regex.is_some_and(str::is_empty) {
            return Err(TemplateError::EmptyConstraint {
                template: template.to_owned(),
                name: name.to_owned(),
            });
        }

        Ok(Self {
            index: start,
            token: token.to_owned(),
            name: name.to_owned(),
            regex: regex.map(str::to_owned),
        })
    }

    /// Byte offset of the token within the raw template.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The token exactly as written, braces included.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit regex constraint, if one was given.
    pub fn regex(&self) -> Option<&str> {
        self.regex.as_deref()
    }

    /// The pattern this parameter matches: its constraint, or [`DEFAULT_PATTERN`].
    pub fn pattern(&self) -> &str {
        self.regex.as_deref().unwrap_or(DEFAULT_PATTERN)
    }
}

// Find the `}` that closes the `{` at `open`, honouring nesting and escapes.
fn closing_brace(template: &str, open: usize) -> Result<usize, TemplateError> {
    let bytes = template.as_bytes();
    let mut depth = 0usize;
    let mut pos = open;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                pos += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }

    Err(TemplateError::UnclosedBrace {
        template: template.to_owned(),
        index: open,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
