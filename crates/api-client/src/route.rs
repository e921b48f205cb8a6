//! Route templates
//!
//! A template is a `/`-separated path such as
//! `{project}/_apis/git/repositories/{repositoryId}/items/{*path}`.
//! `{name}` is substituted with the percent-encoded route value. `{*name}` is
//! greedy: its value may itself be a path and its `/` separators are kept.
//! A segment with any placeholder lacking a value is dropped whole, so absent
//! trailing parameters leave no trailing slash and no dangling literal.
//! `{{` and `}}` produce literal braces.

use crate::error::{ApiError, ApiResult};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param { name: String, greedy: bool },
}

/// Parsed route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    template: String,
    segments: Vec<Vec<Part>>,
}

impl RouteTemplate {
    /// Parse a template, rejecting unterminated or empty placeholders
    pub fn parse(template: &str) -> ApiResult<Self> {
        let mut segments = Vec::new();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '/' => {
                    flush_literal(&mut literal, &mut parts);
                    segments.push(std::mem::take(&mut parts));
                }
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' => {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                    }
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(ApiError::invalid_route(template, "unterminated placeholder"));
                    }

                    let (name, greedy) = match name.strip_prefix('*') {
                        Some(rest) => (rest.trim().to_string(), true),
                        None => (name.trim().to_string(), false),
                    };
                    if name.is_empty() {
                        return Err(ApiError::invalid_route(template, "empty placeholder name"));
                    }

                    flush_literal(&mut literal, &mut parts);
                    parts.push(Part::Param { name, greedy });
                }
                other => literal.push(other),
            }
        }
        flush_literal(&mut literal, &mut parts);
        segments.push(parts);

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// Template text as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|part| match part {
            Part::Param { name, .. } => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Substitute route values, producing a path without leading slash.
    ///
    /// Values for names the template does not mention are ignored. A value
    /// that would resolve to a `.` or `..` path segment is rejected.
    pub fn resolve(&self, values: &RouteValues) -> ApiResult<String> {
        let mut resolved: Vec<String> = Vec::with_capacity(self.segments.len());

        'segments: for segment in &self.segments {
            let mut current = String::new();
            for part in segment {
                match part {
                    Part::Literal(text) => current.push_str(text),
                    Part::Param { name, greedy } => {
                        let Some(value) = values.get(name) else {
                            continue 'segments;
                        };
                        if *greedy {
                            current.push_str(&encode_greedy(value));
                        } else {
                            current.push_str(&urlencoding::encode(value));
                        }
                    }
                }
            }
            if current.split('/').any(is_dot_segment) {
                return Err(ApiError::invalid_route(
                    &self.template,
                    format!("route values resolve to a dot segment in `{current}`"),
                ));
            }
            if !current.is_empty() {
                resolved.push(current);
            }
        }

        Ok(resolved.join("/"))
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn flush_literal(literal: &mut String, parts: &mut Vec<Part>) {
    if !literal.is_empty() {
        parts.push(Part::Literal(std::mem::take(literal)));
    }
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

/// Encode each path segment of a greedy value, keeping the separators
fn encode_greedy(value: &str) -> String {
    value
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Values substituted into a route template, keyed by placeholder name.
///
/// Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: BTreeMap<String, String>,
}

impl RouteValues {
    /// Create an empty set of route values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.values.insert(name.into(), value.to_string());
    }

    /// Set a value when present
    pub fn insert_opt<V: ToString>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    /// Builder-style [`RouteValues::insert`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a non-empty value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Check whether no values are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
