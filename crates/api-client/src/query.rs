//! Query parameters
//!
//! Values are restricted to primitives, lists of primitives joined with a
//! call-site delimiter, timestamps, and opaque JSON objects. Absent values are
//! skipped entirely; they never encode as an empty or `undefined` value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;

use crate::error::ApiResult;

/// Delimiter for most multi-value filters
pub const COMMA: char = ',';

/// Delimiter for asset-type filters
pub const COLON: char = ':';

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value, encoded as `true`/`false`
    Bool(bool),
    /// Timestamp, encoded as RFC 3339 in UTC
    DateTime(DateTime<Utc>),
    /// List of primitives joined with `delimiter` before encoding.
    /// An empty list is omitted like an absent value.
    List {
        /// Encoded items
        items: Vec<String>,
        /// Join delimiter
        delimiter: char,
    },
    /// Structured value, JSON-encoded
    Json(serde_json::Value),
}

impl QueryValue {
    /// Build a list value from anything displayable
    pub fn list<I, T>(items: I, delimiter: char) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::List {
            items: items.into_iter().map(|i| i.to_string()).collect(),
            delimiter,
        }
    }

    /// Build a JSON value from any serializable object
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Unencoded text form, or `None` when the value should be omitted
    #[must_use]
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::DateTime(dt) => Some(Cow::Owned(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
            Self::List { items, .. } if items.is_empty() => None,
            Self::List { items, delimiter } => {
                Some(Cow::Owned(items.join(delimiter.to_string().as_str())))
            }
            Self::Json(serde_json::Value::Null) => None,
            Self::Json(serde_json::Value::String(s)) => Some(Cow::Borrowed(s.as_str())),
            Self::Json(value) => Some(Cow::Owned(value.to_string())),
        }
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<uuid::Uuid> for QueryValue {
    fn from(value: uuid::Uuid) -> Self {
        Self::String(value.to_string())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for QueryValue {
                fn from(value: $t) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Ordered query parameters.
///
/// Insertion order is kept so encoded URLs are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Set a parameter when present. `None` leaves the key out.
    pub fn insert_opt<V: Into<QueryValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Set a delimited list parameter
    pub fn insert_list<I, T>(&mut self, key: impl Into<String>, items: I, delimiter: char)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.insert(key, QueryValue::list(items, delimiter));
    }

    /// Builder-style [`QueryParams::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style [`QueryParams::insert_opt`]
    #[must_use]
    pub fn with_opt<V: Into<QueryValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Look up a raw value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Check whether no parameters are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Percent-encoded query string without the leading `?`
    #[must_use]
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .filter_map(|(key, value)| {
                value.to_text().map(|text| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(&text))
                })
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
