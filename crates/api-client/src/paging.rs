//! Continuation-token paging
//!
//! List endpoints that may return more items than fit in one response send
//! an opaque token in the `x-ms-continuationtoken` header. The caller echoes
//! it back verbatim as a query parameter on the next call; a response
//! without the header ends the sequence.

use crate::error::{ApiError, ApiResult};
use crate::response::{decode_json, RawResponse};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::ops::Deref;
use tracing::debug;

/// Response header carrying the continuation token
pub const CONTINUATION_TOKEN_HEADER: &str = "x-ms-continuationtoken";

/// Query parameter most list endpoints take the token back in
pub const CONTINUATION_TOKEN_PARAM: &str = "continuationToken";

/// Read the continuation token from response headers.
///
/// `HeaderMap` lookups are case-insensitive. An empty value counts as absent.
/// A value that is not visible ASCII is an error rather than the end of the
/// listing.
pub fn continuation_token(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let Some(value) = headers.get(CONTINUATION_TOKEN_HEADER) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .map_err(|e| ApiError::decode("continuation token", e))?;
    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// List body as the services send it: wrapped in `{"count", "value"}`, or a
/// bare array from older endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    /// `{"count": n, "value": [...]}`
    Wrapped {
        /// Number of items the server reports
        #[serde(default)]
        count: Option<usize>,
        /// Items
        value: Vec<T>,
    },
    /// `[...]`
    Bare(Vec<T>),
}

impl<T> Collection<T> {
    /// Unwrap the items
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Wrapped { value, .. } | Self::Bare(value) => value,
        }
    }
}

/// One page of a listing plus the token for the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedList<T> {
    items: Vec<T>,
    continuation_token: Option<String>,
}

impl<T> PagedList<T> {
    /// Create a page
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        Self {
            items,
            continuation_token,
        }
    }

    /// Items on this page
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Token to pass back for the next page
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    /// Whether another page follows
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Take the items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Split into items and token
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.continuation_token)
    }
}

impl<T: DeserializeOwned> PagedList<T> {
    /// Decode a raw list response and attach its continuation token.
    ///
    /// The header is read before the body is consumed.
    pub async fn from_response(response: RawResponse) -> ApiResult<Self> {
        let token = response.continuation_token()?;
        let body = response.bytes().await?;
        let collection: Collection<T> = decode_json(&body)?;
        Ok(Self::new(collection.into_items(), token))
    }
}

impl<T> Deref for PagedList<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T> IntoIterator for PagedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Follow a continuation chain to the end, collecting every item.
///
/// `fetch` receives `None` for the first page and the previous page's token
/// afterwards. Errors stop the walk and are returned as-is. A token repeated
/// by the server is an error.
pub async fn collect_all<T, F, Fut>(mut fetch: F) -> ApiResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<PagedList<T>>>,
{
    let mut all = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        let page = fetch(token.clone()).await?;
        pages += 1;
        let (items, next) = page.into_parts();
        all.extend(items);

        match next {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(ApiError::decode(
                    "continuation token",
                    format!("server repeated token `{next}` after {pages} pages"),
                ));
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!(pages, items = all.len(), "Continuation chain exhausted");
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    #[test]
    fn test_continuation_token_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(continuation_token(&headers).unwrap(), None);

        headers.insert(
            HeaderName::from_bytes(b"X-MS-ContinuationToken").unwrap(),
            HeaderValue::from_static("abc=="),
        );
        assert_eq!(continuation_token(&headers).unwrap(), Some("abc==".to_string()));

        headers.insert(CONTINUATION_TOKEN_HEADER, HeaderValue::from_static(""));
        assert_eq!(continuation_token(&headers).unwrap(), None);
    }

    #[test]
    fn test_non_ascii_token_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTINUATION_TOKEN_HEADER,
            HeaderValue::from_bytes("tök".as_bytes()).unwrap(),
        );

        let err = continuation_token(&headers).unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref expected, .. } if expected == "continuation token"));
    }

    #[tokio::test]
    async fn test_collect_all_stops_on_repeated_token() {
        let mut calls = 0;
        let result = collect_all(|_token| {
            calls += 1;
            async { Ok(PagedList::new(vec![0], Some("same".to_string()))) }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Decode { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_collection_shapes() {
        let wrapped: Collection<i32> = serde_json::from_str(r#"{"count":2,"value":[1,2]}"#).unwrap();
        assert_eq!(wrapped.into_items(), vec![1, 2]);

        let bare: Collection<i32> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_items(), vec![3]);
    }

    #[test]
    fn test_paged_list_accessors() {
        let page = PagedList::new(vec!["a", "b"], Some("t1".to_string()));
        assert_eq!(page.len(), 2);
        assert_eq!(page[0], "a");
        assert!(page.has_more());
        assert_eq!(page.continuation_token(), Some("t1"));

        let last = PagedList::new(vec!["c"], None);
        assert!(!last.has_more());
        assert_eq!(last.into_iter().collect::<Vec<_>>(), vec!["c"]);
    }
}
