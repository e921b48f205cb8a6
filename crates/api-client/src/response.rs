//! Dispatch results: raw responses and decoded bodies

use crate::content::{BodyKind, ContentType};
use crate::error::{ApiError, ApiResult};
use crate::paging;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Outcome of [`crate::DevOpsClient::dispatch`]: exactly one of the two
/// shapes, chosen by the descriptor's `raw_response` flag.
#[derive(Debug)]
pub enum Dispatched {
    /// Undecoded response, for callers doing their own post-processing
    Raw(RawResponse),
    /// Body decoded according to the expected content type
    Decoded(Decoded),
}

/// Successful response whose body has not been read yet
#[derive(Debug)]
pub struct RawResponse {
    inner: Response,
    request_id: String,
}

impl RawResponse {
    pub(crate) fn new(inner: Response, request_id: String) -> Self {
        Self { inner, request_id }
    }

    /// HTTP status
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Header value as text, looked up case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Continuation token for the next page, if the server sent one
    pub fn continuation_token(&self) -> ApiResult<Option<String>> {
        paging::continuation_token(self.inner.headers())
    }

    /// Correlation id sent with the request
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Final URL of the response
    #[must_use]
    pub fn url(&self) -> &str {
        self.inner.url().as_str()
    }

    /// Read the whole body
    pub async fn bytes(self) -> ApiResult<Bytes> {
        Ok(self.inner.bytes().await?)
    }

    /// Read the body as UTF-8 text
    pub async fn text(self) -> ApiResult<String> {
        let body = self.bytes().await?;
        String::from_utf8(body.to_vec()).map_err(|e| ApiError::decode("UTF-8 text", e))
    }

    /// Read the body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let body = self.bytes().await?;
        decode_json(&body)
    }

    /// Read the body according to an expected content type
    pub async fn decode(self, accept: ContentType) -> ApiResult<Decoded> {
        match accept.body_kind() {
            BodyKind::Json => Ok(Decoded::Json(self.json().await?)),
            BodyKind::Binary => Ok(Decoded::Binary(self.bytes().await?)),
            BodyKind::Text => Ok(Decoded::Text(self.text().await?)),
        }
    }

    /// Underlying `reqwest` response, for streaming bodies
    #[must_use]
    pub fn into_inner(self) -> Response {
        self.inner
    }
}

/// Decode a JSON body. An empty body decodes as `null`.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(serde_json::Value::Null)
            .map_err(|e| ApiError::decode("JSON", e));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::decode("JSON", e))
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// JSON document
    Json(serde_json::Value),
    /// Binary payload (octet-stream, zip)
    Binary(Bytes),
    /// Text payload (plain text, svg, xaml)
    Text(String),
}

impl Decoded {
    /// Convert a JSON body into a typed value
    pub fn into_json<T: DeserializeOwned>(self) -> ApiResult<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value).map_err(|e| ApiError::decode("JSON", e)),
            other => Err(ApiError::decode("JSON", format!("response was {}", other.kind_name()))),
        }
    }

    /// Take a binary body
    pub fn into_bytes(self) -> ApiResult<Bytes> {
        match self {
            Self::Binary(bytes) => Ok(bytes),
            other => Err(ApiError::decode("binary", format!("response was {}", other.kind_name()))),
        }
    }

    /// Take a text body
    pub fn into_text(self) -> ApiResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(ApiError::decode("text", format!("response was {}", other.kind_name()))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Json(_) => "JSON",
            Self::Binary(_) => "binary",
            Self::Text(_) => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json_empty_body_is_null() {
        decode_json::<()>(b"").unwrap();
        let value: Option<i32> = decode_json(b"  \n").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_decode_json_invalid_is_decode_error() {
        let err = decode_json::<serde_json::Value>(b"<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_decoded_conversions() {
        let decoded = Decoded::Json(json!({"id": 3}));
        let value: serde_json::Value = decoded.into_json().unwrap();
        assert_eq!(value["id"], 3);

        assert_eq!(
            Decoded::Binary(Bytes::from_static(b"PK")).into_bytes().unwrap(),
            Bytes::from_static(b"PK")
        );
        assert_eq!(Decoded::Text("hi".into()).into_text().unwrap(), "hi");
    }

    #[test]
    fn test_decoded_shape_mismatch() {
        let err = Decoded::Text("hi".into()).into_json::<i32>().unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert!(Decoded::Json(json!(1)).into_text().is_err());
        assert!(Decoded::Text("x".into()).into_bytes().is_err());
    }
}
