//! Request descriptors
//!
//! A [`RequestDescriptor`] says everything about one call: method, route
//! template and values, query, extra headers, body, negotiated api-version,
//! expected content type, and whether the caller wants the raw response.
//! [`RequestDescriptor::prepare`] turns it into a [`PreparedRequest`] without
//! touching the network.

use crate::config::ClientConfig;
use crate::content::ContentType;
use crate::error::{ApiError, ApiResult};
use crate::query::{QueryParams, QueryValue};
use crate::route::{RouteTemplate, RouteValues};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Request correlation ID header
pub const X_REQUEST_ID: &str = "X-Request-ID";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document
    Json(Bytes),
    /// RFC 6902 JSON patch document
    JsonPatch(Bytes),
    /// Bytes sent unmodified
    Raw {
        /// Payload
        data: Bytes,
        /// `Content-Type` to send
        content_type: String,
    },
}

impl RequestBody {
    /// `Content-Type` header value for this body
    #[must_use]
    pub fn content_type(&self) -> &str {
        match self {
            Self::Json(_) => JSON_CONTENT_TYPE,
            Self::JsonPatch(_) => JSON_PATCH_CONTENT_TYPE,
            Self::Raw { content_type, .. } => content_type,
        }
    }

    /// Encoded payload
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Json(data) | Self::JsonPatch(data) | Self::Raw { data, .. } => data,
        }
    }
}

/// Everything needed to issue one REST call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Route template, e.g. `{project}/_apis/wit/workitems/{id}`
    pub route: String,
    /// Values for the route template
    pub route_values: RouteValues,
    /// Query parameters
    pub query: QueryParams,
    /// Extra headers. `None` entries are dropped and never override defaults.
    pub headers: BTreeMap<String, Option<String>>,
    /// Request payload
    pub body: Option<RequestBody>,
    /// api-version for this call, `None` for the client default
    pub api_version: Option<String>,
    /// Expected response content type
    pub accept: ContentType,
    /// Return the undecoded response instead of a parsed value
    pub raw_response: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for a method and route template
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            method,
            route: route.into(),
            route_values: RouteValues::new(),
            query: QueryParams::new(),
            headers: BTreeMap::new(),
            body: None,
            api_version: None,
            accept: ContentType::Json,
            raw_response: false,
        }
    }

    /// GET descriptor
    pub fn get(route: impl Into<String>) -> Self {
        Self::new(Method::GET, route)
    }

    /// POST descriptor
    pub fn post(route: impl Into<String>) -> Self {
        Self::new(Method::POST, route)
    }

    /// PUT descriptor
    pub fn put(route: impl Into<String>) -> Self {
        Self::new(Method::PUT, route)
    }

    /// PATCH descriptor
    pub fn patch(route: impl Into<String>) -> Self {
        Self::new(Method::PATCH, route)
    }

    /// DELETE descriptor
    pub fn delete(route: impl Into<String>) -> Self {
        Self::new(Method::DELETE, route)
    }

    /// HEAD descriptor
    pub fn head(route: impl Into<String>) -> Self {
        Self::new(Method::HEAD, route)
    }

    /// Set a route value
    #[must_use]
    pub fn route_value(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.route_values.insert(name, value);
        self
    }

    /// Set a route value when present
    #[must_use]
    pub fn route_value_opt<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.route_values.insert_opt(name, value);
        self
    }

    /// Replace all query parameters
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set a query parameter
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Set a query parameter when present
    #[must_use]
    pub fn query_param_opt<V: Into<QueryValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.query.insert_opt(key, value);
        self
    }

    /// Add a header, overriding defaults of the same name
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Add a header when present. `None` keeps the default.
    #[must_use]
    pub fn header_opt(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.headers.insert(name.into(), value);
        self
    }

    /// Serialize `body` as JSON
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(RequestBody::Json(Bytes::from(serde_json::to_vec(body)?)));
        Ok(self)
    }

    /// Serialize `body` as a JSON patch document
    pub fn json_patch<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(RequestBody::JsonPatch(Bytes::from(serde_json::to_vec(body)?)));
        Ok(self)
    }

    /// Send `data` unmodified with the given content type
    #[must_use]
    pub fn raw_body(mut self, data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw {
            data: data.into(),
            content_type: content_type.into(),
        });
        self
    }

    /// Pin the api-version for this call
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Expect a non-JSON response
    #[must_use]
    pub fn accept(mut self, content_type: ContentType) -> Self {
        self.accept = content_type;
        self
    }

    /// Ask for the raw response object
    #[must_use]
    pub fn raw_response(mut self) -> Self {
        self.raw_response = true;
        self
    }

    /// Resolve URL, headers and body against a client configuration
    pub fn prepare(&self, config: &ClientConfig) -> ApiResult<PreparedRequest> {
        let template = RouteTemplate::parse(&self.route)?;
        let path = template.resolve(&self.route_values)?;

        let mut url = config.trimmed_base_url().to_string();
        if !path.is_empty() {
            url.push('/');
            url.push_str(&path);
        }
        let query = self.query.encode();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let api_version = self.api_version.as_deref().unwrap_or(&config.api_version);
        let request_id = Uuid::new_v4().to_string();

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, ACCEPT.as_str(), &self.accept.accept_header(api_version))?;
        insert_header(&mut headers, USER_AGENT.as_str(), &config.user_agent)?;
        insert_header(&mut headers, X_REQUEST_ID, &request_id)?;
        if let Some(body) = &self.body {
            insert_header(&mut headers, CONTENT_TYPE.as_str(), body.content_type())?;
        }
        for (name, value) in &config.default_headers {
            insert_header(&mut headers, name, value)?;
        }
        for (name, value) in &self.headers {
            if let Some(value) = value {
                insert_header(&mut headers, name, value)?;
            }
        }

        Ok(PreparedRequest {
            method: self.method.clone(),
            url,
            headers,
            body: self.body.as_ref().map(|b| b.bytes().clone()),
            request_id,
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> ApiResult<()> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// A fully resolved HTTP request described as plain data
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: String,
    /// Final headers
    pub headers: HeaderMap,
    /// Encoded body
    pub body: Option<Bytes>,
    /// Correlation id carried in `X-Request-ID`
    pub request_id: String,
}

impl PreparedRequest {
    /// Header value as text
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::COMMA;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new("https://dev.example.com/org/").with_api_version("7.1")
    }

    #[test]
    fn test_prepare_resolves_url() {
        let mut query = QueryParams::new();
        query.insert_list("ids", [1, 2, 3], COMMA);
        query.insert_opt("asOf", Option::<&str>::None);

        let prepared = RequestDescriptor::get("{project}/_apis/wit/workitems/{id}")
            .route_value("project", "p")
            .query(query)
            .prepare(&config())
            .unwrap();

        assert_eq!(prepared.method, Method::GET);
        assert_eq!(
            prepared.url,
            "https://dev.example.com/org/p/_apis/wit/workitems?ids=1%2C2%2C3"
        );
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_prepare_without_path_or_query() {
        let prepared = RequestDescriptor::get("{project}").prepare(&config()).unwrap();
        assert_eq!(prepared.url, "https://dev.example.com/org");
    }

    #[test]
    fn test_default_headers() {
        let prepared = RequestDescriptor::get("_apis/projects").prepare(&config()).unwrap();
        assert_eq!(prepared.header("accept"), Some("application/json;api-version=7.1"));
        assert!(prepared.header("user-agent").unwrap().starts_with("devops-api-client/"));
        assert_eq!(prepared.header(X_REQUEST_ID), Some(prepared.request_id.as_str()));
        assert!(prepared.header("content-type").is_none());
    }

    #[test]
    fn test_accept_follows_content_type_and_version() {
        let prepared = RequestDescriptor::get("_apis/items")
            .accept(ContentType::Zip)
            .api_version("7.1-preview.1")
            .prepare(&config())
            .unwrap();
        assert_eq!(
            prepared.header("accept"),
            Some("application/zip;api-version=7.1-preview.1")
        );
    }

    #[test]
    fn test_custom_headers_override_and_none_is_dropped() {
        let config = config().with_default_header("X-Team", "core");
        let prepared = RequestDescriptor::get("_apis/items")
            .header("Accept", "text/html")
            .header_opt("X-Team", None)
            .header_opt("X-Absent", None)
            .prepare(&config)
            .unwrap();

        assert_eq!(prepared.header("accept"), Some("text/html"));
        assert_eq!(prepared.header("x-team"), Some("core"));
        assert!(prepared.header("x-absent").is_none());
    }

    #[test]
    fn test_json_body() {
        let prepared = RequestDescriptor::post("_apis/things")
            .json(&json!({"name": "a"}))
            .unwrap()
            .prepare(&config())
            .unwrap();
        assert_eq!(prepared.header("content-type"), Some(JSON_CONTENT_TYPE));
        let body: serde_json::Value = serde_json::from_slice(prepared.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["name"], "a");
    }

    #[test]
    fn test_json_patch_body() {
        let ops = json!([{"op": "add", "path": "/fields/System.Title", "value": "t"}]);
        let prepared = RequestDescriptor::patch("_apis/wit/workitems/1")
            .json_patch(&ops)
            .unwrap()
            .prepare(&config())
            .unwrap();
        assert_eq!(prepared.header("content-type"), Some(JSON_PATCH_CONTENT_TYPE));
    }

    #[test]
    fn test_raw_body_passes_through() {
        let data: &'static [u8] = &[0x50, 0x4b, 0x03, 0x04, 0xff];
        let prepared = RequestDescriptor::put("_apis/upload")
            .raw_body(data, "application/octet-stream")
            .prepare(&config())
            .unwrap();
        assert_eq!(prepared.header("content-type"), Some("application/octet-stream"));
        assert_eq!(prepared.body.as_deref(), Some(data));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestDescriptor::get("_apis")
            .header("X-Bad", "line\nbreak")
            .prepare(&config());
        assert!(matches!(result, Err(ApiError::InvalidHeader(name)) if name == "X-Bad"));
    }

    #[test]
    fn test_invalid_route_rejected() {
        let result = RequestDescriptor::get("{project/_apis").prepare(&config());
        assert!(matches!(result, Err(ApiError::InvalidRoute { .. })));
    }

    #[test]
    fn test_parent_segment_value_rejected() {
        let result = RequestDescriptor::get("{project}/_apis/git/repositories/{repositoryId}")
            .route_value("project", "p")
            .route_value("repositoryId", "..")
            .prepare(&config());
        assert!(matches!(result, Err(ApiError::InvalidRoute { .. })));

        let result = RequestDescriptor::get("{project}/_apis/git/items/{*path}")
            .route_value("project", "p")
            .route_value("path", "../../../../../x")
            .prepare(&config());
        assert!(matches!(result, Err(ApiError::InvalidRoute { .. })));
    }
}
