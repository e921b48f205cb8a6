//! Main API client implementation

use crate::config::ClientConfig;
use crate::content::ContentType;
use crate::endpoints::{GalleryApi, GitApi, WorkItemsApi};
use crate::error::{ApiError, ApiResult};
use crate::paging::Collection;
use crate::request::{PreparedRequest, RequestDescriptor};
use crate::response::{Decoded, Dispatched, RawResponse};
use bytes::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn, Span};

/// DevOps REST client
///
/// Every endpoint method funnels through [`DevOpsClient::dispatch`]: one
/// descriptor, one HTTP exchange, one result. The client holds no mutable
/// state, so clones can issue calls concurrently. There is no retry; a
/// failed exchange is returned to the caller as-is.
#[derive(Clone)]
pub struct DevOpsClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl DevOpsClient {
    /// Create a new client with configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build()?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Create a client around an existing `reqwest` client
    pub fn with_http_client(inner: Client, config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.config.trimmed_base_url()
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access Git endpoints
    #[must_use]
    pub fn git(&self) -> GitApi {
        GitApi::new(self.clone())
    }

    /// Access work item tracking endpoints
    #[must_use]
    pub fn work_items(&self) -> WorkItemsApi {
        WorkItemsApi::new(self.clone())
    }

    /// Access extension gallery endpoints
    #[must_use]
    pub fn gallery(&self) -> GalleryApi {
        GalleryApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Issue one request and return either the raw response or the decoded
    /// body, as selected by `descriptor.raw_response`.
    #[instrument(
        skip(self, descriptor),
        fields(method = %descriptor.method, route = %descriptor.route, request_id)
    )]
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> ApiResult<Dispatched> {
        let accept = descriptor.accept;
        let raw = descriptor.raw_response;
        let response = self.send(&descriptor).await?;

        if raw {
            Ok(Dispatched::Raw(response))
        } else {
            Ok(Dispatched::Decoded(response.decode(accept).await?))
        }
    }

    /// Issue one request and return the undecoded response.
    ///
    /// The caller reads status, headers and body itself, e.g. with
    /// [`RawResponse::json`] or [`crate::PagedList::from_response`].
    #[instrument(
        skip(self, descriptor),
        fields(method = %descriptor.method, route = %descriptor.route, request_id)
    )]
    pub async fn dispatch_raw(&self, descriptor: RequestDescriptor) -> ApiResult<RawResponse> {
        self.send(&descriptor).await
    }

    /// Issue one request and decode a JSON body
    pub async fn dispatch_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> ApiResult<T> {
        expect_decoded(self.dispatch(descriptor.parsed(ContentType::Json)).await?)?.into_json()
    }

    /// Issue one request and decode a `{"count", "value"}` list body
    pub async fn dispatch_collection<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<Vec<T>> {
        let collection: Collection<T> = self.dispatch_json(descriptor).await?;
        Ok(collection.into_items())
    }

    /// Issue one request and return a binary body
    pub async fn dispatch_bytes(&self, descriptor: RequestDescriptor) -> ApiResult<Bytes> {
        let accept = match descriptor.accept {
            ContentType::Zip => ContentType::Zip,
            _ => ContentType::OctetStream,
        };
        expect_decoded(self.dispatch(descriptor.parsed(accept)).await?)?.into_bytes()
    }

    /// Issue one request and return a text body
    pub async fn dispatch_text(&self, descriptor: RequestDescriptor) -> ApiResult<String> {
        let accept = match descriptor.accept {
            ContentType::Svg => ContentType::Svg,
            ContentType::Xaml => ContentType::Xaml,
            _ => ContentType::Text,
        };
        expect_decoded(self.dispatch(descriptor.parsed(accept)).await?)?.into_text()
    }

    /// Perform the HTTP exchange and reject non-2xx statuses
    async fn send(&self, descriptor: &RequestDescriptor) -> ApiResult<RawResponse> {
        let prepared = descriptor.prepare(&self.config)?;
        Span::current().record("request_id", prepared.request_id.as_str());

        let PreparedRequest {
            method,
            url,
            headers,
            body,
            request_id,
        } = prepared;

        debug!(url = %url, "Sending request");

        let mut request = self.inner.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let elapsed = start.elapsed();

        if status.is_success() {
            debug!(
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis(),
                "Request succeeded"
            );
            return Ok(RawResponse::new(response, request_id));
        }

        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), status_text, &body);

        warn!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis(),
            error = %error,
            "Request failed"
        );
        Err(error)
    }
}

impl RequestDescriptor {
    /// Same descriptor, decoded as `accept`
    fn parsed(mut self, accept: ContentType) -> Self {
        self.accept = accept;
        self.raw_response = false;
        self
    }
}

fn expect_decoded(dispatched: Dispatched) -> ApiResult<Decoded> {
    match dispatched {
        Dispatched::Decoded(decoded) => Ok(decoded),
        Dispatched::Raw(_) => Err(ApiError::decode("decoded body", "raw response returned")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::new("https://dev.example.com/org").with_timeout(Duration::from_secs(5));
        let client = DevOpsClient::with_config(config).unwrap();
        assert_eq!(client.base_url(), "https://dev.example.com/org");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = DevOpsClient::with_config(ClientConfig::new("not-a-url"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_parsed_overrides_raw_flag() {
        let descriptor = RequestDescriptor::get("_apis").raw_response().parsed(ContentType::Text);
        assert!(!descriptor.raw_response);
        assert_eq!(descriptor.accept, ContentType::Text);
    }
}
