//! Configuration for the DevOps API client
//!
//! Configuration is explicit: build a [`ClientConfig`] and hand it to the
//! client. Nothing is read from process-wide state after construction.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

/// api-version negotiated when a request does not pin its own
pub const DEFAULT_API_VERSION: &str = "7.1";

/// User agent sent with every request
const DEFAULT_USER_AGENT: &str = concat!("devops-api-client/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Collection or organization URL, e.g. `https://dev.example.com/org`
    pub base_url: String,
    /// Default api-version token used in the `Accept` header
    pub api_version: String,
    /// User agent header value
    pub user_agent: String,
    /// Transport timeout. `None` leaves it to the HTTP client.
    #[serde(default, with = "optional_secs")]
    pub timeout: Option<Duration>,
    /// Headers sent with every request, overridable per call
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        duration.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl ClientConfig {
    /// Create configuration for a base URL with defaults for everything else
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            default_headers: BTreeMap::new(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `DEVOPS_API_URL`: Base URL (required)
    /// - `DEVOPS_API_VERSION`: Default api-version token
    /// - `DEVOPS_TIMEOUT_SECS`: Transport timeout in seconds
    /// - `DEVOPS_USER_AGENT`: User agent override
    pub fn from_env() -> ApiResult<Self> {
        let base_url =
            env::var("DEVOPS_API_URL").map_err(|_| ApiError::missing_env("DEVOPS_API_URL"))?;

        let mut config = Self::new(base_url);

        if let Ok(version) = env::var("DEVOPS_API_VERSION") {
            config.api_version = version;
        }

        if let Ok(agent) = env::var("DEVOPS_USER_AGENT") {
            config.user_agent = agent;
        }

        if let Ok(raw) = env::var("DEVOPS_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::config(format!("DEVOPS_TIMEOUT_SECS is not a number: {raw}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Builder-style method to set the default api-version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Builder-style method to set the transport timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style method to add a header sent with every request
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Base URL without trailing slashes
    #[must_use]
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        if self.base_url.contains('?') || self.base_url.contains('#') {
            return Err(ApiError::config("base_url cannot carry a query or fragment"));
        }

        if self.api_version.trim().is_empty() {
            return Err(ApiError::config("api_version cannot be empty"));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_defaults() {
        let config = ClientConfig::new("https://dev.example.com/org");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(config.user_agent.starts_with("devops-api-client/"));
        assert!(config.timeout.is_none());
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::new("https://dev.example.com/org/")
            .with_api_version("7.1-preview.1")
            .with_timeout(Duration::from_secs(60))
            .with_default_header("Authorization", "Basic abc");

        assert_eq!(config.trimmed_base_url(), "https://dev.example.com/org");
        assert_eq!(config.api_version, "7.1-preview.1");
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(
            config.default_headers.get("Authorization").map(String::as_str),
            Some("Basic abc")
        );
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::new("https://dev.example.com/org").validate().is_ok());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://dev.example.com").validate().is_err());
        assert!(ClientConfig::new("https://dev.example.com/?a=b").validate().is_err());
        assert!(ClientConfig::new("https://dev.example.com")
            .with_api_version(" ")
            .validate()
            .is_err());
        assert!(ClientConfig::new("https://dev.example.com")
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_timeout_serializes_as_seconds() {
        let config = ClientConfig::new("https://dev.example.com").with_timeout(Duration::from_secs(45));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 45);

        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Some(Duration::from_secs(45)));
    }
}
