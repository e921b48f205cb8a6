//! Response content types and `Accept` header negotiation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type a request expects back from the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    /// `application/json`
    #[default]
    Json,
    /// `application/octet-stream`
    OctetStream,
    /// `application/zip`
    Zip,
    /// `text/plain`
    Text,
    /// `image/svg+xml`
    Svg,
    /// `application/xaml+xml`
    Xaml,
}

/// How a response body of a given content type is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Parsed as JSON
    Json,
    /// Kept as bytes
    Binary,
    /// Read as UTF-8 text
    Text,
}

impl ContentType {
    /// MIME type
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Zip => "application/zip",
            Self::Text => "text/plain",
            Self::Svg => "image/svg+xml",
            Self::Xaml => "application/xaml+xml",
        }
    }

    /// Decoding applied to bodies of this type
    #[must_use]
    pub fn body_kind(self) -> BodyKind {
        match self {
            Self::Json => BodyKind::Json,
            Self::OctetStream | Self::Zip => BodyKind::Binary,
            Self::Text | Self::Svg | Self::Xaml => BodyKind::Text,
        }
    }

    /// `Accept` header value pinned to an api-version
    #[must_use]
    pub fn accept_header(self, api_version: &str) -> String {
        if api_version.is_empty() {
            self.mime().to_string()
        } else {
            format!("{};api-version={api_version}", self.mime())
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_header_carries_api_version() {
        assert_eq!(
            ContentType::Json.accept_header("7.1-preview.1"),
            "application/json;api-version=7.1-preview.1"
        );
        assert_eq!(
            ContentType::Zip.accept_header("7.1"),
            "application/zip;api-version=7.1"
        );
        assert_eq!(ContentType::Text.accept_header(""), "text/plain");
    }

    #[test]
    fn test_body_kinds() {
        assert_eq!(ContentType::default().body_kind(), BodyKind::Json);
        assert_eq!(ContentType::OctetStream.body_kind(), BodyKind::Binary);
        assert_eq!(ContentType::Zip.body_kind(), BodyKind::Binary);
        assert_eq!(ContentType::Svg.body_kind(), BodyKind::Text);
        assert_eq!(ContentType::Xaml.body_kind(), BodyKind::Text);
    }
}
