//! Extension gallery endpoints

use crate::client::DevOpsClient;
use crate::content::ContentType;
use crate::error::ApiResult;
use crate::query::COLON;
use crate::request::RequestDescriptor;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const EXTENSIONS_ROUTE: &str = "_apis/gallery/publishers/{publisherName}/extensions/{extensionName}";
const ASSETS_ROUTE: &str =
    "_apis/gallery/publishers/{publisherName}/extensions/{extensionName}/{version}/assets/{assetType}";

/// Asset type of an extension's default icon
pub const ICON_ASSET: &str = "Microsoft.VisualStudio.Services.Icons.Default";

/// Gallery API interface
#[derive(Clone)]
pub struct GalleryApi {
    client: DevOpsClient,
}

impl GalleryApi {
    /// Create a new gallery API interface
    pub(crate) fn new(client: DevOpsClient) -> Self {
        Self { client }
    }

    /// Get extension metadata, optionally restricted to some asset types
    ///
    /// GET _apis/gallery/publishers/{publisherName}/extensions/{extensionName}
    pub async fn extension(
        &self,
        publisher_name: &str,
        extension_name: &str,
        version: Option<&str>,
        asset_types: &[&str],
    ) -> ApiResult<PublishedExtension> {
        let mut descriptor = RequestDescriptor::get(EXTENSIONS_ROUTE)
            .route_value("publisherName", publisher_name)
            .route_value("extensionName", extension_name)
            .query_param_opt("version", version)
            .api_version("7.1-preview.2");
        descriptor.query.insert_list("assetTypes", asset_types, COLON);
        self.client.dispatch_json(descriptor).await
    }

    /// Download an asset as bytes
    ///
    /// GET _apis/gallery/publishers/{publisherName}/extensions/{extensionName}/{version}/assets/{assetType}
    pub async fn asset(
        &self,
        publisher_name: &str,
        extension_name: &str,
        version: &str,
        asset_type: &str,
    ) -> ApiResult<Bytes> {
        let descriptor = Self::asset_request(publisher_name, extension_name, version, asset_type)
            .accept(ContentType::OctetStream);
        self.client.dispatch_bytes(descriptor).await
    }

    /// Download the default icon as SVG markup
    pub async fn icon_svg(
        &self,
        publisher_name: &str,
        extension_name: &str,
        version: &str,
    ) -> ApiResult<String> {
        let descriptor = Self::asset_request(publisher_name, extension_name, version, ICON_ASSET)
            .accept(ContentType::Svg);
        self.client.dispatch_text(descriptor).await
    }

    fn asset_request(
        publisher_name: &str,
        extension_name: &str,
        version: &str,
        asset_type: &str,
    ) -> RequestDescriptor {
        RequestDescriptor::get(ASSETS_ROUTE)
            .route_value("publisherName", publisher_name)
            .route_value("extensionName", extension_name)
            .route_value("version", version)
            .route_value("assetType", asset_type)
            .api_version("7.1-preview.1")
    }

    /// Publish a new extension package (`.vsix`)
    ///
    /// POST _apis/gallery/publishers/{publisherName}/extensions
    pub async fn upload_extension(
        &self,
        publisher_name: &str,
        package: impl Into<Bytes>,
    ) -> ApiResult<PublishedExtension> {
        let descriptor = RequestDescriptor::post(EXTENSIONS_ROUTE)
            .route_value("publisherName", publisher_name)
            .raw_body(package, ContentType::OctetStream.mime())
            .api_version("7.1-preview.2");
        self.client.dispatch_json(descriptor).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Extension as listed in the gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedExtension {
    /// Extension id
    pub extension_id: Uuid,
    /// Extension name within the publisher
    pub extension_name: String,
    /// Name shown in the gallery
    pub display_name: Option<String>,
    /// One-line description
    pub short_description: Option<String>,
    /// Publisher summary
    pub publisher: PublisherFacts,
    /// Published versions, newest first
    #[serde(default)]
    pub versions: Vec<ExtensionVersion>,
    /// Last publish time
    pub last_updated: Option<DateTime<Utc>>,
    /// Comma-separated gallery flags
    pub flags: Option<String>,
}

/// Publisher summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherFacts {
    /// Publisher id
    pub publisher_id: Uuid,
    /// Publisher name
    pub publisher_name: String,
    /// Name shown in the gallery
    pub display_name: Option<String>,
}

/// One published version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionVersion {
    /// Version string
    pub version: String,
    /// When this version was published
    pub last_updated: Option<DateTime<Utc>>,
    /// Asset files of this version
    #[serde(default)]
    pub files: Vec<ExtensionFile>,
}

/// Asset file of a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFile {
    /// Asset type, e.g. [`ICON_ASSET`]
    pub asset_type: String,
    /// Download URL
    pub source: Option<String>,
}
