//! Typed REST client for DevOps services
//!
//! Every endpoint call goes through one dispatcher that turns a
//! [`RequestDescriptor`] into exactly one HTTP exchange.
//!
//! # Features
//!
//! - **Route templates**: optional placeholders drop out cleanly, greedy
//!   `{*path}` placeholders keep embedded `/`
//! - **Query encoding**: absent values are skipped, lists are joined with a
//!   call-site delimiter, objects are JSON-encoded
//! - **Content negotiation**: `Accept` pinned to an api-version, JSON by
//!   default or binary/text bodies on request
//! - **Raw responses**: take the undecoded response to read headers or map a
//!   status yourself
//! - **Continuation paging**: [`PagedList`] carries the
//!   `x-ms-continuationtoken` header for the next call
//!
//! There is no retry, caching or authentication flow. Credentials, if any,
//! go in [`ClientConfig::default_headers`].
//!
//! # Example
//!
//! ```rust,no_run
//! use devops_api_client::{ClientConfig, DevOpsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://dev.example.com/org")
//!         .with_default_header("Authorization", "Basic OnRva2Vu");
//!     let client = DevOpsClient::with_config(config)?;
//!
//!     let readme = client.git().item_text("web", "site", "docs/README.md").await?;
//!     println!("{readme}");
//!
//!     let refs = client.git().all_refs("web", "site", Some("heads")).await?;
//!     println!("{} branches", refs.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod content;
pub mod endpoints;
pub mod error;
pub mod paging;
pub mod query;
pub mod request;
pub mod response;
pub mod route;

pub use client::DevOpsClient;
pub use config::ClientConfig;
pub use content::ContentType;
pub use error::{ApiError, ApiResult, WrappedException};
pub use paging::{PagedList, CONTINUATION_TOKEN_HEADER};
pub use query::{QueryParams, QueryValue};
pub use request::{PreparedRequest, RequestBody, RequestDescriptor};
pub use response::{Decoded, Dispatched, RawResponse};
pub use route::{RouteTemplate, RouteValues};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::DevOpsClient;
    pub use crate::config::ClientConfig;
    pub use crate::content::ContentType;
    pub use crate::endpoints::{GalleryApi, GitApi, WorkItemsApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::paging::PagedList;
    pub use crate::query::{QueryParams, QueryValue, COLON, COMMA};
    pub use crate::request::RequestDescriptor;
    pub use crate::response::{Decoded, Dispatched, RawResponse};
}
