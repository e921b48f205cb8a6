//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one service area. Every method
//! builds a [`crate::RequestDescriptor`] and hands it to the client's
//! dispatcher; methods needing custom post-processing take the raw response.
//!
//! | Module | Area | Conventions exercised |
//! |--------|------|-----------------------|
//! | `git` | `_apis/git` | greedy item paths, HEAD-as-boolean, continuation paging, JSON query objects |
//! | `work_items` | `_apis/wit` | comma-joined ids, date query values, JSON patch bodies |
//! | `gallery` | `_apis/gallery` | colon-joined asset types, binary/SVG downloads, raw uploads |

pub mod gallery;
pub mod git;
pub mod work_items;

pub use gallery::GalleryApi;
pub use git::GitApi;
pub use work_items::WorkItemsApi;
