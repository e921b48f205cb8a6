//! Git endpoints
//!
//! Repositories, items, refs and pull requests under
//! `{project}/_apis/git/repositories`.

use crate::client::DevOpsClient;
use crate::content::ContentType;
use crate::error::ApiResult;
use crate::paging::{self, PagedList, CONTINUATION_TOKEN_PARAM};
use crate::query::QueryValue;
use crate::request::RequestDescriptor;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const REPOSITORIES_ROUTE: &str = "{project}/_apis/git/repositories/{repositoryId}";
const ITEMS_ROUTE: &str = "{project}/_apis/git/repositories/{repositoryId}/items/{*path}";
const REFS_ROUTE: &str = "{project}/_apis/git/repositories/{repositoryId}/refs/{*filter}";
const PULL_REQUESTS_ROUTE: &str =
    "{project}/_apis/git/repositories/{repositoryId}/pullrequests/{pullRequestId}";

/// Git API interface
#[derive(Clone)]
pub struct GitApi {
    client: DevOpsClient,
}

impl GitApi {
    /// Create a new Git API interface
    pub(crate) fn new(client: DevOpsClient) -> Self {
        Self { client }
    }

    /// List repositories, across the collection when `project` is `None`
    ///
    /// GET {project}/_apis/git/repositories
    pub async fn repositories(&self, project: Option<&str>) -> ApiResult<Vec<GitRepository>> {
        let descriptor = RequestDescriptor::get(REPOSITORIES_ROUTE).route_value_opt("project", project);
        self.client.dispatch_collection(descriptor).await
    }

    /// Get one repository by name or id
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}
    pub async fn repository(&self, project: &str, repository_id: &str) -> ApiResult<GitRepository> {
        let descriptor = RequestDescriptor::get(REPOSITORIES_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id);
        self.client.dispatch_json(descriptor).await
    }

    /// Delete a repository
    ///
    /// DELETE {project}/_apis/git/repositories/{repositoryId}
    pub async fn delete_repository(&self, project: &str, repository_id: Uuid) -> ApiResult<()> {
        let descriptor = RequestDescriptor::delete(REPOSITORIES_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id);
        self.client.dispatch_json(descriptor).await
    }

    /// Get the content of a file as text
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}/items/{*path}
    pub async fn item_text(&self, project: &str, repository_id: &str, path: &str) -> ApiResult<String> {
        let descriptor = Self::item(Method::GET, project, repository_id, path).accept(ContentType::Text);
        self.client.dispatch_text(descriptor).await
    }

    /// Download a folder as a zip archive
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}/items/{*path}
    pub async fn item_zip(&self, project: &str, repository_id: &str, path: &str) -> ApiResult<Bytes> {
        let descriptor = Self::item(Method::GET, project, repository_id, path)
            .accept(ContentType::Zip)
            .query_param("download", true);
        self.client.dispatch_bytes(descriptor).await
    }

    /// Check whether an item exists.
    ///
    /// A 404 answers `false`; every other failure is still an error.
    ///
    /// HEAD {project}/_apis/git/repositories/{repositoryId}/items/{*path}
    pub async fn item_exists(&self, project: &str, repository_id: &str, path: &str) -> ApiResult<bool> {
        let descriptor = Self::item(Method::HEAD, project, repository_id, path);
        match self.client.dispatch_raw(descriptor).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn item(method: Method, project: &str, repository_id: &str, path: &str) -> RequestDescriptor {
        RequestDescriptor::new(method, ITEMS_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id)
            .route_value("path", path)
    }

    /// Get one page of refs, optionally under a prefix such as `heads/`
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}/refs/{*filter}
    pub async fn refs(
        &self,
        project: &str,
        repository_id: &str,
        filter: Option<&str>,
        top: Option<i32>,
        continuation_token: Option<&str>,
    ) -> ApiResult<PagedList<GitRef>> {
        let descriptor = RequestDescriptor::get(REFS_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id)
            .route_value_opt("filter", filter)
            .query_param_opt("$top", top)
            .query_param_opt(CONTINUATION_TOKEN_PARAM, continuation_token);

        let response = self.client.dispatch_raw(descriptor).await?;
        PagedList::from_response(response).await
    }

    /// Get every ref, following continuation tokens to the end
    pub async fn all_refs(
        &self,
        project: &str,
        repository_id: &str,
        filter: Option<&str>,
    ) -> ApiResult<Vec<GitRef>> {
        paging::collect_all(|token| async move {
            self.refs(project, repository_id, filter, None, token.as_deref())
                .await
        })
        .await
    }

    /// Search pull requests
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}/pullrequests
    pub async fn pull_requests(
        &self,
        project: &str,
        repository_id: &str,
        criteria: &PullRequestSearchCriteria,
        top: Option<i32>,
    ) -> ApiResult<Vec<GitPullRequest>> {
        let descriptor = RequestDescriptor::get(PULL_REQUESTS_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id)
            .query_param("searchCriteria", QueryValue::json(criteria)?)
            .query_param_opt("$top", top);
        self.client.dispatch_collection(descriptor).await
    }

    /// Get one pull request
    ///
    /// GET {project}/_apis/git/repositories/{repositoryId}/pullrequests/{pullRequestId}
    pub async fn pull_request(
        &self,
        project: &str,
        repository_id: &str,
        pull_request_id: i32,
    ) -> ApiResult<GitPullRequest> {
        let descriptor = RequestDescriptor::get(PULL_REQUESTS_ROUTE)
            .route_value("project", project)
            .route_value("repositoryId", repository_id)
            .route_value("pullRequestId", pull_request_id);
        self.client.dispatch_json(descriptor).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Git repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    /// Repository id
    pub id: Uuid,
    /// Repository name
    pub name: String,
    /// REST URL of the repository
    pub url: Option<String>,
    /// Default branch ref, e.g. `refs/heads/main`
    pub default_branch: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Clone URL
    pub remote_url: Option<String>,
    /// Owning project
    pub project: Option<TeamProjectReference>,
    /// Whether the repository is disabled
    #[serde(default)]
    pub is_disabled: bool,
}

/// Project a resource belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProjectReference {
    /// Project id
    pub id: Uuid,
    /// Project name
    pub name: String,
    /// Lifecycle state such as `wellFormed`
    pub state: Option<String>,
    /// Last time the project changed
    pub last_update_time: Option<DateTime<Utc>>,
}

/// Identity summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    /// Identity id
    pub id: Option<String>,
    /// Display name
    pub display_name: Option<String>,
    /// Unique name, usually an email or domain account
    pub unique_name: Option<String>,
}

/// Git ref (branch, tag, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    /// Full ref name, e.g. `refs/heads/main`
    pub name: String,
    /// Commit the ref points at
    pub object_id: String,
    /// Who created the ref
    pub creator: Option<IdentityRef>,
    /// Whether the ref is locked
    pub is_locked: Option<bool>,
}

/// Pull request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PullRequestStatus {
    /// Status not set
    NotSet,
    /// Open
    Active,
    /// Closed without merging
    Abandoned,
    /// Merged
    Completed,
    /// Any status, for searches
    All,
}

/// Pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPullRequest {
    /// Pull request number
    pub pull_request_id: i32,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Current status
    pub status: PullRequestStatus,
    /// Author
    pub created_by: Option<IdentityRef>,
    /// When it was opened
    pub creation_date: DateTime<Utc>,
    /// When it was completed or abandoned
    pub closed_date: Option<DateTime<Utc>>,
    /// Branch being merged
    pub source_ref_name: String,
    /// Branch merged into
    pub target_ref_name: String,
    /// Whether it is a draft
    #[serde(default)]
    pub is_draft: bool,
}

/// Filter for [`GitApi::pull_requests`], sent JSON-encoded as one query value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSearchCriteria {
    /// Status filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PullRequestStatus>,
    /// Author filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<Uuid>,
    /// Source branch filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref_name: Option<String>,
    /// Target branch filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ref_name: Option<String>,
}

impl PullRequestSearchCriteria {
    /// Create empty criteria
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status
    pub fn with_status(mut self, status: PullRequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by target branch, e.g. `refs/heads/main`
    pub fn with_target(mut self, ref_name: impl Into<String>) -> Self {
        self.target_ref_name = Some(ref_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_dates_deserialize() {
        let json = r#"{
            "pullRequestId": 17,
            "title": "Fix build",
            "status": "completed",
            "creationDate": "2024-03-01T10:15:30.123Z",
            "closedDate": "2024-03-02T08:00:00Z",
            "sourceRefName": "refs/heads/fix",
            "targetRefName": "refs/heads/main"
        }"#;

        let pr: GitPullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.pull_request_id, 17);
        assert_eq!(pr.status, PullRequestStatus::Completed);
        assert_eq!(pr.creation_date.timestamp_subsec_millis(), 123);
        assert!(pr.closed_date.unwrap() > pr.creation_date);
        assert!(!pr.is_draft);
    }

    #[test]
    fn test_search_criteria_skips_absent_fields() {
        let criteria = PullRequestSearchCriteria::new()
            .with_status(PullRequestStatus::Active)
            .with_target("refs/heads/main");
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "active", "targetRefName": "refs/heads/main"})
        );
    }
}
