//! Work item tracking endpoints

use crate::client::DevOpsClient;
use crate::error::ApiResult;
use crate::query::COMMA;
use crate::request::RequestDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WORK_ITEMS_ROUTE: &str = "{project}/_apis/wit/workitems/{id}";
const WORK_ITEMS_BY_TYPE_ROUTE: &str = "{project}/_apis/wit/workitems/${type}";

/// Work items API interface
#[derive(Clone)]
pub struct WorkItemsApi {
    client: DevOpsClient,
}

impl WorkItemsApi {
    /// Create a new work items API interface
    pub(crate) fn new(client: DevOpsClient) -> Self {
        Self { client }
    }

    /// Get a single work item
    ///
    /// GET {project}/_apis/wit/workitems/{id}
    pub async fn get(
        &self,
        project: Option<&str>,
        id: i32,
        expand: Option<WorkItemExpand>,
    ) -> ApiResult<WorkItem> {
        let descriptor = RequestDescriptor::get(WORK_ITEMS_ROUTE)
            .route_value_opt("project", project)
            .route_value("id", id)
            .query_param_opt("$expand", expand.map(WorkItemExpand::as_str));
        self.client.dispatch_json(descriptor).await
    }

    /// Get several work items, optionally as of a point in time
    ///
    /// GET {project}/_apis/wit/workitems?ids=1,2,3
    pub async fn list(
        &self,
        project: Option<&str>,
        ids: &[i32],
        fields: &[&str],
        as_of: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<WorkItem>> {
        let mut descriptor = RequestDescriptor::get(WORK_ITEMS_ROUTE)
            .route_value_opt("project", project)
            .query_param_opt("asOf", as_of);
        descriptor.query.insert_list("ids", ids, COMMA);
        descriptor.query.insert_list("fields", fields, COMMA);
        self.client.dispatch_collection(descriptor).await
    }

    /// Create a work item of the given type from patch operations
    ///
    /// POST {project}/_apis/wit/workitems/${type}
    pub async fn create(
        &self,
        project: &str,
        work_item_type: &str,
        operations: &[JsonPatchOperation],
        validate_only: Option<bool>,
    ) -> ApiResult<WorkItem> {
        let descriptor = RequestDescriptor::post(WORK_ITEMS_BY_TYPE_ROUTE)
            .route_value("project", project)
            .route_value("type", work_item_type)
            .query_param_opt("validateOnly", validate_only)
            .json_patch(operations)?;
        self.client.dispatch_json(descriptor).await
    }

    /// Apply patch operations to a work item
    ///
    /// PATCH {project}/_apis/wit/workitems/{id}
    pub async fn update(
        &self,
        project: Option<&str>,
        id: i32,
        operations: &[JsonPatchOperation],
    ) -> ApiResult<WorkItem> {
        let descriptor = RequestDescriptor::patch(WORK_ITEMS_ROUTE)
            .route_value_opt("project", project)
            .route_value("id", id)
            .json_patch(operations)?;
        self.client.dispatch_json(descriptor).await
    }

    /// Delete a work item, to the recycle bin unless `destroy` is set
    ///
    /// DELETE {project}/_apis/wit/workitems/{id}
    pub async fn delete(
        &self,
        project: Option<&str>,
        id: i32,
        destroy: Option<bool>,
    ) -> ApiResult<WorkItemDelete> {
        let descriptor = RequestDescriptor::delete(WORK_ITEMS_ROUTE)
            .route_value_opt("project", project)
            .route_value("id", id)
            .query_param_opt("destroy", destroy);
        self.client.dispatch_json(descriptor).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Work item id
    pub id: i32,
    /// Revision number
    pub rev: Option<i32>,
    /// Field reference name to value, e.g. `System.Title`
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// REST URL of the work item
    pub url: Option<String>,
}

impl WorkItem {
    /// Field value as text
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(serde_json::Value::as_str)
    }
}

/// Extra data returned with a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItemExpand {
    /// Fields only
    None,
    /// Include relations
    Relations,
    /// Include all fields
    Fields,
    /// Include links
    Links,
    /// Include everything
    All,
}

impl WorkItemExpand {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Relations => "relations",
            Self::Fields => "fields",
            Self::Links => "links",
            Self::All => "all",
        }
    }
}

/// JSON patch operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Add a value
    Add,
    /// Remove a value
    Remove,
    /// Replace a value
    Replace,
    /// Move a value
    Move,
    /// Copy a value
    Copy,
    /// Assert a value
    Test,
}

/// One RFC 6902 patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    /// Operation kind
    pub op: Operation,
    /// Target path, e.g. `/fields/System.Title`
    pub path: String,
    /// Source path for `move` and `copy`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Value for `add`, `replace` and `test`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl JsonPatchOperation {
    /// `add` operation setting a field
    pub fn add_field(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: Operation::Add,
            path: format!("/fields/{field}"),
            from: None,
            value: Some(value.into()),
        }
    }
}

/// Result of deleting a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemDelete {
    /// Deleted work item id
    pub id: i32,
    /// Title at deletion time
    pub name: Option<String>,
    /// Who deleted it
    pub deleted_by: Option<String>,
    /// When it was deleted
    pub deleted_date: Option<DateTime<Utc>>,
    /// Project it belonged to
    pub project: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_operation_serialize() {
        let op = JsonPatchOperation::add_field("System.Title", "Broken build");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "add", "path": "/fields/System.Title", "value": "Broken build"})
        );
    }

    #[test]
    fn test_work_item_fields() {
        let json = r#"{"id": 5, "rev": 2, "fields": {"System.Title": "t", "System.Priority": 1}}"#;
        let item: WorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.field_str("System.Title"), Some("t"));
        assert_eq!(item.field_str("System.Priority"), None);
    }

    #[test]
    fn test_delete_result_dates() {
        let json = r#"{"id": 9, "deletedDate": "2024-01-02T03:04:05.6Z"}"#;
        let deleted: WorkItemDelete = serde_json::from_str(json).unwrap();
        assert_eq!(deleted.deleted_date.unwrap().timestamp_subsec_millis(), 600);
    }
}
