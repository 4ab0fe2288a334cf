//! External project adapters
//!
//! The synchronizer talks to an external project tracker only through the
//! [`ProjectAdapter`] trait. Each call acts on a single resource; the tracker
//! offers no transactions.
//!
//! # Built-in Adapters
//!
//! - **InMemoryAdapter**: process-local tracker used for tests and dry runs
//! - **RetryingAdapter**: wraps another adapter with backoff on transient errors
//!
//! Adapters surface `Unauthorized`, `RateLimited` and `NotFound` unchanged;
//! retrying them is the adapter's business, never the synchronizer's.

mod memory;
pub mod retry;
mod retrying;

pub use memory::InMemoryAdapter;
pub use retrying::RetryingAdapter;

use crate::model::{
    CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, FieldId,
    IssueId, IssuePatch, MilestoneId, MilestonePatch, ProjectId, ProjectPatch, SprintId,
    SprintPatch,
};
use crate::{ProjectFlowError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of a top-level resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Milestone,
    Issue,
    Sprint,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Milestone => "milestone",
            ResourceKind::Issue => "issue",
            ResourceKind::Sprint => "sprint",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a top-level resource in the external system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResourceRef {
    Project(ProjectId),
    Milestone(MilestoneId),
    Issue(IssueId),
    Sprint(SprintId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Project(_) => ResourceKind::Project,
            ResourceRef::Milestone(_) => ResourceKind::Milestone,
            ResourceRef::Issue(_) => ResourceKind::Issue,
            ResourceRef::Sprint(_) => ResourceKind::Sprint,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResourceRef::Project(id) => id.as_str(),
            ResourceRef::Milestone(id) => id.as_str(),
            ResourceRef::Issue(id) => id.as_str(),
            ResourceRef::Sprint(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

impl From<ProjectId> for ResourceRef {
    fn from(id: ProjectId) -> Self {
        ResourceRef::Project(id)
    }
}

impl From<MilestoneId> for ResourceRef {
    fn from(id: MilestoneId) -> Self {
        ResourceRef::Milestone(id)
    }
}

impl From<IssueId> for ResourceRef {
    fn from(id: IssueId) -> Self {
        ResourceRef::Issue(id)
    }
}

impl From<SprintId> for ResourceRef {
    fn from(id: SprintId) -> Self {
        ResourceRef::Sprint(id)
    }
}

/// A resource's current data together with its version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub data: Value,
    pub version: u64,
}

impl ResourceSnapshot {
    /// Deserialize the snapshot data into a domain entity
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// A typed partial update for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourcePatch {
    Project(ProjectPatch),
    Milestone(MilestonePatch),
    Issue(IssuePatch),
    Sprint(SprintPatch),
}

impl ResourcePatch {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourcePatch::Project(_) => ResourceKind::Project,
            ResourcePatch::Milestone(_) => ResourceKind::Milestone,
            ResourcePatch::Issue(_) => ResourceKind::Issue,
            ResourcePatch::Sprint(_) => ResourceKind::Sprint,
        }
    }

    /// Merge the set fields of this patch into a resource's JSON data
    pub fn apply_to(&self, data: &mut Value) -> Result<()> {
        let target = data.as_object_mut().ok_or_else(|| {
            ProjectFlowError::Transport("resource data is not a JSON object".to_string())
        })?;

        let mut changes = match self {
            ResourcePatch::Project(p) => serde_json::to_value(p)?,
            ResourcePatch::Milestone(p) => serde_json::to_value(p)?,
            ResourcePatch::Issue(p) => serde_json::to_value(p)?,
            ResourcePatch::Sprint(p) => serde_json::to_value(p)?,
        };

        if let Some(changes) = changes.as_object_mut() {
            if let Some(Value::Bool(true)) = changes.remove("clear_milestone") {
                target.remove("milestone_id");
            }
            for (key, value) in std::mem::take(changes) {
                target.insert(key, value);
            }
        }

        Ok(())
    }
}

/// Narrow interface to an external project tracker
///
/// Every method is a single request against one resource. Implementations
/// assign fresh ids on creation, so create calls are safe to retry.
#[async_trait]
pub trait ProjectAdapter: Send + Sync {
    async fn create_project(&self, spec: &CreateProjectInput) -> Result<ProjectId>;

    async fn create_milestone(
        &self,
        project: &ProjectId,
        spec: &CreateMilestoneInput,
    ) -> Result<MilestoneId>;

    /// Custom field values in `spec` are applied separately via `set_field_value`
    async fn create_issue(&self, project: &ProjectId, spec: &CreateIssueInput) -> Result<IssueId>;

    async fn create_sprint(&self, spec: &CreateSprintInput) -> Result<SprintId>;

    async fn link_issue_to_sprint(&self, sprint: &SprintId, issue: &IssueId) -> Result<()>;

    async fn get_field_value(&self, item: &IssueId, field: &FieldId) -> Result<Value>;

    async fn set_field_value(&self, item: &IssueId, field: &FieldId, value: Value) -> Result<()>;

    async fn get_resource(&self, resource: &ResourceRef) -> Result<ResourceSnapshot>;

    /// Apply `patch` if `expected_version` is current; returns the new version
    async fn update_resource(
        &self,
        resource: &ResourceRef,
        patch: &ResourcePatch,
        expected_version: u64,
    ) -> Result<u64>;

    /// Ids of every issue in a project, in creation order
    async fn list_project_issues(&self, project: &ProjectId) -> Result<Vec<IssueId>>;
}
