//! Adapter decorator that retries transient failures

use super::retry::{retry, RetryPolicy};
use super::{ProjectAdapter, ResourcePatch, ResourceRef, ResourceSnapshot};
use crate::model::{
    CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, FieldId,
    IssueId, MilestoneId, ProjectId, SprintId,
};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Wraps an adapter and retries `Transport` / `RateLimited` failures
///
/// Version conflicts are never retried: a stale write needs a fresh read.
pub struct RetryingAdapter<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A: ProjectAdapter> RetryingAdapter<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<A: ProjectAdapter> ProjectAdapter for RetryingAdapter<A> {
    async fn create_project(&self, spec: &CreateProjectInput) -> Result<ProjectId> {
        retry(&self.policy, "create_project", || self.inner.create_project(spec)).await
    }

    async fn create_milestone(
        &self,
        project: &ProjectId,
        spec: &CreateMilestoneInput,
    ) -> Result<MilestoneId> {
        retry(&self.policy, "create_milestone", || {
            self.inner.create_milestone(project, spec)
        })
        .await
    }

    async fn create_issue(&self, project: &ProjectId, spec: &CreateIssueInput) -> Result<IssueId> {
        retry(&self.policy, "create_issue", || {
            self.inner.create_issue(project, spec)
        })
        .await
    }

    async fn create_sprint(&self, spec: &CreateSprintInput) -> Result<SprintId> {
        retry(&self.policy, "create_sprint", || self.inner.create_sprint(spec)).await
    }

    async fn link_issue_to_sprint(&self, sprint: &SprintId, issue: &IssueId) -> Result<()> {
        retry(&self.policy, "link_issue_to_sprint", || {
            self.inner.link_issue_to_sprint(sprint, issue)
        })
        .await
    }

    async fn get_field_value(&self, item: &IssueId, field: &FieldId) -> Result<Value> {
        retry(&self.policy, "get_field_value", || {
            self.inner.get_field_value(item, field)
        })
        .await
    }

    async fn set_field_value(&self, item: &IssueId, field: &FieldId, value: Value) -> Result<()> {
        retry(&self.policy, "set_field_value", || {
            self.inner.set_field_value(item, field, value.clone())
        })
        .await
    }

    async fn get_resource(&self, resource: &ResourceRef) -> Result<ResourceSnapshot> {
        retry(&self.policy, "get_resource", || self.inner.get_resource(resource)).await
    }

    async fn update_resource(
        &self,
        resource: &ResourceRef,
        patch: &ResourcePatch,
        expected_version: u64,
    ) -> Result<u64> {
        retry(&self.policy, "update_resource", || {
            self.inner.update_resource(resource, patch, expected_version)
        })
        .await
    }

    async fn list_project_issues(&self, project: &ProjectId) -> Result<Vec<IssueId>> {
        retry(&self.policy, "list_project_issues", || {
            self.inner.list_project_issues(project)
        })
        .await
    }
}
