//! In-memory project tracker
//!
//! Behaves like a remote tracker (fresh ids, per-resource versions, raw field
//! value storage) without leaving the process. Failures can be injected to
//! exercise partial-batch and retry paths.

use super::{ProjectAdapter, ResourceKind, ResourcePatch, ResourceRef, ResourceSnapshot};
use crate::model::{
    CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, FieldId, Issue,
    IssueId, Milestone, MilestoneId, Progress, Project, ProjectId, ProjectView, Sprint, SprintId,
    Status, ViewId,
};
use crate::{ProjectFlowError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Builds the error returned by an injected failure
pub type FailureFn = fn() -> ProjectFlowError;

#[derive(Debug, Clone)]
struct Stored {
    data: Value,
    version: u64,
}

#[derive(Default)]
struct State {
    resources: HashMap<ResourceRef, Stored>,
    /// Issue ids per project, in creation order
    project_issues: HashMap<ProjectId, Vec<IssueId>>,
    field_values: HashMap<(IssueId, FieldId), Value>,
    counters: HashMap<&'static str, u64>,
    issue_attempts: usize,
    issue_failures: HashMap<usize, FailureFn>,
    rate_limited_calls: u32,
    retry_after_secs: u64,
    calls: Vec<&'static str>,
}

impl State {
    fn next_id(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{}{}", prefix, counter)
    }

    /// Record a call and apply simulated rate limiting
    fn enter(&mut self, operation: &'static str) -> Result<()> {
        self.calls.push(operation);
        if self.rate_limited_calls > 0 {
            self.rate_limited_calls -= 1;
            return Err(ProjectFlowError::RateLimited(self.retry_after_secs));
        }
        Ok(())
    }

    fn get(&self, resource: &ResourceRef) -> Result<&Stored> {
        self.resources
            .get(resource)
            .ok_or_else(|| ProjectFlowError::NotFound(resource.to_string()))
    }

    fn insert<T: Serialize>(&mut self, resource: ResourceRef, entity: &T) -> Result<()> {
        let data = serde_json::to_value(entity)?;
        self.resources.insert(resource, Stored { data, version: 1 });
        Ok(())
    }
}

/// Process-local [`ProjectAdapter`]
///
/// Ids are sequential per kind (`p1`, `m1`, `i1`, `s1`, `f1`, `v1`) and every
/// resource starts at version 1.
#[derive(Default)]
pub struct InMemoryAdapter {
    state: Mutex<State>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `nth` (1-based) issue creation attempt with `failure()`
    pub fn with_issue_failure(mut self, nth: usize, failure: FailureFn) -> Self {
        self.state.get_mut().issue_failures.insert(nth, failure);
        self
    }

    /// Reject the next `calls` calls with `RateLimited(retry_after_secs)`
    pub fn with_rate_limit(mut self, calls: u32, retry_after_secs: u64) -> Self {
        let state = self.state.get_mut();
        state.rate_limited_calls = calls;
        state.retry_after_secs = retry_after_secs;
        self
    }

    /// Total calls received, including rejected ones
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Operation names in the order they were called
    pub async fn calls(&self) -> Vec<&'static str> {
        self.state.lock().await.calls.clone()
    }

    /// Count of stored resources of one kind
    pub async fn resource_count(&self, kind: ResourceKind) -> usize {
        self.state
            .lock()
            .await
            .resources
            .keys()
            .filter(|r| r.kind() == kind)
            .count()
    }
}

#[async_trait]
impl ProjectAdapter for InMemoryAdapter {
    async fn create_project(&self, spec: &CreateProjectInput) -> Result<ProjectId> {
        let mut state = self.state.lock().await;
        state.enter("create_project")?;

        let id = ProjectId::new(state.next_id("p"));
        let fields: Vec<_> = spec
            .fields
            .iter()
            .map(|f| {
                let field_id = state.next_id("f");
                f.to_field(field_id)
            })
            .collect();
        let views: Vec<_> = spec
            .views
            .iter()
            .map(|v| ProjectView {
                id: ViewId::new(state.next_id("v")),
                name: v.name.clone(),
                layout: v.layout,
                settings: v.settings.clone(),
            })
            .collect();

        let now = Utc::now();
        let project = Project {
            id: id.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            owner: spec.owner.clone(),
            visibility: spec.visibility.unwrap_or_default(),
            status: Status::Active,
            version: 1,
            views,
            fields,
            created_at: now,
            updated_at: now,
        };
        state.insert(ResourceRef::Project(id.clone()), &project)?;
        state.project_issues.insert(id.clone(), Vec::new());

        debug!(project = %id, "Created project");
        Ok(id)
    }

    async fn create_milestone(
        &self,
        project: &ProjectId,
        spec: &CreateMilestoneInput,
    ) -> Result<MilestoneId> {
        let mut state = self.state.lock().await;
        state.enter("create_milestone")?;
        state.get(&ResourceRef::Project(project.clone()))?;

        let id = MilestoneId::new(state.next_id("m"));
        let now = Utc::now();
        let milestone = Milestone {
            id: id.clone(),
            project_id: project.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            due_date: spec.due_date,
            status: Status::Planned,
            progress: Progress::default(),
            created_at: now,
            updated_at: now,
        };
        state.insert(ResourceRef::Milestone(id.clone()), &milestone)?;

        debug!(project = %project, milestone = %id, "Created milestone");
        Ok(id)
    }

    async fn create_issue(&self, project: &ProjectId, spec: &CreateIssueInput) -> Result<IssueId> {
        let mut state = self.state.lock().await;
        state.enter("create_issue")?;

        state.issue_attempts += 1;
        let attempt = state.issue_attempts;
        if let Some(failure) = state.issue_failures.get(&attempt) {
            return Err(failure());
        }

        state.get(&ResourceRef::Project(project.clone()))?;
        if let Some(milestone) = &spec.milestone_id {
            state.get(&ResourceRef::Milestone(milestone.clone()))?;
        }

        let id = IssueId::new(state.next_id("i"));
        let now = Utc::now();
        let issue = Issue {
            id: id.clone(),
            project_id: project.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            status: spec.status.unwrap_or_default(),
            assignees: spec.assignees.iter().cloned().collect(),
            labels: spec.labels.iter().cloned().collect(),
            milestone_id: spec.milestone_id.clone(),
            created_at: now,
            updated_at: now,
        };
        state.insert(ResourceRef::Issue(id.clone()), &issue)?;
        state
            .project_issues
            .entry(project.clone())
            .or_default()
            .push(id.clone());

        debug!(project = %project, issue = %id, "Created issue");
        Ok(id)
    }

    async fn create_sprint(&self, spec: &CreateSprintInput) -> Result<SprintId> {
        let mut state = self.state.lock().await;
        state.enter("create_sprint")?;

        let id = SprintId::new(state.next_id("s"));
        let now = Utc::now();
        let sprint = Sprint {
            id: id.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            start_date: spec.start_date,
            end_date: spec.end_date,
            status: spec.status.unwrap_or_default(),
            issues: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.insert(ResourceRef::Sprint(id.clone()), &sprint)?;

        debug!(sprint = %id, "Created sprint");
        Ok(id)
    }

    async fn link_issue_to_sprint(&self, sprint: &SprintId, issue: &IssueId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enter("link_issue_to_sprint")?;
        state.get(&ResourceRef::Issue(issue.clone()))?;

        let sprint_ref = ResourceRef::Sprint(sprint.clone());
        let stored = state
            .resources
            .get_mut(&sprint_ref)
            .ok_or_else(|| ProjectFlowError::NotFound(sprint_ref.to_string()))?;

        let mut entity: Sprint = serde_json::from_value(stored.data.clone())?;
        if !entity.issues.contains(issue) {
            entity.issues.push(issue.clone());
            entity.updated_at = Utc::now();
            stored.data = serde_json::to_value(&entity)?;
            stored.version += 1;
        }
        Ok(())
    }

    async fn get_field_value(&self, item: &IssueId, field: &FieldId) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.enter("get_field_value")?;
        state.get(&ResourceRef::Issue(item.clone()))?;

        state
            .field_values
            .get(&(item.clone(), field.clone()))
            .cloned()
            .ok_or_else(|| ProjectFlowError::NotFound(format!("field {} on issue:{}", field, item)))
    }

    async fn set_field_value(&self, item: &IssueId, field: &FieldId, value: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enter("set_field_value")?;
        state.get(&ResourceRef::Issue(item.clone()))?;

        state.field_values.insert((item.clone(), field.clone()), value);
        Ok(())
    }

    async fn get_resource(&self, resource: &ResourceRef) -> Result<ResourceSnapshot> {
        let mut state = self.state.lock().await;
        state.enter("get_resource")?;
        let stored = state.get(resource)?;

        Ok(ResourceSnapshot {
            data: stored.data.clone(),
            version: stored.version,
        })
    }

    async fn update_resource(
        &self,
        resource: &ResourceRef,
        patch: &ResourcePatch,
        expected_version: u64,
    ) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.enter("update_resource")?;

        if patch.kind() != resource.kind() {
            return Err(ProjectFlowError::validation(
                "patch",
                format!("{} patch cannot update {}", patch.kind(), resource),
            ));
        }

        let stored = state
            .resources
            .get_mut(resource)
            .ok_or_else(|| ProjectFlowError::NotFound(resource.to_string()))?;

        if stored.version != expected_version {
            return Err(ProjectFlowError::VersionConflict {
                resource: resource.to_string(),
                expected: expected_version,
                actual: stored.version,
            });
        }

        let mut data = stored.data.clone();
        patch.apply_to(&mut data)?;
        let version = stored.version + 1;
        if let Some(object) = data.as_object_mut() {
            object.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
            if resource.kind() == ResourceKind::Project {
                object.insert("version".to_string(), Value::from(version));
            }
        }

        stored.data = data;
        stored.version = version;
        Ok(version)
    }

    async fn list_project_issues(&self, project: &ProjectId) -> Result<Vec<IssueId>> {
        let mut state = self.state.lock().await;
        state.enter("list_project_issues")?;
        state.get(&ResourceRef::Project(project.clone()))?;

        Ok(state
            .project_issues
            .get(project)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomFieldInput, FieldType, SprintPatch};
    use chrono::NaiveDate;

    fn sprint_input() -> CreateSprintInput {
        CreateSprintInput::new(
            "Sprint 1",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let adapter = InMemoryAdapter::new();
        let project = adapter
            .create_project(
                &CreateProjectInput::new("Roadmap")
                    .with_field(CustomFieldInput::new("Estimate", FieldType::Number)),
            )
            .await
            .unwrap();
        let first = adapter
            .create_issue(&project, &CreateIssueInput::new("One"))
            .await
            .unwrap();
        let second = adapter
            .create_issue(&project, &CreateIssueInput::new("Two"))
            .await
            .unwrap();

        assert_eq!(project.as_str(), "p1");
        assert_eq!(first.as_str(), "i1");
        assert_eq!(second.as_str(), "i2");

        let snapshot = adapter.get_resource(&ResourceRef::Project(project)).await.unwrap();
        let stored: Project = snapshot.decode().unwrap();
        assert_eq!(stored.fields[0].id, "f1");
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_issue_requires_existing_milestone() {
        let adapter = InMemoryAdapter::new();
        let project = adapter
            .create_project(&CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();
        let mut input = CreateIssueInput::new("Orphan");
        input.milestone_id = Some(MilestoneId::new("m42"));

        let err = adapter.create_issue(&project, &input).await.unwrap_err();
        assert!(matches!(err, ProjectFlowError::NotFound(ref r) if r == "milestone:m42"));
    }

    #[tokio::test]
    async fn test_stale_update_leaves_state_untouched() {
        let adapter = InMemoryAdapter::new();
        let sprint = ResourceRef::Sprint(adapter.create_sprint(&sprint_input()).await.unwrap());
        let patch = ResourcePatch::Sprint(SprintPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        });

        assert_eq!(adapter.update_resource(&sprint, &patch, 1).await.unwrap(), 2);
        let err = adapter.update_resource(&sprint, &patch, 1).await.unwrap_err();
        assert!(matches!(
            err,
            ProjectFlowError::VersionConflict { expected: 1, actual: 2, .. }
        ));
        assert_eq!(adapter.get_resource(&sprint).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_linking_is_idempotent() {
        let adapter = InMemoryAdapter::new();
        let project = adapter
            .create_project(&CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();
        let issue = adapter
            .create_issue(&project, &CreateIssueInput::new("One"))
            .await
            .unwrap();
        let sprint = adapter.create_sprint(&sprint_input()).await.unwrap();

        adapter.link_issue_to_sprint(&sprint, &issue).await.unwrap();
        adapter.link_issue_to_sprint(&sprint, &issue).await.unwrap();

        let stored: Sprint = adapter
            .get_resource(&ResourceRef::Sprint(sprint))
            .await
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(stored.issues, vec![issue]);
    }

    #[tokio::test]
    async fn test_injected_issue_failure() {
        let adapter = InMemoryAdapter::new()
            .with_issue_failure(1, || ProjectFlowError::Unauthorized("token expired".into()));
        let project = adapter
            .create_project(&CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();

        let err = adapter
            .create_issue(&project, &CreateIssueInput::new("One"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectFlowError::Unauthorized(_)));

        // Only the configured attempt fails
        assert!(adapter
            .create_issue(&project, &CreateIssueInput::new("One"))
            .await
            .is_ok());
    }
}
