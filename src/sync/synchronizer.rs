//! Multi-resource operations over a [`ProjectAdapter`]

use super::report::{
    BatchFailure, BatchPosition, BatchReport, LinkFailure, RoadmapMilestone,
    RoadmapMilestoneInput, RoadmapResult, SprintPlan,
};
use crate::adapter::{ProjectAdapter, ResourcePatch, ResourceRef, ResourceSnapshot};
use crate::config::ProjectFlowConfig;
use crate::metrics::MetricsEngine;
use crate::model::validation::{
    into_result, validate_issue_input, validate_issue_patch, validate_milestone_input,
    validate_milestone_patch, validate_project_input, validate_project_patch,
    validate_sprint_input, validate_sprint_patch,
};
use crate::model::{
    CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, CustomField,
    FieldAssignment, FieldId, FieldValue, Issue, IssueId, IssuePatch, Milestone, MilestoneId,
    MilestonePatch, Project, ProjectId, ProjectPatch, Sprint, SprintId, SprintPatch,
    ValidationError,
};
use crate::telemetry;
use crate::{ProjectFlowError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info, warn};

/// An encoded field value waiting for its issue to exist
#[derive(Debug, Clone)]
struct PendingField {
    /// Field name, resolved to an id once the project exists
    name: String,
    value: Value,
}

/// Find a declared field by id, falling back to its name
fn find_field<'f>(fields: &'f [CustomField], key: &str) -> Option<&'f CustomField> {
    fields
        .iter()
        .find(|f| !f.id.is_empty() && f.id == key)
        .or_else(|| fields.iter().find(|f| f.name == key))
}

/// Encode each assignment against its declared field, in input order
///
/// A field reached twice (for example once by id and once by name) is
/// rejected rather than written twice.
fn encode_assignments(
    fields: &[CustomField],
    assignments: &[FieldAssignment],
) -> Result<Vec<PendingField>> {
    let mut assigned = HashSet::new();
    let mut pending = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let field = find_field(fields, &assignment.field).ok_or_else(|| {
            ProjectFlowError::validation(
                "field_values",
                format!("unknown field '{}'", assignment.field),
            )
        })?;
        if !assigned.insert(field.name.as_str()) {
            return Err(ProjectFlowError::validation(
                "field_values",
                format!("field '{}' assigned more than once", field.name),
            ));
        }
        pending.push(PendingField {
            name: field.name.clone(),
            value: fieldcodec::encode(field, &assignment.value)?,
        });
    }
    Ok(pending)
}

fn prefixed(prefix: &str, errors: Vec<ValidationError>) -> impl Iterator<Item = ValidationError> + '_ {
    errors
        .into_iter()
        .map(move |e| ValidationError::new(format!("{}.{}", prefix, e.field), e.message))
}

/// Creates and updates projects, milestones, issues and sprints
///
/// Every operation validates and encodes its inputs before the first adapter
/// call, so a rejected input never leaves anything behind.
pub struct ResourceSynchronizer<A> {
    adapter: A,
    config: ProjectFlowConfig,
}

impl<A: ProjectAdapter> ResourceSynchronizer<A> {
    pub fn new(adapter: A, config: ProjectFlowConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &ProjectFlowConfig {
        &self.config
    }

    /// Progress and sprint metrics read through the same adapter
    pub fn metrics(&self) -> MetricsEngine<'_, A> {
        MetricsEngine::new(&self.adapter)
    }

    /// Await an adapter call, counting failures by operation and kind
    async fn external<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        call.await.map_err(|e| {
            telemetry::record_adapter_error(operation, e.kind());
            debug!(operation, error = %e, "Adapter call failed");
            e
        })
    }

    fn resolve_project_input(&self, mut input: CreateProjectInput) -> CreateProjectInput {
        if input.owner.trim().is_empty() {
            input.owner = self.config.owner.clone();
        }
        if input.visibility.is_none() {
            input.visibility = Some(self.config.default_visibility);
        }
        input
    }

    // Projects

    pub async fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let input = self.resolve_project_input(input);
        into_result(validate_project_input(&input))?;

        let id = self
            .external("create_project", self.adapter.create_project(&input))
            .await?;
        telemetry::record_created("project");
        info!(project = %id, title = %input.title, "Created project");

        self.get_project(&id).await
    }

    pub async fn get_project(&self, id: &ProjectId) -> Result<Project> {
        let snapshot = self.get_resource(&ResourceRef::Project(id.clone())).await?;
        if let Some(fields) = snapshot.data.get("fields") {
            fieldcodec::check_field_types(fields)?;
        }
        let mut project: Project = snapshot.decode()?;
        project.version = snapshot.version;
        Ok(project)
    }

    pub async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
        expected_version: u64,
    ) -> Result<u64> {
        self.update_resource(
            &ResourceRef::Project(id.clone()),
            ResourcePatch::Project(patch),
            expected_version,
        )
        .await
    }

    // Milestones

    pub async fn create_milestone(
        &self,
        project: &ProjectId,
        input: CreateMilestoneInput,
    ) -> Result<Milestone> {
        into_result(validate_milestone_input(&input))?;

        let id = self
            .external("create_milestone", self.adapter.create_milestone(project, &input))
            .await?;
        telemetry::record_created("milestone");
        info!(project = %project, milestone = %id, "Created milestone");

        self.get_milestone(&id).await
    }

    /// Read a milestone with its progress derived from its current issues
    pub async fn get_milestone(&self, id: &MilestoneId) -> Result<Milestone> {
        self.metrics().milestone_with_progress(id).await
    }

    async fn read_milestone(&self, id: &MilestoneId) -> Result<Milestone> {
        self.get_resource(&ResourceRef::Milestone(id.clone()))
            .await?
            .decode()
    }

    pub async fn update_milestone(
        &self,
        id: &MilestoneId,
        patch: MilestonePatch,
        expected_version: u64,
    ) -> Result<u64> {
        self.update_resource(
            &ResourceRef::Milestone(id.clone()),
            ResourcePatch::Milestone(patch),
            expected_version,
        )
        .await
    }

    /// A milestone reference must resolve within the same project
    async fn check_milestone(&self, project: &ProjectId, milestone: &MilestoneId) -> Result<()> {
        match self.read_milestone(milestone).await {
            Ok(found) if &found.project_id == project => Ok(()),
            Ok(found) => Err(ProjectFlowError::validation(
                "milestone_id",
                format!(
                    "milestone {} belongs to project {}, not {}",
                    milestone, found.project_id, project
                ),
            )),
            Err(ProjectFlowError::NotFound(_)) => Err(ProjectFlowError::validation(
                "milestone_id",
                format!("milestone {} does not exist", milestone),
            )),
            Err(e) => Err(e),
        }
    }

    // Issues

    /// Create an issue and set its custom field values
    ///
    /// Field values are encoded against the project's fields first; a value
    /// that does not fit its field fails before the issue is created. If a
    /// value cannot be written once the issue exists, the result is
    /// [`ProjectFlowError::PartialBatchFailure`] carrying the new issue id and
    /// the failed `field_values` position.
    pub async fn create_issue(&self, project: &ProjectId, input: CreateIssueInput) -> Result<Issue> {
        into_result(validate_issue_input(&input))?;
        let project = self.get_project(project).await?;
        if let Some(milestone) = &input.milestone_id {
            self.check_milestone(&project.id, milestone).await?;
        }
        let pending = encode_assignments(&project.fields, &input.field_values)?;

        let id = self
            .external("create_issue", self.adapter.create_issue(&project.id, &input))
            .await?;
        telemetry::record_created("issue");
        info!(project = %project.id, issue = %id, "Created issue");

        if let Err((index, error)) = self.write_fields(&project, &id, &pending).await {
            warn!(issue = %id, field = %pending[index].name, error = %error, "Setting field values failed");
            let mut report = BatchReport::new("create_issue");
            report.succeeded.push(ResourceRef::Issue(id));
            report.failed.push(BatchFailure {
                position: BatchPosition::Field(index),
                error,
            });
            report
                .skipped
                .extend((index + 1..pending.len()).map(BatchPosition::Field));
            return Err(self.partial_failure(report));
        }
        self.get_issue(&id).await
    }

    pub async fn get_issue(&self, id: &IssueId) -> Result<Issue> {
        self.get_resource(&ResourceRef::Issue(id.clone()))
            .await?
            .decode()
    }

    pub async fn update_issue(
        &self,
        id: &IssueId,
        patch: IssuePatch,
        expected_version: u64,
    ) -> Result<u64> {
        self.update_resource(
            &ResourceRef::Issue(id.clone()),
            ResourcePatch::Issue(patch),
            expected_version,
        )
        .await
    }

    /// Write encoded values in order, stopping at the first failure
    ///
    /// The error carries the index of the value that could not be written.
    async fn write_fields(
        &self,
        project: &Project,
        issue: &IssueId,
        pending: &[PendingField],
    ) -> std::result::Result<(), (usize, ProjectFlowError)> {
        for (index, field) in pending.iter().enumerate() {
            let declared = project.resolve_field(&field.name).ok_or_else(|| {
                let missing = format!("field {} on project:{}", field.name, project.id);
                (index, ProjectFlowError::NotFound(missing))
            })?;
            let field_id = FieldId::new(declared.id.clone());
            self.external(
                "set_field_value",
                self.adapter
                    .set_field_value(issue, &field_id, field.value.clone()),
            )
            .await
            .map_err(|e| (index, e))?;
            debug!(issue = %issue, field = %field_id, "Set field value");
        }
        Ok(())
    }

    /// Read and decode one custom field value of an issue
    ///
    /// `field` is the field id or name.
    pub async fn get_issue_field(&self, issue: &IssueId, field: &str) -> Result<FieldValue> {
        let declared = self.issue_field(issue, field).await?;
        let raw = self
            .external(
                "get_field_value",
                self.adapter
                    .get_field_value(issue, &FieldId::new(declared.id.clone())),
            )
            .await?;
        Ok(fieldcodec::decode(&declared, &raw)?)
    }

    /// Encode and write one custom field value of an issue
    pub async fn set_issue_field(
        &self,
        issue: &IssueId,
        field: &str,
        value: &FieldValue,
    ) -> Result<()> {
        let declared = self.issue_field(issue, field).await?;
        let raw = fieldcodec::encode(&declared, value)?;
        self.external(
            "set_field_value",
            self.adapter
                .set_field_value(issue, &FieldId::new(declared.id.clone()), raw),
        )
        .await
    }

    async fn issue_field(&self, issue: &IssueId, field: &str) -> Result<CustomField> {
        let issue = self.get_issue(issue).await?;
        let project = self.get_project(&issue.project_id).await?;
        project.resolve_field(field).cloned().ok_or_else(|| {
            ProjectFlowError::NotFound(format!("field {} on project:{}", field, project.id))
        })
    }

    // Sprints

    pub async fn create_sprint(&self, input: CreateSprintInput) -> Result<Sprint> {
        into_result(validate_sprint_input(&input))?;

        let id = self
            .external("create_sprint", self.adapter.create_sprint(&input))
            .await?;
        telemetry::record_created("sprint");
        info!(sprint = %id, title = %input.title, "Created sprint");

        self.get_sprint(&id).await
    }

    pub async fn get_sprint(&self, id: &SprintId) -> Result<Sprint> {
        self.get_resource(&ResourceRef::Sprint(id.clone()))
            .await?
            .decode()
    }

    pub async fn update_sprint(
        &self,
        id: &SprintId,
        patch: SprintPatch,
        expected_version: u64,
    ) -> Result<u64> {
        self.update_resource(
            &ResourceRef::Sprint(id.clone()),
            ResourcePatch::Sprint(patch),
            expected_version,
        )
        .await
    }

    pub async fn get_resource(&self, resource: &ResourceRef) -> Result<ResourceSnapshot> {
        self.external("get_resource", self.adapter.get_resource(resource))
            .await
    }

    /// Create a project, its milestones and their issues
    ///
    /// All inputs are validated and every field value is encoded before the
    /// project is created. After that, resources are created one at a time
    /// in input order. When a sub-resource fails, creation stops (or moves on,
    /// with `batch.continue_on_error`) and the result is
    /// [`ProjectFlowError::PartialBatchFailure`] listing what exists. Nothing
    /// is rolled back.
    pub async fn create_roadmap(
        &self,
        project: CreateProjectInput,
        milestones: Vec<RoadmapMilestoneInput>,
    ) -> Result<RoadmapResult> {
        let project_input = self.resolve_project_input(project);
        let pending = self.preflight_roadmap(&project_input, &milestones)?;
        let keep_going = self.config.batch.continue_on_error;

        let project_id = self
            .external("create_project", self.adapter.create_project(&project_input))
            .await?;
        telemetry::record_created("project");
        info!(project = %project_id, milestones = milestones.len(), "Creating roadmap");

        let mut report = BatchReport::new("create_roadmap");
        report.succeeded.push(ResourceRef::Project(project_id.clone()));

        let project = match self.get_project(&project_id).await {
            Ok(project) => project,
            Err(error) => {
                report.failed.push(BatchFailure {
                    position: BatchPosition::Project,
                    error,
                });
                for (m, entry) in milestones.iter().enumerate() {
                    report.skipped.push(BatchPosition::Milestone(m));
                    report
                        .skipped
                        .extend((0..entry.issues.len()).map(|i| BatchPosition::issue(m, i)));
                }
                return Err(self.partial_failure(report));
            }
        };

        let mut created = Vec::with_capacity(milestones.len());
        let mut halted = false;

        for (m, entry) in milestones.iter().enumerate() {
            if halted {
                report.skipped.push(BatchPosition::Milestone(m));
                report
                    .skipped
                    .extend((0..entry.issues.len()).map(|i| BatchPosition::issue(m, i)));
                continue;
            }

            let milestone_id = match self
                .external(
                    "create_milestone",
                    self.adapter.create_milestone(&project.id, &entry.milestone),
                )
                .await
            {
                Ok(id) => id,
                Err(error) => {
                    warn!(position = %BatchPosition::Milestone(m), error = %error, "Milestone creation failed");
                    report.failed.push(BatchFailure {
                        position: BatchPosition::Milestone(m),
                        error,
                    });
                    report
                        .skipped
                        .extend((0..entry.issues.len()).map(|i| BatchPosition::issue(m, i)));
                    halted = !keep_going;
                    continue;
                }
            };
            telemetry::record_created("milestone");
            info!(project = %project.id, milestone = %milestone_id, "Created milestone");
            report
                .succeeded
                .push(ResourceRef::Milestone(milestone_id.clone()));

            let mut issue_ids = Vec::with_capacity(entry.issues.len());
            for (i, issue_input) in entry.issues.iter().enumerate() {
                let position = BatchPosition::issue(m, i);
                if halted {
                    report.skipped.push(position);
                    continue;
                }

                let mut input = issue_input.clone();
                input.milestone_id = Some(milestone_id.clone());

                let issue_id = match self
                    .external("create_issue", self.adapter.create_issue(&project.id, &input))
                    .await
                {
                    Ok(id) => id,
                    Err(error) => {
                        warn!(position = %position, error = %error, "Issue creation failed");
                        report.failed.push(BatchFailure { position, error });
                        halted = !keep_going;
                        continue;
                    }
                };
                telemetry::record_created("issue");
                info!(milestone = %milestone_id, issue = %issue_id, "Created issue");
                report.succeeded.push(ResourceRef::Issue(issue_id.clone()));
                issue_ids.push(issue_id.clone());

                // The issue exists even when one of its field values could not be set
                if let Err((_, error)) = self.write_fields(&project, &issue_id, &pending[m][i]).await {
                    warn!(position = %position, issue = %issue_id, error = %error, "Setting field values failed");
                    report.failed.push(BatchFailure { position, error });
                    halted = !keep_going;
                }
            }

            created.push(RoadmapMilestone {
                id: milestone_id,
                issues: issue_ids,
            });
        }

        if report.has_failures() {
            return Err(self.partial_failure(report));
        }

        info!(project = %project.id, milestones = created.len(), "Created roadmap");
        Ok(RoadmapResult {
            project,
            milestones: created,
        })
    }

    /// Validate every roadmap input and encode its field values
    ///
    /// Returns encoded values indexed by milestone, then issue.
    fn preflight_roadmap(
        &self,
        project: &CreateProjectInput,
        milestones: &[RoadmapMilestoneInput],
    ) -> Result<Vec<Vec<Vec<PendingField>>>> {
        let mut errors = Vec::new();
        if let Err(e) = validate_project_input(project) {
            errors.extend(e);
        }
        for (m, entry) in milestones.iter().enumerate() {
            let milestone_prefix = BatchPosition::Milestone(m).to_string();
            if let Err(e) = validate_milestone_input(&entry.milestone) {
                errors.extend(prefixed(&milestone_prefix, e));
            }
            for (i, issue) in entry.issues.iter().enumerate() {
                let issue_prefix = BatchPosition::issue(m, i).to_string();
                if let Err(e) = validate_issue_input(issue) {
                    errors.extend(prefixed(&issue_prefix, e));
                }
                if issue.milestone_id.is_some() {
                    errors.push(ValidationError::new(
                        format!("{}.milestone_id", issue_prefix),
                        "is assigned by the roadmap",
                    ));
                }
            }
        }
        if !errors.is_empty() {
            return Err(ProjectFlowError::Validation(errors));
        }

        let fields = project.provisional_fields();
        milestones
            .iter()
            .map(|entry| {
                entry
                    .issues
                    .iter()
                    .map(|issue| encode_assignments(&fields, &issue.field_values))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    fn partial_failure(&self, report: BatchReport) -> ProjectFlowError {
        telemetry::record_partial_batch(&report.operation);
        warn!("{}", report.summary());
        ProjectFlowError::PartialBatchFailure(Box::new(report))
    }

    /// Create a sprint and link existing issues to it
    ///
    /// The sprint is kept even when some issues cannot be linked; each id that
    /// fails to resolve or link is reported with its error. Repeated ids are
    /// linked once.
    pub async fn plan_sprint(
        &self,
        input: CreateSprintInput,
        issue_ids: &[IssueId],
    ) -> Result<SprintPlan> {
        into_result(validate_sprint_input(&input))?;
        if issue_ids.iter().any(|id| id.as_str().trim().is_empty()) {
            return Err(ProjectFlowError::validation(
                "issue_ids",
                "must not contain empty ids",
            ));
        }

        let sprint_id = self
            .external("create_sprint", self.adapter.create_sprint(&input))
            .await?;
        telemetry::record_created("sprint");
        info!(sprint = %sprint_id, issues = issue_ids.len(), "Planning sprint");

        let mut linked = Vec::new();
        let mut failed = Vec::new();
        let mut seen = HashSet::new();

        for issue_id in issue_ids {
            if !seen.insert(issue_id) {
                debug!(issue = %issue_id, "Skipping repeated issue id");
                continue;
            }
            match self.link_issue(&sprint_id, issue_id).await {
                Ok(()) => {
                    telemetry::record_sprint_link(true);
                    linked.push(issue_id.clone());
                }
                Err(error) => {
                    telemetry::record_sprint_link(false);
                    warn!(sprint = %sprint_id, issue = %issue_id, error = %error, "Link failed");
                    failed.push(LinkFailure {
                        issue_id: issue_id.clone(),
                        error,
                    });
                }
            }
        }

        let sprint = self.get_sprint(&sprint_id).await?;
        Ok(SprintPlan {
            sprint,
            linked,
            failed,
        })
    }

    async fn link_issue(&self, sprint: &SprintId, issue: &IssueId) -> Result<()> {
        self.get_resource(&ResourceRef::Issue(issue.clone())).await?;
        self.external(
            "link_issue_to_sprint",
            self.adapter.link_issue_to_sprint(sprint, issue),
        )
        .await
    }

    /// Apply a patch if the resource is still at `expected_version`
    ///
    /// Returns the new version. A stale version fails with
    /// [`ProjectFlowError::VersionConflict`] and changes nothing; re-read the
    /// resource and retry with its current version.
    pub async fn update_resource(
        &self,
        resource: &ResourceRef,
        patch: ResourcePatch,
        expected_version: u64,
    ) -> Result<u64> {
        if patch.kind() != resource.kind() {
            return Err(ProjectFlowError::validation(
                "patch",
                format!("{} patch cannot update {}", patch.kind(), resource),
            ));
        }
        let checks = match &patch {
            ResourcePatch::Project(p) => validate_project_patch(p),
            ResourcePatch::Milestone(p) => validate_milestone_patch(p),
            ResourcePatch::Issue(p) => validate_issue_patch(p),
            ResourcePatch::Sprint(p) => validate_sprint_patch(p),
        };
        into_result(checks)?;

        let snapshot = self.get_resource(resource).await?;
        if snapshot.version != expected_version {
            return Err(self.version_conflict(resource, expected_version, snapshot.version));
        }
        self.check_patch_references(&patch, &snapshot).await?;

        match self
            .adapter
            .update_resource(resource, &patch, expected_version)
            .await
        {
            Ok(version) => {
                info!(resource = %resource, version, "Updated resource");
                Ok(version)
            }
            Err(ProjectFlowError::VersionConflict { actual, .. }) => {
                telemetry::record_adapter_error("update_resource", "version_conflict");
                Err(self.version_conflict(resource, expected_version, actual))
            }
            Err(e) => {
                telemetry::record_adapter_error("update_resource", e.kind());
                Err(e)
            }
        }
    }

    fn version_conflict(&self, resource: &ResourceRef, expected: u64, actual: u64) -> ProjectFlowError {
        telemetry::record_version_conflict(resource.kind().as_str());
        warn!(resource = %resource, expected, actual, "Rejected stale update");
        ProjectFlowError::VersionConflict {
            resource: resource.to_string(),
            expected,
            actual,
        }
    }

    /// References a patch introduces must resolve before anything is written
    async fn check_patch_references(
        &self,
        patch: &ResourcePatch,
        snapshot: &ResourceSnapshot,
    ) -> Result<()> {
        match patch {
            ResourcePatch::Issue(p) => {
                if let Some(milestone) = &p.milestone_id {
                    let issue: Issue = snapshot.decode()?;
                    self.check_milestone(&issue.project_id, milestone).await?;
                }
                Ok(())
            }
            ResourcePatch::Sprint(p) if p.start_date.is_some() || p.end_date.is_some() => {
                let sprint: Sprint = snapshot.decode()?;
                let start = p.start_date.unwrap_or(sprint.start_date);
                let end = p.end_date.unwrap_or(sprint.end_date);
                if start > end {
                    return Err(ProjectFlowError::validation(
                        "start_date",
                        format!("{} is after end date {}", start, end),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{InMemoryAdapter, ResourceKind};
    use crate::model::{CustomFieldInput, FieldType, Status};
    use chrono::NaiveDate;

    fn synchronizer() -> ResourceSynchronizer<InMemoryAdapter> {
        ResourceSynchronizer::new(InMemoryAdapter::new(), ProjectFlowConfig::new("octo"))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_create_project_uses_config_owner() {
        let sync = synchronizer();
        let project = sync
            .create_project(CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();

        assert_eq!(project.owner, "octo");
        assert_eq!(project.status, Status::Active);
        assert_eq!(project.version, 1);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let sync = synchronizer();
        let err = sync
            .create_sprint(CreateSprintInput::new("Backwards", date("2025-02-01"), date("2025-01-01")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectFlowError::Validation(_)));
        assert_eq!(sync.adapter().call_count().await, 0);
    }

    #[tokio::test]
    async fn test_bad_field_value_fails_before_issue_exists() {
        let sync = synchronizer();
        let project = sync
            .create_project(
                CreateProjectInput::new("Roadmap")
                    .with_field(CustomFieldInput::single_select("Priority", ["High", "Low"])),
            )
            .await
            .unwrap();

        let err = sync
            .create_issue(
                &project.id,
                CreateIssueInput::new("Task")
                    .with_field("Priority", FieldValue::SingleSelect("Urgent".into())),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectFlowError::InvalidFieldValue { .. }));
        assert_eq!(sync.adapter().resource_count(ResourceKind::Issue).await, 0);
    }

    #[tokio::test]
    async fn test_issue_field_round_trip() {
        let sync = synchronizer();
        let project = sync
            .create_project(
                CreateProjectInput::new("Roadmap")
                    .with_field(CustomFieldInput::new("Estimate", FieldType::Number)),
            )
            .await
            .unwrap();
        let issue = sync
            .create_issue(
                &project.id,
                CreateIssueInput::new("Task").with_field("Estimate", FieldValue::Number(3.0)),
            )
            .await
            .unwrap();

        assert_eq!(
            sync.get_issue_field(&issue.id, "Estimate").await.unwrap(),
            FieldValue::Number(3.0)
        );

        sync.set_issue_field(&issue.id, "f1", &FieldValue::Number(5.0))
            .await
            .unwrap();
        assert_eq!(
            sync.get_issue_field(&issue.id, "Estimate").await.unwrap(),
            FieldValue::Number(5.0)
        );
    }

    #[tokio::test]
    async fn test_field_assigned_by_id_and_name_is_rejected() {
        let sync = synchronizer();
        let project = sync
            .create_project(
                CreateProjectInput::new("Roadmap")
                    .with_field(CustomFieldInput::new("Estimate", FieldType::Number)),
            )
            .await
            .unwrap();

        let err = sync
            .create_issue(
                &project.id,
                CreateIssueInput::new("Task")
                    .with_field("f1", FieldValue::Number(3.0))
                    .with_field("Estimate", FieldValue::Number(5.0)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectFlowError::Validation(_)));
        assert_eq!(sync.adapter().resource_count(ResourceKind::Issue).await, 0);
    }

    #[tokio::test]
    async fn test_get_milestone_derives_progress() {
        let sync = synchronizer();
        let project = sync
            .create_project(CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();
        let milestone = sync
            .create_milestone(&project.id, CreateMilestoneInput::new("v1"))
            .await
            .unwrap();
        assert_eq!(milestone.progress.total, 0);

        let mut done = CreateIssueInput::new("Done").with_status(Status::Completed);
        done.milestone_id = Some(milestone.id.clone());
        let mut open = CreateIssueInput::new("Open");
        open.milestone_id = Some(milestone.id.clone());
        sync.create_issue(&project.id, done).await.unwrap();
        sync.create_issue(&project.id, open).await.unwrap();

        let read = sync.get_milestone(&milestone.id).await.unwrap();
        assert_eq!(read.progress.complete, 1);
        assert_eq!(read.progress.total, 2);
        assert_eq!(read.progress.percent, 50);
    }

    #[tokio::test]
    async fn test_issue_patch_rejects_missing_milestone() {
        let sync = synchronizer();
        let project = sync
            .create_project(CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();
        let issue = sync
            .create_issue(&project.id, CreateIssueInput::new("Task"))
            .await
            .unwrap();

        let patch = IssuePatch {
            milestone_id: Some(MilestoneId::new("m404")),
            ..Default::default()
        };
        let err = sync.update_issue(&issue.id, patch, 1).await.unwrap_err();

        assert!(matches!(err, ProjectFlowError::Validation(_)));
        let snapshot = sync
            .get_resource(&ResourceRef::Issue(issue.id.clone()))
            .await
            .unwrap();
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn test_sprint_patch_checks_merged_dates() {
        let sync = synchronizer();
        let sprint = sync
            .create_sprint(CreateSprintInput::new("Sprint 1", date("2025-01-01"), date("2025-01-14")))
            .await
            .unwrap();

        let patch = SprintPatch {
            start_date: Some(date("2025-01-20")),
            ..Default::default()
        };
        let err = sync.update_sprint(&sprint.id, patch, 1).await.unwrap_err();
        assert!(matches!(err, ProjectFlowError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mismatched_patch_kind() {
        let sync = synchronizer();
        let err = sync
            .update_resource(
                &ResourceRef::Issue(IssueId::new("i1")),
                ResourcePatch::Sprint(SprintPatch {
                    title: Some("x".into()),
                    ..Default::default()
                }),
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectFlowError::Validation(_)));
    }

    #[tokio::test]
    async fn test_roadmap_rejects_preset_milestone() {
        let sync = synchronizer();
        let mut issue = CreateIssueInput::new("Task");
        issue.milestone_id = Some(MilestoneId::new("m1"));

        let err = sync
            .create_roadmap(
                CreateProjectInput::new("Roadmap"),
                vec![RoadmapMilestoneInput::new(CreateMilestoneInput::new("v1")).with_issue(issue)],
            )
            .await
            .unwrap_err();

        match err {
            ProjectFlowError::Validation(errors) => {
                assert_eq!(errors[0].field, "milestones[0].issues[0].milestone_id");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sync.adapter().call_count().await, 0);
    }
}
