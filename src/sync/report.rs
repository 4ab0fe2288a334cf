//! Results of multi-resource operations

use crate::adapter::ResourceRef;
use crate::model::{
    CreateIssueInput, CreateMilestoneInput, IssueId, MilestoneId, Project, Sprint,
};
use crate::ProjectFlowError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A milestone to create in a roadmap, with its nested issues
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadmapMilestoneInput {
    #[serde(flatten)]
    pub milestone: CreateMilestoneInput,

    /// Created in order, each linked to the new milestone
    #[serde(default)]
    pub issues: Vec<CreateIssueInput>,
}

impl RoadmapMilestoneInput {
    pub fn new(milestone: CreateMilestoneInput) -> Self {
        Self {
            milestone,
            issues: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: CreateIssueInput) -> Self {
        self.issues.push(issue);
        self
    }
}

/// A milestone created by a roadmap, with the ids of its issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapMilestone {
    pub id: MilestoneId,
    pub issues: Vec<IssueId>,
}

/// A fully created roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapResult {
    pub project: Project,
    pub milestones: Vec<RoadmapMilestone>,
}

/// Input position of a sub-resource within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPosition {
    Project,
    Milestone(usize),
    Issue { milestone: usize, issue: usize },
    /// Index into an issue's `field_values`
    Field(usize),
}

impl BatchPosition {
    pub fn issue(milestone: usize, issue: usize) -> Self {
        BatchPosition::Issue { milestone, issue }
    }
}

impl fmt::Display for BatchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchPosition::Project => write!(f, "project"),
            BatchPosition::Milestone(index) => write!(f, "milestones[{}]", index),
            BatchPosition::Issue { milestone, issue } => {
                write!(f, "milestones[{}].issues[{}]", milestone, issue)
            }
            BatchPosition::Field(index) => write!(f, "field_values[{}]", index),
        }
    }
}

/// A sub-resource that could not be created
#[derive(Debug)]
pub struct BatchFailure {
    pub position: BatchPosition,
    pub error: ProjectFlowError,
}

/// What a partially failed batch did and did not create
///
/// Created resources are not rolled back. Retry the failed positions using
/// the ids in `succeeded` (parent ids stay valid across retries; input
/// positions do not once earlier items are dropped).
#[derive(Debug, Default)]
pub struct BatchReport {
    pub operation: String,
    /// Created resources, in creation order
    pub succeeded: Vec<ResourceRef>,
    pub failed: Vec<BatchFailure>,
    /// Positions never attempted
    pub skipped: Vec<BatchPosition>,
}

impl BatchReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Input positions that failed, in the order they were attempted
    pub fn failed_positions(&self) -> Vec<BatchPosition> {
        self.failed.iter().map(|f| f.position).collect()
    }

    pub fn summary(&self) -> String {
        let failures = self
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.position, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        format!(
            "{} partially failed: {} created, {} failed ({}), {} skipped",
            self.operation,
            self.succeeded.len(),
            self.failed.len(),
            failures,
            self.skipped.len()
        )
    }
}

/// An issue id that could not be linked to a sprint
#[derive(Debug)]
pub struct LinkFailure {
    pub issue_id: IssueId,
    pub error: ProjectFlowError,
}

/// Outcome of planning a sprint
#[derive(Debug)]
pub struct SprintPlan {
    pub sprint: Sprint,
    /// Linked issue ids, in request order
    pub linked: Vec<IssueId>,
    pub failed: Vec<LinkFailure>,
}

impl SprintPlan {
    /// Every requested issue was linked
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
