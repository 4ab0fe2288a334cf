//! Issue data structure

use super::{IssueId, LabelId, MilestoneId, ProjectId, Status, UserId};
use chrono::{DateTime, Utc};
use fieldcodec::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An issue tracked in a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub project_id: ProjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub assignees: BTreeSet<UserId>,
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,

    /// Weak reference; resolves to an existing milestone when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<MilestoneId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A custom field value to set on a newly created issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssignment {
    /// Field id, or field name when the id is not known yet
    pub field: String,
    pub value: FieldValue,
}

impl FieldAssignment {
    pub fn new(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Input for creating an issue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIssueInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignees: Vec<UserId>,
    #[serde(default)]
    pub labels: Vec<LabelId>,
    #[serde(default)]
    pub milestone_id: Option<MilestoneId>,
    #[serde(default)]
    pub field_values: Vec<FieldAssignment>,
}

impl CreateIssueInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_assignee(mut self, user: impl Into<UserId>) -> Self {
        self.assignees.push(user.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<LabelId>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.field_values.push(FieldAssignment::new(field, value));
        self
    }
}

/// Partial update of an issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<UserId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<LabelId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<MilestoneId>,
    /// Detach the issue from its milestone
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear_milestone: bool,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignees.is_none()
            && self.labels.is_none()
            && self.milestone_id.is_none()
            && !self.clear_milestone
    }
}
