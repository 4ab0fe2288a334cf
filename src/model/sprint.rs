//! Sprint data structure

use super::{IssueId, SprintId, Status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A time-boxed iteration with linked issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: SprintId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Status,

    /// Linked issues in link order, without duplicates
    #[serde(default)]
    pub issues: Vec<IssueId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a sprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSprintInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: Option<Status>,
}

impl CreateSprintInput {
    pub fn new(title: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_date,
            end_date,
            status: None,
        }
    }
}

/// Partial update of a sprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl SprintPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
    }
}
