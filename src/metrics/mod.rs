//! Progress and sprint metrics
//!
//! Everything here is derived from issue statuses at read time; nothing is
//! stored. An issue counts as closed when its status is COMPLETED or ARCHIVED.

use crate::adapter::{ProjectAdapter, ResourceRef};
use crate::model::{Issue, IssueId, Milestone, MilestoneId, Progress, Sprint, SprintId, Status};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rounded share of closed issues, 0 when there are none
pub fn completion_percentage(closed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (closed as f64 * 100.0 / total as f64).round() as u32
}

impl Progress {
    /// Summarize a set of issue statuses
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a Status>,
    {
        let (complete, total) = statuses
            .into_iter()
            .fold((0, 0), |(closed, total), status| {
                (closed + usize::from(status.is_closed()), total + 1)
            });
        Self {
            percent: completion_percentage(complete, total),
            complete,
            total,
        }
    }
}

/// One issue as listed in sprint metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: IssueId,
    pub title: String,
    pub status: Status,
}

/// Completion metrics for a sprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintMetrics {
    pub sprint_id: SprintId,
    pub title: String,
    pub status: Status,
    pub total_issues: usize,
    pub open_issues: usize,
    pub closed_issues: usize,
    pub completion_percentage: u32,

    /// Linked issues in sprint order, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<IssueSummary>>,
}

impl SprintMetrics {
    /// Compute metrics from a sprint and its linked issues
    pub fn from_issues(sprint: &Sprint, issues: &[Issue], include_issues: bool) -> Self {
        let progress = Progress::from_statuses(issues.iter().map(|i| &i.status));
        Self {
            sprint_id: sprint.id.clone(),
            title: sprint.title.clone(),
            status: sprint.status,
            total_issues: progress.total,
            open_issues: progress.total - progress.complete,
            closed_issues: progress.complete,
            completion_percentage: progress.percent,
            issues: include_issues.then(|| {
                issues
                    .iter()
                    .map(|i| IssueSummary {
                        id: i.id.clone(),
                        title: i.title.clone(),
                        status: i.status,
                    })
                    .collect()
            }),
        }
    }
}

/// Reads sprints, milestones and issues through an adapter and summarizes them
pub struct MetricsEngine<'a, A> {
    adapter: &'a A,
}

impl<'a, A: ProjectAdapter> MetricsEngine<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    async fn issue(&self, id: &IssueId) -> Result<Issue> {
        self.adapter
            .get_resource(&ResourceRef::Issue(id.clone()))
            .await?
            .decode()
    }

    /// Completion metrics over every issue linked to the sprint
    pub async fn sprint_metrics(&self, id: &SprintId, include_issues: bool) -> Result<SprintMetrics> {
        let sprint: Sprint = self
            .adapter
            .get_resource(&ResourceRef::Sprint(id.clone()))
            .await?
            .decode()?;

        let mut issues = Vec::with_capacity(sprint.issues.len());
        for issue_id in &sprint.issues {
            issues.push(self.issue(issue_id).await?);
        }

        let metrics = SprintMetrics::from_issues(&sprint, &issues, include_issues);
        debug!(
            sprint = %id,
            total = metrics.total_issues,
            closed = metrics.closed_issues,
            "Computed sprint metrics"
        );
        Ok(metrics)
    }

    /// Progress over the issues of the milestone's project that reference it
    pub async fn milestone_progress(&self, id: &MilestoneId) -> Result<Progress> {
        let milestone = self.milestone(id).await?;
        self.progress_of(&milestone).await
    }

    /// The milestone with its `progress` recomputed
    pub async fn milestone_with_progress(&self, id: &MilestoneId) -> Result<Milestone> {
        let mut milestone = self.milestone(id).await?;
        milestone.progress = self.progress_of(&milestone).await?;
        Ok(milestone)
    }

    async fn milestone(&self, id: &MilestoneId) -> Result<Milestone> {
        self.adapter
            .get_resource(&ResourceRef::Milestone(id.clone()))
            .await?
            .decode()
    }

    async fn progress_of(&self, milestone: &Milestone) -> Result<Progress> {
        let mut statuses = Vec::new();
        for issue_id in self.adapter.list_project_issues(&milestone.project_id).await? {
            let issue = self.issue(&issue_id).await?;
            if issue.milestone_id.as_ref() == Some(&milestone.id) {
                statuses.push(issue.status);
            }
        }
        Ok(Progress::from_statuses(&statuses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{InMemoryAdapter, ResourcePatch};
    use crate::model::{
        CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, IssuePatch,
    };
    use chrono::NaiveDate;

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(1, 2), 50);
        assert_eq!(completion_percentage(4, 4), 100);
    }

    #[test]
    fn test_progress_counts_archived_as_closed() {
        let progress =
            Progress::from_statuses(&[Status::Active, Status::Archived, Status::Planned]);
        assert_eq!(progress.complete, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percent, 33);
    }

    #[test]
    fn test_sprint_metrics_serialization() {
        let sprint: Sprint = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "title": "Sprint 1",
            "start_date": "2025-01-01",
            "end_date": "2025-01-14",
            "status": "ACTIVE",
            "issues": [],
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();

        let metrics = SprintMetrics::from_issues(&sprint, &[], false);
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["sprintId"], "s1");
        assert_eq!(json["totalIssues"], 0);
        assert_eq!(json["completionPercentage"], 0);
        assert!(json.get("issues").is_none());
    }

    #[tokio::test]
    async fn test_milestone_progress_only_counts_its_issues() {
        let adapter = InMemoryAdapter::new();
        let project = adapter
            .create_project(&CreateProjectInput::new("Roadmap"))
            .await
            .unwrap();
        let milestone = adapter
            .create_milestone(&project, &CreateMilestoneInput::new("v1"))
            .await
            .unwrap();

        let mut linked = CreateIssueInput::new("Linked");
        linked.milestone_id = Some(milestone.clone());
        let done = adapter.create_issue(&project, &linked).await.unwrap();
        adapter.create_issue(&project, &linked).await.unwrap();
        adapter
            .create_issue(&project, &CreateIssueInput::new("Unrelated"))
            .await
            .unwrap();

        adapter
            .update_resource(
                &ResourceRef::Issue(done),
                &ResourcePatch::Issue(IssuePatch {
                    status: Some(Status::Completed),
                    ..Default::default()
                }),
                1,
            )
            .await
            .unwrap();

        let engine = MetricsEngine::new(&adapter);
        let progress = engine.milestone_progress(&milestone).await.unwrap();
        assert_eq!(progress, Progress { percent: 50, complete: 1, total: 2 });

        let with_progress = engine.milestone_with_progress(&milestone).await.unwrap();
        assert_eq!(with_progress.progress.percent, 50);
    }

    #[tokio::test]
    async fn test_empty_sprint_metrics() {
        let adapter = InMemoryAdapter::new();
        let sprint = adapter
            .create_sprint(&CreateSprintInput::new(
                "Sprint 1",
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
            ))
            .await
            .unwrap();

        let metrics = MetricsEngine::new(&adapter)
            .sprint_metrics(&sprint, true)
            .await
            .unwrap();
        assert_eq!(metrics.total_issues, 0);
        assert_eq!(metrics.completion_percentage, 0);
        assert_eq!(metrics.issues, Some(Vec::new()));
    }
}
