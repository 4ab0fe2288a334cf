//! Domain model
//!
//! Defines Project, Milestone, Issue, Sprint and their inputs, patches and
//! validation rules. Custom field definitions and values come from the
//! `fieldcodec` crate.

mod ids;
mod issue;
mod milestone;
mod project;
mod sprint;
mod status;
pub mod validation;

pub use fieldcodec::{CustomField, FieldType, FieldValue, NamedRef, SingleSelectOption};
pub use ids::{FieldId, IssueId, LabelId, MilestoneId, ProjectId, SprintId, UserId, ViewId};
pub use issue::{CreateIssueInput, FieldAssignment, Issue, IssuePatch};
pub use milestone::{CreateMilestoneInput, Milestone, MilestonePatch, Progress};
pub use project::{
    CreateProjectInput, CustomFieldInput, Project, ProjectPatch, ProjectView, ProjectViewInput,
    SortDirection, SortSpec, ViewLayout, ViewSettings, Visibility,
};
pub use sprint::{CreateSprintInput, Sprint, SprintPatch};
pub use status::Status;
pub use validation::{ValidationError, ValidationResult};
