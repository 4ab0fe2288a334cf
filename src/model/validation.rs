//! Input validation
//!
//! Validates create inputs and patches before anything reaches an adapter:
//! - Titles are not blank
//! - Sprint start date is not after its end date
//! - Custom field and view names are unique, options fit the field type
//! - Views only group or sort by declared fields
//!
//! Every problem is collected rather than stopping at the first one.

use super::{
    CreateIssueInput, CreateMilestoneInput, CreateProjectInput, CreateSprintInput, IssuePatch,
    MilestonePatch, ProjectPatch, SprintPatch,
};
use crate::ProjectFlowError;
use fieldcodec::FieldType;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Convert a validation result into the crate error type
pub fn into_result(result: ValidationResult) -> crate::Result<()> {
    result.map_err(ProjectFlowError::Validation)
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_title(errors: &mut Vec<ValidationError>, field: &str, title: &str) {
    if title.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    }
}

fn check_patch_title(errors: &mut Vec<ValidationError>, title: &Option<String>) {
    if let Some(title) = title {
        check_title(errors, "title", title);
    }
}

/// Validate a project input (owner must already be resolved)
pub fn validate_project_input(input: &CreateProjectInput) -> ValidationResult {
    let mut errors = Vec::new();

    check_title(&mut errors, "title", &input.title);
    if input.owner.trim().is_empty() {
        errors.push(ValidationError::new("owner", "must not be empty"));
    }

    let mut field_names = HashSet::new();
    for (i, field) in input.fields.iter().enumerate() {
        let path = format!("fields[{}]", i);
        if field.name.trim().is_empty() {
            errors.push(ValidationError::new(&path, "field name must not be empty"));
        } else if !field_names.insert(field.name.as_str()) {
            errors.push(ValidationError::new(
                &path,
                format!("duplicate field name '{}'", field.name),
            ));
        }

        match field.field_type {
            FieldType::SingleSelect => {
                if field.options.is_empty() {
                    errors.push(ValidationError::new(
                        &path,
                        "single-select field needs at least one option",
                    ));
                }
                let mut seen = HashSet::new();
                for option in &field.options {
                    if option.trim().is_empty() {
                        errors.push(ValidationError::new(&path, "option names must not be empty"));
                    } else if !seen.insert(option.as_str()) {
                        errors.push(ValidationError::new(
                            &path,
                            format!("duplicate option '{}'", option),
                        ));
                    }
                }
            }
            other if !field.options.is_empty() => {
                errors.push(ValidationError::new(
                    &path,
                    format!("{} fields do not take options", other),
                ));
            }
            _ => {}
        }
    }

    let mut view_names = HashSet::new();
    for (i, view) in input.views.iter().enumerate() {
        let path = format!("views[{}]", i);
        if view.name.trim().is_empty() {
            errors.push(ValidationError::new(&path, "view name must not be empty"));
        } else if !view_names.insert(view.name.as_str()) {
            errors.push(ValidationError::new(
                &path,
                format!("duplicate view name '{}'", view.name),
            ));
        }

        if let Some(group_by) = &view.settings.group_by {
            if !field_names.contains(group_by.as_str()) {
                errors.push(ValidationError::new(
                    &path,
                    format!("group_by references unknown field '{}'", group_by),
                ));
            }
        }
        for sort in &view.settings.sort_by {
            if !field_names.contains(sort.field.as_str()) {
                errors.push(ValidationError::new(
                    &path,
                    format!("sort_by references unknown field '{}'", sort.field),
                ));
            }
        }
    }

    finish(errors)
}

pub fn validate_milestone_input(input: &CreateMilestoneInput) -> ValidationResult {
    let mut errors = Vec::new();
    check_title(&mut errors, "title", &input.title);
    finish(errors)
}

pub fn validate_issue_input(input: &CreateIssueInput) -> ValidationResult {
    let mut errors = Vec::new();
    check_title(&mut errors, "title", &input.title);

    if input.assignees.iter().any(|a| a.as_str().trim().is_empty()) {
        errors.push(ValidationError::new("assignees", "user ids must not be empty"));
    }
    if input.labels.iter().any(|l| l.as_str().trim().is_empty()) {
        errors.push(ValidationError::new("labels", "label ids must not be empty"));
    }

    let mut assigned = HashSet::new();
    for assignment in &input.field_values {
        if assignment.field.trim().is_empty() {
            errors.push(ValidationError::new("field_values", "field must not be empty"));
        } else if !assigned.insert(assignment.field.as_str()) {
            errors.push(ValidationError::new(
                "field_values",
                format!("field '{}' assigned more than once", assignment.field),
            ));
        }
    }

    finish(errors)
}

pub fn validate_sprint_input(input: &CreateSprintInput) -> ValidationResult {
    let mut errors = Vec::new();
    check_title(&mut errors, "title", &input.title);
    if input.start_date > input.end_date {
        errors.push(ValidationError::new(
            "end_date",
            "must not be before start_date",
        ));
    }
    finish(errors)
}

pub fn validate_project_patch(patch: &ProjectPatch) -> ValidationResult {
    let mut errors = Vec::new();
    if patch.is_empty() {
        errors.push(ValidationError::new("patch", "no changes requested"));
    }
    check_patch_title(&mut errors, &patch.title);
    finish(errors)
}

pub fn validate_milestone_patch(patch: &MilestonePatch) -> ValidationResult {
    let mut errors = Vec::new();
    if patch.is_empty() {
        errors.push(ValidationError::new("patch", "no changes requested"));
    }
    check_patch_title(&mut errors, &patch.title);
    finish(errors)
}

pub fn validate_issue_patch(patch: &IssuePatch) -> ValidationResult {
    let mut errors = Vec::new();
    if patch.is_empty() {
        errors.push(ValidationError::new("patch", "no changes requested"));
    }
    check_patch_title(&mut errors, &patch.title);
    if patch.clear_milestone && patch.milestone_id.is_some() {
        errors.push(ValidationError::new(
            "milestone_id",
            "cannot both set and clear the milestone",
        ));
    }
    finish(errors)
}

/// Date ordering is checked once the patch is merged with current data
pub fn validate_sprint_patch(patch: &SprintPatch) -> ValidationResult {
    let mut errors = Vec::new();
    if patch.is_empty() {
        errors.push(ValidationError::new("patch", "no changes requested"));
    }
    check_patch_title(&mut errors, &patch.title);
    if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
        if start > end {
            errors.push(ValidationError::new(
                "end_date",
                "must not be before start_date",
            ));
        }
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomFieldInput, ProjectViewInput, SortSpec, ViewLayout, ViewSettings};
    use chrono::NaiveDate;

    fn project_input() -> CreateProjectInput {
        let mut input = CreateProjectInput::new("Roadmap");
        input.owner = "octo".into();
        input
    }

    #[test]
    fn test_valid_project() {
        let input = project_input()
            .with_field(CustomFieldInput::single_select("Status", ["Todo", "Done"]))
            .with_view(ProjectViewInput {
                name: "Board".into(),
                layout: ViewLayout::Board,
                settings: ViewSettings {
                    group_by: Some("Status".into()),
                    sort_by: Vec::new(),
                },
            });
        assert!(validate_project_input(&input).is_ok());
    }

    #[test]
    fn test_project_collects_every_problem() {
        let mut input = project_input()
            .with_field(CustomFieldInput::new("Estimate", FieldType::Number))
            .with_field(CustomFieldInput::new("Estimate", FieldType::Text))
            .with_field(CustomFieldInput::single_select("Status", Vec::<String>::new()))
            .with_view(ProjectViewInput {
                name: "Table".into(),
                layout: ViewLayout::Table,
                settings: ViewSettings {
                    group_by: Some("Team".into()),
                    sort_by: vec![SortSpec {
                        field: "Size".into(),
                        direction: Default::default(),
                    }],
                },
            });
        input.title = "  ".into();

        let errors = validate_project_input(&input).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0].field, "title");
    }

    #[test]
    fn test_options_only_on_single_select() {
        let mut field = CustomFieldInput::new("Notes", FieldType::Text);
        field.options.push("a".into());
        let input = project_input().with_field(field);
        assert!(validate_project_input(&input).is_err());
    }

    #[test]
    fn test_sprint_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let errors = validate_sprint_input(&CreateSprintInput::new("S", start, end)).unwrap_err();
        assert_eq!(errors[0].field, "end_date");

        assert!(validate_sprint_input(&CreateSprintInput::new("S", end, end)).is_ok());
    }

    #[test]
    fn test_empty_patches_are_rejected() {
        assert!(validate_project_patch(&ProjectPatch::default()).is_err());
        assert!(validate_issue_patch(&IssuePatch::default()).is_err());

        let patch = IssuePatch {
            title: Some("".into()),
            ..Default::default()
        };
        assert!(validate_issue_patch(&patch).is_err());
    }

    #[test]
    fn test_duplicate_field_assignment() {
        let input = CreateIssueInput::new("Fix login")
            .with_field("Estimate", fieldcodec::FieldValue::Number(1.0))
            .with_field("Estimate", fieldcodec::FieldValue::Number(2.0));
        assert!(validate_issue_input(&input).is_err());
    }
}
