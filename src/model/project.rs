//! Project, its custom fields and views

use super::{ProjectId, Status, ViewId};
use chrono::{DateTime, Utc};
use fieldcodec::{CustomField, FieldType};
use serde::{Deserialize, Serialize};

/// Project visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// How a view lays out its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewLayout {
    #[default]
    Board,
    Table,
    Roadmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort key of a view, by field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// View settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Name of the custom field items are grouped by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<SortSpec>,
}

/// A saved view over a project's items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: ViewId,
    pub name: String,
    pub layout: ViewLayout,
    #[serde(default)]
    pub settings: ViewSettings,
}

/// A project owning its views and custom fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: String,
    pub visibility: Visibility,
    pub status: Status,

    /// Optimistic concurrency counter, bumped by one on every update
    pub version: u64,

    /// Views in display order
    #[serde(default)]
    pub views: Vec<ProjectView>,

    #[serde(default)]
    pub fields: Vec<CustomField>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Look up a custom field by id, falling back to its name
    pub fn resolve_field(&self, key: &str) -> Option<&CustomField> {
        self.fields
            .iter()
            .find(|f| f.id == key)
            .or_else(|| self.fields.iter().find(|f| f.name == key))
    }
}

/// Declaration of a custom field to create with a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldInput {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
}

impl CustomFieldInput {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            options: Vec::new(),
        }
    }

    pub fn single_select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            field_type: FieldType::SingleSelect,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Materialize as a field definition with the given id
    pub fn to_field(&self, id: impl Into<String>) -> CustomField {
        match self.field_type {
            FieldType::SingleSelect => {
                CustomField::single_select(id, self.name.clone(), self.options.iter().cloned())
            }
            other => CustomField::new(id, self.name.clone(), other),
        }
    }
}

/// Declaration of a view to create with a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectViewInput {
    pub name: String,
    #[serde(default)]
    pub layout: ViewLayout,
    #[serde(default)]
    pub settings: ViewSettings,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Empty means the configured default owner
    #[serde(default)]
    pub owner: String,
    /// `None` means the configured default visibility
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub fields: Vec<CustomFieldInput>,
    #[serde(default)]
    pub views: Vec<ProjectViewInput>,
}

impl CreateProjectInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: CustomFieldInput) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_view(mut self, view: ProjectViewInput) -> Self {
        self.views.push(view);
        self
    }

    /// Field definitions as they will exist once created, with placeholder ids
    pub fn provisional_fields(&self) -> Vec<CustomField> {
        self.fields.iter().map(|f| f.to_field(String::new())).collect()
    }
}

/// Partial update of a project. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.visibility.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_input_materializes_options_in_order() {
        let input = CustomFieldInput::single_select("Priority", ["High", "Medium", "Low"]);
        let field = input.to_field("f1");
        assert_eq!(field.id, "f1");
        assert_eq!(field.field_type, FieldType::SingleSelect);
        let names: Vec<_> = field.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Medium", "Low"]);
    }

    #[test]
    fn test_resolve_field_by_id_or_name() {
        let now = Utc::now();
        let project = Project {
            id: ProjectId::new("p1"),
            title: "Roadmap".into(),
            description: None,
            owner: "octo".into(),
            visibility: Visibility::Private,
            status: Status::Active,
            version: 1,
            views: Vec::new(),
            fields: vec![CustomField::new("f1", "Estimate", FieldType::Number)],
            created_at: now,
            updated_at: now,
        };

        assert!(project.resolve_field("f1").is_some());
        assert!(project.resolve_field("Estimate").is_some());
        assert!(project.resolve_field("Missing").is_none());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ProjectPatch::default().is_empty());
        let patch = ProjectPatch {
            visibility: Some(Visibility::Public),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
