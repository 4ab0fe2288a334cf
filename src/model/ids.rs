//! Type-safe ID wrappers for resources and their references
//!
//! Weak references (issue to milestone, sprint to issue) are stored as these
//! plain identifiers and resolved through an explicit lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

define_id!(
    /// Identifier of a project
    ProjectId
);
define_id!(
    /// Identifier of a milestone
    MilestoneId
);
define_id!(
    /// Identifier of an issue
    IssueId
);
define_id!(
    /// Identifier of a sprint
    SprintId
);
define_id!(
    /// Identifier of a custom field, unique within its project
    FieldId
);
define_id!(
    /// Identifier of a project view, unique within its project
    ViewId
);
define_id!(
    /// Reference to a user (login or node id)
    UserId
);
define_id!(
    /// Reference to a label (name or node id)
    LabelId
);
