//! Lifecycle status shared by every resource

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource status
///
/// Resources are never physically deleted; they are archived instead.
/// External "CLOSED" states map onto `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Planned,
    Active,
    #[serde(alias = "CLOSED")]
    Completed,
    Archived,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Planned => "PLANNED",
            Status::Active => "ACTIVE",
            Status::Completed => "COMPLETED",
            Status::Archived => "ARCHIVED",
        }
    }

    /// Completed and archived resources count as closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Status::Completed | Status::Archived)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = crate::ProjectFlowError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(Status::Planned),
            "ACTIVE" | "IN_PROGRESS" => Ok(Status::Active),
            "COMPLETED" | "CLOSED" | "DONE" => Ok(Status::Completed),
            "ARCHIVED" => Ok(Status::Archived),
            _ => Err(crate::ProjectFlowError::validation(
                "status",
                format!("unknown status '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_states() {
        assert!(!Status::Planned.is_closed());
        assert!(!Status::Active.is_closed());
        assert!(Status::Completed.is_closed());
        assert!(Status::Archived.is_closed());
    }

    #[test]
    fn test_external_closed_alias() {
        let status: Status = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(status, Status::Completed);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"COMPLETED\"");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("active".parse::<Status>().unwrap(), Status::Active);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Completed);
        assert!("paused".parse::<Status>().is_err());
    }
}
