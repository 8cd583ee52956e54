use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field-level validation failure.
///
/// `path` addresses the offending value inside the edit batch wire form,
/// e.g. `changes[1].inputs.fields[0].name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Render an issue list one per line, in order.
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Internal invariant violation raised by the patch engine.
///
/// The patch engine only accepts batches that already passed validation.
/// Any of these errors means a caller skipped that step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("patch engine invoked with an empty edit batch")]
    EmptyBatch,

    #[error("patch engine invoked with an unvalidated batch (edit {index}): {}", format_issues(.issues))]
    Unvalidated {
        index: usize,
        issues: Vec<ValidationIssue>,
    },

    #[error("patch target not found: {0}")]
    MissingTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display_is_path_then_message() {
        let issue = ValidationIssue::new("changes[0].class_name", "class UserService already exists");
        assert_eq!(
            issue.to_string(),
            "changes[0].class_name: class UserService already exists"
        );
    }

    #[test]
    fn unvalidated_error_lists_issues() {
        let err = PatchError::Unvalidated {
            index: 2,
            issues: vec![ValidationIssue::new("changes[2]", "bad")],
        };
        assert_eq!(
            err.to_string(),
            "patch engine invoked with an unvalidated batch (edit 2): changes[2]: bad"
        );
    }
}
