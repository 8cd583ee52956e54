use serde::Serialize;
use specledger_core::{format_issues, ValidationIssue};
use specledger_storage::StoreError;

/// Failure talking to the external generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The API call failed (network, auth, rate limit).
    #[error("API error: {0}")]
    Api(String),
    /// The API answered but the response could not be read.
    #[error("parse error: {0}")]
    Parse(String),
    /// The generator is not configured (e.g. no API key).
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why an ingest did not reach APPLIED.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A directly supplied batch is not a well-formed edit batch.
    #[error("malformed edit batch:\n{}", format_issues(.0))]
    MalformedInput(Vec<ValidationIssue>),

    /// A directly supplied batch failed validation.
    #[error("validation failed:\n{}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// The generator never produced a valid batch within the repair bound.
    #[error(
        "no valid edit batch for instruction {instruction:?} after {attempts} repair attempt(s):\n{}",
        format_issues(.errors)
    )]
    RepairExhausted {
        instruction: String,
        attempts: u32,
        errors: Vec<ValidationIssue>,
        last_output: String,
    },

    /// Another commit or rollback landed while the batch was being produced.
    #[error(
        "stale base: expected generation {expected}, store is at generation {found}; retry against the latest specification"
    )]
    Conflict { expected: u64, found: u64 },

    #[error("generator failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CompileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(issues) => CompileError::Validation(issues),
            StoreError::Conflict { expected, found } => CompileError::Conflict { expected, found },
            other => CompileError::Store(other),
        }
    }
}

/// Stable, serializable classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedInput,
    Validation,
    RepairExhausted,
    Conflict,
    Generator,
    Corruption,
    /// The patch engine rejected a validated batch.
    Internal,
    Storage,
}

impl CompileError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompileError::MalformedInput(_) => FailureKind::MalformedInput,
            CompileError::Validation(_) => FailureKind::Validation,
            CompileError::RepairExhausted { .. } => FailureKind::RepairExhausted,
            CompileError::Conflict { .. } => FailureKind::Conflict,
            CompileError::Generator(_) => FailureKind::Generator,
            CompileError::Store(StoreError::Corruption(_)) => FailureKind::Corruption,
            CompileError::Store(StoreError::Patch(_)) => FailureKind::Internal,
            CompileError::Store(_) => FailureKind::Storage,
        }
    }

    /// Field-level errors carried by this failure, if any.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            CompileError::MalformedInput(issues) | CompileError::Validation(issues) => issues,
            CompileError::RepairExhausted { errors, .. } => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_validation_maps_to_validation() {
        let issues = vec![ValidationIssue::new("changes[0]", "class A already exists")];
        let err = CompileError::from(StoreError::Validation(issues.clone()));
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(err.issues(), issues.as_slice());
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = CompileError::from(StoreError::Conflict {
            expected: 1,
            found: 2,
        });
        assert_eq!(err.kind(), FailureKind::Conflict);
        assert!(err.to_string().contains("retry"));
    }

    #[test]
    fn corruption_keeps_its_own_kind() {
        let err = CompileError::from(StoreError::Corruption("bad".to_string()));
        assert_eq!(err.kind(), FailureKind::Corruption);
        assert!(err.issues().is_empty());
    }

    #[test]
    fn exhausted_message_names_instruction_and_errors() {
        let err = CompileError::RepairExhausted {
            instruction: "add a class".to_string(),
            attempts: 2,
            errors: vec![ValidationIssue::new("$", "expected value")],
            last_output: "nope".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"add a class\""), "{}", msg);
        assert!(msg.contains("after 2 repair attempt(s)"), "{}", msg);
        assert!(msg.contains("$: expected value"), "{}", msg);
    }
}
