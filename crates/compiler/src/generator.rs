//! Generator abstraction: the boundary to the external model that turns an
//! instruction into candidate edit-batch text.

use std::sync::Arc;

use async_trait::async_trait;
use specledger_core::ValidationIssue;

use crate::error::GeneratorError;

/// What the generator is told for one round trip.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    /// Compact view of the specification the batch will be validated against.
    pub spec_view: String,
    /// Present on repair round trips.
    pub repair: Option<RepairContext>,
}

/// The rejected output and exactly why it was rejected.
#[derive(Debug, Clone)]
pub struct RepairContext {
    pub previous_output: String,
    pub errors: Vec<ValidationIssue>,
}

impl GenerationRequest {
    /// A first-draft request.
    pub fn draft(instruction: &str, spec_view: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            spec_view: spec_view.to_string(),
            repair: None,
        }
    }

    /// A repair request carrying the previous output and its errors.
    pub fn repair(
        instruction: &str,
        spec_view: &str,
        previous_output: &str,
        errors: &[ValidationIssue],
    ) -> Self {
        Self {
            instruction: instruction.to_string(),
            spec_view: spec_view.to_string(),
            repair: Some(RepairContext {
                previous_output: previous_output.to_string(),
                errors: errors.to_vec(),
            }),
        }
    }

    pub fn is_repair(&self) -> bool {
        self.repair.is_some()
    }
}

/// Produces raw candidate text for a [`GenerationRequest`].
///
/// Output is untrusted: callers only ever parse it as edit-batch JSON.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        (**self).generate(request).await
    }
}

/// Stand-in for callers that only ingest ready-made batches; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGenerator;

#[async_trait]
impl Generator for NoGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GeneratorError> {
        Err(GeneratorError::Config(
            "no generator configured; only ready-made edit batches can be ingested".to_string(),
        ))
    }
}
