use specledger_core::{parse_batch, validate, EditBatch, Specification, ValidationIssue};

use crate::error::{CompileError, GeneratorError};
use crate::extract::extract_batch_json;
use crate::generator::{GenerationRequest, Generator};
use crate::phase::{IngestPhase, Trace};

/// Decode raw generator text and validate it against `spec`.
///
/// A parse failure and a validation failure look the same to the caller:
/// a list of issues to send back for repair.
pub fn evaluate(spec: &Specification, raw: &str) -> Result<EditBatch, Vec<ValidationIssue>> {
    let batch = parse_batch(extract_batch_json(raw)).map_err(|e| e.issues())?;
    validate(spec, &batch)?;
    Ok(batch)
}

/// A batch the repair loop accepted.
#[derive(Debug, Clone)]
pub struct Repaired {
    pub batch: EditBatch,
    /// Round trips it took, `1..=max_attempts`.
    pub attempts: u32,
}

/// Sole owner of the external generator.
///
/// Produces first drafts and runs the bounded repair loop. It never reads
/// or writes the version store; callers hand it the specification to
/// validate against.
pub struct RepairCoordinator<G> {
    generator: G,
    max_attempts: u32,
}

impl<G: Generator> RepairCoordinator<G> {
    pub fn new(generator: G, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Ask for a first draft.
    pub async fn draft(
        &self,
        instruction: &str,
        spec_view: &str,
    ) -> Result<String, GeneratorError> {
        self.generator
            .generate(&GenerationRequest::draft(instruction, spec_view))
            .await
    }

    /// Run up to `max_attempts` repair round trips for a rejected output.
    ///
    /// Each round trip sends the instruction, the previous output, and its
    /// exact errors. Returns on the first valid batch; exhausting the bound
    /// is [`CompileError::RepairExhausted`].
    pub async fn repair(
        &self,
        instruction: &str,
        spec: &Specification,
        spec_view: &str,
        rejected_output: String,
        errors: Vec<ValidationIssue>,
        trace: &mut Trace,
    ) -> Result<Repaired, CompileError> {
        let mut output = rejected_output;
        let mut errors = errors;

        for attempt in 1..=self.max_attempts {
            trace.enter(IngestPhase::Repairing);
            tracing::info!(
                attempt,
                max_attempts = self.max_attempts,
                errors = errors.len(),
                "requesting repair"
            );

            let request = GenerationRequest::repair(instruction, spec_view, &output, &errors);
            output = self.generator.generate(&request).await?;

            trace.enter(IngestPhase::Validating);
            match evaluate(spec, &output) {
                Ok(batch) => {
                    trace.enter(IngestPhase::Valid);
                    tracing::info!(attempt, edits = batch.len(), "repair accepted");
                    return Ok(Repaired {
                        batch,
                        attempts: attempt,
                    });
                }
                Err(issues) => {
                    trace.enter(IngestPhase::Invalid);
                    tracing::debug!(attempt, errors = issues.len(), "repair rejected");
                    errors = issues;
                }
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            errors = errors.len(),
            "repair bound exhausted"
        );
        Err(CompileError::RepairExhausted {
            instruction: instruction.to_string(),
            attempts: self.max_attempts,
            errors,
            last_output: output,
        })
    }
}
