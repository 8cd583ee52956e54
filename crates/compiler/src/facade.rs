//! The compiler facade: the single entry point that turns instructions or
//! ready-made batches into committed history.

use std::sync::Arc;

use serde::Serialize;
use specledger_core::{
    parse_batch, spec_view, EditBatch, HistoryRecord, Specification, ValidationIssue,
};
use specledger_storage::VersionStore;

use crate::config::CompilerConfig;
use crate::error::{CompileError, FailureKind};
use crate::generator::Generator;
use crate::phase::{IngestPhase, Trace};
use crate::repair::{evaluate, RepairCoordinator};

/// Outcome of one ingest.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// The committed record, on success.
    pub record: Option<HistoryRecord>,
    /// The accepted batch, on success.
    pub batch: Option<EditBatch>,
    pub failure: Option<FailureKind>,
    /// Human-readable failure description.
    pub message: Option<String>,
    /// Terminal field-level errors, on failure.
    pub errors: Vec<ValidationIssue>,
    pub repair_attempts: u32,
    pub trace: Vec<IngestPhase>,
    /// The last generator output, when repair was exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_output: Option<String>,
}

impl Receipt {
    fn applied(
        source_text: Option<&str>,
        batch: EditBatch,
        record: HistoryRecord,
        trace: Trace,
    ) -> Self {
        Receipt {
            success: true,
            source_text: source_text.map(str::to_owned),
            record: Some(record),
            batch: Some(batch),
            failure: None,
            message: None,
            errors: Vec::new(),
            repair_attempts: trace.repair_attempts(),
            trace: trace.into_phases(),
            last_output: None,
        }
    }

    fn failed(source_text: Option<&str>, err: CompileError, trace: Trace) -> Self {
        let last_output = match &err {
            CompileError::RepairExhausted { last_output, .. } => Some(last_output.clone()),
            _ => None,
        };
        Receipt {
            success: false,
            source_text: source_text.map(str::to_owned),
            record: None,
            batch: None,
            failure: Some(err.kind()),
            message: Some(err.to_string()),
            errors: err.issues().to_vec(),
            repair_attempts: trace.repair_attempts(),
            trace: trace.into_phases(),
            last_output,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Drives ingests against a shared [`VersionStore`].
pub struct Compiler<G> {
    store: Arc<VersionStore>,
    coordinator: RepairCoordinator<G>,
}

impl<G: Generator> Compiler<G> {
    pub fn new(store: Arc<VersionStore>, generator: G, config: &CompilerConfig) -> Self {
        Self {
            store,
            coordinator: RepairCoordinator::new(generator, config.max_repair_attempts),
        }
    }

    pub fn store(&self) -> &Arc<VersionStore> {
        &self.store
    }

    /// Read-only handle to the last committed specification.
    pub fn current(&self) -> Arc<Specification> {
        self.store.current()
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.store.history()
    }

    /// Compile a natural-language instruction and commit the result.
    ///
    /// The batch is validated against the specification as it stood when
    /// generation started; if anything committed in the meantime the receipt
    /// reports a conflict and nothing is applied.
    pub async fn ingest_instruction(&self, text: &str) -> Receipt {
        let mut trace = Trace::new();
        tracing::info!(instruction = %text, "ingesting instruction");

        match self.run_instruction(text, &mut trace).await {
            Ok((batch, record)) => {
                trace.enter(IngestPhase::Applied);
                Receipt::applied(Some(text), batch, record, trace)
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), error = %err, "instruction failed");
                trace.enter(IngestPhase::Failed);
                Receipt::failed(Some(text), err, trace)
            }
        }
    }

    async fn run_instruction(
        &self,
        text: &str,
        trace: &mut Trace,
    ) -> Result<(EditBatch, HistoryRecord), CompileError> {
        let head = self.store.head();
        let view = spec_view(&head.spec);

        let draft = self.coordinator.draft(text, &view).await?;
        trace.enter(IngestPhase::Proposed);

        trace.enter(IngestPhase::Validating);
        let batch = match evaluate(&head.spec, &draft) {
            Ok(batch) => {
                trace.enter(IngestPhase::Valid);
                batch
            }
            Err(issues) => {
                trace.enter(IngestPhase::Invalid);
                tracing::debug!(errors = issues.len(), "first draft rejected");
                self.coordinator
                    .repair(text, &head.spec, &view, draft, issues, trace)
                    .await?
                    .batch
            }
        };

        let record = self
            .store
            .commit_on(head.generation, &batch, Some(text))?;
        Ok((batch, record))
    }

    /// Commit a ready-made batch. Errors surface immediately; there is no
    /// repair for batches that did not come from the generator.
    pub fn ingest_changeset(&self, batch: &EditBatch, source_text: Option<&str>) -> Receipt {
        let mut trace = Trace::new();
        trace.enter(IngestPhase::Proposed);
        trace.enter(IngestPhase::Validating);
        self.commit_direct(batch, source_text, trace)
    }

    /// Decode `json` as an edit batch and commit it like
    /// [`ingest_changeset`](Self::ingest_changeset). Undecodable input is
    /// reported as malformed.
    pub fn ingest_changeset_json(&self, json: &str, source_text: Option<&str>) -> Receipt {
        let mut trace = Trace::new();
        trace.enter(IngestPhase::Proposed);
        trace.enter(IngestPhase::Validating);
        match parse_batch(json) {
            Ok(batch) => self.commit_direct(&batch, source_text, trace),
            Err(e) => {
                trace.enter(IngestPhase::Invalid);
                trace.enter(IngestPhase::Failed);
                Receipt::failed(source_text, CompileError::MalformedInput(e.issues()), trace)
            }
        }
    }

    fn commit_direct(
        &self,
        batch: &EditBatch,
        source_text: Option<&str>,
        mut trace: Trace,
    ) -> Receipt {
        match self.store.commit(batch, source_text) {
            Ok(record) => {
                trace.enter(IngestPhase::Valid);
                trace.enter(IngestPhase::Applied);
                Receipt::applied(source_text, batch.clone(), record, trace)
            }
            Err(err) => {
                let err = CompileError::from(err);
                trace.enter(match &err {
                    CompileError::Validation(_) => IngestPhase::Invalid,
                    _ => IngestPhase::Valid,
                });
                trace.enter(IngestPhase::Failed);
                tracing::warn!(kind = ?err.kind(), error = %err, "changeset rejected");
                Receipt::failed(source_text, err, trace)
            }
        }
    }
}
