//! Ingest pipeline tests against a scripted generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use specledger_compiler::{
    Compiler, CompilerConfig, FailureKind, GenerationRequest, Generator, GeneratorError,
    IngestPhase, NoGenerator,
};
use specledger_core::{parse_batch, AddClass, Edit, EditBatch};
use specledger_storage::VersionStore;

const CREATE: &str = include_str!("../../../fixtures/batches/create_user_service.json");
const BARE_MAPPING: &str = include_str!("../../../fixtures/invalid/bare_field_mapping.json");

const ADD_USER_SERVICE: &str =
    r#"{"changes": [{"kind": "ADD_CLASS", "class_name": "UserService", "doc": "Manages users"}]}"#;

const ADD_CREATE_USER: &str = r#"{"changes": [{
    "kind": "ADD_METHOD", "class_name": "UserService", "method_name": "create_user",
    "inputs": {"name": "CreateUserInput", "fields": [{"name": "email", "type": "str"}]},
    "outputs": {"name": "User", "fields": [{"name": "id", "type": "str"}]}
}]}"#;

// ── Fakes ───────────────────────────────────────────────────────────────────

/// Replays canned outputs in order, then repeats `fallback` (if any).
struct Scripted {
    outputs: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Scripted {
    fn new(outputs: &[&str]) -> Arc<Self> {
        Arc::new(Scripted {
            outputs: Mutex::new(outputs.iter().map(|s| s.to_string()).collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn always(output: &str) -> Arc<Self> {
        Arc::new(Scripted {
            outputs: Mutex::new(VecDeque::new()),
            fallback: Some(output.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for Scripted {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.outputs.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| GeneratorError::Internal("script exhausted".to_string()))
    }
}

/// Commits an unrelated class while "thinking", then returns `output`.
struct Interloper {
    store: Arc<VersionStore>,
    output: String,
}

#[async_trait]
impl Generator for Interloper {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GeneratorError> {
        let batch = EditBatch::new(vec![Edit::AddClass(AddClass {
            class_name: "Billing".to_string(),
            doc: None,
        })]);
        self.store
            .commit(&batch, Some("concurrent writer"))
            .map_err(|e| GeneratorError::Internal(e.to_string()))?;
        Ok(self.output.clone())
    }
}

struct Unreachable;

#[async_trait]
impl Generator for Unreachable {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GeneratorError> {
        Err(GeneratorError::Api("API request failed: connection refused".to_string()))
    }
}

fn compiler<G: Generator>(generator: G, max_repair_attempts: u32) -> Compiler<G> {
    let config = CompilerConfig::new().with_max_repair_attempts(max_repair_attempts);
    Compiler::new(Arc::new(VersionStore::new()), generator, &config)
}

// ── Instructions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_first_draft_is_applied_without_repair() {
    let generator = Scripted::new(&[CREATE]);
    let compiler = compiler(Arc::clone(&generator), 2);

    let receipt = compiler.ingest_instruction("Create a UserService").await;

    assert!(receipt.is_success(), "{:?}", receipt.message);
    assert_eq!(receipt.repair_attempts, 0);
    assert_eq!(
        receipt.trace,
        vec![
            IngestPhase::Proposed,
            IngestPhase::Validating,
            IngestPhase::Valid,
            IngestPhase::Applied
        ]
    );
    let record = receipt.record.unwrap();
    assert_eq!(record.sequence, 1);
    assert_eq!(record.source_text.as_deref(), Some("Create a UserService"));
    assert_eq!(compiler.current().classes.len(), 1);

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].is_repair());
    assert_eq!(requests[0].instruction, "Create a UserService");
    assert!(requests[0].spec_view.starts_with("Empty specification"));
}

#[tokio::test]
async fn fenced_draft_is_accepted() {
    let fenced = format!("```json\n{}\n```", ADD_USER_SERVICE);
    let generator = Scripted::new(&[fenced.as_str()]);
    let compiler = compiler(generator, 2);

    let receipt = compiler.ingest_instruction("Add a user service").await;
    assert!(receipt.is_success(), "{:?}", receipt.message);
}

#[tokio::test]
async fn always_invalid_generator_exhausts_the_bound() {
    let generator = Scripted::always("I would rather write prose.");
    let compiler = compiler(Arc::clone(&generator), 2);

    let receipt = compiler.ingest_instruction("Create a UserService").await;

    assert!(!receipt.is_success());
    assert_eq!(receipt.failure, Some(FailureKind::RepairExhausted));
    assert_eq!(receipt.repair_attempts, 2);
    // One draft plus exactly two repair round trips.
    assert_eq!(generator.calls(), 3);
    assert_eq!(
        receipt.last_output.as_deref(),
        Some("I would rather write prose.")
    );
    assert!(!receipt.errors.is_empty());
    assert!(receipt
        .message
        .as_deref()
        .unwrap()
        .contains("Create a UserService"));
    assert_eq!(receipt.trace.last(), Some(&IngestPhase::Failed));
    assert!(compiler.current().classes.is_empty());
    assert!(compiler.history().is_empty());
}

#[tokio::test]
async fn repair_bound_is_configurable() {
    for bound in [0u32, 1, 4] {
        let generator = Scripted::always("{}");
        let compiler = compiler(Arc::clone(&generator), bound);

        let receipt = compiler.ingest_instruction("anything").await;

        assert_eq!(receipt.failure, Some(FailureKind::RepairExhausted));
        assert_eq!(receipt.repair_attempts, bound);
        assert_eq!(generator.calls(), bound as usize + 1);
    }
}

#[tokio::test]
async fn bare_field_mapping_triggers_repair() {
    let generator = Scripted::new(&[ADD_USER_SERVICE]);
    let compiler = compiler(Arc::clone(&generator), 2);
    assert!(compiler.ingest_instruction("Add UserService").await.is_success());

    let generator = Scripted::new(&[BARE_MAPPING, ADD_CREATE_USER]);
    let compiler = Compiler::new(
        Arc::clone(compiler.store()),
        Arc::clone(&generator),
        &CompilerConfig::new(),
    );
    let receipt = compiler.ingest_instruction("Add create_user taking an email").await;

    assert!(receipt.is_success(), "{:?}", receipt.message);
    assert_eq!(receipt.repair_attempts, 1);
    assert_eq!(
        receipt.trace,
        vec![
            IngestPhase::Proposed,
            IngestPhase::Validating,
            IngestPhase::Invalid,
            IngestPhase::Repairing,
            IngestPhase::Validating,
            IngestPhase::Valid,
            IngestPhase::Applied
        ]
    );

    let requests = generator.requests();
    let repair = requests[1].repair.as_ref().expect("second call is a repair");
    assert_eq!(repair.previous_output, BARE_MAPPING);
    assert!(repair
        .errors
        .iter()
        .any(|i| i.path == "changes[0].inputs" && i.message.contains("mapping of field name")));
    assert_eq!(requests[1].instruction, "Add create_user taking an email");
}

#[tokio::test]
async fn repair_receives_exact_validation_errors() {
    let generator = Scripted::new(&[ADD_USER_SERVICE, ADD_USER_SERVICE, ADD_CREATE_USER]);
    let compiler = compiler(Arc::clone(&generator), 2);

    assert!(compiler.ingest_instruction("Add UserService").await.is_success());
    let receipt = compiler.ingest_instruction("Add create_user").await;

    assert!(receipt.is_success(), "{:?}", receipt.message);
    assert_eq!(receipt.repair_attempts, 1);

    let requests = generator.requests();
    assert!(requests[1].spec_view.contains("UserService"));
    let repair = requests[2].repair.as_ref().unwrap();
    let messages: Vec<&str> = repair.errors.iter().map(|i| i.message.as_str()).collect();
    assert_eq!(messages, vec!["class UserService already exists"]);
}

#[tokio::test]
async fn commit_after_concurrent_change_is_a_conflict() {
    let store = Arc::new(VersionStore::new());
    let generator = Interloper {
        store: Arc::clone(&store),
        output: ADD_USER_SERVICE.to_string(),
    };
    let compiler = Compiler::new(Arc::clone(&store), generator, &CompilerConfig::new());

    let receipt = compiler.ingest_instruction("Add UserService").await;

    assert_eq!(receipt.failure, Some(FailureKind::Conflict));
    assert_eq!(
        &receipt.trace[receipt.trace.len() - 2..],
        &[IngestPhase::Valid, IngestPhase::Failed]
    );
    // Only the interloper's commit landed.
    assert_eq!(store.len(), 1);
    assert!(store.current().resolve_class("UserService").is_none());
}

#[tokio::test]
async fn generator_failure_is_reported() {
    let compiler = compiler(Unreachable, 2);
    let receipt = compiler.ingest_instruction("Add UserService").await;

    assert_eq!(receipt.failure, Some(FailureKind::Generator));
    assert_eq!(receipt.trace, vec![IngestPhase::Failed]);
    assert!(receipt.message.unwrap().contains("connection refused"));
    assert!(compiler.history().is_empty());
}

#[tokio::test]
async fn changeset_only_compiler_rejects_instructions() {
    let compiler = compiler(NoGenerator, 2);
    let receipt = compiler.ingest_instruction("Add UserService").await;
    assert_eq!(receipt.failure, Some(FailureKind::Generator));
    assert!(receipt.message.unwrap().contains("no generator configured"));
}

// ── Direct changesets ───────────────────────────────────────────────────────

#[tokio::test]
async fn changeset_is_committed_without_generation() {
    let generator = Scripted::new(&[]);
    let compiler = compiler(Arc::clone(&generator), 2);

    let batch = parse_batch(CREATE).unwrap();
    let receipt = compiler.ingest_changeset(&batch, Some("seed"));

    assert!(receipt.is_success());
    assert_eq!(receipt.batch.as_ref(), Some(&batch));
    assert_eq!(
        receipt.record.unwrap().summary,
        "Added class UserService; Added method UserService.create_user"
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn invalid_changeset_fails_immediately() {
    let generator = Scripted::new(&[]);
    let compiler = compiler(Arc::clone(&generator), 2);
    let batch = parse_batch(ADD_USER_SERVICE).unwrap();
    assert!(compiler.ingest_changeset(&batch, None).is_success());

    let receipt = compiler.ingest_changeset(&batch, None);

    assert_eq!(receipt.failure, Some(FailureKind::Validation));
    assert_eq!(receipt.errors.len(), 1);
    assert_eq!(receipt.errors[0].message, "class UserService already exists");
    assert_eq!(receipt.repair_attempts, 0);
    assert_eq!(
        receipt.trace,
        vec![
            IngestPhase::Proposed,
            IngestPhase::Validating,
            IngestPhase::Invalid,
            IngestPhase::Failed
        ]
    );
    assert_eq!(generator.calls(), 0);
    assert_eq!(compiler.history().len(), 1);
}

#[tokio::test]
async fn malformed_changeset_json_is_reported() {
    let compiler = compiler(Scripted::new(&[]), 2);
    let receipt = compiler.ingest_changeset_json("{\"changes\": [", None);
    assert_eq!(receipt.failure, Some(FailureKind::MalformedInput));
    assert!(!receipt.errors.is_empty());

    let receipt = compiler.ingest_changeset_json(BARE_MAPPING, None);
    assert_eq!(receipt.failure, Some(FailureKind::MalformedInput));
    assert!(compiler.history().is_empty());
}

#[tokio::test]
async fn receipt_serializes_for_reporting() {
    let compiler = compiler(Scripted::new(&[]), 2);
    let receipt = compiler.ingest_changeset_json(ADD_USER_SERVICE, Some("seed"));
    let v = serde_json::to_value(&receipt).unwrap();

    assert_eq!(v["success"], true);
    assert_eq!(v["source_text"], "seed");
    assert_eq!(v["record"]["version"], "1.0.1");
    assert_eq!(
        v["trace"],
        serde_json::json!(["PROPOSED", "VALIDATING", "VALID", "APPLIED"])
    );
    assert!(v.get("last_output").is_none());
}
