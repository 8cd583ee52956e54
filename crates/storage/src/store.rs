use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use specledger_core::{
    apply, validate, EditBatch, HistoryRecord, RecordMeta, Specification, ValidationIssue,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::persist::{load_state, save_state, PersistedState};
use crate::replay::replay;

/// The committed specification together with the generation it belongs to.
///
/// The generation increases on every commit and rollback. Pass it back to
/// [`VersionStore::commit_on`] to detect that the store moved in between.
#[derive(Debug, Clone)]
pub struct Head {
    pub generation: u64,
    pub spec: Arc<Specification>,
}

#[derive(Debug)]
struct State {
    spec: Arc<Specification>,
    log: Vec<HistoryRecord>,
    generation: u64,
}

/// Single-writer owner of the current specification and its history.
///
/// Mutations take the write lock for their whole validate-apply-append
/// sequence, so a commit either lands completely or not at all and readers
/// only ever observe committed states.
#[derive(Debug)]
pub struct VersionStore {
    state: RwLock<State>,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionStore {
    /// An empty store: no classes, version `1.0.0`, empty log.
    pub fn new() -> Self {
        VersionStore {
            state: RwLock::new(State {
                spec: Arc::new(Specification::empty()),
                log: Vec::new(),
                generation: 0,
            }),
        }
    }

    /// Rebuild a store from a history log, checking that replaying it
    /// yields `spec`.
    pub fn from_parts(spec: Specification, log: Vec<HistoryRecord>) -> Result<Self, StoreError> {
        let replayed = replay(&log)?;
        if replayed != spec {
            return Err(StoreError::Corruption(format!(
                "history ({} record(s)) replays to etag {}, stored specification has etag {}",
                log.len(),
                replayed.etag(),
                spec.etag()
            )));
        }
        Ok(VersionStore {
            state: RwLock::new(State {
                spec: Arc::new(replayed),
                log,
                generation: 0,
            }),
        })
    }

    // State is replaced wholesale only after every fallible step succeeds,
    // so a poisoned lock never guards a half-applied mutation.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Immutable handle to the last committed specification.
    pub fn current(&self) -> Arc<Specification> {
        Arc::clone(&self.read().spec)
    }

    pub fn head(&self) -> Head {
        let state = self.read();
        Head {
            generation: state.generation,
            spec: Arc::clone(&state.spec),
        }
    }

    /// Copy of the full history log, oldest first.
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.read().log.clone()
    }

    /// Number of records in the history log.
    pub fn len(&self) -> usize {
        self.read().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().log.is_empty()
    }

    /// Validate `batch` against the current specification without applying it.
    pub fn check(&self, batch: &EditBatch) -> Result<(), Vec<ValidationIssue>> {
        let spec = self.current();
        validate(&spec, batch)
    }

    /// Replay the whole log from the empty specification and compare with
    /// the current one.
    pub fn verify(&self) -> Result<(), StoreError> {
        let (spec, log) = {
            let state = self.read();
            (Arc::clone(&state.spec), state.log.clone())
        };
        let replayed = replay(&log)?;
        if replayed != *spec {
            return Err(StoreError::Corruption(format!(
                "history replays to etag {}, current specification has etag {}",
                replayed.etag(),
                spec.etag()
            )));
        }
        Ok(())
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Validate and apply `batch` against whatever is current.
    pub fn commit(
        &self,
        batch: &EditBatch,
        source_text: Option<&str>,
    ) -> Result<HistoryRecord, StoreError> {
        let mut state = self.write();
        commit_locked(&mut state, batch, source_text)
    }

    /// Like [`commit`](Self::commit), but only if the store is still at
    /// `base_generation`. Otherwise returns [`StoreError::Conflict`] and
    /// leaves the store untouched.
    pub fn commit_on(
        &self,
        base_generation: u64,
        batch: &EditBatch,
        source_text: Option<&str>,
    ) -> Result<HistoryRecord, StoreError> {
        let mut state = self.write();
        if state.generation != base_generation {
            tracing::warn!(
                expected = base_generation,
                found = state.generation,
                "rejecting commit on stale base"
            );
            return Err(StoreError::Conflict {
                expected: base_generation,
                found: state.generation,
            });
        }
        commit_locked(&mut state, batch, source_text)
    }

    /// Discard the last `n` records and restore the specification they were
    /// applied to. `rollback(0)` is a no-op.
    pub fn rollback(&self, n: usize) -> Result<(), StoreError> {
        let mut state = self.write();
        let available = state.log.len();
        if n > available {
            return Err(StoreError::RollbackOutOfRange {
                requested: n,
                available,
            });
        }
        if n == 0 {
            return Ok(());
        }

        let keep = available - n;
        let spec = replay(&state.log[..keep])?;
        state.log.truncate(keep);
        state.spec = Arc::new(spec);
        state.generation += 1;

        tracing::info!(
            removed = n,
            remaining = keep,
            version = %state.spec.version,
            "rolled back"
        );
        Ok(())
    }

    // ── Persistence ───────────────────────────────────────────────────────

    /// Write the current specification and history to `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        let snapshot = {
            let state = self.read();
            PersistedState {
                spec: (*state.spec).clone(),
                history: state.log.clone(),
            }
        };
        save_state(dir, &snapshot)
    }

    /// Load a store from `dir`. A directory with no saved state yields an
    /// empty store; saved state whose history does not replay to the saved
    /// specification is [`StoreError::Corruption`].
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        match load_state(dir)? {
            None => Ok(Self::new()),
            Some(saved) => Self::from_parts(saved.spec, saved.history),
        }
    }
}

fn commit_locked(
    state: &mut State,
    batch: &EditBatch,
    source_text: Option<&str>,
) -> Result<HistoryRecord, StoreError> {
    validate(&state.spec, batch).map_err(StoreError::Validation)?;

    let meta = RecordMeta {
        sequence: state.log.len() as u64 + 1,
        timestamp: now_rfc3339(),
        source_text: source_text.map(str::to_owned),
    };
    let (spec, record) = apply(&state.spec, batch, meta)?;

    state.log.push(record.clone());
    state.spec = Arc::new(spec);
    state.generation += 1;

    tracing::info!(
        sequence = record.sequence,
        version = %record.version,
        summary = %record.summary,
        "committed batch"
    );
    Ok(record)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}
