//! The per-ingest state machine.
//!
//! ```text
//! PROPOSED -> VALIDATING -> VALID -> APPLIED
//!                        \-> INVALID -> REPAIRING -> VALIDATING ...
//!                                   \-> FAILED
//! ```
//!
//! APPLIED and FAILED are terminal. The store only changes on APPLIED.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestPhase {
    Proposed,
    Validating,
    Valid,
    Invalid,
    Repairing,
    Applied,
    Failed,
}

impl IngestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, IngestPhase::Applied | IngestPhase::Failed)
    }

    /// Whether `self` may be entered directly after `prev` (`None` = start).
    pub fn can_follow(self, prev: Option<IngestPhase>) -> bool {
        use IngestPhase::*;
        match prev {
            // A generator failure before any proposal exists fails outright.
            None => matches!(self, Proposed | Failed),
            Some(Proposed) => self == Validating,
            Some(Validating) => matches!(self, Valid | Invalid),
            // A valid batch can still fail on commit (stale base, storage).
            Some(Valid) => matches!(self, Applied | Failed),
            Some(Invalid) => matches!(self, Repairing | Failed),
            // The repair round trip itself can fail.
            Some(Repairing) => matches!(self, Validating | Failed),
            Some(Applied) | Some(Failed) => false,
        }
    }
}

/// Ordered record of the phases one ingest passed through.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    phases: Vec<IngestPhase>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, phase: IngestPhase) {
        debug_assert!(
            phase.can_follow(self.current()),
            "illegal ingest transition {:?} -> {:?}",
            self.current(),
            phase
        );
        tracing::debug!(from = ?self.current(), to = ?phase, "ingest transition");
        self.phases.push(phase);
    }

    pub fn current(&self) -> Option<IngestPhase> {
        self.phases.last().copied()
    }

    pub fn phases(&self) -> &[IngestPhase] {
        &self.phases
    }

    /// Number of repair round trips started so far.
    pub fn repair_attempts(&self) -> u32 {
        self.phases
            .iter()
            .filter(|p| **p == IngestPhase::Repairing)
            .count() as u32
    }

    pub fn into_phases(self) -> Vec<IngestPhase> {
        self.phases
    }
}
