//! On-disk state: one JSON document holding the current specification and
//! the full history log.
//!
//! Writes go to a temporary file in the target directory and are renamed
//! into place, so a crash mid-write leaves the previous state intact.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use specledger_core::{HistoryRecord, Specification};

use crate::error::StoreError;

/// File name of the persisted state inside a project directory.
pub const STATE_FILE: &str = "specledger.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub spec: Specification,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

/// Atomically write `state` to `<dir>/specledger.json`, creating `dir` if needed.
pub fn save_state(dir: &Path, state: &PersistedState) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, state)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(STATE_FILE))
        .map_err(|e| StoreError::Io(e.error))?;

    tracing::debug!(dir = %dir.display(), records = state.history.len(), "saved state");
    Ok(())
}

/// Read `<dir>/specledger.json`. Returns `Ok(None)` when no state has been
/// saved yet.
pub fn load_state(dir: &Path) -> Result<Option<PersistedState>, StoreError> {
    let path = dir.join(STATE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let state: PersistedState = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), records = state.history.len(), "loaded state");
    Ok(Some(state))
}
