use serde::{Deserialize, Serialize};

use crate::edit::EditBatch;

/// Durable log entry for one applied [`EditBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// 1-based position in the log.
    pub sequence: u64,
    pub batch: EditBatch,
    /// RFC 3339 time the batch was committed.
    pub timestamp: String,
    /// Specification version after this batch.
    pub version: String,
    /// SHA-256 etag of the specification after this batch.
    pub etag: String,
    /// Human-readable list of what the batch did.
    pub summary: String,
    /// The instruction text the batch was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}
