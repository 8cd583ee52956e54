use specledger_core::{apply, HistoryRecord, RecordMeta, Specification};

use crate::error::StoreError;

/// Rebuild a specification by applying `records` in order to the empty
/// specification.
///
/// Each record is applied with its recorded timestamp, so the result is
/// byte-identical to what was originally committed. A record that no longer
/// applies, or whose resulting version/etag differs from what it recorded,
/// is reported as [`StoreError::Corruption`].
pub fn replay(records: &[HistoryRecord]) -> Result<Specification, StoreError> {
    let mut spec = Specification::empty();

    for (position, record) in records.iter().enumerate() {
        let expected = position as u64 + 1;
        if record.sequence != expected {
            return Err(StoreError::Corruption(format!(
                "record at position {} has sequence {}, expected {}",
                position, record.sequence, expected
            )));
        }

        let meta = RecordMeta {
            sequence: record.sequence,
            timestamp: record.timestamp.clone(),
            source_text: record.source_text.clone(),
        };
        let (next, replayed) = apply(&spec, &record.batch, meta).map_err(|e| {
            StoreError::Corruption(format!("record {} does not replay: {}", record.sequence, e))
        })?;

        if replayed.version != record.version {
            return Err(StoreError::Corruption(format!(
                "record {} replays to version {}, recorded {}",
                record.sequence, replayed.version, record.version
            )));
        }
        if replayed.etag != record.etag {
            return Err(StoreError::Corruption(format!(
                "record {} replays to etag {}, recorded {}",
                record.sequence, replayed.etag, record.etag
            )));
        }

        spec = next;
    }

    Ok(spec)
}
