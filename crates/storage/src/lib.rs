//! specledger-storage: the version store.
//!
//! Owns the current [`Specification`](specledger_core::Specification) and
//! the ordered [`HistoryRecord`] log. Commits and rollbacks are serialized
//! under one write lock; readers get an immutable `Arc` handle to the last
//! committed specification.

mod error;
mod persist;
mod replay;
mod store;

pub use error::StoreError;
pub use persist::{load_state, save_state, PersistedState, STATE_FILE};
pub use replay::replay;
pub use specledger_core::HistoryRecord;
pub use store::{Head, VersionStore};
