//! specledger-core: the incremental specification engine.
//!
//! A [`Specification`] (classes, methods, and their input/output models)
//! evolves only through validated [`EditBatch`]es.
//!
//! # Public API
//!
//! - [`decode_batch()`] / [`parse_batch()`] -- turn untrusted JSON into an [`EditBatch`]
//! - [`validate()`] -- check a batch against a specification, collecting [`ValidationIssue`]s
//! - [`apply()`] -- apply a validated batch, producing a new specification and a [`HistoryRecord`]
//! - [`spec_view()`] -- compact text view for generation prompts
//!
//! The patch engine keeps no state between calls; ownership of the
//! "current" specification belongs to whoever calls it.

pub mod edit;
pub mod error;
pub mod history;
pub mod model;
pub mod patch;
pub mod summary;
pub mod validate;
pub mod wire;

// ── Convenience re-exports: key types ────────────────────────────────

pub use edit::{
    AddClass, AddMethod, Deprecate, Edit, EditBatch, ModifyMethodSignature, Rename, TargetType,
};
pub use error::{format_issues, PatchError, ValidationIssue};
pub use history::HistoryRecord;
pub use model::{
    ClassSpec, DocNote, FieldSpec, MethodSpec, ModelSpec, Specification, INITIAL_VERSION,
    MAX_DOC_NOTES,
};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use patch::{apply, RecordMeta};
pub use summary::spec_view;
pub use validate::validate;
pub use wire::{decode_batch, parse_batch, DecodeError};
