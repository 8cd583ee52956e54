//! specledger-compiler: turns natural-language instructions into committed
//! edit batches.
//!
//! The [`Compiler`] facade asks a [`Generator`] for a draft batch, validates
//! it, runs the bounded repair loop on failure, and commits the result to a
//! [`VersionStore`](specledger_storage::VersionStore). Every ingest returns
//! a [`Receipt`].

pub mod anthropic;
pub mod config;
pub mod error;
pub mod extract;
pub mod facade;
pub mod generator;
pub mod phase;
pub mod prompt;
pub mod repair;

pub use anthropic::AnthropicGenerator;
pub use config::CompilerConfig;
pub use error::{CompileError, FailureKind, GeneratorError};
pub use extract::extract_batch_json;
pub use facade::{Compiler, Receipt};
pub use generator::{GenerationRequest, Generator, NoGenerator, RepairContext};
pub use phase::{IngestPhase, Trace};
pub use repair::{evaluate, RepairCoordinator, Repaired};
