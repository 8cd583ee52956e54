pub(crate) mod apply;
pub(crate) mod check;
pub(crate) mod history;
pub(crate) mod ingest;
pub(crate) mod show;

use std::path::Path;
use std::process;

use specledger_compiler::Receipt;
use specledger_storage::VersionStore;

use crate::{report_error, OutputFormat};

/// Load the project's store, or exit.
pub(crate) fn open_store(project: &Path, output: OutputFormat, quiet: bool) -> VersionStore {
    match VersionStore::load(project) {
        Ok(store) => store,
        Err(e) => {
            let msg = format!("error loading project '{}': {}", project.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Persist the store, or exit.
pub(crate) fn save_store(store: &VersionStore, project: &Path, output: OutputFormat, quiet: bool) {
    if let Err(e) = store.save(project) {
        let msg = format!("error saving project '{}': {}", project.display(), e);
        report_error(&msg, output, quiet);
        process::exit(1);
    }
}

pub(crate) fn read_file(path: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T, output: OutputFormat, quiet: bool) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            report_error(&format!("error serializing output: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Print a receipt; exits 1 if it records a failure.
pub(crate) fn finish_receipt(receipt: &Receipt, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => print_json(receipt, output, quiet),
        OutputFormat::Text => {
            if let (Some(record), false) = (&receipt.record, quiet) {
                println!(
                    "Applied #{} -> version {}: {}",
                    record.sequence, record.version, record.summary
                );
                if receipt.repair_attempts > 0 {
                    println!("  after {} repair attempt(s)", receipt.repair_attempts);
                }
            }
        }
    }

    if !receipt.is_success() {
        if output == OutputFormat::Text {
            let msg = receipt.message.as_deref().unwrap_or("ingest failed");
            report_error(msg, output, quiet);
        }
        process::exit(1);
    }
}
