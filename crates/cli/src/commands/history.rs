use std::path::Path;
use std::process;

use super::{open_store, print_json, save_store};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_history(project: &Path, output: OutputFormat, quiet: bool) {
    let store = open_store(project, output, quiet);
    let history = store.history();

    match output {
        OutputFormat::Json => print_json(&history, output, quiet),
        OutputFormat::Text => {
            if quiet {
                return;
            }
            if history.is_empty() {
                println!("No history.");
                return;
            }
            for record in &history {
                println!(
                    "#{} {} {} {}",
                    record.sequence, record.version, record.timestamp, record.summary
                );
                if let Some(source) = &record.source_text {
                    println!("    \"{}\"", source);
                }
            }
        }
    }
}

pub(crate) fn cmd_rollback(project: &Path, n: usize, output: OutputFormat, quiet: bool) {
    let store = open_store(project, output, quiet);

    if let Err(e) = store.rollback(n) {
        report_error(&format!("error: {}", e), output, quiet);
        process::exit(1);
    }
    save_store(&store, project, output, quiet);

    let spec = store.current();
    match output {
        OutputFormat::Json => print_json(
            &serde_json::json!({
                "removed": n,
                "remaining": store.len(),
                "version": spec.version,
            }),
            output,
            quiet,
        ),
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "Rolled back {} record(s); {} remaining, version {}",
                    n,
                    store.len(),
                    spec.version
                );
            }
        }
    }
}
