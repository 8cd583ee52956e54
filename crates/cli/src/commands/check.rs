use std::path::Path;
use std::process;

use specledger_core::{format_issues, parse_batch, ValidationIssue};

use super::{open_store, print_json, read_file};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_check(project: &Path, file: &Path, output: OutputFormat, quiet: bool) {
    let json = read_file(file, output, quiet);
    let store = open_store(project, output, quiet);

    let result = parse_batch(&json)
        .map_err(|e| e.issues())
        .and_then(|batch| store.check(&batch).map(|()| batch.len()));

    match (result, output) {
        (Ok(edits), OutputFormat::Json) => {
            print_json(
                &serde_json::json!({ "valid": true, "edits": edits, "errors": [] }),
                output,
                quiet,
            );
        }
        (Ok(edits), OutputFormat::Text) => {
            if !quiet {
                println!(
                    "{}: valid ({} edit(s) against version {})",
                    file.display(),
                    edits,
                    store.current().version
                );
            }
        }
        (Err(issues), OutputFormat::Json) => {
            print_json(
                &serde_json::json!({ "valid": false, "errors": issues_json(&issues) }),
                output,
                quiet,
            );
            process::exit(1);
        }
        (Err(issues), OutputFormat::Text) => {
            let msg = format!("{}: invalid\n{}", file.display(), format_issues(&issues));
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn issues_json(issues: &[ValidationIssue]) -> serde_json::Value {
    serde_json::to_value(issues).unwrap_or_default()
}
