use std::path::Path;
use std::process;

use specledger_core::spec_view;

use super::{open_store, print_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_show(project: &Path, summary: bool, output: OutputFormat, quiet: bool) {
    let store = open_store(project, output, quiet);
    let spec = store.current();

    if summary && output == OutputFormat::Text {
        println!("{}", spec_view(&spec));
    } else if summary {
        print_json(&serde_json::json!({ "summary": spec_view(&spec) }), output, quiet);
    } else {
        print_json(&*spec, output, quiet);
    }
}

pub(crate) fn cmd_verify(project: &Path, output: OutputFormat, quiet: bool) {
    // Loading already replays the log against the saved snapshot.
    let store = open_store(project, output, quiet);
    if let Err(e) = store.verify() {
        report_error(&format!("error: {}", e), output, quiet);
        process::exit(1);
    }

    let spec = store.current();
    match output {
        OutputFormat::Json => print_json(
            &serde_json::json!({
                "ok": true,
                "records": store.len(),
                "version": spec.version,
                "etag": spec.etag(),
            }),
            output,
            quiet,
        ),
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "ok: {} record(s) replay to version {} (etag {})",
                    store.len(),
                    spec.version,
                    spec.etag()
                );
            }
        }
    }
}
