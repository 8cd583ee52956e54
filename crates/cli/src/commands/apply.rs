use std::path::Path;
use std::sync::Arc;

use specledger_compiler::{Compiler, CompilerConfig, NoGenerator};

use super::{finish_receipt, open_store, read_file, save_store};
use crate::OutputFormat;

pub(crate) fn cmd_apply(
    project: &Path,
    file: &Path,
    source: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let json = read_file(file, output, quiet);
    let store = Arc::new(open_store(project, output, quiet));
    let compiler = Compiler::new(Arc::clone(&store), NoGenerator, &CompilerConfig::new());

    let receipt = compiler.ingest_changeset_json(&json, source);
    if receipt.is_success() {
        save_store(&store, project, output, quiet);
    }
    finish_receipt(&receipt, output, quiet);
}
