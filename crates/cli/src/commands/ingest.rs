use std::path::Path;
use std::process;
use std::sync::Arc;

use specledger_compiler::{AnthropicGenerator, Compiler, CompilerConfig};

use super::{finish_receipt, open_store, save_store};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_ingest(
    project: &Path,
    text: &str,
    max_repair_attempts: u32,
    model: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let mut config = CompilerConfig::new().with_max_repair_attempts(max_repair_attempts);
    if let Some(model) = model {
        config = config.with_model(model);
    }

    let generator = match AnthropicGenerator::from_config(&config) {
        Ok(g) => g,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let store = Arc::new(open_store(project, output, quiet));
    let compiler = Compiler::new(Arc::clone(&store), generator, &config);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create tokio runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let receipt = rt.block_on(compiler.ingest_instruction(text));

    if receipt.is_success() {
        save_store(&store, project, output, quiet);
    }
    finish_receipt(&receipt, output, quiet);
}
