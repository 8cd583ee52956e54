mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Incremental specification compiler with versioned history.
#[derive(Parser)]
#[command(
    name = "specledger",
    version,
    about = "Incremental specification compiler with versioned history"
)]
struct Cli {
    /// Project directory holding specledger.json
    #[arg(long, global = true, default_value = "./specledger-project")]
    project: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a natural-language instruction and commit the result
    Ingest {
        /// The instruction text
        text: String,
        /// Maximum repair round trips after the first draft
        #[arg(long, default_value = "2")]
        max_repair_attempts: u32,
        /// Model to use (default: claude-sonnet-4-20250514)
        #[arg(long)]
        model: Option<String>,
    },

    /// Commit an edit batch from a JSON file
    Apply {
        /// Path to the edit batch JSON file
        file: PathBuf,
        /// Instruction text to record with the batch
        #[arg(long)]
        source: Option<String>,
    },

    /// Validate an edit batch against the current specification without applying it
    Check {
        /// Path to the edit batch JSON file
        file: PathBuf,
    },

    /// List the history log
    History,

    /// Undo the last N committed batches
    Rollback {
        /// Number of records to discard
        n: usize,
    },

    /// Print the current specification
    Show {
        /// Print the compact text view instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Replay the history and check it reproduces the stored specification
    Verify,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ingest {
            text,
            max_repair_attempts,
            model,
        } => {
            commands::ingest::cmd_ingest(
                &cli.project,
                &text,
                max_repair_attempts,
                model.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Apply { file, source } => {
            commands::apply::cmd_apply(
                &cli.project,
                &file,
                source.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Check { file } => {
            commands::check::cmd_check(&cli.project, &file, cli.output, cli.quiet);
        }
        Commands::History => {
            commands::history::cmd_history(&cli.project, cli.output, cli.quiet);
        }
        Commands::Rollback { n } => {
            commands::history::cmd_rollback(&cli.project, n, cli.output, cli.quiet);
        }
        Commands::Show { summary } => {
            commands::show::cmd_show(&cli.project, summary, cli.output, cli.quiet);
        }
        Commands::Verify => {
            commands::show::cmd_verify(&cli.project, cli.output, cli.quiet);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`/`--quiet`.
fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2),
        )
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
