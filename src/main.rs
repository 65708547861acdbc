//! Deopt Lens CLI
//!
//! Analyses V8 logs for inline-cache transitions, deoptimizations and
//! code lifecycle events, and writes a per-file JSON report.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use deopt_lens::commands::{
    display_schema, display_version, execute_analyze, validate_analysis_file, validate_args,
    AnalyzeArgs,
};

/// Deopt Lens - IC and deoptimization analysis for V8
#[derive(Parser, Debug)]
#[command(name = "deopt-lens")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a V8 log
    Analyze {
        /// V8 log file (written with --log-ic --log-deopt --log-code)
        #[arg(short, long)]
        log: PathBuf,

        /// Output path for JSON report
        #[arg(short, long, default_value = "analysis.json")]
        output: PathBuf,

        /// Also write the ordered render form for the viewer
        #[arg(long)]
        render: Option<PathBuf>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Don't load script sources
        #[arg(long)]
        no_sources: bool,

        /// Drop events that can't be tied to a script instead of bucketing them
        #[arg(long)]
        discard_unattributed: bool,

        /// Worker threads for source loading
        #[arg(short, long, env = "DEOPT_LENS_JOBS")]
        jobs: Option<usize>,
    },

    /// Validate an analysis JSON file
    Validate {
        /// Path to analysis JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            log,
            output,
            render,
            compact,
            summary,
            no_sources,
            discard_unattributed,
            jobs,
        } => {
            let args = AnalyzeArgs {
                log_file: log,
                output_json: output,
                output_render: render,
                compact,
                print_summary: summary,
                no_sources,
                discard_unattributed,
                jobs,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_analysis_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
