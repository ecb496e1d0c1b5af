//! Heap Sites CLI
//!
//! Analyzes a pre-processed heap snapshot and reports where memory is
//! owned and where it was allocated.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use heap_sites::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_report_file,
    AnalyzeArgs,
};
use heap_sites::output::ReportOptions;
use heap_sites::utils::config::{
    DEFAULT_SITE_DEPTH, DEFAULT_TOP_CLASSES, DEFAULT_TOP_DOMINATORS, DEFAULT_TOP_SITES,
};

/// Heap Sites - ownership and allocation-site analysis for heap dumps
#[derive(Parser, Debug)]
#[command(name = "heap-sites")]
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
    /// Analyze a heap snapshot
    Analyze {
        /// Snapshot JSON (objects with precomputed dominators)
        #[arg(short, long, env = "HEAP_SITES_INPUT")]
        input: PathBuf,

        /// Output path for JSON report
        #[arg(short, long, default_value = "heap-report.json")]
        output: PathBuf,

        /// Number of children listed per allocation site
        #[arg(long, default_value_t = DEFAULT_TOP_SITES)]
        top_sites: usize,

        /// Deepest allocation site listed
        #[arg(long, default_value_t = DEFAULT_SITE_DEPTH)]
        site_depth: usize,

        /// Number of classes listed per site
        #[arg(long, default_value_t = DEFAULT_TOP_CLASSES)]
        top_classes: usize,

        /// Number of dominators listed
        #[arg(long, default_value_t = DEFAULT_TOP_DOMINATORS)]
        top_dominators: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
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
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            top_sites,
            site_depth,
            top_classes,
            top_dominators,
            summary,
        } => {
            let args = AnalyzeArgs {
                input,
                output_json: output,
                report_options: ReportOptions {
                    top_sites,
                    site_depth,
                    top_classes,
                    top_dominators,
                },
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
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
