//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads the heap snapshot
//! 2. Builds the ownership index
//! 3. Builds the allocation-site trie
//! 4. Assembles the report
//! 5. Writes output files

use crate::analysis::HeapAnalysis;
use crate::output::{build_report, generate_text_summary, write_report, ReportOptions};
use crate::parser::load_snapshot;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Snapshot JSON to analyze
    pub input: PathBuf,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Listing limits for the report
    pub report_options: ReportOptions,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_json: PathBuf::from("heap-report.json"),
            report_options: ReportOptions::default(),
            print_summary: false,
        }
    }
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Snapshot read or validation failures
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Starting analysis of: {}", args.input.display());

    info!("Step 1/4: Loading heap snapshot...");
    let snapshot = load_snapshot(&args.input)
        .with_context(|| format!("Failed to load snapshot {}", args.input.display()))?;

    info!("Step 2/4: Building ownership index and site trie...");
    let analysis = HeapAnalysis::new(&snapshot);

    debug!(
        "{} reachable objects, {} sites",
        analysis.ownership().reachable_count(),
        analysis.sites().len()
    );

    info!("Step 3/4: Building report...");
    let source = args.input.display().to_string();
    let report = build_report(&snapshot, &analysis, &source, &args.report_options);

    info!("Step 4/4: Writing output files...");
    write_report(&report, &args.output_json).context("Failed to write report JSON")?;

    info!("✓ Report written to: {}", args.output_json.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("HEAP SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Snapshot: {}", source);
        println!("\n{}", generate_text_summary(&report, args.report_options.top_sites + 1));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input snapshot path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Input snapshot does not exist: {}", args.input.display());
    }

    let options = &args.report_options;
    if options.top_sites == 0 {
        anyhow::bail!("top_sites must be greater than 0");
    }

    if options.top_sites > 1000 {
        anyhow::bail!("top_sites is too large (max 1000)");
    }

    if options.site_depth > 256 {
        anyhow::bail!("site_depth is too large (max 256)");
    }

    Ok(())
}
