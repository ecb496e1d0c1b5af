use anyhow::Result;
use std::path::PathBuf;
use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    if report.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported report version {} (expected {})",
            report.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Reachable Bytes: {}", report.total_bytes);
    println!("  Heaps: {}", report.heaps.len());
    println!("  Sites: {}", report.sites.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Heap Sites Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Snapshot the report was built from");
        println!("  generated_at: string       - ISO 8601 timestamp");
        println!("  total_bytes: number        - Shallow bytes of reachable objects");
        println!("  reachable_objects: number  - Number of reachable objects");
        println!("  heaps: array               - Reachable bytes per heap");
        println!("  rooted_objects: number     - Objects dominated by the super-root");
        println!("  gc_roots: object           - GC root count per root type");
        println!("  sites: array               - Allocation sites, depth-first");
        println!("    path: string[]           - Frames, outermost first");
        println!("    total_bytes: number      - Cumulative bytes");
        println!("    bytes_by_heap: object    - Cumulative bytes per heap");
        println!("    top_classes: array       - Biggest classes at this site");
        println!("  top_dominators: array      - Objects dominating the most objects");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Heap Sites v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Dominator ownership and allocation-site analysis for heap dumps.");
}
