//! Report generation and file output.
//!
//! Handles building the JSON report from an analysis, writing and reading
//! it back, and rendering a terminal summary.

pub mod json;
pub mod report;
pub mod schema;
pub mod summary;

// Re-export main functions
pub use json::{read_report, write_report};
pub use report::{build_report, ReportOptions};
pub use schema::{ClassEntry, DominatorEntry, HeapReport, HeapTotal, SiteEntry};
pub use summary::generate_text_summary;
