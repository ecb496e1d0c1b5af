//! Heap Sites
//!
//! Ownership and allocation-site analysis for heap dumps whose
//! dominators have already been computed.
//!
//! Two structures are built once per dump and are read-only afterwards:
//! - [`ownership::OwnershipIndex`]: the "dominates" forest, rooted objects,
//!   per-heap reachable bytes and GC root types
//! - [`aggregator::SiteTrie`]: reachable objects aggregated along their
//!   allocation call stacks, outermost frame first
//!
//! ## Getting Started
//!
//! ```ignore
//! let snapshot = heap_sites::parser::load_snapshot("heap.json")?;
//! let analysis = heap_sites::HeapAnalysis::new(&snapshot);
//! let app = snapshot.heap_by_name("app").unwrap();
//! println!("{} bytes", analysis.ownership().heap_total_bytes(app)?);
//! ```

pub mod aggregator;
pub mod analysis;
pub mod commands;
pub mod heap;
pub mod output;
pub mod ownership;
pub mod parser;
pub mod utils;

pub use analysis::HeapAnalysis;
