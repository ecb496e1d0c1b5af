//! Heap snapshot parsing and schema definitions.
//!
//! This module handles:
//! - Reading pre-processed snapshot JSON (objects, dominators, stacks, roots)
//! - Validating heap names and ids
//! - Building the in-memory `HeapSnapshot` the analysis runs on

pub mod loader;
pub mod schema;

// Re-export main types
pub use loader::{into_snapshot, load_snapshot, parse_snapshot};
pub use schema::{RawDominator, RawObject, RawRoot, RawSnapshot, RawStack};
