//! Output JSON schema definitions for heap reports.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Snapshot the report was built from
    pub source: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Shallow bytes of all reachable objects
    pub total_bytes: u64,

    pub reachable_objects: usize,

    /// Reachable bytes per heap, in heap order
    pub heaps: Vec<HeapTotal>,

    /// Objects immediately dominated by the super-root
    pub rooted_objects: usize,

    /// Number of GC roots per root type
    pub gc_roots: BTreeMap<String, u64>,

    /// Allocation sites, depth-first with bigger children first
    pub sites: Vec<SiteEntry>,

    /// Objects directly dominating the most other objects
    pub top_dominators: Vec<DominatorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapTotal {
    pub name: String,
    pub bytes: u64,
    pub percentage: f64,
}

/// One node of the allocation-site trie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    /// Frame labels from the outermost frame down; empty for the root
    pub path: Vec<String>,

    pub depth: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<u64>,

    /// Cumulative bytes, descendants included
    pub total_bytes: u64,

    /// Share of all reachable bytes
    pub percentage: f64,

    pub bytes_by_heap: BTreeMap<String, u64>,

    pub objects: usize,

    pub top_classes: Vec<ClassEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEntry {
    pub heap: String,

    /// Class object id; absent when the class could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<u64>,

    pub instances: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominatorEntry {
    pub object: u64,
    pub heap: String,
    pub size: u64,

    /// Number of objects it immediately dominates
    pub dominated: usize,

    /// GC root types, empty if the object is not a root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_types: Vec<String>,
}
