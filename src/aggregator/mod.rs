//! Aggregation of reachable objects by allocation site.
//!
//! This module turns the heap graph's allocation stacks into:
//! - A trie of allocation sites with cumulative per-heap and per-class totals
//! - Ordering helpers shared by every listing (sites, classes, objects)

pub mod metrics;
pub mod site_trie;

// Re-export main types and functions
pub use metrics::{
    children_by_size, largest_dominators, percentage, sorted_class_infos, ClassInfo, ClassKey,
};
pub use site_trie::{Site, SiteId, SiteTrie};
