//! Dominator-based ownership of heap objects.
//!
//! Turns the provider's per-object immediate dominators into:
//! - The inverse "dominates" forest
//! - The set of objects hanging directly off the super-root
//! - Per-heap reachable byte totals and GC root types

pub mod index;

pub use index::OwnershipIndex;
