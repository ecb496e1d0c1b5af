//! Heap graph data model and the provider interface.
//!
//! This module defines:
//! - Object, stack and root types handed over by the provider
//! - The `HeapGraph` trait the analysis core reads from
//! - `HeapSnapshot`, an in-memory implementation of that trait

pub mod model;
pub mod snapshot;

// Re-export main types
pub use model::{
    AllocationStack, Dominator, GcRoot, Heap, HeapId, HeapObject, ObjectId, ObjectKind, RootType,
    StackFrame, StackId,
};
pub use snapshot::{HeapGraph, HeapSnapshot};
