//! On-disk JSON schema of a pre-processed heap snapshot.
//!
//! The snapshot is what a heap-dump front end hands over once it has
//! parsed the dump and computed dominators. Example:
//!
//! ```json
//! {
//!   "heaps": ["app", "image", "zygote"],
//!   "metaclass": 1,
//!   "objects": [
//!     { "id": 1, "heap": "image", "size": 96, "kind": "class", "dominator": "root" },
//!     { "id": 2, "heap": "app", "size": 24, "class": 1, "dominator": 1, "stack": 7 },
//!     { "id": 3, "heap": "app", "size": 16, "dominator": null }
//!   ],
//!   "stacks": [
//!     { "id": 7, "frames": [{ "method": "Foo.alloc", "file": "Foo.java", "line": 12 }] }
//!   ],
//!   "roots": [{ "object": 1, "type": "sticky-class" }]
//! }
//! ```

use crate::heap::{ObjectKind, RootType, StackFrame};
use serde::{Deserialize, Serialize};

/// Top-level snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Heap names, in the order heaps are walked
    pub heaps: Vec<String>,

    /// Id of the class-of-class object, if the front end resolved it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metaclass: Option<u64>,

    #[serde(default)]
    pub objects: Vec<RawObject>,

    #[serde(default)]
    pub stacks: Vec<RawStack>,

    #[serde(default)]
    pub roots: Vec<RawRoot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObject {
    pub id: u64,

    /// Heap name, must be listed in `heaps`
    pub heap: String,

    /// Shallow size in bytes
    #[serde(default, alias = "shallow_size")]
    pub size: u64,

    #[serde(default)]
    pub kind: ObjectKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<u64>,

    /// Object id, the super-root tag, or null for unreachable objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominator: Option<RawDominator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<u64>,
}

/// Immediate dominator as written in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDominator {
    Object(u64),
    Tag(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStack {
    pub id: u64,

    /// Innermost frame first
    #[serde(default)]
    pub frames: Vec<StackFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoot {
    pub object: u64,

    #[serde(rename = "type")]
    pub root_type: RootType,
}
