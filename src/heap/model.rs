//! Object-level data model shared by the provider and the analysis core.
//!
//! Everything in here is owned by the heap graph. The ownership index and
//! the site trie only ever hold the small `Copy` handles defined below.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identity of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:#x}", self.0)
    }
}

/// Position of a heap in the provider's ordered heap list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeapId(pub usize);

/// Identity of a captured allocation stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(pub u64);

/// A named heap ("app", "zygote", "image", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heap {
    pub id: HeapId,
    pub name: String,
}

/// What kind of thing an object is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Instance,
    /// Class metadata object
    Class,
    Array,
}

/// Immediate dominator of a reachable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dominator {
    /// Synthetic node dominating every GC root
    SuperRoot,
    Object(ObjectId),
}

/// GC root type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootType {
    JniGlobal,
    JniLocal,
    JavaFrame,
    NativeStack,
    StickyClass,
    ThreadBlock,
    MonitorUsed,
    ThreadObject,
    InternedString,
    Finalizing,
    Debugger,
    ReferenceCleanup,
    VmInternal,
    JniMonitor,
    Unknown,
}

impl RootType {
    /// Short label used in reports and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            RootType::JniGlobal => "jni-global",
            RootType::JniLocal => "jni-local",
            RootType::JavaFrame => "java-frame",
            RootType::NativeStack => "native-stack",
            RootType::StickyClass => "sticky-class",
            RootType::ThreadBlock => "thread-block",
            RootType::MonitorUsed => "monitor-used",
            RootType::ThreadObject => "thread-object",
            RootType::InternedString => "interned-string",
            RootType::Finalizing => "finalizing",
            RootType::Debugger => "debugger",
            RootType::ReferenceCleanup => "reference-cleanup",
            RootType::VmInternal => "vm-internal",
            RootType::JniMonitor => "jni-monitor",
            RootType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RootType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of an allocation call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Fully qualified method name
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// String label the site trie is keyed by
    ///
    /// Two frames that render to the same label are the same trie child.
    pub fn label(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{} ({}:{})", self.method, file, line),
            (Some(file), None) => format!("{} ({})", self.method, file),
            _ => self.method.clone(),
        }
    }
}

/// A captured allocation call stack
///
/// Frames are stored innermost-first, the way they are captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStack {
    pub id: StackId,
    pub frames: Vec<StackFrame>,
}

impl AllocationStack {
    pub fn new(id: StackId, frames: Vec<StackFrame>) -> Self {
        Self { id, frames }
    }

    /// Frame labels ordered outermost (entry point) first
    pub fn labels_outermost_first(&self) -> Vec<String> {
        self.frames.iter().rev().map(StackFrame::label).collect()
    }
}

/// A single heap object as supplied by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapObject {
    pub id: ObjectId,
    pub heap: HeapId,

    /// Shallow size in bytes
    pub size: u64,

    pub kind: ObjectKind,

    /// Class of this object, if it could be resolved
    pub class: Option<ObjectId>,

    /// Immediate dominator; `None` means unreachable
    pub dominator: Option<Dominator>,

    pub stack: Option<StackId>,
}

impl HeapObject {
    pub fn new(id: ObjectId, heap: HeapId, size: u64) -> Self {
        Self {
            id,
            heap,
            size,
            kind: ObjectKind::Instance,
            class: None,
            dominator: None,
            stack: None,
        }
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_class(mut self, class: ObjectId) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_dominator(mut self, dominator: Dominator) -> Self {
        self.dominator = Some(dominator);
        self
    }

    pub fn with_stack(mut self, stack: StackId) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn is_reachable(&self) -> bool {
        self.dominator.is_some()
    }

    /// Class metadata object whose own class pointer was never resolved
    pub fn is_unresolved_class_object(&self) -> bool {
        self.kind == ObjectKind::Class && self.class.is_none()
    }
}

/// A declared GC root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcRoot {
    pub object: ObjectId,
    pub root_type: RootType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_label_formats() {
        assert_eq!(StackFrame::new("a.B.c").label(), "a.B.c");
        assert_eq!(
            StackFrame::new("a.B.c").with_location("B.java", 12).label(),
            "a.B.c (B.java:12)"
        );
        let no_line = StackFrame {
            method: "a.B.c".to_string(),
            file: Some("B.java".to_string()),
            line: None,
        };
        assert_eq!(no_line.label(), "a.B.c (B.java)");
    }

    #[test]
    fn test_labels_are_reversed() {
        let stack = AllocationStack::new(
            StackId(1),
            vec![StackFrame::new("inner"), StackFrame::new("outer")],
        );
        assert_eq!(stack.labels_outermost_first(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_unresolved_class_predicate() {
        let class = HeapObject::new(ObjectId(1), HeapId(0), 8).with_kind(ObjectKind::Class);
        assert!(class.is_unresolved_class_object());
        assert!(!class.clone().with_class(ObjectId(2)).is_unresolved_class_object());
        assert!(!HeapObject::new(ObjectId(3), HeapId(0), 8).is_unresolved_class_object());
    }
}
