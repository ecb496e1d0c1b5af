//! The heap-graph provider seam and its in-memory implementation.

use super::model::{AllocationStack, GcRoot, Heap, HeapId, HeapObject, ObjectId, StackId};
use crate::utils::error::ParseError;
use std::collections::HashMap;

/// Read-only view of a loaded heap graph
///
/// **Public** - the only interface the analysis core consumes
///
/// Dominators must already be computed. Objects are partitioned by heap and
/// heaps are enumerated in a fixed order.
pub trait HeapGraph {
    /// Registered heaps, in provider order
    fn heaps(&self) -> &[Heap];

    /// Objects living on `heap` (empty for an unknown heap)
    fn objects_on(&self, heap: HeapId) -> &[HeapObject];

    fn object(&self, id: ObjectId) -> Option<&HeapObject>;

    fn stack(&self, id: StackId) -> Option<&AllocationStack>;

    fn roots(&self) -> &[GcRoot];

    /// Canonical class-of-class object, if known
    fn metaclass(&self) -> Option<ObjectId>;

    fn heap_name(&self, heap: HeapId) -> Option<&str> {
        self.heaps()
            .iter()
            .find(|h| h.id == heap)
            .map(|h| h.name.as_str())
    }

    /// Allocation stack of `object`, if it was captured and is known
    fn stack_of(&self, object: &HeapObject) -> Option<&AllocationStack> {
        object.stack.and_then(|id| self.stack(id))
    }
}

/// In-memory heap graph
///
/// **Public** - produced by the JSON loader, also handy for building
/// graphs by hand in tests
#[derive(Debug, Default)]
pub struct HeapSnapshot {
    heaps: Vec<Heap>,
    objects: Vec<Vec<HeapObject>>,
    /// id -> (heap slot, position within heap)
    locations: HashMap<ObjectId, (usize, usize)>,
    stacks: HashMap<StackId, AllocationStack>,
    roots: Vec<GcRoot>,
    metaclass: Option<ObjectId>,
}

impl HeapSnapshot {
    /// Create an empty snapshot with the given heaps registered in order
    pub fn new<I, S>(heap_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let heaps: Vec<Heap> = heap_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Heap {
                id: HeapId(i),
                name: name.into(),
            })
            .collect();
        let objects = vec![Vec::new(); heaps.len()];

        Self {
            heaps,
            objects,
            ..Self::default()
        }
    }

    pub fn heap_by_name(&self, name: &str) -> Option<HeapId> {
        self.heaps.iter().find(|h| h.name == name).map(|h| h.id)
    }

    /// Add an object to its heap
    ///
    /// # Errors
    /// * `ParseError::InvalidFormat` - unregistered heap or duplicate id
    pub fn add_object(&mut self, object: HeapObject) -> Result<(), ParseError> {
        let slot = object.heap.0;
        if slot >= self.objects.len() {
            return Err(ParseError::InvalidFormat(format!(
                "object {} is on unregistered heap {:?}",
                object.id, object.heap
            )));
        }
        if self.locations.contains_key(&object.id) {
            return Err(ParseError::InvalidFormat(format!(
                "duplicate object id {}",
                object.id
            )));
        }

        self.locations
            .insert(object.id, (slot, self.objects[slot].len()));
        self.objects[slot].push(object);
        Ok(())
    }

    /// Register an allocation stack
    ///
    /// # Errors
    /// * `ParseError::InvalidFormat` - duplicate stack id
    pub fn add_stack(&mut self, stack: AllocationStack) -> Result<(), ParseError> {
        if self.stacks.contains_key(&stack.id) {
            return Err(ParseError::InvalidFormat(format!(
                "duplicate stack id {}",
                stack.id.0
            )));
        }
        self.stacks.insert(stack.id, stack);
        Ok(())
    }

    pub fn add_root(&mut self, root: GcRoot) {
        self.roots.push(root);
    }

    pub fn set_metaclass(&mut self, metaclass: ObjectId) {
        self.metaclass = Some(metaclass);
    }

    pub fn object_count(&self) -> usize {
        self.locations.len()
    }

    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }
}

impl HeapGraph for HeapSnapshot {
    fn heaps(&self) -> &[Heap] {
        &self.heaps
    }

    fn objects_on(&self, heap: HeapId) -> &[HeapObject] {
        self.objects.get(heap.0).map(Vec::as_slice).unwrap_or(&[])
    }

    fn object(&self, id: ObjectId) -> Option<&HeapObject> {
        let (slot, pos) = *self.locations.get(&id)?;
        self.objects.get(slot).and_then(|objs| objs.get(pos))
    }

    fn stack(&self, id: StackId) -> Option<&AllocationStack> {
        self.stacks.get(&id)
    }

    fn roots(&self) -> &[GcRoot] {
        &self.roots
    }

    fn metaclass(&self) -> Option<ObjectId> {
        self.metaclass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::model::StackFrame;

    #[test]
    fn test_heaps_registered_in_order() {
        let snapshot = HeapSnapshot::new(["app", "image", "zygote"]);
        let names: Vec<&str> = snapshot.heaps().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["app", "image", "zygote"]);
        assert_eq!(snapshot.heap_by_name("zygote"), Some(HeapId(2)));
        assert_eq!(snapshot.heap_name(HeapId(1)), Some("image"));
        assert_eq!(snapshot.heap_by_name("native"), None);
    }

    #[test]
    fn test_object_lookup() {
        let mut snapshot = HeapSnapshot::new(["app", "zygote"]);
        snapshot
            .add_object(HeapObject::new(ObjectId(7), HeapId(1), 24))
            .unwrap();

        assert_eq!(snapshot.object(ObjectId(7)).map(|o| o.size), Some(24));
        assert!(snapshot.object(ObjectId(8)).is_none());
        assert_eq!(snapshot.objects_on(HeapId(1)).len(), 1);
        assert!(snapshot.objects_on(HeapId(0)).is_empty());
        assert!(snapshot.objects_on(HeapId(9)).is_empty());
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_heaps() {
        let mut snapshot = HeapSnapshot::new(["app"]);
        snapshot
            .add_object(HeapObject::new(ObjectId(1), HeapId(0), 8))
            .unwrap();
        assert!(snapshot
            .add_object(HeapObject::new(ObjectId(1), HeapId(0), 8))
            .is_err());
        assert!(snapshot
            .add_object(HeapObject::new(ObjectId(2), HeapId(3), 8))
            .is_err());

        let stack = AllocationStack::new(StackId(1), vec![StackFrame::new("main")]);
        snapshot.add_stack(stack.clone()).unwrap();
        assert!(snapshot.add_stack(stack).is_err());
    }

    #[test]
    fn test_stack_of_object() {
        let mut snapshot = HeapSnapshot::new(["app"]);
        snapshot
            .add_stack(AllocationStack::new(StackId(3), vec![StackFrame::new("main")]))
            .unwrap();
        let with_stack = HeapObject::new(ObjectId(1), HeapId(0), 8).with_stack(StackId(3));
        let dangling = HeapObject::new(ObjectId(2), HeapId(0), 8).with_stack(StackId(4));

        assert_eq!(snapshot.stack_of(&with_stack).map(|s| s.frames.len()), Some(1));
        assert!(snapshot.stack_of(&dangling).is_none());
    }
}
