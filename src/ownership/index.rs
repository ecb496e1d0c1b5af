//! Dominator ownership index.
//!
//! Inverts the provider's immediate-dominator pointers into a
//! "dominates" forest and collects the per-heap and per-root facts the
//! presentation layer asks for. Built in one pass per heap, then frozen.

use crate::heap::{Dominator, HeapGraph, HeapId, HeapObject, ObjectId, RootType};
use crate::utils::error::AnalysisError;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Immutable ownership facts about one loaded heap dump
///
/// **Public** - built once by `OwnershipIndex::build`, queried read-only
#[derive(Debug, Default)]
pub struct OwnershipIndex {
    /// Dominator -> objects it immediately dominates, in visit order.
    /// A key is only present when the list is non-empty.
    dominated: HashMap<Dominator, Vec<ObjectId>>,

    /// Objects immediately dominated by the super-root
    rooted: Vec<ObjectId>,
    rooted_set: HashSet<ObjectId>,

    /// Every registered heap has an entry, even if it holds nothing reachable
    heap_total_bytes: BTreeMap<HeapId, u64>,

    /// Only populated for true GC roots
    root_types: HashMap<ObjectId, BTreeSet<RootType>>,

    /// Class objects whose class pointer was filled in with the metaclass
    repaired_classes: HashMap<ObjectId, ObjectId>,

    reachable_count: usize,
}

impl OwnershipIndex {
    /// Build the index from a heap graph
    ///
    /// **Public** - main entry point
    ///
    /// # Algorithm
    /// 1. Walk every heap in provider order, skipping unreachable objects
    /// 2. Sum shallow sizes per heap, collect super-root children
    /// 3. Append each object under its immediate dominator
    /// 4. Repair class objects that have no class pointer
    /// 5. Union GC root types per referred object
    ///
    /// Never fails: objects with missing data are left out.
    pub fn build<G: HeapGraph + ?Sized>(graph: &G) -> Self {
        let mut index = Self::default();

        for heap in graph.heaps() {
            let mut heap_bytes = 0u64;
            let mut reachable = 0usize;

            for object in graph.objects_on(heap.id) {
                if index.record(object) {
                    heap_bytes += object.size;
                    reachable += 1;
                }
            }

            index.heap_total_bytes.insert(heap.id, heap_bytes);
            index.reachable_count += reachable;
            debug!(
                "Heap '{}': {} reachable objects, {} bytes",
                heap.name, reachable, heap_bytes
            );
        }

        index.repair_class_objects(graph);
        index.collect_root_types(graph);

        info!(
            "Ownership index built: {} reachable objects, {} rooted, {} GC roots",
            index.reachable_count,
            index.rooted.len(),
            index.root_types.len()
        );

        index
    }

    /// Place one object in the forest; returns false if it is unreachable
    fn record(&mut self, object: &HeapObject) -> bool {
        let Some(dominator) = object.dominator else {
            return false;
        };

        match dominator {
            Dominator::SuperRoot => {
                if self.rooted_set.insert(object.id) {
                    self.rooted.push(object.id);
                }
            }
            Dominator::Object(id) if id == object.id => {
                warn!("Object {} claims to dominate itself, not linking it", object.id);
                return true;
            }
            Dominator::Object(_) => {}
        }

        self.dominated.entry(dominator).or_default().push(object.id);
        true
    }

    /// Give unresolved class objects the metaclass as their class
    fn repair_class_objects<G: HeapGraph + ?Sized>(&mut self, graph: &G) {
        let Some(metaclass) = graph.metaclass() else {
            return;
        };

        for heap in graph.heaps() {
            for object in graph.objects_on(heap.id) {
                if object.is_reachable() && object.is_unresolved_class_object() {
                    self.repaired_classes.insert(object.id, metaclass);
                }
            }
        }

        if !self.repaired_classes.is_empty() {
            debug!(
                "Assigned metaclass {} to {} class objects",
                metaclass,
                self.repaired_classes.len()
            );
        }
    }

    fn collect_root_types<G: HeapGraph + ?Sized>(&mut self, graph: &G) {
        let mut skipped = 0usize;

        for root in graph.roots() {
            if graph.object(root.object).is_none() {
                skipped += 1;
                continue;
            }
            self.root_types
                .entry(root.object)
                .or_default()
                .insert(root.root_type);
        }

        if skipped > 0 {
            warn!("Skipped {} GC roots referring to unknown objects", skipped);
        }
    }

    /// Objects immediately dominated by `object`
    ///
    /// `None` means the object dominates nothing.
    pub fn dominated_by(&self, object: ObjectId) -> Option<&[ObjectId]> {
        self.dominated
            .get(&Dominator::Object(object))
            .map(Vec::as_slice)
    }

    /// True if `object` is a declared GC root
    pub fn is_root(&self, object: ObjectId) -> bool {
        self.root_types.contains_key(&object)
    }

    /// True if the super-root is the immediate dominator of `object`
    pub fn is_rooted(&self, object: ObjectId) -> bool {
        self.rooted_set.contains(&object)
    }

    pub fn root_types_of(&self, object: ObjectId) -> Option<&BTreeSet<RootType>> {
        self.root_types.get(&object)
    }

    /// Total shallow bytes of reachable objects on `heap`
    ///
    /// # Errors
    /// * `AnalysisError::UnknownHeap` - the heap graph never declared `heap`
    pub fn heap_total_bytes(&self, heap: HeapId) -> Result<u64, AnalysisError> {
        self.heap_total_bytes
            .get(&heap)
            .copied()
            .ok_or(AnalysisError::UnknownHeap(heap))
    }

    /// Per-heap totals in heap order
    pub fn heap_totals(&self) -> impl Iterator<Item = (HeapId, u64)> + '_ {
        self.heap_total_bytes.iter().map(|(heap, bytes)| (*heap, *bytes))
    }

    pub fn total_reachable_bytes(&self) -> u64 {
        self.heap_total_bytes.values().sum()
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable_count
    }

    pub fn rooted_objects(&self) -> &[ObjectId] {
        &self.rooted
    }

    /// All dominators that dominate at least one object
    pub fn dominators(&self) -> impl Iterator<Item = (Dominator, &[ObjectId])> + '_ {
        self.dominated
            .iter()
            .map(|(dominator, objects)| (*dominator, objects.as_slice()))
    }

    /// GC roots with their type sets
    pub fn roots(&self) -> impl Iterator<Item = (ObjectId, &BTreeSet<RootType>)> + '_ {
        self.root_types.iter().map(|(id, types)| (*id, types))
    }

    /// Class of `object`, with the metaclass repair applied
    pub fn class_of(&self, object: &HeapObject) -> Option<ObjectId> {
        object
            .class
            .or_else(|| self.repaired_classes.get(&object.id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{GcRoot, HeapSnapshot, ObjectKind};

    fn obj(id: u64, heap: usize, size: u64) -> HeapObject {
        HeapObject::new(ObjectId(id), HeapId(heap), size)
    }

    fn snapshot(objects: Vec<HeapObject>) -> HeapSnapshot {
        let mut snapshot = HeapSnapshot::new(["app", "image", "zygote"]);
        for object in objects {
            snapshot.add_object(object).unwrap();
        }
        snapshot
    }

    #[test]
    fn test_unreachable_objects_are_excluded() {
        let graph = snapshot(vec![
            obj(1, 0, 10).with_dominator(Dominator::SuperRoot),
            obj(2, 0, 99),
            obj(3, 0, 5).with_dominator(Dominator::Object(ObjectId(1))),
        ]);
        let index = OwnershipIndex::build(&graph);

        assert_eq!(index.heap_total_bytes(HeapId(0)), Ok(15));
        assert_eq!(index.reachable_count(), 2);
        assert!(index.dominated_by(ObjectId(2)).is_none());
        assert!(!index.is_rooted(ObjectId(2)));
    }

    #[test]
    fn test_every_registered_heap_has_a_total() {
        let graph = snapshot(vec![obj(1, 0, 10).with_dominator(Dominator::SuperRoot)]);
        let index = OwnershipIndex::build(&graph);

        assert_eq!(index.heap_total_bytes(HeapId(1)), Ok(0));
        assert_eq!(index.heap_total_bytes(HeapId(2)), Ok(0));
        assert_eq!(
            index.heap_total_bytes(HeapId(3)),
            Err(AnalysisError::UnknownHeap(HeapId(3)))
        );
        assert_eq!(index.heap_totals().count(), 3);
    }

    #[test]
    fn test_dominated_lists_keep_visit_order() {
        let graph = snapshot(vec![
            obj(1, 0, 8).with_dominator(Dominator::SuperRoot),
            obj(2, 0, 8).with_dominator(Dominator::Object(ObjectId(1))),
            obj(3, 2, 8).with_dominator(Dominator::Object(ObjectId(1))),
            obj(4, 0, 8).with_dominator(Dominator::Object(ObjectId(1))),
        ]);
        let index = OwnershipIndex::build(&graph);

        // heap 0 is walked before heap 2
        assert_eq!(
            index.dominated_by(ObjectId(1)),
            Some(&[ObjectId(2), ObjectId(4), ObjectId(3)][..])
        );
        assert_eq!(index.rooted_objects(), &[ObjectId(1)]);
    }

    #[test]
    fn test_self_domination_is_not_linked() {
        let graph = snapshot(vec![
            obj(1, 0, 8).with_dominator(Dominator::Object(ObjectId(1))),
        ]);
        let index = OwnershipIndex::build(&graph);

        assert!(index.dominated_by(ObjectId(1)).is_none());
        assert_eq!(index.heap_total_bytes(HeapId(0)), Ok(8));
    }

    #[test]
    fn test_root_types_are_unioned() {
        let mut graph = snapshot(vec![
            obj(1, 0, 8).with_dominator(Dominator::SuperRoot),
            obj(2, 0, 8).with_dominator(Dominator::SuperRoot),
        ]);
        graph.add_root(GcRoot {
            object: ObjectId(1),
            root_type: RootType::JniGlobal,
        });
        graph.add_root(GcRoot {
            object: ObjectId(1),
            root_type: RootType::StickyClass,
        });
        graph.add_root(GcRoot {
            object: ObjectId(1),
            root_type: RootType::JniGlobal,
        });
        graph.add_root(GcRoot {
            object: ObjectId(42),
            root_type: RootType::JavaFrame,
        });
        let index = OwnershipIndex::build(&graph);

        let types: Vec<RootType> = index
            .root_types_of(ObjectId(1))
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(types, vec![RootType::JniGlobal, RootType::StickyClass]);
        assert!(index.is_root(ObjectId(1)));
        assert!(!index.is_root(ObjectId(2)));
        assert!(index.root_types_of(ObjectId(2)).is_none());
        assert!(!index.is_root(ObjectId(42)));
    }

    #[test]
    fn test_metaclass_repair() {
        let mut graph = snapshot(vec![
            obj(1, 1, 8)
                .with_kind(ObjectKind::Class)
                .with_dominator(Dominator::SuperRoot),
            obj(2, 1, 8)
                .with_kind(ObjectKind::Class)
                .with_class(ObjectId(1))
                .with_dominator(Dominator::SuperRoot),
            obj(3, 0, 8).with_dominator(Dominator::SuperRoot),
        ]);
        graph.set_metaclass(ObjectId(1));
        let index = OwnershipIndex::build(&graph);

        let class_of = |id: u64| {
            let object = graph.object(ObjectId(id)).unwrap();
            index.class_of(object)
        };
        assert_eq!(class_of(1), Some(ObjectId(1)));
        assert_eq!(class_of(2), Some(ObjectId(1)));
        // plain instances are never repaired
        assert_eq!(class_of(3), None);
    }

    #[test]
    fn test_no_metaclass_leaves_classes_alone() {
        let graph = snapshot(vec![obj(1, 1, 8)
            .with_kind(ObjectKind::Class)
            .with_dominator(Dominator::SuperRoot)]);
        let index = OwnershipIndex::build(&graph);

        assert_eq!(index.class_of(graph.object(ObjectId(1)).unwrap()), None);
    }
}
