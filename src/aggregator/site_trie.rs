//! Allocation-site trie.
//!
//! Every reachable object is pushed down a path of frame labels, outermost
//! frame first. Each node on the path, not just the last one, keeps
//! cumulative byte, object and per-class totals.
//!
//! Example: an object allocated under "main -> load -> parse" is counted at
//! ROOT, at "main", at "main;load" and at "main;load;parse".

use super::metrics::{total_of, ClassInfo, ClassKey};
use crate::heap::{AllocationStack, HeapGraph, HeapId, HeapObject, ObjectId, StackId};
use crate::ownership::OwnershipIndex;
use crate::utils::config::ROOT_SITE_NAME;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

/// Handle of a node in a `SiteTrie` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(usize);

impl SiteId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the allocation-site trie
#[derive(Debug, Clone)]
pub struct Site {
    name: String,

    /// Back-reference for path reconstruction; `None` only for the root
    parent: Option<SiteId>,

    /// Stack that first reached this node, kept for display only
    stack_id: Option<StackId>,
    depth: usize,

    bytes_by_heap: BTreeMap<HeapId, u64>,
    children: HashMap<String, SiteId>,
    objects: Vec<ObjectId>,
    class_infos: HashMap<ClassKey, ClassInfo>,
}

impl Site {
    fn new(name: String, parent: Option<SiteId>, stack_id: Option<StackId>, depth: usize) -> Self {
        Self {
            name,
            parent,
            stack_id,
            depth,
            bytes_by_heap: BTreeMap::new(),
            children: HashMap::new(),
            objects: Vec::new(),
            class_infos: HashMap::new(),
        }
    }

    fn record(&mut self, object: &HeapObject, class: Option<ObjectId>) {
        self.objects.push(object.id);
        *self.bytes_by_heap.entry(object.heap).or_insert(0) += object.size;
        self.class_infos
            .entry(ClassKey {
                heap: object.heap,
                class,
            })
            .or_default()
            .add(object.size);
    }

    /// Frame label leading here from the parent
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<SiteId> {
        self.parent
    }

    pub fn stack_id(&self) -> Option<StackId> {
        self.stack_id
    }

    /// Number of frames between the root and this node
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bytes_by_heap(&self) -> &BTreeMap<HeapId, u64> {
        &self.bytes_by_heap
    }

    pub fn bytes_on(&self, heap: HeapId) -> u64 {
        self.bytes_by_heap.get(&heap).copied().unwrap_or(0)
    }

    pub fn total_bytes(&self) -> u64 {
        total_of(&self.bytes_by_heap)
    }

    pub fn children(&self) -> &HashMap<String, SiteId> {
        &self.children
    }

    pub fn child(&self, label: &str) -> Option<SiteId> {
        self.children.get(label).copied()
    }

    /// Objects allocated here or anywhere below
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn class_infos(&self) -> &HashMap<ClassKey, ClassInfo> {
        &self.class_infos
    }

    pub fn class_info(&self, heap: HeapId, class: Option<ObjectId>) -> Option<ClassInfo> {
        self.class_infos.get(&ClassKey { heap, class }).copied()
    }
}

/// Arena-backed trie of allocation sites
///
/// **Public** - built once per heap dump, read-only afterwards
#[derive(Debug, Clone)]
pub struct SiteTrie {
    sites: Vec<Site>,
}

impl Default for SiteTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteTrie {
    pub const ROOT: SiteId = SiteId(0);

    /// Create a trie holding only the root site
    pub fn new() -> Self {
        Self {
            sites: vec![Site::new(ROOT_SITE_NAME.to_string(), None, None, 0)],
        }
    }

    /// Build the trie from every reachable object of a heap graph
    ///
    /// **Public** - main entry point for site aggregation
    ///
    /// # Arguments
    /// * `graph` - Heap graph supplying objects and stacks
    /// * `index` - Ownership index, consulted for repaired class pointers
    ///
    /// Objects without a usable stack are attributed to the root.
    pub fn build<G: HeapGraph + ?Sized>(graph: &G, index: &OwnershipIndex) -> Self {
        let mut trie = Self::new();
        let mut inserted = 0usize;
        let mut at_root = 0usize;

        for heap in graph.heaps() {
            for object in graph.objects_on(heap.id) {
                if !object.is_reachable() {
                    continue;
                }

                let stack = graph.stack_of(object);
                if trie.insert(object, index.class_of(object), stack) == Self::ROOT {
                    at_root += 1;
                }
                inserted += 1;
            }
        }

        if at_root > 0 {
            debug!("{} objects have no usable allocation stack", at_root);
        }
        info!(
            "Site trie built: {} objects across {} sites",
            inserted,
            trie.len()
        );

        trie
    }

    /// Attribute one object to the path of its allocation stack
    ///
    /// Returns the deepest site reached, which is the object's allocation
    /// site. Children are keyed by frame label only.
    pub fn insert(
        &mut self,
        object: &HeapObject,
        class: Option<ObjectId>,
        stack: Option<&AllocationStack>,
    ) -> SiteId {
        let mut current = Self::ROOT;
        self.sites[current.0].record(object, class);

        if let Some(stack) = stack {
            for frame in stack.frames.iter().rev() {
                current = self.child_or_insert(current, frame.label(), stack.id);
                self.sites[current.0].record(object, class);
            }
        }

        current
    }

    fn child_or_insert(&mut self, parent: SiteId, label: String, stack_id: StackId) -> SiteId {
        if let Some(existing) = self.sites[parent.0].child(&label) {
            return existing;
        }

        let id = SiteId(self.sites.len());
        let depth = self.sites[parent.0].depth + 1;
        self.sites
            .push(Site::new(label.clone(), Some(parent), Some(stack_id), depth));
        self.sites[parent.0].children.insert(label, id);
        id
    }

    pub fn root(&self) -> SiteId {
        Self::ROOT
    }

    pub fn get(&self, id: SiteId) -> Option<&Site> {
        self.sites.get(id.0)
    }

    /// Number of sites, root included
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites[0].objects.is_empty()
    }

    /// Follow `path` (outermost first) down from `node`
    ///
    /// Never creates sites. `None` if any segment is missing.
    pub fn child_by_path<S: AsRef<str>>(&self, node: SiteId, path: &[S]) -> Option<SiteId> {
        path.iter()
            .try_fold(node, |site, label| self.get(site)?.child(label.as_ref()))
    }

    /// Allocation site of `object`, found by re-walking its stack
    ///
    /// Falls back to the root when the stack is empty, unknown, or leads
    /// somewhere the trie does not reach.
    pub fn site_for_object<G: HeapGraph + ?Sized>(&self, graph: &G, object: &HeapObject) -> SiteId {
        match graph.stack_of(object) {
            Some(stack) => self.site_at(stack, None),
            None => Self::ROOT,
        }
    }

    /// Site reached by the first `max_depth` frames of `stack`
    ///
    /// `None` walks the whole stack. Falls back to the root on any miss.
    pub fn site_at(&self, stack: &AllocationStack, max_depth: Option<usize>) -> SiteId {
        let mut labels = stack.labels_outermost_first();
        if let Some(depth) = max_depth {
            labels.truncate(depth);
        }

        self.child_by_path(Self::ROOT, &labels).unwrap_or_else(|| {
            debug!("Stack {} not found in site trie, using root", stack.id.0);
            Self::ROOT
        })
    }

    /// Cumulative bytes at `node` across all heaps
    pub fn total_bytes(&self, node: SiteId) -> u64 {
        self.get(node).map(Site::total_bytes).unwrap_or(0)
    }

    /// Frame labels from the root down to `node`, root excluded
    pub fn path(&self, node: SiteId) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut current = self.get(node);

        while let Some(site) = current {
            let Some(parent) = site.parent else {
                break;
            };
            labels.push(site.name.as_str());
            current = self.get(parent);
        }

        labels.reverse();
        labels
    }

    /// Ancestor of `node` at trie depth `depth` (or `node` itself if shallower)
    pub fn ancestor_at(&self, node: SiteId, depth: usize) -> SiteId {
        let mut current = node;
        while let Some(site) = self.get(current) {
            match site.parent {
                Some(parent) if site.depth > depth => current = parent,
                _ => break,
            }
        }
        current
    }

    /// Iterate over every site with its handle, root first
    pub fn iter(&self) -> impl Iterator<Item = (SiteId, &Site)> {
        self.sites.iter().enumerate().map(|(i, site)| (SiteId(i), site))
    }
}

impl Index<SiteId> for SiteTrie {
    type Output = Site;

    fn index(&self, id: SiteId) -> &Site {
        &self.sites[id.0]
    }
}
