//! Shared aggregates and ordering helpers.
//!
//! The presentation layer always lists the biggest things first; these
//! comparators keep that ordering consistent (and deterministic) across
//! sites, classes, objects and dominators.

use super::site_trie::{Site, SiteId, SiteTrie};
use crate::heap::{Dominator, HeapId, HeapObject, ObjectId};
use crate::ownership::OwnershipIndex;
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Key of a per-class aggregate: the heap and the (possibly unknown) class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey {
    pub heap: HeapId,
    pub class: Option<ObjectId>,
}

/// Instance count and shallow bytes for one class on one heap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassInfo {
    pub instance_count: u64,
    pub total_bytes: u64,
}

impl ClassInfo {
    pub fn add(&mut self, size: u64) {
        self.instance_count += 1;
        self.total_bytes += size;
    }
}

/// Sum of a per-heap byte map
pub fn total_of(bytes_by_heap: &BTreeMap<HeapId, u64>) -> u64 {
    bytes_by_heap.values().sum()
}

/// Percentage of `part` in `total`, 0 when there is nothing to divide by
pub fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Bigger sites first, then by name
pub fn compare_sites_by_size(a: &Site, b: &Site) -> Ordering {
    b.total_bytes()
        .cmp(&a.total_bytes())
        .then_with(|| a.name().cmp(b.name()))
}

/// Bigger classes first, then more instances, then by key
pub fn compare_class_infos(a: &(ClassKey, ClassInfo), b: &(ClassKey, ClassInfo)) -> Ordering {
    b.1.total_bytes
        .cmp(&a.1.total_bytes)
        .then_with(|| b.1.instance_count.cmp(&a.1.instance_count))
        .then_with(|| a.0.cmp(&b.0))
}

/// Bigger objects first, then by id
pub fn compare_objects_by_size(a: &HeapObject, b: &HeapObject) -> Ordering {
    b.size.cmp(&a.size).then_with(|| a.id.cmp(&b.id))
}

/// Children of `node`, biggest first
pub fn children_by_size(trie: &SiteTrie, node: SiteId) -> Vec<SiteId> {
    let Some(site) = trie.get(node) else {
        return Vec::new();
    };

    let mut children: Vec<SiteId> = site.children().values().copied().collect();
    children.sort_by(|a, b| compare_sites_by_size(&trie[*a], &trie[*b]));
    children
}

/// Per-class aggregates of a site, biggest first
pub fn sorted_class_infos(site: &Site) -> Vec<(ClassKey, ClassInfo)> {
    let mut infos: Vec<(ClassKey, ClassInfo)> = site
        .class_infos()
        .iter()
        .map(|(key, info)| (*key, *info))
        .collect();
    infos.sort_by(compare_class_infos);
    infos
}

/// Objects dominating the most objects directly
///
/// The super-root is not an object and is left out.
pub fn largest_dominators(index: &OwnershipIndex, top_n: usize) -> Vec<(ObjectId, usize)> {
    let mut dominators: Vec<(ObjectId, usize)> = index
        .dominators()
        .filter_map(|(dominator, objects)| match dominator {
            Dominator::Object(id) => Some((id, objects.len())),
            Dominator::SuperRoot => None,
        })
        .collect();

    debug!(
        "Ranking {} dominators, keeping top {}",
        dominators.len(),
        top_n
    );

    dominators.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    dominators.truncate(top_n);
    dominators
}
