//! One analysed heap dump.
//!
//! Bundles the ownership index and the site trie built from the same heap
//! graph. Both are frozen once built, so a `HeapAnalysis` can be shared
//! between any number of reader threads (e.g. behind an `Arc`).

use crate::aggregator::{SiteId, SiteTrie};
use crate::heap::{HeapGraph, HeapObject};
use crate::ownership::OwnershipIndex;
use log::info;
use std::time::Instant;

/// Ownership index plus allocation-site trie for one heap dump
///
/// **Public** - what the presentation layer is handed
#[derive(Debug)]
pub struct HeapAnalysis {
    ownership: OwnershipIndex,
    sites: SiteTrie,
}

impl HeapAnalysis {
    /// Run both passes over `graph`
    ///
    /// The ownership index is built first; the site trie then uses its
    /// repaired class pointers.
    pub fn new<G: HeapGraph + ?Sized>(graph: &G) -> Self {
        let start = Instant::now();

        let ownership = OwnershipIndex::build(graph);
        info!(
            "Ownership pass done in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        let sites_start = Instant::now();
        let sites = SiteTrie::build(graph, &ownership);
        info!(
            "Site pass done in {:.2}s",
            sites_start.elapsed().as_secs_f64()
        );

        Self { ownership, sites }
    }

    pub fn ownership(&self) -> &OwnershipIndex {
        &self.ownership
    }

    pub fn sites(&self) -> &SiteTrie {
        &self.sites
    }

    /// Allocation site of `object`
    pub fn site_for_object<G: HeapGraph + ?Sized>(&self, graph: &G, object: &HeapObject) -> SiteId {
        self.sites.site_for_object(graph, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Dominator, HeapId, HeapSnapshot, ObjectId};
    use std::sync::Arc;
    use std::thread;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_analysis_is_shareable() {
        assert_send_sync::<HeapAnalysis>();

        let mut graph = HeapSnapshot::new(["app"]);
        graph
            .add_object(
                HeapObject::new(ObjectId(1), HeapId(0), 12).with_dominator(Dominator::SuperRoot),
            )
            .unwrap();
        let analysis = Arc::new(HeapAnalysis::new(&graph));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let analysis = Arc::clone(&analysis);
                thread::spawn(move || analysis.ownership().heap_total_bytes(HeapId(0)))
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), Ok(12));
        }
        assert_eq!(analysis.sites().total_bytes(SiteTrie::ROOT), 12);
    }
}
