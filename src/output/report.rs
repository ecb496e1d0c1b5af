//! Build a `HeapReport` from an analysed heap dump.

use super::schema::{ClassEntry, DominatorEntry, HeapReport, HeapTotal, SiteEntry};
use crate::aggregator::{
    children_by_size, largest_dominators, percentage, sorted_class_infos, SiteId,
};
use crate::analysis::HeapAnalysis;
use crate::heap::{HeapGraph, HeapId};
use crate::utils::config::{
    DEFAULT_SITE_DEPTH, DEFAULT_TOP_CLASSES, DEFAULT_TOP_DOMINATORS, DEFAULT_TOP_SITES,
    SCHEMA_VERSION,
};
use chrono::Utc;
use log::debug;
use std::collections::BTreeMap;

/// How much of the analysis ends up in a report
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Children listed per site
    pub top_sites: usize,

    /// Deepest site depth listed
    pub site_depth: usize,

    pub top_classes: usize,
    pub top_dominators: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_sites: DEFAULT_TOP_SITES,
            site_depth: DEFAULT_SITE_DEPTH,
            top_classes: DEFAULT_TOP_CLASSES,
            top_dominators: DEFAULT_TOP_DOMINATORS,
        }
    }
}

/// Build a report from an analysis
///
/// **Public** - main entry point for report generation
///
/// # Arguments
/// * `graph` - Heap graph the analysis was built from
/// * `analysis` - Ownership index and site trie
/// * `source` - Name of the snapshot, recorded in the report
/// * `options` - Listing limits
pub fn build_report<G: HeapGraph + ?Sized>(
    graph: &G,
    analysis: &HeapAnalysis,
    source: &str,
    options: &ReportOptions,
) -> HeapReport {
    let ownership = analysis.ownership();
    let total_bytes = ownership.total_reachable_bytes();

    let heaps = ownership
        .heap_totals()
        .map(|(heap, bytes)| HeapTotal {
            name: heap_label(graph, heap),
            bytes,
            percentage: percentage(bytes, total_bytes),
        })
        .collect();

    let mut gc_roots: BTreeMap<String, u64> = BTreeMap::new();
    for (_, types) in ownership.roots() {
        for root_type in types {
            *gc_roots.entry(root_type.to_string()).or_insert(0) += 1;
        }
    }

    let sites = collect_sites(graph, analysis, total_bytes, options);
    debug!("Report lists {} sites", sites.len());

    let top_dominators = largest_dominators(ownership, options.top_dominators)
        .into_iter()
        .map(|(id, dominated)| {
            let object = graph.object(id);
            DominatorEntry {
                object: id.0,
                heap: object
                    .map(|o| heap_label(graph, o.heap))
                    .unwrap_or_default(),
                size: object.map(|o| o.size).unwrap_or(0),
                dominated,
                root_types: ownership
                    .root_types_of(id)
                    .map(|types| types.iter().map(|t| t.to_string()).collect())
                    .unwrap_or_default(),
            }
        })
        .collect();

    HeapReport {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        total_bytes,
        reachable_objects: ownership.reachable_count(),
        heaps,
        rooted_objects: ownership.rooted_objects().len(),
        gc_roots,
        sites,
        top_dominators,
    }
}

/// Depth-first walk of the trie, bigger children first
fn collect_sites<G: HeapGraph + ?Sized>(
    graph: &G,
    analysis: &HeapAnalysis,
    total_bytes: u64,
    options: &ReportOptions,
) -> Vec<SiteEntry> {
    let trie = analysis.sites();
    let mut entries = Vec::new();
    let mut pending: Vec<SiteId> = vec![trie.root()];

    while let Some(id) = pending.pop() {
        let site = &trie[id];
        let bytes = site.total_bytes();

        let top_classes = sorted_class_infos(site)
            .into_iter()
            .take(options.top_classes)
            .map(|(key, info)| ClassEntry {
                heap: heap_label(graph, key.heap),
                class: key.class.map(|c| c.0),
                instances: info.instance_count,
                bytes: info.total_bytes,
            })
            .collect();

        entries.push(SiteEntry {
            path: trie.path(id).into_iter().map(str::to_string).collect(),
            depth: site.depth(),
            stack_id: site.stack_id().map(|s| s.0),
            total_bytes: bytes,
            percentage: percentage(bytes, total_bytes),
            bytes_by_heap: site
                .bytes_by_heap()
                .iter()
                .map(|(heap, bytes)| (heap_label(graph, *heap), *bytes))
                .collect(),
            objects: site.objects().len(),
            top_classes,
        });

        if site.depth() < options.site_depth {
            let children = children_by_size(trie, id);
            // reversed so the biggest child is popped first
            pending.extend(children.into_iter().take(options.top_sites).rev());
        }
    }

    entries
}

fn heap_label<G: HeapGraph + ?Sized>(graph: &G, heap: HeapId) -> String {
    graph
        .heap_name(heap)
        .map(str::to_string)
        .unwrap_or_else(|| format!("heap#{}", heap.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{
        AllocationStack, Dominator, GcRoot, HeapObject, HeapSnapshot, ObjectId, RootType,
        StackFrame, StackId,
    };

    fn sample_graph() -> HeapSnapshot {
        let mut graph = HeapSnapshot::new(["app", "zygote"]);
        graph
            .add_stack(AllocationStack::new(
                StackId(1),
                vec![StackFrame::new("B"), StackFrame::new("A")],
            ))
            .unwrap();
        graph
            .add_stack(AllocationStack::new(
                StackId(2),
                vec![StackFrame::new("C"), StackFrame::new("A")],
            ))
            .unwrap();

        let objects = [
            HeapObject::new(ObjectId(1), HeapId(0), 10)
                .with_stack(StackId(1))
                .with_dominator(Dominator::Object(ObjectId(2))),
            HeapObject::new(ObjectId(2), HeapId(0), 20)
                .with_stack(StackId(2))
                .with_dominator(Dominator::SuperRoot),
            HeapObject::new(ObjectId(3), HeapId(1), 5).with_dominator(Dominator::SuperRoot),
        ];
        for object in objects {
            graph.add_object(object).unwrap();
        }
        graph.add_root(GcRoot {
            object: ObjectId(2),
            root_type: RootType::JniGlobal,
        });
        graph
    }

    #[test]
    fn test_report_totals() {
        let graph = sample_graph();
        let analysis = HeapAnalysis::new(&graph);
        let report = build_report(&graph, &analysis, "sample.json", &ReportOptions::default());

        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.total_bytes, 35);
        assert_eq!(report.reachable_objects, 3);
        assert_eq!(report.rooted_objects, 2);
        assert_eq!(report.heaps.len(), 2);
        assert_eq!(report.heaps[0].name, "app");
        assert_eq!(report.heaps[0].bytes, 30);
        assert_eq!(report.gc_roots.get("jni-global"), Some(&1));

        assert_eq!(report.top_dominators.len(), 1);
        assert_eq!(report.top_dominators[0].object, 2);
        assert_eq!(report.top_dominators[0].root_types, vec!["jni-global"]);
    }

    #[test]
    fn test_report_sites_are_depth_first_biggest_first() {
        let graph = sample_graph();
        let analysis = HeapAnalysis::new(&graph);
        let report = build_report(&graph, &analysis, "sample.json", &ReportOptions::default());

        let paths: Vec<String> = report.sites.iter().map(|s| s.path.join(";")).collect();
        assert_eq!(paths, vec!["", "A", "A;C", "A;B"]);
        assert_eq!(report.sites[0].bytes_by_heap.get("zygote"), Some(&5));
        assert_eq!(report.sites[1].total_bytes, 30);
    }

    #[test]
    fn test_report_respects_limits() {
        let graph = sample_graph();
        let analysis = HeapAnalysis::new(&graph);
        let options = ReportOptions {
            top_sites: 1,
            site_depth: 1,
            top_classes: 1,
            top_dominators: 0,
        };
        let report = build_report(&graph, &analysis, "sample.json", &options);

        let paths: Vec<String> = report.sites.iter().map(|s| s.path.join(";")).collect();
        assert_eq!(paths, vec!["", "A"]);
        assert!(report.sites.iter().all(|s| s.top_classes.len() <= 1));
        assert!(report.top_dominators.is_empty());
    }
}
