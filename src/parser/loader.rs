//! Snapshot loader.
//!
//! Parses the JSON snapshot format into a `HeapSnapshot`. Structural
//! problems (unknown heap, duplicate ids, bad dominator tags) are errors;
//! dangling references are tolerated and only logged, since captures are
//! often partially broken and the rest of the dump is still worth analysing.

use super::schema::{RawDominator, RawObject, RawSnapshot};
use crate::heap::{
    AllocationStack, Dominator, GcRoot, HeapObject, HeapSnapshot, ObjectId, StackId,
};
use crate::utils::config::SUPER_ROOT_TAG;
use crate::utils::error::ParseError;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load a snapshot file from disk
///
/// **Public** - main entry point for the CLI
///
/// # Errors
/// * `ParseError::IoError` - the file cannot be opened
/// * `ParseError::JsonError` - the file is not valid snapshot JSON
/// * `ParseError::InvalidFormat` - see `into_snapshot`
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<HeapSnapshot, ParseError> {
    let path = path.as_ref();
    info!("Loading heap snapshot from: {}", path.display());

    let file = File::open(path)?;
    let raw: RawSnapshot = serde_json::from_reader(BufReader::new(file))?;

    into_snapshot(raw)
}

/// Parse a snapshot from a JSON string
pub fn parse_snapshot(json: &str) -> Result<HeapSnapshot, ParseError> {
    let raw: RawSnapshot = serde_json::from_str(json)?;
    into_snapshot(raw)
}

/// Convert the raw document into a validated `HeapSnapshot`
///
/// **Public** - useful for snapshots built in memory
///
/// # Errors
/// * `ParseError::InvalidFormat` - duplicate heap names, objects on an
///   unlisted heap, duplicate object or stack ids, unknown dominator tags
pub fn into_snapshot(raw: RawSnapshot) -> Result<HeapSnapshot, ParseError> {
    validate_heap_names(&raw.heaps)?;

    debug!(
        "Snapshot has {} heaps, {} objects, {} stacks, {} roots",
        raw.heaps.len(),
        raw.objects.len(),
        raw.stacks.len(),
        raw.roots.len()
    );

    let mut snapshot = HeapSnapshot::new(raw.heaps);

    for stack in raw.stacks {
        snapshot.add_stack(AllocationStack::new(StackId(stack.id), stack.frames))?;
    }

    for raw_object in raw.objects {
        let object = convert_object(&snapshot, raw_object)?;
        snapshot.add_object(object)?;
    }

    for root in raw.roots {
        snapshot.add_root(GcRoot {
            object: ObjectId(root.object),
            root_type: root.root_type,
        });
    }

    if let Some(metaclass) = raw.metaclass {
        snapshot.set_metaclass(ObjectId(metaclass));
    }

    report_dangling_references(&snapshot);

    info!(
        "Loaded {} objects and {} stacks",
        snapshot.object_count(),
        snapshot.stack_count()
    );

    Ok(snapshot)
}

fn validate_heap_names(heaps: &[String]) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for name in heaps {
        if !seen.insert(name.as_str()) {
            return Err(ParseError::InvalidFormat(format!(
                "heap '{}' is listed twice",
                name
            )));
        }
    }
    Ok(())
}

fn convert_object(snapshot: &HeapSnapshot, raw: RawObject) -> Result<HeapObject, ParseError> {
    let heap = snapshot.heap_by_name(&raw.heap).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "object {} is on unknown heap '{}'",
            raw.id, raw.heap
        ))
    })?;

    let dominator = raw
        .dominator
        .map(|d| parse_dominator(raw.id, d))
        .transpose()?;

    Ok(HeapObject {
        id: ObjectId(raw.id),
        heap,
        size: raw.size,
        kind: raw.kind,
        class: raw.class.map(ObjectId),
        dominator,
        stack: raw.stack.map(StackId),
    })
}

fn parse_dominator(object: u64, raw: RawDominator) -> Result<Dominator, ParseError> {
    match raw {
        RawDominator::Object(id) => Ok(Dominator::Object(ObjectId(id))),
        RawDominator::Tag(tag) if tag == SUPER_ROOT_TAG => Ok(Dominator::SuperRoot),
        RawDominator::Tag(tag) => Err(ParseError::InvalidFormat(format!(
            "object {} has unknown dominator tag '{}'",
            object, tag
        ))),
    }
}

/// Log references that point at nothing; these are not fatal
fn report_dangling_references(snapshot: &HeapSnapshot) {
    use crate::heap::HeapGraph;

    let mut missing_stacks = 0usize;
    let mut missing_dominators = 0usize;

    for heap in snapshot.heaps() {
        for object in snapshot.objects_on(heap.id) {
            if object.stack.is_some() && snapshot.stack_of(object).is_none() {
                missing_stacks += 1;
            }
            if let Some(Dominator::Object(id)) = object.dominator {
                if snapshot.object(id).is_none() {
                    missing_dominators += 1;
                }
            }
        }
    }

    if missing_stacks > 0 {
        warn!(
            "{} objects refer to unknown stacks and will be attributed to the root site",
            missing_stacks
        );
    }
    if missing_dominators > 0 {
        warn!("{} objects refer to unknown dominators", missing_dominators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{HeapGraph, HeapId, ObjectKind, RootType};

    const SAMPLE: &str = r#"{
        "heaps": ["app", "image", "zygote"],
        "metaclass": 1,
        "objects": [
            { "id": 1, "heap": "image", "size": 96, "kind": "class", "dominator": "root" },
            { "id": 2, "heap": "app", "size": 24, "class": 1, "dominator": 1, "stack": 7 },
            { "id": 3, "heap": "app", "size": 16, "dominator": null }
        ],
        "stacks": [
            { "id": 7, "frames": [{ "method": "Foo.alloc", "file": "Foo.java", "line": 12 }] }
        ],
        "roots": [{ "object": 1, "type": "sticky-class" }]
    }"#;

    #[test]
    fn test_parse_sample() {
        let snapshot = parse_snapshot(SAMPLE).unwrap();

        assert_eq!(snapshot.heaps().len(), 3);
        assert_eq!(snapshot.object_count(), 3);
        assert_eq!(snapshot.metaclass(), Some(ObjectId(1)));

        let class = snapshot.object(ObjectId(1)).unwrap();
        assert_eq!(class.kind, ObjectKind::Class);
        assert_eq!(class.heap, HeapId(1));
        assert_eq!(class.dominator, Some(Dominator::SuperRoot));

        let instance = snapshot.object(ObjectId(2)).unwrap();
        assert_eq!(instance.dominator, Some(Dominator::Object(ObjectId(1))));
        assert_eq!(instance.class, Some(ObjectId(1)));
        assert_eq!(
            snapshot.stack_of(instance).unwrap().frames[0].label(),
            "Foo.alloc (Foo.java:12)"
        );

        assert!(!snapshot.object(ObjectId(3)).unwrap().is_reachable());
        assert_eq!(snapshot.roots()[0].root_type, RootType::StickyClass);
    }

    #[test]
    fn test_unknown_heap_is_rejected() {
        let json = r#"{ "heaps": ["app"], "objects": [{ "id": 1, "heap": "native", "size": 1 }] }"#;
        let err = parse_snapshot(json).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_bad_dominator_tag_is_rejected() {
        let json = r#"{ "heaps": ["app"], "objects": [{ "id": 1, "heap": "app", "dominator": "gc" }] }"#;
        assert!(matches!(
            parse_snapshot(json),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_heaps_are_rejected() {
        let json = r#"{ "heaps": ["app", "app"] }"#;
        assert!(matches!(
            parse_snapshot(json),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_dangling_references_are_tolerated() {
        let json = r#"{
            "heaps": ["app"],
            "objects": [{ "id": 1, "heap": "app", "size": 4, "dominator": 99, "stack": 5 }],
            "roots": [{ "object": 42, "type": "jni-global" }]
        }"#;
        let snapshot = parse_snapshot(json).unwrap();
        assert_eq!(snapshot.object_count(), 1);
        assert_eq!(snapshot.roots().len(), 1);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_snapshot("{ not json"),
            Err(ParseError::JsonError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_snapshot("/nonexistent/snapshot.json"),
            Err(ParseError::IoError(_))
        ));
    }
}
