//! Plain-text summary of a heap report, for terminals.

use super::schema::HeapReport;

const PATH_WIDTH: usize = 52;

/// Render a report as a boxed text summary
///
/// **Public** - printed by `analyze --summary`
///
/// # Arguments
/// * `report` - Report to render
/// * `max_sites` - Number of site rows to print (the root row included)
pub fn generate_text_summary(report: &HeapReport, max_sites: usize) -> String {
    let mut lines = Vec::new();

    lines.push("  HEAPS".to_string());
    lines.push(format!("  ┏{}┳{}┳{}┓", "━".repeat(22), "━".repeat(16), "━".repeat(9)));
    lines.push(format!("  ┃ {:<20} ┃ {:^14} ┃ {:^7} ┃", "Heap", "BYTES", "%"));
    lines.push(format!("  ┣{}╋{}╋{}┫", "━".repeat(22), "━".repeat(16), "━".repeat(9)));
    for heap in &report.heaps {
        lines.push(format!(
            "  ┃ {:<20} ┃ {:>14} ┃ {:>6.1}% ┃",
            heap.name, heap.bytes, heap.percentage
        ));
    }
    lines.push(format!("  ┗{}┻{}┻{}┛", "━".repeat(22), "━".repeat(16), "━".repeat(9)));

    lines.push(String::new());
    lines.push(format!(
        "  Reachable: {} objects, {} bytes | Rooted: {} | GC roots: {}",
        report.reachable_objects,
        report.total_bytes,
        report.rooted_objects,
        report.gc_roots.values().sum::<u64>()
    ));

    lines.push(String::new());
    lines.push("  ALLOCATION SITES".to_string());
    lines.push(format!(
        "  ┏{}┳{}┳{}┳{}┓",
        "━".repeat(PATH_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));
    lines.push(format!(
        "  ┃ {:<width$} ┃ {:^14} ┃ {:^8} ┃ {:^7} ┃",
        "Site (outermost frame first)",
        "BYTES",
        "OBJECTS",
        "%",
        width = PATH_WIDTH
    ));
    lines.push(format!(
        "  ┣{}╋{}╋{}╋{}┫",
        "━".repeat(PATH_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));

    for site in report.sites.iter().take(max_sites) {
        let label = match site.path.last() {
            Some(frame) => format!("{}{}", "  ".repeat(site.depth.saturating_sub(1)), frame),
            None => "ROOT".to_string(),
        };

        lines.push(format!(
            "  ┃ {:<width$} ┃ {:>14} ┃ {:>8} ┃ {:>6.1}% ┃",
            truncate(&label, PATH_WIDTH),
            site.total_bytes,
            site.objects,
            site.percentage,
            width = PATH_WIDTH
        ));
    }

    lines.push(format!(
        "  ┗{}┻{}┻{}┻{}┛",
        "━".repeat(PATH_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));

    if report.sites.len() > max_sites {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing {} of {} listed sites)",
            max_sites,
            report.sites.len()
        ));
    }

    lines.join("\n")
}

/// Keep the tail of long frame labels, which holds the file and line
fn truncate(label: &str, width: usize) -> String {
    let count = label.chars().count();
    if count <= width {
        return label.to_string();
    }
    let tail: String = label.chars().skip(count - (width - 3)).collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::schema::{HeapTotal, SiteEntry};
    use std::collections::BTreeMap;

    fn site(path: &[&str], bytes: u64) -> SiteEntry {
        SiteEntry {
            path: path.iter().map(|s| s.to_string()).collect(),
            depth: path.len(),
            stack_id: None,
            total_bytes: bytes,
            percentage: 50.0,
            bytes_by_heap: BTreeMap::new(),
            objects: 1,
            top_classes: Vec::new(),
        }
    }

    fn report() -> HeapReport {
        HeapReport {
            version: "1.0.0".to_string(),
            source: "dump.json".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            total_bytes: 64,
            reachable_objects: 2,
            heaps: vec![HeapTotal {
                name: "app".to_string(),
                bytes: 64,
                percentage: 100.0,
            }],
            rooted_objects: 1,
            gc_roots: BTreeMap::from([("jni-global".to_string(), 2)]),
            sites: vec![site(&[], 64), site(&["main"], 32), site(&["main", "alloc"], 32)],
            top_dominators: Vec::new(),
        }
    }

    #[test]
    fn test_summary_lists_heaps_and_sites() {
        let text = generate_text_summary(&report(), 10);
        assert!(text.contains("app"));
        assert!(text.contains("ROOT"));
        assert!(text.contains("  alloc"));
        assert!(text.contains("GC roots: 2"));
        assert!(!text.contains("Showing"));
    }

    #[test]
    fn test_summary_truncates_site_list() {
        let text = generate_text_summary(&report(), 2);
        assert!(text.contains("Showing 2 of 3 listed sites"));
        assert!(!text.contains("alloc"));
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("short", 10), "short");
        let long = truncate("com.example.VeryLongClassName.method (File.java:10)", 20);
        assert_eq!(long.chars().count(), 20);
        assert!(long.ends_with("(File.java:10)"));
    }
}
