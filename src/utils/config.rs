//! Configuration and constants for the CLI and the analysis core.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Name given to the root node of every allocation-site trie
pub const ROOT_SITE_NAME: &str = "ROOT";

/// Tag used in snapshot files for the synthetic super-root dominator
pub const SUPER_ROOT_TAG: &str = "root";

// Report defaults
pub const DEFAULT_TOP_SITES: usize = 20;
pub const DEFAULT_TOP_CLASSES: usize = 5;
pub const DEFAULT_TOP_DOMINATORS: usize = 10;

/// Sites deeper than this are not listed in reports unless asked for
pub const DEFAULT_SITE_DEPTH: usize = 8;
