//! Hierarchy views and textual reference analysis over a pre-built code relationship graph.
//!
//! The graph (entities plus directed edges) is produced elsewhere and handed in as a
//! [`GraphModel`]. From it this crate builds depth-bounded trees rooted at one entity,
//! filters the graph by category while bridging hidden intermediates, and scans
//! neighbors' source text for usages of the selected symbol.

pub mod config;
pub mod filter;
pub mod graph;
pub mod hierarchy;
pub mod references;
pub mod usage;

pub use filter::{
    FilterOptions, FilterOutcome, FilterStats, MAX_REMAP_HOPS, RemappedConnection,
    build_filtered_tree, filter_tree,
};
pub use graph::{GraphIndex, GraphModel, edge::Edge, node::CodeEntity};
pub use hierarchy::{
    HierarchyNode, HierarchyStats, HierarchyTree, PARENT_DEPTH, build_tree, collapse_all,
    expand_all, expand_to_depth, find_node, hierarchy_stats, toggle_node, visible_nodes,
};
pub use references::{ReferenceFile, ReferenceOptions, analyze_references, analyze_references_with};
pub use usage::{PatternUsageScanner, Usage, UsageExtractor, UsageKind, find_usages};
