use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{GraphIndex, GraphModel, edge::Edge, node::CodeEntity};
use crate::hierarchy::{HierarchyTree, build_tree};

/// Longest original path, in edges, that a remapped connection may replace.
pub const MAX_REMAP_HOPS: usize = 3;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Which categories survive filtering and whether paths through hidden entities
/// are bridged with synthetic edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Allowed categories. Empty disables filtering entirely.
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Bridge retained entities that were only connected through filtered ones.
    #[serde(default)]
    pub skip_filtered_nodes: bool,
}

impl FilterOptions {
    pub fn new<I, S>(categories: I, skip_filtered_nodes: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            skip_filtered_nodes,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// A synthetic edge standing in for a path through filtered-out entities.
///
/// The connection is approximate: it records that the endpoints were related through
/// hidden intermediates, not what the relation was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemappedConnection {
    /// Full original path, endpoints included.
    pub original_path: Vec<String>,
    pub remapped_source: String,
    pub remapped_target: String,
    /// `remapped_<n>_hops`, where n is the number of skipped entities.
    pub relationship: String,
    pub skipped_nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub original_nodes: usize,
    pub filtered_nodes: usize,
    pub original_edges: usize,
    pub filtered_edges: usize,
    pub remapped_connections: usize,
    /// Categories present in the graph but not allowed, sorted.
    pub filtered_categories: Vec<String>,
}

/// Result of [`filter_tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub graph: GraphModel,
    pub remapped_connections: Vec<RemappedConnection>,
    pub stats: FilterStats,
}

// ---------------------------------------------------------------------------
// Remapping search
// ---------------------------------------------------------------------------

struct Remapper<'a, 'r> {
    index: &'r GraphIndex<'a>,
    retained: &'r HashSet<&'a str>,
    pairs: HashSet<(&'a str, &'a str)>,
    edges: Vec<Edge>,
    connections: Vec<RemappedConnection>,
}

impl<'a> Remapper<'a, '_> {
    /// Depth-first walk from the last entity of `path`, continuing only through
    /// filtered entities and stopping at the first retained one on each branch.
    fn search(&mut self, path: &mut Vec<&'a CodeEntity>) {
        if path.len() > MAX_REMAP_HOPS {
            return;
        }
        let Some(current) = path.last().copied() else {
            return;
        };

        for (_, next) in self.index.outgoing(&current.id) {
            if path.iter().any(|p| p.id == next.id) {
                continue;
            }
            path.push(next);
            if self.retained.contains(next.id.as_str()) {
                // Two-entity paths are plain edges already kept by the induced subgraph.
                if path.len() > 2 {
                    self.record(path);
                }
            } else {
                self.search(path);
            }
            path.pop();
        }
    }

    fn record(&mut self, path: &[&'a CodeEntity]) {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return;
        };
        if !self.pairs.insert((first.id.as_str(), last.id.as_str())) {
            return;
        }

        let skipped: Vec<String> = path[1..path.len() - 1].iter().map(|e| e.id.clone()).collect();
        let relationship = format!("remapped_{}_hops", skipped.len());

        self.edges.push(Edge::labeled(
            first.id.clone(),
            last.id.clone(),
            relationship.clone(),
        ));
        self.connections.push(RemappedConnection {
            original_path: path.iter().map(|e| e.id.clone()).collect(),
            remapped_source: first.id.clone(),
            remapped_target: last.id.clone(),
            relationship,
            skipped_nodes: skipped,
        });
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Remove entities whose category is not allowed.
///
/// With `skip_filtered_nodes` the induced subgraph is extended with one synthetic edge
/// per retained pair that was connected only through filtered entities (at most
/// [`MAX_REMAP_HOPS`] edges, following edge direction). The first path found for a
/// pair wins. An empty category set returns the graph unchanged.
pub fn filter_tree(graph: &GraphModel, options: &FilterOptions) -> FilterOutcome {
    filter_graph(graph, options, None)
}

/// Filter, then build a tree rooted at `selected` over the filtered graph.
///
/// The selected entity is always retained so the root survives its own filter.
/// `filter_stats` is attached whenever filtering is active, `remapped_connections`
/// whenever remapping is enabled.
pub fn build_filtered_tree(
    selected: &CodeEntity,
    graph: &GraphModel,
    max_depth: usize,
    options: &FilterOptions,
) -> HierarchyTree {
    if !options.is_active() {
        return build_tree(selected, graph, max_depth);
    }

    let outcome = filter_graph(graph, options, Some(&selected.id));
    let mut tree = build_tree(selected, &outcome.graph, max_depth);
    tree.filter_stats = Some(outcome.stats);
    if options.skip_filtered_nodes {
        tree.remapped_connections = Some(outcome.remapped_connections);
    }
    tree
}

fn filter_graph(graph: &GraphModel, options: &FilterOptions, pinned: Option<&str>) -> FilterOutcome {
    if !options.is_active() {
        return FilterOutcome {
            graph: graph.clone(),
            remapped_connections: Vec::new(),
            stats: FilterStats {
                original_nodes: graph.nodes.len(),
                filtered_nodes: graph.nodes.len(),
                original_edges: graph.edges.len(),
                filtered_edges: graph.edges.len(),
                remapped_connections: 0,
                filtered_categories: Vec::new(),
            },
        };
    }

    let keep = |entity: &CodeEntity| {
        options.categories.contains(&entity.category) || pinned == Some(entity.id.as_str())
    };

    let retained: HashSet<&str> = graph
        .nodes
        .iter()
        .filter(|n| keep(n))
        .map(|n| n.id.as_str())
        .collect();

    let filtered_categories: Vec<String> = graph
        .nodes
        .iter()
        .filter(|n| !keep(n))
        .map(|n| n.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let nodes: Vec<CodeEntity> = graph.nodes.iter().filter(|n| keep(n)).cloned().collect();
    let mut edges: Vec<Edge> = graph
        .edges
        .iter()
        .filter(|e| retained.contains(e.source.as_str()) && retained.contains(e.target.as_str()))
        .cloned()
        .collect();

    let mut connections: Vec<RemappedConnection> = Vec::new();
    if options.skip_filtered_nodes {
        let index = GraphIndex::new(graph);
        let mut remapper = Remapper {
            index: &index,
            retained: &retained,
            pairs: HashSet::new(),
            edges: Vec::new(),
            connections: Vec::new(),
        };
        for start in graph.nodes.iter().filter(|n| keep(n)) {
            let mut path = vec![start];
            remapper.search(&mut path);
        }
        edges.append(&mut remapper.edges);
        connections = remapper.connections;
    }

    let stats = FilterStats {
        original_nodes: graph.nodes.len(),
        filtered_nodes: nodes.len(),
        original_edges: graph.edges.len(),
        filtered_edges: edges.len(),
        remapped_connections: connections.len(),
        filtered_categories,
    };

    tracing::debug!(
        before = stats.original_nodes,
        after = stats.filtered_nodes,
        remapped = stats.remapped_connections,
        "filtered graph by category"
    );

    FilterOutcome {
        graph: GraphModel::new(nodes, edges),
        remapped_connections: connections,
        stats,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
