pub mod transform;

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::filter::{FilterStats, RemappedConnection};
use crate::graph::{GraphIndex, GraphModel, node::CodeEntity};

pub use transform::{
    HierarchyStats, collapse_all, expand_all, expand_to_depth, find_node, hierarchy_stats,
    toggle_node, visible_nodes,
};

/// Depth assigned to the root's direct-parent pseudo-nodes.
pub const PARENT_DEPTH: i32 = -1;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// One position in a hierarchy tree.
///
/// Children are shared `Arc`s so that transforms can copy only the path from the root
/// to the node they change and reuse every untouched subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub entity: CodeEntity,
    /// 0 for the root, -1 for parent pseudo-nodes, otherwise hops from the root.
    pub depth: i32,
    /// How this node was reached from its tree parent. `None` on the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub is_expanded: bool,
    #[serde(default)]
    pub children: Vec<Arc<HierarchyNode>>,
    /// Direct parents of the root (entities with an edge targeting it). Empty elsewhere.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<Arc<HierarchyNode>>,
    /// Id of the tree parent, for lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        &self.entity.id
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }
}

/// A depth-bounded, cycle-free view of the graph rooted at one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyTree {
    pub root_node: Arc<HierarchyNode>,
    /// Nodes reachable from the root through `children` (parent pseudo-nodes excluded).
    pub total_nodes: usize,
    /// Deepest depth actually reached, never more than the requested depth.
    pub max_depth: usize,
    /// Every distinct relationship label encountered, sorted.
    pub relationship_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_stats: Option<FilterStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remapped_connections: Option<Vec<RemappedConnection>>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// A claimed tree position, before the tree is assembled.
struct Slot<'a> {
    entity: &'a CodeEntity,
    depth: usize,
    relationship: Option<String>,
    parent_id: Option<&'a str>,
    children: Vec<usize>,
}

struct TreeBuilder<'a> {
    index: GraphIndex<'a>,
    visited: HashSet<&'a str>,
    labels: BTreeSet<String>,
    max_depth: usize,
    slots: Vec<Slot<'a>>,
}

impl<'a> TreeBuilder<'a> {
    /// Breadth-first claim from `root`: every entity lands at its shortest hop distance,
    /// attached to the first frontier node that reaches it.
    fn walk(&mut self, root: &'a CodeEntity) {
        self.visited.insert(root.id.as_str());
        self.slots.push(Slot {
            entity: root,
            depth: 0,
            relationship: None,
            parent_id: None,
            children: Vec::new(),
        });

        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(0);

        while let Some(current) = queue.pop_front() {
            let depth = self.slots[current].depth;
            if depth >= self.max_depth {
                continue;
            }
            let entity = self.slots[current].entity;

            let mut candidates: Vec<(String, &'a CodeEntity)> = self
                .index
                .touching(&entity.id)
                .into_iter()
                .filter(|(_, other)| !self.visited.contains(other.id.as_str()))
                .map(|(edge, other)| (edge.label_from(&entity.id), other))
                .collect();
            candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));

            for (label, other) in candidates {
                if !self.visited.insert(other.id.as_str()) {
                    continue;
                }
                self.labels.insert(label.clone());
                let slot = self.slots.len();
                self.slots.push(Slot {
                    entity: other,
                    depth: depth + 1,
                    relationship: Some(label),
                    parent_id: Some(entity.id.as_str()),
                    children: Vec::new(),
                });
                self.slots[current].children.push(slot);
                queue.push_back(slot);
            }
        }
    }

    /// Build the node for `slot` and its subtree, children sorted by name.
    fn assemble(&self, slot: usize) -> HierarchyNode {
        let Slot {
            entity,
            depth,
            relationship,
            parent_id,
            children,
        } = &self.slots[slot];

        let mut nodes: Vec<Arc<HierarchyNode>> =
            children.iter().map(|&c| Arc::new(self.assemble(c))).collect();
        nodes.sort_by(|a, b| a.entity.name.cmp(&b.entity.name));

        HierarchyNode {
            entity: (*entity).clone(),
            depth: *depth as i32,
            relationship: relationship.clone(),
            is_expanded: *depth == 0,
            children: nodes,
            parents: Vec::new(),
            parent_id: parent_id.map(str::to_owned),
        }
    }

    fn parents_of(&mut self, selected: &CodeEntity) -> Vec<Arc<HierarchyNode>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut parents: Vec<Arc<HierarchyNode>> = Vec::new();
        for (edge, source) in self.index.incoming(&selected.id) {
            if source.id == selected.id || !seen.insert(source.id.as_str()) {
                continue;
            }
            let label = edge.label_from(&source.id);
            self.labels.insert(label.clone());
            parents.push(Arc::new(HierarchyNode {
                entity: source.clone(),
                depth: PARENT_DEPTH,
                relationship: Some(label),
                is_expanded: false,
                children: Vec::new(),
                parents: Vec::new(),
                parent_id: None,
            }));
        }
        parents.sort_by(|a, b| a.entity.name.cmp(&b.entity.name));
        parents
    }
}

/// Build a hierarchy tree rooted at `selected`, following edges in both directions up to
/// `max_depth` hops.
///
/// Each entity is attached once, at its first discovery, so the result is a tree even
/// when the graph has cycles or diamonds. Edges to entities missing from `graph.nodes`
/// are ignored. A `max_depth` of 0 yields a root-only tree.
pub fn build_tree(selected: &CodeEntity, graph: &GraphModel, max_depth: usize) -> HierarchyTree {
    let extra = if graph.entity(&selected.id).is_none() {
        Some(selected)
    } else {
        None
    };
    let index = GraphIndex::with_entity(graph, extra);

    let mut builder = TreeBuilder {
        index,
        visited: HashSet::new(),
        labels: BTreeSet::new(),
        max_depth,
        slots: Vec::new(),
    };
    builder.walk(selected);

    let mut root = builder.assemble(0);
    root.parents = builder.parents_of(selected);
    let total = builder.slots.len();
    let deepest = builder.slots.iter().map(|s| s.depth).max().unwrap_or(0);

    tracing::debug!(
        root = %selected.id,
        total,
        depth = deepest,
        parents = root.parents.len(),
        "built hierarchy tree"
    );

    HierarchyTree {
        root_node: Arc::new(root),
        total_nodes: total,
        max_depth: deepest.min(max_depth),
        relationship_types: builder.labels.into_iter().collect(),
        filter_stats: None,
        remapped_connections: None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
