use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::{HierarchyNode, HierarchyTree};

/// Counts describing a hierarchy tree and its current expansion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyStats {
    pub total_nodes: usize,
    pub visible_nodes: usize,
    pub parent_nodes: usize,
    pub nodes_by_depth: BTreeMap<i32, usize>,
    pub nodes_by_category: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Persistent transforms
// ---------------------------------------------------------------------------

/// Rebuild `node` with expansion decided by `expanded`, reusing every subtree that
/// comes out unchanged.
fn with_expansion<F>(node: &Arc<HierarchyNode>, expanded: &F) -> Arc<HierarchyNode>
where
    F: Fn(&HierarchyNode) -> bool,
{
    let children: Vec<Arc<HierarchyNode>> =
        node.children.iter().map(|c| with_expansion(c, expanded)).collect();
    let parents: Vec<Arc<HierarchyNode>> =
        node.parents.iter().map(|p| with_expansion(p, expanded)).collect();
    let flag = expanded(node);

    let unchanged = flag == node.is_expanded
        && children.iter().zip(&node.children).all(|(a, b)| Arc::ptr_eq(a, b))
        && parents.iter().zip(&node.parents).all(|(a, b)| Arc::ptr_eq(a, b));
    if unchanged {
        return Arc::clone(node);
    }

    Arc::new(HierarchyNode {
        entity: node.entity.clone(),
        depth: node.depth,
        relationship: node.relationship.clone(),
        is_expanded: flag,
        children,
        parents,
        parent_id: node.parent_id.clone(),
    })
}

fn with_root(tree: &HierarchyTree, root_node: Arc<HierarchyNode>) -> HierarchyTree {
    HierarchyTree {
        root_node,
        ..tree.clone()
    }
}

/// Flip `is_expanded` on the first node with `id` in pre-order.
///
/// Only the nodes on the path from the root to the match are copied. An unknown id
/// returns a tree sharing the original root.
pub fn toggle_node(tree: &HierarchyTree, id: &str) -> HierarchyTree {
    fn toggle_in(node: &Arc<HierarchyNode>, id: &str) -> Option<Arc<HierarchyNode>> {
        if node.entity.id == id {
            let mut copy = HierarchyNode::clone(node);
            copy.is_expanded = !copy.is_expanded;
            return Some(Arc::new(copy));
        }
        for (i, child) in node.children.iter().enumerate() {
            if let Some(updated) = toggle_in(child, id) {
                let mut copy = HierarchyNode::clone(node);
                copy.children[i] = updated;
                return Some(Arc::new(copy));
            }
        }
        None
    }

    match toggle_in(&tree.root_node, id) {
        Some(root) => with_root(tree, root),
        None => tree.clone(),
    }
}

/// Expand exactly the nodes shallower than `depth`.
pub fn expand_to_depth(tree: &HierarchyTree, depth: i32) -> HierarchyTree {
    with_root(tree, with_expansion(&tree.root_node, &|n| n.depth < depth))
}

pub fn expand_all(tree: &HierarchyTree) -> HierarchyTree {
    with_root(tree, with_expansion(&tree.root_node, &|_| true))
}

/// Collapse everything except the root.
pub fn collapse_all(tree: &HierarchyTree) -> HierarchyTree {
    with_root(tree, with_expansion(&tree.root_node, &|n| n.depth == 0))
}

// ---------------------------------------------------------------------------
// Read helpers
// ---------------------------------------------------------------------------

/// Pre-order walk that descends into a node's children only when it is expanded.
pub fn visible_nodes(tree: &HierarchyTree) -> Vec<&HierarchyNode> {
    fn walk<'t>(node: &'t HierarchyNode, out: &mut Vec<&'t HierarchyNode>) {
        out.push(node);
        if node.is_expanded {
            for child in &node.children {
                walk(child, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(&tree.root_node, &mut out);
    out
}

/// First node with `id` in pre-order, regardless of expansion.
pub fn find_node<'t>(tree: &'t HierarchyTree, id: &str) -> Option<&'t HierarchyNode> {
    fn walk<'t>(node: &'t HierarchyNode, id: &str) -> Option<&'t HierarchyNode> {
        if node.entity.id == id {
            return Some(node);
        }
        node.children.iter().find_map(|c| walk(c, id))
    }
    walk(&tree.root_node, id)
}

pub fn hierarchy_stats(tree: &HierarchyTree) -> HierarchyStats {
    fn count(node: &HierarchyNode, stats: &mut HierarchyStats) {
        stats.total_nodes += 1;
        *stats.nodes_by_depth.entry(node.depth).or_insert(0) += 1;
        *stats
            .nodes_by_category
            .entry(node.entity.category.clone())
            .or_insert(0) += 1;
        for child in &node.children {
            count(child, stats);
        }
    }

    let mut stats = HierarchyStats {
        total_nodes: 0,
        visible_nodes: visible_nodes(tree).len(),
        parent_nodes: tree.root_node.parents.len(),
        nodes_by_depth: BTreeMap::new(),
        nodes_by_category: BTreeMap::new(),
    };
    count(&tree.root_node, &mut stats);
    stats
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
