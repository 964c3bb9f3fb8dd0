pub mod edge;
pub mod node;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use edge::Edge;
use node::CodeEntity;

/// The input graph: entities plus directed edges, exactly as produced by ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: Vec<CodeEntity>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new(nodes: Vec<CodeEntity>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Parse a graph from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse graph JSON")
    }

    /// Read and parse a graph JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read graph file {}", path.display()))?;
        let model = Self::from_json_str(&contents)
            .with_context(|| format!("invalid graph file {}", path.display()))?;
        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            "loaded graph from {}",
            path.display()
        );
        Ok(model)
    }

    /// Linear lookup of an entity by id.
    pub fn entity(&self, id: &str) -> Option<&CodeEntity> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find an entity by exact id, falling back to exact name (lowest id wins).
    pub fn find_entity(&self, id_or_name: &str) -> Option<&CodeEntity> {
        self.entity(id_or_name).or_else(|| {
            self.nodes
                .iter()
                .filter(|n| n.name == id_or_name)
                .min_by(|a, b| a.id.cmp(&b.id))
        })
    }
}

/// Adjacency index over a borrowed [`GraphModel`].
///
/// Backed by a petgraph `StableGraph` whose weights point back into the model. Edges
/// with an endpoint missing from the node list are dropped at construction, so every
/// query below only ever sees resolvable entities.
pub struct GraphIndex<'a> {
    graph: StableGraph<&'a CodeEntity, &'a Edge>,
    id_index: HashMap<&'a str, NodeIndex>,
    dangling: usize,
}

impl<'a> GraphIndex<'a> {
    pub fn new(model: &'a GraphModel) -> Self {
        Self::with_entity(model, None)
    }

    /// Build the index, adding `extra` as a node when its id is not already present.
    ///
    /// Used when the caller's selected entity was not part of the model's node list.
    pub fn with_entity(model: &'a GraphModel, extra: Option<&'a CodeEntity>) -> Self {
        let mut graph = StableGraph::new();
        let mut id_index: HashMap<&'a str, NodeIndex> = HashMap::new();

        for entity in model.nodes.iter().chain(extra) {
            // Duplicate ids: first occurrence wins.
            if id_index.contains_key(entity.id.as_str()) {
                continue;
            }
            let idx = graph.add_node(entity);
            id_index.insert(entity.id.as_str(), idx);
        }

        let mut dangling = 0usize;
        for edge in &model.edges {
            match (
                id_index.get(edge.source.as_str()),
                id_index.get(edge.target.as_str()),
            ) {
                (Some(&src), Some(&dst)) => {
                    graph.add_edge(src, dst, edge);
                }
                _ => dangling += 1,
            }
        }

        if dangling > 0 {
            tracing::debug!(dangling, "skipped edges referencing unknown entities");
        }

        Self {
            graph,
            id_index,
            dangling,
        }
    }

    pub fn entity(&self, id: &str) -> Option<&'a CodeEntity> {
        self.id_index.get(id).map(|&idx| self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of model edges dropped because an endpoint was unknown.
    pub fn dangling_edges(&self) -> usize {
        self.dangling
    }

    /// Edges leaving `id` with their target entity, in model order.
    pub fn outgoing(&self, id: &str) -> Vec<(&'a Edge, &'a CodeEntity)> {
        self.directed(id, Direction::Outgoing)
    }

    /// Edges arriving at `id` with their source entity, in model order.
    pub fn incoming(&self, id: &str) -> Vec<(&'a Edge, &'a CodeEntity)> {
        self.directed(id, Direction::Incoming)
    }

    /// Every edge touching `id` in either direction, paired with the opposite entity.
    ///
    /// A self-loop is reported once, paired with the entity itself.
    pub fn touching(&self, id: &str) -> Vec<(&'a Edge, &'a CodeEntity)> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<(EdgeIndex, &'a Edge, &'a CodeEntity)> = Vec::new();
        for edge_ref in self.graph.edges_directed(idx, Direction::Outgoing) {
            found.push((edge_ref.id(), *edge_ref.weight(), self.graph[edge_ref.target()]));
        }
        for edge_ref in self.graph.edges_directed(idx, Direction::Incoming) {
            if edge_ref.source() == edge_ref.target() {
                continue;
            }
            found.push((edge_ref.id(), *edge_ref.weight(), self.graph[edge_ref.source()]));
        }
        found.sort_by_key(|(e, _, _)| e.index());
        found.into_iter().map(|(_, e, n)| (e, n)).collect()
    }

    fn directed(&self, id: &str, dir: Direction) -> Vec<(&'a Edge, &'a CodeEntity)> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<(EdgeIndex, &'a Edge, &'a CodeEntity)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|edge_ref| {
                let other = match dir {
                    Direction::Outgoing => edge_ref.target(),
                    Direction::Incoming => edge_ref.source(),
                };
                (edge_ref.id(), *edge_ref.weight(), self.graph[other])
            })
            .collect();
        // petgraph walks adjacency lists newest-first; restore insertion order.
        found.sort_by_key(|(e, _, _)| e.index());
        found.into_iter().map(|(_, e, n)| (e, n)).collect()
    }
}
