use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;

use crate::graph::GraphModel;

/// File name looked up next to the graph file.
pub const CONFIG_FILE: &str = "code-hierarchy.toml";

/// Configuration loaded from `code-hierarchy.toml` in the graph file's directory.
///
/// Every field is optional; command-line flags take precedence over anything set here.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CodeHierarchyConfig {
    /// Glob patterns over entity file paths. Matching entities are dropped before any
    /// tree or reference work.
    pub exclude: Option<Vec<String>>,
    /// Default traversal depth for `tree`, `refs` and `stats`.
    pub max_depth: Option<usize>,
    /// Default category allow-list.
    pub categories: Option<Vec<String>>,
    /// Default for smart remapping across hidden entities.
    pub skip_filtered_nodes: Option<bool>,
    /// Prefix stripped from file paths in reference output.
    pub project_root: Option<PathBuf>,
}

impl CodeHierarchyConfig {
    /// Load configuration from `code-hierarchy.toml` in the given directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %config_path.display(), %err, "failed to parse config, using defaults");
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(path = %config_path.display(), %err, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Load the configuration that applies to `graph_path`.
    pub fn for_graph(graph_path: &Path) -> Self {
        let dir = graph_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::load(dir)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Compiled `exclude` patterns. Invalid globs are skipped with a warning.
    pub fn exclude_patterns(&self) -> Vec<Pattern> {
        self.exclude
            .iter()
            .flatten()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(p) => Some(p),
                Err(err) => {
                    tracing::warn!(pattern = %raw, %err, "ignoring invalid exclude pattern");
                    None
                }
            })
            .collect()
    }
}

/// True when `file` matches any of `patterns`.
pub fn is_excluded(file: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(file))
}

/// Drop entities whose file matches an exclude pattern. Edges are left in place and
/// become dangling, which every consumer already ignores.
pub fn apply_excludes(mut graph: GraphModel, patterns: &[Pattern]) -> GraphModel {
    if patterns.is_empty() {
        return graph;
    }
    let before = graph.nodes.len();
    graph
        .nodes
        .retain(|n| !n.file.as_deref().is_some_and(|f| is_excluded(f, patterns)));
    tracing::debug!(removed = before - graph.nodes.len(), "applied exclude patterns");
    graph
}
