use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph::{GraphIndex, GraphModel, edge::Edge, node::CodeEntity};
use crate::usage::{PatternUsageScanner, Usage, UsageExtractor, UsageKind};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// All usages of the selected symbol found in one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFile {
    /// File path exactly as recorded on the entities.
    pub file: String,
    /// Final path component.
    pub file_name: String,
    /// `file` relative to the configured project root, when it lies under it.
    pub relative_path: String,
    pub usages: Vec<Usage>,
    pub total_usages: usize,
    /// Entities in this file that contributed usages, in discovery order.
    pub referencing_nodes: Vec<CodeEntity>,
}

/// Knobs for [`analyze_references_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOptions {
    /// Neighbor hops to walk. 0 produces no references.
    pub max_depth: usize,
    /// Prefix stripped from file paths to build `relative_path`.
    pub project_root: Option<PathBuf>,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            project_root: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback usages
// ---------------------------------------------------------------------------

/// Usage kind implied by a relationship label. Unrecognized labels count as calls.
pub fn kind_for_relationship(label: &str) -> UsageKind {
    let label = label.to_lowercase();
    if label.contains("import") {
        UsageKind::Import
    } else if label.contains("export") {
        UsageKind::Export
    } else if label.contains("method") {
        UsageKind::Method
    } else if label.contains("property") {
        UsageKind::Property
    } else if label.contains("constructor") || label.contains("new") {
        UsageKind::Constructor
    } else {
        UsageKind::Call
    }
}

/// One synthetic usage standing in for a graph edge the text scan could not confirm.
fn synthetic_usage(selected: &CodeEntity, neighbor: &CodeEntity, edge: &Edge) -> Usage {
    let label = edge.label_from(&neighbor.id);
    let kind = kind_for_relationship(&label);
    let description = format!(
        "{} {} {} (from code graph)",
        neighbor.name, label, selected.name
    );
    let full_context = neighbor
        .source_text()
        .map(|code| {
            code.lines()
                .take(crate::usage::CONTEXT_RADIUS * 2 + 1)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_else(|| description.clone());

    Usage {
        line: 1,
        column: 0,
        kind,
        context: description,
        full_context,
        function_scope: Some(neighbor.name.clone()),
        usage_pattern: format!("graph relationship: {label}"),
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn file_name_of(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_owned())
}

fn relative_path_of(file: &str, root: Option<&Path>) -> String {
    let path = Path::new(file);
    if let Some(rel) = root.and_then(|r| path.strip_prefix(r).ok()) {
        return rel.to_string_lossy().into_owned();
    }
    file.trim_start_matches("./").trim_start_matches('/').to_owned()
}

struct Collector<'o> {
    options: &'o ReferenceOptions,
    files: BTreeMap<String, ReferenceFile>,
}

impl Collector<'_> {
    fn add(&mut self, file: &str, entity: &CodeEntity, usages: Vec<Usage>) {
        if usages.is_empty() {
            return;
        }
        let entry = self
            .files
            .entry(file.to_owned())
            .or_insert_with(|| ReferenceFile {
                file: file.to_owned(),
                file_name: file_name_of(file),
                relative_path: relative_path_of(file, self.options.project_root.as_deref()),
                usages: Vec::new(),
                total_usages: 0,
                referencing_nodes: Vec::new(),
            });
        entry.usages.extend(usages);
        entry.total_usages = entry.usages.len();
        if !entry.referencing_nodes.iter().any(|n| n.id == entity.id) {
            entry.referencing_nodes.push(entity.clone());
        }
    }

    fn finish(self) -> Vec<ReferenceFile> {
        let mut files: Vec<ReferenceFile> = self.files.into_values().collect();
        // Stable sort keeps path order among files with equal counts.
        files.sort_by(|a, b| b.total_usages.cmp(&a.total_usages));
        files
    }
}

/// Find usages of `selected` in the source of its graph neighbors, grouped by file and
/// sorted by usage count, descending.
///
/// Uses the default pattern scanner and no project root.
pub fn analyze_references(
    selected: &CodeEntity,
    graph: &GraphModel,
    max_depth: usize,
) -> Vec<ReferenceFile> {
    let options = ReferenceOptions {
        max_depth,
        ..ReferenceOptions::default()
    };
    analyze_references_with(selected, graph, &options, &PatternUsageScanner)
}

/// Breadth-first walk over neighbors of `selected` up to `options.max_depth` hops.
///
/// Each neighbor with both a file and source text is scanned for `selected.name`.
/// A direct neighbor whose text yields nothing still contributes one synthetic usage
/// derived from the connecting edge. Usages found beyond the first hop have
/// `" (depth k)"` appended to their pattern.
pub fn analyze_references_with(
    selected: &CodeEntity,
    graph: &GraphModel,
    options: &ReferenceOptions,
    extractor: &dyn UsageExtractor,
) -> Vec<ReferenceFile> {
    let extra = if graph.entity(&selected.id).is_none() {
        Some(selected)
    } else {
        None
    };
    let index = GraphIndex::with_entity(graph, extra);

    let mut collector = Collector {
        options,
        files: BTreeMap::new(),
    };
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(selected.id.as_str());

    let mut frontier: Vec<&CodeEntity> = vec![selected];
    let mut skipped = 0usize;

    for hop in 1..=options.max_depth {
        let mut next: Vec<&CodeEntity> = Vec::new();
        for current in &frontier {
            for (_, neighbor) in index.touching(&current.id) {
                if visited.insert(neighbor.id.as_str()) {
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }

        for neighbor in &next {
            let (Some(file), Some(code)) = (neighbor.file.as_deref(), neighbor.source_text()) else {
                skipped += 1;
                continue;
            };

            let mut usages = extractor.find_usages(code, &selected.name);
            if usages.is_empty() {
                let direct = index
                    .touching(&neighbor.id)
                    .into_iter()
                    .find(|(_, other)| other.id == selected.id);
                if let Some((edge, _)) = direct {
                    usages.push(synthetic_usage(selected, neighbor, edge));
                }
            }
            if hop > 1 {
                for usage in &mut usages {
                    usage.usage_pattern.push_str(&format!(" (depth {hop})"));
                }
            }
            collector.add(file, neighbor, usages);
        }

        frontier = next;
    }

    if skipped > 0 {
        tracing::debug!(skipped, "neighbors without file or source text were not scanned");
    }

    collector.finish()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
