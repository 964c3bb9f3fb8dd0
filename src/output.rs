use std::io::IsTerminal;

use serde::Serialize;

use code_hierarchy::{
    FilterOutcome, HierarchyNode, HierarchyStats, HierarchyTree, ReferenceFile, visible_nodes,
};

use crate::cli::OutputFormat;

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error serialising output: {e}"),
    }
}

/// Print a table header row, bold when stdout is a terminal, followed by a rule.
fn print_header(row: &str) {
    if std::io::stdout().is_terminal() {
        println!("\x1b[1m{row}\x1b[0m");
    } else {
        println!("{row}");
    }
    println!("{}", "-".repeat(row.len()));
}

/// `-` expanded, `+` collapsed with hidden children, blank for leaves.
fn expansion_marker(node: &HierarchyNode) -> char {
    if node.children.is_empty() {
        ' '
    } else if node.is_expanded {
        '-'
    } else {
        '+'
    }
}

// ---------------------------------------------------------------------------
// Tree output
// ---------------------------------------------------------------------------

/// Format and print the visible part of a hierarchy tree.
///
/// Parent pseudo-nodes are listed above the root with a `^` marker.
pub fn format_tree(tree: &HierarchyTree, format: &OutputFormat) {
    let visible = visible_nodes(tree);

    match format {
        OutputFormat::Compact => {
            for parent in &tree.root_node.parents {
                println!(
                    "^ {} [{}] {}",
                    parent.name(),
                    parent.entity.category,
                    parent.relationship.as_deref().unwrap_or("")
                );
            }
            for node in &visible {
                let indent = "  ".repeat(node.depth.max(0) as usize);
                let rel = node
                    .relationship
                    .as_deref()
                    .map(|r| format!(" {r}"))
                    .unwrap_or_default();
                println!(
                    "{indent}{} {} [{}]{rel}",
                    expansion_marker(node),
                    node.name(),
                    node.entity.category
                );
            }
            println!("{} of {} nodes shown", visible.len(), tree.total_nodes);
            if let Some(remapped) = &tree.remapped_connections {
                println!("{} remapped connections", remapped.len());
            }
        }

        OutputFormat::Table => {
            let label = |n: &HierarchyNode| {
                format!(
                    "{}{} {}",
                    "  ".repeat(n.depth.max(0) as usize),
                    expansion_marker(n),
                    n.name()
                )
            };
            let rows: Vec<&HierarchyNode> = tree
                .root_node
                .parents
                .iter()
                .map(|p| p.as_ref())
                .chain(visible.iter().copied())
                .collect();

            let name_w = rows.iter().map(|n| label(n).len()).max().unwrap_or(4).max(4);
            let cat_w = rows
                .iter()
                .map(|n| n.entity.category.len())
                .max()
                .unwrap_or(8)
                .max(8);

            print_header(&format!(
                "{:<name_w$}  {:<cat_w$}  {:>5}  {:<12}  {}",
                "NAME", "CATEGORY", "DEPTH", "RELATIONSHIP", "FILE",
            ));
            for n in rows {
                println!(
                    "{:<name_w$}  {:<cat_w$}  {:>5}  {:<12}  {}",
                    label(n),
                    n.entity.category,
                    n.depth,
                    n.relationship.as_deref().unwrap_or("-"),
                    n.entity.file.as_deref().unwrap_or("-"),
                );
            }
        }

        OutputFormat::Json => print_json(tree),
    }
}

// ---------------------------------------------------------------------------
// Refs output
// ---------------------------------------------------------------------------

/// Format and print per-file reference results.
pub fn format_refs(results: &[ReferenceFile], format: &OutputFormat) {
    match format {
        OutputFormat::Compact => {
            let mut total = 0;
            for file in results {
                println!("file {} {}", file.relative_path, file.total_usages);
                for u in &file.usages {
                    println!(
                        "  ref {}:{}:{} {} {}",
                        file.relative_path, u.line, u.column, u.kind, u.usage_pattern
                    );
                }
                total += file.total_usages;
            }
            println!("{} usages in {} files", total, results.len());
        }

        OutputFormat::Table => {
            let file_w = results
                .iter()
                .map(|f| f.relative_path.len())
                .max()
                .unwrap_or(4)
                .max(4);

            print_header(&format!(
                "{:<file_w$}  {:>6}  {:<11}  {:<24}  {}",
                "FILE", "LINE", "KIND", "PATTERN", "SCOPE",
            ));
            for file in results {
                for u in &file.usages {
                    println!(
                        "{:<file_w$}  {:>6}  {:<11}  {:<24}  {}",
                        file.relative_path,
                        u.line,
                        u.kind,
                        u.usage_pattern,
                        u.function_scope.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        OutputFormat::Json => print_json(results),
    }
}

// ---------------------------------------------------------------------------
// Filter output
// ---------------------------------------------------------------------------

/// Format and print a category filter result.
pub fn format_filter(outcome: &FilterOutcome, format: &OutputFormat) {
    let stats = &outcome.stats;
    match format {
        OutputFormat::Compact => {
            println!("nodes {} -> {}", stats.original_nodes, stats.filtered_nodes);
            println!("edges {} -> {}", stats.original_edges, stats.filtered_edges);
            if !stats.filtered_categories.is_empty() {
                println!("removed {}", stats.filtered_categories.join(","));
            }
            for c in &outcome.remapped_connections {
                println!(
                    "remap {} -> {} via {} {}",
                    c.remapped_source,
                    c.remapped_target,
                    c.skipped_nodes.join(","),
                    c.relationship
                );
            }
            println!("{} remapped connections", outcome.remapped_connections.len());
        }

        OutputFormat::Table => {
            println!("Nodes:      {} -> {}", stats.original_nodes, stats.filtered_nodes);
            println!("Edges:      {} -> {}", stats.original_edges, stats.filtered_edges);
            println!("Removed:    {}", stats.filtered_categories.join(", "));
            if outcome.remapped_connections.is_empty() {
                return;
            }
            println!();

            let src_w = outcome
                .remapped_connections
                .iter()
                .map(|c| c.remapped_source.len())
                .max()
                .unwrap_or(6)
                .max(6);
            let tgt_w = outcome
                .remapped_connections
                .iter()
                .map(|c| c.remapped_target.len())
                .max()
                .unwrap_or(6)
                .max(6);

            print_header(&format!(
                "{:<src_w$}  {:<tgt_w$}  {:<16}  {}",
                "SOURCE", "TARGET", "RELATIONSHIP", "SKIPPED",
            ));
            for c in &outcome.remapped_connections {
                println!(
                    "{:<src_w$}  {:<tgt_w$}  {:<16}  {}",
                    c.remapped_source,
                    c.remapped_target,
                    c.relationship,
                    c.skipped_nodes.join(" -> "),
                );
            }
        }

        OutputFormat::Json => print_json(outcome),
    }
}

// ---------------------------------------------------------------------------
// Stats output
// ---------------------------------------------------------------------------

/// Format and print hierarchy statistics.
pub fn format_stats(stats: &HierarchyStats, tree: &HierarchyTree, format: &OutputFormat) {
    match format {
        OutputFormat::Compact => {
            println!(
                "total {} visible {} parents {} max_depth {}",
                stats.total_nodes, stats.visible_nodes, stats.parent_nodes, tree.max_depth
            );
            for (depth, count) in &stats.nodes_by_depth {
                println!("depth {depth} {count}");
            }
            for (category, count) in &stats.nodes_by_category {
                println!("category {category} {count}");
            }
            if !tree.relationship_types.is_empty() {
                println!("relationships {}", tree.relationship_types.join(","));
            }
        }

        OutputFormat::Table => {
            let use_color = std::io::stdout().is_terminal();
            let header = |s: &str| {
                if use_color {
                    format!("\x1b[1m{s}\x1b[0m")
                } else {
                    s.to_string()
                }
            };

            println!("{}", header(&format!("=== {} ===", tree.root_node.name())));
            println!("Total nodes:    {}", stats.total_nodes);
            println!("Visible nodes:  {}", stats.visible_nodes);
            println!("Parents:        {}", stats.parent_nodes);
            println!("Max depth:      {}", tree.max_depth);
            println!();
            println!("{}", header("--- By Depth ---"));
            for (depth, count) in &stats.nodes_by_depth {
                println!("  {depth:>3}  {count}");
            }
            println!();
            println!("{}", header("--- By Category ---"));
            for (category, count) in &stats.nodes_by_category {
                println!("  {category:<12} {count}");
            }
        }

        OutputFormat::Json => {
            let json = serde_json::json!({
                "root": tree.root_node.id(),
                "max_depth": tree.max_depth,
                "relationship_types": tree.relationship_types,
                "stats": stats,
            });
            print_json(&json);
        }
    }
}
