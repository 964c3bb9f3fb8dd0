mod cli;
mod output;

use std::path::Path;

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use code_hierarchy::config::{CodeHierarchyConfig, apply_excludes};
use code_hierarchy::{
    CodeEntity, FilterOptions, GraphModel, PatternUsageScanner, ReferenceOptions,
    analyze_references_with, build_filtered_tree, expand_to_depth, filter_tree,
    hierarchy_stats,
};

use cli::{Cli, Commands};

/// Depth used when neither the command line nor the config file sets one.
const DEFAULT_DEPTH: usize = 3;

/// Diagnostics go to stderr so stdout stays clean for JSON consumers.
///
/// Respects `CODE_HIERARCHY_LOG`; defaults to `warn`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("CODE_HIERARCHY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the graph and its sibling config, with exclude patterns already applied.
fn load(graph_path: &Path) -> Result<(GraphModel, CodeHierarchyConfig)> {
    let config = CodeHierarchyConfig::for_graph(graph_path);
    let graph = GraphModel::load(graph_path)?;
    let graph = apply_excludes(graph, &config.exclude_patterns());
    Ok((graph, config))
}

fn resolve_entity<'g>(graph: &'g GraphModel, query: &str) -> Result<&'g CodeEntity> {
    match graph.find_entity(query) {
        Some(entity) => Ok(entity),
        None => bail!("no entity matching '{}'", query),
    }
}

/// Command-line categories win; otherwise fall back to the config's.
fn filter_options(
    category: Vec<String>,
    skip_filtered: bool,
    config: &CodeHierarchyConfig,
) -> FilterOptions {
    let categories = if category.is_empty() {
        config.categories.clone().unwrap_or_default()
    } else {
        category
    };
    let skip = skip_filtered || config.skip_filtered_nodes.unwrap_or(false);
    FilterOptions::new(
        categories.into_iter().map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
        skip,
    )
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tree {
            graph,
            entity,
            depth,
            category,
            skip_filtered,
            expand_depth,
            format,
        } => {
            let (model, config) = load(&graph)?;
            let selected = resolve_entity(&model, &entity)?;
            let max_depth = depth.or(config.max_depth).unwrap_or(DEFAULT_DEPTH);
            let options = filter_options(category, skip_filtered, &config);

            let mut tree = build_filtered_tree(selected, &model, max_depth, &options);
            if let Some(d) = expand_depth {
                tree = expand_to_depth(&tree, d);
            }
            output::format_tree(&tree, &format);
        }

        Commands::Refs {
            graph,
            entity,
            depth,
            format,
        } => {
            let (model, config) = load(&graph)?;
            let selected = resolve_entity(&model, &entity)?;
            let options = ReferenceOptions {
                max_depth: depth.or(config.max_depth).unwrap_or(DEFAULT_DEPTH),
                project_root: config.project_root.clone(),
            };
            let results = analyze_references_with(selected, &model, &options, &PatternUsageScanner);
            output::format_refs(&results, &format);
        }

        Commands::Filter {
            graph,
            category,
            skip_filtered,
            format,
        } => {
            let (model, config) = load(&graph)?;
            let options = filter_options(category, skip_filtered, &config);
            if !options.is_active() {
                tracing::warn!("no categories given, graph is returned unfiltered");
            }
            let outcome = filter_tree(&model, &options);
            output::format_filter(&outcome, &format);
        }

        Commands::Stats {
            graph,
            entity,
            depth,
            format,
        } => {
            let (model, config) = load(&graph)?;
            let selected = resolve_entity(&model, &entity)?;
            let max_depth = depth.or(config.max_depth).unwrap_or(DEFAULT_DEPTH);
            let options = filter_options(Vec::new(), false, &config);

            let tree = build_filtered_tree(selected, &model, max_depth, &options);
            let stats = hierarchy_stats(&tree);
            output::format_stats(&stats, &tree, &format);
        }
    }

    Ok(())
}
