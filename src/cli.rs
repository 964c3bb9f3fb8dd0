use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Hierarchy views and reference analysis over a code relationship graph.
///
/// code-hierarchy reads a graph JSON file (entities plus directed edges) and answers
/// "what surrounds this symbol" and "where is it used" without re-parsing the project.
#[derive(Parser, Debug)]
#[command(
    name = "code-hierarchy",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(Clone, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact one-line-per-result format (default).
    #[default]
    Compact,
    /// Human-readable columnar table with a bold header when stdout is a terminal.
    Table,
    /// Pretty-printed JSON suitable for programmatic consumption.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the hierarchy tree rooted at an entity.
    ///
    /// Children are every neighbor reachable in either edge direction, each entity
    /// attached once at its first discovery.
    Tree {
        /// Path to the graph JSON file.
        graph: PathBuf,

        /// Entity id, or exact entity name.
        entity: String,

        /// Maximum traversal depth (default: config value, else 3).
        #[arg(long)]
        depth: Option<usize>,

        /// Keep only these categories (comma-separated: function,class,method,...).
        #[arg(long, value_delimiter = ',')]
        category: Vec<String>,

        /// Bridge kept entities connected only through filtered-out ones.
        #[arg(long)]
        skip_filtered: bool,

        /// Expand nodes shallower than this depth before printing (default: root only).
        #[arg(long)]
        expand_depth: Option<i32>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// List files whose entities use the selected symbol, most usages first.
    Refs {
        /// Path to the graph JSON file.
        graph: PathBuf,

        /// Entity id, or exact entity name.
        entity: String,

        /// Neighbor hops to scan (default: config value, else 3).
        #[arg(long)]
        depth: Option<usize>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Filter the whole graph by category and report what was removed or bridged.
    Filter {
        /// Path to the graph JSON file.
        graph: PathBuf,

        /// Categories to keep (comma-separated).
        #[arg(long, value_delimiter = ',')]
        category: Vec<String>,

        /// Bridge kept entities connected only through filtered-out ones.
        #[arg(long)]
        skip_filtered: bool,

        /// Output format. `json` prints the filtered graph itself.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Node counts by depth and category for the tree rooted at an entity.
    Stats {
        /// Path to the graph JSON file.
        graph: PathBuf,

        /// Entity id, or exact entity name.
        entity: String,

        /// Maximum traversal depth (default: config value, else 3).
        #[arg(long)]
        depth: Option<usize>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}
