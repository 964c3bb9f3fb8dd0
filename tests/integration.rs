/// Integration test suite: drives the compiled `code-hierarchy` binary over small graph
/// fixtures written to temporary directories.
///
/// The `CARGO_BIN_EXE_code-hierarchy` environment variable is set by Cargo during
/// `cargo test` and points at the binary for the current profile.
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_code-hierarchy"))
}

/// Fixture graph:
///
/// ```text
/// main -calls-> loadConfig -calls-> parse
///   |               \-uses-> defaults (variable)
///   \-uses-> registry (variable) -calls-> run
/// ```
const GRAPH: &str = r#"{
  "nodes": [
    { "id": "main", "name": "main", "type": "function", "file": "src/main.ts",
      "code": "function main() {\n  const cfg = loadConfig();\n  run(cfg);\n}", "startLine": 1, "endLine": 4 },
    { "id": "loadConfig", "name": "loadConfig", "type": "function", "file": "src/config.ts",
      "code": "export function loadConfig() {\n  return parse(readFile());\n}" },
    { "id": "parse", "name": "parse", "type": "function", "file": "src/parse.ts",
      "code": "function parse(text) { return text; }" },
    { "id": "defaults", "name": "defaults", "type": "variable", "file": "src/config.ts",
      "code": "const defaults = {}" },
    { "id": "registry", "name": "registry", "type": "variable" },
    { "id": "run", "name": "run", "type": "function", "file": "src/run.ts",
      "code": "function run(cfg) {}" }
  ],
  "edges": [
    { "source": "main", "target": "loadConfig", "type": "calls" },
    { "source": "loadConfig", "target": "parse", "type": "calls" },
    { "source": "loadConfig", "target": "defaults", "type": "uses" },
    { "source": "main", "target": "registry", "type": "uses" },
    { "source": "registry", "target": "run", "type": "calls" },
    { "source": "ghost", "target": "main", "type": "calls" }
  ]
}"#;

/// Write the fixture graph (and optionally a config file) into a fresh temp dir.
fn fixture(config: Option<&str>) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let graph = dir.path().join("graph.json");
    std::fs::write(&graph, GRAPH).expect("failed to write graph fixture");
    if let Some(cfg) = config {
        std::fs::write(dir.path().join("code-hierarchy.toml"), cfg)
            .expect("failed to write config fixture");
    }
    (dir, graph)
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("temp path is valid UTF-8")
}

/// Run a code-hierarchy command and assert it exits successfully.
/// Returns stdout as a String.
fn run_success(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke code-hierarchy binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    stdout
}

/// Run a code-hierarchy command and assert it exits with a non-zero status.
/// Returns (stdout, stderr) as Strings.
fn run_failure(args: &[&str]) -> (String, String) {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke code-hierarchy binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        !out.status.success(),
        "command {:?} expected to fail but exited successfully\nstdout: {}\nstderr: {}",
        args,
        stdout,
        stderr
    );
    (stdout, stderr)
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let stdout = run_success(args);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not valid JSON: {e}\nstdout: {stdout}"))
}

/// Ids of every node reachable through `children`, pre-order.
fn tree_ids(node: &serde_json::Value, out: &mut Vec<String>) {
    out.push(node["entity"]["id"].as_str().unwrap_or_default().to_string());
    if let Some(children) = node["children"].as_array() {
        for child in children {
            tree_ids(child, out);
        }
    }
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

/// test_tree_compact_output: root, children and footer are printed.
#[test]
fn test_tree_compact_output() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&["tree", path_str(&graph), "loadConfig"]);
    assert!(stdout.contains("^ main [function] calls"), "parent line missing\nstdout: {stdout}");
    assert!(stdout.contains("- loadConfig [function]"), "expanded root missing\nstdout: {stdout}");
    assert!(stdout.contains("parse [function] calls"), "child missing\nstdout: {stdout}");
    assert!(
        stdout.contains("4 of 6 nodes shown"),
        "root-only expansion shows root plus direct neighbors\nstdout: {stdout}"
    );
}

/// test_tree_json_structure: JSON tree holds every reachable entity exactly once.
#[test]
fn test_tree_json_structure() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&["tree", path_str(&graph), "loadConfig", "--format", "json"]);

    assert_eq!(json["total_nodes"], 6);
    assert_eq!(json["max_depth"], 3);
    assert_eq!(json["root_node"]["depth"], 0);
    assert_eq!(json["root_node"]["is_expanded"], true);

    let mut ids = Vec::new();
    tree_ids(&json["root_node"], &mut ids);
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len(), "no entity appears twice: {ids:?}");
    assert!(!ids.contains(&"ghost".to_string()), "dangling edge endpoints are ignored");

    let parents = json["root_node"]["parents"].as_array().expect("parents array");
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0]["entity"]["id"], "main");
    assert_eq!(parents[0]["depth"], -1);
}

/// test_tree_lookup_by_name: entity argument falls back to the entity name.
#[test]
fn test_tree_lookup_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let graph = dir.path().join("graph.json");
    std::fs::write(
        &graph,
        r#"{"nodes":[{"id":"n2","name":"dup"},{"id":"n1","name":"dup"}],"edges":[]}"#,
    )
    .unwrap();
    let json = run_json(&["tree", path_str(&graph), "dup", "--format", "json"]);
    assert_eq!(json["root_node"]["entity"]["id"], "n1", "lowest id wins");
    assert_eq!(json["root_node"]["entity"]["category"], "other");
}

/// test_tree_expand_depth: expanding deeper reveals grandchildren.
#[test]
fn test_tree_expand_depth() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&["tree", path_str(&graph), "loadConfig", "--expand-depth", "5"]);
    assert!(stdout.contains("6 of 6 nodes shown"), "stdout: {stdout}");
    assert!(stdout.contains("      run [function] calls"), "run at depth 3\nstdout: {stdout}");
}

/// test_tree_category_filter_with_remap: hidden variable is bridged by a synthetic edge.
#[test]
fn test_tree_category_filter_with_remap() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&[
        "tree",
        path_str(&graph),
        "loadConfig",
        "--category",
        "function",
        "--skip-filtered",
        "--format",
        "json",
    ]);

    assert_eq!(json["total_nodes"], 4);
    assert_eq!(json["filter_stats"]["filtered_categories"], serde_json::json!(["variable"]));
    let remapped = json["remapped_connections"].as_array().expect("remapped array");
    assert_eq!(remapped.len(), 1);
    assert_eq!(remapped[0]["remapped_source"], "main");
    assert_eq!(remapped[0]["remapped_target"], "run");
    assert_eq!(remapped[0]["relationship"], "remapped_1_hops");
    assert_eq!(remapped[0]["skipped_nodes"], serde_json::json!(["registry"]));

    let types = json["relationship_types"].as_array().unwrap();
    assert!(types.iter().any(|t| t == "remapped_1_hops"), "types: {types:?}");
}

/// test_tree_unknown_entity: a missing entity exits non-zero with a clear message.
#[test]
fn test_tree_unknown_entity() {
    let (_dir, graph) = fixture(None);
    let (_, stderr) = run_failure(&["tree", path_str(&graph), "nope"]);
    assert!(
        stderr.contains("no entity matching 'nope'"),
        "stderr should name the missing entity\nstderr: {stderr}"
    );
}

/// test_missing_graph_file: unreadable graph path is reported, not panicked on.
#[test]
fn test_missing_graph_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let (_, stderr) = run_failure(&["tree", path_str(&missing), "main"]);
    assert!(stderr.contains("failed to read graph file"), "stderr: {stderr}");
}

/// test_invalid_graph_json: malformed JSON is reported with context.
#[test]
fn test_invalid_graph_json() {
    let dir = tempfile::tempdir().unwrap();
    let graph = dir.path().join("graph.json");
    std::fs::write(&graph, "{ not json").unwrap();
    let (_, stderr) = run_failure(&["stats", path_str(&graph), "main"]);
    assert!(stderr.contains("invalid graph file"), "stderr: {stderr}");
}

/// test_tree_table_format: table output has a header row.
#[test]
fn test_tree_table_format() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&["tree", path_str(&graph), "loadConfig", "--format", "table"]);
    let first = stdout.lines().next().unwrap_or_default();
    assert!(first.contains("NAME") && first.contains("CATEGORY"), "stdout: {stdout}");
    assert!(stdout.contains("src/parse.ts"));
}

// ---------------------------------------------------------------------------
// refs
// ---------------------------------------------------------------------------

/// test_refs_json_output: text matches and graph fallbacks are grouped per file.
#[test]
fn test_refs_json_output() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&["refs", path_str(&graph), "loadConfig", "--format", "json"]);
    let files = json.as_array().expect("array of reference files");

    let names: Vec<&str> = files.iter().filter_map(|f| f["file"].as_str()).collect();
    assert!(names.contains(&"src/main.ts"), "files: {names:?}");
    assert!(names.contains(&"src/parse.ts"), "direct neighbor gets a fallback usage");
    assert!(!names.contains(&"src/run.ts"), "indirect neighbor without a match adds nothing");

    let main = files.iter().find(|f| f["file"] == "src/main.ts").unwrap();
    assert_eq!(main["total_usages"], 1);
    assert_eq!(main["usages"][0]["kind"], "call");
    assert_eq!(main["usages"][0]["line"], 2);
    assert_eq!(main["usages"][0]["usage_pattern"], "variable assignment");
    assert_eq!(main["usages"][0]["function_scope"], "main");

    for pair in files.windows(2) {
        assert!(pair[0]["total_usages"].as_u64() >= pair[1]["total_usages"].as_u64());
    }
}

/// test_refs_compact_output: one line per usage plus a footer.
#[test]
fn test_refs_compact_output() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&["refs", path_str(&graph), "loadConfig"]);
    assert!(stdout.contains("ref src/main.ts:2:14 call"), "stdout: {stdout}");
    assert!(stdout.trim_end().ends_with("files"), "footer missing\nstdout: {stdout}");
}

/// test_refs_project_root_from_config: relative paths honour the configured root.
#[test]
fn test_refs_project_root_from_config() {
    let (_dir, graph) = fixture(Some("project_root = \"src\"\n"));
    let json = run_json(&["refs", path_str(&graph), "loadConfig", "--format", "json"]);
    let main = json
        .as_array()
        .and_then(|a| a.iter().find(|f| f["file"] == "src/main.ts"))
        .expect("main.ts reference");
    assert_eq!(main["relative_path"], "main.ts");
    assert_eq!(main["file_name"], "main.ts");
}

/// test_refs_zero_depth: no hops means no references.
#[test]
fn test_refs_zero_depth() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&["refs", path_str(&graph), "loadConfig", "--depth", "0", "--format", "json"]);
    assert_eq!(json, serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// filter
// ---------------------------------------------------------------------------

/// test_filter_compact_output: counts and remapped connections are reported.
#[test]
fn test_filter_compact_output() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&[
        "filter",
        path_str(&graph),
        "--category",
        "function",
        "--skip-filtered",
    ]);
    assert!(stdout.contains("nodes 6 -> 4"), "stdout: {stdout}");
    assert!(stdout.contains("removed variable"), "stdout: {stdout}");
    assert!(
        stdout.contains("remap main -> run via registry remapped_1_hops"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("1 remapped connections"));
}

/// test_filter_json_without_remap: plain filtering keeps only induced edges.
#[test]
fn test_filter_json_without_remap() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&["filter", path_str(&graph), "--category", "function", "--format", "json"]);
    assert_eq!(json["stats"]["filtered_nodes"], 4);
    assert_eq!(json["stats"]["filtered_edges"], 2, "main->loadConfig and loadConfig->parse");
    assert_eq!(json["remapped_connections"], serde_json::json!([]));
    let nodes = json["graph"]["nodes"].as_array().unwrap();
    assert!(nodes.iter().all(|n| n["category"] == "function"));
}

/// test_filter_categories_from_config: config supplies the default allow-list.
#[test]
fn test_filter_categories_from_config() {
    let (_dir, graph) = fixture(Some("categories = [\"variable\"]\n"));
    let json = run_json(&["filter", path_str(&graph), "--format", "json"]);
    assert_eq!(json["stats"]["filtered_nodes"], 2);
    assert_eq!(json["stats"]["filtered_categories"], serde_json::json!(["function"]));
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

/// test_stats_json_output: counts by depth and category match the tree.
#[test]
fn test_stats_json_output() {
    let (_dir, graph) = fixture(None);
    let json = run_json(&["stats", path_str(&graph), "loadConfig", "--format", "json"]);
    let stats = &json["stats"];
    assert_eq!(json["root"], "loadConfig");
    assert_eq!(stats["total_nodes"], 6);
    assert_eq!(stats["visible_nodes"], 4);
    assert_eq!(stats["parent_nodes"], 1);
    assert_eq!(stats["nodes_by_depth"]["0"], 1);
    assert_eq!(stats["nodes_by_depth"]["1"], 3);
    assert_eq!(stats["nodes_by_category"]["function"], 4);
    assert_eq!(stats["nodes_by_category"]["variable"], 2);
}

/// test_stats_depth_from_config: config max_depth bounds the tree when no flag is given.
#[test]
fn test_stats_depth_from_config() {
    let (_dir, graph) = fixture(Some("max_depth = 1\n"));
    let json = run_json(&["stats", path_str(&graph), "loadConfig", "--format", "json"]);
    assert_eq!(json["stats"]["total_nodes"], 4);
    assert_eq!(json["max_depth"], 1);

    let json = run_json(&["stats", path_str(&graph), "loadConfig", "--depth", "2", "--format", "json"]);
    assert_eq!(json["stats"]["total_nodes"], 5, "flag overrides config");
}

/// test_exclude_patterns_from_config: excluded files vanish from every view.
#[test]
fn test_exclude_patterns_from_config() {
    let (_dir, graph) = fixture(Some("exclude = [\"src/parse.ts\"]\n"));
    let json = run_json(&["tree", path_str(&graph), "loadConfig", "--format", "json"]);
    let mut ids = Vec::new();
    tree_ids(&json["root_node"], &mut ids);
    assert_eq!(json["total_nodes"], 5);
    assert!(!ids.contains(&"parse".to_string()), "ids: {ids:?}");
}

/// test_stats_compact_output: compact stats list depth and category rows.
#[test]
fn test_stats_compact_output() {
    let (_dir, graph) = fixture(None);
    let stdout = run_success(&["stats", path_str(&graph), "main"]);
    assert!(stdout.starts_with("total 6 visible"), "stdout: {stdout}");
    assert!(stdout.contains("category function 4"));
    assert!(stdout.contains("relationships "));
}
