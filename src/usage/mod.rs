//! Heuristic, line-oriented detection of a symbol's occurrences in source text.
//!
//! This is pattern matching, not parsing: it recognises the common shapes of imports,
//! exports, constructor/method/function calls and property reads in C-family, Python
//! and Rust code. Any other mention outside a string literal counts as a call site
//! labelled "direct usage". A language-aware extractor can replace it behind
//! [`UsageExtractor`].

mod classify;
mod rules;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use classify::CONTEXT_RADIUS;

/// Syntactic role of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Import,
    Export,
    /// `new Name(...)`
    Constructor,
    /// `obj.name(...)`
    Method,
    /// `obj.name` without a call.
    Property,
    /// `name(...)`, and any bare mention no other kind claims.
    Call,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Import => "import",
            UsageKind::Export => "export",
            UsageKind::Constructor => "constructor",
            UsageKind::Method => "method",
            UsageKind::Property => "property",
            UsageKind::Call => "call",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a symbol in scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// 1-based line within the scanned text.
    pub line: usize,
    /// 0-based character column of the symbol on that line.
    pub column: usize,
    pub kind: UsageKind,
    /// The matched line, trimmed.
    pub context: String,
    /// Numbered window of surrounding lines with the matched line marked.
    pub full_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_scope: Option<String>,
    /// Human label such as "function call" or "variable assignment".
    pub usage_pattern: String,
}

/// Anything that can locate a symbol's usages in a block of source text.
pub trait UsageExtractor {
    fn find_usages(&self, source: &str, symbol: &str) -> Vec<Usage>;
}

/// The default regex-battery extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternUsageScanner;

impl UsageExtractor for PatternUsageScanner {
    fn find_usages(&self, source: &str, symbol: &str) -> Vec<Usage> {
        if symbol.trim().is_empty() || !source.contains(symbol) {
            return Vec::new();
        }

        let rules = rules::build_rules(symbol);
        let lines: Vec<&str> = source.lines().collect();
        let mut usages: Vec<Usage> = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if !line.contains(symbol) {
                continue;
            }
            // A column claimed by an earlier (more specific) rule is not reported again.
            let mut claimed: HashSet<usize> = HashSet::new();

            for rule in &rules {
                for caps in rule.regex.captures_iter(line) {
                    let Some(m) = caps.name("sym") else {
                        continue;
                    };
                    if !rule.accepts(line, m.start(), m.end()) || !claimed.insert(m.start()) {
                        continue;
                    }
                    usages.push(Usage {
                        line: index + 1,
                        column: line[..m.start()].chars().count(),
                        kind: rule.kind,
                        context: line.trim().to_owned(),
                        full_context: classify::context_window(&lines, index),
                        function_scope: classify::enclosing_scope(&lines, index),
                        usage_pattern: classify::usage_pattern(rule.kind, rule.label, line, m.start())
                            .to_owned(),
                    });
                }
            }
        }

        usages.sort_by(|a, b| a.line.cmp(&b.line).then(a.column.cmp(&b.column)));
        usages
    }
}

/// Scan `source` for usages of `symbol` with the default pattern scanner.
pub fn find_usages(source: &str, symbol: &str) -> Vec<Usage> {
    PatternUsageScanner.find_usages(source, symbol)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
