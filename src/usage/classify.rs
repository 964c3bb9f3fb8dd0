use std::sync::OnceLock;

use regex::Regex;

use super::UsageKind;

/// Lines shown on each side of a match in `full_context`.
pub const CONTEXT_RADIUS: usize = 3;

// ---------------------------------------------------------------------------
// Compiled patterns, built once per process.
// ---------------------------------------------------------------------------

static DECLARATION: OnceLock<Option<Regex>> = OnceLock::new();
static ARROW_BINDING: OnceLock<Option<Regex>> = OnceLock::new();
static METHOD_SIGNATURE: OnceLock<Option<Regex>> = OnceLock::new();
static CONTROL_FLOW: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(%pattern, %err, "classification pattern failed to compile");
            None
        }
    })
    .as_ref()
}

fn declaration_re() -> Option<&'static Regex> {
    compiled(
        &DECLARATION,
        r"\b(?:function\s*\*?|class|interface|struct|enum|trait|def|fn|func)\s+([A-Za-z_$][\w$]*)",
    )
}

fn arrow_binding_re() -> Option<&'static Regex> {
    compiled(
        &ARROW_BINDING,
        r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
    )
}

fn method_signature_re() -> Option<&'static Regex> {
    compiled(
        &METHOD_SIGNATURE,
        r"^\s*(?:(?:public|private|protected|static|async|override|get|set)\s+)*([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::[^{=;]+)?\{",
    )
}

fn control_flow_re() -> Option<&'static Regex> {
    compiled(
        &CONTROL_FLOW,
        r"^(?:\}\s*)?(?:if|else|for|while|switch|do|case|elif|match|loop)\b",
    )
}

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "else", "do", "with",
];

// ---------------------------------------------------------------------------
// Context helpers
// ---------------------------------------------------------------------------

/// A window of `CONTEXT_RADIUS` lines around `index`, numbered, with the matched
/// line marked by `>`.
pub fn context_window(lines: &[&str], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(lines.len());
    (start..end)
        .map(|i| {
            let marker = if i == index { '>' } else { ' ' };
            format!("{marker} {:>4} | {}", i + 1, lines[i])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Name declared on `line`, if it looks like a function, class or method header.
fn declared_name(line: &str) -> Option<String> {
    if let Some(caps) = declaration_re().and_then(|re| re.captures(line)) {
        return Some(caps[1].to_owned());
    }
    if let Some(caps) = arrow_binding_re().and_then(|re| re.captures(line)) {
        return Some(caps[1].to_owned());
    }
    let caps = method_signature_re()?.captures(line)?;
    let name = &caps[1];
    if CONTROL_KEYWORDS.contains(&name) {
        return None;
    }
    Some(name.to_owned())
}

/// Nearest enclosing function or class, scanning upward from `index` inclusive.
pub fn enclosing_scope(lines: &[&str], index: usize) -> Option<String> {
    let end = (index + 1).min(lines.len());
    lines[..end]
        .iter()
        .rev()
        .find_map(|line| declared_name(line))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// True when `text` contains a single `=` that is not part of a comparison or arrow.
fn has_assignment(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        if b != b'=' {
            return false;
        }
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        let next = bytes.get(i + 1).copied().unwrap_or(b' ');
        !matches!(prev, b'=' | b'!' | b'<' | b'>') && !matches!(next, b'=' | b'>')
    })
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word).is_some_and(|rest| {
        !rest
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Short human label for how the symbol is used at byte offset `start` of `line`.
///
/// Import and export matches always keep `fallback`. Otherwise the tokens around the
/// match decide, and `fallback` (the matching rule's own label) applies when none fit.
pub fn usage_pattern(
    kind: UsageKind,
    fallback: &'static str,
    line: &str,
    start: usize,
) -> &'static str {
    if matches!(kind, UsageKind::Import | UsageKind::Export) {
        return fallback;
    }

    let trimmed = line.trim_start();
    let before = line[..start].trim_end();

    let first_word = trimmed
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next();
    if first_word == Some("return") {
        return "return statement";
    }
    if ends_with_word(before, "await") {
        return "async call";
    }
    if has_assignment(before) {
        return "variable assignment";
    }
    if control_flow_re().is_some_and(|re| re.is_match(trimmed)) || before.ends_with('?') {
        return "conditional/loop";
    }
    fallback
}
