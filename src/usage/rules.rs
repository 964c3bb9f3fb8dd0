use regex::Regex;

use super::UsageKind;

/// Extra acceptance test run on a regex match: `(line, sym_start, sym_end)`.
type Guard = fn(&str, usize, usize) -> bool;

/// One entry of the pattern battery. The regex captures the symbol in group `sym`.
pub(crate) struct Rule {
    pub kind: UsageKind,
    /// Pattern label used when no surrounding-token classification applies.
    pub label: &'static str,
    pub regex: Regex,
    guard: Option<Guard>,
}

impl Rule {
    pub fn accepts(&self, line: &str, start: usize, end: usize) -> bool {
        self.guard.is_none_or(|g| g(line, start, end))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escaped symbol wrapped in a `sym` group, with word boundaries only on sides that
/// start or end with a word character (so `$store` still matches after a space).
fn symbol_group(symbol: &str) -> String {
    let escaped = regex::escape(symbol);
    let lead = if symbol.chars().next().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    let trail = if symbol.chars().last().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}(?P<sym>{escaped}){trail}")
}

/// `.name` must not be followed by a call.
fn not_followed_by_call(line: &str, _start: usize, end: usize) -> bool {
    !line[end..].trim_start().starts_with('(')
}

/// Byte offset `start` is not inside a quoted string literal.
fn outside_string(line: &str, start: usize, _end: usize) -> bool {
    let mut open: Option<char> = None;
    let mut escaped = false;
    for c in line[..start].chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (open, c) {
            (_, '\\') => escaped = true,
            (None, '\'' | '"' | '`') => open = Some(c),
            (Some(q), _) if q == c => open = None,
            _ => {}
        }
    }
    open.is_none()
}

/// Bare `name(` that is neither a member call nor a declaration of `name`.
fn bare_call(line: &str, start: usize, _end: usize) -> bool {
    let before = line[..start].trim_end();
    if before.ends_with('.') || before.ends_with("::") {
        return false;
    }
    let last_word = before
        .rsplit(|c: char| !is_word_char(c) && c != '*')
        .next()
        .unwrap_or("")
        .trim_end_matches('*');
    !matches!(last_word, "function" | "fn" | "def" | "func" | "new")
}

/// Compile the ordered rule battery for `symbol`.
///
/// Order matters: when two rules hit the same column, the earlier rule's kind wins.
pub(crate) fn build_rules(symbol: &str) -> Vec<Rule> {
    let s = symbol_group(symbol);
    let specs: Vec<(UsageKind, &'static str, String, Option<Guard>)> = vec![
        // import { a, name } from '...'
        (
            UsageKind::Import,
            "module import",
            format!(r"^\s*import\s+(?:type\s+)?(?:[\w$]+\s*,\s*)?\{{[^}}]*?{s}"),
            None,
        ),
        // import name from '...' / import * as name from '...'
        (
            UsageKind::Import,
            "module import",
            format!(r"^\s*import\s+(?:type\s+)?(?:\*\s+as\s+)?{s}\s*(?:,|\bfrom\b)"),
            None,
        ),
        // const name = require('...')
        (
            UsageKind::Import,
            "module import",
            format!(r"\b(?:const|let|var)\s+{s}\s*=\s*require\s*\("),
            None,
        ),
        // from module import name
        (
            UsageKind::Import,
            "module import",
            format!(r"^\s*from\s+\S+\s+import\s+[^#]*?{s}"),
            None,
        ),
        // use crate::path::name;
        (
            UsageKind::Import,
            "module import",
            format!(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+[^;]*?{s}"),
            None,
        ),
        // export { a, name }
        (
            UsageKind::Export,
            "module export",
            format!(r"^\s*export\s*\{{[^}}]*?{s}"),
            None,
        ),
        // export default name / export default function name
        (
            UsageKind::Export,
            "module export",
            format!(
                r"^\s*export\s+default\s+(?:async\s+)?(?:function\s*\*?\s*|class\s+)?{s}"
            ),
            None,
        ),
        // module.exports = name
        (
            UsageKind::Export,
            "module export",
            format!(r"\bmodule\.exports\s*=\s*{s}"),
            None,
        ),
        // new Name(...)
        (
            UsageKind::Constructor,
            "constructor call",
            format!(r"\bnew\s+{s}\s*(?:<[^>]*>)?\s*\("),
            None,
        ),
        // obj.name(...) / obj?.name(...) / Type::name(...)
        (
            UsageKind::Method,
            "method invocation",
            format!(r"(?:\?\.|\.|::){s}\s*(?:<[^>]*>)?\s*\("),
            None,
        ),
        // obj.name
        (
            UsageKind::Property,
            "property access",
            format!(r"(?:\?\.|\.){s}"),
            Some(not_followed_by_call as Guard),
        ),
        // name(...)
        (
            UsageKind::Call,
            "function call",
            format!(r"{s}\s*\("),
            Some(bare_call as Guard),
        ),
        // any other mention outside a string literal, reported as a call site
        (
            UsageKind::Call,
            "direct usage",
            s.clone(),
            Some(outside_string as Guard),
        ),
    ];

    specs
        .into_iter()
        .filter_map(|(kind, label, pattern, guard)| match Regex::new(&pattern) {
            Ok(regex) => Some(Rule {
                kind,
                label,
                regex,
                guard,
            }),
            Err(err) => {
                tracing::warn!(%pattern, %err, "skipping usage rule that failed to compile");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_matching(symbol: &str, line: &str) -> Vec<(UsageKind, &'static str)> {
        build_rules(symbol)
            .iter()
            .filter(|r| {
                r.regex.captures_iter(line).any(|caps| {
                    let m = caps.name("sym").unwrap();
                    r.accepts(line, m.start(), m.end())
                })
            })
            .map(|r| (r.kind, r.label))
            .collect()
    }

    fn kinds_matching(symbol: &str, line: &str) -> Vec<UsageKind> {
        rules_matching(symbol, line).into_iter().map(|(k, _)| k).collect()
    }

    fn labels_matching(symbol: &str, line: &str) -> Vec<&'static str> {
        rules_matching(symbol, line).into_iter().map(|(_, l)| l).collect()
    }

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(build_rules("foo").len(), 13);
        assert_eq!(build_rules("$store").len(), 13);
        assert_eq!(build_rules("a.b*c").len(), 13);
    }

    #[test]
    fn test_word_boundaries() {
        assert!(kinds_matching("foo", "foobar();").is_empty());
        assert!(kinds_matching("foo", "my_foo = 1").is_empty());
        assert_eq!(labels_matching("$store", "x = $store"), vec!["direct usage"]);
        assert_eq!(kinds_matching("$store", "x = $store"), vec![UsageKind::Call]);
    }

    #[test]
    fn test_every_rule_maps_to_a_contract_kind() {
        for rule in build_rules("foo") {
            assert!(
                matches!(
                    rule.kind,
                    UsageKind::Call
                        | UsageKind::Import
                        | UsageKind::Export
                        | UsageKind::Method
                        | UsageKind::Property
                        | UsageKind::Constructor
                ),
                "unexpected kind {:?}",
                rule.kind
            );
        }
    }

    #[test]
    fn test_mentions_inside_string_literals_are_ignored() {
        assert!(labels_matching("foo", "log('foo')").is_empty());
        assert!(labels_matching("foo", "log(\"a \\\" foo\")").is_empty());
        assert_eq!(labels_matching("foo", "log('x', foo)"), vec!["direct usage"]);
    }

    #[test]
    fn test_method_vs_property_guard() {
        let method = kinds_matching("save", "user.save();");
        assert!(method.contains(&UsageKind::Method));
        assert!(!method.contains(&UsageKind::Property));

        let property = kinds_matching("save", "const f = user.save;");
        assert!(property.contains(&UsageKind::Property));
        assert!(!property.contains(&UsageKind::Method));
    }

    #[test]
    fn test_declaration_is_not_a_call() {
        let labels = labels_matching("foo", "function foo(a, b) {");
        assert!(!labels.contains(&"function call"));
        assert_eq!(labels, vec!["direct usage"]);
        assert!(!labels_matching("foo", "def foo(x):").contains(&"function call"));
    }

    #[test]
    fn test_import_variants() {
        for line in [
            "import { bar, foo } from './x';",
            "import foo from './x';",
            "import * as foo from './x';",
            "const foo = require('./x');",
            "from pkg.mod import bar, foo",
            "use crate::graph::foo;",
        ] {
            assert!(
                kinds_matching("foo", line).contains(&UsageKind::Import),
                "expected import match in {line:?}"
            );
        }
    }
}
