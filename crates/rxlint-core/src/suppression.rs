//! Comment-based suppression directives.
//!
//! Supports line comments like:
//! ```text
//! // rxlint: allow(rxjs-ban-operators) reason="legacy module, migrating in Q3"
//! ```
//!
//! A directive applies to its own line (as a trailing comment) and to the
//! line directly below it.

use std::collections::{HashMap, HashSet};

const DIRECTIVE_PREFIX: &str = "rxlint:";

/// Parsed allowance directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowDirective {
    /// Rule names that are allowed. `all` matches every rule.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

impl AllowDirective {
    fn covers(&self, rule_name: &str) -> bool {
        self.rules.contains(rule_name) || self.rules.contains("all")
    }
}

/// All allowance directives of one source file, indexed by line.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    by_line: HashMap<usize, AllowDirective>,
}

impl Suppressions {
    /// Scans source text for directives.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let by_line = content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| parse_allow_directive(line).map(|d| (i + 1, d)))
            .collect();
        Self { by_line }
    }

    /// Returns true if no directives were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    /// Returns the directive allowing `rule_name` at `line` (1-indexed), if any.
    #[must_use]
    pub fn allowing(&self, line: usize, rule_name: &str) -> Option<&AllowDirective> {
        [line, line.saturating_sub(1)]
            .into_iter()
            .filter(|l| *l > 0)
            .filter_map(|l| self.by_line.get(&l))
            .find(|d| d.covers(rule_name))
    }

    /// Returns true if `rule_name` is allowed at `line` (1-indexed).
    #[must_use]
    pub fn is_allowed(&self, line: usize, rule_name: &str) -> bool {
        self.allowing(line, rule_name).is_some()
    }
}

/// Parses an allowance directive from a source line.
///
/// The directive may be the whole line or a trailing `//` comment. Earlier
/// `//` sequences, such as one inside a URL string, are skipped.
fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    line.match_indices("//")
        .find_map(|(start, _)| parse_comment(&line[start + 2..]))
}

fn parse_comment(comment: &str) -> Option<AllowDirective> {
    let comment_content = comment.trim_start_matches('/').trim();

    let directive = comment_content.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .map(str::trim)
        .and_then(|r| r.strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(AllowDirective { rules, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directive_with_reason() {
        let d = parse_allow_directive(
            "// rxlint: allow(rxjs-ban-operators) reason=\"legacy module\"",
        )
        .expect("directive");
        assert!(d.rules.contains("rxjs-ban-operators"));
        assert_eq!(d.reason.as_deref(), Some("legacy module"));
    }

    #[test]
    fn directive_after_url_in_string() {
        let d = parse_allow_directive("const u = \"http://x\"; // rxlint: allow(all)")
            .expect("directive");
        assert!(d.covers("rxjs-ban-operators"));
        assert!(parse_allow_directive("const u = \"http://x\"; // plain").is_none());
    }

    #[test]
    fn parses_multiple_rules() {
        let d = parse_allow_directive("// rxlint: allow(rule1, rule2)").expect("directive");
        assert_eq!(d.rules.len(), 2);
        assert!(d.reason.is_none());
    }

    #[test]
    fn ignores_plain_comments_and_empty_lists() {
        assert!(parse_allow_directive("// just a comment").is_none());
        assert!(parse_allow_directive("// rxlint: allow()").is_none());
        assert!(parse_allow_directive("const a = 1;").is_none());
    }

    #[test]
    fn applies_to_next_line() {
        let content = "// rxlint: allow(rxjs-ban-operators)\nimport { map } from \"rxjs\";\n";
        let s = Suppressions::parse(content);
        assert!(s.is_allowed(2, "rxjs-ban-operators"));
        assert!(!s.is_allowed(2, "other-rule"));
        assert!(!s.is_allowed(3, "rxjs-ban-operators"));
    }

    #[test]
    fn applies_to_trailing_comment_line() {
        let content = "import { map } from \"rxjs\"; // rxlint: allow(all) reason=\"shim\"\n";
        let s = Suppressions::parse(content);
        let d = s.allowing(1, "rxjs-ban-operators").expect("allowed");
        assert_eq!(d.reason.as_deref(), Some("shim"));
    }

    #[test]
    fn empty_source_has_no_directives() {
        assert!(Suppressions::parse("").is_empty());
    }
}
