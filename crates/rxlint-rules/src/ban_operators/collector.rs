//! Single-pass collection of operator usages in one file.

use indexmap::IndexMap;
use regex::Regex;
use rxlint_core::{FileContext, Severity, Violation};
use rxlint_ts::{node_location, unquote, Node, SourceFile, SyntaxVisitor, TypeResolver};

use super::table::BanMatcher;

/// Module-specifier shapes that name library operators.
#[derive(Debug)]
pub struct SpecifierShapes {
    root: Regex,
    patch: Regex,
}

impl SpecifierShapes {
    /// Builds the shapes for `rxjs`, optionally under an npm scope.
    ///
    /// Specifier text is matched with its quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the patterns fail to compile.
    pub fn new(library_scope: Option<&str>) -> Result<Self, regex::Error> {
        let prefix = library_scope
            .map(|scope| format!("{}/", regex::escape(scope.trim_end_matches('/'))))
            .unwrap_or_default();
        Ok(Self {
            root: Regex::new(&format!(r#"^['"]{prefix}rxjs?"#))?,
            patch: Regex::new(&format!(r#"^['"]{prefix}rxjs/add/operator/(\w+)['"]"#))?,
        })
    }

    /// Operator installed by a patch-module specifier.
    #[must_use]
    pub fn patched_operator<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        self.patch
            .captures(specifier)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// True if the specifier is the library root or one of its entry points.
    #[must_use]
    pub fn is_library_root(&self, specifier: &str) -> bool {
        self.root.is_match(specifier)
    }
}

/// Method-call sites per operator name, in discovery order.
pub type UsageIndex<'tree> = IndexMap<String, Vec<Node<'tree>>>;

/// Reporting identity of the rule being run.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    /// Rule code.
    pub code: &'static str,
    /// Rule name.
    pub name: &'static str,
    /// Severity of every violation.
    pub severity: Severity,
}

/// Visitor that checks imports immediately and defers method calls to the
/// end of the file.
pub struct UsageCollector<'a, 'tree> {
    ctx: &'a FileContext<'a>,
    file: &'tree SourceFile,
    types: &'a dyn TypeResolver,
    matcher: &'a dyn BanMatcher,
    shapes: &'a SpecifierShapes,
    stream_types: &'a [String],
    reporter: Reporter,
    used: UsageIndex<'tree>,
    /// Violations found so far.
    pub violations: Vec<Violation>,
}

impl<'a, 'tree> UsageCollector<'a, 'tree> {
    /// Creates a collector for one file pass.
    #[must_use]
    pub fn new(
        ctx: &'a FileContext<'a>,
        file: &'tree SourceFile,
        types: &'a dyn TypeResolver,
        matcher: &'a dyn BanMatcher,
        shapes: &'a SpecifierShapes,
        stream_types: &'a [String],
        reporter: Reporter,
    ) -> Self {
        Self {
            ctx,
            file,
            types,
            matcher,
            shapes,
            stream_types,
            reporter,
            used: UsageIndex::new(),
            violations: Vec::new(),
        }
    }

    /// Method-call sites recorded so far.
    #[must_use]
    pub fn used(&self) -> &UsageIndex<'tree> {
        &self.used
    }

    fn report(&mut self, node: Node<'_>, message: String) {
        self.violations.push(Violation::new(
            self.reporter.code,
            self.reporter.name,
            self.reporter.severity,
            node_location(self.ctx, node),
            message,
        ));
    }

    fn check_name(&mut self, name: &str, node: Node<'_>) {
        if let Some(message) = self.matcher.failure(name) {
            self.report(node, message);
        }
    }

    fn is_stream(&self, receiver: Node<'_>) -> bool {
        self.types.resolve_type(receiver).is_some_and(|ty| {
            self.stream_types
                .iter()
                .any(|stream| ty.is_assignable_to(stream))
        })
    }

    fn check_named_imports(&mut self, import: Node<'tree>) {
        let mut cursor = import.walk();
        let Some(clause) = import
            .named_children(&mut cursor)
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        let mut clause_cursor = clause.walk();
        let Some(named) = clause
            .named_children(&mut clause_cursor)
            .find(|c| c.kind() == "named_imports")
        else {
            return;
        };

        let mut spec_cursor = named.walk();
        let specifiers: Vec<Node<'tree>> = named
            .named_children(&mut spec_cursor)
            .filter(|s| s.kind() == "import_specifier")
            .collect();
        for specifier in specifiers {
            // `name` is the exported name, before any `as` alias.
            if let Some(name) = specifier.child_by_field_name("name") {
                let text = unquote(self.file.node_text(name));
                self.check_name(text, name);
            }
        }
    }
}

impl<'tree> SyntaxVisitor<'tree> for UsageCollector<'_, 'tree> {
    fn visit_import_statement(&mut self, node: Node<'tree>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let specifier = self.file.node_text(source);

        // Every patch path also has the root shape, so test it first.
        if let Some(operator) = self.shapes.patched_operator(specifier) {
            self.check_name(operator, source);
        } else if self.shapes.is_library_root(specifier) {
            self.check_named_imports(node);
        }
    }

    fn visit_call_expression(&mut self, node: Node<'tree>) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        if callee.kind() != "member_expression" {
            return;
        }
        let (Some(receiver), Some(property)) = (
            callee.child_by_field_name("object"),
            callee.child_by_field_name("property"),
        ) else {
            return;
        };

        if self.is_stream(receiver) {
            let method = self.file.node_text(property).to_string();
            self.used.entry(method).or_default().push(property);
        }
    }

    fn on_source_file_end(&mut self) {
        let used = std::mem::take(&mut self.used);
        for (name, sites) in &used {
            let Some(message) = self.matcher.failure(name) else {
                continue;
            };
            for site in sites {
                self.report(*site, message.clone());
            }
        }
        self.used = used;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_shapes() {
        let shapes = SpecifierShapes::new(None).expect("shapes");
        assert!(shapes.is_library_root("\"rxjs\""));
        assert!(shapes.is_library_root("'rxjs/operators'"));
        assert!(!shapes.is_library_root("'@acutmore/rxjs'"));
        assert!(!shapes.is_library_root("'./rxjs'"));
        assert_eq!(
            shapes.patched_operator("'rxjs/add/operator/do'"),
            Some("do")
        );
        assert_eq!(shapes.patched_operator("'rxjs/add/observable/of'"), None);
    }

    #[test]
    fn scoped_shapes() {
        let shapes = SpecifierShapes::new(Some("@acutmore")).expect("shapes");
        assert!(shapes.is_library_root("'@acutmore/rxjs'"));
        assert!(shapes.is_library_root("\"@acutmore/rxjs/operators\""));
        assert!(!shapes.is_library_root("'rxjs'"));
        assert_eq!(
            shapes.patched_operator("\"@acutmore/rxjs/add/operator/switchMap\""),
            Some("switchMap")
        );
        assert_eq!(shapes.patched_operator("'rxjs/add/operator/map'"), None);
    }

    #[test]
    fn scope_is_matched_literally() {
        let shapes = SpecifierShapes::new(Some("@a.b/")).expect("shapes");
        assert!(shapes.is_library_root("'@a.b/rxjs'"));
        assert!(!shapes.is_library_root("'@axb/rxjs'"));
    }

    #[test]
    fn patch_shape_needs_closing_quote() {
        let shapes = SpecifierShapes::new(None).expect("shapes");
        assert_eq!(shapes.patched_operator("'rxjs/add/operator/map/extra'"), None);
    }
}
