//! Rule trait for TypeScript lint rules.

use rxlint_core::{FileContext, Severity, Violation};

use crate::checker::TypeResolver;
use crate::syntax::SourceFile;

/// A per-file lint rule over a Tree-sitter TypeScript tree.
///
/// Rules usually implement [`SyntaxVisitor`](crate::SyntaxVisitor) on a
/// private struct, drive it with [`walk`](crate::walk) and return the
/// violations it collected.
///
/// # Example
///
/// ```ignore
/// use rxlint_ts::{Rule, SourceFile, TypeResolver};
/// use rxlint_core::{FileContext, Violation};
///
/// pub struct NoDefaultRxImport;
///
/// impl Rule for NoDefaultRxImport {
///     fn name(&self) -> &'static str { "no-default-rx-import" }
///     fn code(&self) -> &'static str { "RX900" }
///
///     fn check(&self, ctx: &FileContext<'_>, file: &SourceFile, _types: &dyn TypeResolver) -> Vec<Violation> {
///         let mut visitor = ImportVisitor::new(ctx, file);
///         rxlint_ts::walk(file, &mut visitor);
///         visitor.violations
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "rxjs-ban-operators").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "RX001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Whether [`Rule::check`] needs a real [`TypeResolver`].
    ///
    /// When no enabled rule asks for one, the analyzer skips building the
    /// per-file declaration index and passes [`NoTypeInfo`](crate::NoTypeInfo).
    fn requires_type_info(&self) -> bool {
        false
    }

    /// Checks a single file and returns any violations found.
    ///
    /// `types` answers only for nodes of `file`. The order of the returned
    /// violations is not kept: the analyzer sorts each file's results by
    /// line and column.
    fn check(
        &self,
        ctx: &FileContext<'_>,
        file: &SourceFile,
        types: &dyn TypeResolver,
    ) -> Vec<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
