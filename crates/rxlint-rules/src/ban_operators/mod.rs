//! Rule to forbid configured RxJS operators.
//!
//! # Rationale
//!
//! Teams migrating between RxJS versions, or standardizing on a subset of
//! operators, need to stop new uses of specific operators from creeping in.
//!
//! # Detected Patterns
//!
//! - Named imports from the library root or an entry point:
//!   `import { map } from "rxjs/operators"` (the name before `as` is checked)
//! - Patch-module imports: `import "rxjs/add/operator/do"`
//! - Method calls on values whose declared type is a stream:
//!   `source$.switchMap(...)`, `this.state$?.map(...)`
//!
//! # Configuration
//!
//! ```toml
//! [rules.rxjs-ban-operators]
//! library_scope = "@acutmore"   # optional npm scope in front of `rxjs`
//! stream_types = ["Observable"]
//!
//! [rules.rxjs-ban-operators.operators]
//! do = "use tap instead"
//! "(merge|switch)Map" = true
//! map = false
//! ```
//!
//! Keys are full-name patterns. `true` bans, a string bans with an
//! explanation, `false` allows.
//!
//! # Suppression
//!
//! - `// rxlint: allow(rxjs-ban-operators) reason="..."`

mod collector;
mod options;
mod table;

pub use collector::{Reporter, SpecifierShapes, UsageCollector, UsageIndex};
pub use options::{BanOptions, BanSetting};
pub use table::{BanMatcher, BanTable, FAILURE_PREFIX};

use rxlint_core::{FileContext, RuleConfig, Severity, Violation};
use rxlint_ts::{walk, Rule, SourceFile, TypeResolver};

/// Rule code for rxjs-ban-operators.
pub const CODE: &str = "RX001";

/// Rule name for rxjs-ban-operators.
pub const NAME: &str = "rxjs-ban-operators";

/// Default receiver type whose methods count as operators.
pub const DEFAULT_STREAM_TYPE: &str = "Observable";

/// Forbids configured RxJS operators.
#[derive(Debug, Clone)]
pub struct RxjsBanOperators {
    /// Banned operators, in configuration order.
    pub bans: BanOptions,
    /// npm scope in front of `rxjs` in module specifiers.
    pub library_scope: Option<String>,
    /// Receiver types whose method calls are checked.
    pub stream_types: Vec<String>,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for RxjsBanOperators {
    fn default() -> Self {
        Self::new()
    }
}

impl RxjsBanOperators {
    /// Creates a rule that bans nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bans: BanOptions::new(),
            library_scope: None,
            stream_types: vec![DEFAULT_STREAM_TYPE.to_string()],
            severity: Severity::Error,
        }
    }

    /// Creates the rule from its `[rules.rxjs-ban-operators]` section.
    #[must_use]
    pub fn from_config(config: &RuleConfig) -> Self {
        let mut rule = Self::new();
        if let Some(table) = config.get_table("operators") {
            rule.bans = BanOptions::from_table(table);
        }
        if let Some(scope) = config.get_str("library_scope") {
            rule.library_scope = Some(scope.to_string());
        }
        if let Some(types) = config.get_str_array("stream_types") {
            rule.stream_types = types;
        }
        if let Some(severity) = config.severity {
            rule.severity = severity;
        }
        rule
    }

    /// Bans an operator, with an optional explanation.
    #[must_use]
    pub fn ban(mut self, name: &str, explanation: Option<&str>) -> Self {
        let setting = match explanation {
            Some(text) => BanSetting::BannedWithExplanation(text.to_string()),
            None => BanSetting::Banned,
        };
        self.bans.insert(name, setting);
        self
    }

    /// Explicitly allows an operator.
    #[must_use]
    pub fn allow(mut self, name: &str) -> Self {
        self.bans.insert(name, BanSetting::Disabled);
        self
    }

    /// Sets the npm scope in front of `rxjs`.
    #[must_use]
    pub fn library_scope(mut self, scope: impl Into<String>) -> Self {
        self.library_scope = Some(scope.into());
        self
    }

    /// Replaces the receiver types whose method calls are checked.
    #[must_use]
    pub fn stream_types(mut self, types: &[&str]) -> Self {
        self.stream_types = types.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for RxjsBanOperators {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Disallows the use of banned RxJS operators"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires_type_info(&self) -> bool {
        true
    }

    fn check(
        &self,
        ctx: &FileContext<'_>,
        file: &SourceFile,
        types: &dyn TypeResolver,
    ) -> Vec<Violation> {
        let table = BanTable::configure(&self.bans);
        if table.is_empty() {
            return Vec::new();
        }

        let shapes = match SpecifierShapes::new(self.library_scope.as_deref()) {
            Ok(shapes) => shapes,
            Err(err) => {
                tracing::warn!(error = %err, "invalid library scope, skipping {}", NAME);
                return Vec::new();
            }
        };

        let mut collector = UsageCollector::new(
            ctx,
            file,
            types,
            &table,
            &shapes,
            &self.stream_types,
            Reporter {
                code: CODE,
                name: NAME,
                severity: self.severity,
            },
        );
        walk(file, &mut collector);

        tracing::debug!(
            file = %ctx.relative_path.display(),
            bans = table.len(),
            operators_used = collector.used().len(),
            violations = collector.violations.len(),
            "checked banned operators"
        );
        collector.violations
    }
}
