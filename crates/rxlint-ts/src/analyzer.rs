//! Analyzer orchestrating lint execution over TypeScript sources.

use std::path::{Path, PathBuf};

use rxlint_core::{Config, FileContext, LintResult, Suppressions, Violation};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checker::{AmbientTypes, NoTypeInfo, SourceTypeChecker, TypeResolver};
use crate::rule::{Rule, RuleBox};
use crate::syntax::{Dialect, SourceFile};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a TypeScript source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Error while walking the directory tree.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    ambient: Option<AmbientTypes>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory (or single file) to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds an include glob pattern. With none, every TypeScript file is analyzed.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the built-in library declarations used for type resolution.
    #[must_use]
    pub fn ambient_types(mut self, ambient: AmbientTypes) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Sets whether files with syntax errors abort the run (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined or a
    /// glob pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();

        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let mut include_patterns = self.include_patterns;
        include_patterns.extend(config.analyzer.include.iter().cloned());

        let compile = |patterns: &[String]| -> Result<Vec<glob::Pattern>, AnalyzerError> {
            patterns
                .iter()
                .map(|p| glob::Pattern::new(p).map_err(AnalyzerError::from))
                .collect()
        };

        Ok(Analyzer {
            exclude: compile(&exclude_patterns)?,
            include: compile(&include_patterns)?,
            root,
            rules: self.rules,
            config,
            ambient: self.ambient.unwrap_or_default(),
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    rules: Vec<RuleBox>,
    exclude: Vec<glob::Pattern>,
    include: Vec<glob::Pattern>,
    config: Config,
    ambient: AmbientTypes,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Analyzes all files under the root and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery or reading fails, or if a file has
    /// syntax errors and `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {}", self.root.display());

        let mut result = LintResult::new();
        let files = self.discover_files()?;

        info!("Found {} files to analyze", files.len());

        for file_path in &files {
            debug!("Analyzing: {}", file_path.display());
            let content = std::fs::read_to_string(file_path)?;
            match self.analyze_source(file_path, &content) {
                Ok(violations) => {
                    result.violations.extend(violations);
                    result.files_checked += 1;
                }
                Err(AnalyzerError::Parse { path, message }) => {
                    warn!("Failed to parse {}: {}", path.display(), message);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse { path, message });
                    }
                }
                Err(e) => return Err(e),
            }
        }

        result.sort();

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Analyzes in-memory source as if it were the file at `path`.
    ///
    /// Violations come back sorted by position, with configured severity
    /// overrides applied and suppressed findings removed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Parse`] if no syntax tree can be built, or if
    /// the source has syntax errors and `fail_on_parse_error` is set.
    pub fn analyze_source(
        &self,
        path: &Path,
        content: &str,
    ) -> Result<Vec<Violation>, AnalyzerError> {
        let parse_error = |message: String| AnalyzerError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let dialect = Dialect::from_path(path).unwrap_or(Dialect::TypeScript);
        let file = SourceFile::parse(content, dialect).map_err(|e| parse_error(e.to_string()))?;
        if file.has_syntax_errors() {
            if self.fail_on_parse_error {
                return Err(parse_error("source contains syntax errors".to_string()));
            }
            debug!("{} has syntax errors, checking recovered tree", path.display());
        }

        let active: Vec<&RuleBox> = self
            .rules
            .iter()
            .filter(|rule| {
                let enabled = self.config.is_rule_enabled(rule.name());
                if !enabled {
                    debug!("Skipping disabled rule: {}", rule.name());
                }
                enabled
            })
            .collect();
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let checker;
        let types: &dyn TypeResolver = if active.iter().any(|r| r.requires_type_info()) {
            checker = SourceTypeChecker::new(&file, &self.ambient);
            &checker
        } else {
            &NoTypeInfo
        };

        let ctx = FileContext::new(path, file.text(), self.base_dir());
        let mut violations = Vec::new();
        for rule in active {
            let rule_violations = rule.check(&ctx, &file, types);
            violations.extend(self.apply_severity_override(rule.name(), rule_violations));
        }

        let suppressions = Suppressions::parse(file.text());
        if !suppressions.is_empty() {
            violations.retain(|v| match suppressions.allowing(v.location.line, &v.rule) {
                Some(directive) => {
                    debug!(
                        rule = %v.rule,
                        line = v.location.line,
                        reason = directive.reason.as_deref().unwrap_or(""),
                        "suppressed by allow directive"
                    );
                    false
                }
                None => true,
            });
        }

        let mut result = LintResult {
            violations,
            files_checked: 1,
        };
        result.sort();
        Ok(result.violations)
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }

    /// Directory that reported paths are relative to.
    fn base_dir(&self) -> &Path {
        if self.root.is_file() {
            self.root.parent().unwrap_or(&self.root)
        } else {
            &self.root
        }
    }

    /// Discovers all TypeScript source files to analyze, in path order.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let respect_gitignore = self.config.analyzer.respect_gitignore;
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(respect_gitignore)
            .git_exclude(respect_gitignore)
            .ignore(respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if Dialect::from_path(path).is_none() {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            if !self.is_included(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Checks if a path matches an exclude pattern, absolute or root-relative.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.exclude
            .iter()
            .any(|p| p.matches_path(path) || p.matches_path(relative))
    }

    fn is_included(&self, path: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let relative = self.relative(path);
        self.include
            .iter()
            .any(|p| p.matches_path(path) || p.matches_path(relative))
    }
}
