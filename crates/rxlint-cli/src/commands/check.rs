//! Check command implementation.

use anyhow::{Context, Result};
use rxlint_core::{Config, Severity};
use rxlint_rules::{all_rules, rule_by_name};
use rxlint_ts::{Analyzer, RuleBox};
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Options of `rxlint check`.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes to run instead of all rules.
    pub rules: Option<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
    /// Failure threshold, overriding `fail_on` from the config.
    pub fail_on: Option<Severity>,
}

/// Runs the check command.
///
/// Returns `true` if a violation at or above the failure threshold was found.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<bool> {
    let config = super::load_config(source)?;
    let threshold = options
        .fail_on
        .or(config.fail_on)
        .unwrap_or(Severity::Error);

    let rules = match &options.rules {
        Some(filter) => {
            let names: Vec<&str> = filter.split(',').map(str::trim).collect();
            filter_rules(&names, &config)
        }
        None => all_rules(&config),
    };

    let mut builder = Analyzer::builder()
        .root(path)
        .excludes(options.exclude.iter().cloned())
        .config(config);
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rules",
        path.display(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, options.format, analyzer.root())?;

    Ok(result.has_violations_at(threshold))
}

fn filter_rules(names: &[&str], config: &Config) -> Vec<RuleBox> {
    names
        .iter()
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let rule = rule_by_name(name, config);
            if rule.is_none() {
                tracing::warn!("Unknown rule: {}", name);
            }
            rule
        })
        .collect()
}
