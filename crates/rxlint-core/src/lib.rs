//! # rxlint-core
//!
//! Core types shared by every rxlint crate.
//!
//! - [`Violation`], [`Location`] and [`Severity`] for lint findings
//! - [`LintResult`] for aggregated results
//! - [`Config`] for the TOML configuration file
//! - [`FileContext`] for per-file rule input
//! - [`Suppressions`] for `// rxlint: allow(...)` comment directives

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod suppression;
mod types;

pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::FileContext;
pub use suppression::{AllowDirective, Suppressions};
pub use types::{LintResult, Location, Severity, Violation, ViolationDiagnostic};
