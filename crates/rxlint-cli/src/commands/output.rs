//! Shared output formatting for lint results.

use anyhow::Result;
use miette::{GraphicalReportHandler, NamedSource, Report};
use rxlint_core::{LintResult, Severity, ViolationDiagnostic};
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `root` is the directory reported paths are relative to; `pretty` output
/// reads the sources from there.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Compact => print!("{}", render_compact(result)),
        OutputFormat::Pretty => print!("{}", render_pretty(result, root)),
    }
    Ok(())
}

fn severity_indicator(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

fn summary(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    format!(
        "{summary_color}Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)\x1b[0m\n",
        result.files_checked
    )
}

fn render_text(result: &LintResult) -> String {
    let mut out = String::new();
    for violation in &result.violations {
        out.push_str(&format!(
            "{} {} at {}:{}:{}\n",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        ));
        out.push_str(&format!(
            "  {}: {}\n\n",
            severity_indicator(violation.severity),
            violation.message
        ));
    }
    out.push_str(&summary(result));
    out
}

fn render_compact(result: &LintResult) -> String {
    result
        .violations
        .iter()
        .map(|v| format!("{v}\n"))
        .collect()
}

fn render_pretty(result: &LintResult, root: &Path) -> String {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();

    for violation in &result.violations {
        let file = &violation.location.file;
        let source = std::fs::read_to_string(root.join(file))
            .or_else(|_| std::fs::read_to_string(file));
        let Ok(source) = source else {
            tracing::warn!("Cannot read {} for snippet, printing plain", file.display());
            out.push_str(&format!("{violation}\n"));
            continue;
        };

        let report = Report::new(ViolationDiagnostic::from(violation))
            .with_source_code(NamedSource::new(file.display().to_string(), source));
        if handler.render_report(&mut out, report.as_ref()).is_err() {
            out.push_str(&format!("{violation}\n"));
        }
        out.push('\n');
    }
    out.push_str(&summary(result));
    out
}
