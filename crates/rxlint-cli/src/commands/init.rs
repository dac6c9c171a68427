//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config_resolver::PROJECT_CONFIG_NAMES;

const DEFAULT_CONFIG: &str = r#"# rxlint configuration

# Lowest severity that makes `rxlint check` fail
# fail_on = "error"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./src"

# Glob patterns to exclude from analysis
exclude = [
    "**/node_modules/**",
    "**/dist/**",
]

# Respect .gitignore files
respect_gitignore = true

[rules.rxjs-ban-operators]
enabled = true
# severity = "warning"

# Package scope RxJS is installed under, e.g. "@acme" for "@acme/rxjs"
# library_scope = "@acme"

# Types whose method calls count as operator usage
# stream_types = ["Observable"]

# Banned operators: true bans, a string bans with an explanation,
# false leaves the operator allowed. Keys are regular expressions.
[rules.rxjs-ban-operators.operators]
# do = "use tap instead"
# "switchMap|mergeMap" = true
"#;

/// Runs the init command in the current directory.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new(PROJECT_CONFIG_NAMES[0]);
    write_config(config_path, force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. List banned operators under [rules.rxjs-ban-operators.operators]");
    println!("  2. Run: rxlint check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}
