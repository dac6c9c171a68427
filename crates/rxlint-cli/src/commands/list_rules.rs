//! List rules command implementation.

use anyhow::Result;
use rxlint_rules::all_rules;

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource) -> Result<()> {
    let config = super::load_config(source)?;

    println!("Available rules:\n");
    println!("{:<8} {:<22} {:<9} Description", "Code", "Name", "Enabled");
    println!("{}", "-".repeat(80));

    for rule in all_rules(&config) {
        let enabled = if config.is_rule_enabled(rule.name()) {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<8} {:<22} {:<9} {}",
            rule.code(),
            rule.name(),
            enabled,
            rule.description()
        );
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  rxlint check --rules rxjs-ban-operators");
    println!("  rxlint check --rules RX001");

    Ok(())
}
