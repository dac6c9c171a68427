//! Rule construction from configuration.

use rxlint_core::Config;
use rxlint_ts::RuleBox;

use crate::ban_operators::{self, RxjsBanOperators};

/// Returns every built-in rule, configured from `config`.
#[must_use]
pub fn all_rules(config: &Config) -> Vec<RuleBox> {
    vec![ban_operators_rule(config)]
}

/// Looks up a built-in rule by name or code, configured from `config`.
#[must_use]
pub fn rule_by_name(name: &str, config: &Config) -> Option<RuleBox> {
    match name {
        ban_operators::NAME | ban_operators::CODE => Some(ban_operators_rule(config)),
        _ => None,
    }
}

fn ban_operators_rule(config: &Config) -> RuleBox {
    let section = config.rule(ban_operators::NAME).cloned().unwrap_or_default();
    Box::new(RxjsBanOperators::from_config(&section))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_code() {
        let config = Config::default();
        assert_eq!(
            rule_by_name("rxjs-ban-operators", &config).map(|r| r.code()),
            Some("RX001")
        );
        assert_eq!(
            rule_by_name("RX001", &config).map(|r| r.name()),
            Some("rxjs-ban-operators")
        );
        assert!(rule_by_name("no-such-rule", &config).is_none());
    }

    #[test]
    fn all_rules_are_listed() {
        let rules = all_rules(&Config::default());
        let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["rxjs-ban-operators"]);
    }
}
