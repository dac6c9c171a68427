//! Compiled ban patterns and the lookup shared by every check site.

use regex::Regex;

use super::options::BanOptions;

/// Prefix of every diagnostic message.
pub const FAILURE_PREFIX: &str = "RxJS operator is banned";

/// Answers whether an operator name is banned.
///
/// Import-time and end-of-file checks go through the same implementation, so
/// a name always renders the same message.
pub trait BanMatcher {
    /// Diagnostic message for `name`, or `None` if it is not banned.
    fn failure(&self, name: &str) -> Option<String>;
}

#[derive(Debug)]
struct BanRule {
    pattern: Regex,
    explanation: String,
}

/// Banned-name patterns compiled from [`BanOptions`], in configuration order.
#[derive(Debug, Default)]
pub struct BanTable {
    rules: Vec<BanRule>,
}

impl BanTable {
    /// Compiles every banning entry as a full-name pattern.
    ///
    /// Disabled and malformed entries are skipped, as are keys that are not
    /// valid patterns.
    #[must_use]
    pub fn configure(options: &BanOptions) -> Self {
        let rules = options
            .iter()
            .filter_map(|(name, setting)| {
                let explanation = setting.explanation()?;
                match Regex::new(&format!("^(?:{name})$")) {
                    Ok(pattern) => Some(BanRule {
                        pattern,
                        explanation: explanation.to_string(),
                    }),
                    Err(err) => {
                        tracing::warn!(operator = %name, error = %err, "ignoring ban entry: invalid pattern");
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// True if nothing is banned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of compiled bans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl BanMatcher for BanTable {
    fn failure(&self, name: &str) -> Option<String> {
        let rule = self.rules.iter().find(|r| r.pattern.is_match(name))?;
        Some(if rule.explanation.is_empty() {
            format!("{FAILURE_PREFIX}: {name}")
        } else {
            format!("{FAILURE_PREFIX}: {name}: {}", rule.explanation)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ban_operators::options::BanSetting;

    fn table(entries: &[(&str, BanSetting)]) -> BanTable {
        let options: BanOptions = entries.iter().cloned().collect();
        BanTable::configure(&options)
    }

    #[test]
    fn banned_without_explanation() {
        let t = table(&[("map", BanSetting::Banned)]);
        assert_eq!(
            t.failure("map").as_deref(),
            Some("RxJS operator is banned: map")
        );
    }

    #[test]
    fn banned_with_explanation() {
        let t = table(&[(
            "do",
            BanSetting::BannedWithExplanation("use tap instead".into()),
        )]);
        assert_eq!(
            t.failure("do").as_deref(),
            Some("RxJS operator is banned: do: use tap instead")
        );
    }

    #[test]
    fn empty_explanation_has_no_suffix() {
        let t = table(&[("map", BanSetting::BannedWithExplanation(String::new()))]);
        assert_eq!(
            t.failure("map").as_deref(),
            Some("RxJS operator is banned: map")
        );
    }

    #[test]
    fn disabled_and_malformed_entries_ban_nothing() {
        let t = table(&[("map", BanSetting::Disabled), ("filter", BanSetting::Malformed)]);
        assert!(t.is_empty());
        assert!(t.failure("map").is_none());
        assert!(t.failure("filter").is_none());
    }

    #[test]
    fn names_match_whole_and_case_sensitively() {
        let t = table(&[("map", BanSetting::Banned)]);
        assert!(t.failure("switchMap").is_none());
        assert!(t.failure("mapTo").is_none());
        assert!(t.failure("Map").is_none());
    }

    #[test]
    fn keys_are_patterns() {
        let t = table(&[(".*Map", BanSetting::Banned)]);
        assert!(t.failure("switchMap").is_some());
        assert!(t.failure("mergeMap").is_some());
        assert!(t.failure("map").is_none());
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let t = table(&[("do|tap", BanSetting::Banned)]);
        assert!(t.failure("do").is_some());
        assert!(t.failure("tap").is_some());
        assert!(t.failure("doSomething").is_none());
    }

    #[test]
    fn first_match_wins() {
        let t = table(&[
            ("switch.*", BanSetting::BannedWithExplanation("first".into())),
            ("switchMap", BanSetting::BannedWithExplanation("second".into())),
        ]);
        assert_eq!(
            t.failure("switchMap").as_deref(),
            Some("RxJS operator is banned: switchMap: first")
        );
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let t = table(&[("(", BanSetting::Banned), ("map", BanSetting::Banned)]);
        assert_eq!(t.len(), 1);
        assert!(t.failure("map").is_some());
    }
}
