//! Ban configuration as read from `[rules.rxjs-ban-operators.operators]`.

use indexmap::IndexMap;

/// Configured value for one operator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanSetting {
    /// `false`: the operator is allowed.
    Disabled,
    /// `true`: banned without explanation.
    Banned,
    /// A string: banned, with the string appended to the message.
    BannedWithExplanation(String),
    /// Any other value. Treated as not banned.
    Malformed,
}

impl BanSetting {
    /// Interprets a raw configuration value.
    #[must_use]
    pub fn from_value(value: &toml::Value) -> Self {
        match value {
            toml::Value::Boolean(false) => Self::Disabled,
            toml::Value::Boolean(true) => Self::Banned,
            toml::Value::String(explanation) => Self::BannedWithExplanation(explanation.clone()),
            _ => Self::Malformed,
        }
    }

    /// Explanation for a ban, or `None` if this setting bans nothing.
    ///
    /// `Banned` yields an empty explanation.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        match self {
            Self::Banned => Some(""),
            Self::BannedWithExplanation(explanation) => Some(explanation),
            Self::Disabled | Self::Malformed => None,
        }
    }
}

/// Ordered mapping of operator name (a pattern) to its setting.
///
/// Keeps the order of the configuration file. Inserting an existing key
/// replaces its setting in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanOptions {
    entries: IndexMap<String, BanSetting>,
}

impl BanOptions {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML table. Malformed values are kept and logged.
    #[must_use]
    pub fn from_table(table: &toml::Table) -> Self {
        let mut options = Self::new();
        for (name, value) in table {
            let setting = BanSetting::from_value(value);
            if setting == BanSetting::Malformed {
                tracing::warn!(
                    operator = %name,
                    value = %value,
                    "ignoring ban entry: expected a boolean or a string"
                );
            }
            options.insert(name.clone(), setting);
        }
        options
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, setting: BanSetting) {
        self.entries.insert(name.into(), setting);
    }

    /// Entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BanSetting)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries, including disabled and malformed ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, BanSetting)> for BanOptions {
    fn from_iter<I: IntoIterator<Item = (S, BanSetting)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (name, setting) in iter {
            options.insert(name, setting);
        }
        options
    }
}
