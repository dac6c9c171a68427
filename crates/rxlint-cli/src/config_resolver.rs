//! Locating and loading `rxlint.toml`.
//!
//! Lookup order:
//!
//! 1. `--config` (or `$RXLINT_CONFIG`), used as given
//! 2. `rxlint.toml` / `.rxlint.toml` in the analyzed directory or the nearest
//!    ancestor, not looking past the repository root (a directory with `.git`)
//! 3. `config.toml` in `$RXLINT_CONFIG_DIR` or `~/.rxlint/`
//! 4. built-in defaults

use rxlint_core::{Config, ConfigError};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order within a directory.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["rxlint.toml", ".rxlint.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found next to the analyzed sources.
    Project(PathBuf),
    /// The per-user fallback.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// The config file, unless defaults are used.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads the configuration this source points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match self {
            Self::Default => Ok(Config::default()),
            Self::Global(p) => {
                tracing::info!("Using global config: {}", p.display());
                Config::from_file(p)
            }
            Self::Explicit(p) | Self::Project(p) => Config::from_file(p),
        }
    }
}

/// Resolves the configuration for analyzing `target` (a file or directory).
#[must_use]
pub fn resolve(target: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_with_global(target, explicit, global_config_dir().as_deref())
}

fn resolve_with_global(
    target: &Path,
    explicit: Option<&Path>,
    global_dir: Option<&Path>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }
    if let Some(found) = find_project_config(target) {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }
    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, ConfigSource::Global)
}

fn find_project_config(target: &Path) -> Option<PathBuf> {
    let start = if target.is_file() {
        target.parent()?
    } else {
        target
    };
    // Relative targets like "." have no useful ancestors until made absolute.
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    for dir in start.ancestors() {
        let hit = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file());
        if hit.is_some() {
            return hit;
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    None
}

/// The per-user config directory: `$RXLINT_CONFIG_DIR`, else `~/.rxlint`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os("RXLINT_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".rxlint")),
    }
}
