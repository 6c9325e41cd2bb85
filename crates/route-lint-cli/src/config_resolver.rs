//! Locating and loading `route-lint` configuration.
//!
//! Lookup order:
//!
//! 1. `--config` flag
//! 2. `{project}/route-lint.toml`, then `{project}/.route-lint.toml`
//! 3. `$ROUTE_LINT_CONFIG_DIR/config.toml`, or `~/.route-lint/config.toml`
//! 4. built-in defaults

use anyhow::{Context, Result};
use route_lint_core::Config;
use std::path::{Path, PathBuf};

const PROJECT_CONFIG_NAMES: &[&str] = &["route-lint.toml", ".route-lint.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

const CONFIG_DIR_ENV: &str = "ROUTE_LINT_CONFIG_DIR";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found next to the analyzed project.
    Project(PathBuf),
    /// Found in the user-wide config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Path of the config file, if one was found.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads and parses the config file, or returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            tracing::debug!("No config file found, using defaults");
            return Ok(Config::default());
        };

        if matches!(self, Self::Global(_)) {
            tracing::info!("Using global config: {}", path.display());
        }

        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

/// Finds the config for the project at `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_in(project_dir, explicit, global_config_dir().as_deref())
}

fn resolve_in(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(found) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file())
    {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)) {
        Some(candidate) if candidate.is_file() => {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        }
        _ => ConfigSource::Default,
    }
}

fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|h| h.join(".route-lint")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_lint_core::Severity;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_wins_without_existence_check() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("route-lint.toml"), "").unwrap();

        let result = resolve_in(project.path(), Some(Path::new("/missing.toml")), None);
        assert_eq!(result, ConfigSource::Explicit(PathBuf::from("/missing.toml")));
        assert!(result.load().is_err());
    }

    #[test]
    fn plain_name_preferred_over_dotfile() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join(".route-lint.toml"), "").unwrap();
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join(".route-lint.toml"))
        );

        fs::write(project.path().join("route-lint.toml"), "").unwrap();
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join("route-lint.toml"))
        );
    }

    #[test]
    fn global_used_only_without_project_config() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        assert_eq!(
            resolve_in(project.path(), None, Some(global.path())),
            ConfigSource::Default
        );

        fs::write(global.path().join("config.toml"), "fail_on = \"warning\"\n").unwrap();
        let result = resolve_in(project.path(), None, Some(global.path()));
        assert_eq!(result, ConfigSource::Global(global.path().join("config.toml")));
        assert_eq!(result.load().unwrap().fail_threshold(), Severity::Warning);

        fs::write(project.path().join("route-lint.toml"), "").unwrap();
        assert!(matches!(
            resolve_in(project.path(), None, Some(global.path())),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn default_loads_default_config() {
        let config = ConfigSource::Default.load().unwrap();
        assert_eq!(config.fail_threshold(), Severity::Error);
        assert!(ConfigSource::Default.path().is_none());
    }

    #[test]
    fn invalid_toml_is_reported() {
        let project = TempDir::new().unwrap();
        let path = project.path().join("route-lint.toml");
        fs::write(&path, "fail_on = [").unwrap();

        let err = ConfigSource::Project(path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
