//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/heroku/config.toml`
//! 3. Environment variables: `HEROKU_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Routing defaults for the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Namespace for bare words that are not namespaces themselves (default: app)
    pub default_namespace: String,
    /// Action for a bare namespace (default: index)
    ///
    /// The built-in `help` and `version` namespaces only expose `index`;
    /// with any other value they are reachable as `help:index` and
    /// `version:index` only.
    pub default_action: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_namespace: "app".into(),
            default_action: "index".into(),
        }
    }
}

/// Get the XDG config directory for heroku.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "heroku").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

impl Settings {
    /// Load settings: defaults, global config file, then `HEROKU_*` env vars.
    pub fn load() -> Result<Self, CommandError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::build(global.as_deref(), true)
    }

    /// Load settings from an explicit file on top of the defaults.
    ///
    /// Environment variables are not consulted.
    pub fn load_from(path: &Path) -> Result<Self, CommandError> {
        Self::build(Some(path), false)
    }

    fn build(path: Option<&Path>, with_env: bool) -> Result<Self, CommandError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("default_namespace", defaults.default_namespace)
            .map_err(config_err)?
            .set_default("default_action", defaults.default_action)
            .map_err(config_err)?;

        if let Some(path) = path {
            tracing::debug!("loading config from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("HEROKU")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), CommandError> {
        for (key, value) in [
            ("default_namespace", &self.default_namespace),
            ("default_action", &self.default_action),
        ] {
            if value.is_empty() || value.contains(':') {
                return Err(CommandError::Config {
                    message: format!("{key} must be a non-empty word without ':', got {value:?}"),
                });
            }
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, CommandError> {
        toml::to_string_pretty(self).map_err(|e| CommandError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> CommandError {
    CommandError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_default_then_routes_to_app_index() {
        let settings = Settings::default();
        assert_eq!(settings.default_namespace, "app");
        assert_eq!(settings.default_action, "index");
    }

    #[test]
    fn given_settings_when_to_toml_then_contains_keys() {
        let toml = Settings::default().to_toml().expect("serialize");
        assert!(toml.contains("default_namespace = \"app\""));
        assert!(toml.contains("default_action = \"index\""));
    }

    #[test]
    fn given_colon_in_namespace_when_validating_then_config_error() {
        let settings = Settings {
            default_namespace: "app:list".into(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CommandError::Config { .. })
        ));
    }
}
