//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `FLAGSHIFT__<SECTION>__<KEY>`, e.g.
//!    `FLAGSHIFT__STORE__DATA_DIR=/srv/flags`
//! 3. `./flagshift.toml` in the working directory
//! 4. The user config file (`--config`, or the platform config directory)
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "flagshift.toml";

const ENV_PREFIX: &str = "FLAGSHIFT";
const ENV_SEPARATOR: &str = "__";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where flags are persisted.
    pub store: StoreConfig,
    /// Defaults for command arguments.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<environment>.json` per environment.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Environment used when `--env` is omitted.
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                data_dir: Self::default_data_dir(),
            },
            defaults: Defaults {
                environment: "production".into(),
            },
            output: OutputConfig {
                no_color: false,
                format: "human".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration by layering file and environment sources over the
    /// built-in defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; it must
    /// exist. Without it the platform config file is read when present.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let user_file = match config_file {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::from(Self::config_path()).required(false),
        };

        let settings = config::Config::builder()
            .set_default(
                "store.data_dir",
                defaults.store.data_dir.display().to_string(),
            )?
            .set_default("defaults.environment", defaults.defaults.environment)?
            .set_default("output.no_color", defaults.output.no_color)?
            .set_default("output.format", defaults.output.format)?
            .add_source(user_file)
            .add_source(
                config::File::new(LOCAL_CONFIG_FILE, config::FileFormat::Toml).required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let config: Self = settings
            .try_deserialize()
            .context("Configuration has invalid values")?;

        tracing::debug!(
            data_dir = %config.store.data_dir.display(),
            environment = %config.defaults.environment,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `flagshift.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "flagshift", "flagshift")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Default flag store location.
    pub fn default_data_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "flagshift", "flagshift")
            .map(|d| d.data_dir().join("flags"))
            .unwrap_or_else(|| PathBuf::from(".flagshift"))
    }

    /// Environment to use when the command line names none.
    pub fn environment<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit.unwrap_or(&self.defaults.environment)
    }

    pub fn data_dir(&self) -> &Path {
        &self.store.data_dir
    }

    /// Look up a dotted key such as `store.data_dir`.
    pub fn get(&self, key: &str) -> CliResult<String> {
        let tree = serde_json::to_value(self).map_err(|e| CliError::ConfigError {
            message: format!("Failed to serialise config: {e}"),
            source: Some(Box::new(e)),
        })?;

        let value = key
            .split('.')
            .try_fold(&tree, |node, segment| node.get(segment))
            .filter(|v| !v.is_object())
            .ok_or_else(|| CliError::ConfigError {
                message: format!("Unknown config key: '{key}'"),
                source: None,
            })?;

        Ok(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// TOML rendering used by `config list` and `init`.
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::ConfigError {
            message: format!("Failed to serialise config: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
