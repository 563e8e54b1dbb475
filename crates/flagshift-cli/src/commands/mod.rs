//! Command handlers, one module per subcommand.
//!
//! Handlers translate parsed arguments into service calls and render the
//! result through [`OutputManager`](crate::output::OutputManager). They
//! hold no flag logic of their own.

pub mod apply;
pub mod completions;
pub mod config;
pub mod export;
pub mod init;
pub mod list;
pub mod plan;
pub mod set;
pub mod show;
pub mod validate;

use std::path::Path;

use flagshift_adapters::{JsonDirFlagStore, load_migration_file};
use flagshift_core::domain::{FlagKey, MigrationFile};

use crate::{
    config::AppConfig,
    error::{CliError, CliResult},
};

/// Open the file-backed store configured under `store.data_dir`.
pub(crate) fn open_store(config: &AppConfig) -> CliResult<JsonDirFlagStore> {
    Ok(JsonDirFlagStore::open(config.data_dir())?)
}

/// Parse a flag key typed on the command line.
pub(crate) fn parse_key(raw: &str) -> CliResult<FlagKey> {
    FlagKey::parse(raw).map_err(|e| CliError::Core(e.into()))
}

/// Load a migration file, retargeting it when `--env` was given.
pub(crate) fn load_targeted(path: &Path, environment: Option<String>) -> CliResult<MigrationFile> {
    let mut file = load_migration_file(path)?;
    if let Some(environment) = environment {
        tracing::info!(from = %file.environment, to = %environment, "Retargeting migration file");
        file.environment = environment;
    }
    Ok(file)
}
