//! File-backed flag store: one JSON document per environment.
//!
//! ```text
//! <data_dir>/
//! ├── production.json
//! └── staging.json
//! ```
//!
//! Each document holds the environment name, the time of the last write and
//! the flags keyed by flag key. Writes go to a temporary file in the same
//! directory and are renamed over the target, so a reader never observes a
//! half-written document.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;
use walkdir::WalkDir;

use flagshift_core::{
    application::{ApplicationError, ports::FlagStore},
    domain::{DomainError, DomainValidator as validator, FlagKey, FlagVariant},
    error::{FlagshiftError, FlagshiftResult},
};

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentDocument {
    environment: String,
    updated_at: DateTime<Utc>,
    flags: BTreeMap<FlagKey, FlagVariant>,
}

/// Flag store persisting each environment as `<dir>/<environment>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirFlagStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Arc<RwLock<()>>,
}

impl JsonDirFlagStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> FlagshiftResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| map_io_error(&root, e, "create directory"))?;
        debug!(root = %root.display(), "Opened JSON flag store");
        Ok(Self {
            root,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, environment: &str) -> FlagshiftResult<PathBuf> {
        validator::validate_environment(environment)?;
        Ok(self.root.join(format!("{environment}.{EXTENSION}")))
    }

    fn load(&self, environment: &str) -> FlagshiftResult<BTreeMap<FlagKey, FlagVariant>> {
        let path = self.path_for(environment)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(map_io_error(&path, e, "read")),
        };

        let document: EnvironmentDocument =
            serde_json::from_str(&raw).map_err(|e| ApplicationError::Decode {
                what: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if document.environment != environment {
            return Err(ApplicationError::Decode {
                what: path.display().to_string(),
                reason: format!(
                    "document belongs to environment '{}', expected '{environment}'",
                    document.environment
                ),
            }
            .into());
        }
        Ok(document.flags)
    }

    #[instrument(skip(self, flags), fields(flags = flags.len()))]
    fn save(&self, environment: &str, flags: BTreeMap<FlagKey, FlagVariant>) -> FlagshiftResult<()> {
        let path = self.path_for(environment)?;
        if flags.is_empty() {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(map_io_error(&path, e, "remove")),
            };
        }

        let document = EnvironmentDocument {
            environment: environment.to_string(),
            updated_at: Utc::now(),
            flags,
        };
        let json = serde_json::to_string_pretty(&document).map_err(|e| FlagshiftError::Internal {
            message: format!("failed to encode environment '{environment}': {e}"),
        })?;

        let tmp = self
            .root
            .join(format!(".{environment}.{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, json).map_err(|e| map_io_error(&tmp, e, "write"))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(map_io_error(&path, e, "replace"));
        }
        debug!(path = %path.display(), "Environment written");
        Ok(())
    }
}

impl FlagStore for JsonDirFlagStore {
    fn get(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<Option<FlagVariant>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(self.load(environment)?.remove(key))
    }

    fn put(&self, environment: &str, key: &FlagKey, variant: FlagVariant) -> FlagshiftResult<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        let mut flags = self.load(environment)?;
        flags.insert(key.clone(), variant);
        self.save(environment, flags)
    }

    fn delete(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        let mut flags = self.load(environment)?;
        if flags.remove(key).is_none() {
            return Err(DomainError::FlagNotFound {
                environment: environment.to_string(),
                key: key.to_string(),
            }
            .into());
        }
        self.save(environment, flags)
    }

    fn list(&self, environment: &str) -> FlagshiftResult<BTreeMap<FlagKey, FlagVariant>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        self.load(environment)
    }

    fn environments(&self) -> FlagshiftResult<Vec<String>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        let mut environments = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ApplicationError::FilesystemError {
                path: self.root.clone(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    environments.push(stem.to_string());
                }
            }
        }
        environments.sort();
        Ok(environments)
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> FlagshiftError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
