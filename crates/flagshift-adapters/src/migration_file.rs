//! Reading and writing migration files and plans as JSON.
//!
//! Decoding only checks shape. Keys, versions and variant constraints are
//! checked by `DomainValidator::validate_migration_file` afterwards.

use std::{fs, path::Path};

use serde::Serialize;
use tracing::{debug, instrument};

use flagshift_core::{
    application::ApplicationError,
    domain::MigrationFile,
    error::{FlagshiftError, FlagshiftResult},
};

/// Decode a migration file from JSON text.
pub fn parse_migration_file(raw: &str, origin: &str) -> FlagshiftResult<MigrationFile> {
    serde_json::from_str(raw).map_err(|e| {
        ApplicationError::Decode {
            what: origin.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Read and decode a migration file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_migration_file(path: &Path) -> FlagshiftResult<MigrationFile> {
    let raw = fs::read_to_string(path).map_err(|e| ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to read: {e}"),
    })?;
    let file = parse_migration_file(&raw, &path.display().to_string())?;
    debug!(
        environment = %file.environment,
        flags = file.flags.len(),
        "Migration file loaded"
    );
    Ok(file)
}

/// Pretty JSON for any serializable document (migration file or plan).
pub fn to_pretty_json<T: Serialize>(document: &T) -> FlagshiftResult<String> {
    serde_json::to_string_pretty(document).map_err(|e| FlagshiftError::Internal {
        message: format!("failed to encode JSON: {e}"),
    })
}

/// Write a document as pretty JSON, creating parent directories.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_json<T: Serialize>(path: &Path, document: &T) -> FlagshiftResult<()> {
    let json = to_pretty_json(document)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ApplicationError::FilesystemError {
            path: parent.to_path_buf(),
            reason: format!("Failed to create directory: {e}"),
        })?;
    }
    fs::write(path, json + "\n").map_err(|e| ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to write: {e}"),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flagshift_core::domain::{AbTestFlag, FlagVariant};
    use tempfile::TempDir;

    #[test]
    fn written_file_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/migration.json");
        let file = MigrationFile::new("production", "1.0.0", Utc::now())
            .with_flag("exp/checkout", FlagVariant::AbTest(AbTestFlag::new(25.0)));

        write_json(&path, &file).unwrap();
        let loaded = load_migration_file(&path).unwrap();

        assert_eq!(loaded, file);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"AB-TEST\""));
        assert!(raw.contains("\"chanceBPercent\": 25.0"));
    }

    #[test]
    fn malformed_json_names_the_origin() {
        let err = parse_migration_file("{\"environment\": 3}", "inline.json").unwrap_err();
        assert!(err.to_string().contains("inline.json"));
    }

    #[test]
    fn missing_file_is_a_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let err = load_migration_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            FlagshiftError::Application(ApplicationError::FilesystemError { .. })
        ));
    }
}
