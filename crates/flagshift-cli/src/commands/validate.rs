//! `flagshift validate`: check a migration file without touching the store.

use tracing::instrument;

use flagshift_adapters::load_migration_file;
use flagshift_core::domain::DomainValidator;

use crate::{
    cli::{OutputFormat, ValidateArgs},
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(args: ValidateArgs, output: OutputManager) -> CliResult<()> {
    let file = load_migration_file(&args.file)?;
    let validated =
        DomainValidator::validate_migration_file(&file).map_err(|e| CliError::Core(e.into()))?;

    if output.format() == OutputFormat::Json {
        let report = serde_json::json!({
            "valid": true,
            "environment": validated.environment(),
            "version": validated.version().to_string(),
            "flags": validated.flags().len(),
        });
        output.data(&report.to_string())?;
        return Ok(());
    }

    output.success(&format!(
        "{} is valid: {} flag(s) for '{}' at version {}",
        args.file.display(),
        validated.flags().len(),
        validated.environment(),
        validated.version(),
    ))?;
    Ok(())
}
