//! `flagshift export`: dump an environment as a migration file.

use chrono::Utc;
use tracing::instrument;

use flagshift_adapters::{to_pretty_json, write_json};
use flagshift_core::{application::MigrationService, domain::SemVer};

use crate::{
    cli::ExportArgs,
    commands::open_store,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(args: ExportArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let environment = config.environment(args.env.env.as_deref());
    let version: SemVer = args
        .version
        .parse()
        .map_err(|e: flagshift_core::domain::DomainError| CliError::Core(e.into()))?;

    let service = MigrationService::new(Box::new(open_store(&config)?));
    let file = service.export(environment, version, Utc::now())?;

    if file.flags.is_empty() {
        output.warning(&format!("Environment '{environment}' has no flags"))?;
    }

    match args.output {
        Some(path) => {
            write_json(&path, &file)?;
            output.success(&format!(
                "Exported {} flag(s) from '{}' to {}",
                file.flags.len(),
                environment,
                path.display()
            ))?;
        }
        None => output.data(&to_pretty_json(&file)?)?,
    }
    Ok(())
}
