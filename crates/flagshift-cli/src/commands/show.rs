//! `flagshift show`: describe one flag.

use tracing::instrument;

use flagshift_core::{application::FlagService, domain::Bucketing};

use crate::{
    cli::{OutputFormat, ShowArgs},
    commands::{open_store, parse_key},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(key = %args.key))]
pub fn execute(args: ShowArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let environment = config.environment(args.env.env.as_deref());
    let key = parse_key(&args.key)?;
    let bucketing = match args.subject.as_deref() {
        Some(subject) => Bucketing::Sticky { subject },
        None => Bucketing::Random,
    };

    let service = FlagService::new(Box::new(open_store(&config)?));
    let view = service.describe(environment, &key, bucketing)?;

    if output.format() == OutputFormat::Json {
        let json = serde_json::json!({
            "key": view.key.as_str(),
            "environment": environment,
            "schema": view.display.schema_text,
            "default": view.display.default_text,
            "value": view.display.effective_value_text,
            "isDefaultValue": view.is_default_value,
            "flag": view.variant,
        });
        output.data(&json.to_string())?;
        return Ok(());
    }

    output.header(&format!("{} ({})", view.key, environment))?;
    output.print(&format!("  type     {}", view.kind))?;
    if !view.display.schema_text.is_empty() {
        output.print(&format!("  schema   {}", view.display.schema_text))?;
    }
    output.print(&format!("  default  {}", view.display.default_text))?;
    let source = if view.is_default_value {
        "default"
    } else {
        "override"
    };
    output.print(&format!(
        "  value    {} ({source})",
        view.display.effective_value_text
    ))?;
    Ok(())
}
