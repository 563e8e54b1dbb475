//! `flagshift set`: change or clear the override value of one flag.

use tracing::instrument;

use flagshift_core::{application::FlagService, domain::VariantFormatter};

use crate::{
    cli::SetArgs,
    commands::{open_store, parse_key},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(key = %args.key, unset = args.unset))]
pub fn execute(args: SetArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let environment = config.environment(args.env.env.as_deref());
    let key = parse_key(&args.key)?;
    let service = FlagService::new(Box::new(open_store(&config)?));

    let updated = match (args.unset, args.value.as_deref()) {
        (true, _) => service.unset_value(environment, &key)?,
        (false, Some(raw)) => service.set_value(environment, &key, raw)?,
        (false, None) => {
            return Err(CliError::InvalidInput {
                message: "a VALUE or --unset is required".into(),
                source: None,
            });
        }
    };

    let display = VariantFormatter::format_variant(&updated);
    if args.unset {
        output.success(&format!(
            "{key} reset to default {} in '{environment}'",
            display.default_text
        ))?;
    } else {
        output.success(&format!(
            "{key} = {} in '{environment}'",
            display.effective_value_text
        ))?;
    }
    Ok(())
}
