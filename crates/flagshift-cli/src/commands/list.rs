//! `flagshift list`: show the flags stored for an environment.

use tracing::instrument;

use flagshift_core::application::{FlagService, FlagView};

use crate::{
    cli::{ListArgs, ListFormat, OutputFormat},
    commands::open_store,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let environment = config.environment(args.env.env.as_deref());
    let service = FlagService::new(Box::new(open_store(&config)?));
    let flags = service.list(environment)?;

    let format = if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            if flags.is_empty() {
                output.info(&format!("No flags in '{environment}'"))?;
                return Ok(());
            }
            output.header(&format!("Flags in '{environment}':"))?;
            let width = flags
                .iter()
                .map(|f| f.key.as_str().len())
                .max()
                .unwrap_or(0);
            for flag in &flags {
                output.print(&table_row(flag, width))?;
            }
        }

        ListFormat::List => {
            for flag in &flags {
                output.data(flag.key.as_str())?;
            }
        }

        // JSON must stay parseable in pipes, so it bypasses quiet mode.
        ListFormat::Json => {
            let rows: Vec<serde_json::Value> = flags.iter().map(json_row).collect();
            let json = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".into());
            output.data(&json)?;
        }
    }

    Ok(())
}

fn table_row(flag: &FlagView, width: usize) -> String {
    let marker = if flag.is_default_value { " (default)" } else { "" };
    let mut row = format!(
        "  {:<width$}  {:<8} {}{}  default {}",
        flag.key.as_str(),
        flag.kind.as_str(),
        flag.display.effective_value_text,
        marker,
        flag.display.default_text,
    );
    if !flag.display.schema_text.is_empty() {
        row.push_str(&format!("  [{}]", flag.display.schema_text));
    }
    row
}

fn json_row(flag: &FlagView) -> serde_json::Value {
    serde_json::json!({
        "key": flag.key.as_str(),
        "type": flag.kind.as_str(),
        "schema": flag.display.schema_text,
        "default": flag.display.default_text,
        "value": flag.display.effective_value_text,
        "isDefaultValue": flag.is_default_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagshift_core::domain::{
        FlagKey, FlagVariant, IntegerFlag, StoredValue, VariantFormatter,
    };

    fn view(value: Option<i64>) -> FlagView {
        let mut flag = IntegerFlag::new(0, 9, 3);
        if let Some(v) = value {
            flag = flag.with_value(v);
        }
        let variant = FlagVariant::Integer(flag);
        FlagView {
            key: FlagKey::parse("checkout/retries").unwrap(),
            kind: variant.kind(),
            display: VariantFormatter::format_variant(&variant),
            is_default_value: value.is_none(),
            variant,
        }
    }

    #[test]
    fn table_row_marks_defaults() {
        let row = table_row(&view(None), 16);
        assert!(row.contains("checkout/retries"));
        assert!(row.contains("3 (default)  default 3"));
        assert!(row.contains("[0...9]"));
    }

    #[test]
    fn table_row_shows_override_and_default() {
        let row = table_row(&view(Some(7)), 16);
        assert!(row.contains("7  default 3"));
        assert!(!row.contains("(default)"));
    }

    #[test]
    fn json_row_carries_override() {
        let row = json_row(&view(Some(7)));
        assert_eq!(row["value"], "7");
        assert_eq!(row["isDefaultValue"], false);
        assert_eq!(row["type"], "INTEGER");
    }
}
