//! `flagshift plan`: diff a migration file against the store.

use owo_colors::OwoColorize;
use tracing::instrument;

use flagshift_adapters::to_pretty_json;
use flagshift_core::{
    application::MigrationService,
    domain::{MigrationStep, MigrationSummary, StepMode, VariantFormatter},
};

use crate::{
    cli::{OutputFormat, PlanArgs, PlanFormat},
    commands::{load_targeted, open_store},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(args: PlanArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let file = load_targeted(&args.file, args.env.env)?;
    let service = MigrationService::new(Box::new(open_store(&config)?));
    let summary = service.plan(&file)?;

    if args.format == PlanFormat::Json || output.format() == OutputFormat::Json {
        output.data(&to_pretty_json(&summary)?)?;
        return Ok(());
    }

    render(&output, &summary)
}

/// Print a plan as an indented step list followed by per-mode totals.
pub(crate) fn render(output: &OutputManager, summary: &MigrationSummary) -> CliResult<()> {
    if summary.is_empty() {
        output.success(&format!(
            "Nothing to do: '{}' already matches version {}",
            summary.environment, summary.version
        ))?;
        return Ok(());
    }

    output.header(&format!(
        "Plan for '{}' (version {}): {} step(s)",
        summary.environment,
        summary.version,
        summary.steps.len()
    ))?;

    for step in &summary.steps {
        let pad = "  ".repeat(usize::from(step.indent.unwrap_or(0)) + 1);
        let line = format!("{pad}{step}");
        if output.supports_color() {
            output.print(&paint(step.mode, &line))?;
        } else {
            output.print(&line)?;
        }
        if let Some(detail) = step_detail(step) {
            output.detail(&format!("{pad}    {detail}"))?;
        }
    }

    let totals: Vec<String> = summary
        .counts()
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(mode, n)| format!("{n} {}", mode_label(*mode)))
        .collect();
    output.print("")?;
    output.info(&totals.join(", "))?;
    Ok(())
}

fn step_detail(step: &MigrationStep) -> Option<String> {
    let flag = step.flag.as_ref()?;
    Some(match step.mode {
        StepMode::CreateDefaultValue | StepMode::UpdateSchemaDefaultValue => {
            let schema = VariantFormatter::schema_text(flag);
            let default = VariantFormatter::default_text(flag);
            if schema.is_empty() {
                format!("{} default {default}", flag.kind())
            } else {
                format!("{} [{schema}] default {default}", flag.kind())
            }
        }
        StepMode::SetValue => {
            format!(
                "value {}",
                VariantFormatter::format_variant(flag).effective_value_text
            )
        }
        StepMode::Delete => return None,
    })
}

fn paint(mode: StepMode, line: &str) -> String {
    match mode {
        StepMode::CreateDefaultValue => line.green().to_string(),
        StepMode::SetValue => line.cyan().to_string(),
        StepMode::UpdateSchemaDefaultValue => line.yellow().to_string(),
        StepMode::Delete => line.red().to_string(),
    }
}

fn mode_label(mode: StepMode) -> &'static str {
    match mode {
        StepMode::CreateDefaultValue => "to create",
        StepMode::SetValue => "to set",
        StepMode::UpdateSchemaDefaultValue => "to update",
        StepMode::Delete => "to delete",
    }
}
