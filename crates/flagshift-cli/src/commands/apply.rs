//! `flagshift apply`: plan a migration file and apply it step by step.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument};

use flagshift_core::{
    application::{ApplicationError, MigrationService},
    domain::MigrationSummary,
    error::FlagshiftError,
};

use crate::{
    cli::ApplyArgs,
    commands::{load_targeted, open_store, plan},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(file = %args.file.display(), dry_run = args.dry_run))]
pub fn execute(args: ApplyArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let file = load_targeted(&args.file, args.env.env)?;
    let service = MigrationService::new(Box::new(open_store(&config)?));
    let summary = service.plan(&file)?;

    plan::render(&output, &summary)?;
    if summary.is_empty() {
        return Ok(());
    }

    if args.dry_run {
        output.info("Dry run: no changes were made")?;
        return Ok(());
    }

    if !args.yes {
        confirm(&summary)?;
    }

    let progress = progress_bar(&output, summary.steps.len());
    let result = service.apply_with(&summary, |step| {
        progress.set_message(step.to_string());
        progress.inc(1);
    });

    match result {
        Ok(report) => {
            progress.finish_and_clear();
            info!(run_id = %report.run_id, applied = report.applied.len(), "Apply finished");
            output.success(&format!(
                "Applied {} step(s) to '{}'",
                report.applied.len(),
                report.environment
            ))?;
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            if let FlagshiftError::Application(ApplicationError::StepFailed { applied, .. }) = &e {
                output.error(&format!(
                    "Stopped after {applied} of {} step(s); applied steps were kept",
                    summary.steps.len()
                ))?;
            }
            Err(e.into())
        }
    }
}

fn progress_bar(output: &OutputManager, steps: usize) -> ProgressBar {
    if output.is_quiet() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(steps as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

#[cfg(feature = "interactive")]
fn confirm(summary: &MigrationSummary) -> CliResult<()> {
    use std::io::IsTerminal as _;

    if !std::io::stdin().is_terminal() {
        return Err(CliError::InvalidInput {
            message: "refusing to apply without --yes in a non-interactive session".into(),
            source: None,
        });
    }

    let proceed = dialoguer::Confirm::new()
        .with_prompt(format!(
            "Apply {} step(s) to '{}'?",
            summary.steps.len(),
            summary.environment
        ))
        .default(false)
        .interact()
        .map_err(|e| CliError::InvalidInput {
            message: "confirmation prompt failed".into(),
            source: Some(Box::new(e)),
        })?;

    if proceed {
        Ok(())
    } else {
        Err(CliError::Cancelled)
    }
}

#[cfg(not(feature = "interactive"))]
fn confirm(_summary: &MigrationSummary) -> CliResult<()> {
    Err(CliError::FeatureNotAvailable {
        feature: "interactive",
    })
}
