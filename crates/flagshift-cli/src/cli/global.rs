//! Flags accepted by every flagshift subcommand.
//!
//! Flattened into [`super::Cli`] with `global = true`, so `flagshift plan -v`
//! and `flagshift -v plan` mean the same thing.

use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log verbosity. Without it only errors reach stderr; `RUST_LOG`
    /// overrides the level entirely. Cannot be combined with `--quiet`.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "More log output (-v info, -vv debug, -vvv trace)",
        long_help = "Raise the log level written to stderr:
    -v      plan and apply progress, store paths
    -vv     per-step and per-flag diagnostics
    -vvv    everything, including config layering"
    )]
    pub verbose: u8,

    /// Print only errors and machine-readable payloads (JSON, key lists).
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Only print errors and data"
    )]
    pub quiet: bool,

    /// Plain output. Any non-empty `NO_COLOR` other than `0`/`false` turns
    /// this on, as <https://no-color.org> asks.
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new(),
        help = "Print without ANSI colors"
    )]
    pub no_color: bool,

    /// Read settings from this TOML file instead of the per-user one.
    /// The file must exist.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Use this config file"
    )]
    pub config: Option<PathBuf>,

    /// Also write logs to this file (appended, no colour).
    #[arg(
        long = "log-file",
        global = true,
        value_name = "FILE",
        env = "FLAGSHIFT_LOG_FILE",
        help = "Append logs to a file"
    )]
    pub log_file: Option<PathBuf>,

    /// Rendering of status lines and tables.
    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "human, plain, json, or auto (human on a terminal)"
    )]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `Human` when stdout is a terminal, `Plain` when piped.
    #[default]
    Auto,
    /// Colored status lines and plan tables.
    Human,
    /// Same text as `Human`; what `Auto` picks when stdout is piped.
    Plain,
    /// Plans, flag lists and exports as JSON on stdout.
    Json,
}
