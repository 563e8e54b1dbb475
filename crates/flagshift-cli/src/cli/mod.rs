//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "flagshift",
    bin_name = "flagshift",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{2691} Feature-flag schema and value migrations",
    long_about = "flagshift diffs a declarative migration file against the flags \
                  stored for an environment, shows the ordered plan, and applies it.",
    after_help = "EXAMPLES:\n\
        \x20 flagshift validate flags/production.json\n\
        \x20 flagshift plan flags/production.json\n\
        \x20 flagshift apply flags/production.json --yes\n\
        \x20 flagshift export --env production -o flags/production.json",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a migration file without touching the store.
    #[command(
        about = "Validate a migration file",
        after_help = "EXAMPLES:\n\
            \x20 flagshift validate flags/production.json"
    )]
    Validate(ValidateArgs),

    /// Show the steps a migration file would apply.
    #[command(
        about = "Show the migration plan",
        after_help = "EXAMPLES:\n\
            \x20 flagshift plan flags/production.json\n\
            \x20 flagshift plan flags/staging.json --format json\n\
            \x20 flagshift plan flags/staging.json --env production"
    )]
    Plan(PlanArgs),

    /// Plan and apply a migration file.
    #[command(
        about = "Apply a migration file",
        after_help = "EXAMPLES:\n\
            \x20 flagshift apply flags/production.json\n\
            \x20 flagshift apply flags/production.json --yes\n\
            \x20 flagshift apply flags/production.json --dry-run"
    )]
    Apply(ApplyArgs),

    /// Write the stored flags of an environment as a migration file.
    #[command(
        about = "Export an environment",
        after_help = "EXAMPLES:\n\
            \x20 flagshift export --env production\n\
            \x20 flagshift export --env staging --version 2.1.0 -o flags/staging.json"
    )]
    Export(ExportArgs),

    /// List stored flags.
    #[command(
        visible_alias = "ls",
        about = "List flags of an environment",
        after_help = "EXAMPLES:\n\
            \x20 flagshift list\n\
            \x20 flagshift list --env production --format json"
    )]
    List(ListArgs),

    /// Show one flag.
    #[command(
        about = "Show one flag",
        after_help = "EXAMPLES:\n\
            \x20 flagshift show checkout/new-flow\n\
            \x20 flagshift show exp/pricing --subject user-42"
    )]
    Show(ShowArgs),

    /// Set or clear the override value of a flag.
    #[command(
        about = "Set a flag value",
        after_help = "EXAMPLES:\n\
            \x20 flagshift set checkout/retries 3\n\
            \x20 flagshift set ui/badges new,sale\n\
            \x20 flagshift set checkout/retries --unset"
    )]
    Set(SetArgs),

    /// Initialise a flagshift configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 flagshift init           # default location\n\
            \x20 flagshift init --local   # ./flagshift.toml"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 flagshift completions bash > ~/.local/share/bash-completion/completions/flagshift\n\
            \x20 flagshift completions zsh  > ~/.zfunc/_flagshift\n\
            \x20 flagshift completions fish > ~/.config/fish/completions/flagshift.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the flagshift configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 flagshift config get store.data_dir\n\
            \x20 flagshift config list\n\
            \x20 flagshift config path"
    )]
    Config(ConfigCommands),
}

// ── shared ────────────────────────────────────────────────────────────────────

/// Environment selection shared by store-reading commands.
#[derive(Debug, Args)]
pub struct EnvArgs {
    /// Environment to operate on. Store commands default to
    /// `defaults.environment`; `plan` and `apply` default to the file's own.
    #[arg(
        short = 'e',
        long = "env",
        value_name = "ENV",
        help = "Environment (default from config)"
    )]
    pub env: Option<String>,
}

// ── validate ──────────────────────────────────────────────────────────────────

/// Arguments for `flagshift validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Migration file to check.
    #[arg(value_name = "FILE", help = "Migration file (JSON)")]
    pub file: PathBuf,
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Migration file to diff against the store.
    #[arg(value_name = "FILE", help = "Migration file (JSON)")]
    pub file: PathBuf,

    /// Plan against another environment than the one the file names.
    #[command(flatten)]
    pub env: EnvArgs,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: PlanFormat,
}

/// Output format for the `plan` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Indented step list.
    Table,
    /// MigrationSummary JSON.
    Json,
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Migration file to apply.
    #[arg(value_name = "FILE", help = "Migration file (JSON)")]
    pub file: PathBuf,

    /// Apply to another environment than the one the file names.
    #[command(flatten)]
    pub env: EnvArgs,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Apply without asking for confirmation")]
    pub yes: bool,

    /// Print the plan and stop.
    #[arg(long = "dry-run", help = "Show what would change without changing it")]
    pub dry_run: bool,
}

// ── export ────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Version to stamp on the exported file.
    #[arg(
        long = "version",
        value_name = "X.Y.Z",
        default_value = "1.0.0",
        help = "Version written into the file"
    )]
    pub version: String,

    /// Write to a file instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE", help = "Output file")]
    pub output: Option<PathBuf>,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One key per line.
    List,
    /// JSON array.
    Json,
}

// ── show ──────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift show`.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Flag key, e.g. `checkout/new-flow`.
    #[arg(value_name = "KEY", help = "Flag key")]
    pub key: String,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Resolve AB-TEST flags deterministically for this subject.
    #[arg(
        long = "subject",
        value_name = "ID",
        help = "Sticky AB-TEST bucketing for a user or session id"
    )]
    pub subject: Option<String>,
}

// ── set ───────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift set`.
#[derive(Debug, Args)]
pub struct SetArgs {
    /// Flag key.
    #[arg(value_name = "KEY", help = "Flag key")]
    pub key: String,

    /// New value. TAG flags take a comma-separated list.
    #[arg(
        value_name = "VALUE",
        required_unless_present = "unset",
        conflicts_with = "unset",
        help = "New override value"
    )]
    pub value: Option<String>,

    /// Remove the override so the default applies.
    #[arg(long = "unset", help = "Clear the override value")]
    pub unset: bool,

    #[command(flatten)]
    pub env: EnvArgs,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `flagshift init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `flagshift.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `flagshift completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `flagshift config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `store.data_dir`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
