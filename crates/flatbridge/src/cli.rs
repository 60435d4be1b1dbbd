//! Clap derive structures for the `flatbridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// flatbridge -- read, write and call into a service tree by flat path
#[derive(Debug, Parser)]
#[command(
    name = "flatbridge",
    version,
    about = "Drive a typed service tree through flat, string-addressed paths",
    long_about = "Loads a service tree from a definition file (or a built-in demo\n\
        service) and exposes the flat remote surface a legacy client sees:\n\
        flattened properties, path reads and writes, method calls and\n\
        change notifications.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Tree definition file (.toml or .json); overrides the config file
    #[arg(long, short = 't', env = "FLATBRIDGE_TREE", global = true)]
    pub tree: Option<PathBuf>,

    /// Explicit config file, layered over the platform config
    #[arg(long, short = 'c', env = "FLATBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLATBRIDGE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show every flattened leaf with its type and value
    #[command(alias = "ls")]
    Props,

    /// List the flat paths only
    Paths,

    /// Read the value at a path
    Get(GetArgs),

    /// Write a value at a path and show the notifications it caused
    Set(SetArgs),

    /// Invoke a method by path
    Call(CallArgs),

    /// Service version, name and info mapping
    Info,

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Path Operations ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Access path, e.g. panel.channels[0].gain
    pub path: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Access path, e.g. mode
    pub path: String,

    /// New value as JSON; anything that is not valid JSON is sent as a string
    pub value: String,

    /// How long to wait for notifications after the write, in milliseconds
    #[arg(long, default_value = "250")]
    pub wait_ms: u64,
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Method path, e.g. panel.reset
    pub path: String,

    /// Positional arguments, each parsed like `set` values
    pub args: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the platform config file location
    Path,
    /// Show the effective configuration
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
