//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "boilerplate",
    bin_name = "boilerplate",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Declarative file scaffolding",
    long_about = "Boilerplate expands a nested definition of targets and scaffolds \
                  and copies the matched files through a pipeline of transforms.",
    after_help = "EXAMPLES:\n\
        \x20 boilerplate run site.toml\n\
        \x20 boilerplate run site.yaml --stream --set pipeline='[\"eol\",\"trim\"]'\n\
        \x20 boilerplate plan site.toml --format json > site.plan.json\n\
        \x20 boilerplate run --plan site.plan.json --dry-run\n\
        \x20 boilerplate completions bash > /usr/share/bash-completion/completions/boilerplate",
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
    /// Expand a definition and write its files.
    #[command(
        visible_alias = "r",
        about = "Expand a definition and write its files",
        after_help = "EXAMPLES:\n\
            \x20 boilerplate run site.toml\n\
            \x20 boilerplate run site.toml --stream --cwd templates\n\
            \x20 boilerplate run site.toml --set banner='// generated' --dest-base build\n\
            \x20 boilerplate run --plan site.plan.json"
    )]
    Run(RunArgs),

    /// Expand a definition and print the resulting tree.
    #[command(
        about = "Show the expanded tree without writing",
        after_help = "EXAMPLES:\n\
            \x20 boilerplate plan site.toml\n\
            \x20 boilerplate plan site.toml --format json > site.plan.json"
    )]
    Plan(PlanArgs),

    /// List registered plugins.
    #[command(
        visible_alias = "ls",
        about = "List registered plugins",
        after_help = "EXAMPLES:\n\
            \x20 boilerplate plugins\n\
            \x20 boilerplate --output-format json plugins"
    )]
    Plugins,

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 boilerplate completions bash > ~/.local/share/bash-completion/completions/boilerplate\n\
            \x20 boilerplate completions zsh  > ~/.zfunc/_boilerplate\n\
            \x20 boilerplate completions fish > ~/.config/fish/completions/boilerplate.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Boilerplate configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 boilerplate config get defaults.mode\n\
            \x20 boilerplate config list\n\
            \x20 boilerplate config path"
    )]
    Config(ConfigCommands),
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Arguments for `boilerplate run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Definition file (`.toml`, `.json`, `.yaml`), or a saved plan with `--plan`.
    #[arg(value_name = "FILE", help = "Definition file to run")]
    pub file: PathBuf,

    /// Treat FILE as a plan saved by `boilerplate plan --format json`.
    #[arg(long = "plan", help = "FILE is a saved JSON plan")]
    pub plan: bool,

    /// Run every target concurrently.
    #[arg(
        short = 's',
        long = "stream",
        conflicts_with = "series",
        help = "Run targets concurrently as one merged stream"
    )]
    pub stream: bool,

    /// Run targets one at a time, stopping at the first error.
    #[arg(long = "series", help = "Run targets one at a time (fail fast)")]
    pub series: bool,

    /// Option overrides applied to every target.
    ///
    /// VALUE is parsed as JSON when possible, otherwise taken as a string.
    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_override,
        help = "Override an option on every target"
    )]
    pub overrides: Vec<(String, Value)>,

    /// Directory that relative paths resolve against.
    #[arg(
        short = 'C',
        long = "cwd",
        value_name = "DIR",
        help = "Resolve relative paths against DIR"
    )]
    pub cwd: Option<PathBuf>,

    /// Prefix every destination with DIR.
    #[arg(
        long = "dest-base",
        value_name = "DIR",
        help = "Prefix every destination with DIR"
    )]
    pub dest_base: Option<PathBuf>,

    /// Preview what would be written without writing any files.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Skip confirmation and write immediately")]
    pub yes: bool,
}

/// Parse `key=value`; the value is JSON if it parses, a string otherwise.
pub fn parse_override(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `boilerplate plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Definition file (`.toml`, `.json`, `.yaml`).
    #[arg(value_name = "FILE", help = "Definition file to expand")]
    pub file: PathBuf,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "tree",
        help = "Output format"
    )]
    pub format: PlanFormat,
}

/// Output format for the `plan` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Indented tree of scaffolds and targets.
    Tree,
    /// The expanded tree as JSON, runnable with `run --plan`.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `boilerplate completions`.
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

/// Subcommands for `boilerplate config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.mode`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the default configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn parse_run_command() {
        let cli = Cli::parse_from(["boilerplate", "run", "site.toml", "--stream", "-y"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.file, PathBuf::from("site.toml"));
                assert!(args.stream);
                assert!(args.yes);
                assert!(!args.plan);
            }
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn set_values_parse_as_json_or_string() {
        let cli = Cli::parse_from([
            "boilerplate",
            "run",
            "site.toml",
            "--set",
            "flatten=true",
            "--set",
            "banner=// generated",
            "--set",
            "pipeline=[\"eol\"]",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected Run command");
        };
        assert_eq!(
            args.overrides,
            vec![
                ("flatten".to_string(), json!(true)),
                ("banner".to_string(), json!("// generated")),
                ("pipeline".to_string(), json!(["eol"])),
            ]
        );
    }

    #[test]
    fn override_needs_a_key() {
        assert!(parse_override("=1").is_err());
        assert!(parse_override("novalue").is_err());
        assert_eq!(parse_override("ext=").unwrap(), ("ext".into(), json!("")));
    }

    #[test]
    fn stream_and_series_conflict() {
        let result = Cli::try_parse_from(["boilerplate", "run", "a.toml", "--stream", "--series"]);
        assert!(result.is_err());
    }

    #[test]
    fn plan_format_defaults_to_tree() {
        let cli = Cli::parse_from(["boilerplate", "plan", "site.toml"]);
        let Commands::Plan(args) = cli.command else {
            panic!("expected Plan command");
        };
        assert_eq!(args.format, PlanFormat::Tree);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        // clap should reject --quiet --verbose together
        let result = Cli::try_parse_from(["boilerplate", "--quiet", "--verbose", "plugins"]);
        assert!(result.is_err());
    }
}
