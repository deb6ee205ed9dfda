//! Flags accepted before or after any subcommand.

use std::path::PathBuf;

use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more: -v run progress, -vv every target and file, -vvv everything
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print only errors and the command's own result (plan trees, JSON)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Plain, uncoloured output (also set by NO_COLOR)
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// App config file to use instead of the per-user one
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also append JSON log records to FILE
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// How results are printed; `auto` picks human on a terminal, plain otherwise
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output_format: OutputFormat,
}

/// Rendering of command results. Also settable as `output.format`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Auto,
    /// Coloured, with progress spinner
    Human,
    Plain,
    /// Run reports and plans as JSON on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Human => "human",
            Self::Plain => "plain",
            Self::Json => "json",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        global: GlobalArgs,
    }

    #[test]
    fn verbosity_counts_repeats() {
        let parsed = Harness::parse_from(["boilerplate", "-vv"]);
        assert_eq!(parsed.global.verbose, 2);
        assert_eq!(parsed.global.output_format, OutputFormat::Auto);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Harness::try_parse_from(["boilerplate", "-q", "-v"]).is_err());
    }

    #[test]
    fn output_format_reads_lowercase_names() {
        let parsed = Harness::parse_from(["boilerplate", "--output-format", "json"]);
        assert_eq!(parsed.global.output_format, OutputFormat::Json);
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
    }
}
