//! # boilerplate
//!
//! Expands a boilerplate definition (TOML, JSON or YAML) into scaffolds and
//! targets, then copies every matched source through its plugin pipeline.
//!
//! ```text
//! boilerplate plan site.toml             # show the expanded tree
//! boilerplate run site.toml --stream     # run every target concurrently
//! boilerplate run --plan site.plan.json  # run a saved plan
//! ```
//!
//! Settings come from the app config file, `BOILERPLATE_*` variables and a
//! `.env` file in the working directory. The exit code is chosen by
//! [`CliError::exit_code`] from the error's category.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // `--help` and `--version` also land here, on stdout.
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Held until exit so the file log is flushed.
    let _log_guard = match init_logging(&cli.global) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("boilerplate: cannot set up logging: {e:#}");
            return ExitCode::from(1);
        }
    };
    debug!(command = ?cli.command, "Parsed arguments");

    let verbose = cli.global.verbose > 0;
    let config = match AppConfig::load(cli.global.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: Some(e.into()),
            };
            return report(err, verbose, !cli.global.no_color);
        }
    };

    let output = OutputManager::new(&cli.global, &config);
    let colored = output.supports_color();

    match dispatch(cli, config, output) {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => report(e, verbose, colored),
    }
}

#[instrument(skip_all)]
fn dispatch(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cli.command {
        Commands::Run(cmd) => commands::run::execute(cmd, cli.global, config, output),
        Commands::Plan(cmd) => commands::plan::execute(cmd, output),
        Commands::Plugins => commands::plugins::execute(config, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, config, output),
    }
}

/// Log the failure, print it with its suggestions on stderr and pick the
/// exit code.
fn report(err: CliError, verbose: bool, colored: bool) -> ExitCode {
    err.log();

    let msg = if colored && std::io::stderr().is_terminal() {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{msg}");

    ExitCode::from(err.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_comes_from_the_manifest() {
        assert_eq!(Cli::command().get_version(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn global_flags_come_before_the_subcommand() {
        let cli = Cli::parse_from(["boilerplate", "-q", "plan", "site.toml"]);
        assert!(cli.global.quiet);
        assert!(matches!(cli.command, Commands::Plan(ref args) if args.file.as_os_str() == "site.toml"));
    }
}
