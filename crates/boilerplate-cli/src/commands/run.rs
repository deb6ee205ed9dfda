//! Implementation of the `boilerplate run` command.
//!
//! Responsibility: load a definition (or a saved plan), wire the adapters
//! into the engine, run it in the selected mode and display the results.
//! No business logic lives here.

use std::io::IsTerminal as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use indicatif::ProgressBar;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use boilerplate_adapters::{ConfigLoader, DryRunFileAccess, InMemoryRegistry, LocalFileAccess};
use boilerplate_core::{
    application::{BoilerplateService, StreamEvent, ports::FileAccess},
    domain::{ConfigTree, OptionMap, OutputFile},
};

use crate::{
    cli::{OutputFormat, RunArgs, global::GlobalArgs},
    config::{AppConfig, RunMode},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Machine-readable result of a run.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    run_id: Uuid,
    tree: &'a str,
    mode: RunMode,
    dry_run: bool,
    started_at: DateTime<Utc>,
    targets: usize,
    files: &'a [OutputFile],
}

/// Execute the `boilerplate run` command.
///
/// Dispatch sequence:
/// 1. Load and expand the definition (or load a saved plan)
/// 2. Build the overrides every target receives
/// 3. Confirm with the user unless `--yes`, `--quiet`, `--dry-run` or piped
/// 4. Run in series or stream mode
/// 5. Report the written files
#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn execute(
    args: RunArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    // 1. Load
    let tree = if args.plan {
        load_plan(&args.file)?
    } else {
        super::expand_definition(&args.file)?
    };

    // 2. Overrides and adapters
    let mode = select_mode(&args, &config);
    let overrides = build_overrides(&args, &config);
    let root = args.cwd.clone().or_else(|| config.defaults.cwd.clone());
    if let Some(dir) = root.as_deref().filter(|dir| !dir.is_dir()) {
        return Err(CliError::InvalidInput {
            message: format!("working directory '{}' does not exist", dir.display()),
            source: None,
        });
    }

    debug!(
        tree = %tree.name(),
        targets = tree.target_count(),
        %mode,
        overrides = overrides.len(),
        "Definition loaded"
    );

    let local: Arc<dyn FileAccess> = match &root {
        Some(dir) => Arc::new(LocalFileAccess::with_root(dir)),
        None => Arc::new(LocalFileAccess::new()),
    };
    let files: Arc<dyn FileAccess> = if args.dry_run {
        Arc::new(DryRunFileAccess::new(local))
    } else {
        local
    };
    let registry =
        InMemoryRegistry::with_builtin().with_cli_context(|| "registering built-in plugins")?;
    let service = BoilerplateService::new(files, Arc::new(registry));

    // 3. Confirm
    if !args.dry_run && !args.yes && !global.quiet && std::io::stdin().is_terminal() {
        show_plan(&tree, mode, root.as_deref(), &output)?;
        if !confirm()? {
            return Err(CliError::Cancelled);
        }
    }

    // 4. Run
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_cli_context(|| "failed to start the async runtime")?;

    let started_at = Utc::now();
    let spinner = output.spinner(&format!("Running '{}' ({mode})", tree.name()));
    let outcome = match mode {
        RunMode::Series => runtime
            .block_on(service.run_series(&tree, &overrides))
            .map(|summary| (summary.run_id, summary.files))
            .map_err(CliError::Core),
        RunMode::Stream => runtime.block_on(drain_stream(
            &service, &tree, &overrides, &spinner, &output,
        )),
    };
    spinner.finish_and_clear();
    let (run_id, written) = outcome?;

    info!(%run_id, files = written.len(), "Run completed");

    // 5. Report
    let report = RunReport {
        run_id,
        tree: tree.name(),
        mode,
        dry_run: args.dry_run,
        started_at,
        targets: tree.target_count(),
        files: &written,
    };
    print_report(&report, &output)
}

fn load_plan(path: &Path) -> CliResult<ConfigTree> {
    if !path.is_file() {
        return Err(CliError::DefinitionNotFound {
            path: path.to_path_buf(),
        });
    }
    ConfigLoader::load_plan(path).with_cli_context(|| format!("loading plan {}", path.display()))
}

/// `--stream` / `--series` win over `defaults.mode`.
fn select_mode(args: &RunArgs, config: &AppConfig) -> RunMode {
    if args.stream {
        RunMode::Stream
    } else if args.series {
        RunMode::Series
    } else {
        config.defaults.mode
    }
}

/// Options merged over every target's effective options.
///
/// `plugins.disabled` from the app config becomes the `disable` option;
/// `--dest-base` becomes `destBase`; `--set` pairs are applied last.
fn build_overrides(args: &RunArgs, config: &AppConfig) -> OptionMap {
    let mut overrides = OptionMap::new();
    if !config.plugins.disabled.is_empty() {
        overrides.insert("disable".into(), Value::from(config.plugins.disabled.clone()));
    }
    if let Some(base) = &args.dest_base {
        overrides.insert(
            "destBase".into(),
            Value::String(base.to_string_lossy().into_owned()),
        );
    }
    for (key, value) in &args.overrides {
        overrides.insert(key.clone(), value.clone());
    }
    overrides
}

/// Consume a stream run, cancelling it on Ctrl-C.
async fn drain_stream(
    service: &BoilerplateService,
    tree: &ConfigTree,
    overrides: &OptionMap,
    spinner: &ProgressBar,
    output: &OutputManager,
) -> CliResult<(Uuid, Vec<OutputFile>)> {
    let interrupt = CancellationToken::new();
    let watcher = interrupt.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the run");
            watcher.cancel();
        }
    });

    let mut stream = service.run_stream_with_cancel(tree, overrides, interrupt.clone());
    let run_id = stream.run_id();
    let mut written = Vec::new();
    let mut failures = Vec::new();

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Data(file) => {
                spinner.set_message(file.dest.display().to_string());
                written.push(file);
            }
            StreamEvent::Error(e) => failures.push(e),
            StreamEvent::End => break,
        }
    }
    ctrl_c.abort();

    if interrupt.is_cancelled() {
        return Err(CliError::Cancelled);
    }

    let count = failures.len();
    let mut failures = failures.into_iter();
    match failures.next() {
        None => Ok((run_id, written)),
        Some(first) if count == 1 => Err(CliError::Core(first)),
        Some(first) => {
            for other in failures {
                output.error(&other.to_string())?;
            }
            Err(CliError::ManyFailed { count, first })
        }
    }
}

fn print_report(report: &RunReport<'_>, output: &OutputManager) -> CliResult<()> {
    if output.format() == OutputFormat::Json {
        output.json(report)?;
        return Ok(());
    }

    let verb = if report.dry_run { "Would write" } else { "Wrote" };
    for file in report.files {
        output.print(&format!(
            "  {}  <- {} ({})",
            file.dest.display(),
            file.source.display(),
            file.node
        ))?;
    }

    let summary = format!(
        "{verb} {} file(s) from {} target(s) in {} mode",
        report.files.len(),
        report.targets,
        report.mode
    );
    if report.dry_run {
        output.info(&format!("Dry run: {summary}"))?;
    } else if report.files.is_empty() {
        output.warning(&format!("{summary}: no sources matched"))?;
    } else {
        output.success(&summary)?;
    }
    Ok(())
}

fn show_plan(
    tree: &ConfigTree,
    mode: RunMode,
    root: Option<&Path>,
    output: &OutputManager,
) -> CliResult<()> {
    output.header(&format!(
        "About to run '{}' ({} targets, {mode} mode)",
        tree.name(),
        tree.target_count()
    ))?;
    if let Some(root) = root {
        output.info(&format!("Paths resolve against {}", root.display()))?;
    }
    output.print(&super::plan::render_tree(tree))?;
    Ok(())
}

fn confirm() -> CliResult<bool> {
    use std::io::{self, Write};

    print!("Continue? [Y/n] ");
    io::stdout()
        .flush()
        .with_cli_context(|| "failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .with_cli_context(|| "failed to read confirmation input")?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use serde_json::json;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["boilerplate", "run", "site.toml"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn flags_win_over_configured_mode() {
        let mut config = AppConfig::default();
        config.defaults.mode = RunMode::Stream;

        assert_eq!(select_mode(&run_args(&[]), &config), RunMode::Stream);
        assert_eq!(select_mode(&run_args(&["--series"]), &config), RunMode::Series);
        assert_eq!(
            select_mode(&run_args(&["--stream"]), &AppConfig::default()),
            RunMode::Stream
        );
    }

    #[test]
    fn disabled_plugins_become_the_disable_option() {
        let mut config = AppConfig::default();
        config.plugins.disabled = vec!["trim".into()];

        let overrides = build_overrides(&run_args(&["--dest-base", "build"]), &config);
        assert_eq!(overrides["disable"], json!(["trim"]));
        assert_eq!(overrides["destBase"], json!("build"));
    }

    #[test]
    fn set_pairs_are_applied_last() {
        let mut config = AppConfig::default();
        config.plugins.disabled = vec!["trim".into()];

        let overrides = build_overrides(
            &run_args(&["--set", "disable=[]", "--set", "flatten=true"]),
            &config,
        );
        assert_eq!(overrides["disable"], json!([]));
        assert_eq!(overrides["flatten"], json!(true));
    }

    #[test]
    fn no_overrides_by_default() {
        assert!(build_overrides(&run_args(&[]), &AppConfig::default()).is_empty());
    }
}
