//! Boilerplate Service - main application orchestrator.
//!
//! This service executes an expanded [`ConfigTree`]:
//! 1. Validate the tree and flatten it into target jobs (scaffolds first)
//! 2. For each target: resolve its pipeline, match sources, transform, write
//! 3. Report the written files, either as a summary (series mode) or as a
//!    merged event stream (stream mode)
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{FutureExt, channel::mpsc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, debug_span, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{FileAccess, PluginRegistry},
        services::{
            pipeline::resolve_pipeline,
            stream::{Barrier, FileStream, StreamEvent},
        },
    },
    domain::{
        ConfigTree, DestinationRule, DomainError, DomainValidator as validator, Expander,
        FileSet, InlineSteps, OptionMap, OutputFile, RawNode, Scaffold, Target, merge,
        options::bool_option,
    },
    error::{BoilerplateError, BoilerplateResult},
};

/// Outcome of a successful series run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Number of targets executed.
    pub targets: usize,
    /// Files written, in write order.
    pub files: Vec<OutputFile>,
}

/// Main boilerplate service.
///
/// Expands raw configuration and runs expanded trees against the injected
/// file access and plugin registry.
pub struct BoilerplateService {
    files: Arc<dyn FileAccess>,
    plugins: Arc<dyn PluginRegistry>,
    expander: Expander,
}

impl BoilerplateService {
    /// Create a new service with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use boilerplate_core::application::{BoilerplateService, ports::*};
    ///
    /// # fn demo(files: Arc<dyn FileAccess>, plugins: Arc<dyn PluginRegistry>) {
    /// let service = BoilerplateService::new(files, plugins);
    /// # }
    /// ```
    pub fn new(files: Arc<dyn FileAccess>, plugins: Arc<dyn PluginRegistry>) -> Self {
        Self {
            files,
            plugins,
            expander: Expander::new(),
        }
    }

    /// Replace the expander, e.g. one built with a custom classifier.
    pub fn with_expander(mut self, expander: Expander) -> Self {
        self.expander = expander;
        self
    }

    pub fn expand(&self, raw: impl Into<RawNode>) -> BoilerplateResult<ConfigTree> {
        Ok(self.expander.expand(raw)?)
    }

    pub fn expand_with(
        &self,
        raw: impl Into<RawNode>,
        inherited: &OptionMap,
    ) -> BoilerplateResult<ConfigTree> {
        Ok(self.expander.expand_with(raw, inherited)?)
    }

    /// Names of every registered plugin.
    pub fn plugin_names(&self) -> BoilerplateResult<Vec<String>> {
        self.plugins.names()
    }

    /// Run every target one at a time, stopping at the first error.
    ///
    /// `overrides` are merged over each target's effective options.
    #[instrument(skip_all, fields(tree = %tree.name(), run_id = tracing::field::Empty))]
    pub async fn run_series(
        &self,
        tree: &ConfigTree,
        overrides: &OptionMap,
    ) -> BoilerplateResult<RunSummary> {
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", tracing::field::display(run_id));

        validator::validate_tree(tree)?;
        let jobs = plan(tree, overrides);
        info!(targets = jobs.len(), "Running boilerplate in series");

        let worker = self.worker(tree);
        let mut files = Vec::new();
        for job in &jobs {
            debug!(node = %job.node, "Running target");
            worker
                .run_target(job, None, |file| files.push(file))
                .await
                .inspect_err(|e| warn!(node = %job.node, error = %e, "Target failed"))?;
        }

        info!(files = files.len(), "Series run completed");
        Ok(RunSummary {
            run_id,
            targets: jobs.len(),
            files,
        })
    }

    /// Callback form of [`run_series`](Self::run_series): `on_done` receives
    /// `None` on success or the first error.
    pub async fn run_series_with<F>(&self, tree: &ConfigTree, overrides: &OptionMap, on_done: F)
    where
        F: FnOnce(Option<BoilerplateError>),
    {
        on_done(self.run_series(tree, overrides).await.err());
    }

    /// Run every target concurrently and merge their output into one stream.
    ///
    /// Must be called within a tokio runtime; otherwise the stream carries a
    /// single error followed by `End`.
    pub fn run_stream(&self, tree: &ConfigTree, overrides: &OptionMap) -> FileStream {
        self.run_stream_with_cancel(tree, overrides, CancellationToken::new())
    }

    /// [`run_stream`](Self::run_stream) with a caller-owned cancellation
    /// token. Cancelling it stops every target before its next write and
    /// reports each stopped target as `Cancelled`.
    pub fn run_stream_with_cancel(
        &self,
        tree: &ConfigTree,
        overrides: &OptionMap,
        cancel: CancellationToken,
    ) -> FileStream {
        let run_id = Uuid::new_v4();
        let span = info_span!("run_stream", tree = %tree.name(), %run_id);
        let _entered = span.enter();

        let (tx, rx) = mpsc::unbounded();
        let token = cancel.child_token();
        let stream = FileStream::new(run_id, rx, token.clone());

        let jobs = match validator::validate_tree(tree) {
            Ok(()) => plan(tree, overrides),
            Err(e) => return finish_early(stream, &tx, Some(e.into())),
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let error = BoilerplateError::internal(format!("stream mode needs a tokio runtime: {e}"));
                return finish_early(stream, &tx, Some(error));
            }
        };
        if jobs.is_empty() {
            return finish_early(stream, &tx, None);
        }

        info!(targets = jobs.len(), "Running boilerplate as a stream");
        let worker = self.worker(tree);
        let barrier = Barrier::new(jobs.len(), tx.clone());
        let failed = Arc::new(AtomicBool::new(false));

        for job in jobs {
            let guard = barrier.guard();
            let worker = worker.clone();
            let tx = tx.clone();
            let token = token.clone();
            let failed = Arc::clone(&failed);
            let task_span = debug_span!(parent: &span, "target", node = %job.node);

            runtime.spawn(
                async move {
                    let _guard = guard;
                    let sink = tx.clone();
                    let work = worker.run_target(&job, Some(&token), move |file| {
                        let _ = sink.unbounded_send(StreamEvent::Data(file));
                    });
                    let result = match AssertUnwindSafe(work).catch_unwind().await {
                        Ok(result) => result,
                        Err(payload) => Err(BoilerplateError::internal(format!(
                            "target '{}' panicked: {}",
                            job.node,
                            panic_message(payload.as_ref())
                        ))),
                    };

                    match result {
                        Ok(written) => debug!(written, "Target completed"),
                        Err(BoilerplateError::Application(ApplicationError::Cancelled { .. }))
                            if failed.load(Ordering::Acquire) =>
                        {
                            warn!("Target stopped after a failure elsewhere in the run");
                        }
                        Err(e) => {
                            if !matches!(
                                e,
                                BoilerplateError::Application(ApplicationError::Cancelled { .. })
                            ) {
                                warn!(error = %e, "Target failed, cancelling the run");
                                failed.store(true, Ordering::Release);
                                token.cancel();
                            }
                            let _ = tx.unbounded_send(StreamEvent::Error(e));
                        }
                    }
                }
                .instrument(task_span),
            );
        }

        stream
    }

    fn worker(&self, tree: &ConfigTree) -> Worker {
        Worker {
            files: Arc::clone(&self.files),
            plugins: Arc::clone(&self.plugins),
            inline: Arc::new(tree.inline_steps().clone()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn finish_early(
    stream: FileStream,
    tx: &mpsc::UnboundedSender<StreamEvent>,
    error: Option<BoilerplateError>,
) -> FileStream {
    if let Some(e) = error {
        warn!(error = %e, "Stream run failed before starting");
        let _ = tx.unbounded_send(StreamEvent::Error(e));
    }
    let _ = tx.unbounded_send(StreamEvent::End);
    stream
}

// -------------------------------------------------------------------------
// Execution plan
// -------------------------------------------------------------------------

/// One target, flattened out of the tree with its final options.
#[derive(Debug, Clone)]
struct TargetJob {
    node: String,
    files: Vec<FileSet>,
    options: OptionMap,
}

impl TargetJob {
    fn new(target: &Target, overrides: &OptionMap) -> Self {
        Self {
            node: target.path().to_string(),
            files: target.files().to_vec(),
            options: merge(target.options(), overrides),
        }
    }
}

/// Depth-first, scaffolds before targets at every level.
fn plan(tree: &ConfigTree, overrides: &OptionMap) -> Vec<TargetJob> {
    let mut jobs = Vec::with_capacity(tree.target_count());
    collect_jobs(tree.scaffolds().values(), tree.targets().values(), overrides, &mut jobs);
    jobs
}

fn collect_jobs<'a>(
    scaffolds: impl Iterator<Item = &'a Scaffold>,
    targets: impl Iterator<Item = &'a Target>,
    overrides: &OptionMap,
    jobs: &mut Vec<TargetJob>,
) {
    for scaffold in scaffolds {
        collect_jobs(
            scaffold.scaffolds().values(),
            scaffold.targets().values(),
            overrides,
            jobs,
        );
    }
    jobs.extend(targets.map(|target| TargetJob::new(target, overrides)));
}

// -------------------------------------------------------------------------
// Target execution
// -------------------------------------------------------------------------

#[derive(Clone)]
struct Worker {
    files: Arc<dyn FileAccess>,
    plugins: Arc<dyn PluginRegistry>,
    inline: Arc<InlineSteps>,
}

impl Worker {
    /// Run one target, handing every written file to `emit`.
    ///
    /// The pipeline is resolved before any source is read, so an unknown
    /// plugin leaves the destination untouched.
    async fn run_target<F>(
        &self,
        job: &TargetJob,
        cancel: Option<&CancellationToken>,
        mut emit: F,
    ) -> BoilerplateResult<usize>
    where
        F: FnMut(OutputFile) + Send,
    {
        let pipeline = resolve_pipeline(&job.options, &job.node, &self.inline, self.plugins.as_ref())?;
        let dot = bool_option(&job.options, "dot");
        let mut written = 0;

        for set in &job.files {
            let cwd = set.cwd_with(&job.options);
            let dest = set
                .dest_with(&job.options)
                .ok_or_else(|| DomainError::MissingDestination {
                    path: job.node.clone(),
                })?;
            let rule = DestinationRule::from_options(&dest, &job.options, &job.node)?;

            let handles = self.files.matches(&cwd, &set.src, dot).await?;
            debug!(
                node = %job.node,
                cwd = %cwd.display(),
                matched = handles.len(),
                pipeline = ?pipeline.names(),
                "Matched sources"
            );

            for handle in handles {
                ensure_live(cancel, &job.node)?;
                let source = self.files.materialize(&handle).await?;
                let source_path = source.path();

                let Some(file) = pipeline.run(source, &job.options, &job.node)? else {
                    debug!(source = %source_path.display(), "Dropped by pipeline");
                    continue;
                };

                let dest_path = rule.apply(&file.relative);
                ensure_live(cancel, &job.node)?;
                self.files.put(&dest_path, &file.contents).await?;
                debug!(source = %source_path.display(), dest = %dest_path.display(), "Wrote file");

                emit(OutputFile {
                    node: job.node.clone(),
                    source: source_path,
                    dest: dest_path,
                    contents: file.contents,
                });
                written += 1;
            }
        }

        Ok(written)
    }
}

fn ensure_live(cancel: Option<&CancellationToken>, node: &str) -> BoilerplateResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(ApplicationError::Cancelled {
            node: node.to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}
