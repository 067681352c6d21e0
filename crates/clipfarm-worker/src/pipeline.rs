//! Pipeline orchestration for one creator.
//!
//! A run walks `Start → Discover → Acquire → Compile → Handoff → Cleanup →
//! Done`. Failures in discovery, store access, authentication, compilation
//! or handoff (and cancellation) abort the run; per-clip resolution and
//! download failures only drop the clip. Cleanup of the per-run directories always happens.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{warn, Instrument};

use clipfarm_media::{remove_dir_if_exists, wait_for_cancel, Compiler, MediaDownloader};
use clipfarm_models::{Clip, ClipFile, CompilationJob, Creator, Highlight, RunId, RunState, Streamer};
use clipfarm_store::{ClipRepository, DedupGate, HighlightRepository, StreamerRepository};
use clipfarm_twitch::{ClipSource, PlaybackResolver};

use crate::acquire::{AcquireOutcome, ClipAcquirer};
use crate::config::{validate_login, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::presentation::{default_tags, highlight_description, highlight_title};
use crate::publish::{PublishRequest, Publisher};

/// Collaborators of the orchestrator, injected so runs can be tested with fakes.
#[derive(Clone)]
pub struct PipelineDeps {
    pub source: Arc<dyn ClipSource>,
    pub resolver: Arc<dyn PlaybackResolver>,
    pub downloader: Arc<dyn MediaDownloader>,
    pub compiler: Arc<dyn Compiler>,
    pub publisher: Arc<dyn Publisher>,
    pub streamers: Arc<dyn StreamerRepository>,
    pub clips: Arc<dyn ClipRepository>,
    pub highlights: Arc<dyn HighlightRepository>,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub creator: String,
    pub state: RunState,
    /// Clips that passed the discovery filter
    pub discovered: usize,
    /// Clips already processed by an earlier run
    pub skipped: usize,
    pub acquired: usize,
    pub failed: usize,
    pub highlight: Option<Highlight>,
    pub published_to: Option<String>,
    pub elapsed_seconds: f64,
}

impl RunReport {
    fn new(run_id: RunId, creator: &str) -> Self {
        Self {
            run_id,
            creator: creator.to_string(),
            state: RunState::Start,
            discovered: 0,
            skipped: 0,
            acquired: 0,
            failed: 0,
            highlight: None,
            published_to: None,
            elapsed_seconds: 0.0,
        }
    }

    /// Whether the run handed off a compilation.
    pub fn published(&self) -> bool {
        self.highlight.is_some()
    }
}

/// Drives one discovery-to-handoff run per call.
pub struct PipelineOrchestrator {
    config: WorkerConfig,
    source: Arc<dyn ClipSource>,
    acquirer: ClipAcquirer,
    compiler: Arc<dyn Compiler>,
    publisher: Arc<dyn Publisher>,
    streamers: Arc<dyn StreamerRepository>,
    highlights: Arc<dyn HighlightRepository>,
    dedup: DedupGate,
}

impl PipelineOrchestrator {
    pub fn new(config: WorkerConfig, deps: PipelineDeps) -> Self {
        let acquirer = ClipAcquirer::new(deps.resolver, deps.downloader, config.download_retries);
        Self {
            source: deps.source,
            acquirer,
            compiler: deps.compiler,
            publisher: deps.publisher,
            streamers: deps.streamers,
            highlights: deps.highlights,
            dedup: DedupGate::new(deps.clips),
            config,
        }
    }

    /// Replace the per-clip acquirer (retry policy in tests).
    pub fn with_acquirer(mut self, acquirer: ClipAcquirer) -> Self {
        self.acquirer = acquirer;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run the pipeline for `creator`.
    ///
    /// Setting `cancel` to `true` drops all in-flight work, cleans up and
    /// returns [`WorkerError::Cancelled`]. An invalid login fails with
    /// [`WorkerError::Config`] before any work or cleanup.
    pub async fn run(&self, creator: &str, mut cancel: watch::Receiver<bool>) -> WorkerResult<RunReport> {
        validate_login(creator)?;

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, creator);
        let span = logger.create_span();
        let mut job = CompilationJob::new(run_id.clone(), creator, self.config.output_path(creator));
        let mut report = RunReport::new(run_id, creator);

        logger.log_start(&format!("compiling clips of {creator}"));

        let result = async {
            tokio::select! {
                biased;
                _ = wait_for_cancel(&mut cancel) => Err(WorkerError::Cancelled),
                result = self.execute(&mut job, &mut report, &logger) => result,
            }
        }
        .instrument(span.clone())
        .await;

        logger.log_state(RunState::Cleanup);
        self.cleanup(creator, &logger).instrument(span).await;

        let elapsed = job.elapsed();
        report.elapsed_seconds = elapsed.as_secs_f64();

        match result {
            Ok(()) => {
                report.state = RunState::Done;
                logger.log_state(RunState::Done);
                let outcome = if report.published() { "published" } else { "empty" };
                metrics::record_run(outcome, elapsed);
                logger.log_completion(&format!(
                    "{} clips compiled in {:.1}s",
                    report.acquired, report.elapsed_seconds
                ));
                Ok(report)
            }
            Err(e) => {
                logger.log_state(RunState::Aborted);
                let outcome = if matches!(e, WorkerError::Cancelled) { "cancelled" } else { "failed" };
                metrics::record_run(outcome, elapsed);
                logger.log_error(&format!(
                    "{} error after {:.1}s: {}",
                    e.kind(),
                    report.elapsed_seconds,
                    e
                ));
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        job: &mut CompilationJob,
        report: &mut RunReport,
        logger: &RunLogger,
    ) -> WorkerResult<()> {
        report.state = RunState::Discover;
        logger.log_state(RunState::Discover);
        let discovery = self
            .source
            .list_clips(&job.creator, &self.config.clip_query())
            .await?;
        let creator = discovery.creator;
        let streamer = self
            .streamers
            .upsert(&creator.display_name, &creator.broadcaster_id)
            .await?;
        report.discovered = discovery.clips.len();

        report.state = RunState::Acquire;
        logger.log_state(RunState::Acquire);
        let mut candidates = Vec::with_capacity(report.discovered);
        for (rank, clip) in discovery.clips.enumerate() {
            if self.dedup.is_new(&clip.external_id).await? {
                candidates.push((rank, clip));
            } else {
                report.skipped += 1;
            }
        }
        metrics::record_clips("skipped", report.skipped);

        if candidates.is_empty() {
            logger.log_progress(&format!(
                "no new clips among {} discovered, nothing to compile",
                report.discovered
            ));
            return Ok(());
        }

        let downloads = self.config.downloads_dir(&job.creator);
        tokio::fs::create_dir_all(&downloads).await?;
        job.clips = self
            .acquire_all(candidates, &downloads, &streamer, report, logger)
            .await?;

        if job.is_empty() {
            logger.log_progress("every clip failed to download, nothing to compile");
            return Ok(());
        }

        report.state = RunState::Compile;
        logger.log_state(RunState::Compile);
        logger.log_progress(&format!(
            "compiling {} clips ({:.1}s of footage)",
            job.clips.len(),
            job.total_duration_seconds()
        ));
        let output = self.compiler.compile(&job.clips, &job.output_path).await?;

        report.state = RunState::Handoff;
        logger.log_state(RunState::Handoff);
        let (highlight, location) = self.hand_off(&creator, &streamer, &output).await?;
        logger.log_progress(&format!("published '{}' to {}", highlight.title, location));
        report.highlight = Some(highlight);
        report.published_to = Some(location);

        Ok(())
    }

    /// Acquire candidates in a bounded pool. Returns the downloaded files in
    /// rank order. Store and credential failures abort; clip failures are
    /// counted.
    async fn acquire_all(
        &self,
        candidates: Vec<(usize, Clip)>,
        downloads: &Path,
        streamer: &Streamer,
        report: &mut RunReport,
        logger: &RunLogger,
    ) -> WorkerResult<Vec<ClipFile>> {
        let mut outcomes = stream::iter(candidates)
            .map(|(rank, clip)| self.acquirer.acquire(rank, clip, downloads))
            .buffer_unordered(self.config.max_downloads.max(1));

        let mut acquired: Vec<(usize, ClipFile)> = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            match outcome? {
                AcquireOutcome::Acquired {
                    rank, clip, file, ..
                } => {
                    self.dedup.record(streamer.id, &clip).await?;
                    acquired.push((rank, file));
                }
                AcquireOutcome::Failed { clip, reason, .. } => {
                    report.failed += 1;
                    logger.log_warning(&format!("skipping clip {}: {}", clip.external_id, reason));
                }
            }
        }

        acquired.sort_by_key(|(rank, _)| *rank);
        report.acquired = acquired.len();
        metrics::record_clips("acquired", report.acquired);
        metrics::record_clips("failed", report.failed);

        Ok(acquired.into_iter().map(|(_, file)| file).collect())
    }

    async fn hand_off(
        &self,
        creator: &Creator,
        streamer: &Streamer,
        output: &Path,
    ) -> WorkerResult<(Highlight, String)> {
        let now = Utc::now();
        let sequence = self.highlights.next_sequence(streamer.id).await?;
        let request = PublishRequest {
            output_path: output.to_path_buf(),
            creator: creator.login.clone(),
            sequence,
            title: highlight_title(&creator.display_name, now, sequence),
            description: highlight_description(
                &creator.display_name,
                &creator.login,
                now,
                self.config.contact.as_deref(),
            ),
            tags: default_tags(),
        };

        let receipt = self.publisher.publish(&request).await?;
        let highlight = self.highlights.record(streamer.id, &request.title).await?;
        Ok((highlight, receipt.location))
    }

    async fn cleanup(&self, creator: &str, logger: &RunLogger) {
        for dir in [self.config.downloads_dir(creator), self.config.output_dir(creator)] {
            if let Err(e) = remove_dir_if_exists(&dir).await {
                warn!(run_id = logger.run_id(), path = %dir.display(), error = %e, "Failed to remove run directory");
            }
        }
    }
}
