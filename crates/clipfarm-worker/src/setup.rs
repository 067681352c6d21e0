//! Production wiring of the pipeline collaborators.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use clipfarm_media::{check_ffmpeg, CompilationEngine, FfmpegRunner, HttpDownloader};
use clipfarm_store::{db, SqlxClipRepository, SqlxHighlightRepository, SqlxStreamerRepository};
use clipfarm_twitch::{ClipSourceClient, GqlPlaybackResolver, TwitchConfig};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::pipeline::{PipelineDeps, PipelineOrchestrator};
use crate::publish::DirectoryPublisher;

const DB_MAX_CONNECTIONS: u32 = 5;

/// Build an orchestrator backed by Twitch, FFmpeg, SQLite and the publish
/// directory. `cancel` is also handed to the FFmpeg runner.
pub async fn build_pipeline(
    config: WorkerConfig,
    twitch: TwitchConfig,
    cancel: watch::Receiver<bool>,
) -> WorkerResult<PipelineOrchestrator> {
    let ffmpeg = check_ffmpeg(&config.ffmpeg_path)?;
    info!(path = %ffmpeg.display(), "Using FFmpeg");

    let pool = db::connect(&config.database_url, DB_MAX_CONNECTIONS).await?;
    db::migrate(&pool).await?;

    let source = ClipSourceClient::new(twitch.clone())?;
    let resolver = GqlPlaybackResolver::new(source.http().clone(), &twitch, source.tokens());

    let runner = FfmpegRunner::new()
        .with_program(ffmpeg)
        .with_timeout(config.transcode_timeout)
        .with_cancel(cancel);
    let compiler = CompilationEngine::new(runner, config.compile_options());

    let deps = PipelineDeps {
        source: Arc::new(source),
        resolver: Arc::new(resolver),
        downloader: Arc::new(HttpDownloader::new(config.download_timeout)?),
        compiler: Arc::new(compiler),
        publisher: Arc::new(DirectoryPublisher::new(&config.publish_dir)),
        streamers: Arc::new(SqlxStreamerRepository::new(pool.clone())),
        clips: Arc::new(SqlxClipRepository::new(pool.clone())),
        highlights: Arc::new(SqlxHighlightRepository::new(pool)),
    };

    Ok(PipelineOrchestrator::new(config, deps))
}
