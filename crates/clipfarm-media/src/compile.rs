//! Compilation engine: fade each clip, then concatenate in order.
//!
//! # Pipeline
//!
//! 1. Every input clip is re-encoded once (H.264/AAC) with a fade-in and a
//!    fade-out into a per-call scratch directory. Transforms run in a bounded
//!    pool but their outputs keep input order.
//! 2. A concat manifest lists the intermediates, one `file '<path>'` line each.
//! 3. A single stream-copy concat produces the compilation.
//!
//! The scratch directory is removed when the call returns, whether it
//! succeeded, failed or was dropped mid-flight.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, trace};

use clipfarm_models::ClipFile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::FadePlan;

const MANIFEST_NAME: &str = "concat.txt";

/// Produces one compilation from an ordered list of clips.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `clips` in the given order into `output_path`.
    async fn compile(&self, clips: &[ClipFile], output_path: &Path) -> MediaResult<PathBuf>;
}

/// Encoding and scheduling options for [`CompilationEngine`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Requested fade length in seconds (clamped per clip)
    pub fade_seconds: f64,
    /// Maximum concurrent per-clip transforms
    pub max_parallel: usize,
    /// Where scratch directories are created; defaults to the output directory
    pub scratch_root: Option<PathBuf>,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fade_seconds: 0.5,
            max_parallel: 4,
            scratch_root: None,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "veryfast".to_string(),
            crf: 20,
        }
    }
}

/// FFmpeg-backed [`Compiler`].
#[derive(Debug, Clone)]
pub struct CompilationEngine {
    runner: FfmpegRunner,
    options: CompileOptions,
}

impl CompilationEngine {
    pub fn new(runner: FfmpegRunner, options: CompileOptions) -> Self {
        Self { runner, options }
    }

    /// Re-encode one clip with fades into `output`.
    async fn transform(&self, clip: &ClipFile, output: PathBuf) -> MediaResult<PathBuf> {
        let mut cmd = FfmpegCommand::new(&clip.path, &output).stage("transform");

        match FadePlan::for_clip(clip.duration_seconds, self.options.fade_seconds) {
            Some(plan) => {
                cmd = cmd
                    .video_filter(plan.video_filter())
                    .audio_filter(plan.audio_filter());
            }
            None => debug!(clip = %clip.path.display(), "Clip too short for fades, skipping filters"),
        }

        let cmd = cmd
            .video_codec(&self.options.video_codec)
            .preset(&self.options.preset)
            .crf(self.options.crf)
            .audio_codec(&self.options.audio_codec);

        let total_ms = (clip.duration_seconds * 1000.0) as i64;
        let label = clip.path.display().to_string();
        self.runner
            .run_with_progress(&cmd, move |p| {
                trace!(clip = %label, percent = p.percentage(total_ms), "Transform progress");
            })
            .await?;

        Ok(output)
    }
}

/// Quote a path for the concat demuxer: `'` becomes `'\''`.
pub fn escape_manifest_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Render a concat manifest for `parts`, one line per file.
pub fn build_manifest(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", escape_manifest_path(p)))
        .collect()
}

fn validate(clips: &[ClipFile]) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::invalid_input("no clips to compile"));
    }
    if let Some(bad) = clips
        .iter()
        .find(|c| !c.duration_seconds.is_finite() || c.duration_seconds < 0.0)
    {
        return Err(MediaError::invalid_input(format!(
            "clip {} has invalid duration {}",
            bad.path.display(),
            bad.duration_seconds
        )));
    }
    Ok(())
}

#[async_trait]
impl Compiler for CompilationEngine {
    #[instrument(skip(self, clips), fields(clips = clips.len(), output = %output_path.display()))]
    async fn compile(&self, clips: &[ClipFile], output_path: &Path) -> MediaResult<PathBuf> {
        validate(clips)?;
        let started = Instant::now();

        let output_dir = match output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&output_dir).await?;

        let scratch_root = self.options.scratch_root.clone().unwrap_or(output_dir);
        tokio::fs::create_dir_all(&scratch_root).await?;
        let scratch = tempfile::Builder::new()
            .prefix("clipfarm-compile-")
            .tempdir_in(&scratch_root)?;
        // Absolute so the manifest resolves regardless of its own location
        let scratch_path = tokio::fs::canonicalize(scratch.path()).await?;

        let transforms = clips.iter().enumerate().map(|(index, clip)| {
            let part = scratch_path.join(format!("part_{index:04}.mp4"));
            self.transform(clip, part)
        })
        .collect::<Vec<_>>();
        let parts: Vec<PathBuf> = stream::iter(transforms)
            .buffered(self.options.max_parallel.max(1))
            .try_collect()
            .await?;
        debug!(parts = parts.len(), "Transforms complete");

        let manifest = scratch_path.join(MANIFEST_NAME);
        tokio::fs::write(&manifest, build_manifest(&parts)).await?;

        self.runner
            .run(&FfmpegCommand::concat(&manifest, output_path))
            .await?;

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Compilation written to {}",
            output_path.display()
        );

        scratch.close()?;
        Ok(output_path.to_path_buf())
    }
}
