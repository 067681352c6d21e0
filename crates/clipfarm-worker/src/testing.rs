//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use clipfarm_media::{Compiler, MediaDownloader, MediaError, MediaResult};
use clipfarm_models::{Clip, ClipFile, Creator, RankedClips};
use clipfarm_twitch::{ClipQuery, ClipSource, Discovery, PlaybackResolver, TwitchError, TwitchResult};

use crate::error::{WorkerError, WorkerResult};
use crate::publish::{PublishReceipt, PublishRequest, Publisher};

pub fn clip(id: &str, views: u64, duration: f64) -> Clip {
    Clip {
        external_id: id.to_string(),
        title: format!("clip {id}"),
        creator_name: "viewer".to_string(),
        view_count: views,
        created_at: Utc::now(),
        broadcaster_id: "1234".to_string(),
        source_url: format!("https://clips.twitch.tv/{id}"),
        duration_seconds: duration,
        language: None,
    }
}

fn id_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".mp4")
        .to_string()
}

pub struct FakeSource {
    creator: Creator,
    clips: Vec<Clip>,
    error: Mutex<Option<TwitchError>>,
}

impl FakeSource {
    pub fn new(login: &str, clips: Vec<Clip>) -> Self {
        Self {
            creator: Creator {
                login: login.to_string(),
                display_name: login.to_string(),
                broadcaster_id: "1234".to_string(),
            },
            clips,
            error: Mutex::new(None),
        }
    }

    /// Fails the first discovery with `error`.
    pub fn failing(error: TwitchError) -> Self {
        let source = Self::new("acme", Vec::new());
        *source.error.lock().unwrap() = Some(error);
        source
    }
}

#[async_trait]
impl ClipSource for FakeSource {
    async fn list_clips(&self, _creator_login: &str, query: &ClipQuery) -> TwitchResult<Discovery> {
        if let Some(error) = self.error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(Discovery {
            creator: self.creator.clone(),
            clips: RankedClips::from_discovered(self.clips.clone(), &query.filter),
        })
    }
}

#[derive(Default)]
pub struct FakeResolver {
    malformed: HashSet<String>,
    reject_credentials: bool,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeResolver {
    /// Resolution of `id` fails as if the response had no playable source.
    pub fn malformed(mut self, id: &str) -> Self {
        self.malformed.insert(id.to_string());
        self
    }

    /// Every resolution fails with an authentication error.
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PlaybackResolver for FakeResolver {
    async fn resolve_playable_url(&self, clip: &Clip) -> TwitchResult<String> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(clip.external_id.clone())
            .or_default() += 1;
        if self.reject_credentials {
            return Err(TwitchError::auth("token endpoint returned HTTP 403"));
        }
        if self.malformed.contains(&clip.external_id) {
            return Err(TwitchError::resolution(&clip.external_id, "missing data.clip"));
        }
        Ok(format!("https://cdn.test/{}.mp4", clip.external_id))
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    failures: HashMap<String, usize>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeDownloader {
    /// The first `times` downloads of `id` time out.
    pub fn failing_first(mut self, id: &str, times: usize) -> Self {
        self.failures.insert(id.to_string(), times);
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(&self, url: &str, destination: &Path) -> MediaResult<u64> {
        let id = id_from_url(url);
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(id.clone()).or_default();
            *count += 1;
            *count
        };
        if attempt <= self.failures.get(&id).copied().unwrap_or(0) {
            return Err(MediaError::Timeout(Duration::from_secs(1)));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, id.as_bytes()).await?;
        Ok(id.len() as u64)
    }
}

#[derive(Clone, Copy, Default)]
enum CompileMode {
    #[default]
    Succeed,
    Fail,
    Hang,
}

#[derive(Default)]
pub struct FakeCompiler {
    mode: CompileMode,
    calls: Mutex<Vec<Vec<ClipFile>>>,
    started: Notify,
}

impl FakeCompiler {
    /// Fails like a concat step exiting with status 1.
    pub fn failing() -> Self {
        Self {
            mode: CompileMode::Fail,
            ..Default::default()
        }
    }

    /// Never finishes; [`FakeCompiler::started`] resolves once entered.
    pub fn hanging() -> Self {
        Self {
            mode: CompileMode::Hang,
            ..Default::default()
        }
    }

    pub async fn started(&self) {
        self.started.notified().await;
    }

    pub fn calls(&self) -> Vec<Vec<ClipFile>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compiler for FakeCompiler {
    async fn compile(&self, clips: &[ClipFile], output_path: &Path) -> MediaResult<PathBuf> {
        self.calls.lock().unwrap().push(clips.to_vec());
        for clip in clips {
            assert!(clip.path.is_file(), "clip not downloaded: {}", clip.path.display());
        }
        match self.mode {
            CompileMode::Succeed => {
                if let Some(parent) = output_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(output_path, b"compiled").await?;
                Ok(output_path.to_path_buf())
            }
            CompileMode::Fail => Err(MediaError::transcode_failed(
                "concat",
                Some(1),
                "Invalid data found when processing input",
            )),
            CompileMode::Hang => {
                self.started.notify_one();
                std::future::pending::<()>().await;
                Err(MediaError::Cancelled)
            }
        }
    }
}

#[derive(Default)]
pub struct FakePublisher {
    fail: bool,
    requests: Mutex<Vec<PublishRequest>>,
}

impl FakePublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, request: &PublishRequest) -> WorkerResult<PublishReceipt> {
        if self.fail {
            return Err(WorkerError::publish("upload rejected"));
        }
        assert!(request.output_path.is_file());
        self.requests.lock().unwrap().push(request.clone());
        Ok(PublishReceipt {
            location: format!("memory://{}/{}", request.creator, request.sequence),
        })
    }
}
