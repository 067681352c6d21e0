//! Helix client: creator lookup and clip discovery.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use clipfarm_models::{Clip, ClipFilter, Creator, RankedClips};

use crate::auth::TokenProvider;
use crate::config::TwitchConfig;
use crate::error::{TwitchError, TwitchResult};
use crate::models::{HelixClip, HelixPage, HelixUser};
use crate::retry::{retry_async, RetryConfig};

/// Browser-like user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Discovery parameters for one run.
#[derive(Debug, Clone)]
pub struct ClipQuery {
    /// How far back from now clips are considered
    pub lookback: chrono::Duration,
    pub filter: ClipFilter,
}

impl Default for ClipQuery {
    fn default() -> Self {
        Self {
            lookback: chrono::Duration::days(5),
            filter: ClipFilter::default(),
        }
    }
}

/// Result of a discovery: the resolved creator and its ranked clips.
#[derive(Debug)]
pub struct Discovery {
    pub creator: Creator,
    pub clips: RankedClips,
}

/// Source of popular clips for a creator.
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Resolve `creator_login` and return its filtered, ranked clips.
    async fn list_clips(&self, creator_login: &str, query: &ClipQuery) -> TwitchResult<Discovery>;
}

/// Build the shared HTTP client used by the Twitch clients.
pub fn build_http_client(config: &TwitchConfig) -> TwitchResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(TwitchError::from)
}

/// Helix API client.
pub struct ClipSourceClient {
    http: reqwest::Client,
    config: TwitchConfig,
    tokens: Arc<TokenProvider>,
    retry: RetryConfig,
}

impl ClipSourceClient {
    /// Create a client with its own HTTP client and token provider.
    pub fn new(config: TwitchConfig) -> TwitchResult<Self> {
        let http = build_http_client(&config)?;
        let tokens = Arc::new(TokenProvider::new(http.clone(), &config));
        Ok(Self::with_tokens(http, config, tokens))
    }

    /// Create a client sharing an HTTP client and token provider.
    pub fn with_tokens(http: reqwest::Client, config: TwitchConfig, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http,
            config,
            tokens,
            retry: RetryConfig::new("helix_request"),
        }
    }

    /// Override the retry policy for Helix requests.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Token provider, shared with the playback resolver.
    pub fn tokens(&self) -> Arc<TokenProvider> {
        Arc::clone(&self.tokens)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Look up a creator by login name.
    #[instrument(skip(self))]
    pub async fn resolve_creator(&self, login: &str) -> TwitchResult<Creator> {
        let params = [("login", login.to_string())];
        let page: HelixPage<HelixUser> = self.get_helix("users", &params).await?;

        let user = page
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::not_found(format!("no Twitch user with login '{login}'")))?;

        debug!(broadcaster_id = %user.id, "Resolved creator");
        Ok(user.into())
    }

    /// Fetch every clip of `broadcaster_id` created within `lookback`.
    ///
    /// Follows pagination cursors while enabled and below the page limit.
    /// Clips repeated across pages are kept once.
    #[instrument(skip(self))]
    pub async fn fetch_clips(
        &self,
        broadcaster_id: &str,
        lookback: chrono::Duration,
    ) -> TwitchResult<Vec<Clip>> {
        let started_at = Utc::now()
            .checked_sub_signed(lookback)
            .ok_or_else(|| TwitchError::config(format!("lookback of {lookback} is out of range")))?
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut clips = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut params = vec![
                ("broadcaster_id", broadcaster_id.to_string()),
                ("started_at", started_at.clone()),
                ("first", self.config.page_size.to_string()),
            ];
            if let Some(after) = &cursor {
                params.push(("after", after.clone()));
            }

            let page: HelixPage<HelixClip> = self.get_helix("clips", &params).await?;
            pages += 1;

            for clip in page.data {
                if seen.insert(clip.id.clone()) {
                    clips.push(Clip::from(clip));
                }
            }

            match page.pagination.next_cursor() {
                Some(next) if self.config.paginate && pages < self.config.max_pages => {
                    cursor = Some(next.to_string());
                }
                Some(_) if self.config.paginate => {
                    warn!(pages, "Stopping clip pagination at page limit");
                    break;
                }
                _ => break,
            }
        }

        debug!(pages, clips = clips.len(), "Fetched clips");
        Ok(clips)
    }

    /// GET a Helix endpoint, retrying transient failures.
    async fn get_helix<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> TwitchResult<T> {
        retry_async(
            &self.retry,
            || self.get_authorized(endpoint, params),
            TwitchError::is_transient,
        )
        .await
    }

    /// GET with bearer auth; a rejected token is refreshed exactly once.
    async fn get_authorized<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> TwitchResult<T> {
        let url = format!("{}/{}", self.config.helix_url, endpoint);

        let mut refreshed = false;
        loop {
            let token = self.tokens.token().await?;
            let response = self
                .http
                .get(&url)
                .query(params)
                .bearer_auth(&token)
                .header("Client-Id", self.tokens.client_id())
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
                if refreshed {
                    return Err(TwitchError::auth(format!(
                        "Helix rejected a freshly issued token for /{endpoint}"
                    )));
                }
                refreshed = true;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(TwitchError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(serde_json::from_str(&body)?);
        }
    }
}

#[async_trait]
impl ClipSource for ClipSourceClient {
    #[instrument(skip(self, query))]
    async fn list_clips(&self, creator_login: &str, query: &ClipQuery) -> TwitchResult<Discovery> {
        let creator = self.resolve_creator(creator_login).await?;
        let discovered = self.fetch_clips(&creator.broadcaster_id, query.lookback).await?;
        let total = discovered.len();

        let clips = RankedClips::from_discovered(discovered, &query.filter);
        info!(
            broadcaster_id = %creator.broadcaster_id,
            discovered = total,
            kept = clips.len(),
            "Discovered clips"
        );

        Ok(Discovery { creator, clips })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn helix_clip(id: &str, views: u64, duration: f64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "url": format!("https://clips.twitch.tv/{id}"),
            "broadcaster_id": "1234",
            "broadcaster_name": "Acme",
            "creator_name": "viewer",
            "title": format!("clip {id}"),
            "view_count": views,
            "created_at": "2024-05-02T12:00:00Z",
            "duration": duration,
            "language": "en"
        })
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "tok" })),
            )
            .mount(server)
            .await;
    }

    async fn mount_user(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .and(query_param("login", "acme"))
            .and(header("Client-Id", "my-client"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "1234", "login": "acme", "display_name": "Acme" }]
            })))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer, configure: impl FnOnce(&mut TwitchConfig)) -> ClipSourceClient {
        let mut config = TwitchConfig::new("my-client", "my-secret").with_base_url(&server.uri());
        configure(&mut config);
        ClipSourceClient::new(config)
            .unwrap()
            .with_retry(RetryConfig::new("test").with_base_delay(Duration::from_millis(1)))
    }

    fn query(min_duration: f64, min_views: u64) -> ClipQuery {
        ClipQuery {
            lookback: chrono::Duration::days(5),
            filter: ClipFilter::new(min_duration, min_views),
        }
    }

    #[tokio::test]
    async fn test_list_clips_filters_and_ranks() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_user(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .and(query_param("broadcaster_id", "1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [helix_clip("a", 50, 8.0), helix_clip("b", 900, 15.0), helix_clip("c", 300, 12.0)],
                "pagination": {}
            })))
            .mount(&server)
            .await;

        let discovery = client(&server, |_| {})
            .list_clips("acme", &query(10.0, 100))
            .await
            .unwrap();

        assert_eq!(discovery.creator.broadcaster_id, "1234");
        assert_eq!(discovery.creator.display_name, "Acme");
        let ids: Vec<String> = discovery.clips.map(|c| c.external_id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_unknown_creator_is_not_found() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = client(&server, |_| {})
            .list_clips("ghost", &ClipQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TwitchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_lookback_is_config_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, |_| {})
            .fetch_clips("1234", chrono::TimeDelta::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, TwitchError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_pagination_follows_cursor() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_user(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .and(query_param("after", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [helix_clip("late", 700, 30.0), helix_clip("early", 800, 30.0)],
                "pagination": { "cursor": "" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [helix_clip("early", 800, 30.0)],
                "pagination": { "cursor": "page2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let discovery = client(&server, |_| {})
            .list_clips("acme", &query(10.0, 100))
            .await
            .unwrap();

        let ids: Vec<String> = discovery.clips.map(|c| c.external_id).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_page_limit_stops_pagination() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_user(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [helix_clip("a", 800, 30.0)],
                "pagination": { "cursor": "more" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let discovery = client(&server, |c| c.max_pages = 1)
            .list_clips("acme", &query(10.0, 100))
            .await
            .unwrap();
        assert_eq!(discovery.clips.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_pagination_fetches_one_page() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_user(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [helix_clip("a", 800, 30.0)],
                "pagination": { "cursor": "more" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, |c| c.paginate = false)
            .list_clips("acme", &query(10.0, 100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_repeated_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "tok" })),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid oauth token"))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server, |_| {})
            .list_clips("acme", &ClipQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TwitchError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_user(&server).await;

        let creator = client(&server, |_| {}).resolve_creator("acme").await.unwrap();
        assert_eq!(creator.broadcaster_id, "1234");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad login"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, |_| {}).resolve_creator("acme").await.unwrap_err();
        match err {
            TwitchError::Upstream { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad login");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
