//! Playable media URL resolution over the Twitch GQL API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::Url;

use clipfarm_models::Clip;

use crate::auth::TokenProvider;
use crate::config::TwitchConfig;
use crate::error::{TwitchError, TwitchResult};
use crate::models::{
    ClipAccessData, GqlExtensions, GqlRequest, GqlResponse, PersistedQuery, SlugVariables,
};

const CLIP_ACCESS_OPERATION: &str = "VideoAccessToken_Clip";
const CLIP_ACCESS_HASH: &str = "36b89d2507fce29e5ca551df756d27c1cfe079e2609642b4390aa4c35796eb11";
const CLIP_ACCESS_QUERY: &str = "query ($slug: ID!) { clip(slug: $slug) { videoQualities { sourceURL } playbackAccessToken(params: { platform: \"web\" }) { signature value } } }";

/// Turns a clip into a directly downloadable media URL.
#[async_trait]
pub trait PlaybackResolver: Send + Sync {
    /// Clip-specific failures are reported as [`TwitchError::Resolution`];
    /// rejected credentials surface as [`TwitchError::Auth`].
    async fn resolve_playable_url(&self, clip: &Clip) -> TwitchResult<String>;
}

/// GQL-backed resolver: fetches the clip's qualities and a signed access token.
pub struct GqlPlaybackResolver {
    http: reqwest::Client,
    gql_url: String,
    gql_client_id: String,
    tokens: Arc<TokenProvider>,
}

impl GqlPlaybackResolver {
    pub fn new(http: reqwest::Client, config: &TwitchConfig, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http,
            gql_url: config.gql_url.clone(),
            gql_client_id: config.gql_client_id.clone(),
            tokens,
        }
    }

    async fn query_access(&self, slug: &str) -> TwitchResult<String> {
        let request = GqlRequest {
            operation_name: CLIP_ACCESS_OPERATION,
            variables: SlugVariables { slug },
            query: CLIP_ACCESS_QUERY,
            extensions: GqlExtensions {
                persisted_query: PersistedQuery {
                    version: 1,
                    sha256_hash: CLIP_ACCESS_HASH,
                },
            },
        };

        let mut refreshed = false;
        loop {
            // Rejected credentials abort the batch; anything else skips the clip.
            let token = self.tokens.token().await.map_err(|e| match e {
                TwitchError::Auth(_) => e,
                other => TwitchError::resolution(slug, other.to_string()),
            })?;
            let response = self
                .http
                .post(&self.gql_url)
                .header("Client-ID", &self.gql_client_id)
                .bearer_auth(&token)
                .json(&request)
                .send()
                .await
                .map_err(|e| TwitchError::resolution(slug, e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
                if refreshed {
                    return Err(TwitchError::auth("GQL rejected a freshly issued token"));
                }
                warn!(slug, "GQL rejected access token, refreshing");
                refreshed = true;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| TwitchError::resolution(slug, e.to_string()))?;
            if !status.is_success() {
                return Err(TwitchError::resolution(
                    slug,
                    format!("GQL returned HTTP {}", status.as_u16()),
                ));
            }

            debug!(slug, "GQL clip access response received");
            return build_playable_url(&body)
                .map_err(|reason| TwitchError::resolution(slug, reason));
        }
    }
}

#[async_trait]
impl PlaybackResolver for GqlPlaybackResolver {
    #[instrument(skip(self, clip), fields(external_id = %clip.external_id))]
    async fn resolve_playable_url(&self, clip: &Clip) -> TwitchResult<String> {
        let slug = clip_slug(clip);
        self.query_access(&slug).await
    }
}

/// Slug of a clip: the last path segment of its page URL, or its id.
pub fn clip_slug(clip: &Clip) -> String {
    Url::parse(&clip.source_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| clip.external_id.clone())
}

/// Decode a GQL response body into a signed media URL.
///
/// The response may be a single object or a one-element array.
fn build_playable_url(body: &str) -> Result<String, String> {
    let response: GqlResponse<ClipAccessData> =
        match serde_json::from_str::<Vec<GqlResponse<ClipAccessData>>>(body) {
            Ok(responses) => responses
                .into_iter()
                .next()
                .ok_or_else(|| "empty GQL response array".to_string())?,
            Err(_) => serde_json::from_str(body).map_err(|e| format!("undecodable GQL body: {e}"))?,
        };

    let clip = response
        .data
        .and_then(|d| d.clip)
        .ok_or_else(|| "response has no clip data".to_string())?;

    let access = clip
        .playback_access_token
        .ok_or_else(|| "response has no playback access token".to_string())?;

    let source = clip
        .video_qualities
        .into_iter()
        .next()
        .ok_or_else(|| "clip has no video qualities".to_string())?;

    let mut url =
        Url::parse(&source.source_url).map_err(|e| format!("invalid source URL: {e}"))?;
    url.query_pairs_mut()
        .append_pair("sig", &access.signature)
        .append_pair("token", &access.value);

    Ok(url.into())
}
