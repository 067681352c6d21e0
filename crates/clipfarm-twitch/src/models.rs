//! Typed Helix, OAuth and GQL payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clipfarm_models::{Clip, Creator};

/// OAuth client-credentials token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Envelope shared by every Helix list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

impl Pagination {
    /// Cursor for the next page, if the server announced one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

impl From<HelixUser> for Creator {
    fn from(user: HelixUser) -> Self {
        Creator {
            login: user.login,
            display_name: user.display_name,
            broadcaster_id: user.id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixClip {
    pub id: String,
    pub url: String,
    pub broadcaster_id: String,
    #[serde(default)]
    pub creator_name: String,
    pub title: String,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub duration: f64,
    #[serde(default)]
    pub language: Option<String>,
}

impl From<HelixClip> for Clip {
    fn from(clip: HelixClip) -> Self {
        Clip {
            external_id: clip.id,
            title: clip.title,
            creator_name: clip.creator_name,
            view_count: clip.view_count,
            created_at: clip.created_at,
            broadcaster_id: clip.broadcaster_id,
            source_url: clip.url,
            duration_seconds: clip.duration.max(0.0),
            language: clip.language.filter(|l| !l.is_empty()),
        }
    }
}

/// Persisted-query GQL request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlRequest<'a, V: Serialize> {
    pub operation_name: &'a str,
    pub variables: V,
    pub query: &'a str,
    pub extensions: GqlExtensions<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlExtensions<'a> {
    pub persisted_query: PersistedQuery<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQuery<'a> {
    pub version: u32,
    pub sha256_hash: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlugVariables<'a> {
    pub slug: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GqlResponse<T> {
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipAccessData {
    #[serde(default)]
    pub clip: Option<ClipAccess>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipAccess {
    #[serde(default)]
    pub video_qualities: Vec<VideoQuality>,
    #[serde(default)]
    pub playback_access_token: Option<PlaybackAccessToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoQuality {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackAccessToken {
    pub signature: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helix_clip_page_decodes() {
        let body = r#"{
            "data": [{
                "id": "AwkwardHelplessSalamanderSwiftRage",
                "url": "https://clips.twitch.tv/AwkwardHelplessSalamanderSwiftRage",
                "embed_url": "https://clips.twitch.tv/embed?clip=AwkwardHelplessSalamanderSwiftRage",
                "broadcaster_id": "67955580",
                "broadcaster_name": "ChewieMelodies",
                "creator_id": "53834192",
                "creator_name": "BlackNova03",
                "video_id": "205586603",
                "game_id": "488191",
                "language": "en",
                "title": "babymetal",
                "view_count": 10,
                "created_at": "2017-11-30T22:34:18Z",
                "thumbnail_url": "https://clips-media-assets.twitch.tv/157589949-preview-480x272.jpg",
                "duration": 60.0,
                "vod_offset": 480,
                "is_featured": false
            }],
            "pagination": {"cursor": "eyJiIjpudWxsLCJhIjoiIn0"}
        }"#;

        let page: HelixPage<HelixClip> = serde_json::from_str(body).unwrap();
        assert_eq!(page.pagination.next_cursor(), Some("eyJiIjpudWxsLCJhIjoiIn0"));

        let clip: Clip = page.data.into_iter().next().unwrap().into();
        assert_eq!(clip.external_id, "AwkwardHelplessSalamanderSwiftRage");
        assert_eq!(clip.view_count, 10);
        assert_eq!(clip.duration_seconds, 60.0);
        assert_eq!(clip.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_empty_cursor_ends_pagination() {
        let page: HelixPage<HelixUser> =
            serde_json::from_str(r#"{"data": [], "pagination": {"cursor": ""}}"#).unwrap();
        assert_eq!(page.pagination.next_cursor(), None);

        let page: HelixPage<HelixUser> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(page.pagination.next_cursor(), None);
    }

    #[test]
    fn test_gql_request_shape() {
        let request = GqlRequest {
            operation_name: "VideoAccessToken_Clip",
            variables: SlugVariables { slug: "abc" },
            query: "query",
            extensions: GqlExtensions {
                persisted_query: PersistedQuery {
                    version: 1,
                    sha256_hash: "hash",
                },
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operationName"], "VideoAccessToken_Clip");
        assert_eq!(value["variables"]["slug"], "abc");
        assert_eq!(value["extensions"]["persistedQuery"]["sha256Hash"], "hash");
    }
}
