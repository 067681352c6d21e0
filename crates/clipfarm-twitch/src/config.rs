//! Twitch client configuration.

use std::time::Duration;

use crate::error::{TwitchError, TwitchResult};

/// Public client id used by the Twitch web player for GQL requests.
pub const DEFAULT_GQL_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";
const DEFAULT_GQL_URL: &str = "https://gql.twitch.tv/gql";

/// Twitch client configuration.
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    /// Application client id (Helix)
    pub client_id: String,
    /// Application client secret (Helix)
    pub client_secret: String,
    /// Client id sent with GQL requests
    pub gql_client_id: String,
    /// OAuth token endpoint
    pub auth_url: String,
    /// Helix base URL, without trailing slash
    pub helix_url: String,
    /// GQL endpoint
    pub gql_url: String,
    /// Clips requested per Helix page (max 100)
    pub page_size: u32,
    /// Upper bound on pages fetched per discovery
    pub max_pages: u32,
    /// Follow pagination cursors at all
    pub paginate: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl TwitchConfig {
    /// Config with production endpoints and default limits.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            gql_client_id: DEFAULT_GQL_CLIENT_ID.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            helix_url: DEFAULT_HELIX_URL.to_string(),
            gql_url: DEFAULT_GQL_URL.to_string(),
            page_size: 100,
            max_pages: 10,
            paginate: true,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Create config from environment variables.
    ///
    /// `TWITCH_CLIENT_ID` and `TWITCH_CLIENT_SECRET` are required.
    pub fn from_env() -> TwitchResult<Self> {
        let client_id = required_var("TWITCH_CLIENT_ID")?;
        let client_secret = required_var("TWITCH_CLIENT_SECRET")?;

        let mut config = Self::new(client_id, client_secret);
        if let Ok(id) = std::env::var("TWITCH_GQL_CLIENT_ID") {
            config.gql_client_id = id;
        }
        if let Ok(url) = std::env::var("TWITCH_AUTH_URL") {
            config.auth_url = url;
        }
        if let Ok(url) = std::env::var("TWITCH_HELIX_URL") {
            config.helix_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = std::env::var("TWITCH_GQL_URL") {
            config.gql_url = url;
        }
        config.page_size = std::env::var("TWITCH_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(|n: u32| n.clamp(1, 100))
            .unwrap_or(100);
        config.max_pages = std::env::var("TWITCH_MAX_PAGES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        config.paginate = std::env::var("TWITCH_PAGINATE")
            .ok()
            .map(|s| parse_flag(&s))
            .unwrap_or(true);
        config.request_timeout = Duration::from_secs(
            std::env::var("TWITCH_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );

        Ok(config)
    }

    /// Point every endpoint at one base URL (used with local mock servers).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{base}/oauth2/token");
        self.helix_url = format!("{base}/helix");
        self.gql_url = format!("{base}/gql");
        self
    }
}

fn required_var(name: &str) -> TwitchResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TwitchError::config(format!("{name} is not set"))),
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
    }

    #[test]
    fn test_with_base_url() {
        let config = TwitchConfig::new("id", "secret").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.auth_url, "http://127.0.0.1:9000/oauth2/token");
        assert_eq!(config.helix_url, "http://127.0.0.1:9000/helix");
        assert_eq!(config.gql_url, "http://127.0.0.1:9000/gql");
        assert_eq!(config.max_pages, 10);
        assert!(config.paginate);
    }
}
