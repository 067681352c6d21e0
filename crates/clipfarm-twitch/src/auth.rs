//! App access token acquisition.

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::TwitchConfig;
use crate::error::{TwitchError, TwitchResult};
use crate::models::TokenResponse;

/// Client-credentials token provider with an in-memory cache.
///
/// The cached token is reused until a request reports it as rejected,
/// at which point callers [`invalidate`](Self::invalidate) it and fetch a
/// fresh one.
pub struct TokenProvider {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<String>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, config: &TwitchConfig) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            cached: Mutex::new(None),
        }
    }

    /// Application client id, sent alongside the bearer token.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Return the cached token, fetching one if needed.
    pub async fn token(&self) -> TwitchResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        debug!("Invalidating cached Twitch access token");
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> TwitchResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self.http.post(&self.auth_url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() {
            return Err(TwitchError::auth(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(TwitchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        if token.access_token.is_empty() {
            return Err(TwitchError::auth("token endpoint returned an empty token"));
        }

        info!(
            expires_in = token.expires_in.unwrap_or_default(),
            "Obtained Twitch app access token"
        );
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> TokenProvider {
        let config = TwitchConfig::new("my-client", "my-secret").with_base_url(&server.uri());
        TokenProvider::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=my-client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc123",
                "expires_in": 5000000,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert_eq!(provider.token().await.unwrap(), "abc123");
        assert_eq!(provider.token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "fresh" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server);
        provider.token().await.unwrap();
        provider.invalidate().await;
        provider.token().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_map_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid client secret"))
            .mount(&server)
            .await;

        let err = provider(&server).token().await.unwrap_err();
        assert!(matches!(err, TwitchError::Auth(_)));
    }
}
