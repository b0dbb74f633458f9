//! IAM bearer-token exchange for the hosted services.
//!
//! Information Hiding:
//! - Token caching and expiry tracking hidden behind `bearer_token()`
//! - Callers never see the API key once the authenticator is built

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::error::AuthError;

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct IamAuthenticator {
    client: Client,
    token_url: String,
    api_key: String,
    cached: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    pub fn new(client: Client, token_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            api_key: api_key.into(),
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, exchanging the API key when the cached
    /// one is missing or about to expire.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("[IamAuthenticator] Requesting new access token");

        let response = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[("grant_type", GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(AuthError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn token_is_cached_until_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(body_string_contains("apikey=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = IamAuthenticator::new(
            Client::new(),
            format!("{}/identity/token", server.uri()),
            "secret",
        );

        assert_eq!(auth.bearer_token().await.unwrap(), "tok-1");
        assert_eq!(auth.bearer_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn rejected_key_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad apikey"))
            .mount(&server)
            .await;

        let auth = IamAuthenticator::new(Client::new(), server.uri(), "wrong");
        let err = auth.bearer_token().await.unwrap_err();

        assert!(matches!(err, AuthError::Status { status: 400, .. }));
        assert!(!err.is_transient());
    }
}
