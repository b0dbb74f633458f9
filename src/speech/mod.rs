//! Text-to-speech for the "read aloud" action.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::config::SpeechConfig;
use crate::core::auth::IamAuthenticator;
use crate::core::error::SpeechError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    pub format: String,
    pub bytes: Vec<u8>,
}

impl Audio {
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SpeechError> {
        tokio::fs::write(path, &self.bytes).await?;
        Ok(())
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Audio, SpeechError>;
}

/// Hosted text-to-speech with a fixed voice and audio format.
pub struct WatsonTextToSpeech {
    client: Client,
    auth: Arc<IamAuthenticator>,
    service_url: String,
    voice: String,
    accept: String,
}

impl WatsonTextToSpeech {
    pub fn new(client: Client, auth: Arc<IamAuthenticator>, config: &SpeechConfig) -> Self {
        Self {
            client,
            auth,
            service_url: config.service_url.trim_end_matches('/').to_string(),
            voice: config.voice.clone(),
            accept: config.accept.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for WatsonTextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Audio, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let token = self.auth.bearer_token().await?;

        tracing::info!(
            "[WatsonTextToSpeech] Synthesizing {} chars with {}",
            text.chars().count(),
            self.voice
        );

        let response = self
            .client
            .post(format!("{}/v1/synthesize", self.service_url))
            .query(&[("voice", self.voice.as_str())])
            .header("Accept", self.accept.as_str())
            .bearer_auth(token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(SpeechError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(SpeechError::Request)?;

        Ok(Audio {
            format: self.accept.clone(),
            bytes: bytes.to_vec(),
        })
    }
}
