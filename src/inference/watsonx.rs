use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::InferenceBackend;
use crate::config::InferenceConfig;
use crate::core::auth::IamAuthenticator;
use crate::core::chat_template;
use crate::core::error::InferenceError;
use crate::core::message::Message;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    input: String,
    parameters: GenerationParameters<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    moderations: Option<Moderations>,
}

#[derive(Debug, Serialize)]
struct GenerationParameters<'a> {
    decoding_method: &'a str,
    max_new_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Moderations {
    hap: ModerationToggle,
}

#[derive(Debug, Serialize)]
struct ModerationToggle {
    input: Enabled,
    output: Enabled,
}

#[derive(Debug, Serialize)]
struct Enabled {
    enabled: bool,
}

impl Moderations {
    fn guardrails() -> Self {
        Self {
            hap: ModerationToggle {
                input: Enabled { enabled: true },
                output: Enabled { enabled: true },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

/// Hosted foundation-model text generation. The history is flattened with
/// the role-tagged chat template before submission.
pub struct WatsonxBackend {
    client: Client,
    auth: Arc<IamAuthenticator>,
    url: String,
    api_version: String,
    model_id: String,
    project_id: String,
    decoding_method: String,
    max_new_tokens: u32,
    guardrails: bool,
}

impl WatsonxBackend {
    pub fn new(
        client: Client,
        auth: Arc<IamAuthenticator>,
        config: &InferenceConfig,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth,
            url: config.hosted_url.trim_end_matches('/').to_string(),
            api_version: config.hosted_api_version.clone(),
            model_id: config.hosted_model_id.clone(),
            project_id: project_id.into(),
            decoding_method: config.decoding_method.clone(),
            max_new_tokens: config.max_tokens,
            guardrails: config.guardrails,
        }
    }
}

#[async_trait]
impl InferenceBackend for WatsonxBackend {
    fn name(&self) -> &str {
        "watsonx"
    }

    async fn infer(&self, history: &[Message]) -> Result<String, InferenceError> {
        let token = self.auth.bearer_token().await?;

        let request = GenerationRequest {
            model_id: &self.model_id,
            project_id: &self.project_id,
            input: chat_template::encode(history),
            parameters: GenerationParameters {
                decoding_method: &self.decoding_method,
                max_new_tokens: self.max_new_tokens,
            },
            moderations: self.guardrails.then(Moderations::guardrails),
        };

        let response = self
            .client
            .post(format!("{}/ml/v1/text/generation", self.url))
            .query(&[("version", self.api_version.as_str())])
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(InferenceError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let generation = response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        generation
            .results
            .into_iter()
            .next()
            .map(|r| r.generated_text)
            .ok_or(InferenceError::EmptyCompletion)
    }
}
