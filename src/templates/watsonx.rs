use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{TemplateRegistry, TemplateSummary};
use crate::core::auth::IamAuthenticator;
use crate::core::error::TemplateError;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AssetResult>,
}

#[derive(Debug, Deserialize)]
struct AssetResult {
    metadata: AssetMetadata,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    asset_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PromptAsset {
    prompt: PromptBody,
}

#[derive(Debug, Deserialize)]
struct PromptBody {
    #[serde(default)]
    input: Vec<Vec<String>>,
}

/// Project-scoped prompt template assets on the hosted platform.
pub struct WatsonxPromptRegistry {
    client: Client,
    auth: Arc<IamAuthenticator>,
    base_url: String,
    project_id: String,
}

impl WatsonxPromptRegistry {
    pub fn new(
        client: Client,
        auth: Arc<IamAuthenticator>,
        base_url: &str,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        }
    }

    async fn check(response: Response) -> Result<Response, TemplateError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TemplateError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TemplateRegistry for WatsonxPromptRegistry {
    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        let token = self.auth.bearer_token().await?;

        let response = self
            .client
            .post(format!("{}/v2/asset_types/wx_prompt/search", self.base_url))
            .query(&[("project_id", self.project_id.as_str())])
            .bearer_auth(token)
            .json(&json!({ "query": "asset.asset_type:wx_prompt" }))
            .send()
            .await
            .map_err(TemplateError::Request)?;

        let search: SearchResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TemplateError::Decode(e.to_string()))?;

        tracing::debug!("[WatsonxPromptRegistry] Listed {} templates", search.results.len());

        Ok(search
            .results
            .into_iter()
            .map(|r| TemplateSummary {
                id: r.metadata.asset_id,
                name: r.metadata.name,
            })
            .collect())
    }

    async fn load(&self, id: &str) -> Result<String, TemplateError> {
        let token = self.auth.bearer_token().await?;

        let response = self
            .client
            .get(format!("{}/v1/prompts/{}", self.base_url, id))
            .query(&[("project_id", self.project_id.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(TemplateError::Request)?;

        let asset: PromptAsset = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TemplateError::Decode(e.to_string()))?;

        asset
            .prompt
            .input
            .into_iter()
            .next()
            .and_then(|pair| pair.into_iter().next())
            .ok_or_else(|| TemplateError::Decode(format!("prompt '{}' has no input text", id)))
    }
}
