//! Inference Gateway
//!
//! Information Hiding:
//! - Which backend serves completions is fixed when the gateway is built
//! - Retry and backoff for transient failures hidden behind `infer()`
//! - Wire formats live in the backend implementations

pub mod openai;
pub mod watsonx;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::InferenceConfig;
use crate::core::auth::IamAuthenticator;
use crate::core::error::InferenceError;
use crate::core::message::Message;

pub use openai::OpenAiCompatibleBackend;
pub use watsonx::WatsonxBackend;

/// A model endpoint that turns a message history into one completion.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn infer(&self, history: &[Message]) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// `max_retries` counts retries, so the first call comes on top.
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            max_attempts: config.max_retries.saturating_add(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

pub struct InferenceGateway {
    backend: Box<dyn InferenceBackend>,
    retry: RetryPolicy,
}

impl InferenceGateway {
    pub fn new(backend: Box<dyn InferenceBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Build the gateway for the backend chosen at startup.
    pub fn from_config(
        config: &InferenceConfig,
        client: reqwest::Client,
        use_local_inference: bool,
        auth: Arc<IamAuthenticator>,
        project_id: &str,
    ) -> Self {
        let backend: Box<dyn InferenceBackend> = if use_local_inference {
            Box::new(OpenAiCompatibleBackend::new(client, config))
        } else {
            Box::new(WatsonxBackend::new(client, auth, config, project_id))
        };
        Self::new(backend, RetryPolicy::from_config(config))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn infer(&self, history: &[Message]) -> Result<String, InferenceError> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.retry.delay_before(attempt);
                tracing::warn!(
                    "[InferenceGateway] Retrying {} call (attempt {}/{}) after {}ms delay",
                    self.backend.name(),
                    attempt + 1,
                    self.retry.max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            match self.backend.infer(history).await {
                Ok(text) => {
                    tracing::debug!(
                        "[InferenceGateway] {} returned {} chars",
                        self.backend.name(),
                        text.len()
                    );
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    tracing::warn!("[InferenceGateway] Transient failure: {}", e);
                }
                Err(e) => {
                    tracing::error!("[InferenceGateway] {} failed: {}", self.backend.name(), e);
                    return Err(e);
                }
            }
        }
    }
}
