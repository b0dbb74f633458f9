use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub inference: InferenceConfig,
    pub retrieval: RetrievalConfig,
    pub templates: TemplateConfig,
    pub speech: SpeechConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub local_base_url: String,
    pub local_api_key: String,
    pub local_model: String,
    pub hosted_url: String,
    pub hosted_model_id: String,
    pub hosted_api_version: String,
    pub decoding_method: String,
    pub max_tokens: u32,
    pub guardrails: bool,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            local_base_url: "http://localhost:8000/v1".to_string(),
            local_api_key: "EMPTY".to_string(),
            local_model: "ibm-granite/granite-7b-instruct".to_string(),
            hosted_url: "https://eu-gb.ml.cloud.ibm.com".to_string(),
            hosted_model_id: "ibm/granite-13b-chat-v2".to_string(),
            hosted_api_version: "2023-05-29".to_string(),
            decoding_method: "greedy".to_string(),
            max_tokens: 512,
            guardrails: true,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub base_url: String,
    pub max_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/wiki/".to_string(),
            max_len: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub registry_url: String,
    pub student_name: String,
    pub parent_name: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            registry_url: "https://api.eu-gb.dataplatform.cloud.ibm.com".to_string(),
            student_name: "student".to_string(),
            parent_name: "parent".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub service_url: String,
    pub voice: String,
    pub accept: String,
    pub output_path: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            service_url: "https://api.eu-gb.text-to-speech.watson.cloud.ibm.com".to_string(),
            voice: "en-US_LisaV3Voice".to_string(),
            accept: "audio/mp3".to_string(),
            output_path: "audio.mp3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub iam_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            iam_url: "https://iam.cloud.ibm.com/identity/token".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("TCHAI").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

/// Startup parameters that select the inference backend and authenticate
/// against the hosted services.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub use_local_inference: bool,
    pub project_id: String,
    pub api_key: String,
    pub iam_auth: String,
}
