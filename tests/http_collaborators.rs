//! HTTP collaborators against local mock servers
//!
//! These tests verify request shapes and failure mapping without touching
//! the real hosted services.

use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_exists, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tchai::config::{HttpConfig, InferenceConfig, RetrievalConfig, SpeechConfig};
use tchai::core::auth::IamAuthenticator;
use tchai::core::http::build_client;
use tchai::inference::{InferenceBackend, OpenAiCompatibleBackend, WatsonxBackend};
use tchai::retrieval::{ReferenceFetcher, WikipediaFetcher};
use tchai::speech::{SpeechSynthesizer, WatsonTextToSpeech};
use tchai::templates::{TemplateRegistry, WatsonxPromptRegistry};
use tchai::{InferenceError, Message, RetrievalError, TemplateError};

const PLANET_PAGE: &str = r#"<html><body>
<table><tr><td>Infobox text</td></tr></table>
<p>A <a href="/wiki/Planet">planet</a> is a large, rounded astronomical body.[1]</p>
<p>Planets orbit stars.[2][note 1]</p>
</body></html>"#;

async fn mount_iam(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn authenticator(server: &MockServer) -> Arc<IamAuthenticator> {
    Arc::new(IamAuthenticator::new(
        Client::new(),
        format!("{}/identity/token", server.uri()),
        "api-key",
    ))
}

fn history() -> Vec<Message> {
    vec![
        Message::system("Be kind."),
        Message::user("What is a planet?"),
        Message::info("[with RAG keyword: 'Planet', retrieval status: SUCCESS]"),
    ]
}

#[tokio::test]
async fn openai_backend_posts_full_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer EMPTY"))
        .and(body_partial_json(json!({
            "model": "ibm-granite/granite-7b-instruct",
            "max_tokens": 512,
            "messages": [
                {"role": "system", "content": "Be kind."},
                {"role": "user", "content": "What is a planet?"},
                {"role": "info", "content": "[with RAG keyword: 'Planet', retrieval status: SUCCESS]"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "A round body."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = InferenceConfig {
        local_base_url: format!("{}/v1", server.uri()),
        ..InferenceConfig::default()
    };
    let backend = OpenAiCompatibleBackend::new(Client::new(), &config);

    assert_eq!(backend.infer(&history()).await.unwrap(), "A round body.");
}

#[tokio::test]
async fn openai_backend_maps_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
        .mount(&server)
        .await;

    let config = InferenceConfig {
        local_base_url: format!("{}/v1", server.uri()),
        ..InferenceConfig::default()
    };
    let backend = OpenAiCompatibleBackend::new(Client::new(), &config);
    let err = backend.infer(&history()).await.unwrap_err();

    assert!(matches!(err, InferenceError::Status { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn watsonx_backend_sends_encoded_prompt_with_guardrails() {
    let server = MockServer::start().await;
    mount_iam(&server).await;
    Mock::given(method("POST"))
        .and(path("/ml/v1/text/generation"))
        .and(query_param("version", "2023-05-29"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "model_id": "ibm/granite-13b-chat-v2",
            "project_id": "proj-1",
            "input": "<|system|>\nBe kind.\n<|user|>\nWhat is a planet?\n<|info|>\n[with RAG keyword: 'Planet', retrieval status: SUCCESS]\n<|assistant|>\n",
            "parameters": {"decoding_method": "greedy", "max_new_tokens": 512},
            "moderations": {"hap": {"input": {"enabled": true}, "output": {"enabled": true}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"generated_text": "A round body.", "stop_reason": "eos_token"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = InferenceConfig {
        hosted_url: server.uri(),
        ..InferenceConfig::default()
    };
    let backend = WatsonxBackend::new(Client::new(), authenticator(&server), &config, "proj-1");

    assert_eq!(backend.infer(&history()).await.unwrap(), "A round body.");
}

#[tokio::test]
async fn watsonx_backend_reports_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let config = InferenceConfig {
        hosted_url: server.uri(),
        ..InferenceConfig::default()
    };
    let backend = WatsonxBackend::new(Client::new(), authenticator(&server), &config, "proj-1");

    assert!(matches!(
        backend.infer(&history()).await,
        Err(InferenceError::Auth(_))
    ));
}

#[tokio::test]
async fn wikipedia_fetcher_extracts_paragraphs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Planet"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLANET_PAGE))
        .mount(&server)
        .await;

    let config = RetrievalConfig {
        base_url: format!("{}/wiki/", server.uri()),
        ..RetrievalConfig::default()
    };
    let client = build_client(&HttpConfig::default()).unwrap();
    let fetcher = WikipediaFetcher::new(client, &config);

    assert_eq!(
        fetcher.fetch("Planet", 1024).await,
        "A planet is a large, rounded astronomical body.Planets orbit stars."
    );
    assert_eq!(fetcher.fetch("Planet", 8).await, "A planet");
}

#[tokio::test]
async fn wikipedia_fetcher_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Plannet"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = RetrievalConfig {
        base_url: format!("{}/wiki/", server.uri()),
        ..RetrievalConfig::default()
    };
    let fetcher = WikipediaFetcher::new(Client::new(), &config);

    assert_eq!(fetcher.fetch("Plannet", 1024).await, "");
    assert!(matches!(
        fetcher.try_fetch("Plannet", 1024).await,
        Err(RetrievalError::Status(404))
    ));
    assert_eq!(fetcher.fetch("Solar System", 1024).await, "");
    assert_eq!(fetcher.fetch("", 1024).await, "");
}

#[tokio::test]
async fn wikipedia_fetcher_survives_unreachable_host() {
    let config = RetrievalConfig {
        base_url: "http://127.0.0.1:1/wiki/".to_string(),
        ..RetrievalConfig::default()
    };
    let fetcher = WikipediaFetcher::new(Client::new(), &config);

    assert_eq!(fetcher.fetch("Planet", 1024).await, "");
    assert!(matches!(
        fetcher.try_fetch("Planet", 1024).await,
        Err(RetrievalError::Connect(_))
    ));
}

#[tokio::test]
async fn prompt_registry_lists_and_loads() {
    let server = MockServer::start().await;
    mount_iam(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/asset_types/wx_prompt/search"))
        .and(query_param("project_id", "proj-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 2,
            "results": [
                {"metadata": {"asset_id": "a-1", "name": "student"}},
                {"metadata": {"asset_id": "a-2", "name": "parent"}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/prompts/a-2"))
        .and(query_param("project_id", "proj-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prompt": {"input": [["<|system|>\nHelp a parent of a child aged {age}.\n<|assistant|>", ""]]}
        })))
        .mount(&server)
        .await;

    let registry =
        WatsonxPromptRegistry::new(Client::new(), authenticator(&server), &server.uri(), "proj-1");

    let listed = registry.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].name, "parent");

    let raw = registry.load("a-2").await.unwrap();
    assert!(raw.starts_with("<|system|>"));
}

#[tokio::test]
async fn prompt_registry_maps_missing_template() {
    let server = MockServer::start().await;
    mount_iam(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/prompts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let registry =
        WatsonxPromptRegistry::new(Client::new(), authenticator(&server), &server.uri(), "proj-1");

    assert!(matches!(
        registry.load("missing").await,
        Err(TemplateError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn text_to_speech_returns_audio_bytes() {
    let server = MockServer::start().await;
    mount_iam(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/synthesize"))
        .and(query_param("voice", "en-US_LisaV3Voice"))
        .and(header("accept", "audio/mp3"))
        .and(body_string_contains("Planets orbit stars."))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mp3")
                .set_body_bytes(vec![0x49, 0x44, 0x33, 0x04]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = SpeechConfig {
        service_url: server.uri(),
        ..SpeechConfig::default()
    };
    let tts = WatsonTextToSpeech::new(Client::new(), authenticator(&server), &config);

    let audio = tts.synthesize("Planets orbit stars.").await.unwrap();
    assert_eq!(audio.format, "audio/mp3");
    assert_eq!(audio.bytes, vec![0x49, 0x44, 0x33, 0x04]);
}
