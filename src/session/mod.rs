//! Tutoring session orchestration
//!
//! A session owns one conversation scoped to a (mode, age) profile and
//! drives every turn through the inference gateway, optionally augmenting
//! the question with reference text first.
//!
//! States: `Uninitialized -> Ready(profile)`, `Ready -> Thinking -> Ready`
//! for each turn, and `Closed` after teardown. A profile change while
//! `Ready` replaces the conversation with a fresh system message.

pub mod registry;

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{Credentials, RetrievalConfig, Settings};
use crate::core::auth::IamAuthenticator;
use crate::core::error::{InferenceError, SessionError};
use crate::core::http::build_client;
use crate::core::message::{Conversation, Message};
use crate::core::profile::Profile;
use crate::inference::InferenceGateway;
use crate::retrieval::{
    extract_keyword, keyword_prompt, ReferenceFetcher, RetrievalResult, WikipediaFetcher,
};
use crate::speech::{Audio, SpeechSynthesizer, WatsonTextToSpeech};
use crate::templates::{PromptTemplateStore, WatsonxPromptRegistry};

pub use registry::SessionRegistry;

/// Collaborators a session talks to. Built per session, never shared.
pub struct SessionServices {
    pub gateway: InferenceGateway,
    pub templates: PromptTemplateStore,
    pub fetcher: Box<dyn ReferenceFetcher>,
    pub speech: Box<dyn SpeechSynthesizer>,
}

impl SessionServices {
    pub fn from_settings(settings: &Settings, credentials: &Credentials) -> reqwest::Result<Self> {
        let client = build_client(&settings.http)?;

        let watsonx_auth = Arc::new(IamAuthenticator::new(
            client.clone(),
            &settings.auth.iam_url,
            &credentials.api_key,
        ));
        let speech_auth = Arc::new(IamAuthenticator::new(
            client.clone(),
            &settings.auth.iam_url,
            &credentials.iam_auth,
        ));

        let gateway = InferenceGateway::from_config(
            &settings.inference,
            client.clone(),
            credentials.use_local_inference,
            watsonx_auth.clone(),
            &credentials.project_id,
        );

        let registry = Arc::new(WatsonxPromptRegistry::new(
            client.clone(),
            watsonx_auth,
            &settings.templates.registry_url,
            credentials.project_id.clone(),
        ));

        Ok(Self {
            gateway,
            templates: PromptTemplateStore::new(registry, &settings.templates),
            fetcher: Box::new(WikipediaFetcher::new(client.clone(), &settings.retrieval)),
            speech: Box::new(WatsonTextToSpeech::new(client, speech_auth, &settings.speech)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub use_rag: bool,
    pub max_len: usize,
}

impl SessionOptions {
    pub fn from_config(config: &RetrievalConfig, use_rag: bool) -> Self {
        Self {
            use_rag,
            max_len: config.max_len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready(Profile),
    Thinking(Profile),
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "Uninitialized"),
            SessionState::Ready(p) => write!(f, "Ready[{}]", p),
            SessionState::Thinking(p) => write!(f, "Thinking[{}]", p),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    pub retrieval: Option<RetrievalResult>,
    /// Set when retrieval was requested but the keyword request failed.
    pub retrieval_skipped: Option<String>,
}

pub struct Session {
    id: String,
    state: SessionState,
    conversation: Option<Conversation>,
    services: SessionServices,
    options: SessionOptions,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(id: impl Into<String>, services: SessionServices, options: SessionOptions) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Uninitialized,
            conversation: None,
            services,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> Option<Profile> {
        match self.state {
            SessionState::Ready(p) | SessionState::Thinking(p) => Some(p),
            _ => None,
        }
    }

    pub fn history(&self) -> &[Message] {
        self.conversation
            .as_ref()
            .map(Conversation::messages)
            .unwrap_or(&[])
    }

    pub fn backend_name(&self) -> &str {
        self.services.gateway.backend_name()
    }

    pub fn use_rag(&self) -> bool {
        self.options.use_rag
    }

    pub fn set_use_rag(&mut self, enabled: bool) {
        self.options.use_rag = enabled;
    }

    /// Banner shown ahead of the history for the current mode.
    pub fn help_message(&self) -> Option<String> {
        self.profile().map(|p| p.mode.help_message())
    }

    /// Token that aborts an in-flight turn. Cancelled on teardown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// "Read aloud" and "start new conversation" need a real exchange.
    pub fn has_exchange(&self) -> bool {
        self.conversation
            .as_ref()
            .is_some_and(Conversation::has_exchange)
    }

    /// Apply the profile currently selected by the user. The first call
    /// loads the persona templates; later calls reset the conversation only
    /// when mode or age differ. Returns whether the history was reset.
    pub async fn observe_profile(&mut self, profile: Profile) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Closed => Err(SessionError::Closed),
            SessionState::Ready(current) | SessionState::Thinking(current)
                if current == profile =>
            {
                Ok(false)
            }
            SessionState::Uninitialized => {
                self.services.templates.preload().await?;
                self.reset(profile).await?;
                tracing::info!("[Session {}] Initialized for {}", self.id, profile);
                Ok(true)
            }
            _ => {
                self.reset(profile).await?;
                tracing::info!("[Session {}] Profile changed to {}", self.id, profile);
                Ok(true)
            }
        }
    }

    /// Discard the history and start over with the same profile.
    /// No-op until at least one exchange has happened.
    pub async fn start_new_conversation(&mut self) -> Result<bool, SessionError> {
        let Some(profile) = self.profile() else {
            return Err(self.unavailable());
        };
        if !self.has_exchange() {
            return Ok(false);
        }
        self.reset(profile).await?;
        tracing::info!("[Session {}] Started new conversation", self.id);
        Ok(true)
    }

    /// Synthesize the most recent assistant reply. `None` when there is
    /// nothing to read yet.
    pub async fn read_aloud(&self) -> Result<Option<Audio>, SessionError> {
        if self.profile().is_none() {
            return Err(self.unavailable());
        }
        if !self.has_exchange() {
            return Ok(None);
        }
        let Some(reply) = self.conversation.as_ref().and_then(Conversation::last_assistant)
        else {
            return Ok(None);
        };

        let audio = self.services.speech.synthesize(&reply.content).await?;
        Ok(Some(audio))
    }

    /// Run one turn. On failure the history is rolled back to what it was
    /// before the prompt was submitted.
    pub async fn submit(&mut self, prompt: &str) -> Result<Turn, SessionError> {
        let profile = match self.state {
            SessionState::Ready(p) => p,
            _ => return Err(self.unavailable()),
        };
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        let conversation = self
            .conversation
            .as_mut()
            .ok_or(SessionError::Uninitialized)?;

        let checkpoint = conversation.len();
        conversation.push_user(prompt);
        self.state = SessionState::Thinking(profile);

        let cancel = self.cancel.clone();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SessionError::Cancelled),
            turn = run_turn(conversation, &self.services, self.options, prompt) => turn,
        };

        self.state = SessionState::Ready(profile);

        if let Err(e) = &result {
            conversation.rollback_to(checkpoint);
            tracing::warn!("[Session {}] Turn failed, history kept: {}", self.id, e);
        }

        result
    }

    /// Tear the session down, aborting any in-flight turn.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.conversation = None;
        self.state = SessionState::Closed;
        tracing::info!("[Session {}] Closed", self.id);
    }

    async fn reset(&mut self, profile: Profile) -> Result<(), SessionError> {
        let template = self.services.templates.load(profile.mode).await?;
        self.conversation = Some(Conversation::new(profile.system_prompt(template)));
        self.state = SessionState::Ready(profile);
        Ok(())
    }

    fn unavailable(&self) -> SessionError {
        match self.state {
            SessionState::Closed => SessionError::Closed,
            _ => SessionError::Uninitialized,
        }
    }
}

async fn run_turn(
    conversation: &mut Conversation,
    services: &SessionServices,
    options: SessionOptions,
    prompt: &str,
) -> Result<Turn, SessionError> {
    let (retrieval, retrieval_skipped) = if options.use_rag {
        match retrieve(services, prompt, options.max_len).await {
            Ok(result) => (result, None),
            Err(e) => {
                tracing::warn!("[Retrieval] Keyword request failed, answering without it: {}", e);
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };

    let reply = match &retrieval {
        Some(result) => {
            let reply = {
                let augmented = conversation.augment_last_user(result.augment(prompt));
                services.gateway.infer(augmented.messages()).await?
            };
            conversation.push_info(result.info_message());
            reply
        }
        None => services.gateway.infer(conversation.messages()).await?,
    };

    conversation.push_assistant(reply.clone());
    Ok(Turn {
        reply,
        retrieval,
        retrieval_skipped,
    })
}

/// Ask the model for a reference page, then fetch it. `Ok(None)` means no
/// usable keyword came back and the turn proceeds without augmentation.
async fn retrieve(
    services: &SessionServices,
    prompt: &str,
    max_len: usize,
) -> Result<Option<RetrievalResult>, InferenceError> {
    let request = [Message::user(keyword_prompt(prompt))];
    let response = services.gateway.infer(&request).await?;

    let keyword = extract_keyword(&response);
    if keyword.is_empty() {
        tracing::debug!("[Retrieval] No usable keyword in {:?}", response);
        return Ok(None);
    }

    let snippet = services.fetcher.fetch(&keyword, max_len).await;
    let result = RetrievalResult::new(keyword, snippet);
    tracing::info!(
        "[Retrieval] keyword '{}' status {}",
        result.keyword,
        result.status
    );
    Ok(Some(result))
}
