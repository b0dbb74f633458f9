//! Error types for each collaborator the session talks to.
//!
//! Retrieval failures never reach the user; they are classified here so the
//! fetcher can log the distinct cause before degrading to an empty snippet.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("IAM token request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("IAM token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode IAM token response: {0}")]
    Decode(String),
}

impl AuthError {
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Request(e) => is_transient_transport(e),
            AuthError::Status { status, .. } => is_transient_status(*status),
            AuthError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("inference backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode inference response: {0}")]
    Decode(String),

    #[error("inference backend returned no completion")]
    EmptyCompletion,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl InferenceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            InferenceError::Request(e) => is_transient_transport(e),
            InferenceError::Status { status, .. } => is_transient_status(*status),
            InferenceError::Auth(e) => e.is_transient(),
            InferenceError::Decode(_) | InferenceError::EmptyCompletion => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("keyword '{0}' does not form a valid page URL")]
    InvalidUrl(String),

    #[error("reference request timed out")]
    Timeout,

    #[error("could not connect to reference source: {0}")]
    Connect(String),

    #[error("reference source returned HTTP {0}")]
    Status(u16),

    #[error("could not read reference page: {0}")]
    Body(String),
}

impl RetrievalError {
    /// Short cause label used in logs.
    pub fn cause(&self) -> &'static str {
        match self {
            RetrievalError::InvalidUrl(_) => "invalid-url",
            RetrievalError::Timeout => "timeout",
            RetrievalError::Connect(_) => "connect",
            RetrievalError::Status(_) => "http-status",
            RetrievalError::Body(_) => "body",
        }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RetrievalError::Timeout
        } else if e.is_connect() {
            RetrievalError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            RetrievalError::Status(status.as_u16())
        } else if e.is_builder() {
            RetrievalError::InvalidUrl(e.to_string())
        } else {
            RetrievalError::Body(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template registry request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("template registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no prompt template named '{0}'")]
    NotFound(String),

    #[error("could not decode template registry response: {0}")]
    Decode(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("nothing to read aloud")]
    EmptyText,

    #[error("speech request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("speech service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not write audio: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has no profile yet")]
    Uninitialized,

    #[error("session is closed")]
    Closed,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("turn was cancelled")]
    Cancelled,

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

fn is_transient_transport(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_transient() {
        let throttled = InferenceError::Status {
            status: 429,
            body: String::new(),
        };
        let unavailable = InferenceError::Status {
            status: 503,
            body: String::new(),
        };
        let unauthorized = InferenceError::Status {
            status: 401,
            body: String::new(),
        };

        assert!(throttled.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!InferenceError::EmptyCompletion.is_transient());
    }

    #[test]
    fn retrieval_causes() {
        assert_eq!(RetrievalError::Status(404).cause(), "http-status");
        assert_eq!(RetrievalError::InvalidUrl("a b".into()).cause(), "invalid-url");
        assert_eq!(RetrievalError::Timeout.cause(), "timeout");
    }
}
