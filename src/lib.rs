//! T-chai - curriculum tutoring assistant
//!
//! A chat session for students and parents that can augment questions with
//! encyclopedia context before asking a hosted or locally served model,
//! and read replies aloud on request.

pub mod config;
pub mod core;
pub mod inference;
pub mod retrieval;
pub mod session;
pub mod speech;
pub mod templates;
pub mod utils;

pub mod cli;

pub use config::{Credentials, Settings};

pub use core::error::{
    AuthError, InferenceError, RetrievalError, SessionError, SpeechError, TemplateError,
};
pub use core::message::{Conversation, Message, Role};
pub use core::profile::{AgeBracket, Mode, Profile};
pub use session::{Session, SessionOptions, SessionRegistry, SessionServices, SessionState, Turn};
