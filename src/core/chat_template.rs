//! Role-tagged flat-text encoding of a message history.
//!
//! Each message becomes `<|role|>\ncontent\n`, and the prompt ends with an
//! `<|assistant|>\n` cue. The same delimiters are stripped from persona
//! templates loaded from the registry.

use crate::core::message::{Message, Role};

pub fn role_tag(role: Role) -> String {
    format!("<|{}|>", role.as_str())
}

/// Serialize the whole history into a single generation prompt.
pub fn encode(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(&role_tag(message.role));
        prompt.push('\n');
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str(&role_tag(Role::Assistant));
    prompt.push('\n');
    prompt
}

/// Remove the system and assistant delimiters from raw template text.
pub fn strip_role_markers(raw: &str) -> String {
    raw.replace(&role_tag(Role::System), "")
        .replace(&role_tag(Role::Assistant), "")
        .trim()
        .to_string()
}
