//! Conversation state
//!
//! A conversation always starts with exactly one system message and only
//! grows through role-specific pushes, so the system message can never be
//! duplicated or moved away from index 0.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Record of what happened during a turn, e.g. which reference was used.
    Info,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Info => "info",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(Role::Info, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

#[allow(clippy::len_without_is_empty)]
impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True once at least one message beyond the system prompt exists.
    pub fn has_exchange(&self) -> bool {
        self.messages.len() > 1
    }

    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn push_info(&mut self, content: impl Into<String>) {
        self.messages.push(Message::info(content));
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Drop everything after the first `len` messages. The system message
    /// is always kept.
    pub fn rollback_to(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    /// Temporarily replace the content of the trailing user message.
    ///
    /// The original text comes back when the returned guard is dropped,
    /// including when the inference future holding it is cancelled. If the
    /// last message is not a user message nothing is replaced.
    pub fn augment_last_user(&mut self, content: String) -> AugmentGuard<'_> {
        let original = match self.messages.last_mut() {
            Some(last) if last.role == Role::User => {
                Some(std::mem::replace(&mut last.content, content))
            }
            _ => None,
        };
        AugmentGuard {
            conversation: self,
            original,
        }
    }
}

pub struct AugmentGuard<'a> {
    conversation: &'a mut Conversation,
    original: Option<String>,
}

impl AugmentGuard<'_> {
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_applied(&self) -> bool {
        self.original.is_some()
    }
}

impl Drop for AugmentGuard<'_> {
    fn drop(&mut self) {
        if let (Some(original), Some(last)) =
            (self.original.take(), self.conversation.messages.last_mut())
        {
            last.content = original;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_system_message() {
        let conversation = Conversation::new("You are a tutor.");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert!(!conversation.has_exchange());
    }

    #[test]
    fn augmentation_is_restored_on_drop() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("What is a planet?");

        {
            let guard = conversation
                .augment_last_user("Planets orbit stars.\nWhat is a planet?".to_string());
            assert!(guard.is_applied());
            assert_eq!(
                guard.messages()[1].content,
                "Planets orbit stars.\nWhat is a planet?"
            );
        }

        assert_eq!(conversation.messages()[1].content, "What is a planet?");
    }

    #[test]
    fn augmentation_requires_trailing_user_message() {
        let mut conversation = Conversation::new("sys");
        assert!(!conversation.augment_last_user("x".into()).is_applied());

        conversation.push_user("hi");
        conversation.push_assistant("hello");
        {
            let guard = conversation.augment_last_user("x".into());
            assert!(!guard.is_applied());
            assert_eq!(guard.messages()[2].content, "hello");
        }
        assert_eq!(conversation.messages()[2].content, "hello");
    }

    #[test]
    fn rollback_keeps_system_message() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("a");
        conversation.push_assistant("b");

        conversation.rollback_to(0);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.system_prompt(), "sys");
    }

    #[test]
    fn last_assistant_skips_info_records() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("q1");
        conversation.push_assistant("a1");
        conversation.push_user("q2");
        conversation.push_info("[with RAG keyword: 'X', retrieval status: FAILED]");

        assert_eq!(conversation.last_assistant().unwrap().content, "a1");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::info("x")).unwrap();
        assert_eq!(json, r#"{"role":"info","content":"x"}"#);
    }
}
