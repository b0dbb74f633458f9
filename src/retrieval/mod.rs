//! Retrieval-augmented prompting: keyword extraction and reference lookup.

pub mod keyword;
pub mod wikipedia;

use async_trait::async_trait;
use std::fmt;

pub use keyword::extract_keyword;
pub use wikipedia::WikipediaFetcher;

/// Instruction sent, as a single disposable user turn, to ask the model
/// which reference page answers the question.
pub fn keyword_prompt(question: &str) -> String {
    format!(
        "I want to find the best wikipedia page to answer this question: \"{}\". Reply a single word.",
        question
    )
}

/// Source of short reference snippets. Never fails: any problem yields an
/// empty string.
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, keyword: &str, max_len: usize) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStatus {
    Success,
    Failed,
}

impl fmt::Display for RetrievalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStatus::Success => write!(f, "SUCCESS"),
            RetrievalStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one turn's lookup. Lives only for that turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalResult {
    pub keyword: String,
    pub snippet: String,
    pub status: RetrievalStatus,
}

impl RetrievalResult {
    pub fn new(keyword: impl Into<String>, snippet: String) -> Self {
        let status = if snippet.is_empty() {
            RetrievalStatus::Failed
        } else {
            RetrievalStatus::Success
        };
        Self {
            keyword: keyword.into(),
            snippet,
            status,
        }
    }

    /// Reference text placed ahead of the user's question.
    pub fn augment(&self, prompt: &str) -> String {
        format!("{}\n{}", self.snippet, prompt)
    }

    /// Text of the info record appended to history after the turn.
    pub fn info_message(&self) -> String {
        format!(
            "[with RAG keyword: '{}', retrieval status: {}]",
            self.keyword, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_snippet() {
        assert_eq!(
            RetrievalResult::new("Planet", "text".into()).status,
            RetrievalStatus::Success
        );
        assert_eq!(
            RetrievalResult::new("Planet", String::new()).status,
            RetrievalStatus::Failed
        );
    }

    #[test]
    fn info_message_format() {
        let result = RetrievalResult::new("Planet", "Planets orbit.".into());
        assert_eq!(
            result.info_message(),
            "[with RAG keyword: 'Planet', retrieval status: SUCCESS]"
        );
        assert_eq!(result.augment("What is a planet?"), "Planets orbit.\nWhat is a planet?");
    }

    #[test]
    fn keyword_prompt_quotes_question() {
        assert_eq!(
            keyword_prompt("What is a planet?"),
            "I want to find the best wikipedia page to answer this question: \"What is a planet?\". Reply a single word."
        );
    }
}
