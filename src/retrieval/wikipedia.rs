//! Encyclopedia reference fetcher
//!
//! Information Hiding:
//! - Page URL construction and HTML scraping hidden behind `fetch()`
//! - Failures are classified and logged here, callers only see an empty
//!   snippet

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{Html, Selector};

use super::ReferenceFetcher;
use crate::config::RetrievalConfig;
use crate::core::error::RetrievalError;

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid citation regex"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));

pub struct WikipediaFetcher {
    client: Client,
    base_url: String,
}

impl WikipediaFetcher {
    pub fn new(client: Client, config: &RetrievalConfig) -> Self {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    pub fn page_url(&self, keyword: &str) -> Result<Url, RetrievalError> {
        if keyword.is_empty() || keyword.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RetrievalError::InvalidUrl(keyword.to_string()));
        }
        Url::parse(&format!("{}{}", self.base_url, keyword))
            .map_err(|_| RetrievalError::InvalidUrl(keyword.to_string()))
    }

    /// Fetch and clean the page, surfacing the failure cause.
    pub async fn try_fetch(&self, keyword: &str, max_len: usize) -> Result<String, RetrievalError> {
        let url = self.page_url(keyword)?;

        tracing::debug!("[WikipediaFetcher] GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(clean_paragraphs(&html, max_len))
    }
}

#[async_trait]
impl ReferenceFetcher for WikipediaFetcher {
    async fn fetch(&self, keyword: &str, max_len: usize) -> String {
        match self.try_fetch(keyword, max_len).await {
            Ok(snippet) => {
                tracing::info!(
                    "[WikipediaFetcher] Retrieved {} chars for '{}'",
                    snippet.chars().count(),
                    keyword
                );
                snippet
            }
            Err(e) => {
                tracing::warn!(
                    "[WikipediaFetcher] Retrieval for '{}' failed ({}): {}",
                    keyword,
                    e.cause(),
                    e
                );
                String::new()
            }
        }
    }
}

/// Concatenate paragraph text in document order, drop newlines, non-breaking
/// spaces and bracketed citation markers, then cut to `max_len` characters.
pub fn clean_paragraphs(html: &str, max_len: usize) -> String {
    let document = Html::parse_document(html);

    let text: String = document
        .select(&PARAGRAPH)
        .flat_map(|p| p.text())
        .flat_map(str::chars)
        .filter(|c| *c != '\n' && *c != '\u{a0}')
        .collect();

    CITATION
        .replace_all(&text, "")
        .chars()
        .take(max_len)
        .collect()
}
