//! In-Memory Template Registry
//!
//! Information Hiding:
//! - HashMap storage structure hidden from users
//! - Thread-safe access via RwLock hidden behind async interface
//! - Suitable for testing and offline sessions

use super::{TemplateRegistry, TemplateSummary};
use crate::core::error::TemplateError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Templates keyed by id; the id is derived from the template name.
pub struct InMemoryRegistry {
    templates: RwLock<BTreeMap<String, (String, String)>>,
    loads: AtomicUsize,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(BTreeMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        self.templates
            .get_mut()
            .insert(format!("mem-{}", name), (name, text.into()));
        self
    }

    pub async fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let mut templates = self.templates.write().await;
        templates.insert(format!("mem-{}", name), (name, text.into()));
    }

    /// Number of `load` calls served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRegistry for InMemoryRegistry {
    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        let templates = self.templates.read().await;
        let summaries: Vec<TemplateSummary> = templates
            .iter()
            .map(|(id, (name, _))| TemplateSummary {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();
        tracing::debug!("[InMemoryRegistry] Listed {} templates", summaries.len());
        Ok(summaries)
    }

    async fn load(&self, id: &str) -> Result<String, TemplateError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let templates = self.templates.read().await;
        templates
            .get(id)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_load() {
        let registry = InMemoryRegistry::new().with_template("student", "Hello {age}");
        registry.insert("parent", "Dear parent").await;

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 2);

        let parent = listed.iter().find(|t| t.name == "parent").unwrap();
        assert_eq!(registry.load(&parent.id).await.unwrap(), "Dear parent");
    }

    #[tokio::test]
    async fn test_load_unknown_id() {
        let registry = InMemoryRegistry::new();
        assert!(matches!(
            registry.load("nope").await,
            Err(TemplateError::NotFound(_))
        ));
    }
}
