//! Persona prompt templates
//!
//! Information Hiding:
//! - Registry protocol hidden behind `TemplateRegistry`
//! - Cached per store, so each persona is fetched at most once per session

pub mod memory;
pub mod watsonx;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::TemplateConfig;
use crate::core::chat_template::strip_role_markers;
use crate::core::error::TemplateError;
use crate::core::profile::Mode;

pub use memory::InMemoryRegistry;
pub use watsonx::WatsonxPromptRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
}

/// External store of named prompt templates.
#[async_trait]
pub trait TemplateRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError>;

    /// Raw template text, role delimiters included.
    async fn load(&self, id: &str) -> Result<String, TemplateError>;
}

pub struct PromptTemplateStore {
    registry: Arc<dyn TemplateRegistry>,
    names: HashMap<Mode, String>,
    cache: HashMap<Mode, String>,
}

impl PromptTemplateStore {
    pub fn new(registry: Arc<dyn TemplateRegistry>, config: &TemplateConfig) -> Self {
        let names = HashMap::from([
            (Mode::Student, config.student_name.clone()),
            (Mode::Parent, config.parent_name.clone()),
        ]);
        Self {
            registry,
            names,
            cache: HashMap::new(),
        }
    }

    /// Template for `mode` with role markers stripped and `{age}` unresolved.
    pub async fn load(&mut self, mode: Mode) -> Result<&str, TemplateError> {
        if !self.cache.contains_key(&mode) {
            let template = self.fetch(mode).await?;
            self.cache.insert(mode, template);
        }
        Ok(self.cache[&mode].as_str())
    }

    /// Load every persona up front.
    pub async fn preload(&mut self) -> Result<(), TemplateError> {
        for mode in Mode::ALL {
            self.load(mode).await?;
        }
        Ok(())
    }

    pub fn cached(&self, mode: Mode) -> Option<&str> {
        self.cache.get(&mode).map(String::as_str)
    }

    async fn fetch(&self, mode: Mode) -> Result<String, TemplateError> {
        let name = self
            .names
            .get(&mode)
            .map(String::as_str)
            .unwrap_or_else(|| mode.persona());

        let templates = self.registry.list().await?;
        let summary = templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        tracing::info!(
            "[PromptTemplateStore] Loading template '{}' ({}) for {}",
            summary.name,
            summary.id,
            mode.persona()
        );

        let raw = self.registry.load(&summary.id).await?;
        Ok(strip_role_markers(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(registry: Arc<InMemoryRegistry>) -> PromptTemplateStore {
        PromptTemplateStore::new(registry, &TemplateConfig::default())
    }

    #[tokio::test]
    async fn loads_and_strips_markers() {
        let registry = Arc::new(
            InMemoryRegistry::new()
                .with_template("student", "<|system|>\nTeach a student aged {age}.\n<|assistant|>"),
        );
        let mut store = store(registry);

        let template = store.load(Mode::Student).await.unwrap();
        assert_eq!(template, "Teach a student aged {age}.");
    }

    #[tokio::test]
    async fn each_persona_is_fetched_once() {
        let registry = Arc::new(
            InMemoryRegistry::new()
                .with_template("student", "s {age}")
                .with_template("parent", "p {age}"),
        );
        let mut store = store(registry.clone());

        store.preload().await.unwrap();
        store.load(Mode::Student).await.unwrap();
        store.load(Mode::Parent).await.unwrap();

        assert_eq!(registry.load_count(), 2);
        assert_eq!(store.cached(Mode::Parent), Some("p {age}"));
    }

    #[tokio::test]
    async fn missing_persona_is_reported() {
        let registry = Arc::new(InMemoryRegistry::new().with_template("student", "s"));
        let mut store = store(registry);

        let err = store.load(Mode::Parent).await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "parent"));
    }
}
