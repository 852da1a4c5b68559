//! Registry mapping stage names to handlers.

use super::StageHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps stage names to the handlers that implement them.
///
/// The registry is cheap to clone; handlers are shared.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn StageHandler>>,
}

impl HandlerRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for the name.
    pub fn register(&mut self, stage: impl Into<String>, handler: Arc<dyn StageHandler>) {
        self.handlers.insert(stage.into(), handler);
    }

    /// Registers a handler and returns the registry.
    #[must_use]
    pub fn with(mut self, stage: impl Into<String>, handler: impl StageHandler + 'static) -> Self {
        self.register(stage, Arc::new(handler));
        self
    }

    /// Gets the handler for a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&Arc<dyn StageHandler>> {
        self.handlers.get(stage)
    }

    /// Checks if a stage has a handler.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.handlers.contains_key(stage)
    }

    /// Returns the names in `stages` that have no handler, in order and
    /// without duplicates.
    #[must_use]
    pub fn missing(&self, stages: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for stage in stages {
            if !self.contains(stage) && !missing.contains(stage) {
                missing.push(stage.clone());
            }
        }
        missing
    }

    /// Lists registered stage names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::PassThroughHandler;

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new()
            .with("ocr", PassThroughHandler)
            .with("nlp", PassThroughHandler);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("ocr"));
        assert!(registry.get("vision").is_none());
        assert_eq!(registry.names(), vec!["nlp".to_string(), "ocr".to_string()]);
    }

    #[test]
    fn test_missing_preserves_order_and_dedups() {
        let registry = HandlerRegistry::new().with("ocr", PassThroughHandler);
        let stages: Vec<String> = ["vision", "ocr", "audit", "vision"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            registry.missing(&stages),
            vec!["vision".to_string(), "audit".to_string()]
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.missing(&["ocr".to_string()]), vec!["ocr".to_string()]);
    }
}
