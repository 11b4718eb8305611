// ABOUTME: Registry pattern for runtime backend selection.
// ABOUTME: Backends register factories, the server creates one by name from config.

use crate::traits::AgentBackend;
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory function that creates a backend from config
pub type BackendFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn AgentBackend>> + Send + Sync>;

/// Registry for runtime backend selection
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory by name
    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&Value) -> Result<Arc<dyn AgentBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn create(&self, name: &str, config: &Value) -> Result<Arc<dyn AgentBackend>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("Unknown backend: {}", name))?;
        factory(config)
    }

    /// Registered backend names, sorted
    pub fn available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        use crate::backends::mock::MockBackend;

        Self::new().register("mock", MockBackend::factory())
    }
}
