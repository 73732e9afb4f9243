//! Tool Registry

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tool::ToolDefinition;

/// The authoritative name → definition mapping
///
/// Filled during startup, then handed to the dispatcher behind an `Arc`
/// and only read from there on, so no locking is needed.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any tool with the same name
    pub fn register(&mut self, definition: ToolDefinition) {
        let name = definition.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(definition)).is_some() {
            tracing::warn!(tool = %name, "Tool registered twice; the later definition wins");
        }
    }

    /// Register several definitions in order
    pub fn register_all(&mut self, definitions: impl IntoIterator<Item = ToolDefinition>) {
        for definition in definitions {
            self.register(definition);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Every definition, ordered by name for display only
    pub fn list_all(&self) -> Vec<Arc<ToolDefinition>> {
        self.tools.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
