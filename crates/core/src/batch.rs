//! Batch type resolution for list fixtures
//!
//! List operations return links wrapped in a per-type batch (a
//! link-collection type). The fixture layer needs that batch type's short
//! name to name the single list fixture for an entity type. Resolution is
//! one direct call on this seam; the recording side asks, then writes.

use std::collections::HashMap;

/// Resolves an entity type to its batch (link-collection) type
pub trait BatchResolver: Send + Sync {
    /// The short name of the batch type whose fixture holds lists of the
    /// given entity type, or `None` if the entity type is not listed by any
    /// known batch type.
    fn batch_type_for(&self, entity_type: &str) -> Option<&str>;
}

/// Map-backed batch type resolver
///
/// # Examples
///
/// ```
/// use reprise_core::{BatchMap, BatchResolver};
///
/// let mut batches = BatchMap::new();
/// batches.register("Sample", "Samples");
///
/// assert_eq!(batches.batch_type_for("Sample"), Some("Samples"));
/// assert_eq!(batches.batch_type_for("Artifact"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchMap {
    map: HashMap<String, String>,
}

impl BatchMap {
    /// Create an empty resolver
    pub fn new() -> Self {
        BatchMap::default()
    }

    /// Register the batch type for an entity type
    pub fn register(&mut self, entity_type: impl Into<String>, batch_type: impl Into<String>) {
        self.map.insert(entity_type.into(), batch_type.into());
    }

    /// Builder: register and return self
    pub fn with(mut self, entity_type: impl Into<String>, batch_type: impl Into<String>) -> Self {
        self.register(entity_type, batch_type);
        self
    }
}

impl BatchResolver for BatchMap {
    fn batch_type_for(&self, entity_type: &str) -> Option<&str> {
        self.map.get(entity_type).map(String::as_str)
    }
}
