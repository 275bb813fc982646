//! Links: lightweight references to entities
//!
//! List and search operations return links rather than full entity bodies.
//! A link's locator URI is its identity; two links to the same URI refer to
//! the same entity regardless of when they were recorded.

use serde::{Deserialize, Serialize};

/// A lightweight reference to an entity: its type plus its locator URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Short type name of the referenced entity
    pub entity_type: String,
    /// Canonical locator URI of the referenced entity
    pub uri: String,
}

impl Link {
    /// Create a new link
    pub fn new(entity_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Link {
            entity_type: entity_type.into(),
            uri: uri.into(),
        }
    }

    /// Whether this link refers to the same entity as `other`.
    ///
    /// Identity is the locator URI alone; the recorded type is descriptive.
    pub fn same_entity(&self, other: &Link) -> bool {
        self.uri == other.uri
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.entity_type, self.uri)
    }
}

/// A typed batch of links, as persisted by list operations
///
/// There is exactly one list fixture per batch type. A batch recorded with
/// zero links is still a recorded batch: reading it back yields an empty
/// list, not a miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBatch {
    /// Short name of the batch (link-collection) type
    pub batch_type: String,
    /// The recorded links, in server order
    pub links: Vec<Link>,
}

impl LinkBatch {
    /// Create a batch from a set of links
    pub fn new(batch_type: impl Into<String>, links: Vec<Link>) -> Self {
        LinkBatch {
            batch_type: batch_type.into(),
            links,
        }
    }

    /// File name for this batch's single list fixture
    pub fn file_name(&self) -> String {
        LinkBatch::file_name_for(&self.batch_type)
    }

    /// File name for the list fixture of the given batch type
    pub fn file_name_for(batch_type: &str) -> String {
        format!("{batch_type}.xml")
    }
}
