//! Entity identity and fixture file naming
//!
//! An entity fixture's file name is derived purely from the entity's short
//! type name and a unique id. The derivation must be referentially stable:
//! the same logical entity yields the same key in the recording process and
//! in every later playback process, so it can never depend on process-local
//! state.
//!
//! ## File names
//!
//! - Current version of an entity: `{TypeName}-{id}.xml`
//! - Versioned update snapshots:   `{TypeName}-{id}.{version:03}.xml`
//!
//! Type names and ids coming from the API are plain ASCII, which keeps the
//! names stable across platforms.

use crate::error::{FixtureError, Result};
use std::any::Any;

/// An entity the fixture layer can identify and persist
///
/// This is the seam between the fixture layer and whatever entity model the
/// surrounding REST client uses. Implementations expose the short type name,
/// the canonical locator URI, and - when the server assigns one - a unique id.
pub trait Recordable: Send {
    /// Short, unqualified type name of the entity (e.g. `"Sample"`)
    fn type_name(&self) -> &str;

    /// Canonical locator URI by which the backend addresses this entity
    fn uri(&self) -> &str;

    /// Server-assigned unique identifier, if the entity type carries one
    fn entity_id(&self) -> Option<&str> {
        None
    }

    /// Downcasting access for marshaller implementations
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn Recordable + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recordable")
            .field("type_name", &self.type_name())
            .field("uri", &self.uri())
            .field("entity_id", &self.entity_id())
            .finish()
    }
}

/// Stable file-system identity of one entity: `(type name, id)`
///
/// Two fixtures with the same key refer to the same entity at possibly
/// different versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    type_name: String,
    id: String,
}

impl EntityKey {
    /// Create a key directly from a known type name and id
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        EntityKey {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Derive the key for an entity.
    ///
    /// Prefers the entity's intrinsic id; if the type carries none, falls
    /// back to the final path segment of its locator URI.
    pub fn for_entity(entity: &dyn Recordable) -> Result<Self> {
        match entity.entity_id() {
            Some(id) if !id.is_empty() => Ok(EntityKey::new(entity.type_name(), id)),
            _ => EntityKey::from_locator(entity.type_name(), entity.uri()),
        }
    }

    /// Derive the key for a `(type, locator)` pair.
    ///
    /// The id is the final path segment of the locator, with any query or
    /// fragment part stripped.
    pub fn from_locator(type_name: &str, locator: &str) -> Result<Self> {
        let path = locator
            .split_once('?')
            .map_or(locator, |(head, _)| head);
        let path = path.split_once('#').map_or(path, |(head, _)| head);
        let id = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");

        // A scheme prefix alone ("https:") or a bare authority with a
        // trailing slash leaves nothing usable as an id.
        if id.is_empty() || id.ends_with(':') {
            return Err(FixtureError::MalformedLocator(locator.to_string()));
        }

        Ok(EntityKey::new(type_name, id))
    }

    /// The entity's short type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The entity's unique id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// File name of the single current-version fixture
    pub fn file_name(&self) -> String {
        format!("{}-{}.xml", self.type_name, self.id)
    }

    /// File name of a versioned update fixture.
    ///
    /// Versions are zero-padded to width 3 and grow past `999` unpadded.
    pub fn versioned_file_name(&self, version: u32) -> String {
        format!("{}-{}.{:03}.xml", self.type_name, self.id, version)
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}
