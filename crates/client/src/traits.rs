//! The client capability set
//!
//! Every operation the fixture layer knows how to record or play back,
//! expressed as one trait. The real transport implements it against the
//! live backend; [`crate::RecordingClient`] and [`crate::PlaybackClient`]
//! implement it as decorators. Call sites depend on the trait alone.

use reprise_core::{Link, Recordable, Result, SearchKey};

/// The capability set of the REST client being recorded or played back
///
/// Operations fall into five kinds: load-one (`load`, `load_response`),
/// load-many (`load_all`), find/search (`find`), list (`list_all`,
/// `list_some`), and mutate (`create`, `update`, `update_all`, `delete`,
/// `upload`).
pub trait ApiClient: Send + Sync {
    /// Load a single entity by its type and locator.
    ///
    /// # Errors
    ///
    /// A miss (no entity / no recording) surfaces as an error.
    fn load(&self, entity_type: &str, locator: &str) -> Result<Box<dyn Recordable>>;

    /// Load a single entity, projecting a miss into a response envelope
    /// with a not-found status instead of an error.
    fn load_response(&self, entity_type: &str, locator: &str) -> Result<EntityResponse>;

    /// Load the full entities behind a collection of links.
    fn load_all(&self, links: &[Link]) -> Result<Vec<Box<dyn Recordable>>>;

    /// Run a parameterized search for entities of the key's type, returning
    /// links to the matches.
    fn find(&self, key: &SearchKey) -> Result<Vec<Link>>;

    /// List all entities of a type, as links.
    fn list_all(&self, entity_type: &str) -> Result<Vec<Link>>;

    /// List a bounded page of entities of a type, as links.
    ///
    /// Playback ignores the bounds and returns the full recorded list; a
    /// fixture captures "the list", not "a page".
    fn list_some(&self, entity_type: &str, start: usize, max: usize) -> Result<Vec<Link>>;

    /// Create an entity, returning its server-assigned state.
    fn create(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>>;

    /// Update an entity, returning its post-update state.
    fn update(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>>;

    /// Update several entities, returning their post-update states.
    fn update_all(&self, entities: Vec<Box<dyn Recordable>>)
        -> Result<Vec<Box<dyn Recordable>>>;

    /// Delete an entity.
    fn delete(&self, entity: Box<dyn Recordable>) -> Result<()>;

    /// Upload content attached to an entity, returning the entity's
    /// post-upload state.
    fn upload(&self, entity: Box<dyn Recordable>, content: &[u8]) -> Result<Box<dyn Recordable>>;
}

/// Status of a response-envelope load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The entity was found and is in the envelope
    Ok,
    /// No such entity (or no recording of it)
    NotFound,
}

/// A response envelope: a status plus, when found, the entity
///
/// The same underlying miss as a throwing `load`, projected for callers
/// that expect a status object rather than an error.
pub struct EntityResponse {
    status: ResponseStatus,
    entity: Option<Box<dyn Recordable>>,
}

impl EntityResponse {
    /// An OK response carrying an entity
    pub fn ok(entity: Box<dyn Recordable>) -> Self {
        EntityResponse {
            status: ResponseStatus::Ok,
            entity: Some(entity),
        }
    }

    /// A not-found response with no body
    pub fn not_found() -> Self {
        EntityResponse {
            status: ResponseStatus::NotFound,
            entity: None,
        }
    }

    /// The response status
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Whether the entity was found
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// The entity, if found
    pub fn entity(&self) -> Option<&dyn Recordable> {
        self.entity.as_deref()
    }

    /// Consume the envelope, yielding the entity if found
    pub fn into_entity(self) -> Option<Box<dyn Recordable>> {
        self.entity
    }
}

impl std::fmt::Debug for EntityResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityResponse")
            .field("status", &self.status)
            .field("entity", &self.entity.as_ref().map(|e| e.type_name()))
            .finish()
    }
}
