//! The playback decorator
//!
//! Answers every call from prerecorded fixtures; there is no wrapped
//! transport and no network access. Misses surface per the call shape:
//! `load` raises, `load_response` returns a not-found envelope, and `find`
//! follows the configured [`FindMissPolicy`].
//!
//! Mutating calls cannot reach a backend. Updates are diverted to the
//! updates directory as versioned snapshots when one is configured;
//! everything else mutating is blocked with a warning and returns without
//! effect, so test suites that never look at write fixtures keep running.

use crate::traits::{ApiClient, EntityResponse};
use reprise_core::{BatchResolver, FixtureError, Link, Recordable, Result, SearchKey};
use reprise_store::FixtureStore;
use std::sync::Arc;
use tracing::{error, warn};

/// What a playback `find` does when no search was recorded for its key
///
/// Both behaviors have existed historically; the policy makes the choice
/// explicit per wiring instead of an accident of the revision in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindMissPolicy {
    /// Raise a miss error (the default)
    #[default]
    Fail,
    /// Return an empty result list
    Empty,
}

/// Replays server exchanges from a directory of recorded fixtures
pub struct PlaybackClient {
    store: Arc<FixtureStore>,
    batches: Arc<dyn BatchResolver>,
    find_miss: FindMissPolicy,
}

impl PlaybackClient {
    /// Create a playback client over a fixture store
    pub fn new(store: Arc<FixtureStore>, batches: Arc<dyn BatchResolver>) -> Self {
        PlaybackClient {
            store,
            batches,
            find_miss: FindMissPolicy::default(),
        }
    }

    /// Builder: choose what `find` does on a miss
    pub fn with_find_miss_policy(mut self, policy: FindMissPolicy) -> Self {
        self.find_miss = policy;
        self
    }

    fn on_find_miss(&self, key: &SearchKey) -> Result<Vec<Link>> {
        match self.find_miss {
            FindMissPolicy::Fail => Err(FixtureError::Miss(key.file_name())),
            FindMissPolicy::Empty => Ok(Vec::new()),
        }
    }

    fn block_write(&self, operation: &str) {
        warn!(target: "reprise::playback", "Call to {operation} blocked");
    }

    /// Divert a mutation's would-be post-state to the updates sink, or
    /// block it when no sink is configured. Either way the caller gets its
    /// own entity back unchanged, never a re-fetched one.
    fn divert_update(&self, entity: &dyn Recordable, operation: &str) {
        if self.store.updates_dir().is_some() {
            if let Err(e) = self.store.write_versioned_update(entity) {
                error!(
                    target: "reprise::playback",
                    entity_type = entity.type_name(),
                    error = %e,
                    "Could not write update fixture"
                );
            }
        } else {
            self.block_write(operation);
        }
    }
}

impl ApiClient for PlaybackClient {
    fn load(&self, entity_type: &str, locator: &str) -> Result<Box<dyn Recordable>> {
        self.store.read_entity(entity_type, locator)
    }

    fn load_response(&self, entity_type: &str, locator: &str) -> Result<EntityResponse> {
        match self.store.read_entity(entity_type, locator) {
            Ok(entity) => Ok(EntityResponse::ok(entity)),
            Err(e) if e.is_miss() => Ok(EntityResponse::not_found()),
            Err(e) => Err(e),
        }
    }

    /// Implemented as repeated single loads so a caching layer in front of
    /// this client can serve per-entity hits before falling through here.
    fn load_all(&self, links: &[Link]) -> Result<Vec<Box<dyn Recordable>>> {
        links
            .iter()
            .map(|link| self.load(&link.entity_type, &link.uri))
            .collect()
    }

    fn find(&self, key: &SearchKey) -> Result<Vec<Link>> {
        match self.store.read_search(key) {
            Some(stored) if stored.key() == key => {
                Ok(stored.results().map(<[Link]>::to_vec).unwrap_or_default())
            }
            Some(stored) => {
                // A different signature recorded under this key's file name.
                warn!(
                    target: "reprise::playback",
                    requested = %key,
                    stored = %stored.key(),
                    "Recorded search at this hash has different terms"
                );
                self.on_find_miss(key)
            }
            None => self.on_find_miss(key),
        }
    }

    fn list_all(&self, entity_type: &str) -> Result<Vec<Link>> {
        match self.batches.batch_type_for(entity_type) {
            None => {
                warn!(
                    target: "reprise::playback",
                    entity_type = entity_type,
                    "Entity type is not returned by any known batch type"
                );
                Ok(Vec::new())
            }
            Some(batch_type) => self.store.read_list(batch_type),
        }
    }

    /// The bounds are deliberately ignored: the stored fixture always
    /// represents the full previously recorded set.
    fn list_some(&self, entity_type: &str, _start: usize, _max: usize) -> Result<Vec<Link>> {
        self.list_all(entity_type)
    }

    fn create(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        self.block_write("create");
        Ok(entity)
    }

    fn update(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        self.divert_update(entity.as_ref(), "update");
        Ok(entity)
    }

    fn update_all(
        &self,
        entities: Vec<Box<dyn Recordable>>,
    ) -> Result<Vec<Box<dyn Recordable>>> {
        for entity in &entities {
            self.divert_update(entity.as_ref(), "update_all");
        }
        Ok(entities)
    }

    fn delete(&self, entity: Box<dyn Recordable>) -> Result<()> {
        self.block_write("delete");
        drop(entity);
        Ok(())
    }

    fn upload(&self, entity: Box<dyn Recordable>, _content: &[u8]) -> Result<Box<dyn Recordable>> {
        self.block_write("upload");
        Ok(entity)
    }
}
