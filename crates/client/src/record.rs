//! The recording decorator
//!
//! Wraps a real transport client. Read-class calls proceed to the backend
//! and their results are persisted as fixtures on the way out; mutating
//! calls proceed unconditionally and, when an updates directory is
//! configured, have their post-state snapshotted as a versioned update.
//!
//! Persistence is strictly best-effort: a broken fixture store must never
//! turn a successful live API call into a failure, so every write error is
//! logged and swallowed.

use crate::traits::{ApiClient, EntityResponse};
use reprise_core::{BatchResolver, Link, Recordable, Result, Search, SearchKey};
use reprise_store::FixtureStore;
use std::sync::Arc;
use tracing::{error, warn};

/// Records server exchanges as fixtures while passing calls through to a
/// real transport
pub struct RecordingClient<C> {
    inner: C,
    store: Arc<FixtureStore>,
    batches: Arc<dyn BatchResolver>,
}

impl<C: ApiClient> RecordingClient<C> {
    /// Wrap a transport client
    pub fn new(inner: C, store: Arc<FixtureStore>, batches: Arc<dyn BatchResolver>) -> Self {
        RecordingClient {
            inner,
            store,
            batches,
        }
    }

    /// The wrapped transport
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn persist_entity(&self, entity: &dyn Recordable) {
        if let Err(e) = self.store.write_entity(entity) {
            error!(
                target: "reprise::record",
                entity_type = entity.type_name(),
                error = %e,
                "Could not record entity fixture"
            );
        }
    }

    fn persist_search(&self, key: &SearchKey, results: &[Link]) {
        let search = Search::with_results(key.clone(), results.to_vec());
        if let Err(e) = self.store.record_search(search) {
            warn!(target: "reprise::record", error = %e, "Could not record search");
        }
    }

    fn persist_list(&self, entity_type: &str, links: &[Link]) {
        match self.batches.batch_type_for(entity_type) {
            None => {
                warn!(
                    target: "reprise::record",
                    entity_type = entity_type,
                    "Entity type is not returned by any known batch type"
                );
            }
            Some(batch_type) => {
                if let Err(e) = self.store.write_list(batch_type, links) {
                    error!(
                        target: "reprise::record",
                        entity_type = entity_type,
                        error = %e,
                        "Could not record list fixture"
                    );
                }
            }
        }
    }

    fn snapshot_post_state(&self, entity: &dyn Recordable) {
        // A no-op unless an updates directory is configured.
        if let Err(e) = self.store.write_versioned_update(entity) {
            error!(
                target: "reprise::record",
                entity_type = entity.type_name(),
                error = %e,
                "Could not record update fixture"
            );
        }
    }
}

impl<C: ApiClient> ApiClient for RecordingClient<C> {
    fn load(&self, entity_type: &str, locator: &str) -> Result<Box<dyn Recordable>> {
        let entity = self.inner.load(entity_type, locator)?;
        self.persist_entity(entity.as_ref());
        Ok(entity)
    }

    fn load_response(&self, entity_type: &str, locator: &str) -> Result<EntityResponse> {
        let response = self.inner.load_response(entity_type, locator)?;
        if let Some(entity) = response.entity() {
            self.persist_entity(entity);
        }
        Ok(response)
    }

    fn load_all(&self, links: &[Link]) -> Result<Vec<Box<dyn Recordable>>> {
        let entities = self.inner.load_all(links)?;
        for entity in &entities {
            self.persist_entity(entity.as_ref());
        }
        Ok(entities)
    }

    fn find(&self, key: &SearchKey) -> Result<Vec<Link>> {
        let results = self.inner.find(key)?;
        self.persist_search(key, &results);
        Ok(results)
    }

    fn list_all(&self, entity_type: &str) -> Result<Vec<Link>> {
        let links = self.inner.list_all(entity_type)?;
        self.persist_list(entity_type, &links);
        Ok(links)
    }

    fn list_some(&self, entity_type: &str, start: usize, max: usize) -> Result<Vec<Link>> {
        let links = self.inner.list_some(entity_type, start, max)?;
        self.persist_list(entity_type, &links);
        Ok(links)
    }

    fn create(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        let created = self.inner.create(entity)?;
        self.snapshot_post_state(created.as_ref());
        Ok(created)
    }

    fn update(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        let updated = self.inner.update(entity)?;
        self.snapshot_post_state(updated.as_ref());
        Ok(updated)
    }

    fn update_all(
        &self,
        entities: Vec<Box<dyn Recordable>>,
    ) -> Result<Vec<Box<dyn Recordable>>> {
        let updated = self.inner.update_all(entities)?;
        for entity in &updated {
            self.snapshot_post_state(entity.as_ref());
        }
        Ok(updated)
    }

    fn delete(&self, entity: Box<dyn Recordable>) -> Result<()> {
        self.inner.delete(entity)
    }

    fn upload(&self, entity: Box<dyn Recordable>, content: &[u8]) -> Result<Box<dyn Recordable>> {
        let uploaded = self.inner.upload(entity, content)?;
        self.snapshot_post_state(uploaded.as_ref());
        Ok(uploaded)
    }
}
