//! End-to-end record/playback tests
//!
//! A fake transport stands in for the real backend. Recording sessions run
//! against it and persist fixtures; playback sessions run against the same
//! directory with no transport at all.

use once_cell::sync::Lazy;
use reprise_client::{
    ApiClient, FindMissPolicy, PlaybackClient, RecordingClient, ResponseStatus,
};
use reprise_core::{
    BatchMap, BatchResolver, FixtureError, GenericEntity, JsonMarshaller, Link, ParamTerm,
    Recordable, Result, SearchKey,
};
use reprise_store::FixtureStore;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
});

// ============================================================================
// Fake Transport
// ============================================================================

/// A stand-in backend: a fixed set of entities, search results, and lists.
#[derive(Default)]
struct FakeTransport {
    entities: HashMap<String, GenericEntity>,
    find_results: Vec<Link>,
    lists: HashMap<String, Vec<Link>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn with_entity(mut self, entity: GenericEntity) -> Self {
        self.entities.insert(entity.uri().to_string(), entity);
        self
    }

    fn with_find_results(mut self, links: Vec<Link>) -> Self {
        self.find_results = links;
        self
    }

    fn with_list(mut self, entity_type: &str, links: Vec<Link>) -> Self {
        self.lists.insert(entity_type.to_string(), links);
        self
    }

    fn called(&self, operation: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == operation)
    }

    fn note(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }
}

impl ApiClient for FakeTransport {
    fn load(&self, _entity_type: &str, locator: &str) -> Result<Box<dyn Recordable>> {
        self.note("load");
        self.entities
            .get(locator)
            .map(|e| Box::new(e.clone()) as Box<dyn Recordable>)
            .ok_or_else(|| FixtureError::Miss(locator.to_string()))
    }

    fn load_response(
        &self,
        entity_type: &str,
        locator: &str,
    ) -> Result<reprise_client::EntityResponse> {
        match self.load(entity_type, locator) {
            Ok(entity) => Ok(reprise_client::EntityResponse::ok(entity)),
            Err(e) if e.is_miss() => Ok(reprise_client::EntityResponse::not_found()),
            Err(e) => Err(e),
        }
    }

    fn load_all(&self, links: &[Link]) -> Result<Vec<Box<dyn Recordable>>> {
        links
            .iter()
            .map(|link| self.load(&link.entity_type, &link.uri))
            .collect()
    }

    fn find(&self, _key: &SearchKey) -> Result<Vec<Link>> {
        self.note("find");
        Ok(self.find_results.clone())
    }

    fn list_all(&self, entity_type: &str) -> Result<Vec<Link>> {
        self.note("list_all");
        Ok(self.lists.get(entity_type).cloned().unwrap_or_default())
    }

    fn list_some(&self, entity_type: &str, start: usize, max: usize) -> Result<Vec<Link>> {
        self.note("list_some");
        let links = self.lists.get(entity_type).cloned().unwrap_or_default();
        Ok(links.into_iter().skip(start).take(max).collect())
    }

    fn create(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        self.note("create");
        Ok(entity)
    }

    fn update(&self, entity: Box<dyn Recordable>) -> Result<Box<dyn Recordable>> {
        self.note("update");
        Ok(entity)
    }

    fn update_all(&self, entities: Vec<Box<dyn Recordable>>) -> Result<Vec<Box<dyn Recordable>>> {
        self.note("update_all");
        Ok(entities)
    }

    fn delete(&self, entity: Box<dyn Recordable>) -> Result<()> {
        self.note("delete");
        drop(entity);
        Ok(())
    }

    fn upload(&self, entity: Box<dyn Recordable>, _content: &[u8]) -> Result<Box<dyn Recordable>> {
        self.note("upload");
        Ok(entity)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn store_at(dir: &Path) -> Arc<FixtureStore> {
    Lazy::force(&TRACING);
    Arc::new(FixtureStore::new(dir, Arc::new(JsonMarshaller)))
}

fn batches() -> Arc<dyn BatchResolver> {
    Arc::new(BatchMap::new().with("Sample", "Samples"))
}

fn sample(id: &str) -> GenericEntity {
    GenericEntity::new("Sample", sample_uri(id))
        .with_id(id)
        .with_field("name", serde_json::json!(format!("sample {id}")))
}

fn sample_uri(id: &str) -> String {
    format!("http://localhost/api/v2/samples/{id}")
}

fn sample_link(id: &str) -> Link {
    Link::new("Sample", sample_uri(id))
}

fn search_key(marker: &str) -> SearchKey {
    SearchKey::build([("id", ParamTerm::from(marker))], "Sample")
}

fn playback(dir: &TempDir) -> PlaybackClient {
    PlaybackClient::new(store_at(dir.path()), batches())
}

// ============================================================================
// Recording
// ============================================================================

mod recording {
    use super::*;

    #[test]
    fn test_load_persists_entity_and_returns_live_result() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default().with_entity(sample("S1"));
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        let entity = client.load("Sample", &sample_uri("S1")).unwrap();
        assert_eq!(entity.entity_id(), Some("S1"));

        assert!(dir.path().join("Sample-S1.xml").exists());
    }

    #[test]
    fn test_load_all_persists_each_entity() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default()
            .with_entity(sample("S1"))
            .with_entity(sample("S2"));
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        let entities = client
            .load_all(&[sample_link("S1"), sample_link("S2")])
            .unwrap();
        assert_eq!(entities.len(), 2);

        assert!(dir.path().join("Sample-S1.xml").exists());
        assert!(dir.path().join("Sample-S2.xml").exists());
    }

    #[test]
    fn test_find_records_search_fixture() {
        // Scenario: find({"id": "X"}, Sample) returns L1; the fixture holds
        // the search key and L1.
        let dir = tempfile::tempdir().unwrap();
        let key = search_key("X");
        let transport = FakeTransport::default().with_find_results(vec![sample_link("L1")]);
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        let results = client.find(&key).unwrap();
        assert_eq!(results, vec![sample_link("L1")]);

        let stored = store_at(dir.path()).read_search(&key).unwrap();
        assert_eq!(stored.key(), &key);
        assert_eq!(stored.results().unwrap(), &[sample_link("L1")]);
    }

    #[test]
    fn test_rerecorded_find_merges_across_sessions() {
        // Re-running the same search in a later session with one more
        // result merges to L1 plus L2.
        let dir = tempfile::tempdir().unwrap();
        let key = search_key("X");

        let first = RecordingClient::new(
            FakeTransport::default().with_find_results(vec![sample_link("L1")]),
            store_at(dir.path()),
            batches(),
        );
        first.find(&key).unwrap();

        let second = RecordingClient::new(
            FakeTransport::default()
                .with_find_results(vec![sample_link("L1"), sample_link("L2")]),
            store_at(dir.path()),
            batches(),
        );
        second.find(&key).unwrap();

        let stored = store_at(dir.path()).read_search(&key).unwrap();
        let results = stored.results().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.contains(&sample_link("L1")));
        assert!(results.contains(&sample_link("L2")));
    }

    #[test]
    fn test_list_records_single_batch_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default()
            .with_list("Sample", vec![sample_link("S1"), sample_link("S2")]);
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        let links = client.list_all("Sample").unwrap();
        assert_eq!(links.len(), 2);

        assert!(dir.path().join("Samples.xml").exists());
    }

    #[test]
    fn test_list_of_unknown_type_still_returns_live_result() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default()
            .with_list("Container", vec![Link::new("Container", "http://h/api/containers/C1")]);
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        let links = client.list_all("Container").unwrap();
        assert_eq!(links.len(), 1);

        // No batch type, so nothing was recorded, and nothing failed.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_broken_store_never_fails_the_live_call() {
        // Message directory does not exist: every persistence attempt
        // fails, every call still succeeds.
        Lazy::force(&TRACING);
        let store = Arc::new(FixtureStore::new(
            "/nonexistent/reprise-record",
            Arc::new(JsonMarshaller),
        ));
        let transport = FakeTransport::default()
            .with_entity(sample("S1"))
            .with_find_results(vec![sample_link("L1")])
            .with_list("Sample", vec![sample_link("S1")]);
        let client = RecordingClient::new(transport, store, batches());

        assert!(client.load("Sample", &sample_uri("S1")).is_ok());
        assert!(client.find(&search_key("X")).is_ok());
        assert!(client.list_all("Sample").is_ok());
    }

    #[test]
    fn test_mutations_proceed_and_snapshot_when_updates_configured() {
        Lazy::force(&TRACING);
        let messages = tempfile::tempdir().unwrap();
        let updates = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FixtureStore::new(messages.path(), Arc::new(JsonMarshaller))
                .with_updates_dir(updates.path()),
        );
        let client = RecordingClient::new(FakeTransport::default(), store, batches());

        client.update(Box::new(sample("S1"))).unwrap();
        client.update(Box::new(sample("S1"))).unwrap();

        assert!(client.inner().called("update"));
        assert!(updates.path().join("Sample-S1.000.xml").exists());
        assert!(updates.path().join("Sample-S1.001.xml").exists());
    }

    #[test]
    fn test_mutations_proceed_without_updates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let client =
            RecordingClient::new(FakeTransport::default(), store_at(dir.path()), batches());

        let returned = client.create(Box::new(sample("S1"))).unwrap();
        assert_eq!(returned.entity_id(), Some("S1"));
        assert!(client.inner().called("create"));

        // No updates directory: no snapshot, no failure.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

// ============================================================================
// Playback
// ============================================================================

mod playback_mode {
    use super::*;

    /// Record a couple of fixtures, then answer from them offline.
    fn recorded_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default()
            .with_entity(sample("S1"))
            .with_entity(sample("S2"))
            .with_find_results(vec![sample_link("S1"), sample_link("S2")])
            .with_list("Sample", vec![sample_link("S1"), sample_link("S2")]);
        let client = RecordingClient::new(transport, store_at(dir.path()), batches());

        client.load("Sample", &sample_uri("S1")).unwrap();
        client.load("Sample", &sample_uri("S2")).unwrap();
        client.find(&search_key("X")).unwrap();
        client.list_all("Sample").unwrap();
        dir
    }

    #[test]
    fn test_load_replays_recorded_entity() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let entity = client.load("Sample", &sample_uri("S1")).unwrap();
        let entity = entity.as_any().downcast_ref::<GenericEntity>().unwrap();
        assert_eq!(entity, &sample("S1"));
    }

    #[test]
    fn test_load_miss_raises_and_has_no_side_effects() {
        // Scenario: load of an id never recorded raises the miss signal and
        // creates no file.
        let dir = tempfile::tempdir().unwrap();
        let client = playback(&dir);

        let err = client.load("Sample", &sample_uri("missing-id")).unwrap_err();
        assert!(err.is_miss());

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_load_response_projects_miss_as_not_found() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let found = client.load_response("Sample", &sample_uri("S1")).unwrap();
        assert_eq!(found.status(), ResponseStatus::Ok);

        let missing = client
            .load_response("Sample", &sample_uri("missing-id"))
            .unwrap();
        assert_eq!(missing.status(), ResponseStatus::NotFound);
        assert!(missing.entity().is_none());
    }

    #[test]
    fn test_load_all_resolves_links_individually() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let entities = client
            .load_all(&[sample_link("S1"), sample_link("S2")])
            .unwrap();
        assert_eq!(entities.len(), 2);

        let err = client
            .load_all(&[sample_link("S1"), sample_link("S404")])
            .unwrap_err();
        assert!(err.is_miss());
    }

    #[test]
    fn test_find_replays_recorded_search() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let results = client.find(&search_key("X")).unwrap();
        assert_eq!(results, vec![sample_link("S1"), sample_link("S2")]);
    }

    #[test]
    fn test_find_miss_fails_by_default() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let err = client.find(&search_key("never-recorded")).unwrap_err();
        assert!(err.is_miss());
    }

    #[test]
    fn test_find_miss_policy_empty() {
        let dir = recorded_dir();
        let client = PlaybackClient::new(store_at(dir.path()), batches())
            .with_find_miss_policy(FindMissPolicy::Empty);

        let results = client.find(&search_key("never-recorded")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_list_ignores_pagination_bounds() {
        let dir = recorded_dir();
        let client = playback(&dir);

        // The fixture holds the full recorded set; bounds are ignored.
        let some = client.list_some("Sample", 0, 1).unwrap();
        assert_eq!(some.len(), 2);
        assert_eq!(some, client.list_all("Sample").unwrap());
    }

    #[test]
    fn test_list_miss_raises() {
        let dir = tempfile::tempdir().unwrap();
        let client = playback(&dir);

        let err = client.list_all("Sample").unwrap_err();
        assert!(err.is_miss());
    }

    #[test]
    fn test_list_of_unknown_type_is_empty() {
        let dir = recorded_dir();
        let client = playback(&dir);

        let links = client.list_all("Container").unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_blocked_update_is_a_noop() {
        // Scenario: update with no updates directory configured is a no-op
        // returning without error and without writing any file.
        let dir = tempfile::tempdir().unwrap();
        let client = playback(&dir);

        let returned = client.update(Box::new(sample("S1"))).unwrap();
        assert_eq!(returned.entity_id(), Some("S1"));

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_blocked_create_delete_upload_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let client = playback(&dir);

        assert!(client.create(Box::new(sample("S1"))).is_ok());
        assert!(client.delete(Box::new(sample("S1"))).is_ok());
        assert!(client.upload(Box::new(sample("S1")), b"content").is_ok());

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_update_diverts_to_updates_sink() {
        Lazy::force(&TRACING);
        let messages = tempfile::tempdir().unwrap();
        let updates = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FixtureStore::new(messages.path(), Arc::new(JsonMarshaller))
                .with_updates_dir(updates.path()),
        );
        let client = PlaybackClient::new(store, batches());

        let returned = client.update(Box::new(sample("S1"))).unwrap();
        // The caller gets its own entity back, not a re-fetched one.
        let returned = returned.as_any().downcast_ref::<GenericEntity>().unwrap();
        assert_eq!(returned, &sample("S1"));

        assert!(updates.path().join("Sample-S1.000.xml").exists());
        assert_eq!(fs::read_dir(messages.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_update_all_versions_each_entity() {
        Lazy::force(&TRACING);
        let messages = tempfile::tempdir().unwrap();
        let updates = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FixtureStore::new(messages.path(), Arc::new(JsonMarshaller))
                .with_updates_dir(updates.path()),
        );
        let client = PlaybackClient::new(store, batches());

        client
            .update_all(vec![Box::new(sample("S1")), Box::new(sample("S2"))])
            .unwrap();
        client.update(Box::new(sample("S1"))).unwrap();

        assert!(updates.path().join("Sample-S1.000.xml").exists());
        assert!(updates.path().join("Sample-S1.001.xml").exists());
        assert!(updates.path().join("Sample-S2.000.xml").exists());
    }

    #[test]
    fn test_record_then_playback_round_trip() {
        let dir = recorded_dir();
        let client = playback(&dir);

        // Everything recorded above is answerable offline.
        assert!(client.load("Sample", &sample_uri("S1")).is_ok());
        assert!(client.load("Sample", &sample_uri("S2")).is_ok());
        assert_eq!(client.find(&search_key("X")).unwrap().len(), 2);
        assert_eq!(client.list_all("Sample").unwrap().len(), 2);
    }
}
