//! The on-disk fixture store
//!
//! Fixtures are text files under a message directory, named deterministically
//! from an [`EntityKey`] or [`SearchKey`]. Existence of a file is the sole
//! signal of "recorded"; absence is a miss. An unreadable or corrupt file is
//! also treated as "no fixture usable", but the underlying cause is logged
//! so corruption never masquerades as simple absence.
//!
//! Versioned update fixtures land in a separate, optional updates directory.
//! Version numbers for one entity are allocated under a per-store lock: the
//! smallest free suffix is probed and reserved with an atomic
//! create-if-absent, so two concurrent writers can never choose the same
//! version or clobber each other.

use crate::merge::reconcile;
use reprise_core::{
    EntityKey, FixtureError, Link, LinkBatch, Marshaller, Recordable, Result, Search, SearchKey,
};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads and writes entity, list, and search fixtures
///
/// Owns its allocation lock, so independent stores (e.g. one per test)
/// allocate versions without false contention.
pub struct FixtureStore {
    /// Directory holding recorded messages
    message_dir: PathBuf,
    /// Directory receiving versioned update snapshots, when configured
    updates_dir: Option<PathBuf>,
    /// Serializer for entity payloads
    marshaller: Arc<dyn Marshaller>,
    /// Guards probe-then-create version allocation
    allocation_lock: Mutex<()>,
}

impl FixtureStore {
    /// Create a store over a message directory
    pub fn new(message_dir: impl Into<PathBuf>, marshaller: Arc<dyn Marshaller>) -> Self {
        FixtureStore {
            message_dir: message_dir.into(),
            updates_dir: None,
            marshaller,
            allocation_lock: Mutex::new(()),
        }
    }

    /// Builder: configure a directory for versioned update snapshots.
    ///
    /// Without one, [`FixtureStore::write_versioned_update`] is a deliberate
    /// no-op and mutating calls in playback stay blocked.
    pub fn with_updates_dir(mut self, updates_dir: impl Into<PathBuf>) -> Self {
        self.updates_dir = Some(updates_dir.into());
        self
    }

    /// The message directory fixtures are read from and written to
    pub fn message_dir(&self) -> &Path {
        &self.message_dir
    }

    /// The updates directory, if one is configured
    pub fn updates_dir(&self) -> Option<&Path> {
        self.updates_dir.as_deref()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Load the entity fixture for a `(type, locator)` pair.
    ///
    /// # Errors
    ///
    /// [`FixtureError::Miss`] when no fixture file exists (or it cannot be
    /// read; the cause is logged), [`FixtureError::MalformedFixture`] when
    /// the file exists but fails to deserialize.
    pub fn read_entity(&self, type_name: &str, locator: &str) -> Result<Box<dyn Recordable>> {
        let key = EntityKey::from_locator(type_name, locator)?;
        let name = key.file_name();
        let bytes = self.read_fixture(&name)?;

        match self.marshaller.unmarshal(&bytes, type_name) {
            Ok(entity) => Ok(entity),
            Err(FixtureError::MalformedFixture { detail, .. }) => {
                warn!(
                    target: "reprise::store",
                    file = %name,
                    detail = %detail,
                    "Fixture exists but failed to deserialize"
                );
                Err(FixtureError::MalformedFixture { name, detail })
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize an entity to its fixture file.
    ///
    /// Overwrites any previous fixture for the same key: the file always
    /// holds the latest recorded state of the entity.
    pub fn write_entity(&self, entity: &dyn Recordable) -> Result<()> {
        let key = EntityKey::for_entity(entity)?;
        let bytes = self.marshaller.marshal(entity)?;
        self.write_text(&self.message_dir.join(key.file_name()), bytes)
    }

    /// Snapshot an updated entity under the next free version suffix.
    ///
    /// Returns `Ok(None)` when no updates directory is configured: the
    /// operation is then a deliberate no-op and the caller decides whether
    /// that constitutes a blocked write. Otherwise the smallest version not
    /// yet on disk is reserved atomically under the allocation lock and the
    /// entity is serialized into the reserved file.
    pub fn write_versioned_update(&self, entity: &dyn Recordable) -> Result<Option<PathBuf>> {
        let Some(updates_dir) = self.updates_dir.as_deref() else {
            return Ok(None);
        };

        let key = EntityKey::for_entity(entity)?;
        let bytes = self.marshaller.marshal(entity)?;

        let path = {
            let _guard = self.allocation_lock.lock();
            let mut version = 0u32;
            loop {
                let candidate = updates_dir.join(key.versioned_file_name(version));
                match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                    Ok(_) => break candidate,
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => version += 1,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.write_text(&path, bytes)?;
        Ok(Some(path))
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// Load the recorded list of links for a batch type.
    ///
    /// The absence of the file is the only miss: a batch recorded with zero
    /// links reads back as an empty list.
    pub fn read_list(&self, batch_type: &str) -> Result<Vec<Link>> {
        let name = LinkBatch::file_name_for(batch_type);
        let bytes = self.read_fixture(&name)?;

        match serde_json::from_slice::<LinkBatch>(&bytes) {
            Ok(batch) => Ok(batch.links),
            Err(e) => {
                warn!(
                    target: "reprise::store",
                    file = %name,
                    detail = %e,
                    "List fixture exists but failed to deserialize"
                );
                Err(FixtureError::MalformedFixture {
                    name,
                    detail: e.to_string(),
                })
            }
        }
    }

    /// Overwrite the single list fixture for a batch type.
    ///
    /// One fixture per type, not per call; the last recorded list wins.
    pub fn write_list(&self, batch_type: &str, links: &[Link]) -> Result<()> {
        let batch = LinkBatch::new(batch_type, links.to_vec());
        let bytes =
            serde_json::to_vec(&batch).map_err(|e| FixtureError::Marshal(e.to_string()))?;
        self.write_text(&self.message_dir.join(batch.file_name()), bytes)
    }

    // ========================================================================
    // Searches
    // ========================================================================

    /// Load the stored search at the key's fixture location, if one is
    /// usable.
    ///
    /// Returns `None` both when no file exists and when the file cannot be
    /// read or parsed; the latter cases are logged, since corruption and
    /// absence deserve different diagnoses even though they drive the same
    /// fallback.
    pub fn read_search(&self, key: &SearchKey) -> Option<Search> {
        let name = key.file_name();
        let path = self.message_dir.join(&name);

        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(target: "reprise::store", file = %name, "Search file does not exist");
                return None;
            }
            Err(e) => {
                warn!(
                    target: "reprise::store",
                    file = %path.display(),
                    error = %e,
                    "Cannot read search fixture"
                );
                return None;
            }
        };

        match serde_json::from_slice::<Search>(&bytes) {
            Ok(search) => Some(search),
            Err(e) => {
                warn!(
                    target: "reprise::store",
                    file = %name,
                    error = %e,
                    "Could not reload previous search"
                );
                None
            }
        }
    }

    /// Record a completed search, merging with any previously stored search
    /// at the same fixture location.
    ///
    /// Returns whether the fixture file was written. An identical re-run
    /// (or one whose results the stored search already covers) leaves the
    /// file untouched.
    pub fn record_search(&self, search: Search) -> Result<bool> {
        let name = search.file_name();
        let stored = self.read_search(search.key());

        let outcome = reconcile(search, stored);
        if !outcome.must_persist {
            return Ok(false);
        }

        let bytes = serde_json::to_vec(&outcome.search)
            .map_err(|e| FixtureError::Marshal(e.to_string()))?;
        self.write_text(&self.message_dir.join(name), bytes)?;
        Ok(true)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Read a fixture file, mapping absence (and unreadability, which is
    /// logged) to a miss.
    fn read_fixture(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.message_dir.join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FixtureError::Miss(name.to_string()))
            }
            Err(e) => {
                warn!(
                    target: "reprise::store",
                    file = %path.display(),
                    error = %e,
                    "Cannot read fixture, treating as unrecorded"
                );
                Err(FixtureError::Miss(name.to_string()))
            }
        }
    }

    /// Write a newline-terminated text fixture.
    fn write_text(&self, path: &Path, mut bytes: Vec<u8>) -> Result<()> {
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for FixtureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureStore")
            .field("message_dir", &self.message_dir)
            .field("updates_dir", &self.updates_dir)
            .finish_non_exhaustive()
    }
}
