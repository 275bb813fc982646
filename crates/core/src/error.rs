//! Error types for the fixture layer
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two categories matter for control flow: a *miss* (no usable fixture for a
//! key, expected during playback and recoverable by caller policy) and
//! everything else. A malformed fixture is treated as a miss for control flow
//! but kept as its own variant so corruption is distinguishable from simple
//! absence in logs.

use std::io;
use thiserror::Error;

/// Result type alias for fixture operations
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Error types for the fixture layer
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Requested fixture does not exist
    #[error("There is no fixture {0} recorded")]
    Miss(String),

    /// Fixture exists but fails to deserialize
    #[error("Fixture {name} is malformed: {detail}")]
    MalformedFixture {
        /// Name of the offending fixture file
        name: String,
        /// What went wrong during deserialization
        detail: String,
    },

    /// An entity could not be serialized for recording
    #[error("Cannot marshal entity: {0}")]
    Marshal(String),

    /// No id could be derived from an entity's locator
    #[error("Cannot derive an id from locator: {0}")]
    MalformedLocator(String),

    /// An entity type has no known batch (link-collection) type
    #[error("{0} is not returned by any known batch type")]
    UnknownBatchType(String),

    /// Two searches for different entity types cannot be merged
    #[error("Can't merge searches for different entity types: {ours} and {theirs}")]
    EntityTypeMismatch {
        /// Entity type of the receiving search
        ours: String,
        /// Entity type of the search being merged in
        theirs: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FixtureError {
    /// Whether this error means "no usable fixture" for playback fallback.
    ///
    /// Covers both a genuinely absent fixture and one that exists but cannot
    /// be deserialized. The two are logged differently but drive the same
    /// caller policy (raise vs. return empty).
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            FixtureError::Miss(_) | FixtureError::MalformedFixture { .. }
        )
    }
}
