//! Fixture store for the reprise record/playback layer
//!
//! This crate owns the on-disk fixture tree:
//! - FixtureStore: reads and writes entity, list, and search fixtures under
//!   a message directory (and an optional updates directory)
//! - Versioned file-name allocation for repeated updates to one entity,
//!   serialized by a per-store lock
//! - reconcile: the merge algorithm for a search that was recorded before
//!
//! # Concurrency
//!
//! A store is safe for concurrent use from multiple worker threads. The
//! only coordinated operation is version-number allocation; writers to
//! distinct fixture paths interleave freely since each owns its own file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod merge;
pub mod store;

pub use merge::{reconcile, Reconciled};
pub use store::FixtureStore;
