//! Reprise - record/playback fixture layer for offline REST client tests
//!
//! Reprise wraps a REST API client with two decorators: a recording client
//! that lets calls hit the real backend and persists every returned entity,
//! list, and search result as a deterministic on-disk fixture, and a playback
//! client that answers the same calls from those fixtures with no network
//! access at all.
//!
//! # Quick Start
//!
//! ```ignore
//! use reprise::{FixtureStore, JsonMarshaller, PlaybackClient, SearchKey};
//! use std::sync::Arc;
//!
//! // Answer calls from a directory of recorded fixtures
//! let store = Arc::new(FixtureStore::new("serverexchanges", Arc::new(JsonMarshaller)));
//! let client = PlaybackClient::new(store, batches);
//!
//! let sample = client.load("Sample", "https://lims.example.com/api/samples/S123")?;
//! ```
//!
//! # Architecture
//!
//! Both decorators implement the same [`ApiClient`] capability set, so call
//! sites are unaware which mode is active. A test run is wired into exactly
//! one mode; there is no runtime transition between recording and playback.
//!
//! Fixture naming, search-key canonicalization, and the merge rules for
//! repeated searches live in `reprise-core` and `reprise-store`.

// Re-export the public API from the member crates
pub use reprise_client::*;
pub use reprise_core::*;
pub use reprise_store::*;
