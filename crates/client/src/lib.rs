//! Record and playback clients for the reprise fixture layer
//!
//! This crate provides the two mode-specific decorators around a REST
//! client:
//! - RecordingClient: proceed to the real backend, then persist what came
//!   back as fixtures
//! - PlaybackClient: answer entirely from fixtures, with no backend at all
//!
//! Both implement the same [`ApiClient`] capability set, so call-site code
//! is unaware which mode is active. Each test run is wired into exactly one
//! mode; there is no transition between them at runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod playback;
pub mod record;
pub mod traits;

pub use playback::{FindMissPolicy, PlaybackClient};
pub use record::RecordingClient;
pub use traits::{ApiClient, EntityResponse, ResponseStatus};
