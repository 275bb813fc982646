//! Core types for the reprise fixture layer
//!
//! This crate defines the foundational types shared by the fixture store and
//! the record/playback clients:
//! - ParamValue / ParamTerm: canonical, type-aware search parameter values
//! - SearchKey: order-independent identity of a search's parameters + type
//! - Search: a persisted search record (key + result links)
//! - EntityKey: deterministic fixture file naming for entities
//! - Link: lightweight type + locator reference to an entity
//! - Marshaller / BatchResolver: seams to the entity serializer and the
//!   batch-type lookup, both owned by the surrounding API client
//!
//! These types define the interface contracts for fixture operations. The
//! file I/O itself lives in `reprise-store`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod entity;
pub mod error;
pub mod link;
pub mod marshal;
pub mod params;
pub mod search;

pub use batch::{BatchMap, BatchResolver};
pub use entity::{EntityKey, Recordable};
pub use error::{FixtureError, Result};
pub use link::{Link, LinkBatch};
pub use marshal::{GenericEntity, JsonMarshaller, Marshaller};
pub use params::{ParamTerm, ParamValue};
pub use search::{Search, SearchKey};
