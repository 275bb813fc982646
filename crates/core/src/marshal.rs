//! The entity serialization seam
//!
//! All entity bytes passing between the fixture store and disk go through a
//! [`Marshaller`]. The wire schema of the domain entities is not this
//! layer's concern: whatever the surrounding REST client uses to serialize
//! its entities plugs in here, and the store only sees opaque byte streams
//! and fixture names.
//!
//! A JSON-backed marshaller over [`GenericEntity`] is bundled as the
//! default implementation. It is what the test suites use, and it is enough
//! for clients whose entities are plain field maps.

use crate::entity::Recordable;
use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Entity marshaller trait.
///
/// Implementations must be `Send + Sync`: one marshaller instance is shared
/// by every thread that records or plays back fixtures.
pub trait Marshaller: Send + Sync {
    /// Serialize an entity to its fixture byte form.
    fn marshal(&self, entity: &dyn Recordable) -> Result<Vec<u8>>;

    /// Deserialize an entity of the named type from fixture bytes.
    ///
    /// Fails with [`FixtureError::MalformedFixture`] on structurally
    /// invalid input.
    fn unmarshal(&self, bytes: &[u8], type_name: &str) -> Result<Box<dyn Recordable>>;
}

/// A schemaless entity: type name, identity, and a bag of JSON fields
///
/// The bundled stand-in for a full domain entity model. Field-for-field
/// equality makes round-trip assertions direct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEntity {
    entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<String>,
    uri: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl GenericEntity {
    /// Create an entity with a type and locator URI
    pub fn new(entity_type: impl Into<String>, uri: impl Into<String>) -> Self {
        GenericEntity {
            entity_type: entity_type.into(),
            id: None,
            uri: uri.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Builder: set the server-assigned id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: set a field
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Set a field
    pub fn set_field(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.fields.insert(name.into(), value);
    }
}

impl Recordable for GenericEntity {
    fn type_name(&self) -> &str {
        &self.entity_type
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// JSON marshaller for [`GenericEntity`] values
///
/// Produces compact single-object JSON text. Other entity models need their
/// own [`Marshaller`]; this one refuses anything that is not a
/// `GenericEntity`.
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
    fn marshal(&self, entity: &dyn Recordable) -> Result<Vec<u8>> {
        let generic = entity
            .as_any()
            .downcast_ref::<GenericEntity>()
            .ok_or_else(|| {
                FixtureError::Marshal(format!(
                    "JsonMarshaller only handles GenericEntity, got {}",
                    entity.type_name()
                ))
            })?;
        serde_json::to_vec(generic).map_err(|e| FixtureError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, bytes: &[u8], type_name: &str) -> Result<Box<dyn Recordable>> {
        let generic: GenericEntity =
            serde_json::from_slice(bytes).map_err(|e| FixtureError::MalformedFixture {
                name: type_name.to_string(),
                detail: e.to_string(),
            })?;
        if generic.entity_type != type_name {
            return Err(FixtureError::MalformedFixture {
                name: type_name.to_string(),
                detail: format!("fixture contains a {} entity", generic.entity_type),
            });
        }
        Ok(Box::new(generic))
    }
}
