//! Attribute resolution on a single node
//!
//! Decides whether an attribute is static or time-sampled and reads/writes
//! it accordingly. Time-sampled attributes are always read from and written
//! to their FIRST recorded time key (index 0 of the ordered samples), never
//! "current time"; callers rely on that tie-break. A write never creates a
//! new time key and never changes an attribute's kind.

use crate::models::AttributeValue;
use sdx_common::document::{AttributeData, Node, Vec3};
use thiserror::Error;

/// Attribute-level failures (structural, never transient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),

    #[error("time-sampled attribute '{0}' has no samples")]
    NoTimeSamples(String),
}

/// Stateless resolver; all state lives in the node it is handed
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeResolver;

impl AttributeResolver {
    /// Read `attribute` on `node`
    pub fn get(node: &Node, attribute: &str) -> Result<AttributeValue, ResolveError> {
        match node.attribute(attribute) {
            None => Err(ResolveError::AttributeNotFound(attribute.to_string())),
            Some(AttributeData::Static { value }) => Ok(AttributeValue::from_static(*value)),
            Some(AttributeData::TimeSampled { samples }) => samples
                .first()
                .map(|s| AttributeValue::from_sample(s.time, s.value))
                .ok_or_else(|| ResolveError::NoTimeSamples(attribute.to_string())),
        }
    }

    /// Overwrite `attribute` on `node` and return what was written
    pub fn set(
        node: &mut Node,
        attribute: &str,
        value: Vec3,
    ) -> Result<AttributeValue, ResolveError> {
        match node.attribute_mut(attribute) {
            None => Err(ResolveError::AttributeNotFound(attribute.to_string())),
            Some(AttributeData::Static { value: current }) => {
                *current = value;
                Ok(AttributeValue::from_static(value))
            }
            Some(AttributeData::TimeSampled { samples }) => {
                let first = samples
                    .first_mut()
                    .ok_or_else(|| ResolveError::NoTimeSamples(attribute.to_string()))?;
                first.value = value;
                Ok(AttributeValue::from_sample(first.time, value))
            }
        }
    }
}
