//! Resolved attribute values

use sdx_common::document::{AttributeKind, NodePath, Vec3};
use serde::Serialize;

/// Value of an attribute as seen by callers
///
/// For time-sampled attributes `time` is the key the value was read from or
/// written to (always the first recorded key).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeValue {
    pub value: Vec3,
    pub kind: AttributeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl AttributeValue {
    pub fn from_static(value: Vec3) -> Self {
        Self {
            value,
            kind: AttributeKind::Static,
            time: None,
        }
    }

    pub fn from_sample(time: f64, value: Vec3) -> Self {
        Self {
            value,
            kind: AttributeKind::TimeSampled,
            time: Some(time),
        }
    }

    /// `(x, y, z)` form returned at the service boundary
    pub fn formatted(&self) -> String {
        self.value.to_string()
    }
}

/// Attribute of one located node, as returned by get/set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAttribute {
    pub node_path: String,
    /// Formatted vector, e.g. `(1, 2, 3)`
    pub value: String,
    pub kind: AttributeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl NodeAttribute {
    pub fn new(node_path: &NodePath, attribute: &AttributeValue) -> Self {
        Self {
            node_path: node_path.to_string(),
            value: attribute.formatted(),
            kind: attribute.kind,
            time: attribute.time,
        }
    }
}
