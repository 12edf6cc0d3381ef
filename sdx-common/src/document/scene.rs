//! Scene document tree

use super::attribute::AttributeData;
use super::path::{NodePath, PathError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute carrying a node's translation
pub const TRANSLATE_ATTRIBUTE: &str = "xformOp:translate";

/// Type name of plain transform/group nodes
pub const XFORM_TYPE: &str = "Xform";

const FORMAT_VERSION: u32 = 1;

/// One node of the scene tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, data: AttributeData) -> Self {
        self.attributes.insert(name.into(), data);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut AttributeData> {
        self.attributes.get_mut(name)
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

/// A whole scene document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub format_version: u32,
    #[serde(default = "default_up_axis")]
    pub up_axis: String,
    #[serde(default = "default_meters_per_unit")]
    pub meters_per_unit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub root: Node,
}

fn default_up_axis() -> String {
    "Y".to_string()
}

fn default_meters_per_unit() -> f64 {
    1.0
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    /// Empty document with an unnamed root
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            up_axis: default_up_axis(),
            meters_per_unit: default_meters_per_unit(),
            comment: None,
            root: Node::new("", XFORM_TYPE),
        }
    }

    /// Look up a node; the root path yields the root node
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Insert `node` under `parent`, creating missing ancestors as `Xform`
    /// groups. A node with the same name under `parent` is replaced.
    pub fn insert_node(&mut self, parent: &NodePath, node: Node) -> Result<NodePath, PathError> {
        let path = parent.child(&node.name)?;

        let mut current = &mut self.root;
        for segment in parent.segments() {
            let idx = match current.children.iter().position(|c| &c.name == segment) {
                Some(idx) => idx,
                None => {
                    current.children.push(Node::new(segment.clone(), XFORM_TYPE));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }

        match current.children.iter_mut().find(|c| c.name == node.name) {
            Some(existing) => *existing = node,
            None => current.children.push(node),
        }

        Ok(path)
    }

    /// Number of nodes excluding the root
    pub fn node_count(&self) -> usize {
        self.root.count() - 1
    }
}
