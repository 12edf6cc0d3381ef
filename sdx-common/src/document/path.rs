//! Absolute node paths and the two addressable node categories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Node path parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("node path must be absolute: {0}")]
    NotAbsolute(String),

    #[error("node path has an empty segment: {0}")]
    EmptySegment(String),

    #[error("invalid path segment '{segment}' in {path}")]
    InvalidSegment { path: String, segment: String },

    #[error("unknown node category: {0}")]
    UnknownCategory(String),
}

/// Validated absolute node path, e.g. `/Meshes/node_0001`
///
/// The root path is `/` and has no segments. Segments match
/// `[A-Za-z_][A-Za-z0-9_]*`, so wildcards and relative components are
/// rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for the root path
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root path
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one validated segment
    pub fn child(&self, segment: &str) -> Result<NodePath, PathError> {
        if !is_valid_segment(segment) {
            return Err(PathError::InvalidSegment {
                path: self.to_string(),
                segment: segment.to_string(),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }
}

/// True if `segment` is a legal node name
pub fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PathError::NotAbsolute(s.to_string()))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(s.to_string()));
            }
            if !is_valid_segment(segment) {
                return Err(PathError::InvalidSegment {
                    path: s.to_string(),
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The two families of addressable nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Mesh,
    Camera,
}

impl NodeCategory {
    /// Plural group segment under the document root
    pub fn group_segment(self) -> &'static str {
        match self {
            NodeCategory::Mesh => "Meshes",
            NodeCategory::Camera => "Cameras",
        }
    }

    /// Path of the category group, e.g. `/Meshes`
    pub fn group_path(self) -> NodePath {
        NodePath {
            segments: vec![self.group_segment().to_string()],
        }
    }

    /// Path `/<CategoryPlural>/<name>`
    pub fn path_for(self, name: &str) -> Result<NodePath, PathError> {
        self.group_path().child(name)
    }
}

impl FromStr for NodeCategory {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mesh" | "meshes" => Ok(NodeCategory::Mesh),
            "camera" | "cameras" => Ok(NodeCategory::Camera),
            _ => Err(PathError::UnknownCategory(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for NodeCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeCategory::Mesh => f.write_str("mesh"),
            NodeCategory::Camera => f.write_str("camera"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path: NodePath = "/Meshes/node_0001".parse().unwrap();
        assert_eq!(path.segments(), &["Meshes", "node_0001"]);
        assert_eq!(path.name(), Some("node_0001"));
        assert_eq!(path.to_string(), "/Meshes/node_0001");
        assert_eq!(path.parent().unwrap().to_string(), "/Meshes");
    }

    #[test]
    fn root_path() {
        let root: NodePath = "/".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "/");
        assert!(root.parent().is_none());
    }

    #[test]
    fn rejects_relative_and_wildcards() {
        assert!(matches!(
            "Meshes/a".parse::<NodePath>(),
            Err(PathError::NotAbsolute(_))
        ));
        assert!(matches!(
            "/Meshes/*".parse::<NodePath>(),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            "/Meshes/../Cameras".parse::<NodePath>(),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            "/Meshes//a".parse::<NodePath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "/Meshes/a/".parse::<NodePath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!("/Meshes/1abc".parse::<NodePath>().is_err());
    }

    #[test]
    fn category_paths() {
        assert_eq!(
            NodeCategory::Mesh.path_for("node_0001").unwrap().to_string(),
            "/Meshes/node_0001"
        );
        assert_eq!(
            NodeCategory::Camera.path_for("main").unwrap().to_string(),
            "/Cameras/main"
        );
        assert!(NodeCategory::Mesh.path_for("bad name").is_err());
    }

    #[test]
    fn category_parse_is_lenient() {
        assert_eq!("Mesh".parse::<NodeCategory>().unwrap(), NodeCategory::Mesh);
        assert_eq!("meshes".parse::<NodeCategory>().unwrap(), NodeCategory::Mesh);
        assert_eq!("CAMERAS".parse::<NodeCategory>().unwrap(), NodeCategory::Camera);
        assert!("light".parse::<NodeCategory>().is_err());
    }
}
