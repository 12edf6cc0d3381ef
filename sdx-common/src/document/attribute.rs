//! Attribute storage: static values and time-sampled values

use serde::{Deserialize, Serialize};
use std::fmt;

/// 3-component vector (translation, scale, ...)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Formats as `(x, y, z)` using the shortest round-trip float form
impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One (time key, value) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    pub time: f64,
    pub value: Vec3,
}

impl TimeSample {
    pub fn new(time: f64, value: Vec3) -> Self {
        Self { time, value }
    }
}

/// Samples ordered by ascending time key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TimeSample>", into = "Vec<TimeSample>")]
pub struct TimeSamples(Vec<TimeSample>);

impl TimeSamples {
    pub fn as_slice(&self) -> &[TimeSample] {
        &self.0
    }

    pub fn first(&self) -> Option<&TimeSample> {
        self.0.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut TimeSample> {
        self.0.first_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at an exact time key
    pub fn at(&self, time: f64) -> Option<Vec3> {
        self.0.iter().find(|s| s.time == time).map(|s| s.value)
    }
}

impl From<Vec<TimeSample>> for TimeSamples {
    fn from(mut samples: Vec<TimeSample>) -> Self {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self(samples)
    }
}

impl From<TimeSamples> for Vec<TimeSample> {
    fn from(samples: TimeSamples) -> Self {
        samples.0
    }
}

/// Which addressing scheme an attribute uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Static,
    TimeSampled,
}

/// Stored attribute value
///
/// An attribute is exactly one kind for its lifetime; nothing in the engine
/// converts between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeData {
    Static { value: Vec3 },
    TimeSampled { samples: TimeSamples },
}

impl AttributeData {
    pub fn static_value(value: Vec3) -> Self {
        AttributeData::Static { value }
    }

    /// Build a time-sampled attribute; samples are sorted by time key
    pub fn time_sampled(samples: Vec<TimeSample>) -> Self {
        AttributeData::TimeSampled {
            samples: samples.into(),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeData::Static { .. } => AttributeKind::Static,
            AttributeData::TimeSampled { .. } => AttributeKind::TimeSampled,
        }
    }
}
