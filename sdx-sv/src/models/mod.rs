//! Data models for sdx-sv

pub mod attribute;
pub mod conversion;

pub use attribute::{AttributeValue, NodeAttribute};
pub use conversion::{ConversionProgress, ConversionState, ConversionStatus, TaskId};
