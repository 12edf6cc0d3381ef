//! # SDX Common Library
//!
//! Shared code for the scene document exchange services including:
//! - The scene document engine (document model, node paths, stores)
//! - Event types (SceneEvent enum) and the EventBus
//! - Configuration loading and root folder resolution
//! - SSE helpers

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
