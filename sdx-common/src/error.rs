//! Error type for configuration and root folder setup

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while loading configuration or preparing the root folder
///
/// Document and path failures have their own types in [`crate::document`].
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a config file or creating a root folder directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A config file exists but could not be used
    #[error("Configuration error: {0}")]
    Config(String),
}
