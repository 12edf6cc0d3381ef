//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is read from a TOML file. Every field is optional;
//! a missing file means "use built-in defaults", a malformed file is an error.
//!
//! # Root folder priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `SDX_ROOT_FOLDER` environment variable
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SDX_ROOT_FOLDER";

/// Environment variable pointing at an explicit TOML config file
pub const CONFIG_FILE_ENV: &str = "SDX_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding uploaded assets and converted scenes
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP listen address, e.g. "127.0.0.1:5730"
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Event bus buffer size
    #[serde(default)]
    pub event_capacity: Option<usize>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Conversion task retention (optional)
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Conversion task bookkeeping
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// Seconds a finished task stays queryable before it is reclaimed
    #[serde(default = "default_task_retention_secs")]
    pub task_retention_secs: u64,

    /// Seconds between reaper sweeps
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            task_retention_secs: default_task_retention_secs(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_task_retention_secs() -> u64 {
    600
}

fn default_reap_interval_secs() -> u64 {
    60
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    ///
    /// A missing file yields defaults with a warning. A file that exists but
    /// does not parse is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Locate and load the service configuration
    ///
    /// Priority: explicit path → `SDX_CONFIG` → platform config directory.
    pub fn discover(explicit: Option<&Path>, module_name: &str) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            return Self::load(Path::new(&path));
        }
        match default_config_path(module_name) {
            Some(path) => Self::load(&path),
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file path, e.g. `~/.config/sdx/sdx-sv.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sdx").join(format!("{}.toml", module_name)))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sdx"))
        .unwrap_or_else(|| PathBuf::from("./sdx_data"))
}

/// Resolves the root folder following the documented priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: toml_config.root_folder.clone(),
        }
    }

    /// Resolve the root folder; never fails, falls back to the compiled default
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            info!("Root folder from TOML config: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("Root folder from compiled default: {}", path.display());
        path
    }
}

/// Creates the root folder layout on first start
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory receiving uploaded glTF assets
    pub fn upload_dir(&self) -> PathBuf {
        self.root.join("gltf")
    }

    /// Directory receiving converted scene documents
    pub fn scenes_dir(&self) -> PathBuf {
        self.root.join("scenes")
    }

    /// Create root, upload and scenes directories (idempotent)
    pub fn ensure_directories_exist(&self) -> Result<()> {
        for dir in [self.root.clone(), self.upload_dir(), self.scenes_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }
}
