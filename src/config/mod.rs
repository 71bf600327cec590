//! Configuration module for streamchain
//!
//! Settings that shape pipelines built by the `streamchain` binary and the
//! adapters in [`crate::convert`]:
//! - Read chunk size for reader-backed sources
//! - Default options for file sinks
//! - Default log filter
//!
//! # Config Location
//!
//! The config file lives in the platform-appropriate config directory:
//! - **Linux**: `~/.config/streamchain/config.toml`
//! - **macOS**: `~/Library/Application Support/streamchain/config.toml`
//! - **Windows**: `%APPDATA%\streamchain\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use streamchain::config::StreamConfig;
//!
//! let mut config = StreamConfig::load_or_default();
//! config.file_sink.append = true;
//! config.save_default()?;
//! ```

use crate::convert::DEFAULT_READ_CHUNK_SIZE;
use crate::error::{StreamError, StreamResult};
use crate::pipeline::nodes::FileSinkOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "streamchain";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn,streamchain=info";

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Bytes read per chunk from files and stdin
    pub read_chunk_size: usize,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Options for file sinks
    pub file_sink: FileSinkOptions,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            file_sink: FileSinkOptions::default(),
        }
    }
}

impl StreamConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            StreamError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location. A missing file yields defaults; any
    /// other failure is logged and also yields defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config file to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> StreamResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StreamError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| StreamError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            StreamError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Save to the default location
    pub fn save_default(&self) -> StreamResult<()> {
        let path = config_path().ok_or_else(|| {
            StreamError::Config("Could not determine config directory".to_string())
        })?;
        self.save(path)
    }

    fn validate(&self) -> StreamResult<()> {
        if self.read_chunk_size == 0 {
            return Err(StreamError::Config(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.file_sink.buffer_capacity == 0 {
            return Err(StreamError::Config(
                "file_sink.buffer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
