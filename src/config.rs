//! Run configuration
//!
//! Defines where outputs and scratch workspaces go and how rebuilt
//! archives are compressed. Loaded from an optional JSON file and then
//! overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, SyringeError};
use crate::paths;

/// Compression used for entries of the rebuilt project archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    pub fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Configuration shared by extraction and injection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyringeConfig {
    /// Where output files are written (default: next to the project file)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Where scratch workspaces are created (default: next to the project file)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Compression for the injected archive
    #[serde(default)]
    pub compression: Compression,
}

impl SyringeConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| SyringeError::io("Failed to read config", path, e))?;
        let config: SyringeConfig = serde_json::from_str(&data).map_err(|e| {
            SyringeError::io(
                "Failed to parse config",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                return Err(ConfigError::OutputDirNotFound(dir.clone()));
            }
        }

        if let Some(dir) = &self.scratch_dir {
            if !dir.is_dir() {
                return Err(ConfigError::ScratchDirNotFound(dir.clone()));
            }
        }

        Ok(())
    }

    /// Output directory for a given project file
    pub fn output_dir_for(&self, project: &Path) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| paths::project_dir(project))
    }

    /// Scratch directory for a given project file
    pub fn scratch_dir_for(&self, project: &Path) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| paths::project_dir(project))
    }
}
