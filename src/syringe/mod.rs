//! Extraction and injection pipelines.
//!
//! This module handles:
//! - Validating the run configuration once per [`Syringe`]
//! - Converting internal failures into one error per operation
//! - Read-only inspection of a project for the `info` command
//!
//! # Example
//!
//! ```ignore
//! use highland_syringe::{Syringe, SyringeConfig};
//!
//! let syringe = Syringe::new(SyringeConfig::default())?;
//! let fountain = syringe.extract("Script.highland".as_ref())?;
//! let project = syringe.inject(&fountain, "Script.highland".as_ref())?;
//! ```

mod extract;
mod inject;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::archive::{self, StageMode};
use crate::bundle;
use crate::config::SyringeConfig;
use crate::error::{ExtractionError, InjectionError, Result, SyringeError};
use crate::revision::{LookupStrategy, RevisionRecord};

/// Runs extractions and injections with a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Syringe {
    config: SyringeConfig,
}

impl Syringe {
    pub fn new(config: SyringeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Extract the screenplay text to `<stem>_extraction.fountain`.
    pub fn extract(&self, highland: &Path) -> Result<PathBuf, ExtractionError> {
        extract::run(&self.config, highland).map_err(|e| {
            warn!("Extraction of {} failed: {}", highland.display(), e);
            ExtractionError::from(e)
        })
    }

    /// Write `fountain` into a copy of `highland` named `<stem>_injected.highland`.
    pub fn inject(&self, fountain: &Path, highland: &Path) -> Result<PathBuf, InjectionError> {
        inject::run(&self.config, fountain, highland).map_err(|e| {
            warn!("Injection into {} failed: {}", highland.display(), e);
            InjectionError::from(e)
        })
    }

    /// Summarise a project without writing anything next to it.
    pub fn inspect(&self, highland: &Path) -> Result<ProjectInfo> {
        let staged = archive::stage(
            highland,
            &self.config.scratch_dir_for(highland),
            StageMode::Extract,
        )?;
        let location = bundle::locate_bundle(staged.root())?;

        let text_bytes = fs::metadata(&location.text)
            .map_err(|e| SyringeError::io("Failed to read", &location.text, e))?
            .len();
        let text_file = location
            .text
            .strip_prefix(&location.bundle)
            .unwrap_or(&location.text)
            .to_path_buf();

        let revision = match location.revision_record() {
            Some(path) => {
                let record = RevisionRecord::load(&path)?;
                Some(RevisionInfo {
                    strategy: record.payload_slot()?.map(|slot| slot.strategy),
                    text_chars: record.current_text()?.map(|t| t.chars().count()),
                })
            }
            None => None,
        };

        Ok(ProjectInfo {
            bundle_name: location.bundle_name(),
            text_file,
            text_bytes,
            revision,
        })
    }
}

/// What `inspect` found inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub bundle_name: String,
    /// Text file path relative to the bundle
    pub text_file: PathBuf,
    pub text_bytes: u64,
    pub revision: Option<RevisionInfo>,
}

/// Summary of `revisions/current.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    /// Tier that located the string payload, `None` if nothing matched
    pub strategy: Option<LookupStrategy>,
    /// Length of the current payload in characters
    pub text_chars: Option<usize>,
}

/// Extract with the default configuration.
pub fn extract(highland: &Path) -> Result<PathBuf, ExtractionError> {
    Syringe::default().extract(highland)
}

/// Inject with the default configuration.
pub fn inject(fountain: &Path, highland: &Path) -> Result<PathBuf, InjectionError> {
    Syringe::default().inject(fountain, highland)
}
