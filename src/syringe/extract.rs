//! Fountain extraction from a Highland project.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::{self, StageMode};
use crate::bundle;
use crate::config::SyringeConfig;
use crate::error::{Result, SyringeError};
use crate::paths;

/// Copy the bundle's text file out as `<stem>_extraction.fountain`.
///
/// The workspace is dropped (and removed) before this returns, whatever
/// the outcome.
pub(crate) fn run(config: &SyringeConfig, highland: &Path) -> Result<PathBuf> {
    let staged = archive::stage(highland, &config.scratch_dir_for(highland), StageMode::Extract)?;
    let location = bundle::locate_bundle(staged.root())?;

    let output = paths::extraction_output(&config.output_dir_for(highland), highland);
    let bytes = fs::copy(&location.text, &output)
        .map_err(|e| SyringeError::io("Failed to write", &output, e))?;

    info!(
        "Extracted {} ({} bytes) from {} to {}",
        location.text.display(),
        bytes,
        location.bundle_name(),
        output.display()
    );
    Ok(output)
}
