//! Fountain injection into a copy of a Highland project.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::{self, StageMode};
use crate::bundle;
use crate::config::SyringeConfig;
use crate::error::{Result, SyringeError};
use crate::paths;
use crate::revision;

/// Write `fountain` into a copy of `highland` and return the new archive path.
///
/// Steps:
/// 1. Stage the project and drop the staged archive copy
/// 2. Replace the bundle's text file with the Fountain text
/// 3. Patch `revisions/current.json` when present
/// 4. Repack with the bundle as the first top-level entry, then every
///    other top-level file or folder of the original archive
pub(crate) fn run(config: &SyringeConfig, fountain: &Path, highland: &Path) -> Result<PathBuf> {
    require_file("Fountain file", fountain)?;
    require_file("Highland file", highland)?;

    let mut staged =
        archive::stage(highland, &config.scratch_dir_for(highland), StageMode::Inject)?;
    staged.discard_copy();

    let location = bundle::locate_bundle(staged.root())?;

    let text = fs::read_to_string(fountain)
        .map_err(|e| SyringeError::io("Failed to read", fountain, e))?;
    fs::write(&location.text, &text)
        .map_err(|e| SyringeError::io("Failed to write", &location.text, e))?;

    if let Some(record) = location.revision_record() {
        revision::patch_revision(&record, &text)?;
    } else {
        debug!("No revision record in {}", location.bundle_name());
    }

    let output = paths::injection_output(&config.output_dir_for(highland), highland);
    let root = staged.root();
    let entries = archive::write_archive_atomically(
        &output,
        config.compression.method(),
        |builder| {
            builder.add_tree(root, &location.bundle)?;

            for other in top_level_entries(root)? {
                if other == location.bundle {
                    continue;
                }
                if other.is_file() {
                    let name = paths::entry_name(other.strip_prefix(root).unwrap_or(&other));
                    builder.add_file(&other, &name)?;
                } else if other.is_dir() {
                    builder.add_tree(root, &other)?;
                }
            }
            Ok(())
        },
    )?;

    info!(
        "Injected {} into {} ({} entries)",
        fountain.display(),
        output.display(),
        entries
    );
    Ok(output)
}

fn require_file(what: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SyringeError::MissingInput {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Immediate children of the workspace root, sorted by name.
fn top_level_entries(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| SyringeError::io("Failed to read", root, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}
