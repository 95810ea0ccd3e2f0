//! Scratch workspaces for unpacking project archives.
//!
//! Each operation gets its own uniquely named directory next to the project
//! (or in the configured scratch directory). The directory is removed when
//! the [`Workspace`] guard is dropped, on success and failure alike. Removal
//! failures are logged and never returned.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{Result, SyringeError};
use crate::paths;

/// Prefix shared by every workspace directory.
pub const WORKSPACE_PREFIX: &str = ".hfs-";

/// Which operation a workspace belongs to. Used in the directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    Extract,
    Inject,
}

impl StageMode {
    fn prefix(self) -> &'static str {
        match self {
            StageMode::Extract => ".hfs-extract-",
            StageMode::Inject => ".hfs-inject-",
        }
    }
}

/// Scoped scratch directory. Deleted on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace inside `base`.
    pub fn create(base: &Path, mode: StageMode) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(mode.prefix())
            .tempdir_in(base)
            .map_err(|e| SyringeError::io("Failed to create workspace in", base, e))?;
        let root = dir.path().to_path_buf();
        debug!("Created workspace {}", root.display());

        Ok(Self {
            dir: Some(dir),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(
                    "Failed to remove workspace {}: {}",
                    self.root.display(),
                    e
                );
            } else {
                debug!("Cleaned up workspace: {}", self.root.display());
            }
        }
    }
}

/// A project archive copied into and unpacked inside a workspace.
#[derive(Debug)]
pub struct StagedArchive {
    workspace: Workspace,
    copy: Option<PathBuf>,
}

impl StagedArchive {
    /// Root of the unpacked archive tree.
    pub fn root(&self) -> &Path {
        self.workspace.root()
    }

    /// The archive copy inside the workspace, unless already discarded.
    pub fn copy_path(&self) -> Option<&Path> {
        self.copy.as_deref()
    }

    /// Remove the archive copy so it is not picked up when repacking.
    pub fn discard_copy(&mut self) {
        if let Some(copy) = self.copy.take() {
            if let Err(e) = fs::remove_file(&copy) {
                warn!("Failed to remove staged copy {}: {}", copy.display(), e);
            }
        }
    }
}

/// Copy `archive` into a new workspace under `scratch_base` and unpack it there.
pub fn stage(archive: &Path, scratch_base: &Path, mode: StageMode) -> Result<StagedArchive> {
    if !archive.is_file() {
        return Err(SyringeError::MissingInput {
            what: "Highland file",
            path: archive.to_path_buf(),
        });
    }

    let workspace = Workspace::create(scratch_base, mode)?;

    let copy = workspace
        .root()
        .join(format!("{}.zip", paths::project_stem(archive)));
    fs::copy(archive, &copy).map_err(|e| SyringeError::io("Failed to copy", archive, e))?;

    let count = unpack_zip(&copy, workspace.root())?;
    info!(
        "Staged {} ({} entries) in {}",
        archive.display(),
        count,
        workspace.root().display()
    );

    Ok(StagedArchive {
        workspace,
        copy: Some(copy),
    })
}

/// Unpack every entry of a ZIP file into `output_dir`, preserving relative paths.
///
/// Returns the number of entries written. Entries whose names would land
/// outside `output_dir` are skipped.
pub fn unpack_zip(archive_path: &Path, output_dir: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .map_err(|e| SyringeError::io("Failed to open", archive_path, e))?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = safe_relative_path(entry.name()) else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let target = output_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| SyringeError::io("Failed to create", &target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| SyringeError::io("Failed to create", parent, e))?;
            }
            let mut output = File::create(&target)
                .map_err(|e| SyringeError::io("Failed to create", &target, e))?;
            io::copy(&mut entry, &mut output)
                .map_err(|e| SyringeError::io("Failed to unpack", &target, e))?;
        }
        written += 1;
    }

    Ok(written)
}

/// Turn an archive entry name into a relative path that stays inside the
/// unpack directory.
///
/// Backslashes are treated as separators (Windows-made ZIPs). Returns
/// `None` for absolute names, `..` components and empty names.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut out = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Remove leftovers from interrupted runs.
///
/// Covers workspace directories and the `.tmp` files written while an
/// archive or revision record is being replaced. Only names carrying the
/// workspace prefix are touched.
pub fn cleanup_stale_workspaces(dir: &Path) -> usize {
    let mut cleaned = 0;
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with(WORKSPACE_PREFIX) {
                continue;
            }

            let path = entry.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else if path.is_file() && name_str.ends_with(".tmp") {
                fs::remove_file(&path)
            } else {
                continue;
            };
            match removed {
                Ok(()) => cleaned += 1,
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
    if cleaned > 0 {
        info!("Cleaned up {} leftover workspaces and temp files in {}", cleaned, dir.display());
    }
    cleaned
}
