//! Naming conventions for Highland project files
//!
//! A `.highland` file is a ZIP archive whose payload is a single
//! `<name>.textbundle` directory. This module handles:
//! - Recognising bundle, text and revision entries by name
//! - Deriving the output paths next to the source project
//! - Turning workspace-relative paths into ZIP entry names

use std::path::{Path, PathBuf};

/// Suffix of the text bundle directory at the archive's top level.
pub const BUNDLE_SUFFIX: &str = ".textbundle";

/// Suffix of the primary screenplay text inside the bundle.
pub const TEXT_SUFFIX: &str = ".md";

/// Extension of Highland project files.
pub const HIGHLAND_EXT: &str = "highland";

/// Extension of Fountain screenplay files.
pub const FOUNTAIN_EXT: &str = "fountain";

/// Revision record, relative to the bundle root.
pub const REVISION_RECORD: &str = "revisions/current.json";

/// Check whether a directory name marks a text bundle
pub fn is_bundle_name(name: &str) -> bool {
    name.ends_with(BUNDLE_SUFFIX)
}

/// Check whether a file name marks the primary text file
pub fn is_text_name(name: &str) -> bool {
    name.ends_with(TEXT_SUFFIX)
}

/// File stem of the project, used to name outputs
/// `/scripts/Script.highland` -> `Script`
pub fn project_stem(project: &Path) -> String {
    project
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Directory the project file lives in ("." for bare file names)
pub fn project_dir(project: &Path) -> PathBuf {
    match project.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<dir>/<stem>_extraction.fountain`
pub fn extraction_output(dir: &Path, project: &Path) -> PathBuf {
    dir.join(format!("{}_extraction.{}", project_stem(project), FOUNTAIN_EXT))
}

/// `<dir>/<stem>_injected.highland`
pub fn injection_output(dir: &Path, project: &Path) -> PathBuf {
    dir.join(format!("{}_injected.{}", project_stem(project), HIGHLAND_EXT))
}

/// Location of the revision record for a bundle
pub fn revision_record(bundle: &Path) -> PathBuf {
    bundle.join(REVISION_RECORD)
}

/// Build a ZIP entry name from a workspace-relative path.
///
/// ZIP entries always use forward slashes regardless of platform.
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
