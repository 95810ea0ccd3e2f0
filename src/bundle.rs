//! Locating the text bundle inside an unpacked project.
//!
//! Handles common archive structures:
//! - `Script.textbundle/text.md` (direct)
//! - `Script.textbundle/content/text.md` (nested, found by recursive walk)
//!
//! When several candidates exist at the same level the lexicographically
//! first name wins, so results do not depend on directory listing order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SyringeError};
use crate::paths;

/// A text bundle found inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocation {
    /// The `.textbundle` directory
    pub bundle: PathBuf,
    /// The primary `.md` file inside it
    pub text: PathBuf,
}

impl BundleLocation {
    /// Directory name of the bundle, e.g. `Script.textbundle`.
    pub fn bundle_name(&self) -> String {
        self.bundle
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path of `revisions/current.json`, if the bundle has one.
    pub fn revision_record(&self) -> Option<PathBuf> {
        let path = paths::revision_record(&self.bundle);
        path.is_file().then_some(path)
    }
}

/// Find the top-level bundle and its primary text file.
pub fn locate_bundle(root: &Path) -> Result<BundleLocation> {
    let bundle = find_bundle_dir(root)?.ok_or(SyringeError::BundleNotFound)?;
    let text = find_text_file(&bundle)?.ok_or_else(|| SyringeError::TextNotFound(bundle.clone()))?;

    debug!("Located bundle {} with text {}", bundle.display(), text.display());
    Ok(BundleLocation { bundle, text })
}

/// First directory directly under `root` whose name ends in `.textbundle`.
fn find_bundle_dir(root: &Path) -> Result<Option<PathBuf>> {
    let candidates = sorted_children(root, |path, name| {
        path.is_dir() && paths::is_bundle_name(name)
    })?;
    Ok(pick_first(candidates, "bundle"))
}

/// Text file directly in the bundle, falling back to a recursive walk.
fn find_text_file(bundle: &Path) -> Result<Option<PathBuf>> {
    let direct = sorted_children(bundle, |path, name| {
        path.is_file() && paths::is_text_name(name)
    })?;
    if let Some(text) = pick_first(direct, "text file") {
        return Ok(Some(text));
    }

    debug!("No text file directly in {}, searching nested folders", bundle.display());
    let nested: Vec<PathBuf> = WalkDir::new(bundle)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| paths::is_text_name(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();

    Ok(pick_first(nested, "text file"))
}

/// Immediate children of `dir` matching `keep`, sorted by file name.
fn sorted_children<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path, &str) -> bool,
{
    let entries = fs::read_dir(dir).map_err(|e| SyringeError::io("Failed to read", dir, e))?;

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            keep(path, &name)
        })
        .collect();
    matches.sort();
    Ok(matches)
}

fn pick_first(candidates: Vec<PathBuf>, what: &str) -> Option<PathBuf> {
    if candidates.len() > 1 {
        warn!(
            "Found {} {} candidates, using {}",
            candidates.len(),
            what,
            candidates[0].display()
        );
    }
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_locate_direct() {
        let temp = tempdir().unwrap();
        let bundle = temp.path().join("Script.textbundle");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join("text.md"), "INT. ROOM\n").unwrap();
        fs::write(temp.path().join("thumbnail.png"), "png").unwrap();

        let location = locate_bundle(temp.path()).unwrap();
        assert_eq!(location.bundle, bundle);
        assert_eq!(location.text, bundle.join("text.md"));
        assert_eq!(location.bundle_name(), "Script.textbundle");
        assert!(location.revision_record().is_none());
    }

    #[test]
    fn test_locate_nested_fallback() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("Script.textbundle").join("content");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("text.md"), "INT. ROOM\n").unwrap();

        let location = locate_bundle(temp.path()).unwrap();
        assert_eq!(location.text, nested.join("text.md"));
    }

    #[test]
    fn test_lexicographic_tie_break() {
        let temp = tempdir().unwrap();
        for name in ["b.textbundle", "a.textbundle"] {
            let bundle = temp.path().join(name);
            fs::create_dir_all(&bundle).unwrap();
            fs::write(bundle.join("z.md"), "z").unwrap();
            fs::write(bundle.join("text.md"), "t").unwrap();
        }

        let location = locate_bundle(temp.path()).unwrap();
        assert_eq!(location.bundle_name(), "a.textbundle");
        assert!(location.text.ends_with("text.md"));
    }

    #[test]
    fn test_bundle_must_be_directory() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Script.textbundle"), "not a dir").unwrap();

        let err = locate_bundle(temp.path()).unwrap_err();
        assert!(matches!(err, SyringeError::BundleNotFound));
    }

    #[test]
    fn test_no_bundle() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("text.md"), "INT. ROOM\n").unwrap();

        let err = locate_bundle(temp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("no .textbundle found"));
    }

    #[test]
    fn test_no_text_file() {
        let temp = tempdir().unwrap();
        let bundle = temp.path().join("Script.textbundle");
        fs::create_dir_all(bundle.join("revisions")).unwrap();
        fs::write(bundle.join("info.json"), "{}").unwrap();

        let err = locate_bundle(temp.path()).unwrap_err();
        assert!(matches!(err, SyringeError::TextNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_revision_record_detected() {
        let temp = tempdir().unwrap();
        let bundle = temp.path().join("Script.textbundle");
        fs::create_dir_all(bundle.join("revisions")).unwrap();
        fs::write(bundle.join("text.md"), "x").unwrap();
        fs::write(bundle.join("revisions/current.json"), "{}").unwrap();

        let location = locate_bundle(temp.path()).unwrap();
        assert_eq!(
            location.revision_record(),
            Some(bundle.join("revisions/current.json"))
        );
    }
}
