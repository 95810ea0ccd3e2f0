//! Rebuilding project archives from an unpacked workspace.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SyringeError};
use crate::paths;

/// Writes workspace files into a ZIP archive under chosen entry names.
pub struct ArchiveBuilder<W: Write + Seek> {
    zip: ZipWriter<W>,
    method: CompressionMethod,
    entries: usize,
}

impl<W: Write + Seek> ArchiveBuilder<W> {
    pub fn new(writer: W, method: CompressionMethod) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            method,
            entries: 0,
        }
    }

    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(self.method)
    }

    /// Add a single file as `name`.
    pub fn add_file(&mut self, source: &Path, name: &str) -> Result<()> {
        let mut input =
            File::open(source).map_err(|e| SyringeError::io("Failed to open", source, e))?;
        let options = self.options();
        self.zip.start_file(name.to_string(), options)?;
        io::copy(&mut input, &mut self.zip)
            .map_err(|e| SyringeError::io("Failed to pack", source, e))?;
        self.entries += 1;
        Ok(())
    }

    /// Add an explicit directory entry.
    pub fn add_dir(&mut self, name: &str) -> Result<()> {
        let options = self.options();
        self.zip.add_directory(format!("{}/", name.trim_end_matches('/')), options)?;
        self.entries += 1;
        Ok(())
    }

    /// Add everything under `path`, naming entries relative to `root`.
    ///
    /// Files are added in file-name order. Directories only get their own
    /// entry when empty; other directories are implied by their files.
    pub fn add_tree(&mut self, root: &Path, path: &Path) -> Result<()> {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let at = e.path().unwrap_or(path).to_path_buf();
                SyringeError::io("Failed to walk", &at, io::Error::from(e))
            })?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if relative.as_os_str().is_empty() {
                continue;
            }
            let name = paths::entry_name(relative);

            if entry.file_type().is_file() {
                self.add_file(entry.path(), &name)?;
            } else if entry.file_type().is_dir() && is_empty_dir(entry.path()) {
                self.add_dir(&name)?;
            }
        }
        Ok(())
    }

    /// Number of entries written so far.
    fn len(&self) -> usize {
        self.entries
    }

    /// Write the central directory and hand back the writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Build an archive at `dest` without ever leaving a partial file there.
///
/// The archive is written to a temp file next to `dest` and renamed into
/// place only after `fill` succeeds and the central directory is written.
pub fn write_archive_atomically<F>(dest: &Path, method: CompressionMethod, fill: F) -> Result<usize>
where
    F: FnOnce(&mut ArchiveBuilder<&mut File>) -> Result<()>,
{
    let dir = paths::project_dir(dest);
    let mut temp = tempfile::Builder::new()
        .prefix(".hfs-pack-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| SyringeError::io("Failed to create temp archive in", &dir, e))?;

    let entries = {
        let mut builder = ArchiveBuilder::new(temp.as_file_mut(), method);
        fill(&mut builder)?;
        let entries = builder.len();
        let file = builder.finish()?;
        file.flush()
            .map_err(|e| SyringeError::io("Failed to flush", dest, e))?;
        entries
    };

    temp.persist(dest)
        .map_err(|e| SyringeError::io("Failed to write", dest, e.error))?;
    debug!("Wrote {} entries to {}", entries, dest.display());

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::read_zip;
    use tempfile::tempdir;

    #[test]
    fn test_add_tree_names_relative_to_root() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("ws");
        let bundle = root.join("Script.textbundle");
        fs::create_dir_all(bundle.join("revisions")).unwrap();
        fs::create_dir_all(bundle.join("assets")).unwrap();
        fs::write(bundle.join("text.md"), "INT. ROOM\n").unwrap();
        fs::write(bundle.join("revisions/current.json"), "{}").unwrap();

        let dest = temp.path().join("out.highland");
        let entries = write_archive_atomically(&dest, CompressionMethod::Deflated, |builder| {
            builder.add_tree(&root, &bundle)
        })
        .unwrap();
        assert_eq!(entries, 3);

        let files = read_zip(&dest);
        assert_eq!(files["Script.textbundle/text.md"], b"INT. ROOM\n");
        assert_eq!(files["Script.textbundle/revisions/current.json"], b"{}");
        assert!(files.contains_key("Script.textbundle/assets/"));
    }

    #[test]
    fn test_failed_fill_leaves_nothing() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out.highland");

        let result = write_archive_atomically(&dest, CompressionMethod::Stored, |builder| {
            builder.add_file(&temp.path().join("missing.md"), "missing.md")
        });

        assert!(result.is_err());
        assert!(!dest.exists());
        let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
