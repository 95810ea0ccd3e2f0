//! Error types for highland-syringe.
//!
//! Everything below the operation boundary returns [`SyringeError`]. The two
//! public operations wrap it in [`ExtractionError`] / [`InjectionError`] so
//! the caller gets one human-readable message per failed run.

use std::io;
use std::path::{Path, PathBuf};

/// Broad classification of a failure, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid input paths / configuration
    Validation,
    /// Not a zip container, or a corrupt entry
    Archive,
    /// Bundle or text file missing inside the archive
    NotFound,
    /// Malformed revision record (JSON, base64, plist) or no string payload
    Format,
    /// Filesystem failure outside the categories above
    Io,
}

/// Failures while decoding or rewriting a revision record.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("revision record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("revision record is not a JSON object")]
    NotAnObject,

    #[error("revisions/current.json missing 'content' field")]
    MissingContent,

    #[error("'content' field is not a string")]
    ContentNotString,

    #[error("'content' field is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("'content' is not a valid property list: {0}")]
    Plist(#[from] plist::Error),

    #[error("unexpected plist structure in current.json (no $objects)")]
    UnexpectedStructure,

    #[error("could not find string object inside plist to replace")]
    NoStringObject,
}

/// Errors raised by the staging, locating, patching and packing steps.
#[derive(Debug, thiserror::Error)]
pub enum SyringeError {
    #[error("{what} does not exist: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("not a valid .highland archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("no .textbundle found inside .highland archive")]
    BundleNotFound,

    #[error("no .md file found in .textbundle {}", .0.display())]
    TextNotFound(PathBuf),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyringeError {
    /// Wrap an I/O error with the operation and path it happened on.
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        SyringeError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyringeError::MissingInput { .. } | SyringeError::Config(_) => ErrorKind::Validation,
            SyringeError::Archive(_) => ErrorKind::Archive,
            SyringeError::BundleNotFound | SyringeError::TextNotFound(_) => ErrorKind::NotFound,
            SyringeError::Format(_) => ErrorKind::Format,
            SyringeError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Output directory not found: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("Scratch directory not found: {}", .0.display())]
    ScratchDirNotFound(PathBuf),
}

/// Failure of [`crate::extract`].
#[derive(Debug, thiserror::Error)]
#[error("Extraction failed: {source}")]
pub struct ExtractionError {
    #[from]
    source: SyringeError,
}

/// Failure of [`crate::inject`].
#[derive(Debug, thiserror::Error)]
#[error("Injection failed: {source}")]
pub struct InjectionError {
    #[from]
    source: SyringeError,
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The underlying cause.
    pub fn cause(&self) -> &SyringeError {
        &self.source
    }
}

impl InjectionError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The underlying cause.
    pub fn cause(&self) -> &SyringeError {
        &self.source
    }
}

pub type Result<T, E = SyringeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(SyringeError::BundleNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            SyringeError::from(FormatError::MissingContent).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            SyringeError::MissingInput {
                what: "Fountain file",
                path: PathBuf::from("/nope.fountain"),
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_boundary_message_carries_cause() {
        let err = ExtractionError::from(SyringeError::BundleNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Extraction failed: no .textbundle found inside .highland archive"
        );

        let err = InjectionError::from(SyringeError::from(FormatError::NoStringObject));
        assert!(err.to_string().starts_with("Injection failed: could not find string object"));
    }
}
