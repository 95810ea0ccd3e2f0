//! Revision record handling.
//!
//! A text bundle may carry `revisions/current.json`:
//!
//! ```json
//! { "content": "<base64 of a binary plist>", "date": "...", ... }
//! ```
//!
//! The decoded plist is an `NSKeyedArchiver` object graph whose `$objects`
//! array holds the archived string the app treats as the current revision.
//! After injecting new text the payload has to be replaced too, otherwise
//! the app restores the old revision on open. Every other JSON field and
//! every other archived object is left as found.

mod strategy;

pub use strategy::{find_payload, LookupStrategy, PayloadSlot, CONVENTIONAL_KEY};

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::error::{FormatError, Result, SyringeError};

const CONTENT_FIELD: &str = "content";
const OBJECTS_KEY: &str = "$objects";

/// A decoded `revisions/current.json`.
#[derive(Debug, Clone)]
pub struct RevisionRecord {
    fields: Map<String, JsonValue>,
    archive: plist::Value,
}

impl RevisionRecord {
    /// Decode the JSON document and the plist embedded in `content`.
    pub fn parse(json: &str) -> std::result::Result<Self, FormatError> {
        let fields = match serde_json::from_str::<JsonValue>(json)? {
            JsonValue::Object(fields) => fields,
            _ => return Err(FormatError::NotAnObject),
        };

        let content = fields
            .get(CONTENT_FIELD)
            .ok_or(FormatError::MissingContent)?
            .as_str()
            .ok_or(FormatError::ContentNotString)?;

        // Records may carry MIME-style base64 wrapped across lines
        let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD.decode(compact)?;
        let archive = plist::Value::from_reader(Cursor::new(bytes))?;

        let record = Self { fields, archive };
        record.objects()?;
        Ok(record)
    }

    /// Read and decode a record from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| SyringeError::io("Failed to read", path, e))?;
        Ok(Self::parse(&json)?)
    }

    fn objects(&self) -> std::result::Result<&Vec<plist::Value>, FormatError> {
        self.archive
            .as_dictionary()
            .and_then(|root| root.get(OBJECTS_KEY))
            .and_then(plist::Value::as_array)
            .ok_or(FormatError::UnexpectedStructure)
    }

    fn objects_mut(&mut self) -> std::result::Result<&mut Vec<plist::Value>, FormatError> {
        self.archive
            .as_dictionary_mut()
            .and_then(|root| root.get_mut(OBJECTS_KEY))
            .and_then(plist::Value::as_array_mut)
            .ok_or(FormatError::UnexpectedStructure)
    }

    /// Where the active string would be replaced, if anywhere.
    pub fn payload_slot(&self) -> std::result::Result<Option<PayloadSlot>, FormatError> {
        Ok(find_payload(self.objects()?))
    }

    /// Current string payload.
    ///
    /// Follows one `$objects` reference when the slot holds a UID instead
    /// of an inline string.
    pub fn current_text(&self) -> std::result::Result<Option<String>, FormatError> {
        let objects = self.objects()?;
        let Some(slot) = find_payload(objects) else {
            return Ok(None);
        };

        let value = objects[slot.index]
            .as_dictionary()
            .and_then(|d| d.get(&slot.key));
        let text = match value {
            Some(plist::Value::String(s)) => Some(s.clone()),
            Some(plist::Value::Uid(uid)) => usize::try_from(uid.get())
                .ok()
                .and_then(|i| objects.get(i))
                .and_then(plist::Value::as_string)
                .map(str::to_string),
            _ => None,
        };
        Ok(text)
    }

    /// Replace the active string payload with `new_text`.
    pub fn replace_text(&mut self, new_text: &str) -> std::result::Result<PayloadSlot, FormatError> {
        let objects = self.objects_mut()?;
        let slot = find_payload(objects).ok_or(FormatError::NoStringObject)?;

        if let Some(dict) = objects[slot.index].as_dictionary_mut() {
            dict.insert(slot.key.clone(), plist::Value::String(new_text.to_string()));
        }
        debug!(
            "Replaced $objects[{}][{:?}] via {:?}",
            slot.index, slot.key, slot.strategy
        );
        Ok(slot)
    }

    /// Re-encode the plist (binary) and serialize the JSON document.
    pub fn to_json(&self) -> std::result::Result<String, FormatError> {
        let mut bytes = Vec::new();
        self.archive.to_writer_binary(&mut bytes)?;

        let mut fields = self.fields.clone();
        fields.insert(CONTENT_FIELD.to_string(), JsonValue::String(STANDARD.encode(&bytes)));
        Ok(serde_json::to_string(&fields)?)
    }
}

/// Rewrite the revision record at `path` so its current revision is `new_text`.
///
/// The file is replaced only after decoding, patching and re-encoding all
/// succeed; on error it is left untouched.
pub fn patch_revision(path: &Path, new_text: &str) -> Result<PayloadSlot> {
    let mut record = RevisionRecord::load(path)?;
    let slot = record.replace_text(new_text)?;
    let json = record.to_json()?;

    write_replacing(path, json.as_bytes())?;
    info!(
        "Patched revision record {} ({:?})",
        path.display(),
        slot.strategy
    );
    Ok(slot)
}

/// Current revision text stored in the record at `path`.
pub fn read_revision_text(path: &Path) -> Result<Option<String>> {
    Ok(RevisionRecord::load(path)?.current_text()?)
}

/// Replace `path` with `data` via a temp file in the same directory.
fn write_replacing(path: &Path, data: &[u8]) -> Result<()> {
    let dir = crate::paths::project_dir(path);
    let mut temp = tempfile::Builder::new()
        .prefix(".hfs-rev-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| SyringeError::io("Failed to create temp file in", &dir, e))?;
    temp.write_all(data)
        .map_err(|e| SyringeError::io("Failed to write", temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| SyringeError::io("Failed to replace", path, e.error))?;
    Ok(())
}
