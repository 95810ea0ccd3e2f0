//! Fixtures for building Highland projects in tests.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use plist::{Dictionary, Uid, Value};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::archive::workspace::WORKSPACE_PREFIX;

/// `{"NS.string": text, "$class": Uid(class)}`
pub fn string_object(text: &str, class: u64) -> Value {
    let mut dict = Dictionary::new();
    dict.insert("NS.string".into(), Value::String(text.into()));
    dict.insert("$class".into(), Value::Uid(Uid::new(class)));
    Value::Dictionary(dict)
}

/// Binary plist of an `NSKeyedArchiver` root with the given `$objects`.
pub fn keyed_archive(objects: Vec<Value>) -> Vec<u8> {
    let mut top = Dictionary::new();
    top.insert("root".into(), Value::Uid(Uid::new(1)));

    let mut root = Dictionary::new();
    root.insert("$version".into(), Value::Integer(100000i64.into()));
    root.insert("$archiver".into(), Value::String("NSKeyedArchiver".into()));
    root.insert("$top".into(), Value::Dictionary(top));
    root.insert("$objects".into(), Value::Array(objects));

    let mut bytes = Vec::new();
    Value::Dictionary(root).to_writer_binary(&mut bytes).unwrap();
    bytes
}

/// A `revisions/current.json` whose payload is an archived mutable string.
pub fn revision_json(text: &str) -> String {
    let mut class = Dictionary::new();
    class.insert("$classname".into(), Value::String("NSMutableString".into()));
    class.insert(
        "$classes".into(),
        Value::Array(vec![
            Value::String("NSMutableString".into()),
            Value::String("NSString".into()),
            Value::String("NSObject".into()),
        ]),
    );
    let objects = vec![
        Value::String("$null".into()),
        string_object(text, 2),
        Value::Dictionary(class),
    ];

    serde_json::json!({
        "content": STANDARD.encode(keyed_archive(objects)),
        "date": "2024-03-01T10:00:00Z",
        "name": "Current Revision",
    })
    .to_string()
}

/// Builder for `.highland` archives.
pub struct ProjectFixture {
    stem: String,
    entries: Vec<(String, Vec<u8>)>,
}

impl ProjectFixture {
    /// `<stem>.textbundle/text.md` holding `text`, plus a revision record.
    pub fn new(stem: &str, text: &str) -> Self {
        let bundle = format!("{}.textbundle", stem);
        Self {
            stem: stem.to_string(),
            entries: vec![
                (format!("{}/text.md", bundle), text.as_bytes().to_vec()),
                (
                    format!("{}/info.json", bundle),
                    br#"{"version":2,"type":"net.daringfireball.markdown"}"#.to_vec(),
                ),
                (
                    format!("{}/revisions/current.json", bundle),
                    revision_json(text).into_bytes(),
                ),
            ],
        }
    }

    /// A project with only the entries added afterwards.
    pub fn empty(stem: &str) -> Self {
        Self {
            stem: stem.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push((name.to_string(), data.to_vec()));
        self
    }

    pub fn without(mut self, suffix: &str) -> Self {
        self.entries.retain(|(name, _)| !name.ends_with(suffix));
        self
    }

    /// Write `<dir>/<stem>.highland` and return its path.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}.highland", self.stem));
        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, data) in &self.entries {
            zip.start_file(name.clone(), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        path
    }
}

/// All file entries of a ZIP, keyed by entry name (directories map to empty data).
pub fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        files.insert(entry.name().to_string(), data);
    }
    files
}

/// Workspace directories still present in `dir`.
pub fn leftover_workspaces(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX))
        .map(|e| e.path())
        .collect()
}
