//! File listing and file content projections

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Raw type code the panel uses for directories
const DIRECTORY_TYPE_CODE: i64 = 0;

/// Paging for the file list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    /// Directory to list, relative to the instance root; empty means the root
    pub target: String,
    pub page: u32,
    pub page_size: u32,
}

impl FileQuery {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            page: 0,
            page_size: 100,
        }
    }
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Directory,
    File,
}

impl FileKind {
    /// Only code `0` is a directory; a missing code is a file
    pub fn from_code(code: Option<i64>) -> Self {
        if code == Some(DIRECTORY_TYPE_CODE) {
            FileKind::Directory
        } else {
            FileKind::File
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFileEntry {
    name: String,
    size: Value,
    time: Value,
    #[serde(rename = "type")]
    kind: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilePage {
    items: Vec<RawFileEntry>,
    total: Option<u64>,
}

/// One directory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: Value,
    pub modified: Value,
}

/// Directory listing projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileListing {
    pub path: String,
    pub total: u64,
    pub files: Vec<FileEntry>,
}

impl FileListing {
    pub fn from_upstream(path: impl Into<String>, data: Value) -> Result<Self> {
        let raw: RawFilePage = serde_json::from_value(data)?;
        let files: Vec<FileEntry> = raw
            .items
            .into_iter()
            .map(|item| FileEntry {
                name: item.name,
                kind: FileKind::from_code(item.kind),
                size: item.size,
                modified: item.time,
            })
            .collect();

        Ok(Self {
            path: path.into(),
            total: raw.total.unwrap_or(files.len() as u64),
            files,
        })
    }
}

/// File content projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub file_path: String,
    pub content: String,
}

impl FileContent {
    /// The panel returns file content as a bare string in `data`
    pub fn from_upstream(file_path: impl Into<String>, data: Value) -> Self {
        let content = match data {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            file_path: file_path.into(),
            content,
        }
    }
}
