// File transfer payload
//
// A FileMessage starts out as a request (where to read, what to save as).
// Contents only exist after an explicit `read_file()`, and nothing is
// written until `write_file()` is called on the receiving side.

use crate::error::{ClackError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name and contents of a text file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FileMessageRepr")]
pub struct FileMessage {
    source_path: String,
    save_as_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) contents: Option<String>,
}

/// Decoded form, before the save-as name is sanitized
#[derive(Deserialize)]
struct FileMessageRepr {
    source_path: String,
    save_as_name: String,
    #[serde(default)]
    contents: Option<String>,
}

impl From<FileMessageRepr> for FileMessage {
    fn from(repr: FileMessageRepr) -> Self {
        Self {
            source_path: repr.source_path,
            save_as_name: bare_file_name(&repr.save_as_name),
            contents: repr.contents,
        }
    }
}

impl FileMessage {
    /// Read from `source_path` and save under the same file name.
    pub fn new(source_path: impl Into<String>) -> Self {
        let source_path = source_path.into();
        Self::with_save_as(source_path.clone(), &source_path)
    }

    /// Read from `source_path` and save as the file-name part of `save_as`.
    pub fn with_save_as(source_path: impl Into<String>, save_as: &str) -> Self {
        Self {
            source_path: source_path.into(),
            save_as_name: bare_file_name(save_as),
            contents: None,
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Point at a different source file. Previously read contents are
    /// dropped since they no longer match the path.
    pub fn set_source_path(&mut self, source_path: impl Into<String>) {
        self.source_path = source_path.into();
        self.contents = None;
    }

    pub fn save_as_name(&self) -> &str {
        &self.save_as_name
    }

    /// Only the last path component of `save_as` is kept.
    pub fn set_save_as_name(&mut self, save_as: &str) {
        self.save_as_name = bare_file_name(save_as);
    }

    /// `None` until the file has been read.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// [source path, save-as name, contents]
    pub fn data(&self) -> Vec<String> {
        vec![
            self.source_path.clone(),
            self.save_as_name.clone(),
            self.contents.clone().unwrap_or_default(),
        ]
    }

    /// Load the whole file at `source_path` into this message.
    pub fn read_file(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.source_path)
            .map_err(|e| ClackError::file_unavailable(&self.source_path, e))?;
        tracing::debug!(
            "Read {} bytes from {}",
            contents.len(),
            self.source_path
        );
        self.contents = Some(contents);
        Ok(())
    }

    /// Write the contents to `save_as_name` in the current working directory.
    pub fn write_file(&self) -> Result<()> {
        self.write_file_in(Path::new("."))
    }

    /// Write the contents to `dir/save_as_name`, creating or truncating it.
    ///
    /// A message that was never read writes an empty file.
    pub fn write_file_in(&self, dir: &Path) -> Result<()> {
        let target = dir.join(&self.save_as_name);
        fs::write(&target, self.contents().unwrap_or_default())
            .map_err(|e| ClackError::file_unavailable(&target, e))?;
        tracing::debug!("Wrote {}", target.display());
        Ok(())
    }
}

/// Strip directory components, on either separator style.
pub(crate) fn bare_file_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or_default().to_string()
}

/// Whether `name` can be created inside a directory as-is.
pub(crate) fn is_usable_file_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..")
}
