//! Cell splitting for source notebooks.
//!
//! Turns one input file into an ordered list of [`Cell`]s plus the
//! notebook [`Language`]. Two encodings are understood:
//!
//! - Databricks source exports (`.py`, `.scala`): cells are separated by a
//!   comment line of the form `# COMMAND ----------` (or `// COMMAND ...`).
//!   `MAGIC` prefixes and the `Databricks notebook source` header are removed
//!   before splitting.
//! - Jupyter notebooks (`.ipynb`): one cell per entry of the `cells` array,
//!   language taken from `metadata.language_info.name`.
//!
//! Failures are returned as [`ParseError`] so the caller can skip the file
//! and keep going.

use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::models::{Cell, Language, SourceKind, SourceNotebook};

static RE_COMMAND_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#/\s]+COMMAND -+").unwrap());

/// Why a file could not be split into cells.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported file type ({path:?}): extension {extension:?}")]
    UnsupportedFileType { path: PathBuf, extension: String },
    #[error("malformed notebook ({path:?}): {reason}")]
    MalformedNotebook { path: PathBuf, reason: String },
}

/// Result of splitting one source notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNotebook {
    pub cells: Vec<Cell>,
    pub language: Language,
}

/// Classify `path` by its extension. Done before reading so unsupported
/// files are never opened.
pub fn classify(path: &Path) -> Result<SourceKind, ParseError> {
    SourceKind::from_path(path).ok_or_else(|| ParseError::UnsupportedFileType {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default(),
    })
}

/// Split a classified source notebook into cells.
pub fn split(notebook: &SourceNotebook) -> Result<SplitNotebook, ParseError> {
    match notebook.kind {
        SourceKind::PlainPython => Ok(split_plain(&notebook.content, "#", Language::Python)),
        SourceKind::PlainScala => Ok(split_plain(&notebook.content, "//", Language::Scala)),
        SourceKind::JsonNotebook => split_ipynb(&notebook.path, &notebook.content),
    }
}

/// Classify and split in one step.
pub fn split_source(path: &Path, content: String) -> Result<SplitNotebook, ParseError> {
    let kind = classify(path)?;
    split(&SourceNotebook {
        path: path.to_path_buf(),
        content,
        kind,
    })
}

fn split_plain(content: &str, comment: &str, language: Language) -> SplitNotebook {
    let magic = format!("{} MAGIC ", comment);
    let header = format!("{} Databricks notebook source", comment);
    let text = content.replace(&magic, "").replace(&header, "");

    let cells = RE_COMMAND_DELIMITER
        .split(&text)
        .enumerate()
        .map(|(index, fragment)| Cell {
            index,
            source: fragment.trim().to_string(),
        })
        .collect();

    SplitNotebook { cells, language }
}

fn split_ipynb(path: &Path, content: &str) -> Result<SplitNotebook, ParseError> {
    let malformed = |reason: String| ParseError::MalformedNotebook {
        path: path.to_path_buf(),
        reason,
    };

    let doc: Value =
        serde_json::from_str(content).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    let language = doc
        .pointer("/metadata/language_info/name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing metadata.language_info.name".to_string()))?;
    // The name becomes the extension of the converted file.
    if language.is_empty() || language.chars().any(|c| c == '/' || c == '\\') {
        return Err(malformed(format!(
            "invalid language name {:?} in metadata.language_info.name",
            language
        )));
    }

    let raw_cells = doc
        .get("cells")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing cells array".to_string()))?;

    let mut cells = Vec::with_capacity(raw_cells.len());
    for (index, cell) in raw_cells.iter().enumerate() {
        let source = match cell.get("source") {
            Some(Value::Array(lines)) => {
                let mut joined = String::new();
                for line in lines {
                    let line = line.as_str().ok_or_else(|| {
                        malformed(format!("cell {} has a non-string source line", index))
                    })?;
                    joined.push_str(line);
                }
                joined
            }
            Some(Value::String(text)) => text.clone(),
            _ => return Err(malformed(format!("cell {} has no source", index))),
        };
        cells.push(Cell {
            index,
            source: source.trim().to_string(),
        });
    }

    Ok(SplitNotebook {
        cells,
        language: Language::from_declared(language),
    })
}
