//! Core data models used throughout the converter.
//!
//! These types represent the source notebooks, cells, and Databricks
//! command/notebook records that flow through the conversion pipeline.
//! Field order of the serializable records is the key order of the
//! emitted JSON.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Notebook language as written to the `language` field and used as the
/// extension of converted files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Scala,
    /// Whatever a Jupyter notebook declares in `metadata.language_info.name`.
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::Scala => "scala",
            Language::Other(name) => name,
        }
    }

    /// Map a declared language name onto a known variant where possible.
    pub fn from_declared(name: &str) -> Self {
        match name {
            "python" => Language::Python,
            "scala" => Language::Scala,
            other => Language::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Input encoding, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainPython,
    PlainScala,
    JsonNotebook,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "py" => Some(SourceKind::PlainPython),
            "scala" => Some(SourceKind::PlainScala),
            "ipynb" => Some(SourceKind::JsonNotebook),
            _ => None,
        }
    }
}

/// One input file, read once and discarded after splitting.
#[derive(Debug, Clone)]
pub struct SourceNotebook {
    pub path: PathBuf,
    pub content: String,
    pub kind: SourceKind,
}

/// One cell of a source notebook. `source` is already trimmed and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub index: usize,
    pub source: String,
}

/// Placeholder result payload of an executed command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResults {
    #[serde(rename = "type")]
    pub result_type: String,
    pub data: String,
    pub arguments: Map<String, Value>,
    pub added_widgets: Map<String, Value>,
    pub removed_widgets: Vec<Value>,
    pub dataset_infos: Vec<Value>,
}

/// A single Databricks command (cell) record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub version: String,
    pub orig_id: u64,
    pub guid: String,
    pub subtype: String,
    pub command_type: String,
    pub position: f64,
    pub command: String,
    pub command_version: u32,
    pub state: String,
    pub results: CommandResults,
    pub error_summary: Option<String>,
    pub error: Option<String>,
    pub workflows: Vec<Value>,
    pub start_time: u64,
    pub submit_time: u64,
    pub finish_time: u64,
    pub collapsed: bool,
    pub bindings: Map<String, Value>,
    pub input_widgets: Map<String, Value>,
    pub display_type: String,
    pub width: String,
    pub height: String,
    pub x_columns: Option<Value>,
    pub y_columns: Option<Value>,
    pub pivot_columns: Option<Value>,
    pub pivot_aggregation: Option<Value>,
    pub use_consistent_colors: bool,
    pub custom_plot_options: Map<String, Value>,
    pub comment_thread: Vec<Value>,
    pub comments_visible: bool,
    pub parent_hierarchy: Vec<Value>,
    pub diff_inserts: Vec<Value>,
    pub diff_deletes: Vec<Value>,
    pub global_vars: Map<String, Value>,
    pub latest_user: String,
    pub latest_user_id: Option<String>,
    pub command_title: String,
    pub show_command_title: bool,
    pub hide_command_code: bool,
    pub hide_command_result: bool,
    pub is_locked_in_exam_mode: bool,
    pub i_python_metadata: Option<Value>,
    pub stream_states: Map<String, Value>,
    pub dataset_preview_name_to_cmd_id_map: Map<String, Value>,
    pub nuid: String,
}

/// Top-level Databricks notebook document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookDocument {
    pub version: String,
    pub name: String,
    pub language: Language,
    pub commands: Vec<CommandRecord>,
    pub guid: String,
    pub orig_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_from_extension() {
        assert_eq!(
            SourceKind::from_path(Path::new("a/nb.py")),
            Some(SourceKind::PlainPython)
        );
        assert_eq!(
            SourceKind::from_path(Path::new("nb.scala")),
            Some(SourceKind::PlainScala)
        );
        assert_eq!(
            SourceKind::from_path(Path::new("nb.ipynb")),
            Some(SourceKind::JsonNotebook)
        );
        assert_eq!(SourceKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn language_serializes_as_plain_string() {
        let json = serde_json::to_string(&Language::Other("r".to_string())).unwrap();
        assert_eq!(json, "\"r\"");
        assert_eq!(Language::from_declared("python"), Language::Python);
        assert_eq!(Language::Scala.to_string(), "scala");
    }
}
