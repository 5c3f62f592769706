//! Notebook document assembly and serialization.

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use uuid::Uuid;

use crate::command::OriginBase;
use crate::models::{CommandRecord, Language, NotebookDocument};

const NOTEBOOK_VERSION: &str = "NotebookV1";
const INDENT: &[u8] = b"    ";

/// Wrap `commands` into a notebook document. Command order is kept as given.
pub fn assemble(
    name: &str,
    language: Language,
    commands: Vec<CommandRecord>,
    base: OriginBase,
) -> NotebookDocument {
    NotebookDocument {
        version: NOTEBOOK_VERSION.to_string(),
        name: name.to_string(),
        language,
        commands,
        guid: Uuid::new_v4().to_string(),
        orig_id: base.0,
    }
}

/// Serialize a notebook as JSON indented with four spaces.
pub fn to_pretty_json(notebook: &NotebookDocument) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    notebook.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}
