//! Databricks command record construction.
//!
//! Each cell becomes a [`CommandRecord`] that looks like an already
//! executed command with an empty HTML result. The import tool rejects
//! records with missing fields, so every placeholder is always written.
//!
//! Numeric origin IDs are `base + index`, where the base is drawn once per
//! notebook from the 15-digit range. `guid` and `nuid` are fresh v4 UUIDs.

use rand::Rng;
use serde_json::Map;
use uuid::Uuid;

use crate::models::{Cell, CommandRecord, CommandResults};

const ORIGIN_BASE_MIN: u64 = 100_000_000_000_000;
const ORIGIN_BASE_MAX: u64 = 999_999_999_999_999;

/// Numeric origin shared by a notebook and its commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginBase(pub u64);

impl OriginBase {
    /// Draw a random 15-digit base.
    pub fn random() -> Self {
        OriginBase(rand::thread_rng().gen_range(ORIGIN_BASE_MIN..ORIGIN_BASE_MAX))
    }

    pub fn id_for(self, index: usize) -> u64 {
        self.0 + index as u64
    }
}

/// Build the command record for the cell at `index`.
pub fn build_command(base: OriginBase, index: usize, source: &str) -> CommandRecord {
    CommandRecord {
        version: "CommandV1".to_string(),
        orig_id: base.id_for(index),
        guid: Uuid::new_v4().to_string(),
        subtype: "command".to_string(),
        command_type: "auto".to_string(),
        position: (index + 1) as f64,
        command: source.trim().to_string(),
        command_version: 1,
        state: "finished".to_string(),
        results: empty_html_result(),
        error_summary: None,
        error: None,
        workflows: Vec::new(),
        start_time: 0,
        submit_time: 0,
        finish_time: 0,
        collapsed: false,
        bindings: Map::new(),
        input_widgets: Map::new(),
        display_type: "table".to_string(),
        width: "auto".to_string(),
        height: "auto".to_string(),
        x_columns: None,
        y_columns: None,
        pivot_columns: None,
        pivot_aggregation: None,
        use_consistent_colors: false,
        custom_plot_options: Map::new(),
        comment_thread: Vec::new(),
        comments_visible: false,
        parent_hierarchy: Vec::new(),
        diff_inserts: Vec::new(),
        diff_deletes: Vec::new(),
        global_vars: Map::new(),
        latest_user: String::new(),
        latest_user_id: None,
        command_title: String::new(),
        show_command_title: false,
        hide_command_code: false,
        hide_command_result: false,
        is_locked_in_exam_mode: false,
        i_python_metadata: None,
        stream_states: Map::new(),
        dataset_preview_name_to_cmd_id_map: Map::new(),
        nuid: Uuid::new_v4().to_string(),
    }
}

/// Build one record per cell, preserving cell order.
pub fn build_commands(base: OriginBase, cells: &[Cell]) -> Vec<CommandRecord> {
    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| build_command(base, index, &cell.source))
        .collect()
}

fn empty_html_result() -> CommandResults {
    CommandResults {
        result_type: "html".to_string(),
        data: "<div class=\"ansiout\"></div>".to_string(),
        arguments: Map::new(),
        added_widgets: Map::new(),
        removed_widgets: Vec::new(),
        dataset_infos: Vec::new(),
    }
}
