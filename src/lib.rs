//! # databricks-convert
//!
//! Converts source notebooks into the Databricks notebook JSON format and
//! packages them as `.dbc` archives for the Databricks import tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │  split    │──▶│  command  │──▶│  notebook  │──▶│  archive  │
//! │ .py .scala│   │  records  │   │  JSON doc  │   │   .dbc    │
//! │  .ipynb   │   └───────────┘   └────────────┘   └───────────┘
//! └───────────┘
//!        ▲                                               ▲
//!        └────────────── convert (driver) ───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! databricks-convert convert ./notebooks ./dist                      # ./dist/notebooks.dbc
//! databricks-convert convert ./notebooks ./dist --output-type directory
//! databricks-convert convert nb.ipynb ./dist --strict
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`split`] | Split source files into cells and detect the language |
//! | [`command`] | Build Databricks command records |
//! | [`notebook`] | Assemble and serialize notebook documents |
//! | [`archive`] | Write `.dbc` zip archives |
//! | [`convert`] | Resolve inputs and drive the pipeline |
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |

pub mod archive;
pub mod command;
pub mod config;
pub mod convert;
pub mod models;
pub mod notebook;
pub mod split;
