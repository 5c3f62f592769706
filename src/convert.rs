//! Conversion pipeline orchestration.
//!
//! Resolves the input path into `(input file, staged file)` pairs, runs
//! split → command records → notebook assembly for each pair, writes the
//! resulting JSON next to the mirrored path, and finally packages the
//! staging tree into a `.dbc` archive when requested.
//!
//! Files that cannot be parsed are skipped and reported; I/O failures abort
//! the whole run.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::{build_archive, ArchiveSummary};
use crate::command::{build_commands, OriginBase};
use crate::config::{ConvertConfig, OutputType};
use crate::models::{Language, SourceNotebook};
use crate::notebook::{assemble, to_pretty_json};
use crate::split::{classify, split, ParseError};

/// One input file and the staging path its notebook is written under
/// (before the language extension is applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertJob {
    pub input: PathBuf,
    pub staged: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConvertedNotebook {
    pub input: PathBuf,
    pub output: PathBuf,
    pub language: Language,
    pub commands: usize,
}

/// Why a file was left out of the output.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("output {output:?} already written from {first:?}; skipping {input:?}")]
    OutputClash {
        input: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },
}

#[derive(Debug)]
pub struct SkippedFile {
    pub input: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of converting a single file.
#[derive(Debug)]
pub enum FileOutcome {
    Converted(ConvertedNotebook),
    Skipped(SkippedFile),
}

/// Everything a conversion run produced.
#[derive(Debug)]
pub struct ConvertReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub converted: Vec<ConvertedNotebook>,
    pub skipped: Vec<SkippedFile>,
    pub archive: Option<ArchiveSummary>,
}

impl ConvertReport {
    pub fn print_summary(&self) {
        println!("convert {}", self.input.display());
        println!("  converted notebooks: {}", self.converted.len());
        println!("  skipped files: {}", self.skipped.len());
        for skipped in &self.skipped {
            println!("    {}", skipped.reason);
        }
        match &self.archive {
            Some(archive) => {
                println!(
                    "  archive: {} ({} directories, {} notebooks)",
                    archive.path.display(),
                    archive.directories,
                    archive.files
                );
            }
            None => println!("  output directory: {}", self.output.display()),
        }
    }
}

/// Map `input` onto staging paths under `staging_root`.
///
/// A single file lands directly under the root. A directory is mirrored
/// relative to its parent, so its own name becomes the top-level folder.
/// Only names containing a `.` are considered; with `skip_hidden_dirs`,
/// files whose immediate parent directory starts with `.` are ignored.
pub fn resolve_inputs(
    input: &Path,
    staging_root: &Path,
    skip_hidden_dirs: bool,
) -> Result<Vec<ConvertJob>> {
    if input.is_file() {
        let name = input
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Input file has no name: {}", input.display()))?;
        return Ok(vec![ConvertJob {
            input: input.to_path_buf(),
            staged: staging_root.join(name),
        }]);
    }

    if !input.is_dir() {
        bail!("Input path does not exist: {}", input.display());
    }

    let base = input.parent().unwrap_or(input);
    let mut jobs = Vec::new();

    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let has_dot = path
            .file_name()
            .map(|n| n.to_string_lossy().contains('.'))
            .unwrap_or(false);
        if !has_dot {
            continue;
        }

        if skip_hidden_dirs && in_hidden_dir(path) {
            continue;
        }

        let relative = path.strip_prefix(base).unwrap_or(path);
        jobs.push(ConvertJob {
            input: path.to_path_buf(),
            staged: staging_root.join(relative),
        });
    }

    Ok(jobs)
}

fn in_hidden_dir(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn skipped(input: &Path, reason: impl Into<SkipReason>) -> FileOutcome {
    FileOutcome::Skipped(SkippedFile {
        input: input.to_path_buf(),
        reason: reason.into(),
    })
}

/// Convert one file. Parse failures, and outputs that would overwrite a
/// path already in `written` (output → input), come back as
/// [`FileOutcome::Skipped`]; read/write failures are errors.
pub fn convert_file(
    job: &ConvertJob,
    written: &mut HashMap<PathBuf, PathBuf>,
) -> Result<FileOutcome> {
    let kind = match classify(&job.input) {
        Ok(kind) => kind,
        Err(error) => return Ok(skipped(&job.input, error)),
    };

    let content = std::fs::read_to_string(&job.input)
        .with_context(|| format!("Failed to read input file: {}", job.input.display()))?;
    let source = SourceNotebook {
        path: job.input.clone(),
        content,
        kind,
    };

    let notebook = match split(&source) {
        Ok(notebook) => notebook,
        Err(error) => return Ok(skipped(&job.input, error)),
    };

    let output = job.staged.with_extension(notebook.language.as_str());
    if let Some(first) = written.get(&output) {
        let clash = SkipReason::OutputClash {
            input: job.input.clone(),
            output,
            first: first.clone(),
        };
        return Ok(skipped(&job.input, clash));
    }

    let name = job
        .staged
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = OriginBase::random();
    let commands = build_commands(base, &notebook.cells);
    let command_count = commands.len();
    let document = assemble(&name, notebook.language.clone(), commands, base);
    let json = to_pretty_json(&document)
        .with_context(|| format!("Failed to serialize notebook: {}", job.input.display()))?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write notebook: {}", output.display()))?;
    written.insert(output.clone(), job.input.clone());

    tracing::debug!(
        input = %job.input.display(),
        output = %output.display(),
        language = %notebook.language,
        commands = command_count,
        "converted notebook"
    );

    Ok(FileOutcome::Converted(ConvertedNotebook {
        input: job.input.clone(),
        output,
        language: notebook.language,
        commands: command_count,
    }))
}

/// Convert every job in order. In strict mode the first skipped file
/// aborts the run; otherwise it is logged and recorded.
pub fn convert_all(
    jobs: &[ConvertJob],
    strict: bool,
) -> Result<(Vec<ConvertedNotebook>, Vec<SkippedFile>)> {
    let mut converted = Vec::new();
    let mut skipped = Vec::new();
    let mut written = HashMap::new();

    for job in jobs {
        match convert_file(job, &mut written)? {
            FileOutcome::Converted(notebook) => converted.push(notebook),
            FileOutcome::Skipped(file) => {
                if strict {
                    return Err(anyhow::Error::new(file.reason)
                        .context(format!("Failed to convert {}", file.input.display())));
                }
                tracing::warn!(input = %file.input.display(), "skipping file: {}", file.reason);
                skipped.push(file);
            }
        }
    }

    Ok((converted, skipped))
}

/// Run a full conversion of `input` into `output` according to `config`.
pub fn run_convert(config: &ConvertConfig, input: &Path, output: &Path) -> Result<ConvertReport> {
    let input = input
        .canonicalize()
        .with_context(|| format!("Input path does not exist: {}", input.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        output_type = %config.output_type,
        "starting conversion"
    );

    match config.output_type {
        OutputType::Dbc => {
            let stem = input
                .file_stem()
                .ok_or_else(|| anyhow::anyhow!("Cannot name archive for {}", input.display()))?;
            let archive_path = output.join(format!("{}.dbc", stem.to_string_lossy()));

            let staging = tempfile::Builder::new()
                .prefix("databricks-convert-")
                .tempdir()
                .context("Failed to create staging directory")?;
            let jobs = resolve_inputs(&input, staging.path(), config.skip_hidden_dirs)?;
            let (converted, skipped) = convert_all(&jobs, config.strict)?;
            let archive = build_archive(staging.path(), &archive_path)?;

            Ok(ConvertReport {
                input,
                output: output.to_path_buf(),
                converted,
                skipped,
                archive: Some(archive),
            })
        }
        OutputType::Directory => {
            std::fs::create_dir_all(output).with_context(|| {
                format!("Failed to create output directory: {}", output.display())
            })?;
            let jobs = resolve_inputs(&input, output, config.skip_hidden_dirs)?;
            let (converted, skipped) = convert_all(&jobs, config.strict)?;

            Ok(ConvertReport {
                input,
                output: output.to_path_buf(),
                converted,
                skipped,
                archive: None,
            })
        }
    }
}
