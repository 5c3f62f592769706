//! `.dbc` archive packaging.
//!
//! A `.dbc` file is a zip whose layout the Databricks importer is picky
//! about: every folder level needs its own directory entry (name ending in
//! `/`, empty content), and all entries are deflated with no extra flag
//! bits and zeroed external attributes. Entries are written in sorted
//! order, directories first.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const EOCD_LEN: usize = 22;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const CENTRAL_HEADER_LEN: usize = 46;
/// Offset of the external file attributes within a central directory record.
const EXTERNAL_ATTR_OFFSET: usize = 38;

/// What was written to an archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub directories: usize,
    pub files: usize,
}

/// List every file under `root`, as paths relative to `root`, sorted.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk staging tree: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push(relative.to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// Union of all ancestor directories of `files` (relative paths), excluding
/// the root itself. Intermediate levels without direct file children are
/// included.
pub fn ancestor_dirs(files: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut dirs = BTreeSet::new();
    for file in files {
        let mut current = file.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            if !dirs.insert(dir.to_path_buf()) {
                // ancestors of an already-seen dir are already present
                break;
            }
            current = dir.parent();
        }
    }
    dirs
}

/// Zip entry name for a relative path: `/`-separated, no leading `/`.
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    buf.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Offsets of every central directory record in a finished archive.
pub fn central_directory_records(buf: &[u8]) -> Result<Vec<usize>> {
    let eocd = (0..=buf.len().saturating_sub(EOCD_LEN))
        .rev()
        .find(|&at| read_u32(buf, at) == Some(EOCD_SIGNATURE))
        .ok_or_else(|| anyhow!("end of central directory record not found"))?;
    let count = read_u16(buf, eocd + 10)
        .ok_or_else(|| anyhow!("truncated end of central directory record"))?;
    let offset = read_u32(buf, eocd + 16)
        .ok_or_else(|| anyhow!("truncated end of central directory record"))?;
    if offset == u32::MAX {
        bail!("zip64 archives are not supported");
    }

    let mut records = Vec::with_capacity(count as usize);
    let mut at = offset as usize;
    for _ in 0..count {
        if at + CENTRAL_HEADER_LEN > buf.len()
            || read_u32(buf, at) != Some(CENTRAL_HEADER_SIGNATURE)
        {
            bail!("invalid central directory record at offset {}", at);
        }
        let variable: usize = [28, 30, 32]
            .iter()
            .map(|&field| read_u16(buf, at + field).unwrap_or(0) as usize)
            .sum();
        records.push(at);
        at += CENTRAL_HEADER_LEN + variable;
    }
    Ok(records)
}

/// Zero the external attributes of every entry. The zip writer always
/// records Unix mode bits, which the Databricks importer does not expect.
fn clear_external_attributes(buf: &mut [u8]) -> Result<()> {
    for at in central_directory_records(buf)? {
        buf[at + EXTERNAL_ATTR_OFFSET..at + EXTERNAL_ATTR_OFFSET + 4].fill(0);
    }
    Ok(())
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// Package everything under `staging_root` into a `.dbc` archive at
/// `output_file`, creating parent directories as needed.
pub fn build_archive(staging_root: &Path, output_file: &Path) -> Result<ArchiveSummary> {
    let files = collect_files(staging_root)?;
    let dirs = ancestor_dirs(&files);

    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = entry_options();

    // Added via start_file rather than add_directory, which would force
    // stored compression and directory permission bits.
    for dir in &dirs {
        zip.start_file(format!("{}/", entry_name(dir)), options)
            .with_context(|| format!("Failed to add directory entry: {}", dir.display()))?;
    }

    for file in &files {
        let source = staging_root.join(file);
        let bytes = std::fs::read(&source)
            .with_context(|| format!("Failed to read staged notebook: {}", source.display()))?;
        zip.start_file(entry_name(file), options)
            .with_context(|| format!("Failed to add file entry: {}", file.display()))?;
        zip.write_all(&bytes)?;
    }

    let mut buf = zip
        .finish()
        .with_context(|| format!("Failed to finalize archive: {}", output_file.display()))?
        .into_inner();
    clear_external_attributes(&mut buf)
        .with_context(|| format!("Failed to patch archive: {}", output_file.display()))?;
    std::fs::write(output_file, &buf)
        .with_context(|| format!("Failed to write archive: {}", output_file.display()))?;

    tracing::info!(
        archive = %output_file.display(),
        directories = dirs.len(),
        files = files.len(),
        "archive written"
    );

    Ok(ArchiveSummary {
        path: output_file.to_path_buf(),
        directories: dirs.len(),
        files: files.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::File;
    use std::io::Read;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn ancestor_dirs_include_intermediate_levels() {
        let files = vec![PathBuf::from("a/b/c/deep.python"), PathBuf::from("top.scala")];
        let dirs: Vec<PathBuf> = ancestor_dirs(&files).into_iter().collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("a"),
                PathBuf::from("a/b"),
                PathBuf::from("a/b/c")
            ]
        );
    }

    #[test]
    fn ancestor_dirs_are_unique() {
        let files = vec![
            PathBuf::from("a/one.python"),
            PathBuf::from("a/two.python"),
            PathBuf::from("a/b/three.scala"),
        ];
        assert_eq!(ancestor_dirs(&files).len(), 2);
    }

    #[test]
    fn archive_round_trip() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("staging");
        write(&staging, "a/one.python", "{\"one\": 1}");
        write(&staging, "a/b/c/two.scala", "{\"two\": 2}");
        let out = tmp.path().join("out/nested/test.dbc");

        let summary = build_archive(&staging, &out).unwrap();
        assert_eq!(summary.directories, 3);
        assert_eq!(summary.files, 2);

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            assert_eq!(entry.compression(), CompressionMethod::Deflated);
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            if entry.is_dir() {
                assert!(body.is_empty());
            } else {
                let expected = fs::read_to_string(staging.join(entry.name())).unwrap();
                assert_eq!(body, expected);
            }
            names.push(entry.name().to_string());
        }
        assert_eq!(
            names,
            vec!["a/", "a/b/", "a/b/c/", "a/b/c/two.scala", "a/one.python"]
        );
    }

    #[test]
    fn root_level_file_has_no_directory_entry() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("staging");
        write(&staging, "notebook.python", "{}");
        let out = tmp.path().join("notebook.dbc");

        let summary = build_archive(&staging, &out).unwrap();
        assert_eq!(summary.directories, 0);

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["notebook.python"]);
    }

    #[test]
    fn entries_have_no_flags_or_external_attributes() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("staging");
        write(&staging, "a/b/x.python", "{}");
        write(&staging, "a/y.scala", "{}");
        let out = tmp.path().join("attrs.dbc");
        build_archive(&staging, &out).unwrap();

        let buf = fs::read(&out).unwrap();
        let records = central_directory_records(&buf).unwrap();
        assert_eq!(records.len(), 4);
        for at in records {
            assert_eq!(read_u16(&buf, at + 8), Some(0), "general purpose flags");
            assert_eq!(read_u16(&buf, at + 10), Some(8), "compression method");
            assert_eq!(read_u32(&buf, at + EXTERNAL_ATTR_OFFSET), Some(0), "external attributes");
        }

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["a/", "a/b/", "a/b/x.python", "a/y.scala"]);
    }
}
