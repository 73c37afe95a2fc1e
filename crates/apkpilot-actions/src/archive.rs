//! Artifact archive extraction
//!
//! Archives are decoded into a hidden staging directory inside the
//! destination first. Entries are moved into place only after every entry
//! decoded, so a corrupt archive leaves nothing behind. Staged directories
//! are merged into existing ones file by file and staged files replace files
//! of the same name, which makes extracting the same archive twice produce
//! the same tree. Files already in the destination that the archive does not
//! contain are left alone. A file and a directory with the same path is a
//! conflict and aborts before anything is moved.
//!
//! Suffix search walks depth-first, visiting the entries of each directory
//! sorted by file name, and returns the first match.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{ActionsError, Result};

const STAGING_PREFIX: &str = ".apkpilot-staging-";

/// Files produced by one extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArchive {
    /// Directory the archive was extracted into
    pub destination: PathBuf,
    /// Extracted file paths relative to the destination, in archive order
    pub files: Vec<PathBuf>,
}

impl ExtractedArchive {
    /// Full paths of the extracted files
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|f| self.destination.join(f))
    }

    /// First file from this extraction whose name ends with `suffix`.
    ///
    /// Only files the archive itself contained are considered. The order
    /// matches [`find_by_suffix`]: depth-first with names sorted per level.
    pub fn find_by_suffix(&self, suffix: &str) -> Option<PathBuf> {
        let mut matches: Vec<&PathBuf> = self
            .files
            .iter()
            .filter(|f| {
                f.file_name()
                    .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
            })
            .collect();
        matches.sort();
        matches.first().map(|f| self.destination.join(f))
    }
}

/// Extract a zip payload into `destination`, all or nothing
#[instrument(skip(payload), fields(bytes = payload.len(), destination = %destination.display()))]
pub fn extract_archive(payload: &[u8], destination: &Path) -> Result<ExtractedArchive> {
    fs::create_dir_all(destination)?;

    // The compressed payload only lives on disk for the duration of the call
    let mut transient = tempfile::Builder::new()
        .prefix(".apkpilot-download-")
        .suffix(".zip")
        .tempfile_in(destination)?;
    transient.write_all(payload)?;
    transient.flush()?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(destination)?;

    let files = unpack(transient.reopen()?, staging.path())?;
    promote(staging.path(), destination)?;

    info!(
        destination = %destination.display(),
        files = files.len(),
        "extracted archive"
    );

    Ok(ExtractedArchive {
        destination: destination.to_path_buf(),
        files,
    })
}

/// Decode every entry of the archive into `staging`
fn unpack(file: fs::File, staging: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ActionsError::CorruptArchive(format!("Invalid zip file: {}", e)))?;

    let mut files = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            ActionsError::CorruptArchive(format!("Failed to read zip entry {}: {}", i, e))
        })?;

        let relative = entry.enclosed_name().ok_or_else(|| {
            ActionsError::CorruptArchive(format!(
                "Entry '{}' escapes the destination directory",
                entry.name()
            ))
        })?;
        let target = staging.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                ActionsError::CorruptArchive(format!(
                    "Failed to decompress '{}': {}",
                    relative.display(),
                    e
                ))
            }
            _ => ActionsError::Io(e),
        })?;

        debug!(entry = %relative.display(), "unpacked entry");
        files.push(relative);
    }

    Ok(files)
}

/// Staged entries of `dir`, sorted by name
fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Fail if a staged file would land on a directory or the reverse
fn check_conflicts(staging: &Path, destination: &Path) -> Result<()> {
    for entry in sorted_entries(staging)? {
        let target = destination.join(entry.file_name());
        if !target.exists() {
            continue;
        }

        let staged_dir = entry.file_type()?.is_dir();
        if staged_dir != target.is_dir() {
            return Err(ActionsError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "{} already exists as a {}",
                    target.display(),
                    if target.is_dir() { "directory" } else { "file" }
                ),
            )));
        }
        if staged_dir {
            check_conflicts(&entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move staged entries into the destination, merging directories
fn merge(staging: &Path, destination: &Path) -> Result<()> {
    for entry in sorted_entries(staging)? {
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() && target.is_dir() {
            merge(&entry.path(), &target)?;
            continue;
        }
        if target.is_file() {
            fs::remove_file(&target)?;
        }
        fs::rename(entry.path(), &target)?;
    }
    Ok(())
}

/// Move the staged tree into the destination
fn promote(staging: &Path, destination: &Path) -> Result<()> {
    check_conflicts(staging, destination)?;
    merge(staging, destination)
}

/// Find the first file under `root` whose name ends with `suffix`.
///
/// Returns `Ok(None)` when nothing matches.
pub fn find_by_suffix(root: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with(STAGING_PREFIX));

    for entry in walker {
        let entry = entry.map_err(|e| ActionsError::Io(e.into()))?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            debug!(path = %entry.path().display(), suffix, "found matching file");
            return Ok(Some(entry.into_path()));
        }
    }

    Ok(None)
}
