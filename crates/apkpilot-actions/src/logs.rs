//! Workflow run log archives
//!
//! GitHub serves run logs as a zip with one text file per job step.

use std::io::{Cursor, Read};

use serde::Serialize;
use zip::ZipArchive;

use crate::error::{ActionsError, Result};

/// One log file from a run's log archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Name of the file inside the archive, usually `<job>/<step>.txt`
    pub name: String,
    pub content: String,
}

impl LogEntry {
    /// The last `n` lines of the log
    pub fn tail(&self, n: usize) -> Vec<&str> {
        let lines: Vec<&str> = self.content.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].to_vec()
    }
}

/// Read every `.txt` entry of a log archive, in archive order
pub fn read_log_archive(payload: &[u8]) -> Result<Vec<LogEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(payload))
        .map_err(|e| ActionsError::CorruptArchive(format!("Invalid log archive: {}", e)))?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            ActionsError::CorruptArchive(format!("Failed to read log entry {}: {}", i, e))
        })?;

        if file.is_dir() || !file.name().ends_with(".txt") {
            continue;
        }

        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(|e| {
            ActionsError::CorruptArchive(format!("Failed to decompress '{}': {}", file.name(), e))
        })?;

        entries.push(LogEntry {
            name: file.name().to_string(),
            content: String::from_utf8_lossy(&raw).into_owned(),
        });
    }

    Ok(entries)
}
