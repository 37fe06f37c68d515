//! Diagnostic log sink.
//!
//! Data problems (malformed lines, missing bios, compiler failures) are
//! reported through a [`DiagnosticSink`] handed to each pipeline stage,
//! rather than a process-wide logger. Every entry is also mirrored to
//! `tracing` at the matching level.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{LineageError, Result};

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

impl DiagnosticLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// A single diagnostic line.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

impl DiagnosticEntry {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.to_rfc3339(),
            self.level.as_str(),
            self.message
        )
    }
}

/// Destination for diagnostics produced during a run.
pub trait DiagnosticSink {
    /// Record one entry.
    fn record(&mut self, entry: DiagnosticEntry);

    /// Flush buffered entries. Called once at the end of a run.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn info(&mut self, message: &str) {
        tracing::info!(target: "lineagebook::diagnostics", "{message}");
        self.record(DiagnosticEntry::new(DiagnosticLevel::Info, message));
    }

    fn warning(&mut self, message: &str) {
        tracing::warn!(target: "lineagebook::diagnostics", "{message}");
        self.record(DiagnosticEntry::new(DiagnosticLevel::Warning, message));
    }

    fn error(&mut self, message: &str) {
        tracing::error!(target: "lineagebook::diagnostics", "{message}");
        self.record(DiagnosticEntry::new(DiagnosticLevel::Error, message));
    }
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

/// Keeps entries in memory. Used by tests and `check`.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Vec<DiagnosticEntry>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// True if any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

impl DiagnosticSink for MemoryDiagnostics {
    fn record(&mut self, entry: DiagnosticEntry) {
        self.entries.push(entry);
    }
}

// ---------------------------------------------------------------------------
// Append-only file sink
// ---------------------------------------------------------------------------

/// Appends entries to a log file, opened once per run.
pub struct FileDiagnostics {
    path: PathBuf,
    writer: BufWriter<File>,
    write_failed: bool,
}

impl FileDiagnostics {
    /// Open (or create) `path` for appending. Parent directories are created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LineageError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LineageError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            write_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for FileDiagnostics {
    fn record(&mut self, entry: DiagnosticEntry) {
        if let Err(e) = writeln!(self.writer, "{entry}") {
            // Report once; the run continues without the file log.
            if !self.write_failed {
                tracing::warn!(path = %self.path.display(), error = %e, "diagnostic log write failed");
                self.write_failed = true;
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LineageError::io(&self.path, e))
    }
}

impl Drop for FileDiagnostics {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_counts_levels() {
        let mut sink = MemoryDiagnostics::new();
        sink.warning("missing bio for 'Master Smith, John'");
        sink.error("line 3: missing student name");
        sink.warning("line 4: missing date");

        assert_eq!(sink.count(DiagnosticLevel::Warning), 2);
        assert_eq!(sink.count(DiagnosticLevel::Error), 1);
        assert!(sink.contains("missing bio"));
    }

    #[test]
    fn file_sink_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("lineage.log");

        {
            let mut sink = FileDiagnostics::open(&path).unwrap();
            sink.info("first run");
            sink.flush().unwrap();
        }
        {
            let mut sink = FileDiagnostics::open(&path).unwrap();
            sink.error("second run");
            sink.flush().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - first run"));
        assert!(lines[1].ends_with(" - ERROR - second run"));
    }
}
