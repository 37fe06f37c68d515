//! Consolidation of raw-data files.
//!
//! Upstream export tools drop one file per session into the raw-data
//! directory. [`merge_directory`] folds every `.txt` file into a single
//! timestamped file with exact duplicate lines removed. The merged file
//! lands in the same directory the build reads, so the sources must be
//! removed with [`MergeOutcome::remove_sources`] before the next build or
//! every record is counted twice.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, instrument};

use lineagebook_shared::{LineageError, Result};

use crate::list_data_files;

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged file that was written.
    pub output: PathBuf,
    /// Files whose lines went into `output`, sorted by name.
    pub sources: Vec<PathBuf>,
    /// Non-blank lines read across all sources.
    pub lines_read: usize,
    /// Lines written after removing duplicates.
    pub lines_written: usize,
}

impl MergeOutcome {
    pub fn duplicates(&self) -> usize {
        self.lines_read - self.lines_written
    }

    /// Delete the merged source files, calling `on_removed` after each.
    ///
    /// The merged output is never removed even if it appears in `sources`.
    #[instrument(skip_all, fields(output = %self.output.display()))]
    pub fn remove_sources(&self, mut on_removed: impl FnMut(&Path)) -> Result<usize> {
        let mut removed = 0;
        for path in self.sources.iter().filter(|p| **p != self.output) {
            std::fs::remove_file(path).map_err(|e| LineageError::io(path, e))?;
            on_removed(path);
            removed += 1;
        }
        info!(removed, "merge sources removed");
        Ok(removed)
    }
}

/// File name for a merge performed at `at`: `merged_<YYYYmmdd_HHMMSS>.txt`.
pub fn merged_file_name(at: NaiveDateTime) -> String {
    format!("merged_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Trim lines, drop blanks, and keep only the first occurrence of each.
pub fn dedupe_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}

/// `.txt` data files in `dir`, sorted by name.
pub fn merge_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_data_files(dir)?
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect())
}

/// Merge every `.txt` file in `dir` into one deduplicated file.
///
/// Returns `Ok(None)` when the sources hold no records; nothing is
/// written in that case. Source files are left in place until the caller
/// runs [`MergeOutcome::remove_sources`].
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn merge_directory(dir: &Path, at: NaiveDateTime) -> Result<Option<MergeOutcome>> {
    let sources = merge_sources(dir)?;

    let mut contents = Vec::with_capacity(sources.len());
    for path in &sources {
        contents.push(std::fs::read_to_string(path).map_err(|e| LineageError::io(path, e))?);
    }

    let lines_read = contents
        .iter()
        .flat_map(|c| c.lines())
        .filter(|line| !line.trim().is_empty())
        .count();
    if lines_read == 0 {
        return Ok(None);
    }

    let unique = dedupe_lines(contents.iter().flat_map(|c| c.lines()));

    let output = dir.join(merged_file_name(at));
    let mut body = unique.join("\n");
    body.push('\n');
    std::fs::write(&output, body).map_err(|e| LineageError::io(&output, e))?;

    info!(
        sources = sources.len(),
        lines_read,
        lines_written = unique.len(),
        output = %output.display(),
        "raw data merged"
    );

    Ok(Some(MergeOutcome {
        output,
        sources,
        lines_read,
        lines_written: unique.len(),
    }))
}
