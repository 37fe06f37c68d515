//! Record ingestion: name and date normalization, line parsing, bios.
//!
//! Raw data arrives as a directory of delimited text files, one student
//! record per line, plus a directory of teacher bios. This crate turns both
//! into validated, typed values and keeps a per-file issue log. Nothing
//! here aborts on bad data: bad lines are dropped, bad files are skipped,
//! and every problem is reported through a [`DiagnosticSink`].

pub mod bios;
pub mod date;
pub mod issues;
pub mod merge;
pub mod name;
pub mod record;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use lineagebook_shared::{DiagnosticSink, LineageError, Result};

pub use bios::{BioMap, load_bios, parse_bio, teacher_key_from_stem};
pub use date::{DATE_PATTERNS, NormalizedDate, normalize_date};
pub use issues::{FileIssues, IssueLog, LineIssue};
pub use merge::{MergeOutcome, dedupe_lines, merge_directory, merge_sources, merged_file_name};
pub use name::{NormalizedName, Title, normalize_name};
pub use record::{Issue, LineReport, MIN_FIELDS, RawRecord, ValidRecord, parse_line};

/// Records and issues gathered from a raw-data directory.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    /// Valid records in file order, then line order.
    pub records: Vec<ValidRecord>,
    pub issues: IssueLog,
}

/// Parse the contents of one file. Blank lines are skipped; line numbers are 1-based.
pub fn parse_content(file: &str, content: &str) -> (Vec<ValidRecord>, FileIssues) {
    let mut records = Vec::new();
    let mut issues = FileIssues::new(file);

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let report = parse_line(line);
        issues.record_line(idx + 1, line, &report);
        if let Some(record) = report.record {
            records.push(record);
        }
    }

    (records, issues)
}

/// Read and validate a single file.
pub fn check_file(path: &Path) -> Result<(Vec<ValidRecord>, FileIssues)> {
    let content = std::fs::read_to_string(path).map_err(|e| LineageError::io(path, e))?;
    Ok(parse_content(&display_name(path), &content))
}

/// Non-hidden regular files in `dir`, sorted by name.
pub fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| LineageError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !name.to_string_lossy().starts_with('.'))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read every data file in `dir`.
///
/// Each file is handled on its own: an unreadable file is logged and the
/// rest are still processed. A missing directory yields no records.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn read_raw_data(dir: &Path, diagnostics: &mut dyn DiagnosticSink) -> RawData {
    let mut data = RawData::default();

    let files = match list_data_files(dir) {
        Ok(files) => files,
        Err(e) => {
            diagnostics.error(&format!("RAW Data directory not found or unreadable: {e}"));
            return data;
        }
    };

    for path in files {
        let name = display_name(&path);

        match check_file(&path) {
            Ok((records, issues)) => {
                debug!(file = %name, records = records.len(), "parsed data file");
                report_file(&issues, diagnostics);
                data.records.extend(records);
                data.issues.push(issues);
            }
            Err(e) => {
                diagnostics.error(&format!("Error reading file {}: {e}", path.display()));
                let mut issues = FileIssues::new(name);
                issues.record_failure(e.to_string());
                data.issues.push(issues);
            }
        }
    }

    info!(
        files = data.issues.files.len(),
        records = data.records.len(),
        warnings = data.issues.total_warnings(),
        errors = data.issues.total_errors(),
        "raw data read"
    );

    data
}

/// Send one file's issues to the diagnostic log.
fn report_file(issues: &FileIssues, diagnostics: &mut dyn DiagnosticSink) {
    for line in &issues.lines {
        for error in &line.errors {
            diagnostics.error(&format!(
                "{}:{}: {error} | {}",
                issues.file, line.line_number, line.text
            ));
        }
        for warning in &line.warnings {
            diagnostics.warning(&format!(
                "{}:{}: {warning} | {}",
                issues.file, line.line_number, line.text
            ));
        }
    }

    diagnostics.info(&format!(
        "{}: {} warning(s), {} error(s), {} record(s) accepted, {} rejected",
        issues.file, issues.warnings, issues.errors, issues.accepted, issues.rejected
    ));
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagebook_shared::{DiagnosticLevel, MemoryDiagnostics};

    #[test]
    fn parse_content_skips_blank_lines_but_counts_them() {
        let content = "\nMaster John Smith, 1 Oak St, Jane Doe, 2023-05-01, Black, 12\n\nbroken line\n";
        let (records, issues) = parse_content("a.txt", content);

        assert_eq!(records.len(), 1);
        assert_eq!(issues.rejected, 1);
        assert_eq!(issues.lines[0].line_number, 4);
        assert_eq!(issues.lines[0].text, "broken line");
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let mut sink = MemoryDiagnostics::new();
        let data = read_raw_data(Path::new("/no/such/RAW Data"), &mut sink);
        assert!(data.records.is_empty());
        assert_eq!(sink.count(DiagnosticLevel::Error), 1);
    }

    #[test]
    fn hidden_files_are_ignored_and_order_is_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.txt"),
            "Master John Smith, 1 Oak St, Second File, 2023-05-01, Black, 2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.txt"),
            "Master John Smith, 1 Oak St, First File, 2023-05-01, Black, 1\n",
        )
        .unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "junk").unwrap();

        let mut sink = MemoryDiagnostics::new();
        let data = read_raw_data(dir.path(), &mut sink);

        let names: Vec<_> = data.records.iter().map(|r| r.student.name.as_str()).collect();
        assert_eq!(names, ["First File", "Second File"]);
        assert_eq!(data.issues.files.len(), 2);
    }

    #[test]
    fn unreadable_file_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        std::fs::write(
            dir.path().join("b.txt"),
            "Ms. Ana Ruiz, 2 Elm Rd, Sam Roe, 2022-01-01, White, 4\n",
        )
        .unwrap();

        let mut sink = MemoryDiagnostics::new();
        let data = read_raw_data(dir.path(), &mut sink);

        assert_eq!(data.records.len(), 1);
        let failed = data.issues.file("a.bin").unwrap();
        assert!(failed.failure.is_some());
        assert!(sink.contains("Error reading file"));
    }
}
