//! Per-file warning/error bookkeeping.

use std::fmt::Write as _;

use serde::Serialize;

use crate::record::{Issue, LineReport};

/// One offending line, kept verbatim for manual correction.
#[derive(Debug, Clone, Serialize)]
pub struct LineIssue {
    pub line_number: usize,
    pub text: String,
    pub warnings: Vec<Issue>,
    pub errors: Vec<Issue>,
}

/// Issues found in one source file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileIssues {
    pub file: String,
    pub warnings: usize,
    pub errors: usize,
    /// Lines parsed into records.
    pub accepted: usize,
    /// Lines dropped because of errors.
    pub rejected: usize,
    /// File-level failure (unreadable file), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub lines: Vec<LineIssue>,
}

impl FileIssues {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    /// Fold one line's report into the totals.
    pub fn record_line(&mut self, line_number: usize, text: &str, report: &LineReport) {
        if report.record.is_some() {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }

        if !report.has_issues() {
            return;
        }

        self.warnings += report.warnings.len();
        self.errors += report.errors.len();
        self.lines.push(LineIssue {
            line_number,
            text: text.to_string(),
            warnings: report.warnings.clone(),
            errors: report.errors.clone(),
        });
    }

    /// Mark the whole file as unreadable.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.failure = Some(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }

    /// Human-readable summary followed by each offending line.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Summary of Issues:\n  Warnings: {}\n  Errors: {}",
            self.warnings, self.errors
        );

        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "\nFile could not be read: {failure}");
            return out;
        }

        if self.lines.is_empty() {
            out.push_str("\nNo issues found. File is valid.\n");
            return out;
        }

        out.push_str("\nDetailed Issues:\n");
        for line in &self.lines {
            let _ = writeln!(out, "  Line {}: {}", line.line_number, line.text);
            for warning in &line.warnings {
                let _ = writeln!(out, "    - Warning: {warning}");
            }
            for error in &line.errors {
                let _ = writeln!(out, "    - Error: {error}");
            }
        }
        out
    }
}

/// Issues for every file in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueLog {
    pub files: Vec<FileIssues>,
}

impl IssueLog {
    pub fn push(&mut self, file: FileIssues) {
        self.files.push(file);
    }

    pub fn total_warnings(&self) -> usize {
        self.files.iter().map(|f| f.warnings).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.files.iter().map(|f| f.errors).sum()
    }

    pub fn file(&self, name: &str) -> Option<&FileIssues> {
        self.files.iter().find(|f| f.file == name)
    }
}
