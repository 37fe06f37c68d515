//! Raw record line parsing and validation.
//!
//! A record line is six positional fields:
//! `teacher, address, student, date, rank, number`, separated by commas or
//! (as written by the export tool) by ` | `. Teacher, student and rank are
//! mandatory; the rest fall back to placeholders with a warning.

use std::fmt;

use serde::Serialize;

use lineagebook_shared::{MISSING_NUMBER, StudentEntry};

use crate::date::{NormalizedDate, normalize_date};
use crate::name::normalize_name;

/// Fewest fields a line must split into to be usable.
pub const MIN_FIELDS: usize = 5;

/// A line split into its positional fields. Empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub teacher: Option<String>,
    pub address: Option<String>,
    pub student: Option<String>,
    pub date: Option<String>,
    pub rank: Option<String>,
    pub number: Option<String>,
    /// How many fields the line split into.
    pub field_count: usize,
}

impl RawRecord {
    /// Split one line on its delimiter and trim each field.
    ///
    /// A line is pipe-delimited when it contains ` | `, or when it has `|`
    /// but no comma at all. Anything else splits on commas, so a stray `|`
    /// inside a comma-separated field stays in that field. Fields past the
    /// sixth are ignored.
    pub fn split(line: &str) -> Self {
        let delimiter = delimiter_for(line);
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();

        let field = |idx: usize| {
            fields
                .get(idx)
                .filter(|f| !f.is_empty())
                .map(|f| (*f).to_string())
        };

        Self {
            teacher: field(0),
            address: field(1),
            student: field(2),
            date: field(3),
            rank: field(4),
            number: field(5),
            field_count: fields.len(),
        }
    }
}

fn delimiter_for(line: &str) -> char {
    if line.contains(" | ") || (line.contains('|') && !line.contains(',')) {
        '|'
    } else {
        ','
    }
}

/// A problem found on one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    TooFewFields { found: usize },
    MissingTeacher,
    MissingStudent,
    MissingRank,
    MissingAddress,
    MissingDate,
    InvalidDate { value: String },
    MissingNumber,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields { found } => {
                write!(f, "Too few fields ({found}, need at least {MIN_FIELDS}).")
            }
            Self::MissingTeacher => f.write_str("Missing teacher name (with title)."),
            Self::MissingStudent => f.write_str("Missing student name."),
            Self::MissingRank => f.write_str("Missing student rank."),
            Self::MissingAddress => f.write_str("Missing teacher address."),
            Self::MissingDate => f.write_str("Missing date."),
            Self::InvalidDate { value } => write!(f, "Invalid date format: '{value}'."),
            Self::MissingNumber => f.write_str("Missing student number."),
        }
    }
}

/// A record that passed validation, ready for the lineage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    /// Normalized teacher name.
    pub teacher: String,
    /// Address, empty when missing.
    pub address: String,
    pub student: StudentEntry,
}

/// Everything the parser learned from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    pub record: Option<ValidRecord>,
    pub warnings: Vec<Issue>,
    pub errors: Vec<Issue>,
}

impl LineReport {
    pub fn has_issues(&self) -> bool {
        !self.warnings.is_empty() || !self.errors.is_empty()
    }
}

/// Parse and validate one line.
///
/// Errors drop the record; warnings keep it with placeholders filled in.
pub fn parse_line(line: &str) -> LineReport {
    let raw = RawRecord::split(line);
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if raw.field_count < MIN_FIELDS {
        errors.push(Issue::TooFewFields {
            found: raw.field_count,
        });
    }
    if raw.teacher.is_none() {
        errors.push(Issue::MissingTeacher);
    }
    if raw.student.is_none() {
        errors.push(Issue::MissingStudent);
    }
    if raw.rank.is_none() {
        errors.push(Issue::MissingRank);
    }

    if raw.address.is_none() {
        warnings.push(Issue::MissingAddress);
    }
    let date = normalize_date(raw.date.as_deref().unwrap_or_default());
    match &date {
        NormalizedDate::Missing => warnings.push(Issue::MissingDate),
        NormalizedDate::Invalid(value) => warnings.push(Issue::InvalidDate {
            value: value.clone(),
        }),
        NormalizedDate::Valid(_) => {}
    }
    if raw.number.is_none() {
        warnings.push(Issue::MissingNumber);
    }

    let record = match (&raw.teacher, &raw.student, &raw.rank) {
        (Some(teacher), Some(student), Some(rank)) if errors.is_empty() => Some(ValidRecord {
            teacher: normalize_name(teacher),
            address: raw.address.clone().unwrap_or_default(),
            student: StudentEntry {
                name: student.clone(),
                date: date.display(),
                rank: rank.clone(),
                number: raw
                    .number
                    .clone()
                    .unwrap_or_else(|| MISSING_NUMBER.to_string()),
            },
        }),
        _ => None,
    };

    LineReport {
        record,
        warnings,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagebook_shared::INVALID_DATE;

    #[test]
    fn full_comma_line() {
        let report = parse_line("Master John Smith, 123 Oak St, Jane Doe, 2023-05-01, Black, 12");
        assert!(!report.has_issues());
        let record = report.record.unwrap();
        assert_eq!(record.teacher, "Master Smith, John");
        assert_eq!(record.address, "123 Oak St");
        assert_eq!(record.student.name, "Jane Doe");
        assert_eq!(record.student.date, "2023-05-01");
        assert_eq!(record.student.rank, "Black");
        assert_eq!(record.student.number, "12");
    }

    #[test]
    fn pipe_line_from_export_tool() {
        let report =
            parse_line("Grand Master Kim Lee | 55 Pine Ave | Taylor Brown | 02/03/2024 | Yellow | 7");
        let record = report.record.unwrap();
        assert_eq!(record.teacher, "Grand Master Lee, Kim");
        assert_eq!(record.student.date, "2024-02-03");
        assert_eq!(record.student.number, "7");
    }

    #[test]
    fn pipe_line_keeps_commas_in_address() {
        let report = parse_line(
            "Master John Smith | 123 Main Street, Chicago, IL 12345 | Jane Doe | 2023-05-01 | Black | 12",
        );
        assert!(!report.has_issues());
        let record = report.record.unwrap();
        assert_eq!(record.address, "123 Main Street, Chicago, IL 12345");
        assert_eq!(record.student.name, "Jane Doe");
        assert_eq!(record.student.number, "12");
    }

    #[test]
    fn stray_pipe_in_comma_line_stays_in_field() {
        let raw = RawRecord::split("Master John Smith, 12 A|B St, Jane Doe, 2023-05-01, Black, 12");
        assert_eq!(raw.field_count, 6);
        assert_eq!(raw.address.as_deref(), Some("12 A|B St"));

        let report = parse_line("Master John Smith, 12 A|B St, Jane Doe, 2023-05-01, Black, 12");
        assert!(!report.has_issues());
        assert_eq!(report.record.unwrap().address, "12 A|B St");
    }

    #[test]
    fn compact_pipe_line_without_commas() {
        let raw = RawRecord::split("Mr. Al Bo|1 Main St|Cy Do|2020-01-01|Blue|3");
        assert_eq!(raw.field_count, 6);
        assert_eq!(raw.rank.as_deref(), Some("Blue"));
    }

    #[test]
    fn optional_fields_become_warnings() {
        let report = parse_line("Master John Smith, 123 Oak St, Chris Lee, invalid-date, Yellow,");
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec![
                Issue::InvalidDate {
                    value: "invalid-date".into()
                },
                Issue::MissingNumber
            ]
        );
        let record = report.record.unwrap();
        assert_eq!(record.student.date, INVALID_DATE);
        assert_eq!(record.student.number, MISSING_NUMBER);
    }

    #[test]
    fn missing_address_kept() {
        let report = parse_line("Ms. Ana Ruiz, , Sam Roe, , White");
        assert!(report.errors.is_empty());
        assert!(report.warnings.contains(&Issue::MissingAddress));
        assert!(report.warnings.contains(&Issue::MissingDate));
        assert!(report.warnings.contains(&Issue::MissingNumber));
        assert_eq!(report.record.unwrap().address, "");
    }

    #[test]
    fn too_few_fields_is_error() {
        let report = parse_line("Master John Smith, 123 Oak St, Jane Doe, 2023-05-01");
        assert!(report.record.is_none());
        assert!(report.errors.contains(&Issue::TooFewFields { found: 4 }));
        assert!(report.errors.contains(&Issue::MissingRank));
    }

    #[test]
    fn mandatory_fields_are_errors() {
        for line in [
            ", 123 Oak St, Jane Doe, 2023-05-01, Black, 12",
            "Master John Smith, 123 Oak St, , 2023-05-01, Black, 12",
            "Master John Smith, 123 Oak St, Jane Doe, 2023-05-01, , 12",
        ] {
            let report = parse_line(line);
            assert!(report.record.is_none(), "should drop: {line}");
            assert_eq!(report.errors.len(), 1, "one error for: {line}");
        }
    }

    #[test]
    fn extra_trailing_fields_ignored() {
        let report = parse_line("Mr. Al Bo, 1 Main St, Cy Do, 2020-01-01, Blue, 3, extra, more");
        assert!(!report.has_issues());
        assert_eq!(report.record.unwrap().student.number, "3");
    }

    #[test]
    fn issue_messages_read_naturally() {
        assert_eq!(Issue::MissingStudent.to_string(), "Missing student name.");
        assert_eq!(
            Issue::TooFewFields { found: 2 }.to_string(),
            "Too few fields (2, need at least 5)."
        );
    }
}
