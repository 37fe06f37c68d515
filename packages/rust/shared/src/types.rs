//! Core domain types for the lineage document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Date placeholder for a record with no date.
pub const NO_DATE: &str = "No Date Provided";

/// Date placeholder for a date that matched none of the accepted formats.
pub const INVALID_DATE: &str = "Invalid Date Format";

/// Address placeholder for a record with no address.
pub const UNKNOWN_ADDRESS: &str = "Unknown Address";

/// Number placeholder for a record with no student number.
pub const MISSING_NUMBER: &str = "N/A";

/// Name placeholder for a default-constructed student entry.
pub const UNKNOWN_STUDENT: &str = "Unknown Student";

// ---------------------------------------------------------------------------
// StudentEntry
// ---------------------------------------------------------------------------

/// One student row under a teacher's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEntry {
    /// Student name as it appeared in the record.
    pub name: String,
    /// Canonical `YYYY-MM-DD`, or [`NO_DATE`] / [`INVALID_DATE`].
    pub date: String,
    /// Rank (belt, grade, ...).
    pub rank: String,
    /// Student number, or [`MISSING_NUMBER`].
    pub number: String,
}

impl Default for StudentEntry {
    fn default() -> Self {
        Self {
            name: UNKNOWN_STUDENT.into(),
            date: NO_DATE.into(),
            rank: String::new(),
            number: MISSING_NUMBER.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bio
// ---------------------------------------------------------------------------

/// Biographical side-data for one teacher. Absent lines stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

impl Bio {
    /// True when none of the recognized lines were present.
    pub fn is_empty(&self) -> bool {
        self.hometown.is_none() && self.student_of.is_none() && self.nationality.is_none()
    }
}

// ---------------------------------------------------------------------------
// LineageTree
// ---------------------------------------------------------------------------

/// One address and the students registered there, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub address: String,
    pub students: Vec<StudentEntry>,
}

/// One teacher, their optional bio, and their addresses in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherEntry {
    /// Normalized teacher name (the tree key).
    pub name: String,
    pub bio: Option<Bio>,
    pub locations: Vec<Location>,
}

impl TeacherEntry {
    /// Total students across all addresses.
    pub fn student_count(&self) -> usize {
        self.locations.iter().map(|l| l.students.len()).sum()
    }
}

/// Teacher → address → students, preserving first-seen order at every level.
#[derive(Debug, Clone, Default)]
pub struct LineageTree {
    teachers: Vec<TeacherEntry>,
    index: HashMap<String, usize>,
}

impl LineageTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a student under `teacher` / `address`, creating either level if absent.
    ///
    /// An empty address is filed under [`UNKNOWN_ADDRESS`].
    pub fn insert(&mut self, teacher: &str, address: &str, student: StudentEntry) {
        let address = if address.trim().is_empty() {
            UNKNOWN_ADDRESS
        } else {
            address
        };

        let teacher_idx = match self.index.get(teacher) {
            Some(&idx) => idx,
            None => {
                self.teachers.push(TeacherEntry {
                    name: teacher.to_string(),
                    bio: None,
                    locations: Vec::new(),
                });
                let idx = self.teachers.len() - 1;
                self.index.insert(teacher.to_string(), idx);
                idx
            }
        };

        let locations = &mut self.teachers[teacher_idx].locations;
        match locations.iter_mut().find(|l| l.address == address) {
            Some(location) => location.students.push(student),
            None => locations.push(Location {
                address: address.to_string(),
                students: vec![student],
            }),
        }
    }

    /// Look up a teacher by normalized name.
    pub fn get(&self, teacher: &str) -> Option<&TeacherEntry> {
        self.index.get(teacher).map(|&idx| &self.teachers[idx])
    }

    /// Mutable lookup by normalized name.
    pub fn get_mut(&mut self, teacher: &str) -> Option<&mut TeacherEntry> {
        match self.index.get(teacher) {
            Some(&idx) => Some(&mut self.teachers[idx]),
            None => None,
        }
    }

    /// Teachers in insertion order.
    pub fn teachers(&self) -> &[TeacherEntry] {
        &self.teachers
    }

    pub fn teachers_mut(&mut self) -> impl Iterator<Item = &mut TeacherEntry> {
        self.teachers.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }

    pub fn teacher_count(&self) -> usize {
        self.teachers.len()
    }

    pub fn address_count(&self) -> usize {
        self.teachers.iter().map(|t| t.locations.len()).sum()
    }

    pub fn student_count(&self) -> usize {
        self.teachers.iter().map(TeacherEntry::student_count).sum()
    }
}
