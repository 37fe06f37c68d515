//! Teacher biography loader.
//!
//! Each `*.txt` file in the bios directory describes one teacher. The file
//! stem is the teacher's name with underscores for spaces
//! (`Master_John_A._Smith.txt`) and is normalized the same way record
//! teacher names are, so both sides agree on the key.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use lineagebook_shared::{Bio, DiagnosticSink};

use crate::name::normalize_name;

/// Matches `Key: value` for the three recognized keys.
static BIO_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Hometown|Student of|Nationality):\s*(.*)$").expect("bio line regex")
});

/// Bios keyed by normalized teacher name.
pub type BioMap = HashMap<String, Bio>;

/// Parse the body of one bio file. Returns the bio and any unrecognized lines.
pub fn parse_bio(content: &str) -> (Bio, Vec<String>) {
    let mut bio = Bio::default();
    let mut unrecognized = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(caps) = BIO_LINE_RE.captures(trimmed) else {
            unrecognized.push(trimmed.to_string());
            continue;
        };

        let value = caps[2].trim().to_string();
        match &caps[1] {
            "Hometown" => bio.hometown = Some(value),
            "Student of" => bio.student_of = Some(value),
            _ => bio.nationality = Some(value),
        }
    }

    (bio, unrecognized)
}

/// Lookup key for a bio file stem.
pub fn teacher_key_from_stem(stem: &str) -> String {
    normalize_name(&stem.replace('_', " "))
}

/// Load every bio in `dir`.
///
/// A missing directory or an unreadable file is reported to `diagnostics`
/// and skipped; this never fails.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_bios(dir: &Path, diagnostics: &mut dyn DiagnosticSink) -> BioMap {
    let mut bios = BioMap::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            diagnostics.warning(&format!(
                "Bios directory not found or unreadable: {} ({e})",
                dir.display()
            ));
            return bios;
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    paths.sort();

    for path in paths {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                diagnostics.error(&format!("Error reading bio file {}: {e}", path.display()));
                continue;
            }
        };

        let (bio, unrecognized) = parse_bio(&content);
        for line in &unrecognized {
            diagnostics.warning(&format!(
                "Unrecognized line in bio file {}: '{line}'",
                path.display()
            ));
        }

        let key = teacher_key_from_stem(&stem);
        debug!(file = %path.display(), teacher = %key, "loaded bio");
        if bios.insert(key.clone(), bio).is_some() {
            diagnostics.warning(&format!(
                "Duplicate bio for '{key}'; {} replaces an earlier file",
                path.display()
            ));
        }
    }

    diagnostics.info(&format!("Loaded {} bio(s) from {}", bios.len(), dir.display()));
    bios
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagebook_shared::{DiagnosticLevel, MemoryDiagnostics};

    #[test]
    fn parse_recognized_lines() {
        let (bio, unrecognized) = parse_bio(
            "Hometown: Chicago, IL\nStudent of: Grand Master Kim\nNationality: American\n",
        );
        assert_eq!(bio.hometown.as_deref(), Some("Chicago, IL"));
        assert_eq!(bio.student_of.as_deref(), Some("Grand Master Kim"));
        assert_eq!(bio.nationality.as_deref(), Some("American"));
        assert!(unrecognized.is_empty());
    }

    #[test]
    fn parse_keeps_unrecognized_lines_aside() {
        let (bio, unrecognized) = parse_bio("Hometown: Busan\nFavorite kick: roundhouse\n\n");
        assert_eq!(bio.hometown.as_deref(), Some("Busan"));
        assert!(bio.nationality.is_none());
        assert_eq!(unrecognized, vec!["Favorite kick: roundhouse".to_string()]);
    }

    #[test]
    fn stem_key_matches_record_key() {
        assert_eq!(
            teacher_key_from_stem("Master_John_A._Smith"),
            normalize_name("Master John A. Smith")
        );
    }

    #[test]
    fn missing_directory_is_empty_and_logged() {
        let mut sink = MemoryDiagnostics::new();
        let bios = load_bios(Path::new("/definitely/not/here/Bios"), &mut sink);
        assert!(bios.is_empty());
        assert_eq!(sink.count(DiagnosticLevel::Warning), 1);
        assert!(sink.contains("Bios directory not found"));
    }

    #[test]
    fn loads_txt_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Master_John_Smith.txt"),
            "Hometown: Austin, TX\nStudent of: Grand Master Lee\nNationality: American\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "Hometown: Nowhere\n").unwrap();

        let mut sink = MemoryDiagnostics::new();
        let bios = load_bios(dir.path(), &mut sink);

        assert_eq!(bios.len(), 1);
        let bio = bios.get("Master Smith, John").unwrap();
        assert_eq!(bio.hometown.as_deref(), Some("Austin, TX"));
    }
}
