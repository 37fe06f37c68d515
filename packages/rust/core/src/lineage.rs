//! Lineage aggregation.
//!
//! Folds validated records into a [`LineageTree`] and merges in bios.
//! Pure data shaping: no validation, no I/O, never fails.

use tracing::{debug, instrument};

use lineagebook_ingest::{BioMap, ValidRecord};
use lineagebook_shared::LineageTree;

/// Which teachers got a bio and which bios matched no teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BioCoverage {
    pub matched: Vec<String>,
    /// Teachers with no bio, in insertion order.
    pub missing: Vec<String>,
    /// Bio keys that matched no teacher, sorted.
    pub unused: Vec<String>,
}

/// Build the tree from records in stream order.
#[instrument(skip_all)]
pub fn build_lineage<I>(records: I) -> LineageTree
where
    I: IntoIterator<Item = ValidRecord>,
{
    let mut tree = LineageTree::new();
    for record in records {
        tree.insert(&record.teacher, &record.address, record.student);
    }

    debug!(
        teachers = tree.teacher_count(),
        addresses = tree.address_count(),
        students = tree.student_count(),
        "lineage tree built"
    );
    tree
}

/// Attach each teacher's bio, if one was loaded under the same normalized name.
pub fn attach_bios(tree: &mut LineageTree, bios: &BioMap) -> BioCoverage {
    let mut coverage = BioCoverage::default();

    for teacher in tree.teachers_mut() {
        match bios.get(&teacher.name) {
            Some(bio) => {
                teacher.bio = Some(bio.clone());
                coverage.matched.push(teacher.name.clone());
            }
            None => coverage.missing.push(teacher.name.clone()),
        }
    }

    coverage.unused = bios
        .keys()
        .filter(|key| tree.get(key).is_none())
        .cloned()
        .collect();
    coverage.unused.sort();

    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineagebook_ingest::parse_line;
    use lineagebook_shared::Bio;

    fn records(lines: &[&str]) -> Vec<ValidRecord> {
        lines
            .iter()
            .filter_map(|line| parse_line(line).record)
            .collect()
    }

    #[test]
    fn same_teacher_and_address_preserve_order() {
        let tree = build_lineage(records(&[
            "Master John Smith, 123 Oak St, Zoe Young, 2023-05-01, Black, 1",
            "Master John Smith, 123 Oak St, Adam Ash, 2023-05-02, Blue, 2",
            "Master John Smith, 123 Oak St, Mia Moss, 2023-05-03, Red, 3",
        ]));

        assert_eq!(tree.teacher_count(), 1);
        let names: Vec<_> = tree.teachers()[0].locations[0]
            .students
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["Zoe Young", "Adam Ash", "Mia Moss"]);
    }

    #[test]
    fn pipe_lines_may_carry_preformatted_names() {
        let tree = build_lineage(records(&[
            "Master John Smith, 123 Oak St, A B, 2023-05-01, Black, 1",
            "Master Smith, John | 123 Oak St | C D | 2023-05-01 | Black | 2",
        ]));
        assert_eq!(tree.teacher_count(), 1);
        assert_eq!(tree.get("Master Smith, John").unwrap().student_count(), 2);
    }

    #[test]
    fn missing_address_grouped_under_placeholder() {
        let tree = build_lineage(records(&[
            "Ms. Ana Ruiz, , Sam Roe, 2022-01-01, White, 4",
            "Ms. Ana Ruiz, , Kim Poe, 2022-01-01, White, 5",
        ]));
        let teacher = tree.get("Ms. Ruiz, Ana").unwrap();
        assert_eq!(teacher.locations.len(), 1);
        assert_eq!(teacher.locations[0].address, "Unknown Address");
        assert_eq!(teacher.locations[0].students.len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        assert!(build_lineage(Vec::new()).is_empty());
    }

    #[test]
    fn bios_attach_by_normalized_name() {
        let mut tree = build_lineage(records(&[
            "Master John Smith, 123 Oak St, Jane Doe, 2023-05-01, Black, 12",
            "Mr. Al Bo, 1 Main St, Cy Do, 2020-01-01, Blue, 3",
        ]));

        let mut bios = BioMap::new();
        bios.insert(
            "Master Smith, John".into(),
            Bio {
                hometown: Some("Austin".into()),
                ..Default::default()
            },
        );
        bios.insert("Ms. Gone, Ghost".into(), Bio::default());

        let coverage = attach_bios(&mut tree, &bios);
        assert_eq!(coverage.matched, ["Master Smith, John"]);
        assert_eq!(coverage.missing, ["Mr. Bo, Al"]);
        assert_eq!(coverage.unused, ["Ms. Gone, Ghost"]);
        assert_eq!(
            tree.get("Master Smith, John").unwrap().bio.as_ref().unwrap().hometown.as_deref(),
            Some("Austin")
        );
    }
}
