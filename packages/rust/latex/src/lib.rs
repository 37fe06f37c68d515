//! LaTeX rendering of a lineage tree.
//!
//! [`render`] walks a [`LineageTree`] and produces a complete `book`
//! document: preamble, license, introduction, table of contents, one
//! chapter per teacher with a bio paragraph and a roster table per address,
//! and the index. All user-supplied text goes through [`escape`].
//!
//! Output is deterministic: the founder chapter comes first, remaining
//! teachers follow in ascending name order, and roster rows are sorted by
//! the student's `Last, First` form.

mod escape;

use tracing::{debug, instrument};

use lineagebook_ingest::{NormalizedName, normalize_name};
use lineagebook_shared::{Bio, LineageTree, Location, StudentEntry, TeacherEntry};

pub use escape::{escape, escape_index, escape_paragraphs};

/// Placeholder in founder narratives replaced by the founder's name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Narrative used for the founder when none is configured.
pub const DEFAULT_FOUNDER_NARRATIVE: &str = "{name} is the founder of this lineage. \
Every teacher and student recorded in this book traces their training back to \
{name}, whose instruction and example shaped the schools that follow.";

const LICENSE_PLACEHOLDER: &str = "License information is not available.";
const INTRODUCTION_PLACEHOLDER: &str = "No introduction has been provided.";

const UNKNOWN_HOMETOWN: &str = "an unknown hometown";
const UNKNOWN_TEACHER: &str = "an unknown teacher";
const UNKNOWN_NATIONALITY: &str = "unknown";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options controlling the rendered document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub author: Option<String>,
    /// Founder teacher, already normalized. Rendered first when present.
    pub founder: Option<String>,
    /// Founder narrative; [`DEFAULT_FOUNDER_NARRATIVE`] when `None`.
    pub founder_narrative: Option<String>,
    /// License text, or `None` for a placeholder paragraph.
    pub license: Option<String>,
    /// Introduction text, or `None` for a placeholder paragraph.
    pub introduction: Option<String>,
    /// Emit `\index` entries and `\printindex`.
    pub generate_index: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Lineage".into(),
            author: None,
            founder: None,
            founder_narrative: None,
            license: None,
            introduction: None,
            generate_index: true,
        }
    }
}

/// Counts describing what was rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    pub chapters: usize,
    pub sections: usize,
    pub rows: usize,
    pub index_entries: usize,
    /// Teachers rendered with the "biography unavailable" paragraph.
    pub teachers_without_bio: Vec<String>,
}

/// A rendered document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub source: String,
    pub stats: RenderStats,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render the whole document.
#[instrument(skip_all, fields(teachers = tree.teacher_count()))]
pub fn render(tree: &LineageTree, opts: &RenderOptions) -> RenderedDocument {
    let mut out = String::new();
    let mut stats = RenderStats::default();

    write_preamble(&mut out, opts);
    out.push_str("\\begin{document}\n\\maketitle\n\n");

    write_front_chapter(&mut out, "License", opts.license.as_deref(), LICENSE_PLACEHOLDER);
    write_front_chapter(
        &mut out,
        "Introduction",
        opts.introduction.as_deref(),
        INTRODUCTION_PLACEHOLDER,
    );

    out.push_str("\\tableofcontents\n\n");

    for teacher in chapter_order(tree, opts.founder.as_deref()) {
        write_teacher_chapter(&mut out, teacher, opts, &mut stats);
    }

    if opts.generate_index {
        out.push_str("\\printindex\n");
    }
    out.push_str("\\end{document}\n");

    debug!(
        chapters = stats.chapters,
        sections = stats.sections,
        rows = stats.rows,
        bytes = out.len(),
        "document rendered"
    );

    RenderedDocument { source: out, stats }
}

/// Teachers in chapter order: founder first, then ascending by name.
pub fn chapter_order<'a>(tree: &'a LineageTree, founder: Option<&str>) -> Vec<&'a TeacherEntry> {
    let mut founder_entry = None;
    let mut rest = Vec::with_capacity(tree.teacher_count());

    for teacher in tree.teachers() {
        if founder.is_some_and(|f| f == teacher.name) {
            founder_entry = Some(teacher);
        } else {
            rest.push(teacher);
        }
    }

    rest.sort_by(|a, b| a.name.cmp(&b.name));
    founder_entry.into_iter().chain(rest).collect()
}

/// Students of one address in roster order, with their display names.
pub fn roster_order(location: &Location) -> Vec<(String, &StudentEntry)> {
    let mut rows: Vec<(String, String, &StudentEntry)> = location
        .students
        .iter()
        .map(|s| {
            let sort_key = NormalizedName::parse(&s.name).sort_form();
            (sort_key, normalize_name(&s.name), s)
        })
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    rows.into_iter().map(|(_, display, s)| (display, s)).collect()
}

/// `a` or `an` for the word that follows.
pub fn indefinite_article(word: &str) -> &'static str {
    match word.trim_start().chars().next() {
        Some(c) if "aeiou".contains(c.to_ascii_lowercase()) => "an",
        _ => "a",
    }
}

/// Bio sentence for a non-founder teacher (unescaped).
pub fn bio_sentence(teacher: &str, bio: &Bio) -> String {
    let nationality = bio.nationality.as_deref().unwrap_or(UNKNOWN_NATIONALITY);
    let hometown = bio.hometown.as_deref().unwrap_or(UNKNOWN_HOMETOWN);
    let student_of = bio.student_of.as_deref().unwrap_or(UNKNOWN_TEACHER);
    format!(
        "{teacher}, {} {nationality} martial artist, is from {hometown} and was trained under {student_of}.",
        indefinite_article(nationality)
    )
}

/// Paragraph for a teacher with no bio (unescaped).
pub fn unavailable_sentence(teacher: &str) -> String {
    format!("A biography for {teacher} is currently unavailable.")
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn write_preamble(out: &mut String, opts: &RenderOptions) {
    out.push_str("\\documentclass{book}\n");
    out.push_str("\\usepackage[utf8]{inputenc}\n");
    out.push_str("\\usepackage[T1]{fontenc}\n");
    out.push_str("\\usepackage{tabularx}\n");
    if opts.generate_index {
        out.push_str("\\usepackage{makeidx}\n");
        out.push_str("\\makeindex\n");
    }
    out.push_str("\\usepackage{hyperref}\n\n");

    out.push_str(&format!("\\title{{{}}}\n", escape(&opts.title)));
    let author = opts.author.as_deref().map(escape).unwrap_or_default();
    out.push_str(&format!("\\author{{{author}}}\n"));
    out.push_str("\\date{\\today}\n\n");
}

fn write_front_chapter(out: &mut String, heading: &str, text: Option<&str>, placeholder: &str) {
    let body = text
        .map(escape_paragraphs)
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| escape(placeholder));

    out.push_str(&format!("\\chapter*{{{heading}}}\n{body}\n\n"));
}

fn write_teacher_chapter(
    out: &mut String,
    teacher: &TeacherEntry,
    opts: &RenderOptions,
    stats: &mut RenderStats,
) {
    let name = escape(&teacher.name);
    out.push_str(&format!("\\chapter{{{name}}}\n"));
    stats.chapters += 1;

    let is_founder = opts.founder.as_deref() == Some(teacher.name.as_str());
    let narrative = if is_founder {
        let template = opts
            .founder_narrative
            .as_deref()
            .unwrap_or(DEFAULT_FOUNDER_NARRATIVE);
        escape_paragraphs(template).replace(&escape(NAME_PLACEHOLDER), &name)
    } else {
        match teacher.bio.as_ref() {
            Some(bio) => escape(&bio_sentence(&teacher.name, bio)),
            None => {
                stats.teachers_without_bio.push(teacher.name.clone());
                escape(&unavailable_sentence(&teacher.name))
            }
        }
    };
    out.push_str(&format!("{narrative}\n\n"));

    for location in &teacher.locations {
        write_roster(out, teacher, location, opts, stats);
    }
}

fn write_roster(
    out: &mut String,
    teacher: &TeacherEntry,
    location: &Location,
    opts: &RenderOptions,
    stats: &mut RenderStats,
) {
    out.push_str(&format!("\\section*{{{}}}\n", escape(&location.address)));
    stats.sections += 1;

    out.push_str("\\begin{tabularx}{\\textwidth}{|c|X|X|X|X|}\n");
    out.push_str("\\hline\n");
    out.push_str(
        "\\textbf{No.} & \\textbf{Student Name} & \\textbf{Date} & \\textbf{Ranking} & \\textbf{Number} \\\\\n",
    );
    out.push_str("\\hline\n");

    let teacher_index = escape_index(&teacher.name);
    for (idx, (display, student)) in roster_order(location).into_iter().enumerate() {
        let mut name_cell = escape(&display);
        if opts.generate_index {
            name_cell.push_str(&format!(
                "\\index{{{}}}\\index{{{teacher_index}}}",
                escape_index(&display)
            ));
            stats.index_entries += 2;
        }

        out.push_str(&format!(
            "{} & {name_cell} & {} & {} & {} \\\\\n\\hline\n",
            idx + 1,
            escape(&student.date),
            escape(&student.rank),
            escape(&student.number),
        ));
        stats.rows += 1;
    }

    out.push_str("\\end{tabularx}\n\n");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, rank: &str) -> StudentEntry {
        StudentEntry {
            name: name.into(),
            date: "2023-05-01".into(),
            rank: rank.into(),
            number: "1".into(),
        }
    }

    fn sample_tree() -> LineageTree {
        let mut tree = LineageTree::new();
        tree.insert("Master Smith, John", "123 Oak St", student("Chris Lee", "Yellow"));
        tree.insert("Master Smith, John", "123 Oak St", student("Jane Doe", "Black"));
        tree.insert("Grand Master Kim, Ho", "1 Dojo Way", student("Sam Roe", "Red"));
        tree.insert("Ms. Ahn, Mina", "7 Elm Rd", student("Al Bo", "White"));
        tree
    }

    #[test]
    fn founder_first_then_alphabetical() {
        let tree = sample_tree();
        let order: Vec<_> = chapter_order(&tree, Some("Master Smith, John"))
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            order,
            ["Master Smith, John", "Grand Master Kim, Ho", "Ms. Ahn, Mina"]
        );
    }

    #[test]
    fn absent_founder_is_ignored() {
        let tree = sample_tree();
        let order: Vec<_> = chapter_order(&tree, Some("Nobody"))
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            order,
            ["Grand Master Kim, Ho", "Master Smith, John", "Ms. Ahn, Mina"]
        );
    }

    #[test]
    fn roster_sorted_by_last_name() {
        let tree = sample_tree();
        let teacher = tree.get("Master Smith, John").unwrap();
        let rows: Vec<_> = roster_order(&teacher.locations[0])
            .into_iter()
            .map(|(display, _)| display)
            .collect();
        assert_eq!(rows, ["Doe, Jane", "Lee, Chris"]);
    }

    #[test]
    fn article_selection() {
        assert_eq!(indefinite_article("American"), "an");
        assert_eq!(indefinite_article("korean"), "a");
        assert_eq!(indefinite_article("Irish"), "an");
        assert_eq!(indefinite_article("Unknown"), "an");
        assert_eq!(indefinite_article(""), "a");
    }

    #[test]
    fn bio_sentence_uses_fields_and_defaults() {
        let bio = Bio {
            hometown: Some("Busan".into()),
            student_of: Some("Grand Master Park".into()),
            nationality: Some("Korean".into()),
        };
        assert_eq!(
            bio_sentence("Master Lee, Min", &bio),
            "Master Lee, Min, a Korean martial artist, is from Busan and was trained under Grand Master Park."
        );

        let partial = Bio {
            nationality: Some("American".into()),
            ..Default::default()
        };
        assert!(bio_sentence("X", &partial).starts_with("X, an American martial artist, is from an unknown hometown"));
    }

    #[test]
    fn document_structure_in_order() {
        let tree = sample_tree();
        let doc = render(&tree, &RenderOptions::default());
        let src = &doc.source;

        let positions: Vec<usize> = [
            "\\documentclass{book}",
            "\\begin{document}",
            "\\chapter*{License}",
            "\\chapter*{Introduction}",
            "\\tableofcontents",
            "\\chapter{Grand Master Kim, Ho}",
            "\\chapter{Master Smith, John}",
            "\\chapter{Ms. Ahn, Mina}",
            "\\printindex",
            "\\end{document}",
        ]
        .iter()
        .map(|needle| src.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "sections out of order");
        assert!(src.contains(LICENSE_PLACEHOLDER));
        assert!(src.contains(INTRODUCTION_PLACEHOLDER));
        assert_eq!(doc.stats.chapters, 3);
        assert_eq!(doc.stats.rows, 4);
        assert_eq!(doc.stats.index_entries, 8);
    }

    #[test]
    fn rows_carry_index_entries() {
        let tree = sample_tree();
        let doc = render(&tree, &RenderOptions::default());
        assert!(doc.source.contains(
            "1 & Doe, Jane\\index{Doe, Jane}\\index{Master Smith, John} & 2023-05-01 & Black & 1 \\\\"
        ));
        let doe = doc.source.find("Doe, Jane\\index").unwrap();
        let lee = doc.source.find("Lee, Chris\\index").unwrap();
        assert!(doe < lee);
    }

    #[test]
    fn index_can_be_disabled() {
        let tree = sample_tree();
        let opts = RenderOptions {
            generate_index: false,
            ..Default::default()
        };
        let doc = render(&tree, &opts);
        assert!(!doc.source.contains("\\index{"));
        assert!(!doc.source.contains("\\printindex"));
        assert!(!doc.source.contains("makeidx"));
        assert_eq!(doc.stats.index_entries, 0);
    }

    #[test]
    fn missing_bio_uses_unavailable_narrative() {
        let tree = sample_tree();
        let doc = render(&tree, &RenderOptions::default());
        assert!(doc
            .source
            .contains("A biography for Master Smith, John is currently unavailable."));
        assert_eq!(doc.stats.teachers_without_bio.len(), 3);
    }

    #[test]
    fn founder_gets_narrative_not_bio() {
        let mut tree = sample_tree();
        tree.get_mut("Grand Master Kim, Ho").unwrap().bio = Some(Bio {
            nationality: Some("Korean".into()),
            ..Default::default()
        });
        let opts = RenderOptions {
            founder: Some("Grand Master Kim, Ho".into()),
            founder_narrative: Some("{name} opened the first school in 1970 & taught 100% of us.".into()),
            ..Default::default()
        };
        let doc = render(&tree, &opts);
        assert!(doc.source.contains(
            "Grand Master Kim, Ho opened the first school in 1970 \\& taught 100\\% of us."
        ));
        assert!(!doc.source.contains("Korean martial artist"));
    }

    #[test]
    fn user_text_is_escaped_everywhere() {
        let mut tree = LineageTree::new();
        tree.insert(
            "Master O_Neil, Pat",
            "12 R&D Blvd #4",
            StudentEntry {
                name: "Jo 100%".into(),
                date: "2023-05-01".into(),
                rank: "Black_1".into(),
                number: r"7\8".into(),
            },
        );
        tree.get_mut("Master O_Neil, Pat").unwrap().bio = Some(Bio {
            hometown: Some("Smith & Sons ~ Town".into()),
            student_of: Some("GM {Lee}".into()),
            nationality: Some("Irish".into()),
        });
        let opts = RenderOptions {
            license: Some("CC BY-SA 4.0 & 50% off".into()),
            ..Default::default()
        };

        let src = render(&tree, &opts).source;
        assert!(src.contains("\\chapter{Master O\\_Neil, Pat}"));
        assert!(src.contains("\\section*{12 R\\&D Blvd \\#4}"));
        assert!(src.contains("100\\%, Jo"));
        assert!(src.contains("Black\\_1"));
        assert!(src.contains("7\\textbackslash{}8"));
        assert!(src.contains("Smith \\& Sons \\textasciitilde{} Town"));
        assert!(src.contains("GM \\{Lee\\}"));
        assert!(src.contains("CC BY-SA 4.0 \\& 50\\% off"));
        assert!(!src.contains("R&D"));
        assert!(!src.contains("O_Neil"));
    }

    #[test]
    fn empty_tree_still_renders_a_document() {
        let doc = render(&LineageTree::new(), &RenderOptions::default());
        assert!(doc.source.starts_with("\\documentclass{book}"));
        assert!(doc.source.trim_end().ends_with("\\end{document}"));
        assert_eq!(doc.stats.chapters, 0);
    }
}
