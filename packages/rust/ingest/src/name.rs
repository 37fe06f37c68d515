//! Name canonicalization: `Title First Middle Last` → `Title Last, First Middle`.
//!
//! Teacher and student names arrive in free form, sometimes already in
//! `Last, First` order and sometimes with an honorific. The canonical form
//! is what the lineage tree is keyed on, what bios are matched against, and
//! what roster rows sort by.

use std::fmt;

/// Recognized honorifics, in match priority order.
///
/// Two-word titles come first so `Grand Master` is never read as a first
/// name followed by `Master`.
const TITLES: [Title; 5] = [
    Title::GrandMaster,
    Title::Master,
    Title::Mr,
    Title::Ms,
    Title::Mrs,
];

/// An honorific that may prefix a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Title {
    GrandMaster,
    Master,
    Mr,
    Ms,
    Mrs,
}

impl Title {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrandMaster => "Grand Master",
            Self::Master => "Master",
            Self::Mr => "Mr.",
            Self::Ms => "Ms.",
            Self::Mrs => "Mrs.",
        }
    }

    /// Number of whitespace-separated tokens the title spans.
    fn token_len(&self) -> usize {
        match self {
            Self::GrandMaster => 2,
            _ => 1,
        }
    }

    /// Match a title at the start of `tokens`.
    fn leading(tokens: &[&str]) -> Option<Title> {
        TITLES.into_iter().find(|title| {
            let n = title.token_len();
            tokens.len() >= n && tokens[..n].join(" ") == title.as_str()
        })
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name split into its structural parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub title: Option<Title>,
    pub last_name: String,
    pub first_middle: String,
}

impl NormalizedName {
    /// Split a raw name into title, surname and given names.
    ///
    /// Follows the same rules as [`normalize_name`]; a name already in
    /// `Last, First` form is split at its first comma.
    pub fn parse(raw: &str) -> Self {
        let cleaned = clean(raw);
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();

        if tokens.len() < 2 {
            return Self {
                title: None,
                last_name: cleaned.to_string(),
                first_middle: String::new(),
            };
        }

        let (title, rest) = split_title(&tokens);

        if rest.iter().any(|t| t.contains(',')) {
            let joined = rest.join(" ");
            let (last, first) = joined.split_once(',').unwrap_or((joined.as_str(), ""));
            return Self {
                title,
                last_name: last.trim().to_string(),
                first_middle: first.trim().to_string(),
            };
        }

        match rest.split_last() {
            Some((last, first)) => Self {
                title,
                last_name: (*last).to_string(),
                first_middle: first.join(" "),
            },
            None => Self {
                title,
                last_name: String::new(),
                first_middle: String::new(),
            },
        }
    }

    /// `Last, First Middle` without the title.
    pub fn sort_form(&self) -> String {
        if self.first_middle.is_empty() {
            self.last_name.clone()
        } else {
            format!("{}, {}", self.last_name, self.first_middle)
        }
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.sort_form();
        match (self.title, body.is_empty()) {
            (Some(title), true) => write!(f, "{title}"),
            (Some(title), false) if self.first_middle.is_empty() => write!(f, "{title} {body},"),
            (Some(title), false) => write!(f, "{title} {body}"),
            (None, _) => f.write_str(&body),
        }
    }
}

/// Canonicalize a raw name string.
///
/// - Surrounding whitespace and one trailing comma are stripped.
/// - Fewer than two tokens: the cleaned input is returned as-is.
/// - A leading title is separated; if the remainder already contains a
///   comma it is kept verbatim (`title rest`), so the function is idempotent.
/// - Otherwise the final token is the surname: `title Last, First Middle`.
///   A title followed by a surname alone keeps the separator, so
///   `Master Smith` becomes `Master Smith,`. Feeding that back in strips
///   the trailing comma first and yields the same string.
/// - A title with nothing after it yields the title alone.
pub fn normalize_name(raw: &str) -> String {
    let cleaned = clean(raw);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if tokens.len() < 2 {
        return cleaned.to_string();
    }

    let (title, rest) = split_title(&tokens);

    if rest.iter().any(|t| t.contains(',')) {
        return join_title(title, &rest.join(" "));
    }

    NormalizedName::parse(cleaned).to_string()
}

/// Strip whitespace, then a single trailing comma, then whitespace again.
fn clean(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_suffix(',').unwrap_or(trimmed).trim_end()
}

fn split_title<'a, 'b>(tokens: &'b [&'a str]) -> (Option<Title>, &'b [&'a str]) {
    match Title::leading(tokens) {
        Some(title) => (Some(title), &tokens[title.token_len()..]),
        None => (None, tokens),
    }
}

fn join_title(title: Option<Title>, rest: &str) -> String {
    match title {
        Some(title) if rest.is_empty() => title.to_string(),
        Some(title) => format!("{title} {rest}"),
        None => rest.to_string(),
    }
}
