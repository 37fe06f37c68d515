//! Escaping for user-supplied text placed into LaTeX source.

/// Escape every LaTeX-significant character in `text`.
///
/// Single pass, so the backslashes introduced here are never re-escaped.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside `\index{...}`.
///
/// LaTeX escaping first, then makeindex's own specials (`! @ | "`) are
/// quoted with `"`.
pub fn escape_index(text: &str) -> String {
    let latex = escape(text);
    let mut out = String::with_capacity(latex.len());
    for c in latex.chars() {
        if matches!(c, '!' | '@' | '|' | '"') {
            out.push('"');
        }
        out.push(c);
    }
    out
}

/// Escape a block of prose, keeping blank-line paragraph breaks.
pub fn escape_paragraphs(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(escape(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(escape(&current.join(" ")));
    }

    paragraphs.join("\n\n")
}
