//! Term splitting and text normalization
//!
//! Multi-term MeSH fields hold pipe-separated terms. Unlike most pipe lists in
//! the pipeline, empty terms are kept here: each position in the source field
//! must map to exactly one position in the identifier column.

use smallvec::SmallVec;

/// Sub-delimiter inside multi-term fields and inside identifier cells.
pub const TERM_SEPARATOR: char = '|';

/// Split a multi-term field on `|`, keeping empty terms.
///
/// Use SmallVec for stack allocation (most trial rows list < 8 terms).
pub fn split_terms(field: &str) -> SmallVec<[&str; 8]> {
    field.split(TERM_SEPARATOR).collect()
}

/// Join per-term identifiers back into one cell.
pub fn join_terms<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(TERM_SEPARATOR);
        }
        out.push_str(part.as_ref());
    }
    out
}

/// Lowercase, map punctuation to spaces and collapse whitespace.
///
/// Used to compare free text against lexicon labels.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Whitespace tokens of already-normalized text.
pub fn tokens(normalized: &str) -> SmallVec<[&str; 8]> {
    normalized.split_whitespace().collect()
}

/// Short all-caps label such as "MI" or "COPD".
pub fn looks_like_acronym(label: &str) -> bool {
    let trimmed = label.trim();
    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    letters > 0
        && trimmed.chars().count() <= 5
        && trimmed
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}
