//! Numbering detection and chunk splitting.
//!
//! The `regex` crate has no look-ahead, so instead of splitting on
//! "newline followed by a marker" we collect the offsets of every marker line
//! and slice between them.

use std::sync::LazyLock;

use regex::Regex;

use crate::NumberingStyle;

// Whitespace around a marker is any Unicode whitespace except `\n`, so a
// marker never reaches into the previous line.

/// First question of a parenthesis-style document: `1.` then optional
/// whitespace then `(`.
static PAREN_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s&&[^\n]]*1\.\s*\(").expect("paren first regex"));

/// First question of a plain-style document: `1.` then at least one
/// whitespace character (a line ending counts).
static PLAIN_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[\s&&[^\n]]*1\.(?:[\s&&[^\n]]|$)").expect("plain first regex")
});

/// Any parenthesis-style question marker.
static PAREN_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[\s&&[^\n]]*[0-9]+\.\s*\(").expect("paren marker regex")
});

/// Any plain-style question marker.
static PLAIN_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[\s&&[^\n]]*[0-9]+\.(?:[\s&&[^\n]]|$)").expect("plain marker regex")
});

/// Find the numbering style and the byte offset of the first question.
///
/// Parenthesis style wins whenever a `1. (` line exists anywhere in the
/// text, even if a plain `1.` line comes earlier.
pub(crate) fn find_first_question(raw: &str) -> Option<(NumberingStyle, usize)> {
    if let Some(m) = PAREN_FIRST_RE.find(raw) {
        return Some((NumberingStyle::Parenthesized, m.start()));
    }
    PLAIN_FIRST_RE
        .find(raw)
        .map(|m| (NumberingStyle::Plain, m.start()))
}

/// Split `body` (which starts at the first question) into raw chunks, one per
/// marker line. Whitespace-only chunks are dropped.
pub(crate) fn split_chunks(body: &str, style: NumberingStyle) -> Vec<&str> {
    let marker = match style {
        NumberingStyle::Parenthesized => &*PAREN_MARKER_RE,
        NumberingStyle::Plain => &*PLAIN_MARKER_RE,
    };

    let mut starts: Vec<usize> = marker.find_iter(body).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut chunks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        let chunk = &body[start..end];
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paren_style_detected_after_header() {
        let raw = "Kolokvijum 1\nIme i prezime:\n1. (5p) Define a graph.";
        let (style, offset) = find_first_question(raw).expect("match");
        assert_eq!(style, NumberingStyle::Parenthesized);
        assert!(raw[offset..].starts_with("1. (5p)"));
    }

    #[test]
    fn paren_style_preferred_over_earlier_plain_line() {
        let raw = "1. Instructions apply.\nText\n  1. (2p) Real question";
        let (style, offset) = find_first_question(raw).expect("match");
        assert_eq!(style, NumberingStyle::Parenthesized);
        assert!(raw[offset..].trim_start().starts_with("1. (2p)"));
    }

    #[test]
    fn plain_style_needs_whitespace_after_dot() {
        assert!(find_first_question("Version 1.5 of the notes").is_none());
        assert!(find_first_question("1.Question glued to the number").is_none());

        let (style, _) = find_first_question("Intro\n1.\nQuestion on next line").expect("match");
        assert_eq!(style, NumberingStyle::Plain);
    }

    #[test]
    fn eleven_is_not_one() {
        assert!(find_first_question("11. (3p) Late question").is_none());
    }

    #[test]
    fn split_keeps_marker_lines_at_chunk_start() {
        let body = "1. (2p) A\nmore\n2. (3p) B\n\n3. (1p) C";
        let chunks = split_chunks(body, NumberingStyle::Parenthesized);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("1. (2p) A"));
        assert!(chunks[1].starts_with("2. (3p) B"));
        assert!(chunks[2].starts_with("3. (1p) C"));
    }

    #[test]
    fn plain_split_handles_indented_and_bare_markers() {
        let body = "1.\n   2. Second\n3.   Third";
        let chunks = split_chunks(body, NumberingStyle::Plain);
        assert_eq!(chunks, vec!["1.\n", "   2. Second\n", "3.   Third"]);
    }

    #[test]
    fn paren_split_ignores_plain_numbered_lines() {
        let body = "1. (4p) Sort the list:\n2. 5 3 1\n2. (1p) Next";
        let chunks = split_chunks(body, NumberingStyle::Parenthesized);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("2. 5 3 1"));
    }
}
