//! Per-chunk cleanup: marker stripping and whitespace collapsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::{NumberingStyle, Question};

/// Leading `N.` marker with its number captured.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s&&[^\n]]*([0-9]+)\.").expect("number regex"));

/// Parenthesized group directly after the marker, e.g. `(2p)` or `(10 bodova)`.
/// Only groups that pass [`is_points`] are lifted into the annotation.
static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([^()\n]*)\)").expect("annotation regex"));

/// Turn one raw chunk into a [`Question`]. Returns `None` when nothing but the
/// marker (and annotation) is left.
pub(crate) fn clean_chunk(chunk: &str, style: NumberingStyle) -> Option<Question> {
    let (number, rest) = match NUMBER_RE.captures(chunk) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let number = caps[1].parse::<u32>().unwrap_or(u32::MAX);
            (Some(number), &chunk[whole..])
        }
        None => (None, chunk),
    };
    let mut rest = rest.trim_start();

    let mut annotation = None;
    if style == NumberingStyle::Parenthesized {
        if let Some(caps) = ANNOTATION_RE.captures(rest) {
            let end = caps.get(0).map_or(0, |m| m.end());
            let inner = caps[1].trim();
            if is_points(inner, &rest[end..]) {
                annotation = Some(inner.to_string());
                rest = &rest[end..];
            }
        }
    }

    let text = collapse_lines(rest);
    if text.is_empty() {
        return None;
    }

    Some(Question {
        number,
        text,
        annotation,
    })
}

/// A points annotation carries a number (`2p`, `10 bodova`, `1.5`) and is
/// followed by whitespace or nothing. `(x+y)^2` stays part of the question.
fn is_points(inner: &str, after: &str) -> bool {
    inner.chars().any(|c| c.is_ascii_digit())
        && after.chars().next().is_none_or(char::is_whitespace)
}

/// Trim every line, drop blank ones, and join the rest with single spaces.
pub(crate) fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
