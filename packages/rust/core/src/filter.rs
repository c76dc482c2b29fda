//! Client-side list filtering and text previews.
//!
//! All matching is a case-insensitive substring test; an empty (or
//! whitespace-only) query matches everything.

use examarchive_shared::{Faculty, Module, Subject, Test, User};

/// Something a filter box can narrow down.
pub trait Searchable {
    /// Does this item match an already lower-cased, trimmed query?
    fn matches_lowered(&self, query: &str) -> bool;

    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.matches_lowered(&query)
    }
}

fn contains_lowered(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

impl Searchable for Faculty {
    fn matches_lowered(&self, query: &str) -> bool {
        contains_lowered(&self.name, query) || contains_lowered(&self.code, query)
    }
}

impl Searchable for Module {
    fn matches_lowered(&self, query: &str) -> bool {
        contains_lowered(&self.name, query) || contains_lowered(&self.code, query)
    }
}

impl Searchable for Subject {
    fn matches_lowered(&self, query: &str) -> bool {
        contains_lowered(&self.name, query) || contains_lowered(&self.code, query)
    }
}

impl Searchable for User {
    fn matches_lowered(&self, query: &str) -> bool {
        contains_lowered(&self.email, query)
    }
}

impl Searchable for Test {
    fn matches_lowered(&self, query: &str) -> bool {
        contains_lowered(&self.full_text, query)
    }
}

/// Items matching `query`, in their original order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.matches_lowered(&query))
        .collect()
}

/// Owned variant of [`filter_items`].
pub fn filter_cloned<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
    filter_items(items, query).into_iter().cloned().collect()
}

/// A possibly shortened piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    pub truncated: bool,
}

/// Cut `text` to `max_chars` characters, appending `...` when anything was
/// dropped. Counts characters, not bytes.
pub fn preview(text: &str, max_chars: usize) -> Preview {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Preview {
            text: format!("{}...", &text[..cut]),
            truncated: true,
        },
        None => Preview {
            text: text.to_string(),
            truncated: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faculty(name: &str, code: &str) -> Faculty {
        Faculty {
            id: None,
            name: name.into(),
            code: code.into(),
            description: String::new(),
            address: None,
            modules: Vec::new(),
        }
    }

    #[test]
    fn faculties_match_name_or_code() {
        let faculties = vec![
            faculty("Fakultet tehnickih nauka", "FTN"),
            faculty("Prirodno-matematicki fakultet", "PMF"),
            faculty("Ekonomski fakultet", "EF"),
        ];
        let by_code = filter_items(&faculties, "ftn");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].code, "FTN");

        let by_name = filter_items(&faculties, "  MATEMAT ");
        assert_eq!(by_name[0].code, "PMF");

        assert_eq!(filter_items(&faculties, "fakultet").len(), 3);
        assert_eq!(filter_items(&faculties, "").len(), 3);
        assert!(filter_items(&faculties, "medicine").is_empty());
    }

    #[test]
    fn tests_match_full_text() {
        let test = Test {
            id: Some("t1".into()),
            subject_code: "OS".into(),
            exam_period: "Jan".into(),
            academic_year: "2023/2024".into(),
            test_type: "regular".into(),
            full_text: "1. (5p) Explain Virtual Memory".into(),
            file_extension: None,
        };
        assert!(test.matches("virtual memory"));
        assert!(!test.matches("OS"));
        assert_eq!(filter_cloned(&[test], "VIRTUAL").len(), 1);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let short = preview("kratko", 300);
        assert!(!short.truncated);
        assert_eq!(short.text, "kratko");

        let exact = "a".repeat(300);
        assert!(!preview(&exact, 300).truncated);

        let long = "ž".repeat(301);
        let cut = preview(&long, 300);
        assert!(cut.truncated);
        assert_eq!(cut.text.chars().count(), 303);
        assert!(cut.text.ends_with("..."));
    }
}
