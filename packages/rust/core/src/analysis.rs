//! Question frequency analysis over a subject's tests.
//!
//! Every test is segmented into questions; questions are then grouped
//! greedily: the first ungrouped question opens a group and absorbs every
//! later ungrouped question whose similarity to it reaches the threshold.

use examarchive_segmenter::segment_questions;
use examarchive_shared::{ExamArchiveError, QuestionAnalysis, QuestionFrequency, Result, Test};
use tracing::{debug, instrument};

/// Similarity at or above which two questions count as the same.
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// One question together with where it came from.
struct Occurrence<'a> {
    text: String,
    normalized: Vec<char>,
    test_id: &'a str,
    exam_period: &'a str,
}

/// Group the questions of `tests` by similarity.
///
/// Groups are ordered by size, largest first; groups of equal size keep the
/// order in which their first question appeared.
#[instrument(skip(tests), fields(tests = tests.len()))]
pub fn analyze_tests(
    subject_code: &str,
    tests: &[Test],
    threshold: f64,
) -> Result<QuestionAnalysis> {
    validate_threshold(threshold)?;
    if tests.is_empty() {
        return Err(ExamArchiveError::NotFound(format!(
            "no tests found for subject code: {subject_code}"
        )));
    }

    let occurrences: Vec<Occurrence<'_>> = tests
        .iter()
        .flat_map(|test| {
            segment_questions(&test.full_text)
                .into_iter()
                .map(move |text| Occurrence {
                    normalized: normalize(&text),
                    text,
                    test_id: test.id_str(),
                    exam_period: test.exam_period.as_str(),
                })
        })
        .collect();

    let mut grouped = vec![false; occurrences.len()];
    let mut groups: Vec<QuestionFrequency> = Vec::new();

    for (i, first) in occurrences.iter().enumerate() {
        if grouped[i] {
            continue;
        }
        grouped[i] = true;

        let mut group = QuestionFrequency {
            question: first.text.clone(),
            count: 1,
            test_ids: vec![first.test_id.to_string()],
            exam_periods: vec![first.exam_period.to_string()],
        };

        for (j, other) in occurrences.iter().enumerate().skip(i + 1) {
            if grouped[j] {
                continue;
            }
            if ratio(&first.normalized, &other.normalized) >= threshold {
                grouped[j] = true;
                group.count += 1;
                group.test_ids.push(other.test_id.to_string());
                if !group.exam_periods.iter().any(|p| p == other.exam_period) {
                    group.exam_periods.push(other.exam_period.to_string());
                }
            }
        }
        groups.push(group);
    }

    // `sort_by` is stable, so ties keep first-appearance order.
    groups.sort_by(|a, b| b.count.cmp(&a.count));

    debug!(
        questions = occurrences.len(),
        groups = groups.len(),
        "questions grouped"
    );

    Ok(QuestionAnalysis {
        subject_code: subject_code.to_string(),
        total_tests: tests.len(),
        total_questions: occurrences.len(),
        unique_questions: groups.len(),
        questions: groups,
    })
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ExamArchiveError::validation(format!(
            "similarity threshold must be between 0 and 1, got {threshold}"
        )));
    }
    Ok(())
}

/// Ratcliff/Obershelp similarity of two strings, compared lower-cased and
/// trimmed: `2 * M / T` where `M` is the number of matched characters and
/// `T` the total length of both strings. Two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    ratio(&normalize(a), &normalize(b))
}

fn normalize(s: &str) -> Vec<char> {
    s.trim().to_lowercase().chars().collect()
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / total as f64
}

/// Sum of the lengths of the matching blocks: take the longest common
/// substring, then recurse on the pieces to its left and right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, len) = longest_match(a, b, alo, ahi, blo, bhi);
        if len == 0 {
            continue;
        }
        matched += len;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + len < ahi && j + len < bhi {
            pending.push((i + len, ahi, j + len, bhi));
        }
    }
    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start_in_a, start_in_b, len)`. Ties go to the earliest start in `a`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    let mut best = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            curr[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            let len = curr[col];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test(id: &str, period: &str, text: &str) -> Test {
        Test {
            id: Some(id.into()),
            subject_code: "OS".into(),
            exam_period: period.into(),
            academic_year: "2023/2024".into(),
            test_type: "regular".into(),
            full_text: text.into(),
            file_extension: None,
        }
    }

    #[test]
    fn ratio_matches_reference_values() {
        assert_eq!(similarity_ratio("abcd", "abcd"), 1.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        // difflib.SequenceMatcher(None, "abcd", "bcde").ratio() == 0.75
        assert!((similarity_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
        // Matching blocks "a" and "c": 2 * 2 / 6
        assert!((similarity_ratio("abc", "axc") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_ignores_case_and_outer_whitespace() {
        assert_eq!(similarity_ratio("  Explain Paging. ", "explain paging."), 1.0);
    }

    #[test]
    fn groups_near_duplicates_across_tests() {
        let tests = vec![
            test("t1", "Januarski 2024", "1. (5p) Explain virtual memory.\n2. (5p) What is a TLB?"),
            test("t2", "Junski 2024", "1. (5p) Explain virtual memory!\n2. (5p) Describe RAID 5."),
            test("t3", "Januarski 2024", "1. Explain virtual memory."),
        ];
        let analysis = analyze_tests("OS", &tests, DEFAULT_THRESHOLD).unwrap();

        assert_eq!(analysis.total_tests, 3);
        assert_eq!(analysis.total_questions, 5);
        assert_eq!(analysis.unique_questions, 3);

        let top = &analysis.questions[0];
        assert_eq!(top.question, "Explain virtual memory.");
        assert_eq!(top.count, 3);
        assert_eq!(top.test_ids, vec!["t1", "t2", "t3"]);
        assert_eq!(top.exam_periods, vec!["Januarski 2024", "Junski 2024"]);

        // Singletons keep first-appearance order.
        assert_eq!(analysis.questions[1].question, "What is a TLB?");
        assert_eq!(analysis.questions[2].question, "Describe RAID 5.");
    }

    #[test]
    fn threshold_one_needs_exact_match() {
        let tests = vec![
            test("t1", "Jan", "1. Explain paging."),
            test("t2", "Jun", "1. explain paging."),
            test("t3", "Sep", "1. Explain paging!"),
        ];
        let analysis = analyze_tests("OS", &tests, 1.0).unwrap();
        assert_eq!(analysis.unique_questions, 2);
        assert_eq!(analysis.questions[0].count, 2);
    }

    #[test]
    fn threshold_zero_groups_everything() {
        let tests = vec![test("t1", "Jan", "1. abc\n2. xyz\n3. qqq")];
        let analysis = analyze_tests("OS", &tests, 0.0).unwrap();
        assert_eq!(analysis.unique_questions, 1);
        assert_eq!(analysis.questions[0].count, 3);
    }

    #[test]
    fn empty_input_is_not_found() {
        let err = analyze_tests("OS", &[], DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, ExamArchiveError::NotFound(ref m) if m.contains("OS")));
    }

    #[test]
    fn tests_without_questions_still_count() {
        let tests = vec![test("t1", "Jan", "no numbering here")];
        let analysis = analyze_tests("OS", &tests, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(analysis.total_tests, 1);
        assert_eq!(analysis.total_questions, 0);
        assert!(analysis.questions.is_empty());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let tests = vec![test("t1", "Jan", "1. a")];
        assert!(analyze_tests("OS", &tests, 1.01).is_err());
        assert!(analyze_tests("OS", &tests, -0.1).is_err());
        assert!(analyze_tests("OS", &tests, f64::NAN).is_err());
    }
}
