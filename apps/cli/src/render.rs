//! Plain-text and JSON output for command results.

use color_eyre::eyre::Result;
use examarchive_core::filter::preview;
use examarchive_segmenter::{Segmentation, segment};
use examarchive_shared::{Faculty, QuestionAnalysis, Subject, Test, User};
use examarchive_storage::{CachedTest, SearchHit};
use serde::Serialize;

pub(crate) fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn faculties(faculties: &[Faculty]) {
    if faculties.is_empty() {
        println!("No faculties found.");
        return;
    }
    for f in faculties {
        println!(
            "{:<26} {:<8} {} ({} modules)",
            f.id.as_deref().unwrap_or("-"),
            f.code,
            f.name,
            f.modules.len()
        );
    }
}

pub(crate) fn faculty(f: &Faculty) {
    println!("{} ({})", f.name, f.code);
    println!("  id:      {}", f.id.as_deref().unwrap_or("-"));
    if !f.description.is_empty() {
        println!("  about:   {}", f.description);
    }
    if let Some(a) = &f.address {
        println!(
            "  address: {} {}, {} {}",
            a.street_name, a.street_number, a.postal_code, a.city
        );
    }
    if f.modules.is_empty() {
        println!("  modules: none");
    } else {
        println!("  modules:");
        for m in &f.modules {
            println!("    {:<8} {}", m.code, m.name);
        }
    }
}

pub(crate) fn subjects(subjects: &[Subject]) {
    if subjects.is_empty() {
        println!("No subjects found.");
        return;
    }
    for s in subjects {
        println!(
            "{:<10} {:<40} year {} sem {} {:>2} ESPB {}",
            s.code,
            s.name,
            s.year,
            s.semester,
            s.espb,
            if s.mandatory { "mandatory" } else { "elective" }
        );
    }
}

pub(crate) fn subject(s: &Subject) {
    println!("{} ({})", s.name, s.code);
    println!("  id:       {}", s.id.as_deref().unwrap_or("-"));
    println!("  faculty:  {}", s.faculty_code);
    println!("  module:   {}", s.module_code);
    println!("  year:     {} (semester {})", s.year, s.semester);
    println!("  ESPB:     {}", s.espb);
    println!("  type:     {}", if s.mandatory { "mandatory" } else { "elective" });
    if !s.description.is_empty() {
        println!("  about:    {}", s.description);
    }
}

/// How much of each test to print.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TestDetail {
    /// Metadata only.
    Summary,
    /// Segmented questions, or the (possibly truncated) text when none
    /// were found.
    Questions { preview_chars: usize },
    /// The whole transcribed text.
    FullText,
}

pub(crate) fn tests(tests: &[Test], detail: TestDetail) {
    if tests.is_empty() {
        println!("No tests found.");
        return;
    }
    for (i, t) in tests.iter().enumerate() {
        if i > 0 && !matches!(detail, TestDetail::Summary) {
            println!();
        }
        test(t, detail);
    }
}

pub(crate) fn test(t: &Test, detail: TestDetail) {
    println!(
        "{:<26} {:<8} {} {} [{}]{}",
        t.id.as_deref().unwrap_or("-"),
        t.subject_code,
        t.exam_period,
        t.academic_year,
        t.test_type,
        t.file_extension
            .as_deref()
            .map(|e| format!(" .{e}"))
            .unwrap_or_default()
    );
    match detail {
        TestDetail::Summary => {}
        TestDetail::FullText => {
            for line in t.full_text.lines() {
                println!("    {line}");
            }
        }
        TestDetail::Questions { preview_chars } => {
            let seg = segment(&t.full_text);
            if seg.is_empty() {
                let p = preview(t.full_text.trim(), preview_chars);
                println!("    (no numbered questions) {}", p.text.replace('\n', " "));
            } else {
                questions(&seg, "    ");
            }
        }
    }
}

pub(crate) fn questions(seg: &Segmentation, indent: &str) {
    for (i, q) in seg.questions.iter().enumerate() {
        let number = q.number.map_or_else(|| (i + 1).to_string(), |n| n.to_string());
        match &q.annotation {
            Some(note) => println!("{indent}{number}. ({note}) {}", q.text),
            None => println!("{indent}{number}. {}", q.text),
        }
    }
}

pub(crate) fn cached_tests(tests: &[CachedTest]) {
    if tests.is_empty() {
        println!("The cache is empty.");
        return;
    }
    for c in tests {
        println!(
            "{:<26} {:<8} {} {} [{}] {} questions, cached {}",
            c.test.id_str(),
            c.test.subject_code,
            c.test.exam_period,
            c.test.academic_year,
            c.test.test_type,
            c.question_count,
            c.cached_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub(crate) fn search_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No matches.");
        return;
    }
    for h in hits {
        println!(
            "{:<26} {:<8} {} {}",
            h.test_id, h.subject_code, h.exam_period, h.academic_year
        );
        println!("    {}", h.snippet.replace('\n', " "));
    }
}

pub(crate) fn analysis(a: &QuestionAnalysis, top: Option<usize>) {
    println!(
        "{}: {} tests, {} questions, {} distinct",
        a.subject_code, a.total_tests, a.total_questions, a.unique_questions
    );
    let shown = top.unwrap_or(a.questions.len()).min(a.questions.len());
    for q in &a.questions[..shown] {
        println!();
        println!("  {}x  {}", q.count, q.question);
        println!("      periods: {}", q.exam_periods.join(", "));
    }
    if shown < a.questions.len() {
        println!();
        println!("  ... {} more", a.questions.len() - shown);
    }
}

pub(crate) fn users(users: &[User]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    for u in users {
        println!(
            "{:<26} {:<32} {:<5} {:<8} {}",
            u.id,
            u.email,
            if u.is_admin { "admin" } else { "" },
            if u.is_active { "active" } else { "disabled" },
            u.created_at.format("%Y-%m-%d")
        );
    }
}

pub(crate) fn user(u: &User) {
    println!("{}", u.email);
    println!("  id:      {}", u.id);
    println!("  admin:   {}", if u.is_admin { "yes" } else { "no" });
    println!("  active:  {}", if u.is_active { "yes" } else { "no" });
    println!("  created: {}", u.created_at.to_rfc3339());
}
