//! Faculty → module → subject → tests drill-down.
//!
//! [`BrowseSession`] is pure state: selections, per-step filter text, and the
//! lists loaded so far. Operations that need fresh data return a [`Load`]
//! describing the request; the caller performs it with the API client and
//! hands the result back through `set_subjects` / `set_tests`.

use std::collections::HashSet;
use std::fmt;

use examarchive_client::SubjectFilter;
use examarchive_shared::{ExamArchiveError, Faculty, Module, Result, Subject, Test, TestQuery};

use crate::filter::{Searchable, filter_items};

/// Study years a subject can belong to.
pub const YEARS: std::ops::RangeInclusive<u8> = 1..=4;

/// Screens of the drill-down, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Faculty,
    Module,
    Subject,
    Tests,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Faculty, Step::Module, Step::Subject, Step::Tests];

    pub fn title(self) -> &'static str {
        match self {
            Self::Faculty => "Faculty",
            Self::Module => "Module",
            Self::Subject => "Subject",
            Self::Tests => "Tests",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// The step before this one, if any.
    pub fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Data the session needs after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Load {
    Nothing,
    Subjects(SubjectFilter),
    Tests(TestQuery),
}

/// State of one browse flow.
#[derive(Debug, Clone)]
pub struct BrowseSession {
    step: Step,
    year: u8,
    faculties: Vec<Faculty>,
    faculty: Option<Faculty>,
    module: Option<Module>,
    subjects: Vec<Subject>,
    subject: Option<Subject>,
    all_tests: Vec<Test>,
    tests: Vec<Test>,
    filters: [String; 4],
    expanded: HashSet<String>,
}

impl Default for BrowseSession {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BrowseSession {
    /// Start at the faculty step. Out-of-range years fall back to 1.
    pub fn new(default_year: u8) -> Self {
        Self {
            step: Step::Faculty,
            year: if YEARS.contains(&default_year) {
                default_year
            } else {
                1
            },
            faculties: Vec::new(),
            faculty: None,
            module: None,
            subjects: Vec::new(),
            subject: None,
            all_tests: Vec::new(),
            tests: Vec::new(),
            filters: Default::default(),
            expanded: HashSet::new(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn year(&self) -> u8 {
        self.year
    }

    pub fn faculty(&self) -> Option<&Faculty> {
        self.faculty.as_ref()
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// Tests after the text search, in server order.
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn all_tests(&self) -> &[Test] {
        &self.all_tests
    }

    // -----------------------------------------------------------------------
    // Loaded data
    // -----------------------------------------------------------------------

    pub fn set_faculties(&mut self, faculties: Vec<Faculty>) {
        self.faculties = faculties;
    }

    pub fn set_subjects(&mut self, subjects: Vec<Subject>) {
        self.subjects = subjects;
    }

    /// Replace the loaded tests and re-apply the current text search.
    pub fn set_tests(&mut self, tests: Vec<Test>) {
        self.all_tests = tests;
        self.refilter_tests();
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Pick a faculty; clears module and subject and moves to the module step.
    pub fn select_faculty(&mut self, faculty: Faculty) {
        self.faculty = Some(faculty);
        self.module = None;
        self.clear_subject_level();
        self.filters[Step::Module.index()].clear();
        self.step = Step::Module;
    }

    /// Pick a module of the selected faculty and request its subjects for
    /// the current year.
    pub fn select_module(&mut self, module: Module) -> Result<Load> {
        if self.faculty.is_none() {
            return Err(ExamArchiveError::validation("select a faculty first"));
        }
        self.module = Some(module);
        self.clear_subject_level();
        self.step = Step::Subject;
        Ok(self.subjects_load())
    }

    /// Change the study year. Subjects are re-requested when a module is
    /// selected.
    pub fn set_year(&mut self, year: u8) -> Result<Load> {
        if !YEARS.contains(&year) {
            return Err(ExamArchiveError::validation(format!(
                "year must be between {} and {}, got {year}",
                YEARS.start(),
                YEARS.end()
            )));
        }
        self.year = year;
        Ok(self.subjects_load())
    }

    /// Pick a subject and request its tests.
    pub fn select_subject(&mut self, subject: Subject) -> Result<Load> {
        if self.module.is_none() {
            return Err(ExamArchiveError::validation("select a module first"));
        }
        let query = TestQuery::for_subject(subject.code.clone());
        self.subject = Some(subject);
        self.all_tests.clear();
        self.tests.clear();
        self.expanded.clear();
        self.filters[Step::Tests.index()].clear();
        self.step = Step::Tests;
        Ok(Load::Tests(query))
    }

    /// Jump to `step` (breadcrumb navigation). Only allowed when the
    /// selection that step depends on exists.
    pub fn go_to(&mut self, step: Step) -> Result<()> {
        let allowed = match step {
            Step::Faculty => true,
            Step::Module => self.faculty.is_some(),
            Step::Subject => self.module.is_some(),
            Step::Tests => self.subject.is_some(),
        };
        if !allowed {
            let needed = step.previous().map_or("", Step::title);
            return Err(ExamArchiveError::validation(format!(
                "cannot open {step} before choosing a {}",
                needed.to_lowercase()
            )));
        }
        self.step = step;
        Ok(())
    }

    /// Go back one step, if there is one.
    pub fn back(&mut self) {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
    }

    /// Back to the first step with all selections, filters and loaded
    /// lists cleared (the faculty list is kept).
    pub fn reset(&mut self) {
        self.step = Step::Faculty;
        self.faculty = None;
        self.module = None;
        self.clear_subject_level();
        for filter in &mut self.filters {
            filter.clear();
        }
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    pub fn filter(&self, step: Step) -> &str {
        &self.filters[step.index()]
    }

    /// Set the filter text of one step. For the tests step this is the
    /// full-text search.
    pub fn set_filter(&mut self, step: Step, text: impl Into<String>) {
        if step == Step::Tests {
            self.apply_text_search(text);
        } else {
            self.filters[step.index()] = text.into();
        }
    }

    /// Case-insensitive substring filter over the loaded tests' text. An
    /// empty query restores the full list.
    pub fn apply_text_search(&mut self, query: impl Into<String>) {
        self.filters[Step::Tests.index()] = query.into();
        self.refilter_tests();
    }

    pub fn visible_faculties(&self) -> Vec<&Faculty> {
        filter_items(&self.faculties, self.filter(Step::Faculty))
    }

    pub fn visible_modules(&self) -> Vec<&Module> {
        match &self.faculty {
            Some(faculty) => filter_items(&faculty.modules, self.filter(Step::Module)),
            None => Vec::new(),
        }
    }

    pub fn visible_subjects(&self) -> Vec<&Subject> {
        filter_items(&self.subjects, self.filter(Step::Subject))
    }

    // -----------------------------------------------------------------------
    // Preview expansion
    // -----------------------------------------------------------------------

    /// Flip full-text expansion of one test. Returns the new state. Tests
    /// without an id cannot be told apart and never expand.
    pub fn toggle_expanded(&mut self, test_id: &str) -> bool {
        if test_id.is_empty() {
            return false;
        }
        if self.expanded.remove(test_id) {
            false
        } else {
            self.expanded.insert(test_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, test_id: &str) -> bool {
        self.expanded.contains(test_id)
    }

    /// Human-readable trail of the current selections.
    pub fn breadcrumb(&self) -> Vec<String> {
        let mut trail = vec!["Faculties".to_string()];
        if let Some(faculty) = &self.faculty {
            trail.push(faculty.code.clone());
        }
        if let Some(module) = &self.module {
            trail.push(format!("{} (year {})", module.code, self.year));
        }
        if let Some(subject) = &self.subject {
            trail.push(subject.name.clone());
        }
        trail
    }

    fn subjects_load(&self) -> Load {
        match &self.module {
            Some(module) => Load::Subjects(SubjectFilter::module_year(&module.code, self.year)),
            None => Load::Nothing,
        }
    }

    fn clear_subject_level(&mut self) {
        self.subjects.clear();
        self.subject = None;
        self.all_tests.clear();
        self.tests.clear();
        self.expanded.clear();
        self.filters[Step::Subject.index()].clear();
        self.filters[Step::Tests.index()].clear();
    }

    fn refilter_tests(&mut self) {
        let query = self.filters[Step::Tests.index()].trim().to_lowercase();
        self.tests = if query.is_empty() {
            self.all_tests.clone()
        } else {
            self.all_tests
                .iter()
                .filter(|t| t.matches_lowered(&query))
                .cloned()
                .collect()
        };
    }
}
