//! One screen per browse step.
//!
//! Screens own only their cursor; selections and loaded data live in the
//! shared [`BrowseSession`]. A key press can ask the app to fetch data by
//! returning [`Outcome::Fetch`].

mod faculties;
mod modules;
mod subjects;
mod tests;

use crossterm::event::KeyCode;
use examarchive_core::browse::{BrowseSession, Load, Step};
use ratatui::prelude::*;

/// Data the app has to fetch for a screen.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    Faculties,
    Load(Load),
}

/// Result of a key press on a screen.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Ignored,
    Handled,
    Fetch(Request),
    Error(String),
}

impl From<examarchive_shared::Result<Load>> for Outcome {
    fn from(result: examarchive_shared::Result<Load>) -> Self {
        match result {
            Ok(Load::Nothing) => Self::Handled,
            Ok(load) => Self::Fetch(Request::Load(load)),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Selected row of a list.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Cursor {
    selected: usize,
}

impl Cursor {
    pub(crate) fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub(crate) fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Selected index, clamped to a list of `len` rows.
    pub(crate) fn get(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.selected.min(len - 1))
    }

    pub(crate) fn reset(&mut self) {
        self.selected = 0;
    }

    /// Shared Up/Down/j/k handling. Returns whether the key moved the cursor.
    pub(crate) fn navigate(&mut self, code: KeyCode, len: usize) -> bool {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.up(),
            KeyCode::Down | KeyCode::Char('j') => self.down(len),
            KeyCode::Home | KeyCode::Char('g') => self.reset(),
            KeyCode::End | KeyCode::Char('G') => self.selected = len.saturating_sub(1),
            _ => return false,
        }
        true
    }
}

pub(crate) struct Screens {
    faculties: faculties::FacultiesScreen,
    modules: modules::ModulesScreen,
    subjects: subjects::SubjectsScreen,
    tests: tests::TestsScreen,
}

impl Screens {
    pub(crate) fn new(preview_chars: usize) -> Self {
        Self {
            faculties: faculties::FacultiesScreen::new(),
            modules: modules::ModulesScreen::new(),
            subjects: subjects::SubjectsScreen::new(),
            tests: tests::TestsScreen::new(preview_chars),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &BrowseSession) {
        match session.step() {
            Step::Faculty => self.faculties.draw(f, area, session),
            Step::Module => self.modules.draw(f, area, session),
            Step::Subject => self.subjects.draw(f, area, session),
            Step::Tests => self.tests.draw(f, area, session),
        }
    }

    /// Route a key to the current step's screen. When the key advances the
    /// session, the new screen starts at its first row.
    pub(crate) fn handle_key(&mut self, code: KeyCode, session: &mut BrowseSession) -> Outcome {
        let before = session.step();
        let outcome = match before {
            Step::Faculty => self.faculties.handle_key(code, session),
            Step::Module => self.modules.handle_key(code, session),
            Step::Subject => self.subjects.handle_key(code, session),
            Step::Tests => self.tests.handle_key(code, session),
        };
        let after = session.step();
        if after > before {
            self.reset(after);
        }
        outcome
    }

    /// Rewind the cursor of one step, e.g. after its filter changed.
    pub(crate) fn reset(&mut self, step: Step) {
        match step {
            Step::Faculty => self.faculties.cursor.reset(),
            Step::Module => self.modules.cursor.reset(),
            Step::Subject => self.subjects.cursor.reset(),
            Step::Tests => self.tests.reset(),
        }
    }

    pub(crate) fn reset_all(&mut self) {
        for step in Step::ALL {
            self.reset(step);
        }
    }
}

/// Key hints shown under each screen.
pub(crate) fn hints(step: Step) -> &'static str {
    match step {
        Step::Faculty => "↑/↓ move · Enter open · r reload · / filter · ? help",
        Step::Module => "↑/↓ move · Enter open · Esc back · / filter · ? help",
        Step::Subject => "↑/↓ move · ←/→ year · Enter open · Esc back · / filter · ? help",
        Step::Tests => {
            "↑/↓ move · Enter expand · PgUp/PgDn scroll · r reload · / search · Esc back"
        }
    }
}


#[cfg(test)]
mod cursor_tests {
    use super::*;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut c = Cursor::default();
        c.up();
        assert_eq!(c.get(3), Some(0));
        c.down(3);
        c.down(3);
        c.down(3);
        assert_eq!(c.get(3), Some(2));
        // A shrunk list clamps the selection.
        assert_eq!(c.get(1), Some(0));
        assert_eq!(c.get(0), None);
    }

    #[test]
    fn advancing_resets_next_screen() {
        let mut screens = Screens::new(300);
        let mut session = BrowseSession::new(1);
        session.set_faculties(vec![
            tests_support::faculty("FTN", &["SIIT", "E2"]),
            tests_support::faculty("PMF", &["INF"]),
        ]);

        screens.modules.cursor.down(5);
        assert_eq!(screens.handle_key(KeyCode::Down, &mut session), Outcome::Handled);
        assert_eq!(screens.handle_key(KeyCode::Enter, &mut session), Outcome::Handled);
        assert_eq!(session.step(), Step::Module);
        assert_eq!(session.faculty().map(|f| f.code.as_str()), Some("PMF"));
        assert_eq!(screens.modules.cursor.get(1), Some(0));
    }
}
