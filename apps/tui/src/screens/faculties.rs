//! Faculty list, the first browse step.

use crossterm::event::KeyCode;
use examarchive_core::browse::{BrowseSession, Step};
use ratatui::prelude::*;

use super::{Cursor, Outcome, Request};
use crate::widgets::{empty_block, selectable_list};

pub(crate) struct FacultiesScreen {
    pub(super) cursor: Cursor,
}

impl FacultiesScreen {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &BrowseSession) {
        let faculties = session.visible_faculties();
        let title = format!(" Faculties ({}) ", faculties.len());

        if faculties.is_empty() {
            let message = if session.filter(Step::Faculty).is_empty() {
                "No faculties loaded.\n\nPress 'r' to fetch them from the archive."
            } else {
                "No faculty matches the filter."
            };
            f.render_widget(empty_block(title, message), area);
            return;
        }

        let rows = faculties
            .iter()
            .map(|fac| format!("{:<8} {}  ({} modules)", fac.code, fac.name, fac.modules.len()))
            .collect();
        f.render_widget(
            selectable_list(title, rows, self.cursor.get(faculties.len())),
            area,
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, session: &mut BrowseSession) -> Outcome {
        let visible = session.visible_faculties();
        if self.cursor.navigate(code, visible.len()) {
            return Outcome::Handled;
        }
        match code {
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let Some(faculty) = self.cursor.get(visible.len()).map(|i| visible[i].clone())
                else {
                    return Outcome::Ignored;
                };
                session.select_faculty(faculty);
                Outcome::Handled
            }
            KeyCode::Char('r') => Outcome::Fetch(Request::Faculties),
            _ => Outcome::Ignored,
        }
    }
}
