//! Modules of the selected faculty.

use crossterm::event::KeyCode;
use examarchive_core::browse::{BrowseSession, Step};
use ratatui::prelude::*;

use super::{Cursor, Outcome};
use crate::widgets::{empty_block, selectable_list};

pub(crate) struct ModulesScreen {
    pub(super) cursor: Cursor,
}

impl ModulesScreen {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &BrowseSession) {
        let modules = session.visible_modules();
        let faculty = session.faculty().map_or("", |fac| fac.name.as_str());
        let title = format!(" {faculty}: modules ({}) ", modules.len());

        if modules.is_empty() {
            let message = if session.filter(Step::Module).is_empty() {
                "This faculty has no modules."
            } else {
                "No module matches the filter."
            };
            f.render_widget(empty_block(title, message), area);
            return;
        }

        let rows = modules
            .iter()
            .map(|m| {
                if m.description.is_empty() {
                    format!("{:<8} {}", m.code, m.name)
                } else {
                    format!("{:<8} {}  · {}", m.code, m.name, m.description)
                }
            })
            .collect();
        f.render_widget(
            selectable_list(title, rows, self.cursor.get(modules.len())),
            area,
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, session: &mut BrowseSession) -> Outcome {
        let visible = session.visible_modules();
        if self.cursor.navigate(code, visible.len()) {
            return Outcome::Handled;
        }
        match code {
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let Some(module) = self.cursor.get(visible.len()).map(|i| visible[i].clone())
                else {
                    return Outcome::Ignored;
                };
                session.select_module(module).into()
            }
            _ => Outcome::Ignored,
        }
    }
}
