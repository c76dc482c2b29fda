//! Subjects of the selected module, with a study-year selector.

use crossterm::event::KeyCode;
use examarchive_core::browse::{BrowseSession, Step, YEARS};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Tabs};

use super::{Cursor, Outcome};
use crate::widgets::{empty_block, selectable_list};

pub(crate) struct SubjectsScreen {
    pub(super) cursor: Cursor,
}

impl SubjectsScreen {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &BrowseSession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Year selector
                Constraint::Min(1),    // List
            ])
            .split(area);

        let years: Vec<Line> = YEARS.map(|y| Line::from(format!("Year {y}"))).collect();
        let tabs = Tabs::new(years)
            .block(Block::default().borders(Borders::ALL).title(" Study year "))
            .select(usize::from(session.year() - YEARS.start()))
            .style(Style::default().fg(Color::White))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .divider(" │ ");
        f.render_widget(tabs, chunks[0]);

        let subjects = session.visible_subjects();
        let module = session.module().map_or("", |m| m.code.as_str());
        let title = format!(" {module}: subjects ({}) ", subjects.len());

        if subjects.is_empty() {
            let message = if session.filter(Step::Subject).is_empty() {
                "No subjects for this year."
            } else {
                "No subject matches the filter."
            };
            f.render_widget(empty_block(title, message), chunks[1]);
            return;
        }

        let rows = subjects
            .iter()
            .map(|s| {
                format!(
                    "{:<10} {:<40} sem {}  {:>2} ESPB  {}",
                    s.code,
                    s.name,
                    s.semester,
                    s.espb,
                    if s.mandatory { "mandatory" } else { "elective" }
                )
            })
            .collect();
        f.render_widget(
            selectable_list(title, rows, self.cursor.get(subjects.len())),
            chunks[1],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, session: &mut BrowseSession) -> Outcome {
        let visible = session.visible_subjects();
        if self.cursor.navigate(code, visible.len()) {
            return Outcome::Handled;
        }
        match code {
            KeyCode::Enter => {
                let Some(subject) = self.cursor.get(visible.len()).map(|i| visible[i].clone())
                else {
                    return Outcome::Ignored;
                };
                session.select_subject(subject).into()
            }
            KeyCode::Left | KeyCode::Char('h') => self.change_year(session, -1),
            KeyCode::Right | KeyCode::Char('l') => self.change_year(session, 1),
            _ => Outcome::Ignored,
        }
    }

    /// Step the year, wrapping around 1..=4.
    fn change_year(&mut self, session: &mut BrowseSession, delta: i8) -> Outcome {
        let (first, last) = (*YEARS.start(), *YEARS.end());
        let year = match session.year().checked_add_signed(delta) {
            Some(y) if y > last => first,
            Some(y) if y >= first => y,
            _ => last,
        };
        self.cursor.reset();
        session.set_year(year).into()
    }
}
