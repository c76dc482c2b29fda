//! Tests of the selected subject. The left pane lists the tests, the right
//! pane shows the selected one: a text preview, or its segmented questions
//! once expanded.

use crossterm::event::KeyCode;
use examarchive_core::browse::{BrowseSession, Load};
use examarchive_core::filter::preview;
use examarchive_segmenter::segment;
use examarchive_shared::{Test, TestQuery};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{Cursor, Outcome, Request};
use crate::widgets::{empty_block, selectable_list};

const SCROLL_STEP: u16 = 10;

pub(crate) struct TestsScreen {
    cursor: Cursor,
    /// Vertical scroll of the detail pane.
    scroll: u16,
    preview_chars: usize,
}

impl TestsScreen {
    pub(crate) fn new(preview_chars: usize) -> Self {
        Self {
            cursor: Cursor::default(),
            scroll: 0,
            preview_chars,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.cursor.reset();
        self.scroll = 0;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, session: &BrowseSession) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let tests = session.tests();
        let subject = session.subject().map_or("", |s| s.name.as_str());
        let title = if tests.len() == session.all_tests().len() {
            format!(" {subject} ({}) ", tests.len())
        } else {
            format!(" {subject} ({}/{}) ", tests.len(), session.all_tests().len())
        };

        let Some(selected) = self.cursor.get(tests.len()) else {
            let message = if session.all_tests().is_empty() {
                "No tests archived for this subject."
            } else {
                "No test contains the search text."
            };
            f.render_widget(empty_block(title, message), area);
            return;
        };

        let rows = tests
            .iter()
            .map(|t| format!("{} {} [{}]", t.exam_period, t.academic_year, t.test_type))
            .collect();
        f.render_widget(selectable_list(title, rows, Some(selected)), chunks[0]);

        let test = &tests[selected];
        let expanded = session.is_expanded(test.id_str());
        let detail = Paragraph::new(self.detail_lines(test, expanded))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(if expanded { " Questions " } else { " Preview " }),
            );
        f.render_widget(detail, chunks[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, session: &mut BrowseSession) -> Outcome {
        let len = session.tests().len();
        if self.cursor.navigate(code, len) {
            self.scroll = 0;
            return Outcome::Handled;
        }
        match code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(i) = self.cursor.get(len) else {
                    return Outcome::Ignored;
                };
                let id = session.tests()[i].id_str().to_string();
                if id.is_empty() {
                    return Outcome::Error("This test has no id and cannot be expanded".into());
                }
                session.toggle_expanded(&id);
                self.scroll = 0;
                Outcome::Handled
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP);
                Outcome::Handled
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                Outcome::Handled
            }
            KeyCode::Char('r') => match session.subject() {
                Some(subject) => Outcome::Fetch(Request::Load(Load::Tests(
                    TestQuery::for_subject(subject.code.clone()),
                ))),
                None => Outcome::Ignored,
            },
            _ => Outcome::Ignored,
        }
    }

    fn detail_lines(&self, test: &Test, expanded: bool) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().fg(Color::DarkGray);
        let seg = segment(&test.full_text);

        let mut lines = vec![
            Line::styled(
                format!(
                    "{} · {} · {} · {}",
                    test.subject_code, test.exam_period, test.academic_year, test.test_type
                ),
                bold,
            ),
            Line::styled(format!("{} questions · id {}", seg.len(), test.id_str()), dim),
            Line::from(""),
        ];

        if !expanded {
            let p = preview(test.full_text.trim(), self.preview_chars);
            lines.extend(p.text.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::from(""));
            lines.push(Line::styled("Enter: show segmented questions", dim));
            return lines;
        }

        if seg.is_empty() {
            lines.push(Line::styled("No numbered questions found; full text:", dim));
            lines.push(Line::from(""));
            lines.extend(test.full_text.lines().map(|l| Line::from(l.to_string())));
            return lines;
        }

        for (i, q) in seg.questions.iter().enumerate() {
            let number = q.number.map_or(i + 1, |n| n as usize);
            let mut spans = vec![Span::styled(format!("{number}. "), bold)];
            if let Some(note) = &q.annotation {
                spans.push(Span::styled(format!("({note}) "), dim));
            }
            spans.push(Span::raw(q.text.clone()));
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::tests_support::{faculty, subject, test};

    fn session_with_tests(tests: Vec<Test>) -> BrowseSession {
        let mut session = BrowseSession::new(1);
        let ftn = faculty("FTN", &["SIIT"]);
        let siit = ftn.modules[0].clone();
        session.select_faculty(ftn);
        session.select_module(siit).unwrap();
        session.select_subject(subject("OS", 1)).unwrap();
        session.set_tests(tests);
        session
    }

    fn text_of(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| {
                l.spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn enter_toggles_between_preview_and_questions() {
        let body = format!("Header\n1. (2p) What is X?\n2. (3p) {}", "y".repeat(400));
        let mut session = session_with_tests(vec![test("t1", &body)]);
        let mut screen = TestsScreen::new(50);

        let collapsed = text_of(&screen.detail_lines(&session.tests()[0], false));
        assert!(collapsed.contains("..."));
        assert!(collapsed.contains("2 questions"));

        assert_eq!(screen.handle_key(KeyCode::Enter, &mut session), Outcome::Handled);
        assert!(session.is_expanded("t1"));

        let expanded = text_of(&screen.detail_lines(&session.tests()[0], true));
        assert!(expanded.contains("1. (2p) What is X?"));
        assert!(expanded.contains("2. (3p) yyy"));

        screen.handle_key(KeyCode::Char(' '), &mut session);
        assert!(!session.is_expanded("t1"));
    }

    #[test]
    fn test_without_id_does_not_expand_others() {
        let mut orphan = test("", "1. a");
        orphan.id = None;
        let mut session = session_with_tests(vec![orphan.clone(), orphan]);
        let mut screen = TestsScreen::new(300);

        let outcome = screen.handle_key(KeyCode::Enter, &mut session);
        assert!(matches!(outcome, Outcome::Error(_)));
        assert!(!session.is_expanded(""));

        screen.handle_key(KeyCode::Down, &mut session);
        assert!(!session.is_expanded(session.tests()[1].id_str()));
    }

    #[test]
    fn unsegmented_text_is_shown_whole() {
        let session = session_with_tests(vec![test("t1", "illegible\nscan")]);
        let screen = TestsScreen::new(300);
        let expanded = text_of(&screen.detail_lines(&session.tests()[0], true));
        assert!(expanded.contains("No numbered questions"));
        assert!(expanded.contains("illegible\nscan"));
    }

    #[test]
    fn reload_requests_subject_tests() {
        let mut session = session_with_tests(Vec::new());
        let mut screen = TestsScreen::new(300);
        assert_eq!(
            screen.handle_key(KeyCode::Char('r'), &mut session),
            Outcome::Fetch(Request::Load(Load::Tests(TestQuery::for_subject("OS"))))
        );
    }

    #[test]
    fn scrolling_saturates() {
        let mut session = session_with_tests(vec![test("t1", "1. a")]);
        let mut screen = TestsScreen::new(300);
        screen.handle_key(KeyCode::PageUp, &mut session);
        assert_eq!(screen.scroll, 0);
        screen.handle_key(KeyCode::PageDown, &mut session);
        assert_eq!(screen.scroll, SCROLL_STEP);
        screen.handle_key(KeyCode::Down, &mut session);
        assert_eq!(screen.scroll, 0);
    }
}
