//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}"))
        .style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White),
        )
}

/// `Faculties › FTN › SIIT (year 2) › Operating Systems`
pub(crate) fn breadcrumb(trail: &[String]) -> Paragraph<'static> {
    let mut spans = Vec::with_capacity(trail.len() * 2);
    for (i, part) in trail.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let style = if i + 1 == trail.len() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(part.clone(), style));
    }
    Paragraph::new(Line::from(spans))
}

/// Filter input for the current step.
pub(crate) fn filter_line<'a>(label: &str, text: &'a str, editing: bool) -> Paragraph<'a> {
    let (hint, style) = if editing {
        (
            "  (Enter to keep, Esc to clear)",
            Style::default().fg(Color::Yellow),
        )
    } else if text.is_empty() {
        ("  press / to filter", Style::default().fg(Color::DarkGray))
    } else {
        ("", Style::default().fg(Color::White))
    };
    let cursor = if editing { "▏" } else { "" };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(text, style),
        Span::styled(cursor, style),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]))
}

/// Bordered list with the selected row highlighted.
pub(crate) fn selectable_list<'a>(
    title: String,
    rows: Vec<String>,
    selected: Option<usize>,
) -> List<'a> {
    let items: Vec<ListItem> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let is_selected = selected == Some(i);
            let style = if is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let prefix = if is_selected { "▸ " } else { "  " };
            ListItem::new(format!("{prefix}{row}")).style(style)
        })
        .collect();

    List::new(items).block(Block::default().borders(Borders::ALL).title(title))
}

/// Centered message inside a bordered block, for empty lists.
pub(crate) fn empty_block<'a>(title: String, message: &'a str) -> Paragraph<'a> {
    Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title))
}
