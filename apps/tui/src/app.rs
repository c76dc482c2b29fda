//! Core TUI application state and event loop.

use std::io;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use examarchive_client::{ArchiveClient, FacultyFilter};
use examarchive_core::browse::{BrowseSession, Load, Step};
use examarchive_core::sync::fetch_subject_tests;
use examarchive_shared::{AppConfig, ExamArchiveError};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tracing::{info, warn};

use crate::screens::{Outcome, Request, Screens, hints};
use crate::widgets::{breadcrumb, filter_line, status_bar};

/// Application state.
pub(crate) struct App {
    pub session: BrowseSession,
    pub screens: Screens,
    client: ArchiveClient,
    /// Whether keys go to the filter line.
    pub editing: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
}

impl App {
    pub(crate) fn new(config: &AppConfig, client: ArchiveClient) -> Self {
        Self {
            session: BrowseSession::new(config.browse.default_year),
            screens: Screens::new(config.browse.preview_chars),
            client,
            editing: false,
            should_quit: false,
            status: "Ready, press ? for help".to_string(),
            show_help: false,
        }
    }

    /// Handle one key press. Returns data the caller must fetch, if any.
    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<Request> {
        if matches!(code, KeyCode::Char('c')) && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.editing {
            self.edit_filter(code);
            return None;
        }

        // If help is showing, consume any key to dismiss
        if self.show_help {
            self.show_help = false;
            return None;
        }

        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return None;
            }
            KeyCode::Char('/') => {
                self.editing = true;
                return None;
            }
            // Breadcrumb jumps with number keys
            KeyCode::Char(c @ '1'..='4') => {
                let step = Step::ALL[(c as usize) - ('1' as usize)];
                match self.session.go_to(step) {
                    Ok(()) => self.status = step.to_string(),
                    Err(e) => self.status = e.to_string(),
                }
                return None;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.session.back();
                self.status = self.session.step().to_string();
                return None;
            }
            KeyCode::Char('R') => {
                self.session.reset();
                self.screens.reset_all();
                self.status = "Selections cleared".to_string();
                return None;
            }
            _ => {}
        }

        match self.screens.handle_key(code, &mut self.session) {
            Outcome::Fetch(request) => Some(request),
            Outcome::Error(message) => {
                self.status = message;
                None
            }
            Outcome::Handled | Outcome::Ignored => None,
        }
    }

    fn edit_filter(&mut self, code: KeyCode) {
        let step = self.session.step();
        let mut text = self.session.filter(step).to_string();
        match code {
            KeyCode::Enter => {
                self.editing = false;
                return;
            }
            KeyCode::Esc => {
                self.editing = false;
                text.clear();
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => return,
        }
        self.session.set_filter(step, text);
        self.screens.reset(step);
    }

    /// Fetch data for a request and hand it to the session.
    pub(crate) async fn perform(&mut self, request: Request) {
        let result = match request {
            Request::Faculties => self.load_faculties().await,
            Request::Load(Load::Subjects(filter)) => {
                match self.client.list_subjects(&filter).await {
                    Ok(subjects) => {
                        let n = subjects.len();
                        self.session.set_subjects(subjects);
                        Ok(format!("{n} subjects in year {}", self.session.year()))
                    }
                    Err(e) => Err(e),
                }
            }
            Request::Load(Load::Tests(query)) => {
                let fetched = match &query.subject_code {
                    Some(code) => fetch_subject_tests(&self.client, code).await,
                    None => self.client.find_tests(&query).await,
                };
                match fetched {
                    Ok(tests) => {
                        let n = tests.len();
                        self.session.set_tests(tests);
                        self.screens.reset(Step::Tests);
                        Ok(format!("{n} tests"))
                    }
                    Err(e) => Err(e),
                }
            }
            Request::Load(Load::Nothing) => return,
        };

        self.status = match result {
            Ok(message) => message,
            Err(e) => describe_error(&e),
        };
    }

    async fn load_faculties(&mut self) -> examarchive_shared::Result<String> {
        let faculties = self.client.list_faculties(&FacultyFilter::default()).await?;
        let n = faculties.len();
        self.session.set_faculties(faculties);
        self.screens.reset(Step::Faculty);
        info!(count = n, "faculties loaded");
        Ok(format!("{n} faculties"))
    }
}

fn describe_error(e: &ExamArchiveError) -> String {
    warn!(error = %e, "request failed");
    if e.is_unauthorized() {
        "Not authorized; run `examarchive login` and restart".to_string()
    } else {
        format!("Error: {e}")
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) async fn run(config: &AppConfig, client: ArchiveClient) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, App::new(config, client)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    let mut pending = Some(Request::Faculties);

    loop {
        if let Some(request) = pending.take() {
            app.status = "Loading...".to_string();
            terminal.draw(|f| draw(f, &app))?;
            app.perform(request).await;
        }

        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    pending = app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Step tabs
            Constraint::Length(1), // Breadcrumb
            Constraint::Length(1), // Filter
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Hints
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let step = app.session.step();
    let titles: Vec<Line> = Step::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{} {s}", i + 1)))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" examarchive "),
        )
        .select(step as usize)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");
    f.render_widget(tabs, chunks[0]);

    f.render_widget(breadcrumb(&app.session.breadcrumb()), chunks[1]);

    let label = if step == Step::Tests { "Search" } else { "Filter" };
    f.render_widget(
        filter_line(label, app.session.filter(step), app.editing),
        chunks[2],
    );

    app.screens.draw(f, chunks[3], &app.session);

    f.render_widget(
        Paragraph::new(hints(step)).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
    f.render_widget(status_bar(&app.status), chunks[5]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-4          Jump to step"),
        Line::from("  Esc          Back one step"),
        Line::from("  R            Start over"),
        Line::from("  /            Edit filter (search text on tests)"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Lists:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓ j/k      Navigate"),
        Line::from("  Enter        Open / expand test"),
        Line::from("  ←/→          Change year (subjects)"),
        Line::from("  PgUp/PgDn    Scroll test (tests)"),
        Line::from("  r            Reload"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help, press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
