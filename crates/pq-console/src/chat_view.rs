//! Multi-turn chat layout.
//!
//! Transcript on the left, settings and console output on the right, input
//! at the bottom. Each assistant turn is annotated with its run id, timing
//! and steps according to the current display preferences.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use pq_session::{
    DisplayPrefs, DisplayToggle, Message, Profile, ProfileDirectory, Role, Session, SubmitError,
};

use crate::panels::{assistant_panels, wrap_text};
use crate::progress::ProgressPresenter;
use crate::tui::{
    is_quit_command, is_quit_key, push_notice, ConsoleView, InputLine, Notice, ViewAction,
};
use crate::{ConsoleContext, InFlight};

const INPUT_PLACEHOLDER: &str = "Ask a question about Parliamentary matters...";
const SCROLL_STEP: u16 = 5;
const CONTENT_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnStatus {
    Ready,
    Working,
    Completed,
    Failed,
}

pub struct ChatView {
    ctx: ConsoleContext,
    session: Session,
    profiles: ProfileDirectory,
    input: InputLine,
    pending: Option<InFlight>,
    progress: ProgressPresenter,
    status: TurnStatus,
    notices: Vec<Notice>,
    /// Lines scrolled up from the bottom of the transcript.
    scroll: u16,
}

impl ChatView {
    pub fn new(ctx: ConsoleContext, prefs: DisplayPrefs, profiles: ProfileDirectory) -> Self {
        let mut notices = Vec::new();
        push_notice(
            &mut notices,
            "Chat ready. Type a question and press Enter.",
            Color::Cyan,
        );
        push_notice(
            &mut notices,
            "Commands: /help, /new, /profile, /status, /quit",
            Color::DarkGray,
        );
        let progress = ctx.progress.restart();

        Self {
            ctx,
            session: Session::new(prefs),
            profiles,
            input: InputLine::default(),
            pending: None,
            progress,
            status: TurnStatus::Ready,
            notices,
            scroll: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn notice(&mut self, text: impl Into<String>, color: Color) {
        push_notice(&mut self.notices, text, color);
    }

    /// Handle Enter on the input line.
    fn submit_input(&mut self) -> ViewAction {
        // A question typed while busy stays in the input for a later Enter.
        let is_command = self.input.text().trim_start().starts_with('/');
        if !is_command && self.pending.is_some() {
            self.notice(SubmitError::Busy.to_string(), Color::Yellow);
            return ViewAction::Continue;
        }
        let text = self.input.take();
        if is_quit_command(&text) {
            return ViewAction::Quit;
        }
        if is_command {
            self.process_command(text.trim());
        } else {
            self.submit_question(&text);
        }
        ViewAction::Continue
    }

    fn submit_question(&mut self, text: &str) {
        match self.session.submit(text) {
            Ok(ticket) => {
                self.pending = Some(InFlight::start(&self.ctx, ticket));
                self.progress = self.ctx.progress.restart();
                self.status = TurnStatus::Working;
                self.scroll = 0;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Submission rejected");
                self.notice(e.to_string(), Color::Yellow);
            }
        }
    }

    fn process_command(&mut self, cmd: &str) {
        let (command, args) = match cmd.split_once(' ') {
            Some((command, args)) => (command, args.trim()),
            None => (cmd, ""),
        };

        match command {
            "/help" => {
                self.notice("Available commands:", Color::Cyan);
                for line in [
                    "  <text>         - Ask the agent a question",
                    "  /new           - Start a new session (Ctrl+N)",
                    "  /timing        - Toggle timing details (F2)",
                    "  /steps         - Toggle observability steps (F3)",
                    "  /runid         - Toggle run IDs (F4)",
                    "  /profile [id]  - Show or select a profile (Ctrl+P cycles)",
                    "  /profile none  - Clear the selected profile",
                    "  /profiles      - List configured profiles",
                    "  /status        - Show session and endpoint details",
                    "  /quit          - Exit the console",
                ] {
                    self.notice(line, Color::White);
                }
            }
            "/new" => self.reset_session(),
            "/timing" => self.toggle(DisplayToggle::Timing),
            "/steps" => self.toggle(DisplayToggle::Steps),
            "/runid" => self.toggle(DisplayToggle::RunId),
            "/profile" => {
                if args.is_empty() {
                    let current = self.profile_name();
                    self.notice(format!("Profile: {current}"), Color::Green);
                } else if args.eq_ignore_ascii_case("none") {
                    self.apply_profile(None);
                } else if let Some(profile) = self.profiles.get(args).cloned() {
                    self.apply_profile(Some(profile));
                } else {
                    self.notice(
                        format!("Unknown profile: {args}. Type /profiles to list them."),
                        Color::Red,
                    );
                }
            }
            "/profiles" => {
                if self.profiles.is_empty() {
                    self.notice("No profiles configured.", Color::Yellow);
                } else {
                    self.notice(
                        format!("Profiles ({}):", self.profiles.len()),
                        Color::Cyan,
                    );
                    let lines: Vec<String> = self
                        .profiles
                        .iter()
                        .map(|p| format!("  {}  {}", p.id, p.display_name()))
                        .collect();
                    for line in lines {
                        self.notice(line, Color::White);
                    }
                }
            }
            "/status" => {
                let agent = self.ctx.agent_label.clone();
                let secret = match &self.ctx.secret_fingerprint {
                    Some(fp) => format!("set (sha256 {fp})"),
                    None => "not set".to_string(),
                };
                let session = self.session.session_id();
                let profile = self.profile_name();
                let messages = self.session.messages().len();
                let request = if self.is_pending() { "in progress" } else { "idle" };
                self.notice(format!("Agent: {agent}"), Color::Green);
                self.notice(format!("Shared secret: {secret}"), Color::Green);
                self.notice(format!("Session ID: {session}"), Color::Green);
                self.notice(
                    format!("Profile: {profile} | Messages: {messages} | Request: {request}"),
                    Color::Green,
                );
            }
            _ => {
                self.notice(
                    format!("Unknown command: {command}. Type /help for available commands."),
                    Color::Red,
                );
            }
        }
    }

    fn toggle(&mut self, toggle: DisplayToggle) {
        let on = self.session.prefs.toggle(toggle);
        let state = if on { "on" } else { "off" };
        self.notice(format!("{}: {state}", toggle.label()), Color::Cyan);
    }

    fn abandon_pending(&mut self) {
        if let Some(inflight) = self.pending.take() {
            tracing::info!(
                run_id = ?inflight.ticket().request.run_id,
                "Abandoning pending request"
            );
            self.notice("Pending request abandoned.", Color::Yellow);
        }
        self.status = TurnStatus::Ready;
        self.scroll = 0;
    }

    fn reset_session(&mut self) {
        self.abandon_pending();
        self.session.new_session();
        let id = self.session.session_id();
        self.notice(format!("New session {id}"), Color::Cyan);
    }

    fn apply_profile(&mut self, profile: Option<Profile>) {
        let current = self.session.selected_profile().map(|p| p.id.as_str());
        if current == profile.as_ref().map(|p| p.id.as_str()) {
            self.notice("Profile unchanged.", Color::DarkGray);
            return;
        }
        self.abandon_pending();
        self.session.select_profile(profile);
        let name = self.profile_name();
        let id = self.session.session_id();
        self.notice(format!("Profile: {name}. New session {id}"), Color::Cyan);
    }

    fn cycle_profile(&mut self) {
        if self.profiles.is_empty() {
            self.notice("No profiles configured.", Color::Yellow);
            return;
        }
        let current = self.session.selected_profile().map(|p| p.id.clone());
        let next = self.profiles.next_after(current.as_deref()).cloned();
        self.apply_profile(next);
    }

    fn profile_name(&self) -> String {
        self.session
            .selected_profile()
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    /// Pick up a finished invocation, if any.
    fn poll_pending(&mut self) {
        let Some(inflight) = self.pending.as_mut() else {
            return;
        };
        let Some(outcome) = inflight.poll() else {
            return;
        };
        let Some(inflight) = self.pending.take() else {
            return;
        };
        self.status = match self.session.complete(inflight.ticket(), &outcome) {
            Some(message) if message.is_error() => TurnStatus::Failed,
            Some(_) => TurnStatus::Completed,
            None => TurnStatus::Ready,
        };
        self.scroll = 0;
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    fn transcript_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let inner = width.saturating_sub(CONTENT_INDENT.len());

        if self.session.messages().is_empty() && self.pending.is_none() {
            lines.push(Line::from(Span::styled(
                "No messages yet. Type a question below and press Enter.",
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        for message in self.session.messages() {
            lines.push(message_header(message));
            let color = if message.is_error() {
                Color::Red
            } else {
                Color::White
            };
            for text in wrap_text(&message.content, inner) {
                lines.push(Line::from(vec![
                    Span::raw(CONTENT_INDENT),
                    Span::styled(text, Style::default().fg(color)),
                ]));
            }
            if let Some(meta) = &message.metadata {
                for panel in assistant_panels(meta, &self.session.prefs, false) {
                    for mut line in panel.to_lines(inner) {
                        line.spans.insert(0, Span::raw(CONTENT_INDENT));
                        lines.push(line);
                    }
                }
            }
            lines.push(Line::from(""));
        }

        if let Some(inflight) = &self.pending {
            lines.push(Line::from(Span::styled(
                "Agent",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::raw(CONTENT_INDENT),
                Span::styled(
                    format!(
                        "Agent is thinking... {}",
                        self.progress.status_line(inflight.elapsed())
                    ),
                    Style::default().fg(Color::Yellow),
                ),
            ]));
        }

        lines
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" PQ Agent Console · Chat ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let (status, status_color) = match (&self.pending, self.status) {
            (Some(inflight), _) => (self.progress.status_line(inflight.elapsed()), Color::Yellow),
            (None, TurnStatus::Completed) => ("Completed".to_string(), Color::Green),
            (None, TurnStatus::Failed) => ("Failed".to_string(), Color::Red),
            (None, _) => ("Ready".to_string(), Color::Gray),
        };

        let line = Line::from(vec![
            Span::styled("  Session: ", Style::default().fg(Color::Gray)),
            Span::styled(
                self.session.session_id().to_string(),
                Style::default().fg(Color::White),
            ),
            Span::styled("  |  Profile: ", Style::default().fg(Color::Gray)),
            Span::styled(self.profile_name(), Style::default().fg(Color::LightCyan)),
            Span::styled("  |  Agent: ", Style::default().fg(Color::Gray)),
            Span::styled(self.ctx.agent_label.clone(), Style::default().fg(Color::Magenta)),
            Span::styled("  |  ", Style::default().fg(Color::Gray)),
            Span::styled(status, Style::default().fg(status_color)),
        ]);

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Conversation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue));

        let width = area.width.saturating_sub(2) as usize;
        let height = area.height.saturating_sub(2) as usize;
        let lines = self.transcript_lines(width);

        let max_scroll = lines.len().saturating_sub(height).min(u16::MAX as usize);
        self.scroll = self.scroll.min(max_scroll as u16);
        let top = max_scroll - self.scroll as usize;

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((top as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(12), // Settings
                Constraint::Min(4),     // Console output
            ])
            .split(area);

        let block = Block::default()
            .title(" Settings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));

        let prefs = &self.session.prefs;
        let mut text = vec![Line::from(Span::styled(
            "Display Options",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (toggle, key) in [
            (DisplayToggle::Timing, "F2"),
            (DisplayToggle::Steps, "F3"),
            (DisplayToggle::RunId, "F4"),
        ] {
            let mark = if prefs.get(toggle) { "[x]" } else { "[ ]" };
            text.push(Line::from(vec![
                Span::styled(format!("{mark} "), Style::default().fg(Color::Green)),
                Span::styled(toggle.label(), Style::default().fg(Color::White)),
                Span::styled(format!(" {key}"), Style::default().fg(Color::DarkGray)),
            ]));
        }
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Session ID:",
            Style::default().fg(Color::Gray),
        )));
        text.push(Line::from(Span::styled(
            self.session.session_id().to_string(),
            Style::default().fg(Color::White),
        )));
        text.push(Line::from(vec![
            Span::styled("Profile: ", Style::default().fg(Color::Gray)),
            Span::styled(self.profile_name(), Style::default().fg(Color::LightCyan)),
        ]));
        text.push(Line::from(Span::styled(
            "Ctrl+N new session · Ctrl+P profile",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(
            Paragraph::new(text)
                .block(block)
                .wrap(Wrap { trim: false }),
            rows[0],
        );

        let block = Block::default()
            .title(" Console ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let visible = rows[1].height.saturating_sub(2) as usize;
        let start = self.notices.len().saturating_sub(visible);
        let lines: Vec<Line> = self.notices[start..]
            .iter()
            .map(|n| {
                Line::from(vec![
                    Span::styled(
                        n.at.format("%H:%M:%S ").to_string(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(n.text.as_str(), Style::default().fg(n.color)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), rows[1]);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let border = if self.pending.is_some() {
            Color::Yellow
        } else {
            Color::Green
        };
        let block = Block::default()
            .title(" Question (Enter = send, /help = commands, /quit = exit) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let visible = area.width.saturating_sub(6) as usize;
        let (shown, cursor_col) = self.input.viewport(visible);

        let input_display = if self.input.is_empty() {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled(shown, Style::default().fg(Color::White)),
            ])
        };

        let hint_line = Line::from(vec![Span::styled(
            "  Ctrl+C to exit  |  Up/Down history  |  PgUp/PgDn scroll  |  F2-F4 display",
            Style::default().fg(Color::DarkGray),
        )]);

        let paragraph = Paragraph::new(vec![Line::from(""), input_display, hint_line]).block(block);
        frame.render_widget(paragraph, area);

        let cursor_x = area.x + 4 + cursor_col as u16;
        let cursor_y = area.y + 2;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn message_header(message: &Message) -> Line<'static> {
    let (label, color) = match message.role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant if message.is_error() => ("Agent", Color::Red),
        Role::Assistant => ("Agent", Color::Green),
    };
    Line::from(vec![
        Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            message.created_at.format("  %H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

impl ConsoleView for ChatView {
    fn render(&mut self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Transcript + sidebar
                Constraint::Length(5), // Input area
            ])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(42)])
            .split(outer[1]);

        self.render_status_bar(frame, outer[0]);
        self.render_transcript(frame, columns[0]);
        self.render_sidebar(frame, columns[1]);
        self.render_input(frame, outer[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        if is_quit_key(&key) {
            return ViewAction::Quit;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return self.submit_input(),
            KeyCode::Char('n') if ctrl => self.reset_session(),
            KeyCode::Char('p') if ctrl => self.cycle_profile(),
            KeyCode::F(2) => self.toggle(DisplayToggle::Timing),
            KeyCode::F(3) => self.toggle(DisplayToggle::Steps),
            KeyCode::F(4) => self.toggle(DisplayToggle::RunId),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(SCROLL_STEP),
            code => {
                self.input.handle_key(code, key.modifiers);
            }
        }
        ViewAction::Continue
    }

    fn on_tick(&mut self) {
        if self.pending.is_some() {
            self.progress.advance();
        }
        self.poll_pending();
    }
}
