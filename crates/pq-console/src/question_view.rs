//! Single-question layout: one input line and the most recent result.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use pq_session::{DisplayPrefs, DisplayToggle, Session, TurnError};

use crate::panels::{assistant_panels, wrap_text};
use crate::progress::ProgressPresenter;
use crate::tui::{is_quit_command, is_quit_key, ConsoleView, InputLine, ViewAction};
use crate::{ConsoleContext, InFlight};

const INPUT_PLACEHOLDER: &str = "Type your question and press Enter...";
const SCROLL_STEP: u16 = 5;
const INVOKE_FAILED_PREFIX: &str = "Invoke failed:";

pub struct QuestionView {
    ctx: ConsoleContext,
    session: Session,
    input: InputLine,
    pending: Option<InFlight>,
    progress: ProgressPresenter,
    warning: Option<String>,
    /// Lines scrolled down from the top of the result.
    scroll: u16,
}

impl QuestionView {
    pub fn new(ctx: ConsoleContext, prefs: DisplayPrefs) -> Self {
        let progress = ctx.progress.restart();
        Self {
            ctx,
            session: Session::new(prefs),
            input: InputLine::default(),
            pending: None,
            progress,
            warning: None,
            scroll: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Text of the result panel for the most recent question, without
    /// styling. Empty before the first question.
    pub fn result_text(&self, width: usize) -> Vec<String> {
        self.result_lines(width)
            .into_iter()
            .map(|line| line.spans.iter().map(|s| s.content.to_string()).collect())
            .collect()
    }

    fn submit_input(&mut self) -> ViewAction {
        if self.pending.is_some() {
            self.warning = Some("A request is already in progress.".to_string());
            return ViewAction::Continue;
        }
        let text = self.input.take();
        if is_quit_command(&text) {
            return ViewAction::Quit;
        }
        // Only the latest exchange is shown, so earlier turns are not kept.
        if !text.trim().is_empty() {
            self.session.forget_history();
        }
        match self.session.submit(&text) {
            Ok(ticket) => {
                self.pending = Some(InFlight::start(&self.ctx, ticket));
                self.progress = self.ctx.progress.restart();
                self.warning = None;
                self.scroll = 0;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Submission rejected");
                self.warning = Some(e.to_string());
            }
        }
        ViewAction::Continue
    }

    fn toggle(&mut self, toggle: DisplayToggle) {
        self.session.prefs.toggle(toggle);
    }

    fn poll_pending(&mut self) {
        let Some(inflight) = self.pending.as_mut() else {
            return;
        };
        let Some(outcome) = inflight.poll() else {
            return;
        };
        if let Some(inflight) = self.pending.take() {
            self.session.complete(inflight.ticket(), &outcome);
        }
    }

    fn result_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let Some((question, reply)) = self.session.last_exchange() else {
            return lines;
        };

        for (i, text) in wrap_text(&question.content, width.saturating_sub(3))
            .into_iter()
            .enumerate()
        {
            let prefix = if i == 0 { "Q: " } else { "   " };
            lines.push(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::Cyan)),
                Span::styled(
                    text,
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        lines.push(Line::from(""));

        let Some(reply) = reply else {
            if let Some(inflight) = &self.pending {
                lines.push(Line::from(Span::styled(
                    self.progress.status_line(inflight.elapsed()),
                    Style::default().fg(Color::Yellow),
                )));
            }
            return lines;
        };

        match &reply.error {
            Some(TurnError::Transport(detail)) => {
                for text in wrap_text(&format!("{INVOKE_FAILED_PREFIX} {detail}"), width) {
                    lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Red))));
                }
            }
            Some(TurnError::Agent(_)) => {
                for text in wrap_text(&reply.content, width) {
                    lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Red))));
                }
            }
            None => {
                for text in wrap_text(&reply.content, width) {
                    lines.push(Line::from(Span::styled(
                        text,
                        Style::default().fg(Color::White),
                    )));
                }
                if let Some(meta) = &reply.metadata {
                    for panel in assistant_panels(meta, &self.session.prefs, true) {
                        lines.push(Line::from(""));
                        lines.extend(panel.to_lines(width));
                    }
                }
            }
        }

        lines
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" PQ Agent Console · Question ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let prefs = &self.session.prefs;
        let mut spans = vec![
            Span::styled("  Agent: ", Style::default().fg(Color::Gray)),
            Span::styled(self.ctx.agent_label.clone(), Style::default().fg(Color::Magenta)),
        ];
        for (toggle, key, name) in [
            (DisplayToggle::Timing, "F2", "timing"),
            (DisplayToggle::Steps, "F3", "steps"),
            (DisplayToggle::RunId, "F4", "run id"),
            (DisplayToggle::RawJson, "F5", "raw JSON"),
        ] {
            let (state, color) = if prefs.get(toggle) {
                ("on", Color::Green)
            } else {
                ("off", Color::DarkGray)
            };
            spans.push(Span::styled(
                format!("  |  {key} {name}: "),
                Style::default().fg(Color::Gray),
            ));
            spans.push(Span::styled(state, Style::default().fg(color)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let border = if self.pending.is_some() {
            Color::Yellow
        } else {
            Color::Green
        };
        let block = Block::default()
            .title(" Question (Enter = ask, Ctrl+C = quit) ")
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

        let status_line = match (&self.warning, &self.pending) {
            (Some(warning), _) => Line::from(Span::styled(
                format!("  {warning}"),
                Style::default().fg(Color::Yellow),
            )),
            (None, Some(inflight)) => Line::from(Span::styled(
                format!("  {}", self.progress.status_line(inflight.elapsed())),
                Style::default().fg(Color::Yellow),
            )),
            (None, None) => Line::from(Span::styled(
                "  Up/Down history  |  PgUp/PgDn scroll result  |  F2-F5 toggle panels",
                Style::default().fg(Color::DarkGray),
            )),
        };

        let paragraph =
            Paragraph::new(vec![Line::from(""), input_display, status_line]).block(block);
        frame.render_widget(paragraph, area);

        let cursor_x = area.x + 4 + cursor_col as u16;
        let cursor_y = area.y + 2;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn render_result(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Result ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue));

        let width = area.width.saturating_sub(2) as usize;
        let height = area.height.saturating_sub(2) as usize;
        let mut lines = self.result_lines(width);
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Ask a question to see the agent's answer here.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let max_scroll = lines.len().saturating_sub(height).min(u16::MAX as usize) as u16;
        self.scroll = self.scroll.min(max_scroll);

        frame.render_widget(
            Paragraph::new(lines).block(block).scroll((self.scroll, 0)),
            area,
        );
    }
}

impl ConsoleView for QuestionView {
    fn render(&mut self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(5), // Input area
                Constraint::Min(6),    // Result
            ])
            .split(frame.area());

        self.render_title(frame, outer[0]);
        self.render_input(frame, outer[1]);
        self.render_result(frame, outer[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        if is_quit_key(&key) {
            return ViewAction::Quit;
        }
        match key.code {
            KeyCode::Enter => return self.submit_input(),
            KeyCode::F(2) => self.toggle(DisplayToggle::Timing),
            KeyCode::F(3) => self.toggle(DisplayToggle::Steps),
            KeyCode::F(4) => self.toggle(DisplayToggle::RunId),
            KeyCode::F(5) => self.toggle(DisplayToggle::RawJson),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(SCROLL_STEP),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(SCROLL_STEP),
            code => {
                if self.input.handle_key(code, key.modifiers) {
                    self.warning = None;
                }
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
