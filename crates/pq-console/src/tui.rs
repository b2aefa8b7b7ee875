//! Terminal plumbing shared by both views: raw-mode setup and teardown, the
//! input line with history, and the tick-driven event loop.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, style::Color, Frame, Terminal};
use unicode_width::UnicodeWidthChar;

/// Render/poll period of the event loop (~10fps).
pub const TICK_RATE: Duration = Duration::from_millis(100);

/// Console output lines kept before the oldest are dropped.
pub const MAX_NOTICES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Continue,
    Quit,
}

/// A full-screen view driven by [`run_console`].
pub trait ConsoleView {
    fn render(&mut self, frame: &mut Frame);

    /// Handle one key press, including Enter.
    fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

    /// Called once per tick whether or not a key arrived.
    fn on_tick(&mut self);
}

/// A short line in a view's console area.
#[derive(Debug, Clone)]
pub struct Notice {
    pub at: chrono::DateTime<chrono::Utc>,
    pub text: String,
    pub color: Color,
}

pub fn push_notice(notices: &mut Vec<Notice>, text: impl Into<String>, color: Color) {
    notices.push(Notice {
        at: chrono::Utc::now(),
        text: text.into(),
        color,
    });
    if notices.len() > MAX_NOTICES {
        let excess = notices.len() - MAX_NOTICES;
        notices.drain(..excess);
    }
}

/// Single-line editor with up/down history.
#[derive(Debug, Default)]
pub struct InputLine {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
    history: Vec<String>,
    /// `None` while editing fresh input.
    history_pos: Option<usize>,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the current text, recording non-blank entries in history.
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.history_pos = None;
        if !text.trim().is_empty() && self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        text
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    /// The slice of the text that fits in `width` columns with the cursor
    /// in view, and the cursor's column within that slice.
    pub fn viewport(&self, width: usize) -> (String, usize) {
        let chars: Vec<char> = self.text.chars().collect();
        let cols = |c: char| c.width().unwrap_or(0);

        let mut start = self.cursor.min(chars.len());
        let mut cursor_col = 0;
        while start > 0 && cursor_col + cols(chars[start - 1]) <= width {
            start -= 1;
            cursor_col += cols(chars[start]);
        }

        let mut used = 0;
        let shown = chars[start..]
            .iter()
            .take_while(|c| {
                used += cols(**c);
                used <= width
            })
            .collect();
        (shown, cursor_col)
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Apply an editing key. Returns false when the key is not an editing
    /// key, so the view can handle it.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let len = self.text.chars().count();
        match code {
            KeyCode::Char(c)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let at = self.byte_index(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let at = self.byte_index(self.cursor - 1);
                    self.text.remove(at);
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.text.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Up => {
                if self.history.is_empty() {
                    return true;
                }
                let pos = match self.history_pos {
                    None => self.history.len() - 1,
                    Some(0) => 0,
                    Some(p) => p - 1,
                };
                self.history_pos = Some(pos);
                let entry = self.history[pos].clone();
                self.set(entry);
            }
            KeyCode::Down => match self.history_pos {
                Some(p) if p + 1 < self.history.len() => {
                    self.history_pos = Some(p + 1);
                    let entry = self.history[p + 1].clone();
                    self.set(entry);
                }
                Some(_) => {
                    self.history_pos = None;
                    self.set(String::new());
                }
                None => {}
            },
            KeyCode::Esc => {
                self.history_pos = None;
                self.set(String::new());
            }
            _ => return false,
        }
        true
    }
}

pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn is_quit_command(input: &str) -> bool {
    matches!(input.trim(), "/quit" | "/exit" | "/q")
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Fail early when stdin/stdout are not a terminal.
pub fn ensure_terminal() -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The console requires a terminal (TTY). Use --query for non-interactive use."
        ));
    }
    Ok(())
}

/// Run `view` full-screen until it asks to quit.
pub async fn run_console<V: ConsoleView>(view: &mut V) -> Result<(), anyhow::Error> {
    ensure_terminal()?;

    // Set up panic hook to restore terminal.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, view).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop<V: ConsoleView>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &mut V,
) -> Result<(), anyhow::Error> {
    loop {
        terminal.draw(|frame| view.render(frame))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && view.handle_key(key) == ViewAction::Quit {
                    break;
                }
            }
        }

        view.on_tick();
        // Let background invocations make progress on this thread too.
        tokio::task::yield_now().await;
    }
    Ok(())
}
