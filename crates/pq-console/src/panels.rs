//! Annotation panels shared by both views and the one-shot printer.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use pq_session::{DisplayPrefs, MessageMetadata};

const PANEL_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    RunId,
    Timing,
    Steps,
    RawJson,
}

impl PanelKind {
    pub fn title(&self) -> Option<&'static str> {
        match self {
            PanelKind::RunId => None,
            PanelKind::Timing => Some("Timing details"),
            PanelKind::Steps => Some("Steps / Observability"),
            PanelKind::RawJson => Some("Raw JSON"),
        }
    }

    fn color(&self) -> Color {
        match self {
            PanelKind::RunId => Color::DarkGray,
            PanelKind::Timing => Color::Magenta,
            PanelKind::Steps => Color::Blue,
            PanelKind::RawJson => Color::Yellow,
        }
    }
}

/// One annotation block under an assistant turn, as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub kind: PanelKind,
    pub lines: Vec<String>,
}

/// The panels an assistant turn shows under the current preferences.
/// `allow_raw` is set by the question view only.
pub fn assistant_panels(
    meta: &MessageMetadata,
    prefs: &DisplayPrefs,
    allow_raw: bool,
) -> Vec<Panel> {
    let mut panels = Vec::new();

    if prefs.show_run_id {
        if let Some(run_id) = meta.run_id.as_deref().filter(|id| !id.is_empty()) {
            panels.push(Panel {
                kind: PanelKind::RunId,
                lines: vec![format!("run_id: {run_id}")],
            });
        }
    }

    if prefs.show_timing {
        if let Some(timing) = &meta.timing_summary {
            panels.push(Panel {
                kind: PanelKind::Timing,
                lines: timing.panel_lines(),
            });
        }
    }

    if prefs.show_steps {
        if let Some(steps) = &meta.steps_for_observability {
            panels.push(Panel {
                kind: PanelKind::Steps,
                lines: steps.lines().map(str::to_string).collect(),
            });
        }
    }

    if allow_raw && prefs.show_raw_json {
        if let Some(payload) = &meta.payload {
            let pretty =
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            panels.push(Panel {
                kind: PanelKind::RawJson,
                lines: pretty.lines().map(str::to_string).collect(),
            });
        }
    }

    panels
}

impl Panel {
    /// Plain rendering for non-interactive output.
    pub fn to_text(&self) -> Vec<String> {
        match self.kind.title() {
            None => self.lines.clone(),
            Some(title) => std::iter::once(format!("{title}:"))
                .chain(self.lines.iter().map(|l| format!("{PANEL_INDENT}{l}")))
                .collect(),
        }
    }

    /// Styled rendering, wrapped to `width` columns.
    pub fn to_lines(&self, width: usize) -> Vec<Line<'static>> {
        let style = Style::default().fg(self.kind.color());
        let Some(title) = self.kind.title() else {
            return self
                .lines
                .iter()
                .flat_map(|l| wrap_text(l, width))
                .map(|l| Line::from(Span::styled(l, style)))
                .collect();
        };

        let mut out = vec![Line::from(Span::styled(
            format!("▸ {title}"),
            style.add_modifier(Modifier::BOLD),
        ))];
        let inner = width.saturating_sub(PANEL_INDENT.len());
        for line in &self.lines {
            for wrapped in wrap_text(line, inner) {
                out.push(Line::from(vec![
                    Span::styled(PANEL_INDENT, style),
                    Span::styled(wrapped, Style::default().fg(Color::Gray)),
                ]));
            }
        }
        out
    }
}

/// Word wrap to `width` terminal columns. Embedded newlines start new
/// lines; words wider than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let options = textwrap::Options::new(width.max(1))
        .word_splitter(textwrap::WordSplitter::NoHyphenation);

    text.split('\n')
        .flat_map(|raw| {
            textwrap::wrap(raw.trim_end_matches('\r'), &options)
                .into_iter()
                .map(|line| line.into_owned())
        })
        .collect()
}
