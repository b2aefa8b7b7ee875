use serde::{Deserialize, Serialize};

/// What to show next to each assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    pub show_timing: bool,
    pub show_steps: bool,
    pub show_run_id: bool,
    /// Question view only.
    pub show_raw_json: bool,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            show_timing: true,
            show_steps: true,
            show_run_id: true,
            show_raw_json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayToggle {
    Timing,
    Steps,
    RunId,
    RawJson,
}

impl DisplayToggle {
    pub const ALL: [DisplayToggle; 4] = [
        DisplayToggle::Timing,
        DisplayToggle::Steps,
        DisplayToggle::RunId,
        DisplayToggle::RawJson,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DisplayToggle::Timing => "Show timing details",
            DisplayToggle::Steps => "Show observability steps",
            DisplayToggle::RunId => "Show run IDs",
            DisplayToggle::RawJson => "Show raw JSON",
        }
    }
}

impl DisplayPrefs {
    pub fn get(&self, toggle: DisplayToggle) -> bool {
        match toggle {
            DisplayToggle::Timing => self.show_timing,
            DisplayToggle::Steps => self.show_steps,
            DisplayToggle::RunId => self.show_run_id,
            DisplayToggle::RawJson => self.show_raw_json,
        }
    }

    /// Flip one preference and return its new value.
    pub fn toggle(&mut self, toggle: DisplayToggle) -> bool {
        let slot = match toggle {
            DisplayToggle::Timing => &mut self.show_timing,
            DisplayToggle::Steps => &mut self.show_steps,
            DisplayToggle::RunId => &mut self.show_run_id,
            DisplayToggle::RawJson => &mut self.show_raw_json,
        };
        *slot = !*slot;
        *slot
    }
}
