//! Synthetic progress shown while a request is outstanding.
//!
//! The labels are presentation only; they follow wall-clock time and say
//! nothing about what the agent is actually doing.

use std::time::Duration;

pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const DEFAULT_PHASES: [&str; 5] = [
    "Analysing",
    "Planning",
    "Retrieving",
    "Consolidating",
    "Writing",
];

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ProgressPresenter {
    phases: Vec<String>,
    interval: Duration,
    tick: usize,
}

impl Default for ProgressPresenter {
    fn default() -> Self {
        Self::new(
            DEFAULT_PHASES.iter().map(|p| p.to_string()).collect(),
            DEFAULT_INTERVAL,
        )
    }
}

impl ProgressPresenter {
    /// An empty phase list or zero interval falls back to the defaults.
    pub fn new(phases: Vec<String>, interval: Duration) -> Self {
        let phases = if phases.is_empty() {
            DEFAULT_PHASES.iter().map(|p| p.to_string()).collect()
        } else {
            phases
        };
        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };
        Self {
            phases,
            interval,
            tick: 0,
        }
    }

    /// The label for `elapsed` time since submission. The last label is
    /// held for as long as the request keeps running.
    pub fn label_at(&self, elapsed: Duration) -> &str {
        let step = (elapsed.as_millis() / self.interval.as_millis().max(1)) as usize;
        let idx = step.min(self.phases.len() - 1);
        &self.phases[idx]
    }

    /// Advance the spinner by one frame. Called once per UI tick.
    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }

    /// `"⠹ Planning… (4s)"`
    pub fn status_line(&self, elapsed: Duration) -> String {
        format!(
            "{} {}… ({}s)",
            self.spinner(),
            self.label_at(elapsed),
            elapsed.as_secs()
        )
    }

    /// A fresh presenter with the same phases and interval.
    pub fn restart(&self) -> Self {
        Self {
            phases: self.phases.clone(),
            interval: self.interval,
            tick: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_advance_on_the_interval() {
        let progress = ProgressPresenter::default();
        assert_eq!(progress.label_at(Duration::ZERO), "Analysing");
        assert_eq!(progress.label_at(Duration::from_millis(2999)), "Analysing");
        assert_eq!(progress.label_at(Duration::from_secs(3)), "Planning");
        assert_eq!(progress.label_at(Duration::from_secs(12)), "Writing");
    }

    #[test]
    fn last_label_holds_until_completion() {
        let progress = ProgressPresenter::default();
        assert_eq!(progress.label_at(Duration::from_secs(600)), "Writing");
    }

    #[test]
    fn custom_phases_and_interval() {
        let progress =
            ProgressPresenter::new(vec!["One".into(), "Two".into()], Duration::from_millis(500));
        assert_eq!(progress.label_at(Duration::from_millis(499)), "One");
        assert_eq!(progress.label_at(Duration::from_millis(500)), "Two");
        assert_eq!(progress.label_at(Duration::from_secs(5)), "Two");
    }

    #[test]
    fn empty_phase_list_falls_back_to_defaults() {
        let progress = ProgressPresenter::new(Vec::new(), Duration::ZERO);
        assert_eq!(progress.label_at(Duration::from_secs(3)), "Planning");
    }

    #[test]
    fn spinner_cycles_through_frames() {
        let mut progress = ProgressPresenter::default();
        let first = progress.spinner();
        for _ in 0..SPINNER_FRAMES.len() {
            progress.advance();
        }
        assert_eq!(progress.spinner(), first);
        progress.advance();
        assert_ne!(progress.spinner(), first);
    }

    #[test]
    fn status_line_shows_label_and_seconds() {
        let progress = ProgressPresenter::default();
        assert_eq!(progress.status_line(Duration::from_secs(4)), "⠋ Planning… (4s)");
    }
}
