//! tracing-subscriber setup.
//!
//! The full-screen views own the terminal, so they log to a file or not at
//! all. One-shot runs log to stderr, leaving stdout for the answer.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Discard,
}

impl LogTarget {
    /// Where to log for a run. `interactive` is true for the TUI views.
    pub fn select(interactive: bool, log_file: Option<&Path>) -> Self {
        match (log_file, interactive) {
            (Some(path), _) => Self::File(path.to_path_buf()),
            (None, true) => Self::Discard,
            (None, false) => Self::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init(target: &LogTarget) -> anyhow::Result<()> {
    match target {
        LogTarget::Discard => Ok(()),
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .init();
            Ok(())
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory '{}'", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
            Ok(())
        }
    }
}
