//! PQ Console - terminal front end for the PQ question-answering agent.
//!
//! Two full-screen layouts share one session store and one dispatcher:
//! [`question_view`] for single questions and [`chat_view`] for multi-turn
//! conversations. [`oneshot`] answers a single `--query` without a terminal.

pub mod chat_view;
pub mod config;
pub mod logging;
pub mod oneshot;
pub mod panels;
pub mod progress;
pub mod question_view;
pub mod tui;

use std::time::Duration;

use pq_client::{Dispatcher, PendingInvocation};
use pq_protocol::InvokeOutcome;
use pq_session::TurnTicket;

pub use chat_view::ChatView;
pub use config::{ConfigError, ConfigFile, ConsoleConfig, InterfaceMode, Overrides};
pub use progress::ProgressPresenter;
pub use question_view::QuestionView;
pub use tui::{run_console, ConsoleView, ViewAction};

/// What every view needs besides its own session.
#[derive(Clone)]
pub struct ConsoleContext {
    pub dispatcher: Dispatcher,
    pub progress: ProgressPresenter,
    /// Shown in the status bar, e.g. the endpoint URL.
    pub agent_label: String,
    pub secret_fingerprint: Option<String>,
}

impl ConsoleContext {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let agent_label = dispatcher.describe();
        Self {
            dispatcher,
            progress: ProgressPresenter::default(),
            agent_label,
            secret_fingerprint: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressPresenter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_secret_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.secret_fingerprint = fingerprint;
        self
    }
}

/// A submitted turn waiting on its background invocation.
pub(crate) struct InFlight {
    ticket: TurnTicket,
    invocation: PendingInvocation,
}

impl InFlight {
    pub(crate) fn start(ctx: &ConsoleContext, ticket: TurnTicket) -> Self {
        let invocation = ctx.dispatcher.dispatch(ticket.request.clone());
        Self { ticket, invocation }
    }

    pub(crate) fn poll(&mut self) -> Option<InvokeOutcome> {
        self.invocation.poll_outcome()
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.invocation.elapsed()
    }

    pub(crate) fn ticket(&self) -> &TurnTicket {
        &self.ticket
    }
}
