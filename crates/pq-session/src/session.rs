use thiserror::Error;
use uuid::Uuid;

use pq_protocol::{AgentRequest, InvokeOutcome};

use crate::message::Message;
use crate::prefs::DisplayPrefs;
use crate::profile::Profile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Please enter a question.")]
    EmptyQuery,

    #[error("A request is already in progress.")]
    Busy,
}

/// A submitted question, bound to the session it was asked in.
///
/// The request goes to the dispatcher; the ticket comes back to
/// [`Session::complete`] with the outcome.
#[derive(Debug, Clone)]
pub struct TurnTicket {
    pub request: AgentRequest,
    session_id: Uuid,
}

impl TurnTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Transcript and settings for one interactive session.
#[derive(Debug)]
pub struct Session {
    messages: Vec<Message>,
    session_id: Uuid,
    pub prefs: DisplayPrefs,
    selected_profile: Option<Profile>,
    in_flight: bool,
}

impl Session {
    pub fn new(prefs: DisplayPrefs) -> Self {
        let session_id = Uuid::new_v4();
        tracing::debug!(%session_id, "Session started");
        Self {
            messages: Vec::new(),
            session_id,
            prefs,
            selected_profile: None,
            in_flight: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn selected_profile(&self) -> Option<&Profile> {
        self.selected_profile.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Record the user's question and build the request to send.
    ///
    /// The user message is appended before anything is sent. Each request
    /// carries a fresh run id and the selected profile, if any.
    pub fn submit(&mut self, query: &str) -> Result<TurnTicket, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::Busy);
        }
        if query.trim().is_empty() {
            return Err(SubmitError::EmptyQuery);
        }
        let request = AgentRequest::new(query)
            .with_fresh_run_id()
            .with_profile(self.selected_profile.as_ref().map(|p| p.id.as_str()));

        self.messages.push(Message::user(request.query.clone()));
        self.in_flight = true;

        tracing::info!(
            session_id = %self.session_id,
            run_id = ?request.run_id,
            profile = ?request.user_profile_id,
            "Question submitted"
        );

        Ok(TurnTicket {
            request,
            session_id: self.session_id,
        })
    }

    /// Append the assistant turn for a finished request.
    ///
    /// Returns `None` and leaves the transcript untouched when the ticket
    /// belongs to a session that has since been reset.
    pub fn complete(&mut self, ticket: &TurnTicket, outcome: &InvokeOutcome) -> Option<&Message> {
        if ticket.session_id != self.session_id {
            tracing::debug!(
                ticket_session = %ticket.session_id,
                session_id = %self.session_id,
                "Dropping result for a previous session"
            );
            return None;
        }

        let message = Message::from_turn(outcome.interpret());
        if message.is_error() {
            tracing::warn!(
                run_id = ?ticket.request.run_id,
                content = %message.content,
                "Turn failed"
            );
        } else {
            tracing::debug!(run_id = ?ticket.request.run_id, "Turn answered");
        }

        self.in_flight = false;
        self.messages.push(message);
        self.messages.last()
    }

    /// Clear the transcript and start over under a new session id.
    pub fn new_session(&mut self) {
        let previous = self.session_id;
        let mut next = Uuid::new_v4();
        while next == previous {
            next = Uuid::new_v4();
        }
        self.session_id = next;
        self.messages.clear();
        self.in_flight = false;
        tracing::info!(%previous, session_id = %next, "New session");
    }

    /// Drop finished turns while keeping the session id. Refused while a
    /// request is in flight, since its question is still in the transcript.
    pub fn forget_history(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.messages.clear();
        true
    }

    /// Change the selected profile. A different selection starts a new
    /// session; re-selecting the current one does nothing. Returns whether
    /// the session was reset.
    pub fn select_profile(&mut self, profile: Option<Profile>) -> bool {
        let current = self.selected_profile.as_ref().map(|p| p.id.as_str());
        let requested = profile.as_ref().map(|p| p.id.as_str());
        if current == requested {
            return false;
        }
        tracing::info!(from = ?current, to = ?requested, "Profile changed");
        self.selected_profile = profile;
        self.new_session();
        true
    }

    /// The most recent question and, once it has finished, its answer.
    pub fn last_exchange(&self) -> Option<(&Message, Option<&Message>)> {
        use crate::message::Role;

        let user_idx = self.messages.iter().rposition(|m| m.role == Role::User)?;
        let reply = self
            .messages
            .get(user_idx + 1)
            .filter(|m| m.role == Role::Assistant);
        Some((&self.messages[user_idx], reply))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DisplayPrefs::default())
    }
}
