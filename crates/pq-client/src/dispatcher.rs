//! Background dispatch of agent invocations.
//!
//! Each submission is spawned onto its own tokio task so the interface keeps
//! redrawing while the agent works. The task writes exactly one
//! [`InvokeOutcome`] into a oneshot channel; the caller either polls it on
//! its render tick or awaits it. There is no cancellation: dropping the
//! [`PendingInvocation`] abandons the task and its result is never read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot::{self, error::TryRecvError};

use pq_protocol::{AgentRequest, InvokeOutcome};

use crate::transport::AgentTransport;

/// Spawns invocations against a shared transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn AgentTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    /// Start one invocation in the background. Must be called from within a
    /// tokio runtime.
    pub fn dispatch(&self, request: AgentRequest) -> PendingInvocation {
        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let run_id = request.run_id.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match transport.invoke(&request).await {
                Ok(response) => {
                    tracing::info!(
                        run_id = ?request.run_id,
                        status = response.status,
                        content_type = %response.content_type,
                        bytes = response.body.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Agent invocation completed"
                    );
                    InvokeOutcome::Completed {
                        status: response.status,
                        content_type: response.content_type,
                        text: response.body,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = ?request.run_id,
                        kind = e.kind(),
                        error = %e,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Agent invocation failed"
                    );
                    InvokeOutcome::failed(e.kind(), &e)
                }
            };

            if tx.send(outcome).is_err() {
                tracing::debug!(run_id = ?request.run_id, "Invocation result abandoned");
            }
        });

        PendingInvocation {
            rx,
            started: Instant::now(),
            run_id,
        }
    }
}

/// Handle to one in-flight invocation.
pub struct PendingInvocation {
    rx: oneshot::Receiver<InvokeOutcome>,
    started: Instant,
    run_id: Option<String>,
}

impl PendingInvocation {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Non-blocking check for the outcome. Returns `Some` once; the handle
    /// should be dropped afterwards.
    pub fn poll_outcome(&mut self) -> Option<InvokeOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(aborted()),
        }
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> InvokeOutcome {
        self.rx.await.unwrap_or_else(|_| aborted())
    }
}

fn aborted() -> InvokeOutcome {
    InvokeOutcome::failed("TaskAborted", "background invocation ended without a result")
}
