//! Non-interactive mode: ask one question, print the answer, exit.

use std::io::Write;

use pq_session::{DisplayPrefs, Profile, Session};

use crate::panels::assistant_panels;
use crate::ConsoleContext;

/// Ask `query` and write the result to `out`. Returns whether the agent
/// produced an answer; errors are printed, not returned.
pub async fn run_oneshot<W: Write>(
    ctx: &ConsoleContext,
    query: &str,
    prefs: DisplayPrefs,
    profile: Option<Profile>,
    out: &mut W,
) -> anyhow::Result<bool> {
    let mut session = Session::new(prefs);
    session.select_profile(profile);

    let ticket = match session.submit(query) {
        Ok(ticket) => ticket,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(false);
        }
    };

    let outcome = ctx.dispatcher.dispatch(ticket.request.clone()).wait().await;
    let Some(reply) = session.complete(&ticket, &outcome) else {
        return Ok(false);
    };

    match &reply.error {
        Some(_) => {
            writeln!(out, "{}", reply.content)?;
            Ok(false)
        }
        None => {
            writeln!(out, "{}", reply.content)?;
            if let Some(meta) = &reply.metadata {
                for panel in assistant_panels(meta, &prefs, true) {
                    writeln!(out)?;
                    for line in panel.to_text() {
                        writeln!(out, "{line}")?;
                    }
                }
            }
            Ok(true)
        }
    }
}
