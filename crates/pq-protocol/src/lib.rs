//! PQ Protocol - Wire types and response interpretation
//!
//! Implements the single request/response contract spoken with the remote
//! agent endpoint: a JSON POST carrying the user's query, answered by a JSON
//! object with the final answer, timing breakdown and observability steps.

pub mod constants;
pub mod error;
pub mod interpret;
pub mod messages;
pub mod timing;

pub use constants::*;
pub use error::*;
pub use interpret::{
    decode_payload, interpret, AgentAnswer, Interpretation, InvokeOutcome, TurnResult,
};
pub use messages::*;
pub use timing::{format_seconds, TimingSummary};
