//! PQ Session - per-session state behind both console views.
//!
//! A [`Session`] owns the ordered transcript, the session identifier, the
//! display preferences and the selected profile. It is created when a view
//! starts, mutated by user actions and completed requests, and dropped on
//! exit. Nothing is persisted.

pub mod message;
pub mod prefs;
pub mod profile;
pub mod session;

pub use message::{Message, MessageMetadata, Role, TurnError};
pub use prefs::{DisplayPrefs, DisplayToggle};
pub use profile::{Profile, ProfileDirectory};
pub use session::{Session, SubmitError, TurnTicket};
