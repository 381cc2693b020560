//! # intentlayer-session
//!
//! Owns every [`Session`](intentlayer_core::Session) and
//! [`UserProfile`](intentlayer_core::UserProfile) of the process.
//!
//! Each session sits behind its own lock, so appends to different sessions
//! never contend, even for the same user. Each user record has a lock too,
//! held only for short in-memory updates. Profile writers (turn recording,
//! session creation, preference updates, user deletion) additionally take a
//! per-user profile gate for their whole write. Lock order: profile gate,
//! then user record, then session; a session lock is never held while
//! waiting for a user record.

mod analytics;
mod maintenance;
mod memory;
mod store;
mod user_record;

pub use analytics::SessionAnalytics;
pub use maintenance::PruneReport;
pub use memory::{HistoryMatch, MemoryStats};
pub use store::{SessionCreated, SessionStore};
