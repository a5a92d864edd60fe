//! # Kintore-Session
//!
//! Orchestration around the motion engine.
//!
//! - [`WorkoutSession`] - one trainee: auto/manual exercise selection,
//!   targets, resets and evaluation requests
//! - [`NotificationSink`] - where counts and milestones are announced
//! - [`ScoringClient`] - the external evaluator of session payloads
//! - [`SessionHub`] - independent sessions on independent tokio tasks
//!
//! The `kintore-replay` binary replays a JSON-lines landmark recording
//! through a session.

pub mod config;
pub mod events;
pub mod hub;
pub mod scoring;
pub mod session;

pub use self::config::*;
pub use events::*;
pub use hub::*;
pub use scoring::*;
pub use session::*;
