//! Error types for the Kintore form-analysis system.
//!
//! The motion engine itself never fails: short frames, degenerate geometry
//! and empty sessions degrade to neutral values. These errors belong to the
//! session and service layers built on top of it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No exercise selected")]
    NoExerciseSelected,

    #[error("No repetitions recorded in the current session")]
    NoRepetitions,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Scoring service error: {0}")]
    Scoring(String),

    #[error("Session worker has shut down")]
    SessionClosed,

    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
