//! # Kintore-Core
//!
//! Core types and utilities for the Kintore bodyweight-exercise form
//! analysis system: the landmark data model, exercise identifiers,
//! joint-angle geometry and descriptive statistics.

pub mod error;
pub mod geometry;
pub mod stats;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
