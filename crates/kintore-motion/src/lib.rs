//! # Kintore-Motion
//!
//! The motion-signal engine behind the Kintore trainer: it turns a stream of
//! pose frames into exercise labels, repetition counts and per-repetition
//! form scores.
//!
//! ## Pipeline
//!
//! 1. **Detection** - [`ExerciseDetector`] votes over a sliding window of
//!    per-frame posture guesses
//! 2. **Counting** - [`RepCounter`] runs a hysteresis state machine over one
//!    joint angle, configured by an [`ExerciseProfile`]
//! 3. **Features** - [`FeatureExtractor`] buffers the frames of each
//!    repetition and scores depth, alignment, symmetry and stability
//! 4. **Aggregation** - [`SessionPayload`] summarizes the session for an
//!    external evaluator
//!
//! Nothing in this crate blocks or fails: malformed frames are skipped and
//! degenerate geometry falls back to neutral values.

pub mod counter;
pub mod detector;
pub mod features;
pub mod goal;
pub mod payload;
pub mod profile;
pub mod scoring;

pub use counter::*;
pub use detector::*;
pub use features::*;
pub use goal::*;
pub use payload::*;
pub use profile::{ExerciseProfile, PUSHUP, SITUP, SQUAT};
pub use scoring::*;
