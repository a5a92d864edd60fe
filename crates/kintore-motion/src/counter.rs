//! Repetition counting.
//!
//! One hysteresis state machine, parameterized by an [`ExerciseProfile`].
//! Per frame:
//!
//! 1. Measure the profile's joint angle
//! 2. Once armed, hand the frame to the feature extractor
//! 3. Above the baseline threshold, enter the baseline stage and close the
//!    repetition if the previous stage was the counted one
//! 4. Below the counted threshold while in the baseline stage, enter the
//!    counted stage, open a repetition and increment the count
//!
//! The dead zone between the two thresholds keeps jitter around a single
//! cutoff from producing extra counts.

use chrono::{DateTime, Utc};
use kintore_core::{frame_angle, ExerciseType, PoseFrame, Stage};
use serde::{Deserialize, Serialize};

use crate::features::FeatureExtractor;
use crate::goal::{GoalEvent, GoalTracker};
use crate::payload::{PayloadConfig, SessionPayload};
use crate::profile::ExerciseProfile;
use crate::scoring::RepFeatures;

/// What one processed frame did to the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// Tracked joint angle, `None` when it could not be measured
    pub angle: Option<f64>,
    pub stage: Option<Stage>,
    pub count: u32,
    /// True when this frame incremented the count
    pub counted: bool,
    /// Repetition closed by this frame
    pub completed_rep: Option<RepFeatures>,
    pub goal: Option<GoalEvent>,
}

#[derive(Debug)]
pub struct RepCounter {
    exercise: ExerciseType,
    profile: Option<&'static ExerciseProfile>,
    count: u32,
    stage: Option<Stage>,
    extractor: FeatureExtractor,
    goal: GoalTracker,
}

impl RepCounter {
    pub fn new(exercise: ExerciseType) -> Self {
        Self {
            exercise,
            profile: ExerciseProfile::for_exercise(exercise),
            count: 0,
            stage: None,
            extractor: FeatureExtractor::new(),
            goal: GoalTracker::new(),
        }
    }

    /// Feed one frame.
    ///
    /// Returns `None` when no exercise is selected or the frame is too short
    /// to carry the tracked joints.
    pub fn process(&mut self, frame: &PoseFrame) -> Option<FrameOutcome> {
        let profile = self.profile?;
        if frame.landmarks.len() < profile.required_landmarks() {
            return None;
        }

        let angle = frame_angle(frame, profile.joints);
        Some(self.advance(profile, frame, angle))
    }

    /// Feed one frame with an externally measured angle
    pub fn process_with_angle(&mut self, frame: &PoseFrame, angle: f64) -> Option<FrameOutcome> {
        let profile = self.profile?;
        Some(self.advance(profile, frame, Some(angle)))
    }

    fn advance(&mut self, profile: &ExerciseProfile, frame: &PoseFrame, angle: Option<f64>) -> FrameOutcome {
        if self.stage.is_some() {
            self.extractor.add_frame(frame, profile.exercise);
        }

        let mut outcome = FrameOutcome {
            angle,
            stage: self.stage,
            count: self.count,
            counted: false,
            completed_rep: None,
            goal: None,
        };

        let Some(angle) = angle else {
            return outcome;
        };

        let previous = self.stage;
        if angle > profile.baseline_above {
            self.stage = Some(profile.baseline);
            if previous == Some(profile.counted) {
                outcome.completed_rep = self.extractor.end_rep(profile.exercise).cloned();
            }
        }

        if angle < profile.counted_below && self.stage == Some(profile.baseline) {
            self.stage = Some(profile.counted);
            self.extractor.start_rep(frame.timestamp);
            self.count += 1;
            outcome.counted = true;
            outcome.goal = self.goal.on_count(self.count);
            tracing::debug!(exercise = %profile.exercise, count = self.count, angle, "repetition counted");
        }

        outcome.stage = self.stage;
        outcome.count = self.count;
        outcome
    }

    /// Zero the count, disarm the state machine and start a new feature
    /// session. The target stays set but its milestones are re-armed.
    pub fn reset(&mut self) {
        self.count = 0;
        self.stage = None;
        self.extractor.reset();
        self.goal.rearm();
    }

    /// Switch the tracked exercise, resetting the counter
    pub fn set_exercise(&mut self, exercise: ExerciseType) {
        self.exercise = exercise;
        self.profile = ExerciseProfile::for_exercise(exercise);
        self.reset();
    }

    pub fn set_target(&mut self, target: u32) {
        self.goal.set_target(target);
    }

    pub fn generate_payload(&self, config: &PayloadConfig) -> Option<SessionPayload> {
        self.extractor.generate_payload(self.exercise, config)
    }

    pub fn generate_payload_at(&self, config: &PayloadConfig, at: DateTime<Utc>) -> Option<SessionPayload> {
        self.extractor.generate_payload_at(self.exercise, config, at)
    }

    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn target(&self) -> Option<u32> {
        self.goal.target()
    }

    pub fn goal(&self) -> &GoalTracker {
        &self.goal
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn reps(&self) -> &[RepFeatures] {
        self.extractor.reps()
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new(ExerciseType::Unknown)
    }
}
