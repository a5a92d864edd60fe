//! Per-exercise counting profiles.
//!
//! Every exercise is counted by the same hysteresis state machine; only the
//! tracked joint triple, the two thresholds and the stage polarity differ.

use kintore_core::{ExerciseType, PoseLandmark, Stage};

/// Joint triple, thresholds and stage polarity of one exercise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseProfile {
    pub exercise: ExerciseType,
    /// Tracked angle, vertex in the middle
    pub joints: [PoseLandmark; 3],
    /// Stage entered when the angle rises above `baseline_above`
    pub baseline: Stage,
    pub baseline_above: f64,
    /// Stage entered (and counted) when the angle falls below
    /// `counted_below` while in the baseline stage
    pub counted: Stage,
    pub counted_below: f64,
}

pub const PUSHUP: ExerciseProfile = ExerciseProfile {
    exercise: ExerciseType::Pushup,
    joints: [PoseLandmark::LeftShoulder, PoseLandmark::LeftElbow, PoseLandmark::LeftWrist],
    baseline: Stage::Up,
    baseline_above: 160.0,
    counted: Stage::Down,
    counted_below: 90.0,
};

/// Sit-ups are inverted: lying flat is the baseline, the crunch is counted
pub const SITUP: ExerciseProfile = ExerciseProfile {
    exercise: ExerciseType::Situp,
    joints: [PoseLandmark::LeftShoulder, PoseLandmark::LeftHip, PoseLandmark::LeftKnee],
    baseline: Stage::Down,
    baseline_above: 140.0,
    counted: Stage::Up,
    counted_below: 70.0,
};

pub const SQUAT: ExerciseProfile = ExerciseProfile {
    exercise: ExerciseType::Squat,
    joints: [PoseLandmark::LeftHip, PoseLandmark::LeftKnee, PoseLandmark::LeftAnkle],
    baseline: Stage::Up,
    baseline_above: 160.0,
    counted: Stage::Down,
    counted_below: 90.0,
};

impl ExerciseProfile {
    pub fn for_exercise(exercise: ExerciseType) -> Option<&'static ExerciseProfile> {
        match exercise {
            ExerciseType::Pushup => Some(&PUSHUP),
            ExerciseType::Situp => Some(&SITUP),
            ExerciseType::Squat => Some(&SQUAT),
            ExerciseType::Unknown => None,
        }
    }

    /// Landmarks a frame must carry to measure the tracked angle
    pub fn required_landmarks(&self) -> usize {
        self.joints.iter().map(|j| j.index()).max().unwrap_or(0) + 1
    }
}
