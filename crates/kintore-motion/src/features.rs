//! Repetition buffering and feature extraction.
//!
//! The extractor owns one exercise session: the frames of the repetition
//! in progress, the features of every completed repetition and the session
//! label. Repetition boundaries are driven from outside by the counter.

use chrono::{DateTime, Utc};
use kintore_core::stats::round2;
use kintore_core::{frame_angle, torso_lean, ExerciseType, PoseFrame, PoseLandmark, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::payload::{PayloadConfig, SessionPayload};
use crate::scoring::{score_repetition, RepFeatures};

use PoseLandmark::*;

/// Per-frame joint angles in degrees, specific to the exercise.
///
/// `None` marks an angle that could not be measured on that frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "exercise", rename_all = "lowercase")]
pub enum JointAngles {
    Pushup {
        left_elbow: Option<f64>,
        right_elbow: Option<f64>,
        /// Shoulder–hip–ankle, straightness of the plank
        left_body_line: Option<f64>,
        right_body_line: Option<f64>,
    },
    Squat {
        left_knee: Option<f64>,
        right_knee: Option<f64>,
        /// Lean of the shoulder→hip segment from vertical
        torso: Option<f64>,
    },
    Situp {
        left_torso: Option<f64>,
        right_torso: Option<f64>,
    },
    Untracked,
}

impl JointAngles {
    pub fn compute(frame: &PoseFrame, exercise: ExerciseType) -> Self {
        match exercise {
            ExerciseType::Pushup => JointAngles::Pushup {
                left_elbow: frame_angle(frame, [LeftShoulder, LeftElbow, LeftWrist]),
                right_elbow: frame_angle(frame, [RightShoulder, RightElbow, RightWrist]),
                left_body_line: frame_angle(frame, [LeftShoulder, LeftHip, LeftAnkle]),
                right_body_line: frame_angle(frame, [RightShoulder, RightHip, RightAnkle]),
            },
            ExerciseType::Squat => JointAngles::Squat {
                left_knee: frame_angle(frame, [LeftHip, LeftKnee, LeftAnkle]),
                right_knee: frame_angle(frame, [RightHip, RightKnee, RightAnkle]),
                torso: torso_lean(frame),
            },
            ExerciseType::Situp => JointAngles::Situp {
                left_torso: frame_angle(frame, [LeftShoulder, LeftHip, LeftKnee]),
                right_torso: frame_angle(frame, [RightShoulder, RightHip, RightKnee]),
            },
            ExerciseType::Unknown => JointAngles::Untracked,
        }
    }
}

/// A frame held in the repetition buffer
#[derive(Debug, Clone, PartialEq)]
pub struct RepFrame {
    pub pose: PoseFrame,
    pub angles: JointAngles,
}

/// Session-scoped repetition buffer and scorer
#[derive(Debug)]
pub struct FeatureExtractor {
    session_id: SessionId,
    reps: Vec<RepFeatures>,
    buffer: Vec<RepFrame>,
    rep_started_at: Option<Timestamp>,
    frame_count: usize,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            session_id: SessionId::new(),
            reps: Vec::new(),
            buffer: Vec::new(),
            rep_started_at: None,
            frame_count: 0,
        }
    }

    /// Start a fresh session with a new label
    pub fn reset(&mut self) {
        self.session_id = SessionId::new();
        self.reps.clear();
        self.buffer.clear();
        self.rep_started_at = None;
        self.frame_count = 0;
        tracing::debug!(session_id = %self.session_id, "feature session reset");
    }

    /// Begin buffering a new repetition opened at `at`
    pub fn start_rep(&mut self, at: Timestamp) {
        self.buffer.clear();
        self.rep_started_at = Some(at);
    }

    /// Buffer a frame of the repetition in progress.
    ///
    /// Frames without the full 33-point layout are ignored; returns whether
    /// the frame was kept.
    pub fn add_frame(&mut self, frame: &PoseFrame, exercise: ExerciseType) -> bool {
        if !frame.is_complete() {
            return false;
        }

        self.frame_count += 1;
        self.buffer.push(RepFrame {
            angles: JointAngles::compute(frame, exercise),
            pose: frame.clone(),
        });
        true
    }

    /// Close the repetition in progress and record its features.
    ///
    /// Attempts with fewer than two buffered frames, or without a positive
    /// duration, are discarded as noise and return `None`.
    pub fn end_rep(&mut self, exercise: ExerciseType) -> Option<&RepFeatures> {
        let started_at = self.rep_started_at.take();
        let frames = std::mem::take(&mut self.buffer);

        if frames.len() < 2 {
            tracing::debug!(frames = frames.len(), "repetition discarded: too few frames");
            return None;
        }

        let ended_at = frames.last().map(|f| f.pose.timestamp)?;
        let duration_sec = round2(ended_at.secs_since(started_at?));
        if duration_sec <= 0.0 {
            tracing::debug!(duration_sec, "repetition discarded: no elapsed time");
            return None;
        }

        let (metrics, events) = score_repetition(exercise, &frames);
        let rep_index = self.reps.len() as u32 + 1;
        tracing::debug!(
            rep_index,
            duration_sec,
            frames = frames.len(),
            events = events.len(),
            "repetition recorded"
        );

        self.reps.push(RepFeatures {
            rep_index,
            duration_sec,
            metrics,
            events,
        });
        self.reps.last()
    }

    /// Session summary for the scoring collaborator, `None` until a
    /// repetition has been recorded
    pub fn generate_payload(&self, exercise: ExerciseType, config: &PayloadConfig) -> Option<SessionPayload> {
        self.generate_payload_at(exercise, config, Utc::now())
    }

    pub fn generate_payload_at(
        &self,
        exercise: ExerciseType,
        config: &PayloadConfig,
        at: DateTime<Utc>,
    ) -> Option<SessionPayload> {
        SessionPayload::build(&self.session_id, exercise, &self.reps, config, at)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn reps(&self) -> &[RepFeatures] {
        &self.reps
    }

    pub fn buffered_frames(&self) -> &[RepFrame] {
        &self.buffer
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_rep_open(&self) -> bool {
        self.rep_started_at.is_some()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kintore_core::Landmark;

    fn standing_frame(millis: i64) -> PoseFrame {
        let mut landmarks = vec![Landmark::at(0.5, 0.5); PoseLandmark::COUNT];
        landmarks[LeftShoulder.index()] = Landmark::at(0.45, 0.3);
        landmarks[RightShoulder.index()] = Landmark::at(0.55, 0.3);
        landmarks[LeftHip.index()] = Landmark::at(0.45, 0.55);
        landmarks[RightHip.index()] = Landmark::at(0.55, 0.55);
        landmarks[LeftKnee.index()] = Landmark::at(0.45, 0.7);
        landmarks[RightKnee.index()] = Landmark::at(0.55, 0.7);
        landmarks[LeftAnkle.index()] = Landmark::at(0.45, 0.9);
        landmarks[RightAnkle.index()] = Landmark::at(0.55, 0.9);
        PoseFrame::new(landmarks, Timestamp::from_millis(millis))
    }

    #[test]
    fn test_short_frames_are_ignored() {
        let mut extractor = FeatureExtractor::new();
        let short = PoseFrame::new(vec![Landmark::default(); 20], Timestamp::default());

        assert!(!extractor.add_frame(&short, ExerciseType::Squat));
        assert_eq!(extractor.frame_count(), 0);
        assert!(extractor.buffered_frames().is_empty());
    }

    #[test]
    fn test_squat_angles_computed() {
        let angles = JointAngles::compute(&standing_frame(0), ExerciseType::Squat);
        match angles {
            JointAngles::Squat {
                left_knee,
                right_knee,
                torso,
            } => {
                assert!((left_knee.unwrap() - 180.0).abs() < 1e-9);
                assert!((right_knee.unwrap() - 180.0).abs() < 1e-9);
                assert!(torso.unwrap().abs() < 1e-9);
            }
            other => panic!("unexpected angles {other:?}"),
        }
    }

    #[test]
    fn test_single_frame_rep_is_discarded() {
        let mut extractor = FeatureExtractor::new();
        extractor.start_rep(Timestamp::from_millis(0));
        extractor.add_frame(&standing_frame(100), ExerciseType::Squat);

        assert!(extractor.end_rep(ExerciseType::Squat).is_none());
        assert!(extractor.reps().is_empty());
        assert!(extractor.buffered_frames().is_empty());
    }

    #[test]
    fn test_end_rep_records_indexed_features() {
        let mut extractor = FeatureExtractor::new();

        for rep in 0..3 {
            let base = rep * 2_000;
            extractor.start_rep(Timestamp::from_millis(base));
            extractor.add_frame(&standing_frame(base + 500), ExerciseType::Squat);
            extractor.add_frame(&standing_frame(base + 1_234), ExerciseType::Squat);
            let features = extractor.end_rep(ExerciseType::Squat).unwrap();
            assert_eq!(features.rep_index, rep as u32 + 1);
            assert_eq!(features.duration_sec, 1.23);
        }

        assert_eq!(extractor.reps().len(), 3);
        assert_eq!(extractor.frame_count(), 6);
        assert!(!extractor.is_rep_open());
    }

    #[test]
    fn test_rep_without_elapsed_time_is_discarded() {
        let mut extractor = FeatureExtractor::new();
        extractor.start_rep(Timestamp::from_millis(1_000));
        extractor.add_frame(&standing_frame(1_000), ExerciseType::Squat);
        extractor.add_frame(&standing_frame(1_001), ExerciseType::Squat);

        assert!(extractor.end_rep(ExerciseType::Squat).is_none());
    }

    #[test]
    fn test_reset_clears_session() {
        let mut extractor = FeatureExtractor::new();
        extractor.start_rep(Timestamp::from_millis(0));
        extractor.add_frame(&standing_frame(300), ExerciseType::Squat);
        extractor.add_frame(&standing_frame(600), ExerciseType::Squat);
        extractor.end_rep(ExerciseType::Squat);

        extractor.reset();
        assert!(extractor.reps().is_empty());
        assert_eq!(extractor.frame_count(), 0);
        assert!(extractor
            .generate_payload(ExerciseType::Squat, &PayloadConfig::default())
            .is_none());
    }
}
