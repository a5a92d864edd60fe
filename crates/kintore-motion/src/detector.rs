//! Automatic exercise recognition.
//!
//! Each frame is scored against a coarse body-posture heuristic per
//! exercise. The per-frame winner is pushed into a sliding window and a
//! label is confirmed only once it holds a clear majority of that window.
//!
//! ## Posture heuristics
//!
//! - Push-up: shoulder and ankle at the same height (horizontal body), bonus
//!   when the wrist is below the shoulder
//! - Sit-up: knee above the hip, bonus when the shoulder is near hip height
//! - Squat: shoulder and ankle vertically stacked

use std::collections::VecDeque;

use kintore_core::{ExerciseType, PoseFrame, PoseLandmark};
use serde::{Deserialize, Serialize};

/// Sliding-window configuration of the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of per-frame labels kept in the window
    pub window_capacity: usize,
    /// Labels required before any confirmation is attempted
    pub min_samples: usize,
    /// Share of the current window the leading label must reach
    pub majority_ratio: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_capacity: 30,
            min_samples: 10,
            majority_ratio: 0.6,
        }
    }
}

/// Heuristic posture scores of one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseScores {
    pub pushup: f64,
    pub situp: f64,
    pub squat: f64,
}

impl ExerciseScores {
    pub fn of(frame: &PoseFrame) -> Option<Self> {
        let shoulder = frame.get(PoseLandmark::LeftShoulder)?;
        let wrist = frame.get(PoseLandmark::LeftWrist)?;
        let hip = frame.get(PoseLandmark::LeftHip)?;
        let knee = frame.get(PoseLandmark::LeftKnee)?;
        let ankle = frame.get(PoseLandmark::LeftAnkle)?;

        let horizontal = 100.0 - (shoulder.y - ankle.y).abs() * 200.0;
        let hands_down = if wrist.y > shoulder.y { 50.0 } else { 0.0 };

        let knee_bent = if knee.y < hip.y { 50.0 } else { 0.0 };
        let lying_down = if shoulder.y > hip.y * 0.8 { 50.0 } else { 0.0 };

        let vertical = 100.0 - (shoulder.x - ankle.x).abs() * 200.0;

        Some(Self {
            pushup: (horizontal + hands_down).max(0.0),
            situp: knee_bent + lying_down,
            squat: vertical.max(0.0),
        })
    }

    pub fn get(&self, exercise: ExerciseType) -> f64 {
        match exercise {
            ExerciseType::Pushup => self.pushup,
            ExerciseType::Situp => self.situp,
            ExerciseType::Squat => self.squat,
            ExerciseType::Unknown => 0.0,
        }
    }

    /// Highest-scoring candidate; on a tie the later candidate wins
    pub fn best(&self) -> ExerciseType {
        let mut best = ExerciseType::CANDIDATES[0];
        for candidate in &ExerciseType::CANDIDATES[1..] {
            if self.get(*candidate) >= self.get(best) {
                best = *candidate;
            }
        }
        best
    }
}

/// Majority-vote exercise detector over a sliding window of frame labels
#[derive(Debug, Clone)]
pub struct ExerciseDetector {
    config: DetectorConfig,
    window: VecDeque<ExerciseType>,
}

impl ExerciseDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let window = VecDeque::with_capacity(config.window_capacity);
        Self { config, window }
    }

    /// Classify one frame and return the confirmed exercise, if any.
    ///
    /// Frames without the full 33-point layout are ignored and leave the
    /// window untouched.
    pub fn detect(&mut self, frame: &PoseFrame) -> Option<ExerciseType> {
        let label = Self::classify(frame)?;
        self.push_label(label)
    }

    /// Per-frame winner, without touching the window
    pub fn classify(frame: &PoseFrame) -> Option<ExerciseType> {
        if !frame.is_complete() {
            return None;
        }
        ExerciseScores::of(frame).map(|scores| scores.best())
    }

    /// Record one label and re-evaluate the window
    pub fn push_label(&mut self, label: ExerciseType) -> Option<ExerciseType> {
        self.window.push_back(label);
        while self.window.len() > self.config.window_capacity {
            self.window.pop_front();
        }
        self.confirmed()
    }

    /// Leading label when the window is full enough and it holds at least
    /// `majority_ratio` of the window
    pub fn confirmed(&self) -> Option<ExerciseType> {
        if self.window.len() < self.config.min_samples {
            return None;
        }

        let (leader, count) = ExerciseType::CANDIDATES
            .iter()
            .map(|c| (*c, self.window.iter().filter(|l| *l == c).count()))
            .max_by_key(|(_, count)| *count)?;

        if count as f64 >= self.window.len() as f64 * self.config.majority_ratio {
            Some(leader)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl Default for ExerciseDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
