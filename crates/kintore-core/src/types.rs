//! Fundamental types for the Kintore form-analysis system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session label derived from the wall clock at session start
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Compact `YYYYMMDDhhmmssSSS` label, unique per millisecond
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y%m%d%H%M%S%3f").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Pose estimators usually report frame times in milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1e9) as i64)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is later)
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1e9
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// One body joint reported by the pose estimator, in normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Fully visible landmark on the image plane
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }
}

/// 33-point body landmark layout (BlazePose / MediaPipe Pose order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One timestamped snapshot of all landmarks from the upstream producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub landmarks: Vec<Landmark>,
    pub timestamp: Timestamp,
}

impl PoseFrame {
    pub fn new(landmarks: Vec<Landmark>, timestamp: Timestamp) -> Self {
        Self {
            landmarks,
            timestamp,
        }
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.landmarks.get(landmark.index())
    }

    /// True when the frame carries the full 33-point layout
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= PoseLandmark::COUNT
    }
}

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Pushup,
    Situp,
    Squat,
    #[default]
    Unknown,
}

impl ExerciseType {
    /// Candidates considered by auto-detection, in tie-break order
    pub const CANDIDATES: [ExerciseType; 3] =
        [ExerciseType::Pushup, ExerciseType::Situp, ExerciseType::Squat];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Pushup => "pushup",
            ExerciseType::Situp => "situp",
            ExerciseType::Squat => "squat",
            ExerciseType::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ExerciseType::Unknown)
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExerciseType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pushup" | "push-up" | "push_up" => Ok(ExerciseType::Pushup),
            "situp" | "sit-up" | "sit_up" => Ok(ExerciseType::Situp),
            "squat" => Ok(ExerciseType::Squat),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown exercise '{other}'"
            ))),
        }
    }
}

/// Position of the tracked joint. Semantics are exercise-specific: for
/// push-ups and squats `Up` is extended, for sit-ups `Up` is crunched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Up,
    Down,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Up => f.write_str("UP"),
            Stage::Down => f.write_str("DOWN"),
        }
    }
}
