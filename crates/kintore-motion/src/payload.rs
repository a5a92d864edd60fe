//! Session-level aggregation into the evaluation payload.

use chrono::{DateTime, Utc};
use kintore_core::stats::{coefficient_of_variation, max, mean, min, round2};
use kintore_core::{ExerciseType, SessionId};
use serde::{Deserialize, Serialize};

use crate::scoring::{Metric, RepFeatures, RepMetrics};

pub const TREND_DEGRADING: &str = "form degrading in the second half";
pub const TREND_IMPROVING: &str = "form improving toward the end";

/// Minimum gap between half-session headline means to report a trend
const TREND_MARGIN: f64 = 0.1;

/// Static metadata stamped onto every payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub user_id: String,
    /// Assumed camera frame rate
    pub fps: u32,
    pub camera_view: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            fps: 30,
            camera_view: "webcam".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMeta {
    pub user_id: String,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub camera_view: String,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalContext {
    pub priority: String,
    pub context: String,
}

impl Default for GoalContext {
    fn default() -> Self {
        Self {
            priority: "form_and_safety".to_string(),
            context: "home_training_no_equipment".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TempoStats {
    pub mean_sec_per_rep: f64,
    /// Coefficient of variation of repetition durations
    pub cv: f64,
}

impl TempoStats {
    pub fn from_reps(reps: &[RepFeatures]) -> Self {
        let durations: Vec<f64> = reps
            .iter()
            .map(|r| r.duration_sec)
            .filter(|d| *d > 0.0)
            .collect();

        if durations.is_empty() {
            return Self::default();
        }

        Self {
            mean_sec_per_rep: round2(mean(&durations)),
            cv: round2(coefficient_of_variation(&durations)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    /// Statistics over the repetitions where the metric is defined
    pub fn from_reps<F>(reps: &[RepFeatures], pick: F) -> Self
    where
        F: Fn(&RepMetrics) -> &Metric,
    {
        let values: Vec<f64> = reps.iter().filter_map(|r| pick(&r.metrics).value).collect();

        match (min(&values), max(&values)) {
            (Some(lo), Some(hi)) => Self {
                mean: round2(mean(&values)),
                min: round2(lo),
                max: round2(hi),
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallStats {
    pub tempo: TempoStats,
    pub depth: MetricStats,
    pub alignment: MetricStats,
    pub symmetry: MetricStats,
    pub stability: MetricStats,
}

impl OverallStats {
    pub fn from_reps(reps: &[RepFeatures]) -> Self {
        Self {
            tempo: TempoStats::from_reps(reps),
            depth: MetricStats::from_reps(reps, |m| &m.depth),
            alignment: MetricStats::from_reps(reps, |m| &m.alignment),
            symmetry: MetricStats::from_reps(reps, |m| &m.symmetry),
            stability: MetricStats::from_reps(reps, |m| &m.stability),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Highlights {
    pub best_rep_index: u32,
    pub worst_rep_index: u32,
    pub trend: Vec<String>,
}

impl Highlights {
    pub fn from_reps(reps: &[RepFeatures]) -> Self {
        let scores: Vec<(u32, f64)> = reps
            .iter()
            .map(|r| (r.rep_index, r.metrics.headline_score()))
            .collect();
        Self::from_scores(&scores)
    }

    /// Best/worst by headline score (first occurrence wins ties) and the
    /// first-half versus second-half trend
    pub fn from_scores(scores: &[(u32, f64)]) -> Self {
        let Some(&first) = scores.first() else {
            return Self::default();
        };

        let mut best = first;
        let mut worst = first;
        for &entry in &scores[1..] {
            if entry.1 > best.1 {
                best = entry;
            }
            if entry.1 < worst.1 {
                worst = entry;
            }
        }

        let mut trend = Vec::new();
        if scores.len() >= 3 {
            let half = scores.len() / 2;
            let values: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();
            let first_half = mean(&values[..half]);
            let second_half = mean(&values[half..]);

            if second_half < first_half - TREND_MARGIN {
                trend.push(TREND_DEGRADING.to_string());
            } else if second_half > first_half + TREND_MARGIN {
                trend.push(TREND_IMPROVING.to_string());
            }
        }

        Self {
            best_rep_index: best.0,
            worst_rep_index: worst.0,
            trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadNotes {
    pub visibility_quality: String,
    pub warnings: Vec<String>,
}

impl Default for PayloadNotes {
    fn default() -> Self {
        Self {
            visibility_quality: "ok".to_string(),
            warnings: Vec::new(),
        }
    }
}

/// Evaluation request handed to the external scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub meta: PayloadMeta,
    pub exercise: ExerciseType,
    pub goal: GoalContext,
    pub reps: usize,
    pub rep_summaries: Vec<RepFeatures>,
    pub overall_stats: OverallStats,
    pub highlights: Highlights,
    pub notes: PayloadNotes,
}

impl SessionPayload {
    /// `None` when no repetition has been recorded
    pub fn build(
        session_id: &SessionId,
        exercise: ExerciseType,
        reps: &[RepFeatures],
        config: &PayloadConfig,
        at: DateTime<Utc>,
    ) -> Option<Self> {
        if reps.is_empty() {
            return None;
        }

        Some(Self {
            meta: PayloadMeta {
                user_id: config.user_id.clone(),
                session_id: session_id.clone(),
                timestamp: at,
                camera_view: config.camera_view.clone(),
                fps: config.fps,
            },
            exercise,
            goal: GoalContext::default(),
            reps: reps.len(),
            rep_summaries: reps.to_vec(),
            overall_stats: OverallStats::from_reps(reps),
            highlights: Highlights::from_reps(reps),
            notes: PayloadNotes::default(),
        })
    }

    pub fn to_json(&self) -> kintore_core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
