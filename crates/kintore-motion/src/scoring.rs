//! Per-repetition movement-quality scoring.
//!
//! Every metric is a value in [0, 1] (rounded to two decimals) plus a short
//! diagnostic note. Out-of-range movement additionally raises a
//! [`FormEvent`] tag for downstream coaching.
//!
//! ## Headline metrics
//!
//! `depth`, `alignment`, `symmetry` and `stability` are filled for every
//! exercise so repetitions can be compared across a session. Where an
//! exercise has no independent signal for a headline metric it reuses a
//! measured one:
//!
//! - Squat: `alignment` and `symmetry` carry the knee-tracking score
//! - Sit-up: `depth` carries range of motion, `alignment` carries control

use kintore_core::stats::{mean, std_dev, unit_score};
use kintore_core::{shoulder_midpoint, ExerciseType};
use serde::{Deserialize, Serialize};

use crate::features::{JointAngles, RepFrame};

/// Shoulder jitter (normalized image units) that maps to a stability of 0
pub const STABILITY_JITTER_BUDGET: f64 = 0.1;

/// One scored quality metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    pub value: Option<f64>,
    pub note: String,
}

impl Metric {
    /// Clamp into [0, 1], round and attach a note
    pub fn scored(raw: f64, note: impl Into<String>) -> Self {
        Self {
            value: Some(unit_score(raw)),
            note: note.into(),
        }
    }

    /// Headline default before an exercise fills the metric in
    pub fn zero() -> Self {
        Self {
            value: Some(0.0),
            note: String::new(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

/// Detected form faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormEvent {
    ShallowDepth,
    HipsSagAtBottom,
    AsymmetricMovement,
    ShallowSquat,
    KneeValgus,
    TorsoCollapse,
    IncompleteLowering,
    MomentumBounce,
}

impl FormEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormEvent::ShallowDepth => "shallow_depth",
            FormEvent::HipsSagAtBottom => "hips_sag_at_bottom",
            FormEvent::AsymmetricMovement => "asymmetric_movement",
            FormEvent::ShallowSquat => "shallow_squat",
            FormEvent::KneeValgus => "knee_valgus",
            FormEvent::TorsoCollapse => "torso_collapse",
            FormEvent::IncompleteLowering => "incomplete_lowering",
            FormEvent::MomentumBounce => "momentum_bounce",
        }
    }
}

/// Named metrics of one repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepMetrics {
    pub depth: Metric,
    pub alignment: Metric,
    pub symmetry: Metric,
    pub stability: Metric,
    pub knee_tracking: Metric,
    pub torso_angle: Metric,
    pub rom: Metric,
    pub control: Metric,
}

impl Default for RepMetrics {
    fn default() -> Self {
        Self {
            depth: Metric::zero(),
            alignment: Metric::zero(),
            symmetry: Metric::zero(),
            stability: Metric::zero(),
            knee_tracking: Metric::default(),
            torso_angle: Metric::default(),
            rom: Metric::default(),
            control: Metric::default(),
        }
    }
}

impl RepMetrics {
    pub fn headline(&self) -> [&Metric; 4] {
        [&self.depth, &self.alignment, &self.symmetry, &self.stability]
    }

    /// Mean of the defined headline values, 0 when none is defined
    pub fn headline_score(&self) -> f64 {
        let values: Vec<f64> = self.headline().iter().filter_map(|m| m.value).collect();
        mean(&values)
    }
}

/// Features of one completed repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepFeatures {
    /// 1-based, contiguous within a session
    pub rep_index: u32,
    pub duration_sec: f64,
    #[serde(flatten)]
    pub metrics: RepMetrics,
    pub events: Vec<FormEvent>,
}

impl RepFeatures {
    pub fn has_event(&self, event: FormEvent) -> bool {
        self.events.contains(&event)
    }
}

/// Score the buffered frames of one repetition
pub fn score_repetition(exercise: ExerciseType, frames: &[RepFrame]) -> (RepMetrics, Vec<FormEvent>) {
    let mut metrics = RepMetrics::default();
    let mut events = Vec::new();

    if frames.is_empty() {
        return (metrics, events);
    }

    match exercise {
        ExerciseType::Pushup => score_pushup(frames, &mut metrics, &mut events),
        ExerciseType::Squat => score_squat(frames, &mut metrics, &mut events),
        ExerciseType::Situp => score_situp(frames, &mut metrics, &mut events),
        ExerciseType::Unknown => {}
    }
    metrics.stability = stability(frames);

    (metrics, events)
}

/// Collect one angle series; missing angles fall back to `neutral`
fn series<F>(frames: &[RepFrame], neutral: f64, pick: F) -> Vec<f64>
where
    F: Fn(&JointAngles) -> Option<f64>,
{
    frames
        .iter()
        .map(|f| pick(&f.angles).unwrap_or(neutral))
        .collect()
}

fn mean_abs_difference(left: &[f64], right: &[f64]) -> f64 {
    let diffs: Vec<f64> = left.iter().zip(right).map(|(l, r)| (l - r).abs()).collect();
    mean(&diffs)
}

fn series_min(a: &[f64], b: &[f64]) -> f64 {
    a.iter().chain(b).copied().fold(f64::INFINITY, f64::min)
}

fn score_pushup(frames: &[RepFrame], metrics: &mut RepMetrics, events: &mut Vec<FormEvent>) {
    let left_elbows = series(frames, 180.0, |a| match a {
        JointAngles::Pushup { left_elbow, .. } => *left_elbow,
        _ => None,
    });
    let right_elbows = series(frames, 180.0, |a| match a {
        JointAngles::Pushup { right_elbow, .. } => *right_elbow,
        _ => None,
    });
    let left_lines = series(frames, 180.0, |a| match a {
        JointAngles::Pushup { left_body_line, .. } => *left_body_line,
        _ => None,
    });
    let right_lines = series(frames, 180.0, |a| match a {
        JointAngles::Pushup { right_body_line, .. } => *right_body_line,
        _ => None,
    });

    let min_elbow = series_min(&left_elbows, &right_elbows);
    let depth_note = if min_elbow > 120.0 {
        events.push(FormEvent::ShallowDepth);
        "movement too shallow"
    } else if min_elbow < 45.0 {
        "full depth reached"
    } else {
        "moderate depth"
    };
    metrics.depth = Metric::scored((180.0 - min_elbow) / 150.0, depth_note);

    let avg_line = (left_lines.iter().sum::<f64>() + right_lines.iter().sum::<f64>())
        / (2 * frames.len()) as f64;
    let alignment_note = if avg_line < 160.0 {
        events.push(FormEvent::HipsSagAtBottom);
        "hips sagging"
    } else if avg_line > 175.0 {
        "straight body line"
    } else {
        "slight bend in body line"
    };
    metrics.alignment = Metric::scored(avg_line / 180.0, alignment_note);

    let elbow_diff = mean_abs_difference(&left_elbows, &right_elbows);
    let symmetry_note = if elbow_diff > 15.0 {
        events.push(FormEvent::AsymmetricMovement);
        "left/right imbalance"
    } else {
        "left/right balanced"
    };
    metrics.symmetry = Metric::scored(1.0 - elbow_diff / 30.0, symmetry_note);
}

fn score_squat(frames: &[RepFrame], metrics: &mut RepMetrics, events: &mut Vec<FormEvent>) {
    let left_knees = series(frames, 180.0, |a| match a {
        JointAngles::Squat { left_knee, .. } => *left_knee,
        _ => None,
    });
    let right_knees = series(frames, 180.0, |a| match a {
        JointAngles::Squat { right_knee, .. } => *right_knee,
        _ => None,
    });
    let torsos = series(frames, 0.0, |a| match a {
        JointAngles::Squat { torso, .. } => *torso,
        _ => None,
    });

    let min_knee = series_min(&left_knees, &right_knees);
    let depth_note = if min_knee > 110.0 {
        events.push(FormEvent::ShallowSquat);
        "squat too shallow"
    } else if min_knee < 80.0 {
        "full depth reached"
    } else {
        "near parallel"
    };
    metrics.depth = Metric::scored((180.0 - min_knee) / 90.0, depth_note);

    let knee_diff = mean_abs_difference(&left_knees, &right_knees);
    let tracking_note = if knee_diff > 10.0 {
        events.push(FormEvent::KneeValgus);
        "knees caving inward"
    } else {
        "knees tracking well"
    };
    let knee_tracking = Metric::scored(1.0 - knee_diff / 20.0, tracking_note);

    let avg_torso = mean(&torsos);
    metrics.torso_angle = if avg_torso < 15.0 {
        Metric::scored(avg_torso / 15.0, "torso too upright")
    } else if avg_torso > 45.0 {
        events.push(FormEvent::TorsoCollapse);
        Metric::scored(1.0 - (avg_torso - 45.0) / 30.0, "excessive forward lean")
    } else {
        Metric::scored(1.0, "good torso angle")
    };

    metrics.alignment = knee_tracking.clone();
    metrics.symmetry = knee_tracking.clone();
    metrics.knee_tracking = knee_tracking;
}

fn score_situp(frames: &[RepFrame], metrics: &mut RepMetrics, events: &mut Vec<FormEvent>) {
    let left_torsos = series(frames, 90.0, |a| match a {
        JointAngles::Situp { left_torso, .. } => *left_torso,
        _ => None,
    });
    let right_torsos = series(frames, 90.0, |a| match a {
        JointAngles::Situp { right_torso, .. } => *right_torso,
        _ => None,
    });
    let avg_torsos: Vec<f64> = left_torsos
        .iter()
        .zip(&right_torsos)
        .map(|(l, r)| (l + r) / 2.0)
        .collect();

    let highest = avg_torsos.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lowest = avg_torsos.iter().copied().fold(f64::INFINITY, f64::min);
    let spread = highest - lowest;
    let rom_note = if spread < 40.0 {
        events.push(FormEvent::IncompleteLowering);
        "limited range of motion"
    } else {
        "good range of motion"
    };
    metrics.rom = Metric::scored(spread / 60.0, rom_note);

    if avg_torsos.len() > 1 {
        let velocities: Vec<f64> = avg_torsos.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let velocity_std = std_dev(&velocities);
        let control_note = if velocity_std > 5.0 {
            events.push(FormEvent::MomentumBounce);
            "swinging with momentum"
        } else {
            "controlled movement"
        };
        metrics.control = Metric::scored(1.0 - velocity_std / 10.0, control_note);
    }

    let torso_diff = mean_abs_difference(&left_torsos, &right_torsos);
    metrics.symmetry = Metric::scored(1.0 - torso_diff / 20.0, "");

    metrics.depth = metrics.rom.clone();
    metrics.alignment = match metrics.control.value {
        Some(_) => metrics.control.clone(),
        None => Metric::scored(0.5, ""),
    };
}

/// Shoulder-midpoint jitter across the repetition, inverted into a score
pub fn stability(frames: &[RepFrame]) -> Metric {
    if frames.len() < 2 {
        return Metric::scored(0.5, "insufficient data");
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = frames
        .iter()
        .filter_map(|f| shoulder_midpoint(&f.pose))
        .map(|p| (p.x, p.y))
        .unzip();

    if xs.len() < 2 {
        return Metric::scored(0.5, "");
    }

    let jitter = std_dev(&xs).hypot(std_dev(&ys));
    let score = unit_score(1.0 - jitter / STABILITY_JITTER_BUDGET);
    let note = if score > 0.7 {
        "steady movement"
    } else {
        "unsteady movement"
    };

    Metric {
        value: Some(score),
        note: note.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kintore_core::{Landmark, PoseFrame, PoseLandmark, Timestamp};

    fn frame_with(angles: JointAngles, shoulder_x: f64) -> RepFrame {
        let mut landmarks = vec![Landmark::at(0.5, 0.5); PoseLandmark::COUNT];
        landmarks[PoseLandmark::LeftShoulder.index()] = Landmark::at(shoulder_x - 0.05, 0.3);
        landmarks[PoseLandmark::RightShoulder.index()] = Landmark::at(shoulder_x + 0.05, 0.3);
        RepFrame {
            pose: PoseFrame::new(landmarks, Timestamp::default()),
            angles,
        }
    }

    fn squat(left: f64, right: f64, torso: f64) -> RepFrame {
        frame_with(
            JointAngles::Squat {
                left_knee: Some(left),
                right_knee: Some(right),
                torso: Some(torso),
            },
            0.5,
        )
    }

    fn pushup(elbow: f64, line: f64) -> RepFrame {
        frame_with(
            JointAngles::Pushup {
                left_elbow: Some(elbow),
                right_elbow: Some(elbow),
                left_body_line: Some(line),
                right_body_line: Some(line),
            },
            0.5,
        )
    }

    fn situp(torso: f64) -> RepFrame {
        frame_with(
            JointAngles::Situp {
                left_torso: Some(torso),
                right_torso: Some(torso),
            },
            0.5,
        )
    }

    #[test]
    fn test_shallow_squat() {
        let frames = vec![squat(170.0, 170.0, 30.0), squat(120.0, 120.0, 30.0), squat(165.0, 165.0, 30.0)];
        let (metrics, events) = score_repetition(ExerciseType::Squat, &frames);

        assert!(events.contains(&FormEvent::ShallowSquat));
        let expected = ((180.0 - 120.0) / 90.0_f64).clamp(0.0, 1.0);
        assert_eq!(metrics.depth.value, Some(unit_score(expected)));
        assert_eq!(metrics.torso_angle.value, Some(1.0));
    }

    #[test]
    fn test_squat_alignment_and_symmetry_mirror_knee_tracking() {
        let frames = vec![squat(170.0, 150.0, 30.0), squat(90.0, 75.0, 30.0)];
        let (metrics, events) = score_repetition(ExerciseType::Squat, &frames);

        // mean left/right difference is 17.5°
        assert!(events.contains(&FormEvent::KneeValgus));
        assert_eq!(metrics.knee_tracking.value, Some(0.13));
        assert_eq!(metrics.alignment.value, metrics.knee_tracking.value);
        assert_eq!(metrics.symmetry.value, metrics.knee_tracking.value);
    }

    #[test]
    fn test_squat_torso_collapse() {
        let frames = vec![squat(170.0, 170.0, 60.0), squat(85.0, 85.0, 60.0)];
        let (metrics, events) = score_repetition(ExerciseType::Squat, &frames);

        assert!(events.contains(&FormEvent::TorsoCollapse));
        assert_eq!(metrics.torso_angle.value, Some(0.5));
        assert!(!events.contains(&FormEvent::ShallowSquat));
    }

    #[test]
    fn test_squat_upright_torso_has_no_event() {
        let frames = vec![squat(170.0, 170.0, 6.0), squat(85.0, 85.0, 6.0)];
        let (metrics, events) = score_repetition(ExerciseType::Squat, &frames);

        assert_eq!(metrics.torso_angle.value, Some(0.4));
        assert_eq!(metrics.torso_angle.note, "torso too upright");
        assert!(events.is_empty());
    }

    #[test]
    fn test_pushup_depth_and_alignment() {
        let frames = vec![pushup(170.0, 150.0), pushup(60.0, 150.0), pushup(165.0, 150.0)];
        let (metrics, events) = score_repetition(ExerciseType::Pushup, &frames);

        assert_eq!(metrics.depth.value, Some(0.8));
        assert!(!events.contains(&FormEvent::ShallowDepth));
        assert!(events.contains(&FormEvent::HipsSagAtBottom));
        assert_eq!(metrics.symmetry.value, Some(1.0));
        assert!(metrics.knee_tracking.value.is_none());
    }

    #[test]
    fn test_pushup_missing_angles_use_neutral_defaults() {
        let blank = JointAngles::Pushup {
            left_elbow: None,
            right_elbow: None,
            left_body_line: None,
            right_body_line: None,
        };
        let frames = vec![frame_with(blank, 0.5), frame_with(blank, 0.5)];
        let (metrics, events) = score_repetition(ExerciseType::Pushup, &frames);

        assert_eq!(metrics.depth.value, Some(0.0));
        assert_eq!(metrics.alignment.value, Some(1.0));
        assert!(events.contains(&FormEvent::ShallowDepth));
    }

    #[test]
    fn test_situp_rom_and_control() {
        let frames: Vec<RepFrame> = [140.0, 120.0, 100.0, 80.0, 60.0].iter().map(|&t| situp(t)).collect();
        let (metrics, events) = score_repetition(ExerciseType::Situp, &frames);

        assert_eq!(metrics.rom.value, Some(1.0));
        assert_eq!(metrics.control.value, Some(1.0));
        assert_eq!(metrics.depth, metrics.rom);
        assert_eq!(metrics.alignment, metrics.control);
        assert!(events.is_empty());
    }

    #[test]
    fn test_situp_bounce_and_short_range() {
        let frames: Vec<RepFrame> = [100.0, 99.0, 80.0, 79.0, 100.0].iter().map(|&t| situp(t)).collect();
        let (metrics, events) = score_repetition(ExerciseType::Situp, &frames);

        assert!(events.contains(&FormEvent::IncompleteLowering));
        assert!(events.contains(&FormEvent::MomentumBounce));
        assert!(metrics.control.value.unwrap() < 0.5);
    }

    #[test]
    fn test_stability_jitter() {
        let steady = vec![pushup(170.0, 178.0), pushup(90.0, 178.0)];
        assert_eq!(stability(&steady).value, Some(1.0));

        let shaky: Vec<RepFrame> = [0.3, 0.7, 0.3, 0.7]
            .iter()
            .map(|&x| frame_with(JointAngles::Untracked, x))
            .collect();
        let metric = stability(&shaky);
        assert_eq!(metric.value, Some(0.0));
        assert_eq!(metric.note, "unsteady movement");

        let single = stability(&steady[..1]);
        assert_eq!(single.value, Some(0.5));
        assert_eq!(single.note, "insufficient data");
    }

    #[test]
    fn test_rep_features_serialize_flat() {
        let features = RepFeatures {
            rep_index: 1,
            duration_sec: 1.25,
            metrics: RepMetrics::default(),
            events: vec![FormEvent::KneeValgus],
        };
        let json = serde_json::to_value(&features).unwrap();

        assert_eq!(json["rep_index"], 1);
        assert_eq!(json["depth"]["value"], 0.0);
        assert!(json["rom"]["value"].is_null());
        assert_eq!(json["events"][0], "knee_valgus");
    }
}
