//! Geometric utilities on the 2-D image plane.
//!
//! Landmark depth (`z`) is too noisy from a single webcam to be useful, so
//! every joint angle here is computed from `x`/`y` only.

use nalgebra::{Point2, Vector2};

use crate::types::{Landmark, PoseFrame, PoseLandmark};

/// Rays shorter than this are treated as having no direction
const MIN_RAY_LENGTH: f64 = 1e-9;

/// Project a landmark onto the image plane
pub fn to_point(landmark: &Landmark) -> Point2<f64> {
    Point2::new(landmark.x, landmark.y)
}

/// Unsigned interior angle at `vertex` in degrees, in [0, 180].
///
/// Computed from the difference of the headings of the rays
/// `vertex -> a` and `vertex -> b`, reflected around 360 when the raw
/// difference exceeds 180. Returns `None` when either ray is degenerate
/// (a point coincides with the vertex) or any coordinate is not finite,
/// i.e. the angle is unavailable.
pub fn joint_angle(a: &Landmark, vertex: &Landmark, b: &Landmark) -> Option<f64> {
    let v = to_point(vertex);
    let ray_a: Vector2<f64> = to_point(a) - v;
    let ray_b: Vector2<f64> = to_point(b) - v;

    if !ray_a.iter().chain(ray_b.iter()).all(|c| c.is_finite()) {
        return None;
    }
    if ray_a.norm() < MIN_RAY_LENGTH || ray_b.norm() < MIN_RAY_LENGTH {
        return None;
    }

    let heading_a = ray_a.y.atan2(ray_a.x);
    let heading_b = ray_b.y.atan2(ray_b.x);
    let mut angle = (heading_b - heading_a).to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }

    Some(angle)
}

/// Joint angle over three named landmarks of a frame
pub fn frame_angle(frame: &PoseFrame, joints: [PoseLandmark; 3]) -> Option<f64> {
    let a = frame.get(joints[0])?;
    let v = frame.get(joints[1])?;
    let b = frame.get(joints[2])?;
    joint_angle(a, v, b)
}

pub fn midpoint(a: &Landmark, b: &Landmark) -> Point2<f64> {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Angle in degrees between the hip→shoulder segment and image vertical.
///
/// 0 means the torso is upright; image `y` grows downwards.
pub fn lean_from_vertical(shoulder_mid: &Point2<f64>, hip_mid: &Point2<f64>) -> f64 {
    let dx = shoulder_mid.x - hip_mid.x;
    let dy = shoulder_mid.y - hip_mid.y;
    dx.atan2(-dy).to_degrees().abs()
}

/// Torso lean of a full-body frame, from shoulder and hip midpoints
pub fn torso_lean(frame: &PoseFrame) -> Option<f64> {
    let shoulder_mid = midpoint(
        frame.get(PoseLandmark::LeftShoulder)?,
        frame.get(PoseLandmark::RightShoulder)?,
    );
    let hip_mid = midpoint(
        frame.get(PoseLandmark::LeftHip)?,
        frame.get(PoseLandmark::RightHip)?,
    );
    Some(lean_from_vertical(&shoulder_mid, &hip_mid))
}

/// Midpoint of both shoulders, the reference point for stability
pub fn shoulder_midpoint(frame: &PoseFrame) -> Option<Point2<f64>> {
    Some(midpoint(
        frame.get(PoseLandmark::LeftShoulder)?,
        frame.get(PoseLandmark::RightShoulder)?,
    ))
}
