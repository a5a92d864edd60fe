//! Benchmarks for the per-frame motion path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kintore_core::{joint_angle, ExerciseType, Landmark, PoseFrame, PoseLandmark, Timestamp};
use kintore_motion::{ExerciseDetector, PayloadConfig, RepCounter};

/// Full-body squat frame with the knees bent to `knee_deg`
fn create_squat_frame(knee_deg: f64, millis: i64) -> PoseFrame {
    let mut landmarks = vec![Landmark::at(0.5, 0.5); PoseLandmark::COUNT];
    let bend = (180.0 - knee_deg).to_radians();

    for (side, dx) in [(0usize, -0.05), (1usize, 0.05)] {
        landmarks[PoseLandmark::LeftShoulder.index() + side] = Landmark::at(0.5 + dx, 0.3);
        landmarks[PoseLandmark::LeftHip.index() + side] = Landmark::at(0.5 + dx, 0.5);
        landmarks[PoseLandmark::LeftKnee.index() + side] = Landmark::at(0.5 + dx, 0.7);
        landmarks[PoseLandmark::LeftAnkle.index() + side] =
            Landmark::at(0.5 + dx + 0.2 * bend.sin(), 0.7 + 0.2 * bend.cos());
    }
    PoseFrame::new(landmarks, Timestamp::from_millis(millis))
}

/// `reps` squat cycles at roughly 30 frames per second
fn create_session(reps: usize) -> Vec<PoseFrame> {
    let cycle = [175.0, 160.0, 140.0, 120.0, 100.0, 85.0, 75.0, 70.0, 80.0, 100.0, 130.0, 150.0, 170.0, 176.0];
    (0..reps)
        .flat_map(|_| cycle.iter().copied())
        .enumerate()
        .map(|(i, knee)| create_squat_frame(knee, i as i64 * 33))
        .collect()
}

fn benchmark_angle(c: &mut Criterion) {
    let a = Landmark::at(0.5, 0.5);
    let v = Landmark::at(0.5, 0.7);
    let b = Landmark::at(0.6, 0.85);

    c.bench_function("joint_angle", |bench| {
        bench.iter(|| joint_angle(black_box(&a), black_box(&v), black_box(&b)))
    });
}

fn benchmark_detector(c: &mut Criterion) {
    let frames = create_session(3);

    c.bench_function("detect_exercise_42_frames", |b| {
        b.iter(|| {
            let mut detector = ExerciseDetector::default();
            for frame in &frames {
                black_box(detector.detect(frame));
            }
        })
    });
}

fn benchmark_counter(c: &mut Criterion) {
    let frames = create_session(10);
    let config = PayloadConfig::default();

    c.bench_function("count_and_score_10_squats", |b| {
        b.iter(|| {
            let mut counter = RepCounter::new(ExerciseType::Squat);
            for frame in &frames {
                black_box(counter.process(frame));
            }
            counter.generate_payload(&config)
        })
    });
}

criterion_group!(benches, benchmark_angle, benchmark_detector, benchmark_counter);
criterion_main!(benches);
