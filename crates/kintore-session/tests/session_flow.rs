//! End-to-end flows over synthetic landmark streams.

use kintore_core::{Error, ExerciseType, Landmark, PoseFrame, PoseLandmark, Timestamp};
use kintore_session::{LocalScorer, Mode, Notification, SessionConfig, SessionHub, WorkoutSession};
use tokio::sync::mpsc;

const FRAME_MS: i64 = 40;

const SQUAT_CYCLE: [f64; 11] = [175.0, 150.0, 120.0, 95.0, 80.0, 70.0, 80.0, 95.0, 120.0, 150.0, 172.0];
const PUSHUP_CYCLE: [f64; 11] = [170.0, 150.0, 120.0, 95.0, 80.0, 60.0, 80.0, 95.0, 120.0, 150.0, 170.0];

/// Place a three-joint chain with the given interior angle at `vertex`;
/// the first joint sits straight above the vertex
fn bend(landmarks: &mut [Landmark], joints: [PoseLandmark; 3], vertex: (f64, f64), angle_deg: f64) {
    let b = (180.0 - angle_deg).to_radians();
    landmarks[joints[0].index()] = Landmark::at(vertex.0, vertex.1 - 0.2);
    landmarks[joints[1].index()] = Landmark::at(vertex.0, vertex.1);
    landmarks[joints[2].index()] = Landmark::at(vertex.0 + 0.2 * b.sin(), vertex.1 + 0.2 * b.cos());
}

/// Standing trainee, hands behind the head, knees at `knee_deg`
fn squat_frame(knee_deg: f64, index: usize) -> PoseFrame {
    use PoseLandmark::*;
    let mut landmarks = vec![Landmark::at(0.5, 0.1); PoseLandmark::COUNT];
    for (shoulder, wrist, hip, knee, ankle, x) in [
        (LeftShoulder, LeftWrist, LeftHip, LeftKnee, LeftAnkle, 0.45),
        (RightShoulder, RightWrist, RightHip, RightKnee, RightAnkle, 0.55),
    ] {
        landmarks[shoulder.index()] = Landmark::at(x, 0.2);
        landmarks[wrist.index()] = Landmark::at(x, 0.15);
        bend(&mut landmarks, [hip, knee, ankle], (x, 0.7), knee_deg);
    }
    PoseFrame::new(landmarks, Timestamp::from_millis(index as i64 * FRAME_MS))
}

/// Plank facing left, elbows at `elbow_deg`
fn pushup_frame(elbow_deg: f64, index: usize) -> PoseFrame {
    use PoseLandmark::*;
    let mut landmarks = vec![Landmark::at(0.5, 0.4); PoseLandmark::COUNT];
    for (shoulder, elbow, wrist, hip, ankle, dy) in [
        (LeftShoulder, LeftElbow, LeftWrist, LeftHip, LeftAnkle, 0.0),
        (RightShoulder, RightElbow, RightWrist, RightHip, RightAnkle, 0.01),
    ] {
        bend(&mut landmarks, [shoulder, elbow, wrist], (0.3, 0.7 + dy), elbow_deg);
        landmarks[hip.index()] = Landmark::at(0.55, 0.5 + dy);
        landmarks[ankle.index()] = Landmark::at(0.8, 0.5 + dy);
    }
    PoseFrame::new(landmarks, Timestamp::from_millis(index as i64 * FRAME_MS))
}

fn squat_stream(standing: usize, reps: usize) -> Vec<PoseFrame> {
    let angles = std::iter::repeat(175.0)
        .take(standing)
        .chain((0..reps).flat_map(|_| SQUAT_CYCLE));
    angles.enumerate().map(|(i, a)| squat_frame(a, i)).collect()
}

fn pushup_stream(reps: usize) -> Vec<PoseFrame> {
    std::iter::once(170.0)
        .chain((0..reps).flat_map(|_| PUSHUP_CYCLE))
        .enumerate()
        .map(|(i, a)| pushup_frame(a, i))
        .collect()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

#[tokio::test]
async fn test_auto_detected_squat_session_reaches_goal() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = WorkoutSession::new(SessionConfig::default(), Box::new(tx));
    session.set_target(4);

    for frame in squat_stream(10, 4) {
        session.process_frame(&frame);
    }

    assert_eq!(session.exercise(), ExerciseType::Squat);
    assert_eq!(session.count(), 4);
    assert_eq!(
        drain(&mut rx),
        vec![
            Notification::TargetSet { target: 4 },
            Notification::ExerciseDetected {
                exercise: ExerciseType::Squat
            },
            Notification::CountAnnounced { count: 1 },
            Notification::CountAnnounced { count: 2 },
            Notification::CountAnnounced { count: 3 },
            Notification::GoalComplete { count: 4, target: 4 },
        ]
    );

    let payload = session.evaluation_payload().unwrap();
    assert_eq!(payload.exercise, ExerciseType::Squat);
    assert_eq!(payload.reps, 4);
    assert_eq!(payload.rep_summaries.len(), 4);
    for (i, rep) in payload.rep_summaries.iter().enumerate() {
        assert_eq!(rep.rep_index, i as u32 + 1);
        assert!(rep.duration_sec > 0.0);
        assert!(rep.events.is_empty(), "rep {} events {:?}", rep.rep_index, rep.events);
    }
    assert!(payload.highlights.trend.is_empty());

    let feedback = session.request_evaluation(&LocalScorer).await.unwrap();
    assert!(feedback.overall_score > 50.0);
    assert!(feedback.comment.contains("clean repetitions of squat"));
}

#[test]
fn test_manual_pushups_scored() {
    let mut session = WorkoutSession::new(SessionConfig::default(), Box::new(kintore_session::NullSink));
    session.set_mode(Mode::Manual(ExerciseType::Pushup)).unwrap();

    let mut completed = 0;
    for frame in pushup_stream(3) {
        if session.process_frame(&frame).completed_rep.is_some() {
            completed += 1;
        }
    }
    assert_eq!(completed, 3);
    assert_eq!(session.count(), 3);

    let payload = session.evaluation_payload().unwrap();
    let stats = payload.overall_stats;
    assert_eq!(stats.depth.mean, 0.8);
    assert_eq!(stats.alignment.min, 1.0);
    assert_eq!(stats.symmetry.max, 1.0);
    assert!(stats.tempo.mean_sec_per_rep > 0.0);
    assert_eq!(stats.tempo.cv, 0.0);
}

#[test]
fn test_gaps_in_the_stream_are_tolerated() {
    let mut session = WorkoutSession::new(SessionConfig::default(), Box::new(kintore_session::NullSink));
    session.set_mode(Mode::Manual(ExerciseType::Squat)).unwrap();

    for (i, frame) in squat_stream(2, 2).into_iter().enumerate() {
        if i % 4 == 1 {
            let short = PoseFrame::new(vec![Landmark::default(); 12], frame.timestamp);
            let report = session.process_frame(&short);
            assert!(report.angle.is_none());
        }
        session.process_frame(&frame);
    }

    assert_eq!(session.count(), 2);
    assert_eq!(session.reps().len(), 2);
}

#[test]
fn test_switching_exercise_starts_a_new_session() {
    let mut session = WorkoutSession::new(SessionConfig::default(), Box::new(kintore_session::NullSink));
    session.set_mode(Mode::Manual(ExerciseType::Squat)).unwrap();
    for frame in squat_stream(1, 2) {
        session.process_frame(&frame);
    }
    assert_eq!(session.reps().len(), 2);

    session.set_mode(Mode::Manual(ExerciseType::Pushup)).unwrap();
    assert_eq!(session.count(), 0);
    assert!(matches!(session.evaluation_payload(), Err(Error::NoRepetitions)));
}

#[tokio::test]
async fn test_hub_runs_sessions_concurrently() {
    let hub = SessionHub::default();
    let squats = hub.open().await;
    let pushups = hub.open().await;

    squats.set_mode(Mode::Manual(ExerciseType::Squat)).await.unwrap();
    pushups.set_mode(Mode::Manual(ExerciseType::Pushup)).await.unwrap();

    let squat_feed = {
        let handle = squats.clone();
        tokio::spawn(async move {
            for frame in squat_stream(1, 5) {
                handle.send_frame(frame).await.unwrap();
            }
        })
    };
    let pushup_feed = {
        let handle = pushups.clone();
        tokio::spawn(async move {
            for frame in pushup_stream(2) {
                handle.send_frame(frame).await.unwrap();
            }
        })
    };
    squat_feed.await.unwrap();
    pushup_feed.await.unwrap();

    let squat_status = squats.status().await.unwrap();
    let pushup_status = pushups.status().await.unwrap();
    assert_eq!(squat_status.count, 5);
    assert_eq!(pushup_status.count, 2);
    assert_eq!(pushup_status.exercise, ExerciseType::Pushup);

    let feedback = pushups.evaluate(&LocalScorer).await.unwrap();
    assert!(feedback.comment.contains("pushup"));

    hub.close(squats.id()).await.unwrap();
    assert_eq!(hub.len().await, 1);
    assert!(matches!(squats.status().await, Err(Error::SessionClosed)));
}
