//! A single workout session.
//!
//! [`WorkoutSession`] wires an [`ExerciseDetector`] and a [`RepCounter`]
//! together, decides which exercise is tracked and forwards every
//! notification to an injected [`NotificationSink`].

use std::fmt;

use kintore_core::{Error, ExerciseType, PoseFrame, Result, SessionId, Stage, Timestamp};
use kintore_motion::{ExerciseDetector, RepCounter, RepFeatures, SessionPayload};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::events::{Notification, NotificationSink};
use crate::scoring::{EvaluationFeedback, ScoringClient};

/// How the tracked exercise is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Detected from posture, switching whenever a new exercise is confirmed
    #[default]
    Auto,
    Manual(ExerciseType),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => f.write_str("auto"),
            Mode::Manual(exercise) => write!(f, "manual({exercise})"),
        }
    }
}

/// Live view of the session after one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub timestamp: Timestamp,
    pub mode: Mode,
    pub exercise: ExerciseType,
    pub angle: Option<f64>,
    pub stage: Option<Stage>,
    pub count: u32,
    pub target: Option<u32>,
    pub reps_recorded: usize,
    pub completed_rep: Option<RepFeatures>,
    pub notifications: Vec<Notification>,
}

pub struct WorkoutSession {
    config: SessionConfig,
    mode: Mode,
    detector: ExerciseDetector,
    counter: RepCounter,
    sink: Box<dyn NotificationSink>,
}

impl WorkoutSession {
    /// New session in automatic mode with no exercise selected
    pub fn new(config: SessionConfig, sink: Box<dyn NotificationSink>) -> Self {
        Self {
            detector: ExerciseDetector::new(config.detector.clone()),
            counter: RepCounter::new(ExerciseType::Unknown),
            mode: Mode::Auto,
            config,
            sink,
        }
    }

    pub fn process_frame(&mut self, frame: &PoseFrame) -> FrameReport {
        let mut notifications = Vec::new();

        if self.mode == Mode::Auto {
            if let Some(detected) = self.detector.detect(frame) {
                if detected != self.counter.exercise() {
                    tracing::info!(
                        from = %self.counter.exercise(),
                        to = %detected,
                        "exercise detected"
                    );
                    self.counter.set_exercise(detected);
                    notifications.push(Notification::ExerciseDetected { exercise: detected });
                }
            }
        }

        let outcome = self.counter.process(frame);
        if let Some(event) = outcome.as_ref().and_then(|o| o.goal) {
            notifications.push(event.into());
        }

        for notification in &notifications {
            self.sink.notify(notification);
        }

        let (angle, completed_rep) = match outcome {
            Some(outcome) => (outcome.angle, outcome.completed_rep),
            None => (None, None),
        };

        FrameReport {
            timestamp: frame.timestamp,
            mode: self.mode,
            exercise: self.counter.exercise(),
            angle,
            stage: self.counter.stage(),
            count: self.counter.count(),
            target: self.counter.target(),
            reps_recorded: self.counter.reps().len(),
            completed_rep,
            notifications,
        }
    }

    /// Switch between automatic detection and a fixed exercise.
    ///
    /// Always resets the counter; entering auto mode also clears the
    /// detector window and the current exercise.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        match mode {
            Mode::Auto => {
                self.detector.reset();
                self.counter.set_exercise(ExerciseType::Unknown);
            }
            Mode::Manual(exercise) if exercise.is_known() => {
                self.counter.set_exercise(exercise);
            }
            Mode::Manual(_) => {
                return Err(Error::InvalidInput("manual mode needs a known exercise".to_string()));
            }
        }

        self.mode = mode;
        tracing::info!(%mode, "mode changed");
        self.sink.notify(&Notification::ModeChanged { mode });
        Ok(())
    }

    /// Zero the counter and start a new feature session
    pub fn reset(&mut self) {
        self.counter.reset();
        tracing::info!(session_id = %self.counter.extractor().session_id(), "counter reset");
        self.sink.notify(&Notification::CounterReset);
    }

    /// Arm a target count; 0 clears it
    pub fn set_target(&mut self, target: u32) {
        self.counter.set_target(target);
        if target > 0 {
            tracing::info!(target, "target set");
            self.sink.notify(&Notification::TargetSet { target });
        }
    }

    /// Payload of the current session for the scoring service
    pub fn evaluation_payload(&self) -> Result<SessionPayload> {
        if !self.counter.exercise().is_known() {
            return Err(Error::NoExerciseSelected);
        }
        self.counter
            .generate_payload(&self.config.payload)
            .ok_or(Error::NoRepetitions)
    }

    /// Send the session to `client`, which must report itself reachable first
    pub async fn request_evaluation(&self, client: &dyn ScoringClient) -> Result<EvaluationFeedback> {
        ensure_connected(client).await?;
        let payload = self.evaluation_payload()?;
        tracing::info!(
            scorer = client.name(),
            session_id = %payload.meta.session_id,
            reps = payload.reps,
            "requesting evaluation"
        );

        client.evaluate(&payload).await.map_err(|e| {
            tracing::warn!(scorer = client.name(), error = %e, "evaluation failed");
            e
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn exercise(&self) -> ExerciseType {
        self.counter.exercise()
    }

    pub fn count(&self) -> u32 {
        self.counter.count()
    }

    pub fn target(&self) -> Option<u32> {
        self.counter.target()
    }

    pub fn reps(&self) -> &[RepFeatures] {
        self.counter.reps()
    }

    pub fn session_id(&self) -> &SessionId {
        self.counter.extractor().session_id()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

pub(crate) async fn ensure_connected(client: &dyn ScoringClient) -> Result<()> {
    if client.check_connection().await? {
        Ok(())
    } else {
        tracing::warn!(scorer = client.name(), "scoring service not connected");
        Err(Error::Scoring("scoring service not connected".to_string()))
    }
}
