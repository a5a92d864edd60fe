//! Multi-session service.
//!
//! Every opened session runs on its own tokio task that exclusively owns a
//! [`WorkoutSession`]. Frames and commands travel over one ordered channel,
//! so the session sees them in the order they were sent and no state is
//! shared between sessions.

use std::collections::HashMap;
use std::sync::Arc;

use kintore_core::{Error, ExerciseType, PoseFrame, Result, SessionId};
use kintore_motion::SessionPayload;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::events::Notification;
use crate::scoring::{EvaluationFeedback, ScoringClient};
use crate::session::{ensure_connected, FrameReport, Mode, WorkoutSession};

/// Snapshot of a session's counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub mode: Mode,
    pub exercise: ExerciseType,
    pub count: u32,
    pub target: Option<u32>,
    pub reps_recorded: usize,
}

enum SessionInput {
    Frame {
        frame: PoseFrame,
        reply: Option<oneshot::Sender<FrameReport>>,
    },
    SetMode {
        mode: Mode,
        reply: oneshot::Sender<Result<()>>,
    },
    SetTarget(u32),
    Reset,
    Payload(oneshot::Sender<Result<SessionPayload>>),
    Status(oneshot::Sender<SessionStatus>),
    Close,
}

/// Client side of one running session
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    inputs: mpsc::Sender<SessionInput>,
    events: broadcast::Sender<Notification>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive the session's notifications from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Queue a frame without waiting for it to be processed
    pub async fn send_frame(&self, frame: PoseFrame) -> Result<()> {
        self.send(SessionInput::Frame { frame, reply: None }).await
    }

    /// Process a frame and wait for its report
    pub async fn process_frame(&self, frame: PoseFrame) -> Result<FrameReport> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionInput::Frame {
            frame,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionInput::SetMode { mode, reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn set_target(&self, target: u32) -> Result<()> {
        self.send(SessionInput::SetTarget(target)).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(SessionInput::Reset).await
    }

    pub async fn payload(&self) -> Result<SessionPayload> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionInput::Payload(reply)).await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionInput::Status(reply)).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Fetch the payload and evaluate it outside the session task, so a
    /// slow scorer never holds up frame processing
    pub async fn evaluate(&self, client: &dyn ScoringClient) -> Result<EvaluationFeedback> {
        ensure_connected(client).await?;
        let payload = self.payload().await?;
        client.evaluate(&payload).await
    }

    async fn send(&self, input: SessionInput) -> Result<()> {
        self.inputs.send(input).await.map_err(|_| Error::SessionClosed)
    }
}

/// Registry of independently running sessions
pub struct SessionHub {
    config: SessionConfig,
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionHub {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn a new session worker
    pub async fn open(&self) -> SessionHandle {
        let id = Uuid::new_v4();
        let (inputs, rx) = mpsc::channel(self.config.hub.frame_queue.max(1));
        let (events, _) = broadcast::channel(self.config.hub.event_capacity.max(1));

        let session = WorkoutSession::new(self.config.clone(), Box::new(events.clone()));
        tokio::spawn(run_session(id, session, rx));

        let handle = SessionHandle { id, inputs, events };
        self.sessions.write().await.insert(id, handle.clone());
        tracing::info!(%id, "session opened");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Stop a session worker and forget it
    pub async fn close(&self, id: Uuid) -> Result<()> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| Error::UnknownSession(id.to_string()))?;

        // Worker may already be gone
        let _ = handle.inputs.send(SessionInput::Close).await;
        tracing::info!(%id, "session closed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

async fn run_session(id: Uuid, mut session: WorkoutSession, mut inputs: mpsc::Receiver<SessionInput>) {
    tracing::debug!(%id, session_id = %session.session_id(), "session worker started");

    while let Some(input) = inputs.recv().await {
        match input {
            SessionInput::Frame { frame, reply } => {
                let report = session.process_frame(&frame);
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            SessionInput::SetMode { mode, reply } => {
                let _ = reply.send(session.set_mode(mode));
            }
            SessionInput::SetTarget(target) => session.set_target(target),
            SessionInput::Reset => session.reset(),
            SessionInput::Payload(reply) => {
                let _ = reply.send(session.evaluation_payload());
            }
            SessionInput::Status(reply) => {
                let _ = reply.send(SessionStatus {
                    session_id: session.session_id().clone(),
                    mode: session.mode(),
                    exercise: session.exercise(),
                    count: session.count(),
                    target: session.target(),
                    reps_recorded: session.reps().len(),
                });
            }
            SessionInput::Close => break,
        }
    }

    tracing::debug!(%id, count = session.count(), "session worker stopped");
}
