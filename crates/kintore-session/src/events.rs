//! Outbound notifications for voice and UI collaborators.

use kintore_core::ExerciseType;
use kintore_motion::GoalEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::session::Mode;

/// Event raised by a workout session for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    CountAnnounced { count: u32 },
    AlmostThere { count: u32, remaining: u32 },
    GoalComplete { count: u32, target: u32 },
    TargetSet { target: u32 },
    ModeChanged { mode: Mode },
    CounterReset,
    ExerciseDetected { exercise: ExerciseType },
}

impl From<GoalEvent> for Notification {
    fn from(event: GoalEvent) -> Self {
        match event {
            GoalEvent::CountAnnounced { count } => Notification::CountAnnounced { count },
            GoalEvent::AlmostThere { count, remaining } => Notification::AlmostThere { count, remaining },
            GoalEvent::GoalComplete { count, target } => Notification::GoalComplete { count, target },
        }
    }
}

/// Receiver of session notifications.
///
/// Delivery must not block: the session calls this inline while processing
/// frames.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: &Notification) {}
}

/// Logs notifications through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) {
        tracing::info!(?notification, "session notification");
    }
}

impl NotificationSink for broadcast::Sender<Notification> {
    fn notify(&self, notification: &Notification) {
        // No subscriber is not an error
        let _ = self.send(notification.clone());
    }
}

impl NotificationSink for mpsc::UnboundedSender<Notification> {
    fn notify(&self, notification: &Notification) {
        if self.send(notification.clone()).is_err() {
            tracing::warn!("notification receiver dropped");
        }
    }
}
