//! Target-count milestones.
//!
//! A small state machine decides which notification a new count deserves.
//! Each milestone fires at most once per armed target because the phase only
//! moves forward until the target is set again. Once the final stretch has
//! been announced, per-count announcements stay silent until re-armed, even
//! past the goal.

use serde::{Deserialize, Serialize};

/// Share of the target that counts as the final stretch
pub const ALMOST_THERE_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPhase {
    #[default]
    NotPending,
    Almost,
    /// Goal reached; `after_almost` keeps later counts silent
    Complete { after_almost: bool },
}

/// Notification owed for one count increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalEvent {
    CountAnnounced { count: u32 },
    AlmostThere { count: u32, remaining: u32 },
    GoalComplete { count: u32, target: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct GoalTracker {
    target: Option<u32>,
    phase: GoalPhase,
}

impl GoalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new target; 0 clears it
    pub fn set_target(&mut self, target: u32) {
        self.target = (target > 0).then_some(target);
        self.phase = GoalPhase::NotPending;
    }

    /// Re-arm the current target for a fresh session
    pub fn rearm(&mut self) {
        self.phase = GoalPhase::NotPending;
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn phase(&self) -> GoalPhase {
        self.phase
    }

    /// Notification for the count just reached, `None` while announcements
    /// are suppressed in the final stretch
    pub fn on_count(&mut self, count: u32) -> Option<GoalEvent> {
        let Some(target) = self.target else {
            return Some(GoalEvent::CountAnnounced { count });
        };

        if count >= target && !matches!(self.phase, GoalPhase::Complete { .. }) {
            self.phase = GoalPhase::Complete {
                after_almost: self.phase == GoalPhase::Almost,
            };
            return Some(GoalEvent::GoalComplete { count, target });
        }

        let remaining = target.saturating_sub(count);
        match self.phase {
            GoalPhase::NotPending
                if remaining > 0 && f64::from(remaining) <= f64::from(target) * ALMOST_THERE_RATIO =>
            {
                self.phase = GoalPhase::Almost;
                Some(GoalEvent::AlmostThere { count, remaining })
            }
            GoalPhase::Almost | GoalPhase::Complete { after_almost: true } => None,
            _ => Some(GoalEvent::CountAnnounced { count }),
        }
    }
}
