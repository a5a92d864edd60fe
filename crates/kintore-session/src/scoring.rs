//! Evaluation seam towards the external scoring service.

use async_trait::async_trait;
use kintore_core::{stats::round2, Result};
use kintore_motion::{FormEvent, SessionPayload};
use serde::{Deserialize, Serialize};

/// Verdict returned by a scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFeedback {
    /// 0 to 100
    pub overall_score: f64,
    pub comment: String,
}

/// Remote or local evaluator of a session payload
#[async_trait]
pub trait ScoringClient: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the service is reachable
    async fn check_connection(&self) -> Result<bool>;

    async fn evaluate(&self, payload: &SessionPayload) -> Result<EvaluationFeedback>;
}

/// Offline evaluator deriving feedback from the payload statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalScorer;

impl LocalScorer {
    fn most_frequent_event(payload: &SessionPayload) -> Option<(FormEvent, usize)> {
        let mut tally: Vec<(FormEvent, usize)> = Vec::new();
        for event in payload.rep_summaries.iter().flat_map(|r| r.events.iter()) {
            match tally.iter_mut().find(|(e, _)| e == event) {
                Some((_, n)) => *n += 1,
                None => tally.push((*event, 1)),
            }
        }
        // first seen wins ties
        tally.into_iter().fold(None, |best, entry| match best {
            Some((_, n)) if n >= entry.1 => best,
            _ => Some(entry),
        })
    }
}

#[async_trait]
impl ScoringClient for LocalScorer {
    fn name(&self) -> &str {
        "local"
    }

    async fn check_connection(&self) -> Result<bool> {
        Ok(true)
    }

    async fn evaluate(&self, payload: &SessionPayload) -> Result<EvaluationFeedback> {
        let stats = &payload.overall_stats;
        let headline = (stats.depth.mean + stats.alignment.mean + stats.symmetry.mean + stats.stability.mean) / 4.0;
        let overall_score = round2(headline * 100.0);

        let comment = match Self::most_frequent_event(payload) {
            Some((event, n)) => format!(
                "{} repetitions of {}; most frequent issue: {} ({} of {})",
                payload.reps,
                payload.exercise,
                event.as_str(),
                n,
                payload.reps
            ),
            None => format!("{} clean repetitions of {}", payload.reps, payload.exercise),
        };

        Ok(EvaluationFeedback { overall_score, comment })
    }
}
