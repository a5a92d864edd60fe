use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{bail, Context};
use kintore_core::{ExerciseType, PoseFrame};
use kintore_session::{LocalScorer, Mode, SessionConfig, TracingSink, WorkoutSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: kintore-replay <recording.jsonl> [config]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kintore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(recording) = args.next() else {
        bail!(USAGE);
    };

    let config = match args.next() {
        Some(path) => SessionConfig::from_file(&path).with_context(|| format!("loading config {path}"))?,
        None => SessionConfig::from_env().context("loading config from environment")?,
    };

    let mut session = WorkoutSession::new(config, Box::new(TracingSink));
    if let Ok(name) = std::env::var("KINTORE_EXERCISE") {
        let exercise: ExerciseType = name.parse()?;
        session.set_mode(Mode::Manual(exercise))?;
    }

    let file = File::open(&recording).with_context(|| format!("opening {recording}"))?;
    let mut frames = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {recording}"))?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PoseFrame>(&line) {
            Ok(frame) => {
                session.process_frame(&frame);
                frames += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "skipping malformed frame");
                skipped += 1;
            }
        }
    }

    tracing::info!(
        frames,
        skipped,
        exercise = %session.exercise(),
        count = session.count(),
        "replay finished"
    );

    let payload = session.evaluation_payload()?;
    println!("{}", serde_json::to_string_pretty(&payload)?);

    let feedback = session.request_evaluation(&LocalScorer).await?;
    tracing::info!(score = feedback.overall_score, comment = %feedback.comment, "local evaluation");

    Ok(())
}
