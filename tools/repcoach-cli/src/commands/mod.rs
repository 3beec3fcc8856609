//! Subcommand implementations.

pub mod demo;
pub mod history;
pub mod profile;
pub mod run;
pub mod simulate;

use std::sync::atomic::Ordering;

use repcoach_common::config::AppConfig;
use repcoach_pose_source::{Dropout, PoseSource, SyntheticConfig, SyntheticMotion};
use repcoach_processing_core::{ExerciseKind, ExerciseProfile};
use repcoach_session::{SessionConfig, TrainingSession};

use crate::render::TerminalRenderer;
use crate::{MotionArgs, SessionArgs};

/// Resolve the profile: an explicit file wins, then `--exercise`, then the
/// configured default.
fn load_profile(config: &AppConfig, args: &SessionArgs) -> anyhow::Result<ExerciseProfile> {
    if let Some(path) = &args.profile {
        return ExerciseProfile::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load profile {}: {e}", path.display()));
    }
    Ok(exercise_kind(config, args)?.profile())
}

fn exercise_kind(config: &AppConfig, args: &SessionArgs) -> anyhow::Result<ExerciseKind> {
    match args.exercise {
        Some(kind) => Ok(kind),
        None => config
            .processing
            .exercise
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid default exercise in config: {e}")),
    }
}

fn synthetic_config(kind: ExerciseKind, motion: &MotionArgs) -> SyntheticConfig {
    let mut config = SyntheticConfig::for_motion(match kind {
        ExerciseKind::TricepPushdown => SyntheticMotion::TricepPushdown,
        ExerciseKind::Squat => SyntheticMotion::Squat,
    });
    config.reps = motion.reps;
    config.swing_px = motion.swing;
    config.jitter_px = motion.jitter;
    config.seed = motion.seed;
    if let Some(lean) = motion.lean {
        config.torso_lean_deg = lean;
    }
    config.dropout = motion.dropout_at.map(|start_ms| Dropout {
        start_ms,
        duration_ms: motion.dropout_ms,
    });
    config
}

/// Drive one session to completion, rendering to the terminal.
async fn execute(
    config: &AppConfig,
    args: &SessionArgs,
    profile: ExerciseProfile,
    source: Box<dyn PoseSource>,
) -> anyhow::Result<()> {
    let mut session_config = SessionConfig::from_app_config(config);
    session_config.realtime |= args.realtime;
    if let Some(fps) = args.fps {
        session_config.fps = fps;
    }
    if let Some(dir) = &args.history_dir {
        session_config.history_dir = Some(dir.clone());
    }
    if args.no_save {
        session_config.history_dir = None;
    }

    println!("Coaching {} from {}", profile.workout_name, source.name());
    println!("Press Ctrl+C to stop...");
    println!();

    let mut renderer = TerminalRenderer::new(args.quiet);
    let mut session = TrainingSession::for_profile(session_config, profile, source)?
        .with_observer(move |out| renderer.render(out));

    let stop = session.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::SeqCst);
        }
    });

    let outcome = session.run().await?;

    println!();
    match &outcome.record {
        Some(record) => print!("{}", record.summary_text()),
        None => println!("No results recorded."),
    }
    if let Some(paths) = &outcome.exports {
        println!();
        println!("Results saved to: {}", paths.json.display());
        println!("Summary saved to: {}", paths.summary.display());
    }
    if let Some(err) = &outcome.export_error {
        println!();
        println!("Warning: results were not saved ({err})");
    }
    Ok(())
}
