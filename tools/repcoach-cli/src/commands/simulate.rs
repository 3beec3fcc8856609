//! Write a synthetic workout to a JSONL pose stream.

use std::path::PathBuf;

use repcoach_pose_source::{PoseRecorder, SyntheticSource};
use repcoach_processing_core::ExerciseKind;

use crate::MotionArgs;

pub async fn run(
    output: PathBuf,
    exercise: ExerciseKind,
    motion: MotionArgs,
) -> anyhow::Result<()> {
    let config = super::synthetic_config(exercise, &motion);
    let (width, height) = (config.width, config.height);
    let source = SyntheticSource::new(config);
    let expected = source.total_frames();

    println!("Simulating {exercise}: {} reps, {expected} frames", motion.reps);
    let mut recorder = PoseRecorder::new(Box::new(source), output.clone(), width, height)?;
    let frames = recorder.run().await?;
    println!("Wrote {frames} frames to: {}", output.display());
    Ok(())
}
