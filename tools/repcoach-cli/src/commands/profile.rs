//! Print or validate exercise profiles.

use std::path::PathBuf;

use repcoach_processing_core::{ExerciseKind, ExerciseProfile};

pub fn show(exercise: ExerciseKind, output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = exercise.profile().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Wrote {exercise} profile to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn validate(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating profile at: {}", path.display());
    let profile = ExerciseProfile::load(&path)
        .map_err(|e| anyhow::anyhow!("Invalid profile: {e}"))?;

    println!("  Name: {}", profile.name);
    println!("  Workout: {}", profile.workout_name);
    println!("  Rep target: {}", profile.rep_target);
    println!("  Rules: {}", profile.rules.len());
    println!("\nProfile is valid.");
    Ok(())
}
