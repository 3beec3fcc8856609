//! RepCoach CLI: count and grade exercise reps from keypoint streams.
//!
//! Usage:
//!   repcoach run <STREAM>        Run a session over a recorded pose stream
//!   repcoach demo                Run a session over a synthetic workout
//!   repcoach simulate <OUTPUT>   Write a synthetic pose stream to disk
//!   repcoach history             Show saved sessions
//!   repcoach profile <ACTION>    Print or validate exercise profiles

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use repcoach_common::config::AppConfig;
use repcoach_processing_core::ExerciseKind;

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "repcoach",
    about = "Rep counting and form feedback from pose keypoints",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit structured JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/repcoach/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that run a session.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Exercise to coach (tricep-pushdown, squat)
    #[arg(short, long)]
    exercise: Option<ExerciseKind>,

    /// Load the exercise profile from a JSON file instead of a preset
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Pace frames in real time
    #[arg(long)]
    realtime: bool,

    /// Target FPS
    #[arg(long)]
    fps: Option<u32>,

    /// History directory (overrides config)
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Do not save or export results
    #[arg(long)]
    no_save: bool,

    /// Only print the final summary
    #[arg(short, long)]
    quiet: bool,
}

/// Script for a synthetic workout.
#[derive(Args, Debug, Clone)]
pub struct MotionArgs {
    /// Number of reps to perform
    #[arg(long, default_value = "12")]
    reps: u32,

    /// Peak elbow/knee drift in pixels
    #[arg(long, default_value = "0.0")]
    swing: f64,

    /// Torso angle from vertical in degrees
    #[arg(long)]
    lean: Option<f64>,

    /// Keypoint jitter in pixels
    #[arg(long, default_value = "1.0")]
    jitter: f64,

    /// Drop the pose for a while, starting at this many milliseconds
    #[arg(long)]
    dropout_at: Option<u64>,

    /// Length of the drop-out in milliseconds
    #[arg(long, default_value = "1500")]
    dropout_ms: u64,

    /// Noise seed
    #[arg(long, default_value = "7")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session over a recorded JSONL pose stream
    Run {
        /// Path to the pose stream
        stream: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Run a session over a synthetic workout
    Demo {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        motion: MotionArgs,
    },

    /// Write a synthetic workout as a JSONL pose stream
    Simulate {
        /// Output file
        output: PathBuf,

        /// Exercise to perform
        #[arg(short, long, default_value = "tricep-pushdown")]
        exercise: ExerciseKind,

        #[command(flatten)]
        motion: MotionArgs,
    },

    /// Show saved sessions
    History {
        /// Print the full summary of the last session only
        #[arg(long)]
        last: bool,

        /// History directory (overrides config)
        #[arg(long)]
        history_dir: Option<PathBuf>,
    },

    /// Print or validate exercise profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print a built-in profile as JSON
    Show {
        exercise: ExerciseKind,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a profile file
    Validate {
        /// Path to the profile JSON
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    repcoach_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Run { stream, session } => commands::run::run(&config, stream, session).await,
        Commands::Demo { session, motion } => commands::demo::run(&config, session, motion).await,
        Commands::Simulate {
            output,
            exercise,
            motion,
        } => commands::simulate::run(output, exercise, motion).await,
        Commands::History { last, history_dir } => {
            commands::history::run(history_dir.unwrap_or(config.history_dir), last)
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show { exercise, output } => commands::profile::show(exercise, output),
            ProfileAction::Validate { path } => commands::profile::validate(path),
        },
    }
}
