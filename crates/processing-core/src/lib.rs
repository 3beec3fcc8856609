//! RepCoach Processing Core
//!
//! Turns a stream of pose keypoints into rep counts and form feedback:
//! - **Smoothing:** EMA joint positions and trimmed-mean angles
//! - **Geometry:** Joint angles, lean from vertical, side selection
//! - **Stability:** Rolling-window instability (swinging) detection
//! - **Feedback:** Hysteresis-debounced, persisted messages
//! - **Engine:** The profile-driven waiting/countdown/counting state machine
//! - **Scoring:** Session performance score
//!
//! This crate is pure computation: no async, and no I/O beyond loading
//! profile files.
//! All inputs are data; all outputs are data.

pub mod engine;
pub mod feedback;
pub mod geometry;
pub mod profile;
pub mod scoring;
pub mod smoothing;
pub mod stability;
pub mod state;

pub use engine::{Condition, ExerciseEngine};
pub use feedback::FeedbackDebouncer;
pub use profile::{ExerciseKind, ExerciseProfile, ProfileError};
pub use state::ExerciseSession;
