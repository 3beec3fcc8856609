//! RepCoach Session
//!
//! Runs a training session: pulls frames from a pose source, feeds them to
//! the exercise engine at a capped frame rate, and hands the finished
//! results record to the history store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             TrainingSession              │
//! │  ┌────────────┐      ┌────────────────┐  │
//! │  │ PoseSource │ ───▶ │ ExerciseEngine │  │
//! │  └────────────┘      └───────┬────────┘  │
//! │                              │ record    │
//! │                              ▼           │
//! │  ┌────────────────────────────────────┐  │
//! │  │       HistoryStore (Disk)          │  │
//! │  │  history.json  last_session.json   │  │
//! │  │  exercise_results_<id>.json/.txt   │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```

pub mod history;
pub mod session;

pub use history::{ExportPaths, HistoryError, HistoryStore};
pub use session::*;
