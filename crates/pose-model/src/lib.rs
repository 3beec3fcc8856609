//! RepCoach Pose Model
//!
//! Defines the core data contracts shared by every RepCoach crate:
//! - **Keypoints:** The 17-joint skeleton produced by the pose estimator
//! - **Frames:** Timestamped per-frame observations, stored as JSONL
//! - **Results:** The immutable per-session results record and bounded history
//! - **Output:** The per-frame record a renderer consumes
//!
//! Keypoint coordinates are in the pose estimator's image space (pixels).
//! Confidence scores are in `[0.0, 1.0]`.

pub mod frame;
pub mod keypoint;
pub mod output;
pub mod results;

pub use frame::*;
pub use keypoint::*;
pub use output::*;
pub use results::*;
