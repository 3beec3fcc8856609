//! Per-frame pose observations.
//!
//! Pose streams are stored as JSONL: an optional `# {header}` line followed
//! by one [`PoseFrame`] object per line. Lines starting with `#` are treated
//! as comments when parsing frames.

use serde::{Deserialize, Serialize};

use crate::keypoint::Skeleton;

/// Milliseconds on the driver's monotonic clock since stream start.
pub type TimestampMs = u64;

/// Metadata written as the first (comment) line of a pose stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Where the keypoints came from (estimator or generator name).
    pub source: String,

    /// Nominal frame rate of the stream.
    pub fps: u32,

    /// Source image dimensions in pixels.
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,

    /// Wall-clock time at stream start (RFC 3339).
    pub epoch_wall: String,
}

impl PoseStreamHeader {
    pub fn new(source: impl Into<String>, fps: u32, width: u32, height: u32) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            source: source.into(),
            fps,
            width,
            height,
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One frame's worth of estimator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Monotonic milliseconds since stream start.
    #[serde(rename = "t")]
    pub timestamp_ms: TimestampMs,

    /// Detected people. Empty when nobody was found.
    #[serde(default)]
    pub skeletons: Vec<Skeleton>,
}

impl PoseFrame {
    /// A frame with a single detected person.
    pub fn with_skeleton(timestamp_ms: TimestampMs, skeleton: Skeleton) -> Self {
        Self {
            timestamp_ms,
            skeletons: vec![skeleton],
        }
    }

    /// A frame in which nobody was detected.
    pub fn empty(timestamp_ms: TimestampMs) -> Self {
        Self {
            timestamp_ms,
            skeletons: vec![],
        }
    }

    /// The person the trainer follows: always the first detection.
    pub fn primary(&self) -> Option<&Skeleton> {
        self.skeletons.first()
    }
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<PoseFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Parse the `# {header}` line if the content starts with one.
pub fn parse_header(jsonl: &str) -> Option<PoseStreamHeader> {
    let first = jsonl.lines().map(str::trim).find(|line| !line.is_empty())?;
    let json = first.strip_prefix('#')?.trim();
    serde_json::from_str(json).ok()
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[PoseFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
