//! Per-frame render output.
//!
//! The engine emits exactly one [`FrameOutput`] per processed frame. It is the
//! only thing a renderer needs: points, segments, arrows, feedback text, and
//! counters are all resolved to plain values here.

use serde::{Deserialize, Serialize};

use crate::keypoint::{Joint, Point2D, Side};
use crate::results::{IssueKind, RepBreakdown, RepVerdict, ResultsRecord};

/// How a feedback message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Setup instruction ("Get in position").
    Prompt,
    /// Live form fault.
    Fault,
    /// Explanation about the last rep.
    Notice,
}

impl Severity {
    /// Display colour as a hex string.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Prompt => "#FFFF00",
            Severity::Fault => "#FF0000",
            Severity::Notice => "#FFA500",
        }
    }
}

/// A feedback message as shown this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackView {
    pub message: String,
    pub severity: Severity,
    /// `[0.3, 1.0]`, fading as the message ages.
    pub opacity: f64,
}

/// An instructional arrow drawn over the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub from: Point2D,
    pub to: Point2D,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub color: String,
}

/// A visible keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub joint: Joint,
    pub position: Point2D,
    pub confidence: f64,
}

/// Drawing emphasis for a skeleton segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Off-side or midline connection.
    Background,
    /// Connection on the analyzed side.
    Side,
    /// Joint chain of the primary angle.
    Primary,
    /// Joint chain of the secondary angle.
    Secondary,
}

impl Emphasis {
    pub fn color(self) -> &'static str {
        match self {
            Emphasis::Background => "#FFFFFF",
            Emphasis::Side | Emphasis::Primary => "#00FF00",
            Emphasis::Secondary => "#FFC800",
        }
    }

    /// Stroke width in pixels.
    pub fn width(self) -> u32 {
        match self {
            Emphasis::Background | Emphasis::Side => 2,
            Emphasis::Primary | Emphasis::Secondary => 5,
        }
    }
}

/// A line between two visible joints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSegment {
    pub from: Joint,
    pub to: Joint,
    pub a: Point2D,
    pub b: Point2D,
    pub emphasis: Emphasis,
}

/// Counter that flashes after a rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightTarget {
    CorrectCounter,
    IncorrectCounter,
}

impl HighlightTarget {
    pub fn color(self) -> &'static str {
        match self {
            HighlightTarget::CorrectCounter => "#4CAF50",
            HighlightTarget::IncorrectCounter => "#FF5252",
        }
    }
}

/// A transient highlight, shown until `expires_at_ms` on the frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub target: HighlightTarget,
    pub expires_at_ms: u64,
}

impl Highlight {
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Waiting,
    Counting,
}

/// Position within a single rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepCycle {
    #[default]
    Up,
    Down,
}

/// Smoothed quantities the engine analyzed this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Primary angle (degrees).
    pub primary: f64,
    /// Secondary angle (degrees).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<f64>,
    /// Lean from vertical (degrees).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean: Option<f64>,
    /// Rolling instability score (pixels).
    pub instability: f64,
}

/// Something notable that happened on a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    CountdownStarted,
    CountdownCancelled,
    CountingStarted,
    RepCounted {
        rep: u32,
        verdict: RepVerdict,
        failed: Vec<IssueKind>,
    },
    RangeOfMotionIssue {
        issue: IssueKind,
        extreme: f64,
    },
    TrackingLost {
        missed_frames: u32,
    },
    TrackingReset,
    SessionCompleted {
        record: Box<ResultsRecord>,
    },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Processed-frame index.
    pub frame: u64,
    pub timestamp_ms: u64,
    pub phase: Phase,
    pub cycle: RepCycle,
    /// Analyzed body side, when a usable pose was seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Measurements>,
    /// Ready-position hold, `[0.0, 1.0]`.
    pub hold_progress: f64,
    /// Whole seconds left on the countdown, while one runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_secs: Option<u32>,
    /// Session-wide totals.
    pub totals: RepBreakdown,
    /// Counts for the current set (reset when counting starts).
    pub display: RepBreakdown,
    pub points: Vec<RenderPoint>,
    pub segments: Vec<RenderSegment>,
    pub arrows: Vec<Arrow>,
    pub feedback: Vec<FeedbackView>,
    pub highlights: Vec<Highlight>,
    pub events: Vec<EngineEvent>,
    pub finished: bool,
}

impl FrameOutput {
    /// The rep counted on this frame, if any.
    pub fn counted_rep(&self) -> Option<(u32, RepVerdict)> {
        self.events.iter().find_map(|event| match event {
            EngineEvent::RepCounted { rep, verdict, .. } => Some((*rep, *verdict)),
            _ => None,
        })
    }

    /// The results record, on the frame the session completed.
    pub fn completed_record(&self) -> Option<&ResultsRecord> {
        self.events.iter().find_map(|event| match event {
            EngineEvent::SessionCompleted { record } => Some(record.as_ref()),
            _ => None,
        })
    }

    /// Whether a feedback message with this exact text is shown.
    pub fn shows(&self, message: &str) -> bool {
        self.feedback.iter().any(|f| f.message == message)
    }
}
