//! Exercise profiles.
//!
//! Every threshold, band, message, and policy the engine uses lives in an
//! [`ExerciseProfile`]. Exercises are data: adding one means writing a new
//! profile (in code or as JSON), not new control flow.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use repcoach_pose_model::keypoint::{Joint, Limb, Side, Skeleton};
use repcoach_pose_model::results::IssueKind;

use crate::feedback::{DebounceConfig, ReleasePolicy};
use crate::geometry::{self, BodyRegion, TieBreak, DEGENERATE_ANGLE};
use crate::stability::StabilityWindowConfig;

/// A one-sided bound on a measured value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Holds when the value is strictly greater.
    Above(f64),
    /// Holds when the value is strictly less.
    Below(f64),
}

impl Bound {
    pub fn contains(self, value: f64) -> bool {
        match self {
            Bound::Above(limit) => value > limit,
            Bound::Below(limit) => value < limit,
        }
    }

    pub fn limit(self) -> f64 {
        match self {
            Bound::Above(limit) | Bound::Below(limit) => limit,
        }
    }
}

/// A scalar derived from a skeleton on the analyzed side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    /// Angle at `vertex` between `a` and `c`. When `fallback` is set and
    /// `vertex` or `c` is invisible, the fallback value is used instead.
    /// Visibility of `a` is not checked.
    Angle {
        a: Limb,
        vertex: Limb,
        c: Limb,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<f64>,
    },
    /// Signed lean of `pivot` away from the vertical through it, positive
    /// when `pivot` is forward of `top`.
    Lean { top: Limb, pivot: Limb },
    /// Signed lean positive when `top` is forward of `pivot`.
    Tilt { top: Limb, pivot: Limb },
}

/// Result of evaluating a [`Metric`] on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    /// The joints coincide; no meaningful value exists.
    Degenerate,
    /// Required joints are not visible and there is no fallback.
    Unavailable,
}

impl Metric {
    /// Evaluate on `skeleton` for `side`.
    pub fn measure(&self, skeleton: &Skeleton, side: Side, visibility: f64) -> Reading {
        match *self {
            Metric::Angle {
                a,
                vertex,
                c,
                fallback,
            } => {
                if let Some(fallback) = fallback {
                    let hidden = [vertex, c]
                        .iter()
                        .any(|limb| !skeleton.limb(*limb, side).is_visible(visibility));
                    if hidden {
                        return Reading::Value(fallback);
                    }
                }
                let pos = |limb: Limb| skeleton.limb(limb, side).position();
                match geometry::angle_between(pos(a), pos(vertex), pos(c)) {
                    Some(angle) => Reading::Value(angle),
                    None => Reading::Degenerate,
                }
            }
            Metric::Lean { top, pivot } | Metric::Tilt { top, pivot } => {
                let top_kp = skeleton.limb(top, side);
                let pivot_kp = skeleton.limb(pivot, side);
                if !top_kp.is_visible(visibility) || !pivot_kp.is_visible(visibility) {
                    return Reading::Unavailable;
                }
                let value = match self {
                    Metric::Tilt { .. } => {
                        geometry::tilt(top_kp.position(), pivot_kp.position(), side)
                    }
                    _ => geometry::vertical_lean(top_kp.position(), pivot_kp.position(), side),
                };
                value.map_or(Reading::Degenerate, Reading::Value)
            }
        }
    }

    /// Value substituted for a degenerate reading when nothing was smoothed yet.
    pub fn sentinel(&self) -> f64 {
        match self {
            Metric::Angle { .. } => DEGENERATE_ANGLE,
            Metric::Lean { .. } | Metric::Tilt { .. } => 0.0,
        }
    }

    /// Joint-chain segments drawn for this metric.
    pub fn segments(&self, side: Side) -> Vec<(Joint, Joint)> {
        match *self {
            Metric::Angle { a, vertex, c, .. } => vec![
                (a.joint(side), vertex.joint(side)),
                (vertex.joint(side), c.joint(side)),
            ],
            Metric::Lean { top, pivot } | Metric::Tilt { top, pivot } => {
                vec![(top.joint(side), pivot.joint(side))]
            }
        }
    }
}

/// Which way the primary angle moves during the working phase of a rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepDirection {
    /// "Down" means the angle is above the down threshold (arm extension).
    Rising,
    /// "Down" means the angle is below the down threshold (squat depth).
    Falling,
}

impl RepDirection {
    /// Whether `extreme` should be replaced by `value`.
    pub fn is_further(self, value: f64, extreme: f64) -> bool {
        match self {
            RepDirection::Rising => value > extreme,
            RepDirection::Falling => value < extreme,
        }
    }
}

/// The angle that drives rep counting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimaryAngle {
    pub metric: Metric,
    pub direction: RepDirection,
    /// Crossing this moves the cycle from up to down (and counts the rep).
    pub down_threshold: f64,
    /// Crossing back over this moves the cycle from down to up.
    pub up_threshold: f64,
    /// Region the angle must sit in to count as the ready position.
    pub ready: Bound,
}

impl PrimaryAngle {
    pub fn is_down(&self, angle: f64) -> bool {
        match self.direction {
            RepDirection::Rising => angle > self.down_threshold,
            RepDirection::Falling => angle < self.down_threshold,
        }
    }

    pub fn is_up(&self, angle: f64) -> bool {
        match self.direction {
            RepDirection::Rising => angle < self.up_threshold,
            RepDirection::Falling => angle > self.up_threshold,
        }
    }
}

/// How the analyzed side is chosen each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideSelection {
    pub region: BodyRegion,
    pub tie_break: TieBreak,
    /// Side assumed before the first frame.
    pub initial: Side,
}

/// Horizontal offset tracked for instability, `joint.x - reference.x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    pub joint: Limb,
    pub reference: Limb,
    #[serde(default)]
    pub window: StabilityWindowConfig,
    /// Scores above this make a rep incorrect.
    pub stable_threshold: f64,
    /// Scores above this are a live fault.
    pub major_threshold: f64,
}

/// Smoothing constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// EMA weight of the newest position sample.
    pub position_alpha: f64,
    /// Angle history length.
    pub angle_window: usize,
}

/// Ready-position hold and countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyConfig {
    /// Frames the ready position must be held.
    pub hold_frames: u32,
    /// Hold counter increase per ready frame.
    pub gain: u32,
    /// Hold counter decrease per frame out of position.
    pub decay: u32,
    pub countdown_ms: u64,
    /// Prompt shown while waiting for the ready position.
    pub prompt: String,
}

/// Which measurement a form rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleInput {
    Secondary,
    Lean,
    Instability,
}

/// A continuously monitored, debounced fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCheck {
    pub bound: Bound,
    pub message: String,
}

/// Where an instructional arrow starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Joint(Limb),
    Midpoint(Limb, Limb),
}

impl Anchor {
    pub fn limbs(&self) -> Vec<Limb> {
        match *self {
            Anchor::Joint(limb) => vec![limb],
            Anchor::Midpoint(a, b) => vec![a, b],
        }
    }
}

/// Arrow drawn while a rule's live check is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowCue {
    pub anchor: Anchor,
    pub dx: f64,
    pub dy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One form fault and how it is detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRule {
    pub issue: IssueKind,
    pub input: RuleInput,
    /// Debounced check run every counting frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveCheck>,
    /// Check run once, at the moment a rep is counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_limit: Option<Bound>,
    /// Notice shown after a rep fails this rule.
    pub notice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<ArrowCue>,
}

/// Required extreme of the primary angle during the down phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeOfMotionRule {
    pub issue: IssueKind,
    /// Rising: the maximum must reach at least this. Falling: the minimum
    /// must reach at most this.
    pub target: f64,
    pub notice: String,
}

impl RangeOfMotionRule {
    pub fn is_met(&self, direction: RepDirection, extreme: f64) -> bool {
        match direction {
            RepDirection::Rising => extreme >= self.target,
            RepDirection::Falling => extreme <= self.target,
        }
    }
}

/// What happens after too many frames without a usable pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LossPolicy {
    /// Return to waiting, keeping cumulative results.
    Reset,
    /// Keep state and show a persistent warning.
    Warn { message: String },
}

/// Detection-loss handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossConfig {
    /// Consecutive lost frames before the policy applies.
    pub frames: u32,
    pub policy: LossPolicy,
}

/// Score deduction for form issues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyPolicy {
    /// Sum of all issue occurrences, capped.
    TotalOccurrencesCapped { cap: u32 },
    /// Fixed points per issue kind that occurred at least once.
    PerDistinctIssue { points: u32 },
}

/// Everything that distinguishes one exercise from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    /// Identifier (`tricep-pushdown`).
    pub name: String,
    /// Display name (`Tricep Pushdown`).
    pub workout_name: String,
    /// Joints count as visible strictly above this confidence.
    pub visibility_threshold: f64,
    pub smoothing: SmoothingConfig,
    pub side: SideSelection,
    /// Limbs (checked on both sides) a usable frame needs.
    pub required: Vec<Limb>,
    /// How many required joints may be missing.
    pub max_missing: usize,
    pub primary: PrimaryAngle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean: Option<Metric>,
    pub stability: StabilityConfig,
    pub debounce: DebounceConfig,
    pub ready: ReadyConfig,
    pub min_rep_interval_ms: u64,
    pub rep_target: u32,
    /// How long a counter highlight lasts.
    pub highlight_ms: u64,
    #[serde(default)]
    pub rules: Vec<FormRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_of_motion: Option<RangeOfMotionRule>,
    pub loss: LossConfig,
    pub penalty: PenaltyPolicy,
}

/// Profile validation and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("{field} = {value} is outside {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("primary thresholds are inverted for a {direction:?} rep: down {down}, up {up}")]
    InvertedThresholds {
        direction: RepDirection,
        down: f64,
        up: f64,
    },

    #[error("primary metric must be a three-joint angle")]
    PrimaryNotAngle,

    #[error("rule for {issue:?} reads {input:?}, which this profile does not measure")]
    MissingInput { issue: IssueKind, input: RuleInput },

    #[error("rule for {0:?} has neither a live check nor a rep limit")]
    EmptyRule(IssueKind),

    #[error("{0:?} is defined more than once")]
    DuplicateIssue(IssueKind),

    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ExerciseProfile {
    /// Concrete required joints on both sides.
    pub fn required_joints(&self) -> Vec<Joint> {
        self.required
            .iter()
            .flat_map(|limb| [limb.joint(Side::Left), limb.joint(Side::Right)])
            .collect()
    }

    /// Every issue this profile can report, in tally order.
    pub fn issues(&self) -> BTreeSet<IssueKind> {
        self.rules
            .iter()
            .map(|rule| rule.issue)
            .chain(self.range_of_motion.iter().map(|rom| rom.issue))
            .collect()
    }

    /// Metric a rule input reads, if it is an angle channel.
    pub fn metric_for(&self, input: RuleInput) -> Option<&Metric> {
        match input {
            RuleInput::Secondary => self.secondary.as_ref(),
            RuleInput::Lean => self.lean.as_ref(),
            RuleInput::Instability => None,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ProfileError> {
        in_range(
            "visibility_threshold",
            self.visibility_threshold,
            0.0,
            1.0,
            "[0, 1]",
        )?;
        if !(self.smoothing.position_alpha > 0.0 && self.smoothing.position_alpha <= 1.0) {
            return Err(ProfileError::OutOfRange {
                field: "smoothing.position_alpha",
                value: self.smoothing.position_alpha,
                expected: "(0, 1]",
            });
        }
        at_least_one("smoothing.angle_window", self.smoothing.angle_window as u64)?;
        at_least_one("debounce.threshold", self.debounce.threshold as u64)?;
        at_least_one("debounce.persistence", self.debounce.persistence as u64)?;
        at_least_one("ready.hold_frames", self.ready.hold_frames as u64)?;
        at_least_one("rep_target", self.rep_target as u64)?;
        at_least_one("loss.frames", self.loss.frames as u64)?;
        at_least_one(
            "stability.window.offset_window",
            self.stability.window.offset_window as u64,
        )?;
        at_least_one(
            "stability.window.range_window",
            self.stability.window.range_window as u64,
        )?;
        in_range(
            "stability.window.trim_fraction",
            self.stability.window.trim_fraction,
            0.0,
            0.49,
            "[0, 0.49]",
        )?;
        if self.stability.stable_threshold > self.stability.major_threshold {
            return Err(ProfileError::OutOfRange {
                field: "stability.stable_threshold",
                value: self.stability.stable_threshold,
                expected: "[0, major_threshold]",
            });
        }
        if self.max_missing > self.required_joints().len() {
            return Err(ProfileError::OutOfRange {
                field: "max_missing",
                value: self.max_missing as f64,
                expected: "[0, required joint count]",
            });
        }

        if !matches!(self.primary.metric, Metric::Angle { .. }) {
            return Err(ProfileError::PrimaryNotAngle);
        }
        let p = &self.primary;
        let inverted = match p.direction {
            RepDirection::Rising => p.up_threshold >= p.down_threshold,
            RepDirection::Falling => p.up_threshold <= p.down_threshold,
        };
        if inverted {
            return Err(ProfileError::InvertedThresholds {
                direction: p.direction,
                down: p.down_threshold,
                up: p.up_threshold,
            });
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if rule.input != RuleInput::Instability && self.metric_for(rule.input).is_none() {
                return Err(ProfileError::MissingInput {
                    issue: rule.issue,
                    input: rule.input,
                });
            }
            if rule.live.is_none() && rule.rep_limit.is_none() {
                return Err(ProfileError::EmptyRule(rule.issue));
            }
            if !seen.insert(rule.issue) {
                return Err(ProfileError::DuplicateIssue(rule.issue));
            }
        }
        if let Some(rom) = &self.range_of_motion {
            if !seen.insert(rom.issue) {
                return Err(ProfileError::DuplicateIssue(rom.issue));
            }
        }
        Ok(())
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: ExerciseProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Cable tricep pushdown, filmed from the side.
    pub fn tricep_pushdown() -> Self {
        let fault = |message: &str, bound| {
            Some(LiveCheck {
                bound,
                message: message.to_string(),
            })
        };
        Self {
            name: "tricep-pushdown".to_string(),
            workout_name: "Tricep Pushdown".to_string(),
            visibility_threshold: 0.3,
            smoothing: SmoothingConfig {
                position_alpha: 0.5,
                angle_window: 10,
            },
            side: SideSelection {
                region: BodyRegion::Upper,
                tie_break: TieBreak::Previous,
                initial: Side::Right,
            },
            required: vec![Limb::Shoulder, Limb::Elbow, Limb::Wrist, Limb::Hip],
            max_missing: 2,
            primary: PrimaryAngle {
                metric: Metric::Angle {
                    a: Limb::Shoulder,
                    vertex: Limb::Elbow,
                    c: Limb::Wrist,
                    fallback: None,
                },
                direction: RepDirection::Rising,
                down_threshold: 130.0,
                up_threshold: 100.0,
                ready: Bound::Below(120.0),
            },
            secondary: Some(Metric::Angle {
                a: Limb::Shoulder,
                vertex: Limb::Hip,
                c: Limb::Ankle,
                fallback: Some(160.0),
            }),
            lean: Some(Metric::Lean {
                top: Limb::Shoulder,
                pivot: Limb::Elbow,
            }),
            stability: StabilityConfig {
                joint: Limb::Elbow,
                reference: Limb::Shoulder,
                window: StabilityWindowConfig::default(),
                stable_threshold: 15.0,
                major_threshold: 30.0,
            },
            debounce: DebounceConfig {
                threshold: 8,
                persistence: 20,
                release: ReleasePolicy::Decay,
            },
            ready: ReadyConfig {
                hold_frames: 30,
                gain: 1,
                decay: 2,
                countdown_ms: 3_000,
                prompt: "Get in position (arms bent)".to_string(),
            },
            min_rep_interval_ms: 500,
            rep_target: 12,
            highlight_ms: 500,
            rules: vec![
                FormRule {
                    issue: IssueKind::BackTooStraight,
                    input: RuleInput::Secondary,
                    live: fault("Bend your back slightly forward", Bound::Above(170.0)),
                    rep_limit: Some(Bound::Above(170.0)),
                    notice: "Back too straight on last rep".to_string(),
                    cue: Some(ArrowCue {
                        anchor: Anchor::Midpoint(Limb::Shoulder, Limb::Hip),
                        dx: 0.0,
                        dy: 60.0,
                        label: Some("Tilt forward".to_string()),
                    }),
                },
                FormRule {
                    issue: IssueKind::BackTooTilted,
                    input: RuleInput::Secondary,
                    live: fault("Straighten your back a bit", Bound::Below(143.6)),
                    rep_limit: Some(Bound::Below(143.6)),
                    notice: "Back too tilted on last rep".to_string(),
                    cue: Some(ArrowCue {
                        anchor: Anchor::Midpoint(Limb::Shoulder, Limb::Hip),
                        dx: 0.0,
                        dy: -60.0,
                        label: Some("Straighten up".to_string()),
                    }),
                },
                FormRule {
                    issue: IssueKind::ElbowLeaningForward,
                    input: RuleInput::Lean,
                    live: fault("Keep your elbows by your sides", Bound::Above(30.0)),
                    rep_limit: None,
                    notice: "Elbows drifted forward on last rep".to_string(),
                    cue: None,
                },
                FormRule {
                    issue: IssueKind::ElbowSwinging,
                    input: RuleInput::Instability,
                    live: fault("Stop swinging elbows!", Bound::Above(30.0)),
                    rep_limit: Some(Bound::Above(15.0)),
                    notice: "Too much elbow swinging on last rep".to_string(),
                    cue: Some(ArrowCue {
                        anchor: Anchor::Joint(Limb::Elbow),
                        dx: -50.0,
                        dy: 0.0,
                        label: None,
                    }),
                },
            ],
            range_of_motion: Some(RangeOfMotionRule {
                issue: IssueKind::ElbowNotExtended,
                target: 160.0,
                notice: "Arms not fully extended on last rep".to_string(),
            }),
            loss: LossConfig {
                frames: 30,
                policy: LossPolicy::Reset,
            },
            penalty: PenaltyPolicy::TotalOccurrencesCapped { cap: 25 },
        }
    }

    /// Bodyweight squat, filmed from the side.
    pub fn squat() -> Self {
        Self {
            name: "squat".to_string(),
            workout_name: "Squat".to_string(),
            visibility_threshold: 0.2,
            smoothing: SmoothingConfig {
                position_alpha: 0.2,
                angle_window: 10,
            },
            side: SideSelection {
                region: BodyRegion::Lower,
                tie_break: TieBreak::Right,
                initial: Side::Right,
            },
            required: vec![Limb::Shoulder, Limb::Hip, Limb::Knee, Limb::Ankle],
            max_missing: 2,
            primary: PrimaryAngle {
                metric: Metric::Angle {
                    a: Limb::Hip,
                    vertex: Limb::Knee,
                    c: Limb::Ankle,
                    fallback: None,
                },
                direction: RepDirection::Falling,
                down_threshold: 100.0,
                up_threshold: 160.0,
                ready: Bound::Above(160.0),
            },
            secondary: Some(Metric::Tilt {
                top: Limb::Shoulder,
                pivot: Limb::Hip,
            }),
            lean: None,
            stability: StabilityConfig {
                joint: Limb::Knee,
                reference: Limb::Ankle,
                window: StabilityWindowConfig::default(),
                stable_threshold: 20.0,
                major_threshold: 35.0,
            },
            debounce: DebounceConfig {
                threshold: 3,
                persistence: 5,
                release: ReleasePolicy::Immediate,
            },
            ready: ReadyConfig {
                hold_frames: 30,
                gain: 1,
                decay: 2,
                countdown_ms: 3_000,
                prompt: "Get in position (stand tall)".to_string(),
            },
            min_rep_interval_ms: 500,
            rep_target: 12,
            highlight_ms: 500,
            rules: vec![
                FormRule {
                    issue: IssueKind::TorsoTooFarForward,
                    input: RuleInput::Secondary,
                    live: Some(LiveCheck {
                        bound: Bound::Above(45.0),
                        message: "Keep your chest up".to_string(),
                    }),
                    rep_limit: Some(Bound::Above(45.0)),
                    notice: "Leaned too far forward on last rep".to_string(),
                    cue: Some(ArrowCue {
                        anchor: Anchor::Joint(Limb::Shoulder),
                        dx: 0.0,
                        dy: -60.0,
                        label: Some("Chest up".to_string()),
                    }),
                },
                FormRule {
                    issue: IssueKind::KneesDrifting,
                    input: RuleInput::Instability,
                    live: Some(LiveCheck {
                        bound: Bound::Above(35.0),
                        message: "Keep your knees steady".to_string(),
                    }),
                    rep_limit: Some(Bound::Above(20.0)),
                    notice: "Knees drifted on last rep".to_string(),
                    cue: None,
                },
            ],
            range_of_motion: Some(RangeOfMotionRule {
                issue: IssueKind::NotDeepEnough,
                target: 95.0,
                notice: "Not deep enough on last rep".to_string(),
            }),
            loss: LossConfig {
                frames: 90,
                policy: LossPolicy::Warn {
                    message: "Lost tracking".to_string(),
                },
            },
            penalty: PenaltyPolicy::PerDistinctIssue { points: 5 },
        }
    }
}

fn in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<(), ProfileError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ProfileError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn at_least_one(field: &'static str, value: u64) -> Result<(), ProfileError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ProfileError::OutOfRange {
            field,
            value: value as f64,
            expected: ">= 1",
        })
    }
}

/// Built-in exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    TricepPushdown,
    Squat,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::TricepPushdown, ExerciseKind::Squat];

    pub fn profile(self) -> ExerciseProfile {
        match self {
            ExerciseKind::TricepPushdown => ExerciseProfile::tricep_pushdown(),
            ExerciseKind::Squat => ExerciseProfile::squat(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::TricepPushdown => "tricep-pushdown",
            ExerciseKind::Squat => "squat",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tricep-pushdown" | "tricep_pushdown" | "tricep" => Ok(ExerciseKind::TricepPushdown),
            "squat" => Ok(ExerciseKind::Squat),
            other => Err(format!(
                "unknown exercise '{other}' (expected tricep-pushdown or squat)"
            )),
        }
    }
}
