//! Pose source backend implementations.
//!
//! - [`ReplaySource`] plays back a recorded JSONL pose stream.
//! - [`SyntheticSource`] generates a deterministic, scripted exercise.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use repcoach_common::error::{RepcoachError, RepcoachResult};
use repcoach_pose_model::frame::{parse_frames, parse_header, PoseFrame, PoseStreamHeader};
use repcoach_pose_model::keypoint::{Joint, Keypoint, Point2D, Skeleton, JOINT_COUNT};

use crate::PoseSource;

/// Replays frames from a JSONL file (or from memory).
pub struct ReplaySource {
    path: Option<PathBuf>,
    name: String,
    header: Option<PoseStreamHeader>,
    frames: VecDeque<PoseFrame>,
    loaded: bool,
}

impl ReplaySource {
    /// A source reading `path` lazily on the first frame request.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("replay:{}", path.display()),
            path: Some(path),
            header: None,
            frames: VecDeque::new(),
            loaded: false,
        }
    }

    /// A source over frames already in memory.
    pub fn from_frames(frames: Vec<PoseFrame>) -> Self {
        Self {
            path: None,
            name: "replay:memory".to_string(),
            header: None,
            frames: frames.into(),
            loaded: true,
        }
    }

    /// Stream header, once loaded (file sources only).
    pub fn header(&self) -> Option<&PoseStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet handed out.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    async fn load(&mut self) -> RepcoachResult<()> {
        self.loaded = true;
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.is_file() {
            return Err(RepcoachError::FileNotFound { path: path.clone() });
        }

        let content = tokio::fs::read_to_string(path).await?;
        self.header = parse_header(&content);
        let frames = parse_frames(&content)?;
        tracing::info!(
            path = %path.display(),
            frames = frames.len(),
            fps = self.header.as_ref().map(|h| h.fps),
            "Loaded pose stream"
        );
        self.frames = frames.into();
        Ok(())
    }
}

#[async_trait]
impl PoseSource for ReplaySource {
    async fn next_frame(&mut self) -> RepcoachResult<Option<PoseFrame>> {
        if !self.loaded {
            self.load().await?;
        }
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        match &self.path {
            Some(path) => path.is_file(),
            None => true,
        }
    }

    fn fps(&self) -> u32 {
        self.header.as_ref().map_or(30, |h| h.fps)
    }
}

/// Exercise a [`SyntheticSource`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntheticMotion {
    TricepPushdown,
    Squat,
}

/// A window of frames in which nobody is detected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    pub start_ms: u64,
    pub duration_ms: u64,
}

/// Script for a synthetic exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub motion: SyntheticMotion,
    pub reps: u32,
    pub fps: u32,
    /// Duration of one full rep.
    pub rep_period_ms: u64,
    /// Time spent holding the start position before the first rep.
    pub warmup_ms: u64,
    /// Time spent holding the start position after the last rep.
    pub cooldown_ms: u64,
    /// Peak horizontal drift of the working joint (elbow or knee), in pixels.
    pub swing_px: f64,
    /// Torso angle from vertical, in degrees (at full depth for squats).
    pub torso_lean_deg: f64,
    /// Per-coordinate noise amplitude, in pixels.
    pub jitter_px: f64,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropout: Option<Dropout>,
    pub width: u32,
    pub height: u32,
}

impl SyntheticConfig {
    /// Clean, textbook reps for `motion`.
    pub fn for_motion(motion: SyntheticMotion) -> Self {
        let (rep_period_ms, torso_lean_deg) = match motion {
            SyntheticMotion::TricepPushdown => (1_500, 20.0),
            SyntheticMotion::Squat => (2_000, 30.0),
        };
        Self {
            motion,
            reps: 12,
            fps: 30,
            rep_period_ms,
            warmup_ms: 4_500,
            cooldown_ms: 1_000,
            swing_px: 0.0,
            torso_lean_deg,
            jitter_px: 0.0,
            seed: 7,
            dropout: None,
            width: 640,
            height: 480,
        }
    }

    /// Total scripted duration.
    pub fn duration_ms(&self) -> u64 {
        self.warmup_ms + self.reps as u64 * self.rep_period_ms + self.cooldown_ms
    }
}

/// Deterministic scripted pose stream, filmed from the subject's right side.
pub struct SyntheticSource {
    config: SyntheticConfig,
    next_index: u64,
    total_frames: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let fps = config.fps.max(1) as u64;
        let total_frames = config.duration_ms() * fps / 1_000;
        Self {
            config,
            next_index: 0,
            total_frames,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn header(&self) -> PoseStreamHeader {
        PoseStreamHeader::new(
            "synthetic",
            self.config.fps,
            self.config.width,
            self.config.height,
        )
    }

    /// Every frame of the script, in order.
    pub fn frames(&self) -> Vec<PoseFrame> {
        (0..self.total_frames).map(|i| self.frame_at(i)).collect()
    }

    /// Frame `index` of the script.
    pub fn frame_at(&self, index: u64) -> PoseFrame {
        let t = index * 1_000 / self.config.fps.max(1) as u64;
        if let Some(dropout) = self.config.dropout {
            if t >= dropout.start_ms && t < dropout.start_ms + dropout.duration_ms {
                return PoseFrame::empty(t);
            }
        }

        let phase = self.rep_phase(t);
        let swing = self.config.swing_px * (2.0 * PI * phase.unwrap_or(0.0)).sin();
        let depth = phase.map_or(0.0, |p| (1.0 - (2.0 * PI * p).cos()) / 2.0);

        let mut skeleton = match self.config.motion {
            SyntheticMotion::TricepPushdown => self.tricep_pose(depth, swing),
            SyntheticMotion::Squat => self.squat_pose(depth, swing),
        };
        if self.config.jitter_px > 0.0 {
            for joint in Joint::ALL {
                let kp = skeleton.get_mut(joint);
                let key = joint.index() as u64 * 2;
                kp.x += self.config.jitter_px * noise(self.config.seed, index, key);
                kp.y += self.config.jitter_px * noise(self.config.seed, index, key + 1);
            }
        }
        PoseFrame::with_skeleton(t, skeleton)
    }

    /// Position within the current rep in `[0, 1)`, or `None` while resting.
    fn rep_phase(&self, t: u64) -> Option<f64> {
        let start = self.config.warmup_ms;
        let end = start + self.config.reps as u64 * self.config.rep_period_ms;
        if t < start || t >= end || self.config.rep_period_ms == 0 {
            return None;
        }
        let offset = (t - start) % self.config.rep_period_ms;
        Some(offset as f64 / self.config.rep_period_ms as f64)
    }

    /// `depth` 0 is arms bent (start), 1 is arms fully extended.
    fn tricep_pose(&self, depth: f64, swing: f64) -> Skeleton {
        let elbow_angle = (80.0 + 95.0 * depth).to_radians();
        let lean = self.config.torso_lean_deg.to_radians();

        let ankle = Point2D::new(320.0, 460.0);
        let knee = Point2D::new(322.0, 380.0);
        let hip = Point2D::new(320.0, 300.0);
        let shoulder = hip.offset(180.0 * lean.sin(), -180.0 * lean.cos());
        let elbow = shoulder.offset(swing, 110.0);
        let wrist = elbow.offset(100.0 * elbow_angle.sin(), -100.0 * elbow_angle.cos());

        build_skeleton(shoulder, [shoulder, elbow, wrist, hip, knee, ankle])
    }

    /// `depth` 0 is standing, 1 is the bottom of the squat.
    fn squat_pose(&self, depth: f64, drift: f64) -> Skeleton {
        let knee_angle = (178.0 - 108.0 * depth).to_radians();
        let torso = (10.0 + (self.config.torso_lean_deg - 10.0) * depth).to_radians();

        let ankle = Point2D::new(320.0, 460.0);
        let knee = ankle.offset(drift, -130.0);
        let hip = knee.offset(-130.0 * knee_angle.sin(), 130.0 * knee_angle.cos());
        let shoulder = hip.offset(170.0 * torso.sin(), -170.0 * torso.cos());
        let elbow = shoulder.offset(60.0, 40.0);
        let wrist = elbow.offset(60.0, 0.0);

        build_skeleton(shoulder, [shoulder, elbow, wrist, hip, knee, ankle])
    }
}

/// Right-side chain at full confidence, the far (left) side slightly offset
/// and partly occluded.
fn build_skeleton(head_base: Point2D, right: [Point2D; 6]) -> Skeleton {
    const NEAR: f64 = 0.9;
    const FAR: f64 = 0.5;
    const FACE: f64 = 0.8;

    let mut keypoints = [Keypoint::new(0.0, 0.0, 0.0); JOINT_COUNT];
    let nose = head_base.offset(15.0, -50.0);
    keypoints[Joint::Nose.index()] = Keypoint::new(nose.x, nose.y, FACE);
    for (joint, dx, dy) in [
        (Joint::LeftEye, -3.0, -5.0),
        (Joint::RightEye, 3.0, -5.0),
        (Joint::LeftEar, -12.0, 0.0),
        (Joint::RightEar, -8.0, 0.0),
    ] {
        let p = nose.offset(dx, dy);
        keypoints[joint.index()] = Keypoint::new(p.x, p.y, FACE);
    }

    let chain = [
        (Joint::RightShoulder, Joint::LeftShoulder),
        (Joint::RightElbow, Joint::LeftElbow),
        (Joint::RightWrist, Joint::LeftWrist),
        (Joint::RightHip, Joint::LeftHip),
        (Joint::RightKnee, Joint::LeftKnee),
        (Joint::RightAnkle, Joint::LeftAnkle),
    ];
    for ((near, far), p) in chain.into_iter().zip(right) {
        keypoints[near.index()] = Keypoint::new(p.x, p.y, NEAR);
        keypoints[far.index()] = Keypoint::new(p.x - 8.0, p.y, FAR);
    }
    Skeleton::from_array(keypoints)
}

/// Deterministic noise in `[-1, 1]` (splitmix64 finalizer).
fn noise(seed: u64, frame: u64, key: u64) -> f64 {
    let mut z = seed
        .wrapping_add(frame.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(key.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

#[async_trait]
impl PoseSource for SyntheticSource {
    async fn next_frame(&mut self) -> RepcoachResult<Option<PoseFrame>> {
        if self.next_index >= self.total_frames {
            return Ok(None);
        }
        let frame = self.frame_at(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        match self.config.motion {
            SyntheticMotion::TricepPushdown => "synthetic:tricep-pushdown",
            SyntheticMotion::Squat => "synthetic:squat",
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn fps(&self) -> u32 {
        self.config.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle_at(skeleton: &Skeleton, a: Joint, b: Joint, c: Joint) -> f64 {
        let (a, b, c) = (
            skeleton.get(a).position(),
            skeleton.get(b).position(),
            skeleton.get(c).position(),
        );
        let (ux, uy, vx, vy) = (a.x - b.x, a.y - b.y, c.x - b.x, c.y - b.y);
        let cos = (ux * vx + uy * vy) / ((ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt());
        cos.clamp(-1.0, 1.0).acos().to_degrees()
    }

    #[test]
    fn test_frame_count_and_timestamps() {
        let source = SyntheticSource::new(SyntheticConfig::for_motion(SyntheticMotion::Squat));
        // 4.5 s + 12 * 2 s + 1 s at 30 fps
        assert_eq!(source.total_frames(), 885);
        assert_eq!(source.frame_at(0).timestamp_ms, 0);
        assert_eq!(source.frame_at(1).timestamp_ms, 33);
        assert_eq!(source.frame_at(3).timestamp_ms, 100);
    }

    #[test]
    fn test_tricep_script_angles() {
        let source =
            SyntheticSource::new(SyntheticConfig::for_motion(SyntheticMotion::TricepPushdown));
        let rest = source.frame_at(0);
        let rest = rest.primary().unwrap();
        let elbow = angle_at(rest, Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist);
        assert!((elbow - 80.0).abs() < 1e-6);
        let back = angle_at(rest, Joint::RightShoulder, Joint::RightHip, Joint::RightAnkle);
        assert!((back - 160.0).abs() < 1e-6);

        // Mid-rep: 4.5 s warmup + half a 1.5 s period.
        let mid = source.frame_at(5_250 * 30 / 1_000);
        let elbow = angle_at(
            mid.primary().unwrap(),
            Joint::RightShoulder,
            Joint::RightElbow,
            Joint::RightWrist,
        );
        assert!(elbow > 170.0, "elbow = {elbow}");
    }

    #[test]
    fn test_squat_script_depth() {
        let source = SyntheticSource::new(SyntheticConfig::for_motion(SyntheticMotion::Squat));
        let standing = source.frame_at(0);
        let knee = angle_at(
            standing.primary().unwrap(),
            Joint::RightHip,
            Joint::RightKnee,
            Joint::RightAnkle,
        );
        assert!((knee - 178.0).abs() < 1e-6);

        let bottom = source.frame_at(5_500 * 30 / 1_000);
        let knee = angle_at(
            bottom.primary().unwrap(),
            Joint::RightHip,
            Joint::RightKnee,
            Joint::RightAnkle,
        );
        assert!((knee - 70.0).abs() < 1e-6, "knee = {knee}");
    }

    #[test]
    fn test_dropout_produces_empty_frames() {
        let mut config = SyntheticConfig::for_motion(SyntheticMotion::Squat);
        config.dropout = Some(Dropout {
            start_ms: 1_000,
            duration_ms: 500,
        });
        let source = SyntheticSource::new(config);
        assert!(source.frame_at(29).primary().is_some());
        assert!(source.frame_at(30).primary().is_none());
        assert!(source.frame_at(45).primary().is_some());
    }

    #[test]
    fn test_jitter_is_deterministic_and_bounded() {
        let mut config = SyntheticConfig::for_motion(SyntheticMotion::TricepPushdown);
        config.jitter_px = 3.0;
        let a = SyntheticSource::new(config.clone()).frame_at(10);
        let b = SyntheticSource::new(config).frame_at(10);
        assert_eq!(a, b);

        let clean = SyntheticSource::new(SyntheticConfig::for_motion(
            SyntheticMotion::TricepPushdown,
        ))
        .frame_at(10);
        for (noisy, exact) in a.skeletons[0]
            .keypoints()
            .iter()
            .zip(clean.skeletons[0].keypoints())
        {
            assert!((noisy.x - exact.x).abs() <= 3.0);
            assert!((noisy.y - exact.y).abs() <= 3.0);
        }
    }

    #[test]
    fn test_noise_range() {
        for i in 0..1_000 {
            let n = noise(1, i, 3);
            assert!((-1.0..=1.0).contains(&n));
        }
    }

    #[tokio::test]
    async fn test_synthetic_source_ends() {
        let mut config = SyntheticConfig::for_motion(SyntheticMotion::Squat);
        config.reps = 0;
        config.warmup_ms = 100;
        config.cooldown_ms = 0;
        let mut source = SyntheticSource::new(config);
        let mut count = 0;
        while source.next_frame().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_from_file() {
        let dir = std::env::temp_dir().join("repcoach_test_replay");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("poses.jsonl");

        let synthetic = SyntheticSource::new(SyntheticConfig::for_motion(SyntheticMotion::Squat));
        let frames: Vec<_> = (0..5).map(|i| synthetic.frame_at(i)).collect();
        let mut writer = crate::writer::FrameWriter::create(&path, &synthetic.header()).unwrap();
        writer.write_frames(&frames).unwrap();
        writer.finish().unwrap();

        let mut replay = ReplaySource::new(&path);
        assert!(replay.is_available());
        let first = replay.next_frame().await.unwrap().unwrap();
        assert_eq!(first, synthetic.frame_at(0));
        assert_eq!(replay.remaining(), 4);
        assert_eq!(replay.header().map(|h| h.fps), Some(30));
        assert_eq!(replay.fps(), 30);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let mut replay = ReplaySource::new("/definitely/not/here.jsonl");
        assert!(!replay.is_available());
        assert!(matches!(
            replay.next_frame().await,
            Err(RepcoachError::FileNotFound { .. })
        ));
    }
}
