//! Temporal smoothing of joint positions and derived angles.
//!
//! Positions use an exponential moving average per joint. Angles use a short
//! trimmed moving average, which rejects single-frame spikes better than an
//! EMA does.

use std::collections::{BTreeMap, VecDeque};

use repcoach_pose_model::keypoint::{Joint, Point2D, Skeleton, JOINT_COUNT};

/// Exponential smoothing of joint coordinates.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    alpha: f64,
    state: [Option<Point2D>; JOINT_COUNT],
}

impl PositionSmoother {
    /// `alpha` is the weight of the new sample, in `(0.0, 1.0]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            state: [None; JOINT_COUNT],
        }
    }

    /// Smooth one joint. The first observation seeds the state unchanged.
    pub fn smooth(&mut self, joint: Joint, raw: Point2D) -> Point2D {
        let slot = &mut self.state[joint.index()];
        let next = match *slot {
            None => raw,
            Some(prev) => Point2D::new(
                self.alpha * raw.x + (1.0 - self.alpha) * prev.x,
                self.alpha * raw.y + (1.0 - self.alpha) * prev.y,
            ),
        };
        *slot = Some(next);
        next
    }

    /// Smooth every joint above `visibility`. Other joints pass through and
    /// leave their state untouched.
    pub fn smooth_skeleton(&mut self, skeleton: &Skeleton, visibility: f64) -> Skeleton {
        let mut out = skeleton.clone();
        for (joint, kp) in skeleton.iter() {
            if kp.is_visible(visibility) {
                let smoothed = self.smooth(joint, kp.position());
                *out.get_mut(joint) = kp.with_position(smoothed);
            }
        }
        out
    }

    /// Last smoothed position of `joint`, if it has been seen.
    pub fn last(&self, joint: Joint) -> Option<Point2D> {
        self.state[joint.index()]
    }

    pub fn reset(&mut self) {
        self.state = [None; JOINT_COUNT];
    }
}

/// A named scalar signal smoothed by [`AngleSmoother`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AngleChannel {
    Primary,
    Secondary,
    Lean,
}

/// Trimmed moving-average smoothing of named angles.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    window: usize,
    history: BTreeMap<AngleChannel, VecDeque<f64>>,
    last: BTreeMap<AngleChannel, f64>,
}

impl AngleSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            history: BTreeMap::new(),
            last: BTreeMap::new(),
        }
    }

    /// Push a raw value and return the smoothed one.
    pub fn smooth(&mut self, channel: AngleChannel, raw: f64) -> f64 {
        let samples = self.history.entry(channel).or_default();
        samples.push_back(raw);
        while samples.len() > self.window {
            samples.pop_front();
        }

        let value = trimmed_mean(samples.make_contiguous());
        self.last.insert(channel, value);
        value
    }

    /// Most recent smoothed value for `channel`.
    pub fn last(&self, channel: AngleChannel) -> Option<f64> {
        self.last.get(&channel).copied()
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last.clear();
    }
}

/// Mean of `samples`, dropping the single lowest and highest value when there
/// are at least four. Empty input yields 0.
pub fn trimmed_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if samples.len() < 4 {
        return samples.iter().sum::<f64>() / samples.len() as f64;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let inner = &sorted[1..sorted.len() - 1];
    inner.iter().sum::<f64>() / inner.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcoach_pose_model::keypoint::Keypoint;

    #[test]
    fn test_first_position_passes_through() {
        let mut smoother = PositionSmoother::new(0.5);
        let p = smoother.smooth(Joint::LeftElbow, Point2D::new(10.0, 20.0));
        assert_eq!(p, Point2D::new(10.0, 20.0));
    }

    #[test]
    fn test_position_ema() {
        let mut smoother = PositionSmoother::new(0.5);
        smoother.smooth(Joint::LeftElbow, Point2D::new(0.0, 0.0));
        let p = smoother.smooth(Joint::LeftElbow, Point2D::new(10.0, 20.0));
        assert_eq!(p, Point2D::new(5.0, 10.0));
        let p = smoother.smooth(Joint::LeftElbow, Point2D::new(10.0, 20.0));
        assert_eq!(p, Point2D::new(7.5, 15.0));
    }

    #[test]
    fn test_invisible_joints_bypass_state() {
        let mut smoother = PositionSmoother::new(0.2);
        let mut skeleton = Skeleton::from_array([Keypoint::new(100.0, 100.0, 0.9); JOINT_COUNT]);
        skeleton.get_mut(Joint::Nose).confidence = 0.1;
        smoother.smooth_skeleton(&skeleton, 0.3);
        assert!(smoother.last(Joint::Nose).is_none());

        skeleton.get_mut(Joint::Nose).x = 0.0;
        let out = smoother.smooth_skeleton(&skeleton, 0.3);
        assert_eq!(out.get(Joint::Nose).x, 0.0);
        assert_eq!(out.get(Joint::LeftHip).x, 100.0);
    }

    #[test]
    fn test_reset_clears_positions() {
        let mut smoother = PositionSmoother::new(0.5);
        smoother.smooth(Joint::RightKnee, Point2D::new(1.0, 1.0));
        smoother.reset();
        assert!(smoother.last(Joint::RightKnee).is_none());
    }

    #[test]
    fn test_trimmed_mean_small_windows_use_plain_mean() {
        assert_eq!(trimmed_mean(&[]), 0.0);
        assert_eq!(trimmed_mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_trimmed_mean_drops_extremes() {
        assert_eq!(trimmed_mean(&[100.0, 1.0, 2.0, 3.0, -50.0]), 2.0);
    }

    #[test]
    fn test_angle_spike_is_rejected() {
        let mut smoother = AngleSmoother::new(10);
        for _ in 0..6 {
            smoother.smooth(AngleChannel::Primary, 90.0);
        }
        let v = smoother.smooth(AngleChannel::Primary, 179.0);
        assert!((v - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_angle_converges_within_window() {
        let mut smoother = AngleSmoother::new(10);
        for _ in 0..10 {
            smoother.smooth(AngleChannel::Secondary, 40.0);
        }
        let mut v = 0.0;
        for _ in 0..10 {
            v = smoother.smooth(AngleChannel::Secondary, 160.0);
        }
        assert!((v - 160.0).abs() < 1e-9);
        assert_eq!(smoother.last(AngleChannel::Secondary), Some(v));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut smoother = AngleSmoother::new(10);
        smoother.smooth(AngleChannel::Primary, 10.0);
        smoother.smooth(AngleChannel::Lean, 50.0);
        assert_eq!(smoother.last(AngleChannel::Primary), Some(10.0));
        assert_eq!(smoother.last(AngleChannel::Lean), Some(50.0));
        smoother.reset();
        assert_eq!(smoother.last(AngleChannel::Primary), None);
    }
}
