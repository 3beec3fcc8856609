//! Joints, keypoints, and skeletons.
//!
//! The pose estimator reports 17 joints in a fixed order (the COCO layout).
//! A [`Skeleton`] always holds exactly that many keypoints; anything else is
//! rejected at the deserialization boundary.

use serde::{Deserialize, Serialize};

/// Number of joints in a skeleton.
pub const JOINT_COUNT: usize = 17;

/// A named joint, in the estimator's fixed index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// All joints in index order.
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Index of this joint in a skeleton.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a joint by index.
    pub fn from_index(index: usize) -> Option<Joint> {
        Self::ALL.get(index).copied()
    }

    /// Snake-case joint name (e.g. `left_shoulder`).
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    /// Which body side this joint belongs to; `None` for the face midline.
    pub fn side(self) -> Option<Side> {
        match self {
            Joint::Nose => None,
            Joint::LeftEye
            | Joint::LeftEar
            | Joint::LeftShoulder
            | Joint::LeftElbow
            | Joint::LeftWrist
            | Joint::LeftHip
            | Joint::LeftKnee
            | Joint::LeftAnkle => Some(Side::Left),
            _ => Some(Side::Right),
        }
    }
}

/// Body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Horizontal direction (in image x) that counts as "forward" for this side.
    pub fn forward_sign(self) -> f64 {
        match self {
            Side::Right => 1.0,
            Side::Left => -1.0,
        }
    }
}

/// A side-relative limb joint. Resolved to a concrete [`Joint`] once the
/// analyzed side is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl Limb {
    /// The concrete joint for this limb on `side`.
    pub fn joint(self, side: Side) -> Joint {
        match (self, side) {
            (Limb::Shoulder, Side::Left) => Joint::LeftShoulder,
            (Limb::Shoulder, Side::Right) => Joint::RightShoulder,
            (Limb::Elbow, Side::Left) => Joint::LeftElbow,
            (Limb::Elbow, Side::Right) => Joint::RightElbow,
            (Limb::Wrist, Side::Left) => Joint::LeftWrist,
            (Limb::Wrist, Side::Right) => Joint::RightWrist,
            (Limb::Hip, Side::Left) => Joint::LeftHip,
            (Limb::Hip, Side::Right) => Joint::RightHip,
            (Limb::Knee, Side::Left) => Joint::LeftKnee,
            (Limb::Knee, Side::Right) => Joint::RightKnee,
            (Limb::Ankle, Side::Left) => Joint::LeftAnkle,
            (Limb::Ankle, Side::Right) => Joint::RightAnkle,
        }
    }
}

/// A 2D point in image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint between two points.
    pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
        Point2D {
            x: (a.x + b.x) * 0.5,
            y: (a.y + b.y) * 0.5,
        }
    }

    /// This point shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Point2D {
        Point2D {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A single detected joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in `[0.0, 1.0]`.
    #[serde(alias = "score")]
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Whether the estimator is confident enough in this joint.
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// The same keypoint moved to `position`, keeping its confidence.
    pub fn with_position(&self, position: Point2D) -> Self {
        Self {
            x: position.x,
            y: position.y,
            confidence: self.confidence,
        }
    }
}

/// Errors raised when building a skeleton.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SkeletonError {
    #[error("expected 17 keypoints, got {0}")]
    WrongKeypointCount(usize),
}

/// One person's keypoints for one frame, in [`Joint`] index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keypoint>", into = "Vec<Keypoint>")]
pub struct Skeleton {
    keypoints: [Keypoint; JOINT_COUNT],
}

impl Skeleton {
    /// Build a skeleton from exactly [`JOINT_COUNT`] keypoints.
    pub fn new(keypoints: Vec<Keypoint>) -> Result<Self, SkeletonError> {
        let count = keypoints.len();
        let keypoints: [Keypoint; JOINT_COUNT] = keypoints
            .try_into()
            .map_err(|_| SkeletonError::WrongKeypointCount(count))?;
        Ok(Self { keypoints })
    }

    /// Build a skeleton from a fixed array.
    pub fn from_array(keypoints: [Keypoint; JOINT_COUNT]) -> Self {
        Self { keypoints }
    }

    pub fn get(&self, joint: Joint) -> &Keypoint {
        &self.keypoints[joint.index()]
    }

    pub fn get_mut(&mut self, joint: Joint) -> &mut Keypoint {
        &mut self.keypoints[joint.index()]
    }

    /// Keypoint for a side-relative limb.
    pub fn limb(&self, limb: Limb, side: Side) -> &Keypoint {
        self.get(limb.joint(side))
    }

    pub fn keypoints(&self) -> &[Keypoint; JOINT_COUNT] {
        &self.keypoints
    }

    /// Iterate over `(joint, keypoint)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Keypoint)> {
        Joint::ALL.iter().copied().zip(self.keypoints.iter())
    }

    /// Number of `joints` whose confidence exceeds `threshold`.
    pub fn count_visible(&self, joints: &[Joint], threshold: f64) -> usize {
        joints
            .iter()
            .filter(|joint| self.get(**joint).is_visible(threshold))
            .count()
    }
}

impl TryFrom<Vec<Keypoint>> for Skeleton {
    type Error = SkeletonError;

    fn try_from(keypoints: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Skeleton::new(keypoints)
    }
}

impl From<Skeleton> for Vec<Keypoint> {
    fn from(skeleton: Skeleton) -> Self {
        skeleton.keypoints.to_vec()
    }
}

/// Skeleton edges drawn by renderers.
pub const SKELETON_CONNECTIONS: [(Joint, Joint); 16] = [
    (Joint::Nose, Joint::LeftEye),
    (Joint::Nose, Joint::RightEye),
    (Joint::LeftEye, Joint::LeftEar),
    (Joint::RightEye, Joint::RightEar),
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::RightHip),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(confidence: f64) -> Skeleton {
        Skeleton::from_array([Keypoint::new(0.0, 0.0, confidence); JOINT_COUNT])
    }

    #[test]
    fn test_joint_index_roundtrip() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::from_index(JOINT_COUNT), None);
        assert_eq!(Joint::RightAnkle.index(), 16);
        assert_eq!(Joint::LeftShoulder.name(), "left_shoulder");
    }

    #[test]
    fn test_limb_resolves_per_side() {
        assert_eq!(Limb::Elbow.joint(Side::Left), Joint::LeftElbow);
        assert_eq!(Limb::Elbow.joint(Side::Right), Joint::RightElbow);
        assert_eq!(Limb::Ankle.joint(Side::Right).side(), Some(Side::Right));
        assert_eq!(Joint::Nose.side(), None);
    }

    #[test]
    fn test_skeleton_rejects_wrong_count() {
        let err = Skeleton::new(vec![Keypoint::new(0.0, 0.0, 1.0); 5]).unwrap_err();
        assert_eq!(err, SkeletonError::WrongKeypointCount(5));
    }

    #[test]
    fn test_skeleton_json_is_plain_array() {
        let skeleton = uniform(0.9);
        let json = serde_json::to_string(&skeleton).unwrap();
        assert!(json.starts_with('['));

        let parsed: Skeleton = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, skeleton);

        let short = "[{\"x\":1.0,\"y\":2.0,\"confidence\":0.5}]";
        assert!(serde_json::from_str::<Skeleton>(short).is_err());
    }

    #[test]
    fn test_keypoint_accepts_score_alias() {
        let kp: Keypoint = serde_json::from_str("{\"x\":1.0,\"y\":2.0,\"score\":0.7}").unwrap();
        assert!((kp.confidence - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_visibility_is_strictly_greater() {
        let kp = Keypoint::new(0.0, 0.0, 0.3);
        assert!(!kp.is_visible(0.3));
        assert!(kp.is_visible(0.29));
    }

    #[test]
    fn test_count_visible() {
        let mut skeleton = uniform(0.9);
        skeleton.get_mut(Joint::LeftWrist).confidence = 0.1;
        let joints = [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist];
        assert_eq!(skeleton.count_visible(&joints, 0.3), 2);
    }

    #[test]
    fn test_point_helpers() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(4.0, 2.0);
        assert_eq!(Point2D::midpoint(&a, &b), Point2D::new(2.0, 1.0));
        assert_eq!(a.offset(1.0, -1.0), Point2D::new(1.0, -1.0));
        assert!((Point2D::new(3.0, 4.0).distance_to(&a) - 5.0).abs() < 1e-12);
    }
}
