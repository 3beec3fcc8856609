//! Joint-angle geometry and side selection.
//!
//! Image coordinates have y growing downward, so "up" is `-y`.

use serde::{Deserialize, Serialize};

use repcoach_pose_model::keypoint::{Limb, Point2D, Side, Skeleton};

/// Rays shorter than this are treated as degenerate.
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Angle reported for a degenerate triple.
pub const DEGENERATE_ANGLE: f64 = 180.0;

/// Angle at vertex `b` between rays `b→a` and `b→c`, in degrees `[0, 180]`.
///
/// Returns `None` when either ray is shorter than [`DEGENERATE_EPSILON`].
pub fn angle_between(a: Point2D, b: Point2D, c: Point2D) -> Option<f64> {
    let (ux, uy) = (a.x - b.x, a.y - b.y);
    let (vx, vy) = (c.x - b.x, c.y - b.y);
    let len_u = (ux * ux + uy * uy).sqrt();
    let len_v = (vx * vx + vy * vy).sqrt();
    if len_u < DEGENERATE_EPSILON || len_v < DEGENERATE_EPSILON {
        return None;
    }

    let cos = ((ux * vx + uy * vy) / (len_u * len_v)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Like [`angle_between`], falling back to [`DEGENERATE_ANGLE`].
pub fn angle_abc(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    angle_between(a, b, c).unwrap_or(DEGENERATE_ANGLE)
}

/// Signed angle between `pivot→top` and straight up from `pivot`.
///
/// Positive when `pivot` sits forward of `top` for the given side. `None` when
/// the two points coincide.
pub fn vertical_lean(top: Point2D, pivot: Point2D, side: Side) -> Option<f64> {
    let above = pivot.offset(0.0, -100.0);
    let magnitude = angle_between(top, pivot, above)?;
    let forward = (pivot.x - top.x) * side.forward_sign();
    Some(if forward < 0.0 { -magnitude } else { magnitude })
}

/// [`vertical_lean`] with the sign flipped: positive when `top` sits forward
/// of `pivot`, as with a torso bending over the hips.
pub fn tilt(top: Point2D, pivot: Point2D, side: Side) -> Option<f64> {
    vertical_lean(top, pivot, side).map(|lean| -lean)
}

/// Which limb chain decides the analyzed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    /// Shoulder, elbow, wrist.
    Upper,
    /// Hip, knee, ankle.
    Lower,
}

impl BodyRegion {
    pub fn limbs(self) -> [Limb; 3] {
        match self {
            BodyRegion::Upper => [Limb::Shoulder, Limb::Elbow, Limb::Wrist],
            BodyRegion::Lower => [Limb::Hip, Limb::Knee, Limb::Ankle],
        }
    }
}

/// How to break an exact visibility tie between sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep whichever side was analyzed last.
    Previous,
    Left,
    Right,
}

/// Summed confidence of `region` on `side`.
pub fn side_visibility(skeleton: &Skeleton, region: BodyRegion, side: Side) -> f64 {
    region
        .limbs()
        .iter()
        .map(|limb| skeleton.limb(*limb, side).confidence)
        .sum()
}

/// The side with the larger summed confidence over `region`.
pub fn choose_side(
    skeleton: &Skeleton,
    region: BodyRegion,
    tie_break: TieBreak,
    previous: Side,
) -> Side {
    let left = side_visibility(skeleton, region, Side::Left);
    let right = side_visibility(skeleton, region, Side::Right);
    if right > left {
        Side::Right
    } else if left > right {
        Side::Left
    } else {
        match tie_break {
            TieBreak::Previous => previous,
            TieBreak::Left => Side::Left,
            TieBreak::Right => Side::Right,
        }
    }
}
