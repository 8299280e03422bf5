//! Mathematical primitives for planar navigation.
//!
//! Angle arithmetic and the point-to-segment distance used by the
//! arrival detector.

use crate::core::types::Point2D;
use std::f32::consts::PI;

/// Normalize angle to [-π, π].
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Shortest signed angular difference from `a` to `b`.
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Linear interpolation between two angles along the shortest path.
///
/// `t` in [0, 1] where 0 returns `a` and 1 returns `b`.
#[inline]
pub fn angle_lerp(a: f32, b: f32, t: f32) -> f32 {
    normalize_angle(a + angle_diff(a, b) * t)
}

/// Shortest distance from point `p` to the segment `a`-`b`.
///
/// Degenerates to point-to-point distance when `a == b`, which is how the
/// arrival detector behaves on the first tick of a navigation.
pub fn point_segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    let cx = a.x + t * abx;
    let cy = a.y + t * aby;
    p.distance(&Point2D::new(cx, cy))
}
