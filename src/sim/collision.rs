//! Swept collision between a moving circle and axis-aligned boxes
//!
//! The ball is fast and the paddles are thin, so a per-tick overlap check would
//! let the ball tunnel straight through. Instead the box is grown by the ball
//! radius (Minkowski sum) and the ball center is traced as a point along its
//! displacement, using the slab method to find the entry time.

use glam::Vec2;

use super::aabb::Aabb;
use crate::consts::MOTION_EPSILON;
use crate::is_finite_vec;

/// Result of a swept circle-vs-box test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the displacement at first contact, in [0, 1]
    pub toi: f32,
    /// Contact point on the original (non-expanded) box surface
    pub point: Vec2,
    /// Axis-aligned unit normal, pointing from the box toward the circle
    pub normal: Vec2,
    /// Circle center at the time of impact
    pub centroid: Vec2,
}

/// Entry/exit interval of a segment against one axis slab
struct SlabSpan {
    entry: f32,
    exit: f32,
    /// Sign of the entry face normal on this axis (0 when the axis is parallel)
    normal_sign: f32,
}

fn slab(origin: f32, delta: f32, min: f32, max: f32) -> Option<SlabSpan> {
    if delta.abs() < f32::EPSILON {
        // Parallel: must already be inside the slab for the whole tick
        if origin < min || origin > max {
            return None;
        }
        return Some(SlabSpan {
            entry: f32::NEG_INFINITY,
            exit: f32::INFINITY,
            normal_sign: 0.0,
        });
    }

    let inv = 1.0 / delta;
    let mut t1 = (min - origin) * inv;
    let mut t2 = (max - origin) * inv;
    let mut normal_sign = -1.0;
    if t1 > t2 {
        core::mem::swap(&mut t1, &mut t2);
        normal_sign = 1.0;
    }
    Some(SlabSpan {
        entry: t1,
        exit: t2,
        normal_sign,
    })
}

/// Sweep a circle along `displacement` against a box
///
/// Returns `None` when the circle does not touch the box during this
/// displacement, when the displacement is zero-length or non-finite, and when
/// the circle already overlaps the box at the start (static overlap is the job
/// of [`aabb_circle_intersect`](super::aabb::aabb_circle_intersect)).
pub fn sweep_circle_aabb(
    origin: Vec2,
    radius: f32,
    displacement: Vec2,
    aabb: &Aabb,
) -> Option<SweepHit> {
    if !is_finite_vec(origin) || !is_finite_vec(displacement) || !radius.is_finite() {
        return None;
    }
    if displacement.length_squared() <= MOTION_EPSILON * MOTION_EPSILON {
        return None;
    }

    let radius = radius.max(0.0);
    let expanded = aabb.expanded(radius);
    let min = expanded.min();
    let max = expanded.max();

    let x = slab(origin.x, displacement.x, min.x, max.x)?;
    let y = slab(origin.y, displacement.y, min.y, max.y)?;

    let (entry, normal) = if x.entry >= y.entry {
        (x.entry, Vec2::new(x.normal_sign, 0.0))
    } else {
        (y.entry, Vec2::new(0.0, y.normal_sign))
    };
    let exit = x.exit.min(y.exit);

    if entry > exit || !(0.0..=1.0).contains(&entry) || exit < 0.0 {
        return None;
    }

    let toi = entry.clamp(0.0, 1.0);
    let centroid = origin + displacement * toi;
    Some(SweepHit {
        toi,
        point: centroid - normal * radius,
        normal,
        centroid,
    })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, with `n` unit length
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
