//! Axis-aligned bounding boxes
//!
//! Boxes are stored as center + half extents. Gameplay objects describe their
//! colliders with a full size, so `from_center_size` is the usual constructor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Build from a center and a full (edge-to-edge) size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self::new(center, size * 0.5)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Grow the box by `amount` on all four sides (Minkowski sum with a square)
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            center: self.center,
            half_extents: self.half_extents + Vec2::splat(amount.max(0.0)),
        }
    }

    /// Closest point on (or inside) the box to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// Static circle-vs-box overlap test (touching counts as overlapping)
///
/// Used where tunneling is not a concern, e.g. goal detection against deep
/// homebases.
pub fn aabb_circle_intersect(aabb: &Aabb, center: Vec2, radius: f32) -> bool {
    let closest = aabb.closest_point(center);
    closest.distance_squared(center) <= radius * radius
}
