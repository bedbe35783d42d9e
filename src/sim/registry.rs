//! Collider registry
//!
//! Owns the cached AABB of every solid box in the arena (walls and paddles),
//! keyed by a stable handle. The owning entity keeps the authoritative
//! position and pushes it here with `set_aabb` once per tick.
//!
//! All operations are total: touching an unknown handle is a no-op that
//! reports `false`, never a panic.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::{Aabb, aabb_circle_intersect};
use super::collision::sweep_circle_aabb;

/// Opaque identifier of a registered collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// One hit reported by [`ColliderRegistry::circle_cast_all`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Collider that was hit
    pub handle: ColliderHandle,
    /// Fraction of the displacement at first contact, in [0, 1]
    pub toi: f32,
    /// Contact point on the collider surface
    pub point: Vec2,
    /// Axis-aligned unit normal, pointing from the collider toward the circle
    pub normal: Vec2,
    /// Circle center at the time of impact
    pub centroid: Vec2,
}

/// Flat handle -> AABB store
///
/// Iteration is in ascending handle order, which keeps casts deterministic.
/// A linear scan is fine for the few dozen colliders of a Pong arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColliderRegistry {
    colliders: BTreeMap<ColliderHandle, Aabb>,
    next_handle: u32,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new box and return its handle
    ///
    /// Handles are issued in increasing order. After the counter wraps, handles
    /// that are still live are skipped.
    pub fn register_aabb(&mut self, aabb: Aabb) -> ColliderHandle {
        let mut handle = ColliderHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        while self.colliders.contains_key(&handle) {
            handle = ColliderHandle(self.next_handle);
            self.next_handle = self.next_handle.wrapping_add(1);
        }
        self.colliders.insert(handle, aabb);
        log::debug!("Registered collider {:?} at {:?}", handle, aabb.center);
        handle
    }

    /// Remove a box. Returns false if the handle was not registered.
    pub fn unregister_aabb(&mut self, handle: ColliderHandle) -> bool {
        let removed = self.colliders.remove(&handle).is_some();
        if removed {
            log::debug!("Unregistered collider {:?}", handle);
        }
        removed
    }

    /// Overwrite the box of a live handle. Returns false if the handle is absent.
    pub fn set_aabb(&mut self, handle: ColliderHandle, aabb: Aabb) -> bool {
        match self.colliders.get_mut(&handle) {
            Some(slot) => {
                *slot = aabb;
                true
            }
            None => false,
        }
    }

    pub fn is_collider_registered(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains_key(&handle)
    }

    pub fn get(&self, handle: ColliderHandle) -> Option<Aabb> {
        self.colliders.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// All registered colliders in ascending handle order
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Aabb)> {
        self.colliders.iter().map(|(h, a)| (*h, a))
    }

    /// Drop every collider. Handles already issued stay retired.
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Sweep a circle against every registered collider
    ///
    /// Hits are sorted by ascending time of impact. Exact ties keep registry
    /// order (lowest handle first); callers should not rely on that.
    pub fn circle_cast_all(&self, origin: Vec2, radius: f32, displacement: Vec2) -> Vec<CastHit> {
        let mut hits: Vec<CastHit> = self
            .colliders
            .iter()
            .filter_map(|(&handle, aabb)| {
                sweep_circle_aabb(origin, radius, displacement, aabb).map(|hit| CastHit {
                    handle,
                    toi: hit.toi,
                    point: hit.point,
                    normal: hit.normal,
                    centroid: hit.centroid,
                })
            })
            .collect();
        // toi is always finite here, total_cmp keeps the sort stable and total
        hits.sort_by(|a, b| a.toi.total_cmp(&b.toi));
        hits
    }

    /// Static circle-vs-box overlap, re-exposed next to the cast query
    #[inline]
    pub fn aabb_circle_intersect(aabb: &Aabb, center: Vec2, radius: f32) -> bool {
        aabb_circle_intersect(aabb, center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::splat(0.5))
    }

    #[test]
    fn test_register_and_query() {
        let mut registry = ColliderRegistry::new();
        assert!(registry.is_empty());

        let a = registry.register_aabb(unit_box(0.0, 0.0));
        let b = registry.register_aabb(unit_box(5.0, 0.0));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_collider_registered(a));
        assert_eq!(registry.get(b), Some(unit_box(5.0, 0.0)));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = ColliderRegistry::new();
        let a = registry.register_aabb(unit_box(0.0, 0.0));

        assert!(registry.unregister_aabb(a));
        assert!(!registry.is_collider_registered(a));
        // Second removal is a harmless no-op
        assert!(!registry.unregister_aabb(a));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut registry = ColliderRegistry::new();
        let a = registry.register_aabb(unit_box(0.0, 0.0));
        registry.unregister_aabb(a);
        let b = registry.register_aabb(unit_box(0.0, 0.0));
        assert_ne!(a, b);
        assert!(!registry.is_collider_registered(a));
    }

    #[test]
    fn test_wrapped_counter_skips_live_handles() {
        let mut registry = ColliderRegistry::new();
        let first = registry.register_aabb(unit_box(0.0, 0.0));
        registry.next_handle = u32::MAX;

        let last = registry.register_aabb(unit_box(1.0, 0.0));
        assert_eq!(last, ColliderHandle(u32::MAX));
        // Counter wrapped to 0, which is still live
        let wrapped = registry.register_aabb(unit_box(2.0, 0.0));
        assert_eq!(wrapped, ColliderHandle(1));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(first), Some(unit_box(0.0, 0.0)));
    }

    #[test]
    fn test_set_aabb_on_missing_handle_is_noop() {
        let mut registry = ColliderRegistry::new();
        let a = registry.register_aabb(unit_box(0.0, 0.0));
        assert!(registry.set_aabb(a, unit_box(1.0, 1.0)));
        assert_eq!(registry.get(a), Some(unit_box(1.0, 1.0)));

        registry.unregister_aabb(a);
        assert!(!registry.set_aabb(a, unit_box(2.0, 2.0)));
        assert!(!registry.set_aabb(ColliderHandle(999), unit_box(2.0, 2.0)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cast_all_orders_by_time() {
        let mut registry = ColliderRegistry::new();
        // Registered far-to-near so insertion order differs from hit order
        let far = registry.register_aabb(unit_box(8.0, 0.0));
        let near = registry.register_aabb(unit_box(3.0, 0.0));
        let off_path = registry.register_aabb(unit_box(3.0, 10.0));

        let hits = registry.circle_cast_all(Vec2::ZERO, 0.25, Vec2::new(10.0, 0.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].handle, near);
        assert_eq!(hits[1].handle, far);
        assert!(hits[0].toi <= hits[1].toi);
        assert!(hits.iter().all(|h| h.handle != off_path));
        assert_eq!(hits[0].normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_cast_all_misses_with_zero_displacement() {
        let mut registry = ColliderRegistry::new();
        registry.register_aabb(Aabb::new(Vec2::new(12.0, 8.0), Vec2::new(0.5, 4.0)));
        registry.register_aabb(Aabb::new(Vec2::ZERO, Vec2::ONE));

        assert!(registry.circle_cast_all(Vec2::ZERO, 0.25, Vec2::ZERO).is_empty());
        // The static test still sees the overlap
        assert!(ColliderRegistry::aabb_circle_intersect(
            &Aabb::new(Vec2::ZERO, Vec2::ONE),
            Vec2::ZERO,
            0.25
        ));
    }

    #[test]
    fn test_cast_does_not_mutate() {
        let mut registry = ColliderRegistry::new();
        let a = registry.register_aabb(unit_box(3.0, 0.0));
        let before = registry.get(a);
        let _ = registry.circle_cast_all(Vec2::ZERO, 0.25, Vec2::new(10.0, 0.0));
        assert_eq!(registry.get(a), before);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_equal_time_ties_keep_handle_order() {
        let mut registry = ColliderRegistry::new();
        let first = registry.register_aabb(unit_box(3.0, 0.0));
        let second = registry.register_aabb(unit_box(3.0, 0.0));
        let hits = registry.circle_cast_all(Vec2::ZERO, 0.25, Vec2::new(10.0, 0.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].handle, first);
        assert_eq!(hits[1].handle, second);
    }

    proptest! {
        #[test]
        fn prop_cast_results_are_sorted_and_bounded(
            boxes in prop::collection::vec((-15.0f32..15.0, -15.0f32..15.0, 0.1f32..3.0, 0.1f32..3.0), 0..16),
            ox in -20.0f32..20.0,
            oy in -20.0f32..20.0,
            dx in -40.0f32..40.0,
            dy in -40.0f32..40.0,
            r in 0.0f32..1.0,
        ) {
            let mut registry = ColliderRegistry::new();
            for (x, y, hx, hy) in boxes {
                registry.register_aabb(Aabb::new(Vec2::new(x, y), Vec2::new(hx, hy)));
            }
            let hits = registry.circle_cast_all(Vec2::new(ox, oy), r, Vec2::new(dx, dy));
            prop_assert!(hits.len() <= registry.len());
            for pair in hits.windows(2) {
                prop_assert!(pair[0].toi <= pair[1].toi);
            }
            for hit in &hits {
                prop_assert!((0.0..=1.0).contains(&hit.toi));
                prop_assert!(registry.is_collider_registered(hit.handle));
            }
        }
    }
}
