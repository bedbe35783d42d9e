//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (colliders by handle, entities by index)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod bot;
pub mod collision;
pub mod contact;
pub mod registry;
pub mod state;
pub mod tick;

pub use aabb::{Aabb, aabb_circle_intersect};
pub use bot::Bot;
pub use collision::{SweepHit, reflect_velocity, sweep_circle_aabb};
pub use contact::{clamp_speed, resolve_cast_hit, resolve_paddle_push};
pub use registry::{CastHit, ColliderHandle, ColliderRegistry};
pub use state::{
    Ball, BallState, GameEvent, Homebase, MatchPhase, MatchState, Paddle, Player, PlayerId, Wall,
};
pub use tick::{PlayerInput, TickInput, ViewportAnimation, tick};
