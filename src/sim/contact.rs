//! Contact resolution for the ball
//!
//! Bounces are lossless reflections. Paddles additionally hand their motion to
//! the ball (steering shots) and speed it up horizontally on every hit, which
//! is what makes rallies escalate. The result is always capped at the ball's
//! max speed.

use glam::Vec2;

use super::collision::reflect_velocity;
use super::registry::CastHit;
use super::state::{Ball, Paddle};
use crate::consts::MIN_TRAVEL_TIME_AFTER_REFLECT;
use crate::sign_or_zero;

/// Rescale `velocity` down to `max_speed` if it is faster, keeping direction
#[inline]
pub fn clamp_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    if velocity.length_squared() > max_speed * max_speed {
        velocity.normalize_or_zero() * max_speed
    } else {
        velocity
    }
}

/// Add a paddle's effective velocity and the per-hit horizontal boost
pub fn transfer_paddle_momentum(velocity: Vec2, paddle: &Paddle) -> Vec2 {
    let mut v = velocity + paddle.velocity_buffer;
    v.x += sign_or_zero(v.x) * paddle.ball_speed_increase_per_hit;
    v
}

/// Resolve the earliest hit of a ball cast
///
/// `paddle` is the paddle owning the hit collider, if any. The ball continues
/// from the contact centroid along its new velocity for the rest of the tick.
pub fn resolve_cast_hit(ball: &mut Ball, hit: &CastHit, paddle: Option<&Paddle>, dt: f32) {
    let normal = hit.normal.normalize_or_zero();
    let mut v = reflect_velocity(ball.vel, normal);

    if let Some(paddle) = paddle {
        v = transfer_paddle_momentum(v, paddle);
        ball.last_hit_by = Some(paddle.player_id);
    }

    ball.vel = clamp_speed(v, ball.max_speed);

    let remaining = (dt - hit.toi * dt).max(MIN_TRAVEL_TIME_AFTER_REFLECT);
    ball.pos = hit.centroid + ball.vel * remaining;
}

/// Resolve a paddle moving into the ball
///
/// `normal` comes from sweeping the ball against the paddle with the inverse
/// of the paddle's displacement `paddle_offset`. The bounce only happens when
/// the paddle moves against the ball's direction of travel; a paddle chasing
/// the ball leaves it alone. Returns true if the ball was hit.
pub fn resolve_paddle_push(ball: &mut Ball, normal: Vec2, paddle_offset: Vec2, paddle: &Paddle) -> bool {
    if paddle_offset.dot(ball.vel) >= 0.0 {
        return false;
    }

    let v = reflect_velocity(ball.vel, normal.normalize_or_zero());
    let v = transfer_paddle_momentum(v, paddle);
    ball.vel = clamp_speed(v, ball.max_speed);
    // Ride along with the paddle so it does not end up inside it
    ball.pos += paddle_offset;
    ball.last_hit_by = Some(paddle.player_id);
    true
}
