//! Sweep Pong - a two-player Pong core with continuous collision
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collider registry, swept collision, match state)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.25;
    pub const BALL_START_VELOCITY: Vec2 = Vec2::new(5.0, -0.5);
    /// Velocity given to the ball when it has to be recovered at the arena center
    pub const BALL_RESET_VELOCITY: Vec2 = Vec2::new(5.0, 1.0);

    /// Paddle layout - player 0 defends the left side, player 1 the right
    pub const PADDLE_START_X: f32 = 10.0;
    pub const PADDLE_SIZE: Vec2 = Vec2::new(0.5, 3.0);
    /// Extra gap between a served ball and its paddle face (float safety)
    pub const PADDLE_ATTACH_GAP: f32 = 0.01;

    /// Homebases sit behind the paddles and span the whole arena height
    pub const HOMEBASE_CENTER_X: f32 = 14.0;
    pub const HOMEBASE_SIZE: Vec2 = Vec2::new(2.0, 16.0);

    /// Static walls as (center, full size). The side walls leave a mouth in
    /// front of each homebase; the top and bottom walls close the field.
    pub const WALLS: [(Vec2, Vec2); 6] = [
        (Vec2::new(12.0, -8.0), Vec2::new(1.0, 8.0)),
        (Vec2::new(-12.0, -8.0), Vec2::new(1.0, 8.0)),
        (Vec2::new(12.0, 8.0), Vec2::new(1.0, 8.0)),
        (Vec2::new(-12.0, 8.0), Vec2::new(1.0, 8.0)),
        (Vec2::new(0.0, 6.5), Vec2::new(36.0, 1.0)),
        (Vec2::new(0.0, -6.5), Vec2::new(36.0, 1.0)),
    ];

    /// Minimum time (seconds) the ball keeps travelling after a reflection,
    /// so it never rests exactly on the surface it just left
    pub const MIN_TRAVEL_TIME_AFTER_REFLECT: f32 = 0.001;

    /// Displacements shorter than this are treated as no motion
    pub const MOTION_EPSILON: f32 = 1e-6;
}

/// Sign of `x` with zero mapped to zero (`f32::signum` maps +0.0 to 1.0)
#[inline]
pub fn sign_or_zero(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// True when every component is finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
