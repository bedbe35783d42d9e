//! Computer opponent
//!
//! Tracks the ball with a little lead and a per-shot aiming error. Some shots
//! are whiffed on purpose, more often as the ball speeds up, and some are
//! returned with a swing of the paddle so rallies don't settle into a flat
//! line. All randomness comes from its own seeded RNG, so a bot match replays
//! exactly from the same seed.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Ball, MatchState, Paddle};
use super::tick::PlayerInput;

/// How far ahead (seconds) the bot predicts the ball
const LEAD_TIME: f32 = 0.15;
/// Don't move when the target is this close to the paddle center
const DEAD_ZONE: f32 = 0.2;
/// Largest aiming error on a normal return, as a fraction of half the paddle height
const MAX_AIM_ERROR: f32 = 0.8;
/// Chance of whiffing a slow ball
const MISS_CHANCE_BASE: f64 = 0.08;
/// Extra whiff chance at max ball speed
const MISS_CHANCE_AT_MAX_SPEED: f64 = 0.25;
/// How far past the paddle's reach a whiff aims
const MISS_MARGIN: std::ops::RangeInclusive<f32> = 0.5..=1.5;
/// Start swinging this long (seconds) before the ball arrives
const SWING_TIME: f32 = 0.12;
/// Ticks the bot holds a served ball before launching
const SERVE_DELAY_TICKS: std::ops::RangeInclusive<u32> = 20..=90;

/// A seeded AI driving one paddle
#[derive(Debug, Clone)]
pub struct Bot {
    rng: Pcg32,
    /// Index of the paddle this bot controls
    pub paddle: usize,
    /// Where the paddle center aims relative to the predicted ball y
    aim_offset: f32,
    /// Vertical swing at contact (-1, 0 or 1)
    swing: f32,
    whiff: bool,
    /// Ball was heading here last tick
    tracking: bool,
    serve_delay: Option<u32>,
}

impl Bot {
    pub fn new(seed: u64, paddle: usize) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            paddle,
            aim_offset: 0.0,
            swing: 0.0,
            whiff: false,
            tracking: false,
            serve_delay: None,
        }
    }

    /// Plan how to meet a ball that just started heading this way
    fn plan_shot(&mut self, ball: &Ball, paddle: &Paddle) {
        let half_height = paddle.size.y * 0.5;
        let speed_ratio = (ball.vel.length() / ball.max_speed).clamp(0.0, 1.0) as f64;
        let miss_chance = MISS_CHANCE_BASE + MISS_CHANCE_AT_MAX_SPEED * speed_ratio;

        self.whiff = self.rng.random_bool(miss_chance);
        if self.whiff {
            // Step aside towards the middle so the ball runs into the homebase
            // mouth instead of the side walls
            let side = if ball.pos.y > 0.0 {
                -1.0
            } else if ball.pos.y < 0.0 {
                1.0
            } else if self.rng.random_bool(0.5) {
                1.0
            } else {
                -1.0
            };
            let reach = half_height + ball.radius;
            self.aim_offset = side * (reach + self.rng.random_range(MISS_MARGIN));
            self.swing = 0.0;
        } else {
            self.aim_offset = self.rng.random_range(-MAX_AIM_ERROR..=MAX_AIM_ERROR) * half_height;
            self.swing = [-1.0, 0.0, 1.0][self.rng.random_range(0..3)];
        }
    }

    /// Decide this tick's input
    pub fn input(&mut self, state: &MatchState) -> PlayerInput {
        let Some(paddle) = state.paddles.get(self.paddle) else {
            return PlayerInput::default();
        };
        let ball = &state.ball;

        if ball.attached_paddle() == Some(self.paddle) {
            self.tracking = false;
            // Holding the serve: wait a random beat, then launch
            let remaining = match self.serve_delay {
                Some(ticks) => ticks,
                None => self.rng.random_range(SERVE_DELAY_TICKS),
            };
            if remaining == 0 {
                self.serve_delay = None;
                return PlayerInput {
                    movement: Vec2::ZERO,
                    launch: true,
                };
            }
            self.serve_delay = Some(remaining - 1);
            return PlayerInput::default();
        }
        self.serve_delay = None;

        let heading_here = !ball.is_attached() && ball.vel.x * (paddle.pos.x - ball.pos.x) > 0.0;
        if heading_here && !self.tracking {
            self.plan_shot(ball, paddle);
        }
        self.tracking = heading_here;

        if !heading_here {
            // Drift back to the middle while the ball is away
            return steer_towards(0.0, paddle);
        }

        let gap = (paddle.pos.x - ball.pos.x).abs() - paddle.size.x * 0.5 - ball.radius;
        let time_to_arrival = gap / ball.vel.x.abs();
        if self.swing != 0.0 && time_to_arrival < SWING_TIME {
            return PlayerInput {
                movement: Vec2::new(0.0, self.swing),
                launch: false,
            };
        }

        let target_y = ball.pos.y + ball.vel.y * LEAD_TIME + self.aim_offset;
        steer_towards(target_y, paddle)
    }
}

fn steer_towards(target_y: f32, paddle: &Paddle) -> PlayerInput {
    let delta = target_y - paddle.pos.y;
    if delta.abs() < DEAD_ZONE {
        return PlayerInput::default();
    }
    PlayerInput {
        movement: Vec2::new(0.0, delta.signum()),
        launch: false,
    }
}
