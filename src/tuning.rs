//! Data-driven game balance
//!
//! Loaded from JSON so matches can be rebalanced without a rebuild. Missing
//! fields fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Match balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Players ===
    /// Health each player starts with (goals they may concede)
    pub max_health: u32,
    /// Once a player's health drops to this, their opponent may move their viewport
    pub health_to_unlock_window: u32,
    /// Viewport size (width, height) for the scoring player, indexed by goals conceded
    pub viewport_sizes: Vec<[u32; 2]>,

    // === Paddles ===
    /// Paddle speed (units per second at full input)
    pub paddle_speed: f32,
    /// Lowest paddle center y
    pub paddle_min_y: f32,
    /// Highest paddle center y
    pub paddle_max_y: f32,
    /// Horizontal speed added to the ball on every paddle hit
    pub ball_speed_increase_per_hit: f32,

    // === Ball ===
    pub ball_radius: f32,
    /// Speed given to the ball when it is launched off a paddle
    pub launch_base_speed: f32,
    /// Hard cap on ball speed
    pub max_ball_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_health: 5,
            health_to_unlock_window: 2,
            viewport_sizes: vec![[800, 900], [720, 810], [640, 720], [560, 630], [480, 540]],

            paddle_speed: 8.0,
            paddle_min_y: -4.5,
            paddle_max_y: 4.5,
            ball_speed_increase_per_hit: 1.0,

            ball_radius: crate::consts::BALL_RADIUS,
            launch_base_speed: 7.0,
            max_ball_speed: 40.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON (partial documents are filled with defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.validate())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load tuning from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::error!("Invalid tuning file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Replace values the simulation cannot work with
    pub fn validate(mut self) -> Self {
        let defaults = Self::default();

        if self.max_health == 0 {
            log::warn!("max_health must be at least 1, using {}", defaults.max_health);
            self.max_health = defaults.max_health;
        }
        if !(self.paddle_speed.is_finite() && self.paddle_speed > 0.0) {
            log::warn!("paddle_speed must be positive, using {}", defaults.paddle_speed);
            self.paddle_speed = defaults.paddle_speed;
        }
        if !(self.paddle_min_y.is_finite() && self.paddle_max_y.is_finite()) {
            log::warn!("Paddle bounds must be finite, using defaults");
            self.paddle_min_y = defaults.paddle_min_y;
            self.paddle_max_y = defaults.paddle_max_y;
        } else if self.paddle_min_y > self.paddle_max_y {
            log::warn!("Paddle bounds are inverted, swapping them");
            std::mem::swap(&mut self.paddle_min_y, &mut self.paddle_max_y);
        }
        if !self.ball_speed_increase_per_hit.is_finite() {
            self.ball_speed_increase_per_hit = defaults.ball_speed_increase_per_hit;
        }
        if !(self.ball_radius.is_finite() && self.ball_radius >= 0.0) {
            log::warn!("ball_radius must be non-negative, using {}", defaults.ball_radius);
            self.ball_radius = defaults.ball_radius;
        }
        if !(self.max_ball_speed.is_finite() && self.max_ball_speed > 0.0) {
            log::warn!("max_ball_speed must be positive, using {}", defaults.max_ball_speed);
            self.max_ball_speed = defaults.max_ball_speed;
        }
        if !(self.launch_base_speed.is_finite() && self.launch_base_speed > 0.0) {
            log::warn!("launch_base_speed must be positive, using {}", defaults.launch_base_speed);
            self.launch_base_speed = defaults.launch_base_speed;
        }
        if self.launch_base_speed > self.max_ball_speed {
            self.launch_base_speed = self.max_ball_speed;
        }

        self
    }

    /// Viewport size for the scoring player after the opponent dropped to `health`
    pub fn viewport_size_for(&self, health: u32) -> Option<[u32; 2]> {
        let index = self.max_health.checked_sub(health)? as usize;
        self.viewport_sizes.get(index).copied()
    }
}
