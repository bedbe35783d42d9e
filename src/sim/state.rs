//! Match state and entity types
//!
//! Everything a renderer or UI needs to read after a tick lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::registry::{ColliderHandle, ColliderRegistry};
use crate::consts::*;
use crate::tuning::Tuning;

/// Player identifier (0 defends the left homebase, 1 the right)
pub type PlayerId = u32;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Ball in play, goals are counted
    Playing,
    /// A goal was scored; waiting for the viewport animations to settle
    Intermission,
    /// A player ran out of health
    GameOver,
}

/// Ball state - riding a paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Ball follows the paddle at `paddles[paddle]`, offset from its center.
    /// The index is a relation only; the paddle list owns the paddles.
    Attached { paddle: usize, offset: Vec2 },
    /// Ball is free-moving
    Free,
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub max_speed: f32,
    pub launch_base_speed: f32,
    pub state: BallState,
    /// Player whose paddle touched the ball last
    pub last_hit_by: Option<PlayerId>,
}

impl Ball {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: BALL_START_VELOCITY,
            radius: tuning.ball_radius,
            max_speed: tuning.max_ball_speed,
            launch_base_speed: tuning.launch_base_speed,
            state: BallState::Free,
            last_hit_by: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, BallState::Attached { .. })
    }

    /// Index of the paddle carrying the ball, if any
    pub fn attached_paddle(&self) -> Option<usize> {
        match self.state {
            BallState::Attached { paddle, .. } => Some(paddle),
            BallState::Free => None,
        }
    }

    /// Put the ball on a paddle, ready to be served
    pub fn attach_to(&mut self, index: usize, paddle: &Paddle) {
        let offset = paddle.attach_offset;
        self.state = BallState::Attached {
            paddle: index,
            offset,
        };
        self.pos = paddle.pos + offset;
        self.vel = Vec2::ZERO;
    }

    /// Drop the paddle relation without touching position or velocity
    pub fn detach(&mut self) {
        self.state = BallState::Free;
    }

    /// Keep an attached ball glued to its paddle
    ///
    /// Returns false (and detaches) if the paddle no longer exists.
    pub fn follow_paddle(&mut self, paddles: &[Paddle]) -> bool {
        let BallState::Attached { paddle, offset } = self.state else {
            return false;
        };
        match paddles.get(paddle) {
            Some(p) => {
                self.pos = p.pos + offset;
                true
            }
            None => {
                log::warn!("Ball attached to missing paddle {}, detaching", paddle);
                self.detach();
                false
            }
        }
    }

    /// Launch the ball from the paddle it rides, away from the paddle face
    pub fn launch(&mut self) -> bool {
        let BallState::Attached { offset, .. } = self.state else {
            return false;
        };
        let dir = Vec2::new(offset.x, 0.0).normalize_or(Vec2::X);
        self.vel = dir * self.launch_base_speed;
        self.state = BallState::Free;
        true
    }

    /// Recovery path: free ball at the arena center with the default velocity
    pub fn reset_to_center(&mut self) {
        self.state = BallState::Free;
        self.pos = Vec2::ZERO;
        self.vel = BALL_RESET_VELOCITY;
    }
}

/// A player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub player_id: PlayerId,
    pub pos: Vec2,
    /// Full collider size
    pub size: Vec2,
    pub speed: f32,
    pub ball_speed_increase_per_hit: f32,
    pub min_y: f32,
    pub max_y: f32,
    /// Movement requested for the next tick (consumed by the tick)
    pub movement_input: Vec2,
    /// Effective velocity of the last tick, after bounds clamping
    pub velocity_buffer: Vec2,
    /// Where a served ball sits relative to the paddle center
    pub attach_offset: Vec2,
    pub collider: Option<ColliderHandle>,
}

impl Paddle {
    pub fn new(player_id: PlayerId, pos: Vec2, attach_offset: Vec2, tuning: &Tuning) -> Self {
        Self {
            player_id,
            pos,
            size: PADDLE_SIZE,
            speed: tuning.paddle_speed,
            ball_speed_increase_per_hit: tuning.ball_speed_increase_per_hit,
            min_y: tuning.paddle_min_y,
            max_y: tuning.paddle_max_y,
            movement_input: Vec2::ZERO,
            velocity_buffer: Vec2::ZERO,
            attach_offset,
            collider: None,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.pos, self.size)
    }
}

/// The goal area behind a paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Homebase {
    /// Player who loses health when the ball gets in here
    pub player_id: PlayerId,
    pub center: Vec2,
    pub size: Vec2,
}

impl Homebase {
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.center, self.size)
    }
}

/// A static wall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub center: Vec2,
    pub size: Vec2,
    pub collider: Option<ColliderHandle>,
}

impl Wall {
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.center, self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Never increases during a match
    pub health: u32,
    pub max_health: u32,
    /// Unlocked once the opponent is close to losing
    pub can_move_window: bool,
}

impl Player {
    pub fn new(id: PlayerId, max_health: u32) -> Self {
        Self {
            id,
            health: max_health,
            max_health,
            can_move_window: false,
        }
    }

    /// Goals this player has let in (what the scoreboard shows)
    pub fn goals_conceded(&self) -> u32 {
        self.max_health - self.health
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}

/// Things that happened during a tick, for cosmetics/UI collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Ball bounced off a registered collider
    BallBounced { point: Vec2, handle: ColliderHandle },
    /// A paddle hit or pushed the ball
    PaddleHit { player: PlayerId, point: Vec2 },
    BallLaunched { player: PlayerId },
    /// Ball was put back on a paddle after an intermission
    BallServed { player: PlayerId },
    /// A goal was scored against `conceding`, who has `health` left
    Goal { conceding: PlayerId, health: u32 },
    /// Request to resize the viewport of `player`
    ViewportResize { player: PlayerId, width: u32, height: u32 },
    /// `player` may now move their viewport
    WindowUnlocked { player: PlayerId },
    MatchOver { winner: Option<PlayerId> },
}

/// Complete match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub tuning: Tuning,
    pub phase: MatchPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub players: Vec<Player>,
    /// Paddles, in the same order as `players`
    pub paddles: Vec<Paddle>,
    pub homebases: Vec<Homebase>,
    pub walls: Vec<Wall>,
    pub ball: Ball,
    pub colliders: ColliderRegistry,
    /// Player who serves when the intermission ends
    pub next_server: Option<PlayerId>,
    /// Paddle the ball goes back to when the intermission ends
    pub next_serve_paddle: Option<usize>,
    pub winner: Option<PlayerId>,
    /// Events from the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl MatchState {
    /// Standard two-player arena with the ball on player 0's paddle
    pub fn new(tuning: Tuning) -> Self {
        let tuning = tuning.validate();
        let attach_x = tuning.ball_radius + PADDLE_SIZE.x * 0.5 + PADDLE_ATTACH_GAP;

        // (id, paddle x, side the ball is served towards)
        let sides: [(PlayerId, f32, f32); 2] = [(0, -PADDLE_START_X, 1.0), (1, PADDLE_START_X, -1.0)];

        let players = sides
            .iter()
            .map(|&(id, _, _)| Player::new(id, tuning.max_health))
            .collect();
        let paddles = sides
            .iter()
            .map(|&(id, x, dir)| {
                Paddle::new(id, Vec2::new(x, 0.0), Vec2::new(dir * attach_x, 0.0), &tuning)
            })
            .collect();
        let homebases = sides
            .iter()
            .map(|&(id, x, _)| Homebase {
                player_id: id,
                center: Vec2::new(x.signum() * HOMEBASE_CENTER_X, 0.0),
                size: HOMEBASE_SIZE,
            })
            .collect();
        let walls = WALLS
            .iter()
            .map(|&(center, size)| Wall {
                center,
                size,
                collider: None,
            })
            .collect();

        let mut state = Self {
            ball: Ball::new(&tuning),
            tuning,
            phase: MatchPhase::Playing,
            time_ticks: 0,
            players,
            paddles,
            homebases,
            walls,
            colliders: ColliderRegistry::new(),
            next_server: None,
            next_serve_paddle: None,
            winner: None,
            events: Vec::new(),
        };

        state.register_colliders();
        state.ball.attach_to(0, &state.paddles[0]);
        log::info!(
            "Match created: {} players, {} colliders",
            state.players.len(),
            state.colliders.len()
        );
        state
    }

    /// Register every paddle and wall that does not have a live collider yet
    pub fn register_colliders(&mut self) {
        for paddle in &mut self.paddles {
            let aabb = paddle.aabb();
            register_box(&mut self.colliders, &mut paddle.collider, aabb);
        }
        for wall in &mut self.walls {
            let aabb = wall.aabb();
            register_box(&mut self.colliders, &mut wall.collider, aabb);
        }
    }

    /// Push a paddle's current box into the registry
    pub fn sync_paddle_collider(&mut self, index: usize) {
        let Some(paddle) = self.paddles.get(index) else {
            return;
        };
        if let Some(handle) = paddle.collider {
            if !self.colliders.set_aabb(handle, paddle.aabb()) {
                log::debug!("Paddle {} collider {:?} is not registered", index, handle);
            }
        }
    }

    /// Tear down all paddles, releasing their colliders and any ball relation
    pub fn clear_paddles(&mut self) {
        for paddle in &mut self.paddles {
            if let Some(handle) = paddle.collider.take() {
                if self.colliders.is_collider_registered(handle) {
                    self.colliders.unregister_aabb(handle);
                }
            }
        }
        self.paddles.clear();
        self.next_serve_paddle = None;
        if self.ball.is_attached() {
            self.ball.detach();
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn paddle_index_for_player(&self, id: PlayerId) -> Option<usize> {
        self.paddles.iter().position(|p| p.player_id == id)
    }

    /// Paddle owning a registered collider
    pub fn paddle_index_for_handle(&self, handle: ColliderHandle) -> Option<usize> {
        self.paddles.iter().position(|p| p.collider == Some(handle))
    }
}

fn register_box(colliders: &mut ColliderRegistry, slot: &mut Option<ColliderHandle>, aabb: Aabb) {
    if let Some(handle) = *slot {
        if colliders.is_collider_registered(handle) {
            return;
        }
    }
    *slot = Some(colliders.register_aabb(aabb));
}
