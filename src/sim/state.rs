//! Game state and core simulation types
//!
//! Everything one tick reads or mutates lives here. Entities expose plain
//! getters for the renderer; the core never draws.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::hazards::HazardManager;
use super::level::Level;
use super::shapes::{Circle, Rect};
use super::upgrades::UpgradeSnapshot;
use crate::consts::*;
use crate::tuning::Tuning;

/// What a brick turns into when it is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    #[default]
    Normal,
    /// Drops a block of debris that falls under gravity
    Falling,
    /// Bursts into radial debris
    Exploding,
    /// Charges and fires a laser at the bat
    Laser,
    /// Launches a homing missile
    Homing,
    /// Splits into fragments that travel, shake and fall
    Splitting,
    /// Detonates immediately with an elliptical footprint
    Bomb,
    /// Leaves a fused stick of dynamite behind
    Dynamite,
    /// Boss target, announces its defeat
    Boss,
}

impl HazardKind {
    /// Default starting health for a brick of this kind
    pub fn default_health(&self) -> i32 {
        match self {
            HazardKind::Boss => 20,
            _ => 1,
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Speed the ball is launched with at level start
    pub base_speed: f32,
    /// Current scalar speed; velocity is rescaled to this after every bounce
    pub speed: f32,
    /// Damage dealt per brick hit
    pub damage: i32,
    /// Seconds of guaranteed piercing left
    pub piercing_timer: f32,
    /// Inert: collides with the world but deals no damage until the next brick hit
    pub grey: bool,
    /// Brick IDs the ball is currently piercing through (no re-hits until it exits)
    #[serde(default)]
    pub passing_through: Vec<u32>,
}

impl Ball {
    pub fn new(pos: Vec2, direction: Vec2, speed: f32, damage: i32) -> Self {
        Self {
            pos,
            vel: crate::normalize_or(direction, Vec2::new(0.0, -1.0)) * speed,
            radius: BALL_RADIUS,
            base_speed: speed,
            speed,
            damage,
            piercing_timer: 0.0,
            grey: false,
            passing_through: Vec::new(),
        }
    }

    /// Collision shape
    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }

    pub fn is_piercing(&self) -> bool {
        self.piercing_timer > 0.0
    }

    /// Grant guaranteed piercing for `seconds`
    pub fn grant_piercing(&mut self, seconds: f32) {
        self.piercing_timer = self.piercing_timer.max(seconds);
    }

    /// Place the ball just above the bat, heading upward
    pub fn respawn_above(&mut self, bat: &Bat) {
        let center = bat.center();
        self.pos = Vec2::new(center.x, bat.rect.top() - self.radius - 1.0);
        self.speed = self.base_speed;
        self.vel = Vec2::new(0.0, -self.speed);
        self.piercing_timer = 0.0;
        self.passing_through.clear();
        self.grey = true;
    }
}

/// Movement limits for the bat's rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatBounds {
    /// Leftmost allowed left edge
    pub min_x: f32,
    /// Rightmost allowed right edge
    pub max_x: f32,
    /// Highest allowed top edge
    pub min_y: f32,
    /// Lowest allowed top edge
    pub max_y: f32,
}

/// The player's bat (paddle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bat {
    pub rect: Rect,
    pub speed: f32,
    pub bounds: BatBounds,
}

impl Bat {
    /// Create a bat resting at the bottom of `field`
    pub fn new(field: &Rect, speed: f32) -> Self {
        let rest_y = field.bottom() - BAT_BOTTOM_OFFSET;
        let bounds = BatBounds {
            min_x: field.left(),
            max_x: field.right(),
            min_y: rest_y - BAT_VERTICAL_TRAVEL,
            max_y: rest_y,
        };
        let rect = Rect::new(
            field.center().x - BAT_WIDTH / 2.0,
            rest_y,
            BAT_WIDTH,
            BAT_HEIGHT,
        );
        Self {
            rect,
            speed,
            bounds,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    fn clamp_into_bounds(&mut self) {
        let max_left = (self.bounds.max_x - self.rect.width).max(self.bounds.min_x);
        self.rect.x = self.rect.x.clamp(self.bounds.min_x, max_left);
        self.rect.y = self.rect.y.clamp(self.bounds.min_y, self.bounds.max_y);
    }

    /// Translate by `delta`, staying within bounds
    pub fn move_by(&mut self, delta: Vec2) {
        self.rect.x += delta.x;
        self.rect.y += delta.y;
        self.clamp_into_bounds();
    }

    pub fn move_left(&mut self, dt: f32) {
        self.move_by(Vec2::new(-self.speed * dt, 0.0));
    }

    pub fn move_right(&mut self, dt: f32) {
        self.move_by(Vec2::new(self.speed * dt, 0.0));
    }

    pub fn move_up(&mut self, dt: f32) {
        self.move_by(Vec2::new(0.0, -self.speed * dt));
    }

    pub fn move_down(&mut self, dt: f32) {
        self.move_by(Vec2::new(0.0, self.speed * dt));
    }

    /// Center the bat under the pointer (clamped to bounds)
    pub fn set_mouse_position(&mut self, pointer: Vec2) {
        self.rect = self.rect.recentered(pointer);
        self.clamp_into_bounds();
    }

    /// Change width around the current center (upgrade-driven)
    pub fn resize(&mut self, width: f32) {
        let center = self.center();
        self.rect = Rect::from_center(center, width.max(1.0), self.rect.height);
        self.clamp_into_bounds();
    }
}

/// A brick (target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub rect: Rect,
    pub kind: HazardKind,
    pub destructible: bool,
    /// Fixed display color (0xRRGGBB)
    pub color: Option<u32>,
    pub(crate) health: i32,
    pub(crate) max_health: i32,
    /// One-shot guard for the destruction side effect
    pub(crate) destruction_handled: bool,
}

impl Brick {
    pub fn new(id: u32, rect: Rect, kind: HazardKind, health: i32, destructible: bool) -> Self {
        let health = health.max(1);
        Self {
            id,
            rect,
            kind,
            destructible,
            color: None,
            health,
            max_health: health,
            destruction_handled: false,
        }
    }

    pub fn with_color(mut self, color: Option<u32>) -> Self {
        self.color = color;
        self
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }

    /// Fraction of health lost (for rendering cracks)
    pub fn damage_fraction(&self) -> f32 {
        1.0 - self.health as f32 / self.max_health as f32
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// A shot fired upward by the bat shooter upgrade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatShot {
    pub rect: Rect,
    pub vel: Vec2,
    pub damage: i32,
    pub active: bool,
}

/// Shot size
pub const SHOT_WIDTH: f32 = 4.0;
pub const SHOT_HEIGHT: f32 = 12.0;

/// Discrete things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BrickHit { brick_id: u32, damage: i32 },
    CriticalHit { brick_id: u32, damage: i32 },
    Pierced { brick_id: u32 },
    BrickDestroyed { brick_id: u32, kind: HazardKind, position: Vec2 },
    HazardSpawned { kind: HazardKind, position: Vec2 },
    BombDetonated { position: Vec2, bricks_hit: usize },
    DynamiteExploded { position: Vec2, bricks_hit: usize },
    BossDefeated { brick_id: u32 },
    BatHit { offset_ratio: f32 },
    WallBounce,
    BallLost { health: i32 },
    PlayerHit { health: i32 },
    LevelCleared { level_id: u32, elapsed_secs: f32 },
}

/// Complete simulation state for one level
#[derive(Debug, Clone)]
pub struct GameState {
    /// Level being played
    pub level_id: u32,
    /// Playfield bounds
    pub field: Rect,
    pub ball: Ball,
    pub bat: Bat,
    /// Bricks (the level keeps destroyed ones for bookkeeping)
    pub level: Level,
    /// Live hazard entities
    pub hazards: HazardManager,
    /// Live bat shots
    pub shots: Vec<BatShot>,
    /// Player health
    pub health: i32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds in this level
    pub elapsed: f32,
    /// Upgrade values captured at load time
    pub upgrades: UpgradeSnapshot,
    pub tuning: Tuning,
    /// Events emitted since the last drain
    pub events: Vec<GameEvent>,
    /// Whether the clear event has been emitted
    pub cleared: bool,
    pub(crate) rng: Pcg32,
    pub(crate) shooter_cooldown: f32,
}

impl GameState {
    /// Build the state for a freshly loaded level
    pub fn new(level: Level, upgrades: UpgradeSnapshot, tuning: Tuning, seed: u64) -> Self {
        let field = Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT);
        let mut bat = Bat::new(&field, tuning.bat_speed);
        if upgrades.bat_width_bonus > 0.0 {
            bat.resize(bat.rect.width + upgrades.bat_width_bonus);
        }

        let mut ball = Ball::new(
            Vec2::ZERO,
            Vec2::new(0.0, -1.0),
            tuning.ball_base_speed,
            BALL_BASE_DAMAGE + upgrades.ball_damage_bonus,
        );
        ball.respawn_above(&bat);
        // A fresh level starts with a live ball
        ball.grey = false;

        let rng_seed = seed ^ level.seed.rotate_left(32);

        Self {
            level_id: level.id,
            field,
            ball,
            bat,
            level,
            hazards: HazardManager::default(),
            shots: Vec::new(),
            health: BASE_HEALTH + upgrades.health_bonus,
            time_ticks: 0,
            elapsed: 0.0,
            upgrades,
            tuning,
            events: Vec::new(),
            cleared: false,
            rng: Pcg32::seed_from_u64(rng_seed),
            shooter_cooldown: 0.0,
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop every live entity at once (level reset / screen change)
    pub fn clear_live_entities(&mut self) {
        self.hazards.clear();
        self.shots.clear();
    }

    pub fn is_player_dead(&self) -> bool {
        self.health <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Rect {
        Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT)
    }

    #[test]
    fn test_bat_clamps_to_bounds() {
        let mut bat = Bat::new(&field(), 600.0);
        for _ in 0..1000 {
            bat.move_left(1.0 / 60.0);
        }
        assert_eq!(bat.rect.left(), 0.0);
        for _ in 0..1000 {
            bat.move_up(1.0 / 60.0);
        }
        assert_eq!(bat.rect.top(), bat.bounds.min_y);
    }

    #[test]
    fn test_bat_follows_mouse() {
        let mut bat = Bat::new(&field(), 600.0);
        bat.set_mouse_position(Vec2::new(300.0, bat.center().y));
        assert!((bat.center().x - 300.0).abs() < 1e-4);

        bat.set_mouse_position(Vec2::new(-500.0, 0.0));
        assert_eq!(bat.rect.left(), 0.0);
        assert_eq!(bat.rect.top(), bat.bounds.min_y);
    }

    #[test]
    fn test_bat_resize_recenters() {
        let mut bat = Bat::new(&field(), 600.0);
        let center = bat.center();
        bat.resize(200.0);
        assert_eq!(bat.rect.width, 200.0);
        assert!((bat.center() - center).length() < 1e-4);
    }

    #[test]
    fn test_ball_respawn_is_grey_and_upward() {
        let bat = Bat::new(&field(), 600.0);
        let mut ball = Ball::new(Vec2::ZERO, Vec2::X, 400.0, 1);
        ball.speed = 550.0;
        ball.respawn_above(&bat);
        assert!(ball.grey);
        assert!(ball.vel.y < 0.0);
        assert_eq!(ball.speed, 400.0);
        assert!(ball.pos.y + ball.radius < bat.rect.top());
    }

    #[test]
    fn test_brick_starts_full_health() {
        let brick = Brick::new(1, Rect::new(0.0, 0.0, 100.0, 25.0), HazardKind::Boss, 0, true);
        assert_eq!(brick.health(), 1);
        assert_eq!(brick.max_health(), 1);
        assert!(!brick.is_destroyed());
        assert_eq!(brick.damage_fraction(), 0.0);
    }
}
