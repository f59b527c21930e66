//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (brick insertion order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod damage;
pub mod hazards;
pub mod level;
pub mod response;
pub mod shapes;
pub mod state;
pub mod tick;
pub mod upgrades;

pub use collision::{CollisionResult, circle_rect_collision, rect_rect_collision};
pub use damage::{HitOutcome, apply_damage};
pub use hazards::{Explosion, Hazard, HazardManager};
pub use level::{Level, LevelConfig, LevelError, LevelSet};
pub use response::{WallHit, bounce_off_bat, bounce_off_surface, bounce_off_walls};
pub use shapes::{Circle, Rect};
pub use state::{Ball, Bat, BatShot, Brick, GameEvent, GameState, HazardKind};
pub use tick::{TickInput, tick};
pub use upgrades::{UpgradeKey, UpgradeLevels, UpgradeSnapshot};
