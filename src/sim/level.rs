//! Level configuration and the live brick collection
//!
//! Levels arrive as static JSON data. Loading is the only place configuration
//! errors surface; once a [`Level`] exists the simulation trusts it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::shapes::Rect;
use super::state::{Brick, HazardKind};
use crate::consts::*;

/// Errors raised while loading a level
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no level configured with id {id}")]
    NotFound { id: u32 },
    #[error("malformed level data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("brick #{index} is invalid: {reason}")]
    InvalidPlacement { index: usize, reason: &'static str },
    #[error("level {id} has no destructible bricks")]
    NoDestructibleTargets { id: u32 },
}

fn default_true() -> bool {
    true
}

fn default_origin_x() -> f32 {
    50.0
}

fn default_origin_y() -> f32 {
    60.0
}

/// One brick in a level's grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickPlacement {
    pub col: u32,
    pub row: u32,
    #[serde(default)]
    pub kind: HazardKind,
    /// Fixed display color (0xRRGGBB)
    #[serde(default)]
    pub color: Option<u32>,
    /// Starting health (defaults per kind)
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default = "default_true")]
    pub destructible: bool,
}

/// Static description of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Mixed into the RNG seed for this level
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_origin_x")]
    pub origin_x: f32,
    #[serde(default = "default_origin_y")]
    pub origin_y: f32,
    /// Spacing between grid cells
    #[serde(default)]
    pub gap: f32,
    pub bricks: Vec<BrickPlacement>,
}

impl LevelConfig {
    /// Rectangle of the grid cell at (col, row)
    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        Rect::new(
            self.origin_x + col as f32 * (BRICK_WIDTH + self.gap),
            self.origin_y + row as f32 * (BRICK_HEIGHT + self.gap),
            BRICK_WIDTH,
            BRICK_HEIGHT,
        )
    }
}

/// All configured levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub levels: Vec<LevelConfig>,
}

impl LevelSet {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let set: LevelSet = serde_json::from_str(json)?;
        log::info!("Parsed {} level configurations", set.levels.len());
        Ok(set)
    }

    pub fn get(&self, id: u32) -> Result<&LevelConfig, LevelError> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or(LevelError::NotFound { id })
    }

    /// Instantiate the bricks of level `id`
    pub fn load(&self, id: u32) -> Result<Level, LevelError> {
        Level::from_config(self.get(id)?)
    }

    /// Id of the level that follows `id` in the set
    pub fn next_after(&self, id: u32) -> Option<u32> {
        let pos = self.levels.iter().position(|l| l.id == id)?;
        self.levels.get(pos + 1).map(|l| l.id)
    }

    pub fn first_id(&self) -> Option<u32> {
        self.levels.first().map(|l| l.id)
    }
}

/// The live bricks of the level being played
///
/// Destroyed bricks stay in the backing store so total/remaining counts keep
/// working; queries skip them.
#[derive(Debug, Clone)]
pub struct Level {
    pub id: u32,
    pub name: String,
    pub seed: u64,
    bricks: Vec<Brick>,
}

impl Level {
    pub fn from_config(config: &LevelConfig) -> Result<Self, LevelError> {
        let field = Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT);
        let mut bricks = Vec::with_capacity(config.bricks.len());

        for (index, placement) in config.bricks.iter().enumerate() {
            let rect = config.cell_rect(placement.col, placement.row);
            if rect.left() < field.left()
                || rect.right() > field.right()
                || rect.top() < field.top()
                || rect.bottom() > field.bottom()
            {
                return Err(LevelError::InvalidPlacement {
                    index,
                    reason: "outside the playfield",
                });
            }
            if bricks.iter().any(|b: &Brick| b.rect.overlaps(&rect)) {
                return Err(LevelError::InvalidPlacement {
                    index,
                    reason: "overlaps another brick",
                });
            }
            let health = match placement.health {
                Some(h) if h <= 0 => {
                    return Err(LevelError::InvalidPlacement {
                        index,
                        reason: "health must be positive",
                    });
                }
                Some(h) => h,
                None => placement.kind.default_health(),
            };

            let id = u32::try_from(index + 1).unwrap_or(u32::MAX);
            bricks.push(
                Brick::new(id, rect, placement.kind, health, placement.destructible)
                    .with_color(placement.color),
            );
        }

        if !bricks.iter().any(|b| b.destructible) {
            return Err(LevelError::NoDestructibleTargets { id: config.id });
        }

        log::info!(
            "Level {} '{}' loaded: {} bricks",
            config.id,
            config.name,
            bricks.len()
        );

        Ok(Self {
            id: config.id,
            name: config.name.clone(),
            seed: config.seed,
            bricks,
        })
    }

    /// Build a level directly from bricks (tests and tools)
    pub fn from_bricks(id: u32, seed: u64, bricks: Vec<Brick>) -> Self {
        Self {
            id,
            name: String::new(),
            seed,
            bricks,
        }
    }

    /// Every brick, destroyed ones included
    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    /// Bricks still in play, in insertion order, with their indices
    pub fn active_bricks(&self) -> impl Iterator<Item = (usize, &Brick)> {
        self.bricks
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_destroyed())
    }

    pub fn brick(&self, index: usize) -> Option<&Brick> {
        self.bricks.get(index)
    }

    pub(crate) fn brick_mut(&mut self, index: usize) -> Option<&mut Brick> {
        self.bricks.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    /// Number of destructible bricks the level started with
    pub fn total_destructible(&self) -> usize {
        self.bricks.iter().filter(|b| b.destructible).count()
    }

    /// Destructible bricks still standing
    pub fn remaining(&self) -> usize {
        self.bricks
            .iter()
            .filter(|b| b.destructible && !b.is_destroyed())
            .count()
    }

    pub fn is_cleared(&self) -> bool {
        self.remaining() == 0
    }
}
