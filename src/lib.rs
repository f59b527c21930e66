//! Brickfall - physics and collision core for a hazard-spawning breakout game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision, response, damage, hazards)
//! - `timestep`: Fixed-timestep accumulator decoupling sim rate from render rate
//! - `session`: Game phase state machine, input surface and event dispatch
//! - `tuning`: Data-driven game balance

pub mod session;
pub mod sim;
pub mod timestep;
pub mod tuning;

pub use session::{EventListener, GamePhase, Session};
pub use timestep::FixedTimestep;
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 1000.0;
    pub const FIELD_HEIGHT: f32 = 700.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_BASE_SPEED: f32 = 400.0;
    pub const BALL_BASE_DAMAGE: i32 = 1;

    /// Bat defaults
    pub const BAT_WIDTH: f32 = 120.0;
    pub const BAT_HEIGHT: f32 = 16.0;
    pub const BAT_SPEED: f32 = 600.0;
    /// Distance from the bottom of the field to the bat's top edge
    pub const BAT_BOTTOM_OFFSET: f32 = 60.0;
    /// How far above its resting row the bat may be pushed
    pub const BAT_VERTICAL_TRAVEL: f32 = 120.0;

    /// Brick defaults (grid cell size)
    pub const BRICK_WIDTH: f32 = 100.0;
    pub const BRICK_HEIGHT: f32 = 25.0;

    /// Player health before upgrades
    pub const BASE_HEALTH: i32 = 3;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Reflect a vector about a unit normal: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    v - 2.0 * v.dot(normal) * normal
}

/// Normalize `v`, or return `fallback` when `v` has no usable direction
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > f32::EPSILON && len.is_finite() {
        v / len
    } else {
        fallback
    }
}

/// Unit vector for a heading angle (radians, y-down screen space)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI + 0.5) - (-PI + 0.5)).abs() < 1e-5);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-5);
        assert!((normalize_angle(-2.0 * PI - 0.5) - (-0.5)).abs() < 1e-5);
        assert!((normalize_angle(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_angle_keeps_direction_at_seam() {
        let wrapped = normalize_angle(3.0 * PI);
        assert!((-PI..=PI).contains(&wrapped));
        assert!((wrapped.cos() - (3.0 * PI).cos()).abs() < 1e-5);
        assert!((wrapped.sin() - (3.0 * PI).sin()).abs() < 1e-5);
    }

    #[test]
    fn test_reflect_flips_normal_component() {
        let r = reflect(Vec2::new(3.0, 4.0), Vec2::new(0.0, -1.0));
        assert!((r - Vec2::new(3.0, -4.0)).length() < 1e-6);
    }

    #[test]
    fn test_normalize_or_zero_vector_uses_fallback() {
        let n = normalize_or(Vec2::ZERO, Vec2::Y);
        assert_eq!(n, Vec2::Y);
        let n = normalize_or(Vec2::new(0.0, 5.0), Vec2::X);
        assert!((n - Vec2::Y).length() < 1e-6);
    }
}
