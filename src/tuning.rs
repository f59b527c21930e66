//! Data-driven game balance
//!
//! Every gameplay constant the simulation consumes. Defaults are the shipped
//! balance; a JSON document may override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Loop ===
    /// Simulation step (seconds)
    pub fixed_step: f32,
    /// Longest frame delta fed to the accumulator (seconds)
    pub max_frame_delta: f32,
    /// Seconds between health reaching zero and the game-over screen
    pub game_over_delay: f32,

    // === Ball ===
    pub ball_base_speed: f32,
    pub ball_max_speed: f32,
    /// Speed gained per second of play
    pub ball_acceleration: f32,

    // === Bat ===
    pub bat_speed: f32,
    /// Largest deflection off the bat edge (degrees)
    pub max_bounce_angle_deg: f32,

    // === Area damage ===
    /// Explosion upgrade radius, in brick widths
    pub explosion_radius_factor: f32,
    /// Bomb ellipse horizontal radius, in brick widths
    pub bomb_radius_x_factor: f32,
    /// Bomb ellipse vertical radius, in brick heights
    pub bomb_radius_y_factor: f32,
    pub bomb_damage: i32,

    // === Hazards ===
    pub gravity: f32,
    pub hazard_damage: i32,
    pub debris_size: f32,
    pub radial_count: u32,
    pub radial_speed: f32,
    pub laser_charge_time: f32,
    pub laser_speed: f32,
    pub missile_start_speed: f32,
    pub missile_acceleration: f32,
    pub missile_max_speed: f32,
    /// Turn rate (degrees per second)
    pub missile_turn_rate_deg: f32,
    pub missile_lifetime: f32,
    pub fragment_speed: f32,
    /// Distance a fragment travels before it starts shaking
    pub fragment_split_distance: f32,
    pub fragment_shake_time: f32,
    pub fragment_jitter: f32,
    pub dynamite_fuse: f32,
    pub dynamite_radius: f32,
    pub dynamite_damage: i32,
    pub dynamite_drift: f32,
    /// How long the exploded dynamite lingers on screen
    pub dynamite_flash_time: f32,

    // === Bat shooter ===
    pub shooter_interval: f32,
    pub shot_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fixed_step: SIM_DT,
            max_frame_delta: 0.25,
            game_over_delay: 1.0,

            ball_base_speed: BALL_BASE_SPEED,
            ball_max_speed: 700.0,
            ball_acceleration: 4.0,

            bat_speed: BAT_SPEED,
            max_bounce_angle_deg: 60.0,

            explosion_radius_factor: 1.0,
            bomb_radius_x_factor: 1.5,
            bomb_radius_y_factor: 1.5,
            bomb_damage: 2,

            gravity: 400.0,
            hazard_damage: 1,
            debris_size: 14.0,
            radial_count: 8,
            radial_speed: 220.0,
            laser_charge_time: 1.0,
            laser_speed: 650.0,
            missile_start_speed: 60.0,
            missile_acceleration: 180.0,
            missile_max_speed: 320.0,
            missile_turn_rate_deg: 120.0,
            missile_lifetime: 6.0,
            fragment_speed: 160.0,
            fragment_split_distance: 80.0,
            fragment_shake_time: 0.5,
            fragment_jitter: 2.0,
            dynamite_fuse: 3.0,
            dynamite_radius: 120.0,
            dynamite_damage: 2,
            dynamite_drift: 20.0,
            dynamite_flash_time: 0.4,

            shooter_interval: 1.0,
            shot_speed: 520.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("fixed_step", self.fixed_step),
            ("max_frame_delta", self.max_frame_delta),
            ("ball_base_speed", self.ball_base_speed),
            ("bat_speed", self.bat_speed),
            ("laser_speed", self.laser_speed),
            ("missile_max_speed", self.missile_max_speed),
            ("missile_lifetime", self.missile_lifetime),
            ("dynamite_fuse", self.dynamite_fuse),
            ("shooter_interval", self.shooter_interval),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be a positive number",
                });
            }
        }

        let non_negative = [
            ("gravity", self.gravity),
            ("explosion_radius_factor", self.explosion_radius_factor),
            ("bomb_radius_x_factor", self.bomb_radius_x_factor),
            ("bomb_radius_y_factor", self.bomb_radius_y_factor),
            ("laser_charge_time", self.laser_charge_time),
            ("fragment_split_distance", self.fragment_split_distance),
            ("fragment_shake_time", self.fragment_shake_time),
            ("fragment_jitter", self.fragment_jitter),
            ("dynamite_radius", self.dynamite_radius),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be a non-negative number",
                });
            }
        }

        if self.max_frame_delta < self.fixed_step {
            return Err(TuningError::Invalid {
                field: "max_frame_delta",
                reason: "must be at least one fixed step",
            });
        }
        if self.ball_max_speed < self.ball_base_speed {
            return Err(TuningError::Invalid {
                field: "ball_max_speed",
                reason: "must not be below ball_base_speed",
            });
        }
        if !(self.max_bounce_angle_deg > 0.0 && self.max_bounce_angle_deg < 90.0) {
            return Err(TuningError::Invalid {
                field: "max_bounce_angle_deg",
                reason: "must be strictly between 0 and 90 degrees",
            });
        }
        if self.radial_count == 0 {
            return Err(TuningError::Invalid {
                field: "radial_count",
                reason: "must spawn at least one particle",
            });
        }
        Ok(())
    }

    /// Bat deflection cap in radians
    pub fn max_bounce_angle(&self) -> f32 {
        self.max_bounce_angle_deg.to_radians()
    }

    /// Missile turn rate in radians per second
    pub fn missile_turn_rate(&self) -> f32 {
        self.missile_turn_rate_deg.to_radians()
    }

    /// Bomb ellipse radii for a bomb brick of the given size
    pub fn bomb_radii(&self, brick_width: f32, brick_height: f32) -> (f32, f32) {
        (
            brick_width * self.bomb_radius_x_factor,
            brick_height * self.bomb_radius_y_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{"dynamite_fuse": 2.5}"#).unwrap();
        assert_eq!(tuning.dynamite_fuse, 2.5);
        assert_eq!(tuning.ball_base_speed, BALL_BASE_SPEED);
    }

    #[test]
    fn test_rejects_flat_bounce_angle() {
        let err = Tuning::from_json(r#"{"max_bounce_angle_deg": 90.0}"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "max_bounce_angle_deg",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_negative_or_non_finite_factors() {
        for json in [
            r#"{"gravity": -1.0}"#,
            r#"{"bomb_radius_x_factor": -0.5}"#,
            r#"{"bomb_radius_y_factor": -0.5}"#,
            r#"{"dynamite_radius": -10.0}"#,
            r#"{"laser_charge_time": -1.0}"#,
            r#"{"fragment_split_distance": -4.0}"#,
            r#"{"fragment_shake_time": -0.1}"#,
        ] {
            assert!(
                matches!(Tuning::from_json(json), Err(TuningError::Invalid { .. })),
                "accepted {}",
                json
            );
        }

        let tuning = Tuning {
            gravity: f32::INFINITY,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::Invalid {
                field: "gravity",
                ..
            })
        ));

        // Zero turns a hazard off rather than breaking it
        let tuning = Tuning {
            fragment_shake_time: 0.0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_bomb_radii_for_standard_brick() {
        let (rx, ry) = Tuning::default().bomb_radii(BRICK_WIDTH, BRICK_HEIGHT);
        assert_eq!(rx, 150.0);
        assert_eq!(ry, 37.5);
    }
}
