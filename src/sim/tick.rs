//! Fixed timestep simulation tick
//!
//! Advances one level deterministically. Every entity finishes moving before
//! any collision pass runs, so responses never act on stale positions.

use std::mem;

use glam::Vec2;

use super::collision::{circle_rect_collision, rect_rect_collision};
use super::damage::{apply_explosion, damage_brick, explode_around, roll_pierce};
use super::response::{WallHit, bounce_off_bat, bounce_off_surface, bounce_off_walls, separate};
use super::shapes::{Circle, Rect};
use super::state::{BatShot, GameEvent, GameState, SHOT_HEIGHT, SHOT_WIDTH};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position the bat centers on (mouse/touch)
    pub pointer: Option<Vec2>,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Inset of each shot from the bat's edge
const SHOT_EDGE_INSET: f32 = 2.0;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;
    state.elapsed += dt;

    // === Motion ===
    apply_input(state, input, dt);
    advance_ball(state, dt);
    let target = state.bat.center();
    state.hazards.update(dt, target, &mut state.rng);
    advance_shots(state, dt);

    // === Collisions (post-motion positions) ===
    resolve_walls(state);
    resolve_bat(state);
    resolve_bricks(state);
    resolve_explosions(state);
    resolve_shots(state);
    resolve_hazards(state);

    // === Cleanup ===
    state.hazards.retire(&state.field);
    let ceiling = state.field.top();
    state
        .shots
        .retain(|s| s.active && s.rect.bottom() > ceiling);

    if !state.cleared && state.level.is_cleared() {
        state.cleared = true;
        log::info!(
            "Level {} cleared in {:.1}s",
            state.level_id,
            state.elapsed
        );
        state.events.push(GameEvent::LevelCleared {
            level_id: state.level_id,
            elapsed_secs: state.elapsed,
        });
    }
}

fn apply_input(state: &mut GameState, input: &TickInput, dt: f32) {
    let bat = &mut state.bat;
    if let Some(pointer) = input.pointer {
        bat.set_mouse_position(pointer);
    }
    if input.left {
        bat.move_left(dt);
    }
    if input.right {
        bat.move_right(dt);
    }
    if input.up {
        bat.move_up(dt);
    }
    if input.down {
        bat.move_down(dt);
    }
}

/// Speed up, count down piercing, integrate position
///
/// Only the scalar speed grows here; the velocity picks it up at the next
/// bounce.
fn advance_ball(state: &mut GameState, dt: f32) {
    let tuning = &state.tuning;
    let accel = tuning.ball_acceleration * state.upgrades.acceleration_scale;
    let ball = &mut state.ball;

    let cap = tuning.ball_max_speed.max(ball.base_speed);
    ball.speed = (ball.speed + accel * dt).min(cap);
    if ball.piercing_timer > 0.0 {
        ball.piercing_timer = (ball.piercing_timer - dt).max(0.0);
    }
    ball.pos += ball.vel * dt;
}

fn advance_shots(state: &mut GameState, dt: f32) {
    if state.upgrades.shooter_unlocked() {
        state.shooter_cooldown -= dt;
        if state.shooter_cooldown <= 0.0 {
            state.shooter_cooldown += state.tuning.shooter_interval;
            fire_shots(state);
        }
    }
    for shot in &mut state.shots {
        shot.rect.x += shot.vel.x * dt;
        shot.rect.y += shot.vel.y * dt;
    }
}

/// One shot from each end of the bat
fn fire_shots(state: &mut GameState) {
    let bat = state.bat.rect;
    let y = bat.top() - SHOT_HEIGHT;
    for x in [
        bat.left() + SHOT_EDGE_INSET,
        bat.right() - SHOT_EDGE_INSET - SHOT_WIDTH,
    ] {
        state.shots.push(BatShot {
            rect: Rect::new(x, y, SHOT_WIDTH, SHOT_HEIGHT),
            vel: Vec2::new(0.0, -state.tuning.shot_speed),
            damage: state.upgrades.shooter_damage,
            active: true,
        });
    }
}

fn resolve_walls(state: &mut GameState) {
    match bounce_off_walls(&mut state.ball, &state.field) {
        Some(WallHit::Back) => lose_ball(state),
        Some(WallHit::Side | WallHit::Top) => state.events.push(GameEvent::WallBounce),
        None => {}
    }
}

fn lose_ball(state: &mut GameState) {
    state.health = (state.health - 1).max(0);
    log::debug!("Ball lost, health now {}", state.health);
    state.events.push(GameEvent::BallLost {
        health: state.health,
    });
    state.ball.respawn_above(&state.bat);
}

fn hurt_player(state: &mut GameState, amount: i32) {
    state.health = (state.health - amount).max(0);
    log::debug!("Player hit for {}, health now {}", amount, state.health);
    state.events.push(GameEvent::PlayerHit {
        health: state.health,
    });
}

fn resolve_bat(state: &mut GameState) {
    let contact = circle_rect_collision(&state.ball.circle(), &state.bat.rect);
    if !contact.hit {
        return;
    }
    let max_angle = state.tuning.max_bounce_angle();
    let offset_ratio = bounce_off_bat(&mut state.ball, &state.bat, contact.point.x, max_angle);
    state.events.push(GameEvent::BatHit { offset_ratio });
}

/// Ball against every live brick, in insertion order
///
/// A pierced brick is remembered until the ball leaves it so it is not hit
/// again on the following ticks. The first brick that is not pierced
/// bounces the ball and ends the pass.
fn resolve_bricks(state: &mut GameState) {
    let circle = state.ball.circle();
    let level = &state.level;
    state.ball.passing_through.retain(|id| {
        level
            .active_bricks()
            .any(|(_, b)| b.id == *id && circle_rect_collision(&circle, &b.rect).hit)
    });

    let candidates: Vec<usize> = state.level.active_bricks().map(|(i, _)| i).collect();
    for index in candidates {
        // Earlier hits in this pass may have destroyed it (splash, bombs)
        let Some(brick) = state.level.brick(index) else {
            continue;
        };
        if brick.is_destroyed() || state.ball.passing_through.contains(&brick.id) {
            continue;
        }
        let (brick_id, destructible, rect) = (brick.id, brick.destructible, brick.rect);

        let contact = circle_rect_collision(&state.ball.circle(), &rect);
        if !contact.hit {
            continue;
        }

        let pierce = destructible && !state.ball.grey && roll_pierce(state);

        if state.ball.grey {
            state.ball.grey = false;
            log::debug!("Ball reactivated on brick {}", brick_id);
        } else {
            let damage = state.ball.damage;
            let outcome = damage_brick(state, index, damage, true);
            if outcome.damage > 0 {
                explode_around(state, index, contact.point);
            }
        }

        if pierce {
            state.events.push(GameEvent::Pierced { brick_id });
            state.ball.passing_through.push(brick_id);
            continue;
        }

        bounce_off_surface(&mut state.ball, contact.normal);
        separate(&mut state.ball, &contact);
        break;
    }
}

/// Apply dynamite blasts; a blast reaching the bat also hurts the player
fn resolve_explosions(state: &mut GameState) {
    for explosion in state.hazards.take_explosions() {
        let bricks_hit = apply_explosion(state, &explosion);
        log::debug!(
            "Dynamite exploded at {:?}, {} bricks in range",
            explosion.center,
            bricks_hit
        );

        let blast = Circle::new(explosion.center, explosion.radius);
        if circle_rect_collision(&blast, &state.bat.rect).hit {
            let amount = state.tuning.hazard_damage;
            hurt_player(state, amount);
        }
    }
}

fn resolve_shots(state: &mut GameState) {
    let mut shots = mem::take(&mut state.shots);
    for shot in shots.iter_mut().filter(|s| s.active) {
        let hit = state
            .level
            .active_bricks()
            .find(|(_, b)| rect_rect_collision(&shot.rect, &b.rect))
            .map(|(i, _)| i);
        if let Some(index) = hit {
            shot.active = false;
            damage_brick(state, index, shot.damage, true);
        }
    }
    state.shots = shots;
}

fn resolve_hazards(state: &mut GameState) {
    let hits = state.hazards.collide_with(&state.bat.rect);
    if hits > 0 {
        let amount = i32::try_from(hits)
            .unwrap_or(i32::MAX)
            .saturating_mul(state.tuning.hazard_damage);
        hurt_player(state, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::hazards::{Dynamite, FallingDebris, Hazard};
    use crate::sim::level::Level;
    use crate::sim::state::{Ball, Brick, HazardKind};
    use crate::sim::upgrades::{UpgradeKey, UpgradeLevels, UpgradeSnapshot};
    use crate::tuning::Tuning;

    fn state_with(bricks: Vec<Brick>, upgrades: UpgradeSnapshot) -> GameState {
        GameState::new(Level::from_bricks(1, 3, bricks), upgrades, Tuning::default(), 11)
    }

    fn count(state: &GameState, pred: impl Fn(&GameEvent) -> bool) -> usize {
        state.events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_ball_bounces_and_destroys_brick() {
        let brick = Brick::new(1, Rect::new(90.0, 90.0, 100.0, 20.0), HazardKind::Normal, 1, true);
        let mut state = state_with(vec![brick], UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(100.0, 85.0), Vec2::new(0.0, 1.0), 100.0, 1);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.ball.vel.y < 0.0);
        assert!(state.level.brick(0).unwrap().is_destroyed());
        assert!(state.ball.pos.y + state.ball.radius <= 90.0 + 1e-3);
    }

    #[test]
    fn test_full_pierce_passes_through_stacked_bricks() {
        let upgrades = UpgradeLevels::new().with(UpgradeKey::Piercing, 10).snapshot();
        let bricks = (1..=3)
            .map(|id| Brick::new(id, Rect::new(250.0, 150.0, 100.0, 100.0), HazardKind::Normal, 5, true))
            .collect();
        let mut state = state_with(bricks, upgrades);
        state.ball = Ball::new(Vec2::new(300.0, 200.0), Vec2::new(0.0, -1.0), 100.0, 1);
        let before = state.ball.vel;

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.ball.vel, before);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::Pierced { .. })), 3);
        for i in 0..3 {
            assert_eq!(state.level.brick(i).unwrap().health(), 4);
        }

        // Still inside: no re-hits until the ball leaves
        tick(&mut state, &TickInput::default(), SIM_DT);
        for i in 0..3 {
            assert_eq!(state.level.brick(i).unwrap().health(), 4);
        }
        assert_eq!(state.ball.passing_through, vec![1, 2, 3]);
    }

    #[test]
    fn test_piercing_timer_forces_pierce_then_expires() {
        let bricks = vec![Brick::new(1, Rect::new(250.0, 150.0, 100.0, 100.0), HazardKind::Normal, 5, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(300.0, 200.0), Vec2::new(0.0, -1.0), 100.0, 1);
        state.ball.grant_piercing(2.0 * SIM_DT);
        let before = state.ball.vel;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.ball.vel, before);
        assert!(state.events.contains(&GameEvent::Pierced { brick_id: 1 }));

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!state.ball.is_piercing());
    }

    #[test]
    fn test_no_pierce_stops_at_first_brick() {
        let bricks = (1..=3)
            .map(|id| Brick::new(id, Rect::new(250.0, 150.0, 100.0, 100.0), HazardKind::Normal, 5, true))
            .collect();
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(300.0, 200.0), Vec2::new(0.0, -1.0), 100.0, 1);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.level.brick(0).unwrap().health(), 4);
        assert_eq!(state.level.brick(1).unwrap().health(), 5);
        assert_eq!(state.level.brick(2).unwrap().health(), 5);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::BrickHit { .. })), 1);
    }

    #[test]
    fn test_indestructible_brick_always_bounces() {
        let upgrades = UpgradeLevels::new().with(UpgradeKey::Piercing, 10).snapshot();
        let bricks = vec![
            Brick::new(1, Rect::new(250.0, 250.0, 100.0, 20.0), HazardKind::Normal, 1, false),
            Brick::new(2, Rect::new(600.0, 100.0, 100.0, 20.0), HazardKind::Normal, 1, true),
        ];
        let mut state = state_with(bricks, upgrades);
        state.ball = Ball::new(Vec2::new(300.0, 281.0), Vec2::new(0.0, -1.0), 100.0, 1);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.ball.vel.y > 0.0);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::Pierced { .. })), 0);
        assert_eq!(state.level.brick(0).unwrap().health(), 1);
    }

    #[test]
    fn test_grey_ball_deals_no_damage_then_revives() {
        let bricks = vec![Brick::new(1, Rect::new(250.0, 250.0, 100.0, 20.0), HazardKind::Normal, 3, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(300.0, 281.0), Vec2::new(0.0, -1.0), 100.0, 1);
        state.ball.grey = true;

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(!state.ball.grey);
        assert!(state.ball.vel.y > 0.0);
        assert_eq!(state.level.brick(0).unwrap().health(), 3);
    }

    #[test]
    fn test_back_wall_costs_health_and_respawns() {
        let bricks = vec![Brick::new(1, Rect::new(100.0, 100.0, 100.0, 25.0), HazardKind::Normal, 1, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(500.0, 689.0), Vec2::new(0.0, 1.0), 100.0, 1);

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.health, BASE_HEALTH - 1);
        assert!(state.events.contains(&GameEvent::BallLost {
            health: BASE_HEALTH - 1
        }));
        assert!(state.ball.grey);
        assert!(state.ball.vel.y < 0.0);
        assert!(state.ball.pos.y < state.bat.rect.top());
    }

    #[test]
    fn test_hazard_touching_bat_hurts_player() {
        let bricks = vec![Brick::new(1, Rect::new(100.0, 100.0, 100.0, 25.0), HazardKind::Normal, 1, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        let at = state.bat.center();
        state
            .hazards
            .push(Hazard::Falling(FallingDebris::new(at, 14.0, 400.0)));

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.health, BASE_HEALTH - 1);
        assert!(state.events.contains(&GameEvent::PlayerHit {
            health: BASE_HEALTH - 1
        }));
        assert!(state.hazards.is_empty());
    }

    #[test]
    fn test_dynamite_blast_applies_once_through_tick() {
        let bricks = vec![
            Brick::new(1, Rect::from_center(Vec2::new(700.0, 200.0), 100.0, 25.0), HazardKind::Normal, 1, true),
            Brick::new(2, Rect::new(100.0, 60.0, 100.0, 25.0), HazardKind::Normal, 1, true),
        ];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(100.0, 400.0), Vec2::new(0.0, -1.0), 400.0, 1);
        let short_fuse = Tuning {
            dynamite_fuse: 0.1,
            ..Tuning::default()
        };
        state.hazards.push(Hazard::Dynamite(Dynamite::new(
            Vec2::new(700.0, 260.0),
            Vec2::ZERO,
            &short_fuse,
        )));

        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        assert!(state.level.brick(0).unwrap().is_destroyed());
        assert_eq!(count(&state, |e| matches!(e, GameEvent::DynamiteExploded { .. })), 1);
        assert_eq!(state.health, BASE_HEALTH);
    }

    #[test]
    fn test_bat_shooter_hits_brick_above() {
        let upgrades = UpgradeLevels::new().with(UpgradeKey::BatShooter, 1).snapshot();
        let bricks = vec![Brick::new(1, Rect::new(400.0, 300.0, 200.0, 25.0), HazardKind::Normal, 10, true)];
        let mut state = state_with(bricks, upgrades);
        state.ball = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, -1.0), 400.0, 1);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.shots.len(), 2);

        for _ in 0..59 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.level.brick(0).unwrap().health(), 10 - 2 * upgrades.shooter_damage);
    }

    #[test]
    fn test_ball_speeds_up_until_cap() {
        let bricks = vec![Brick::new(1, Rect::new(100.0, 60.0, 100.0, 25.0), HazardKind::Normal, 1, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        state.tuning.ball_acceleration = 1000.0;
        state.ball.grey = true;

        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.ball.speed, state.tuning.ball_max_speed);
    }

    #[test]
    fn test_full_slowdown_freezes_speed() {
        let upgrades = UpgradeLevels::new().with(UpgradeKey::BallSlowdown, 6).snapshot();
        let bricks = vec![Brick::new(1, Rect::new(100.0, 60.0, 100.0, 25.0), HazardKind::Normal, 1, true)];
        let mut state = state_with(bricks, upgrades);
        let start = state.ball.speed;

        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.ball.speed, start);
    }

    #[test]
    fn test_level_cleared_emitted_once() {
        let brick = Brick::new(1, Rect::new(90.0, 90.0, 100.0, 20.0), HazardKind::Normal, 1, true);
        let mut state = state_with(vec![brick], UpgradeSnapshot::default());
        state.ball = Ball::new(Vec2::new(100.0, 85.0), Vec2::new(0.0, 1.0), 100.0, 1);

        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.cleared);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::LevelCleared { .. })), 1);
    }

    #[test]
    fn test_input_moves_bat() {
        let bricks = vec![Brick::new(1, Rect::new(100.0, 60.0, 100.0, 25.0), HazardKind::Normal, 1, true)];
        let mut state = state_with(bricks, UpgradeSnapshot::default());
        let start = state.bat.center();

        let input = TickInput {
            left: true,
            up: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!(state.bat.center().x < start.x);
        assert!(state.bat.center().y < start.y);

        let input = TickInput {
            pointer: Some(Vec2::new(200.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!((state.bat.center().x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_determinism() {
        let upgrades = UpgradeLevels::new()
            .with(UpgradeKey::Piercing, 3)
            .with(UpgradeKey::Critical, 4)
            .with(UpgradeKey::Explosion, 1)
            .snapshot();
        let kinds = [
            HazardKind::Splitting,
            HazardKind::Exploding,
            HazardKind::Dynamite,
            HazardKind::Homing,
            HazardKind::Laser,
            HazardKind::Bomb,
        ];
        let bricks: Vec<Brick> = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let x = 50.0 + i as f32 * (BRICK_WIDTH + 20.0);
                Brick::new(i as u32 + 1, Rect::new(x, 100.0, BRICK_WIDTH, BRICK_HEIGHT), kind, 2, true)
            })
            .collect();

        let mut state1 = state_with(bricks.clone(), upgrades);
        let mut state2 = state_with(bricks, upgrades);

        let inputs = [
            TickInput {
                pointer: Some(Vec2::new(420.0, 600.0)),
                ..Default::default()
            },
            TickInput {
                left: true,
                ..Default::default()
            },
            TickInput::default(),
            TickInput {
                right: true,
                up: true,
                ..Default::default()
            },
        ];

        for step in 0..600 {
            let input = &inputs[step % inputs.len()];
            tick(&mut state1, input, SIM_DT);
            tick(&mut state2, input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.ball.pos, state2.ball.pos);
        assert_eq!(state1.health, state2.health);
        assert_eq!(state1.hazards.len(), state2.hazards.len());
        assert_eq!(state1.events, state2.events);
    }
}
