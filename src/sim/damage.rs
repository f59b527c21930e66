//! Damage application and destruction side effects
//!
//! Everything that lowers brick health goes through [`damage_brick`]. A
//! brick's destruction effect (hazard spawn, bomb blast, boss event) runs at
//! most once no matter how many passes hit it in the same tick.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::hazards::Explosion;
use super::state::{Brick, GameEvent, GameState, HazardKind};

/// What a single damage application did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitOutcome {
    /// Damage dealt after critical doubling; zero when absorbed
    pub damage: i32,
    pub critical: bool,
    /// This call moved the brick from alive to destroyed
    pub destroyed: bool,
}

/// Subtract `amount` from a brick's health, clamping at zero
///
/// Returns true only for the call that destroys the brick. Indestructible
/// and already-destroyed bricks are left untouched.
pub fn apply_damage(brick: &mut Brick, amount: i32) -> bool {
    if !brick.destructible || brick.is_destroyed() || amount <= 0 {
        return false;
    }
    brick.health = (brick.health - amount).max(0);
    brick.is_destroyed()
}

/// Bernoulli trial; certain outcomes never consume randomness
pub fn roll(rng: &mut Pcg32, chance: f32) -> bool {
    if chance >= 1.0 {
        true
    } else if chance <= 0.0 || chance.is_nan() {
        false
    } else {
        rng.random::<f32>() < chance
    }
}

/// Whether a point falls inside an axis-aligned ellipse
pub fn in_ellipse(center: Vec2, point: Vec2, radius_x: f32, radius_y: f32) -> bool {
    if radius_x <= 0.0 || radius_y <= 0.0 {
        return false;
    }
    let d = point - center;
    (d.x / radius_x).powi(2) + (d.y / radius_y).powi(2) <= 1.0
}

/// Damage the brick at `index` and run any destruction effect
///
/// `can_crit` enables the critical-hit roll for this application only.
pub fn damage_brick(state: &mut GameState, index: usize, base: i32, can_crit: bool) -> HitOutcome {
    let Some(brick) = state.level.brick(index) else {
        return HitOutcome::default();
    };
    if brick.is_destroyed() {
        return HitOutcome::default();
    }
    let brick_id = brick.id;

    if !brick.destructible {
        state.events.push(GameEvent::BrickHit { brick_id, damage: 0 });
        return HitOutcome::default();
    }

    let critical = can_crit && roll(&mut state.rng, state.upgrades.crit_chance);
    let damage = if critical { base.saturating_mul(2) } else { base };

    let destroyed = match state.level.brick_mut(index) {
        Some(brick) => apply_damage(brick, damage),
        None => false,
    };

    state.events.push(GameEvent::BrickHit { brick_id, damage });
    if critical {
        state.events.push(GameEvent::CriticalHit { brick_id, damage });
    }
    if destroyed {
        handle_destruction(state, index);
    }

    HitOutcome {
        damage,
        critical,
        destroyed,
    }
}

/// One-shot destruction effect for the brick at `index`
fn handle_destruction(state: &mut GameState, index: usize) {
    let Some(brick) = state.level.brick_mut(index) else {
        return;
    };
    if brick.destruction_handled {
        return;
    }
    brick.destruction_handled = true;
    let (brick_id, kind, rect) = (brick.id, brick.kind, brick.rect);
    let position = rect.center();

    log::debug!("Brick {} ({:?}) destroyed", brick_id, kind);
    state.events.push(GameEvent::BrickDestroyed {
        brick_id,
        kind,
        position,
    });

    match kind {
        HazardKind::Normal => {}
        HazardKind::Bomb => detonate_bomb(state, index),
        HazardKind::Boss => {
            log::info!("Boss brick {} defeated", brick_id);
            state.events.push(GameEvent::BossDefeated { brick_id });
        }
        _ => {
            let spawned =
                state
                    .hazards
                    .spawn_from_brick(kind, &rect, &state.tuning, &mut state.rng);
            if spawned > 0 {
                log::debug!("Spawned {} {:?} hazard(s)", spawned, kind);
                state.events.push(GameEvent::HazardSpawned { kind, position });
            }
        }
    }
}

/// Live destructible bricks (other than `exclude`) matching `inside`
fn bricks_where<F>(state: &GameState, exclude: Option<usize>, inside: F) -> Vec<usize>
where
    F: Fn(&Brick) -> bool,
{
    state
        .level
        .active_bricks()
        .filter(|&(i, b)| Some(i) != exclude && b.destructible && inside(b))
        .map(|(i, _)| i)
        .collect()
}

/// Elliptical blast centered on a destroyed bomb brick
///
/// Wider than tall so it spreads along the row and limits vertical chains.
fn detonate_bomb(state: &mut GameState, index: usize) {
    let Some(bomb) = state.level.brick(index) else {
        return;
    };
    let center = bomb.center();
    let (radius_x, radius_y) = state.tuning.bomb_radii(bomb.rect.width, bomb.rect.height);

    let targets = bricks_where(state, Some(index), |b| {
        in_ellipse(center, b.center(), radius_x, radius_y)
    });

    log::debug!("Bomb detonated at {:?}, {} bricks in range", center, targets.len());
    state.events.push(GameEvent::BombDetonated {
        position: center,
        bricks_hit: targets.len(),
    });

    let damage = state.tuning.bomb_damage;
    for target in targets {
        damage_brick(state, target, damage, false);
    }
}

/// Explosion-upgrade splash around a primary ball hit
///
/// Damages every other live brick whose center lies within the radius of
/// the impact point. Each splash hit rolls its own critical. Returns the
/// number of bricks splashed.
pub fn explode_around(state: &mut GameState, primary: usize, impact: Vec2) -> usize {
    if !state.upgrades.explosion_active() {
        return 0;
    }
    let Some(brick) = state.level.brick(primary) else {
        return 0;
    };
    let radius =
        brick.rect.width * state.tuning.explosion_radius_factor * state.upgrades.explosion_multiplier;

    let targets = bricks_where(state, Some(primary), |b| {
        b.center().distance(impact) <= radius
    });
    let damage = state.ball.damage;
    for &target in &targets {
        damage_brick(state, target, damage, true);
    }
    targets.len()
}

/// Circular blast from a detonated hazard; returns bricks damaged
pub fn apply_explosion(state: &mut GameState, explosion: &Explosion) -> usize {
    let targets = bricks_where(state, None, |b| {
        b.center().distance(explosion.center) <= explosion.radius
    });
    state.events.push(GameEvent::DynamiteExploded {
        position: explosion.center,
        bricks_hit: targets.len(),
    });
    for &target in &targets {
        damage_brick(state, target, explosion.damage, false);
    }
    targets.len()
}

/// Roll whether the ball pierces a brick it just touched
pub fn roll_pierce(state: &mut GameState) -> bool {
    state.ball.is_piercing() || roll(&mut state.rng, state.upgrades.pierce_chance)
}
