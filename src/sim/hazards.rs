//! Offensive hazard entities spawned by destroyed bricks
//!
//! Each kind carries its own motion model; [`Hazard`] dispatches over them
//! with a flat enum. [`HazardManager`] owns the live population for the
//! current level and drops entities as soon as they are inactive or leave
//! the field.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::shapes::Rect;
use super::state::HazardKind;
use crate::tuning::Tuning;
use crate::{heading, normalize_angle, normalize_or};

/// How far outside the field a hazard may stray before it is retired
const OFFSCREEN_MARGIN: f32 = 40.0;
/// Slack when comparing the accumulated fuse against its length
const FUSE_EPSILON: f32 = 1e-4;
/// Per-second decay of dynamite drift
const DYNAMITE_DRIFT_DAMPING: f32 = 1.5;

const LASER_BOLT_SIZE: f32 = 10.0;
const MISSILE_SIZE: f32 = 12.0;
const RADIAL_SIZE: f32 = 8.0;
const FRAGMENT_SIZE: f32 = 16.0;
const DYNAMITE_SIZE: f32 = 14.0;

/// Area damage emitted by a detonating hazard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub center: Vec2,
    pub radius: f32,
    pub damage: i32,
}

/// Straight fall under constant gravity
#[derive(Debug, Clone)]
pub struct FallingDebris {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    gravity: f32,
    active: bool,
}

impl FallingDebris {
    pub fn new(pos: Vec2, size: f32, gravity: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            gravity,
            active: true,
        }
    }

    fn update(&mut self, dt: f32) {
        self.vel.y += self.gravity * dt;
        self.pos += self.vel * dt;
    }
}

/// One particle of an exploding brick: constant velocity, no gravity
#[derive(Debug, Clone)]
pub struct RadialDebris {
    pub pos: Vec2,
    pub vel: Vec2,
    active: bool,
}

impl RadialDebris {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            active: true,
        }
    }

    /// `count` particles at even angular spacing
    pub fn burst(center: Vec2, count: u32, speed: f32) -> Vec<Self> {
        let step = std::f32::consts::TAU / count.max(1) as f32;
        (0..count)
            .map(|i| Self::new(center, heading(step * i as f32) * speed))
            .collect()
    }

    fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }
}

/// Laser phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaserPhase {
    /// Aiming at the bat; cannot be collided with
    Charging { elapsed: f32 },
    /// Travelling along the locked direction
    Firing,
}

/// A laser that tracks the bat while charging, then fires in a straight line
#[derive(Debug, Clone)]
pub struct TrackingLaser {
    pub pos: Vec2,
    pub dir: Vec2,
    pub phase: LaserPhase,
    charge_time: f32,
    speed: f32,
    active: bool,
}

impl TrackingLaser {
    pub fn new(pos: Vec2, charge_time: f32, speed: f32) -> Self {
        Self {
            pos,
            dir: Vec2::new(0.0, 1.0),
            phase: LaserPhase::Charging { elapsed: 0.0 },
            charge_time,
            speed,
            active: true,
        }
    }

    pub fn is_firing(&self) -> bool {
        self.phase == LaserPhase::Firing
    }

    fn update(&mut self, dt: f32, target: Vec2) {
        match self.phase {
            LaserPhase::Charging { elapsed } => {
                self.dir = normalize_or(target - self.pos, self.dir);
                let elapsed = elapsed + dt;
                self.phase = if elapsed >= self.charge_time {
                    LaserPhase::Firing
                } else {
                    LaserPhase::Charging { elapsed }
                };
            }
            LaserPhase::Firing => {
                self.pos += self.dir * self.speed * dt;
            }
        }
    }
}

/// A missile that steers toward the bat with a bounded turn rate
#[derive(Debug, Clone)]
pub struct HomingMissile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    speed: f32,
    acceleration: f32,
    max_speed: f32,
    /// Radians per second
    turn_rate: f32,
    lifetime: f32,
    active: bool,
}

impl HomingMissile {
    pub fn new(pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            vel: Vec2::new(0.0, tuning.missile_start_speed),
            age: 0.0,
            speed: tuning.missile_start_speed,
            acceleration: tuning.missile_acceleration,
            max_speed: tuning.missile_max_speed,
            turn_rate: tuning.missile_turn_rate(),
            lifetime: tuning.missile_lifetime,
            active: true,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn update(&mut self, dt: f32, target: Vec2) {
        let current = self.vel.y.atan2(self.vel.x);
        let to_target = target - self.pos;
        let new_heading = if to_target.length_squared() > f32::EPSILON {
            let desired = to_target.y.atan2(to_target.x);
            let max_turn = self.turn_rate * dt;
            current + normalize_angle(desired - current).clamp(-max_turn, max_turn)
        } else {
            current
        };

        self.speed = (self.speed + self.acceleration * dt).min(self.max_speed);
        self.vel = heading(new_heading) * self.speed;
        self.pos += self.vel * dt;

        self.age += dt;
        if self.age >= self.lifetime {
            self.active = false;
        }
    }
}

/// Fragment phases; transitions are driven by distance travelled, then time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentPhase {
    Moving,
    Shaking { elapsed: f32 },
    Falling,
}

/// A piece of a split brick: travels, shakes in place, then drops
#[derive(Debug, Clone)]
pub struct SplittingFragment {
    pub pos: Vec2,
    pub vel: Vec2,
    pub phase: FragmentPhase,
    pub traveled: f32,
    anchor: Vec2,
    split_distance: f32,
    shake_time: f32,
    jitter: f32,
    gravity: f32,
    active: bool,
}

impl SplittingFragment {
    pub fn new(pos: Vec2, vel: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            vel,
            phase: FragmentPhase::Moving,
            traveled: 0.0,
            anchor: pos,
            split_distance: tuning.fragment_split_distance,
            shake_time: tuning.fragment_shake_time,
            jitter: tuning.fragment_jitter,
            gravity: tuning.gravity,
            active: true,
        }
    }

    fn update(&mut self, dt: f32, rng: &mut Pcg32) {
        match self.phase {
            FragmentPhase::Moving => {
                let step = self.vel * dt;
                self.pos += step;
                self.traveled += step.length();
                if self.traveled >= self.split_distance {
                    self.anchor = self.pos;
                    self.vel = Vec2::ZERO;
                    self.phase = FragmentPhase::Shaking { elapsed: 0.0 };
                }
            }
            FragmentPhase::Shaking { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.shake_time {
                    self.pos = self.anchor;
                    self.phase = FragmentPhase::Falling;
                } else {
                    let offset = if self.jitter > 0.0 {
                        Vec2::new(
                            rng.random_range(-self.jitter..=self.jitter),
                            rng.random_range(-self.jitter..=self.jitter),
                        )
                    } else {
                        Vec2::ZERO
                    };
                    self.pos = self.anchor + offset;
                    self.phase = FragmentPhase::Shaking { elapsed };
                }
            }
            FragmentPhase::Falling => {
                self.vel.y += self.gravity * dt;
                self.pos += self.vel * dt;
            }
        }
    }
}

/// Dynamite phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamiteState {
    Lit,
    /// Detonated; lingers for the flash animation
    Exploded { elapsed: f32 },
}

/// A fused explosive that detonates on a timer
#[derive(Debug, Clone)]
pub struct Dynamite {
    pub pos: Vec2,
    pub drift: Vec2,
    pub fuse_elapsed: f32,
    pub state: DynamiteState,
    fuse_time: f32,
    radius: f32,
    damage: i32,
    flash_time: f32,
    damage_applied: bool,
    active: bool,
}

impl Dynamite {
    pub fn new(pos: Vec2, drift: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            drift,
            fuse_elapsed: 0.0,
            state: DynamiteState::Lit,
            fuse_time: tuning.dynamite_fuse,
            radius: tuning.dynamite_radius,
            damage: tuning.dynamite_damage,
            flash_time: tuning.dynamite_flash_time,
            damage_applied: false,
            active: true,
        }
    }

    pub fn has_exploded(&self) -> bool {
        matches!(self.state, DynamiteState::Exploded { .. })
    }

    /// The detonation, handed out exactly once
    pub fn take_explosion(&mut self) -> Option<Explosion> {
        if !self.has_exploded() || self.damage_applied {
            return None;
        }
        self.damage_applied = true;
        Some(Explosion {
            center: self.pos,
            radius: self.radius,
            damage: self.damage,
        })
    }

    fn update(&mut self, dt: f32) {
        match self.state {
            DynamiteState::Lit => {
                self.pos += self.drift * dt;
                self.drift *= (1.0 - DYNAMITE_DRIFT_DAMPING * dt).max(0.0);
                self.fuse_elapsed += dt;
                if self.fuse_elapsed + FUSE_EPSILON >= self.fuse_time {
                    self.state = DynamiteState::Exploded { elapsed: 0.0 };
                }
            }
            DynamiteState::Exploded { elapsed } => {
                let elapsed = elapsed + dt;
                self.state = DynamiteState::Exploded { elapsed };
                // Stay alive until the blast has been applied
                if elapsed >= self.flash_time && self.damage_applied {
                    self.active = false;
                }
            }
        }
    }
}

/// Any live hazard
#[derive(Debug, Clone)]
pub enum Hazard {
    Falling(FallingDebris),
    Radial(RadialDebris),
    Laser(TrackingLaser),
    Homing(HomingMissile),
    Fragment(SplittingFragment),
    Dynamite(Dynamite),
}

impl Hazard {
    /// The brick kind that produced this hazard
    pub fn kind(&self) -> HazardKind {
        match self {
            Hazard::Falling(_) => HazardKind::Falling,
            Hazard::Radial(_) => HazardKind::Exploding,
            Hazard::Laser(_) => HazardKind::Laser,
            Hazard::Homing(_) => HazardKind::Homing,
            Hazard::Fragment(_) => HazardKind::Splitting,
            Hazard::Dynamite(_) => HazardKind::Dynamite,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Hazard::Falling(h) => h.pos,
            Hazard::Radial(h) => h.pos,
            Hazard::Laser(h) => h.pos,
            Hazard::Homing(h) => h.pos,
            Hazard::Fragment(h) => h.pos,
            Hazard::Dynamite(h) => h.pos,
        }
    }

    /// Visual footprint, whether or not it can be collided with
    pub fn extent(&self) -> Rect {
        let size = match self {
            Hazard::Falling(h) => h.size,
            Hazard::Radial(_) => RADIAL_SIZE,
            Hazard::Laser(_) => LASER_BOLT_SIZE,
            Hazard::Homing(_) => MISSILE_SIZE,
            Hazard::Fragment(_) => FRAGMENT_SIZE,
            Hazard::Dynamite(_) => DYNAMITE_SIZE,
        };
        Rect::from_center(self.position(), size, size)
    }

    /// Collision box; `None` while the hazard cannot hit anything
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Hazard::Laser(l) if !l.is_firing() => None,
            Hazard::Dynamite(_) => None,
            _ => Some(self.extent()),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Hazard::Falling(h) => h.active,
            Hazard::Radial(h) => h.active,
            Hazard::Laser(h) => h.active,
            Hazard::Homing(h) => h.active,
            Hazard::Fragment(h) => h.active,
            Hazard::Dynamite(h) => h.active,
        }
    }

    pub fn deactivate(&mut self) {
        match self {
            Hazard::Falling(h) => h.active = false,
            Hazard::Radial(h) => h.active = false,
            Hazard::Laser(h) => h.active = false,
            Hazard::Homing(h) => h.active = false,
            Hazard::Fragment(h) => h.active = false,
            Hazard::Dynamite(h) => h.active = false,
        }
    }

    pub fn is_off_screen(&self, field: &Rect) -> bool {
        !field.expanded(OFFSCREEN_MARGIN).overlaps(&self.extent())
    }

    /// Advance one step; `target` is the point homing kinds aim at
    pub fn update(&mut self, dt: f32, target: Vec2, rng: &mut Pcg32) {
        match self {
            Hazard::Falling(h) => h.update(dt),
            Hazard::Radial(h) => h.update(dt),
            Hazard::Laser(h) => h.update(dt, target),
            Hazard::Homing(h) => h.update(dt, target),
            Hazard::Fragment(h) => h.update(dt, rng),
            Hazard::Dynamite(h) => h.update(dt),
        }
    }
}

/// Owns every live hazard of the current level
#[derive(Debug, Clone, Default)]
pub struct HazardManager {
    hazards: Vec<Hazard>,
}

impl HazardManager {
    /// Read-only view for collision queries and rendering
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    pub fn push(&mut self, hazard: Hazard) {
        self.hazards.push(hazard);
    }

    /// Spawn whatever a destroyed brick of `kind` leaves behind
    ///
    /// Returns how many entities were created. Bombs, bosses and normal
    /// bricks leave nothing.
    pub fn spawn_from_brick(
        &mut self,
        kind: HazardKind,
        brick: &Rect,
        tuning: &Tuning,
        rng: &mut Pcg32,
    ) -> usize {
        let center = brick.center();
        let before = self.hazards.len();

        match kind {
            HazardKind::Falling => {
                self.push(Hazard::Falling(FallingDebris::new(
                    center,
                    tuning.debris_size,
                    tuning.gravity,
                )));
            }
            HazardKind::Exploding => {
                self.hazards.extend(
                    RadialDebris::burst(center, tuning.radial_count, tuning.radial_speed)
                        .into_iter()
                        .map(Hazard::Radial),
                );
            }
            HazardKind::Laser => {
                self.push(Hazard::Laser(TrackingLaser::new(
                    center,
                    tuning.laser_charge_time,
                    tuning.laser_speed,
                )));
            }
            HazardKind::Homing => {
                self.push(Hazard::Homing(HomingMissile::new(center, tuning)));
            }
            HazardKind::Splitting => {
                for dir in [-1.0, 1.0] {
                    let vel = Vec2::new(dir * tuning.fragment_speed, 0.0);
                    self.push(Hazard::Fragment(SplittingFragment::new(center, vel, tuning)));
                }
            }
            HazardKind::Dynamite => {
                let sideways = rng.random_range(-1.0f32..=1.0) * tuning.dynamite_drift;
                let drift = Vec2::new(sideways, tuning.dynamite_drift * 0.5);
                self.push(Hazard::Dynamite(Dynamite::new(center, drift, tuning)));
            }
            HazardKind::Normal | HazardKind::Bomb | HazardKind::Boss => {}
        }

        self.hazards.len() - before
    }

    /// Advance every hazard one step
    pub fn update(&mut self, dt: f32, target: Vec2, rng: &mut Pcg32) {
        for hazard in &mut self.hazards {
            if hazard.is_active() {
                hazard.update(dt, target, rng);
            }
        }
    }

    /// Collect detonations that have not been applied yet
    pub fn take_explosions(&mut self) -> Vec<Explosion> {
        self.hazards
            .iter_mut()
            .filter_map(|h| match h {
                Hazard::Dynamite(d) => d.take_explosion(),
                _ => None,
            })
            .collect()
    }

    /// Deactivate every hazard touching `target`; returns how many hit
    pub fn collide_with(&mut self, target: &Rect) -> usize {
        let mut hits = 0;
        for hazard in &mut self.hazards {
            if !hazard.is_active() {
                continue;
            }
            if let Some(bounds) = hazard.bounds()
                && bounds.overlaps(target)
            {
                hazard.deactivate();
                hits += 1;
            }
        }
        hits
    }

    /// Drop inactive and off-screen hazards
    pub fn retire(&mut self, field: &Rect) {
        self.hazards
            .retain(|h| h.is_active() && !h.is_off_screen(field));
    }

    /// Discard the whole population at once
    pub fn clear(&mut self) {
        self.hazards.clear();
    }
}
