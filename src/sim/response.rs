//! Collision response: reflection, position correction and bat steering

use glam::Vec2;

use super::collision::CollisionResult;
use super::shapes::Rect;
use super::state::{Ball, Bat};
use crate::{normalize_or, reflect};

/// Which wall the ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallHit {
    /// Left or right wall (cosmetic bounce)
    Side,
    /// Ceiling (cosmetic bounce)
    Top,
    /// Bottom of the field: the ball is lost
    Back,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    reflect(velocity, normal)
}

/// Bounce the ball off a surface with unit normal `normal`
///
/// The reflected velocity is rescaled to the ball's scalar speed so repeated
/// reflections cannot drift the magnitude. A ball already moving away from
/// the surface keeps its heading.
pub fn bounce_off_surface(ball: &mut Ball, normal: Vec2) {
    let direction = if ball.vel.dot(normal) < 0.0 {
        reflect_velocity(ball.vel, normal)
    } else {
        ball.vel
    };
    ball.vel = normalize_or(direction, normal) * ball.speed;
}

/// Push the ball out of the surface it sank into
pub fn separate(ball: &mut Ball, contact: &CollisionResult) {
    if contact.hit && contact.penetration > 0.0 {
        ball.pos += contact.normal * contact.penetration;
    }
}

/// Horizontal contact position relative to the bat, in [-1, 1]
pub fn bat_offset_ratio(bat: &Bat, contact_x: f32) -> f32 {
    let half = bat.rect.width / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    ((contact_x - bat.center().x) / half).clamp(-1.0, 1.0)
}

/// Bounce the ball off the bat
///
/// The exit angle depends only on where along the bat the ball landed: the
/// center sends it straight up and the edges deflect it by up to
/// `max_angle` radians. The ball always leaves upward and is lifted clear
/// of the bat's top edge. Returns the offset ratio used.
pub fn bounce_off_bat(ball: &mut Ball, bat: &Bat, contact_x: f32, max_angle: f32) -> f32 {
    let offset_ratio = bat_offset_ratio(bat, contact_x);
    let angle = offset_ratio * max_angle;
    ball.vel = Vec2::new(angle.sin(), -angle.cos()) * ball.speed;

    let resting_y = bat.rect.top() - ball.radius;
    if ball.pos.y > resting_y {
        ball.pos.y = resting_y;
    }
    offset_ratio
}

/// Reflect the ball off the field walls and clamp it inside
///
/// Hitting the bottom is reported as [`WallHit::Back`] without a bounce; the
/// caller treats it as a lost ball.
pub fn bounce_off_walls(ball: &mut Ball, field: &Rect) -> Option<WallHit> {
    let r = ball.radius;

    if ball.pos.y + r >= field.bottom() {
        return Some(WallHit::Back);
    }

    let mut hit = None;

    if ball.pos.x - r < field.left() {
        ball.pos.x = field.left() + r;
        ball.vel.x = ball.vel.x.abs();
        hit = Some(WallHit::Side);
    } else if ball.pos.x + r > field.right() {
        ball.pos.x = field.right() - r;
        ball.vel.x = -ball.vel.x.abs();
        hit = Some(WallHit::Side);
    }

    if ball.pos.y - r < field.top() {
        ball.pos.y = field.top() + r;
        ball.vel.y = ball.vel.y.abs();
        hit = Some(WallHit::Top);
    }

    if hit.is_some() {
        ball.vel = normalize_or(ball.vel, Vec2::new(0.0, 1.0)) * ball.speed;
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
    use proptest::prelude::*;

    fn field() -> Rect {
        Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT)
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_bounce_rescales_to_ball_speed() {
        let mut ball = Ball::new(Vec2::ZERO, Vec2::new(0.0, 1.0), 400.0, 1);
        // Drifted magnitude
        ball.vel = Vec2::new(0.0, 395.0);
        bounce_off_surface(&mut ball, Vec2::new(0.0, -1.0));
        assert!(ball.vel.y < 0.0);
        assert!((ball.vel.length() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_ignores_separating_contact() {
        let mut ball = Ball::new(Vec2::ZERO, Vec2::new(0.0, -1.0), 400.0, 1);
        bounce_off_surface(&mut ball, Vec2::new(0.0, -1.0));
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_bat_center_goes_straight_up() {
        let bat = Bat::new(&field(), 600.0);
        let mut ball = Ball::new(bat.center(), Vec2::new(0.3, 1.0), 400.0, 1);
        let ratio = bounce_off_bat(&mut ball, &bat, bat.center().x, 60f32.to_radians());
        assert_eq!(ratio, 0.0);
        assert!(ball.vel.x.abs() < 1e-4);
        assert!((ball.vel.y + 400.0).abs() < 1e-3);
        assert!(ball.pos.y <= bat.rect.top() - ball.radius);
    }

    #[test]
    fn test_bat_edge_deflects_by_max_angle() {
        let bat = Bat::new(&field(), 600.0);
        let mut ball = Ball::new(bat.center(), Vec2::new(0.0, 1.0), 400.0, 1);
        let max = 60f32.to_radians();
        bounce_off_bat(&mut ball, &bat, bat.rect.right() + 50.0, max);
        let angle = ball.vel.x.atan2(-ball.vel.y);
        assert!((angle - max).abs() < 1e-4);
    }

    #[test]
    fn test_back_wall_is_reported_distinctly() {
        let mut ball = Ball::new(Vec2::new(500.0, FIELD_HEIGHT - 5.0), Vec2::Y, 400.0, 1);
        let before = ball.vel;
        assert_eq!(bounce_off_walls(&mut ball, &field()), Some(WallHit::Back));
        assert_eq!(ball.vel, before);
    }

    #[test]
    fn test_side_wall_reflects_and_clamps() {
        let mut ball = Ball::new(Vec2::new(-20.0, 300.0), Vec2::new(-1.0, -1.0), 400.0, 1);
        assert_eq!(bounce_off_walls(&mut ball, &field()), Some(WallHit::Side));
        assert!(ball.vel.x > 0.0);
        assert_eq!(ball.pos.x, ball.radius);
        assert!((ball.vel.length() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_top_wall_reflects() {
        let mut ball = Ball::new(Vec2::new(500.0, 3.0), Vec2::new(0.2, -1.0), 400.0, 1);
        assert_eq!(bounce_off_walls(&mut ball, &field()), Some(WallHit::Top));
        assert!(ball.vel.y > 0.0);
        assert_eq!(ball.pos.y, ball.radius);
    }

    proptest! {
        #[test]
        fn prop_reflection_preserves_speed(
            vx in -1000.0f32..1000.0,
            vy in -1000.0f32..1000.0,
            angle in -std::f32::consts::PI..std::f32::consts::PI,
        ) {
            let v = Vec2::new(vx, vy);
            let n = Vec2::new(angle.cos(), angle.sin());
            let r = reflect_velocity(v, n);
            prop_assert!((r.length() - v.length()).abs() <= 1e-3 * v.length().max(1.0));
        }

        #[test]
        fn prop_bat_bounce_always_exits_upward(
            t in 0.0f32..=1.0,
            vx in -500.0f32..500.0,
            vy in -500.0f32..500.0,
        ) {
            let bat = Bat::new(&field(), 600.0);
            let contact_x = bat.rect.left() + t * bat.rect.width;
            let mut ball = Ball::new(Vec2::new(contact_x, bat.rect.top()), Vec2::Y, 400.0, 1);
            ball.vel = Vec2::new(vx, vy);
            bounce_off_bat(&mut ball, &bat, contact_x, 60f32.to_radians());
            prop_assert!(ball.vel.y < 0.0);
        }
    }
}
