//! Collision detection for circles against axis-aligned rectangles
//!
//! The ball is the only circle in the game; bricks, the bat, shots and most
//! hazards are rectangles. Circle-vs-rect uses the nearest-point method with
//! a least-penetration fallback when the circle center is inside the box.

use glam::Vec2;

use super::shapes::{Circle, Rect};

/// Distances below this are treated as "center on the surface or inside"
const CONTACT_EPSILON: f32 = 1e-6;

/// Result of a collision check
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the rectangle surface (if hit)
    pub point: Vec2,
    /// Unit surface normal, pointing from the rectangle toward the circle
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a circle and a rectangle
///
/// Clamps the circle center onto the rectangle to find the nearest point; a
/// hit occurs when that point lies within the radius. When the center sits
/// inside the rectangle the offset is zero-length, so the normal comes from
/// the face with the least penetration instead.
pub fn circle_rect_collision(circle: &Circle, rect: &Rect) -> CollisionResult {
    let nearest = rect.clamp_point(circle.center);
    let offset = circle.center - nearest;
    let dist_sq = offset.length_squared();

    if dist_sq > circle.radius * circle.radius {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    if dist > CONTACT_EPSILON {
        return CollisionResult {
            hit: true,
            point: nearest,
            normal: offset / dist,
            penetration: circle.radius - dist,
        };
    }

    inside_collision(circle, rect)
}

/// Center-inside case: push out through the closest face
fn inside_collision(circle: &Circle, rect: &Rect) -> CollisionResult {
    let c = circle.center;
    // Order matters on ties: vertical faces first, since the ball mostly
    // travels vertically.
    let faces = [
        (c.y - rect.top(), Vec2::new(0.0, -1.0)),
        (rect.bottom() - c.y, Vec2::new(0.0, 1.0)),
        (c.x - rect.left(), Vec2::new(-1.0, 0.0)),
        (rect.right() - c.x, Vec2::new(1.0, 0.0)),
    ];

    let (depth, normal) = faces
        .iter()
        .copied()
        .fold((f32::MAX, Vec2::new(0.0, -1.0)), |best, face| {
            if face.0 < best.0 { face } else { best }
        });

    let depth = depth.max(0.0);
    CollisionResult {
        hit: true,
        point: c - normal * depth,
        normal,
        penetration: depth + circle.radius,
    }
}

/// Strict AABB overlap test for non-ball collisions (hazards vs bat, shots vs bricks)
#[inline]
pub fn rect_rect_collision(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}
