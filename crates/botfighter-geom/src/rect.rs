//! Axis-aligned rectangles.
//!
//! A [`Rect`] is stored as its top-left corner plus extents, matching the
//! `(x, y, width, height)` layout walls are described with. Rectangles are
//! treated as closed sets for containment and segment tests, and as open sets
//! for rectangle-rectangle overlap, so two rectangles that merely share an
//! edge do not collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Extent along `+x`
    pub width: f32,
    /// Extent along `+y`
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle centered on `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let min = center - half_extents;
        Self::new(min.x, min.y, half_extents.x * 2.0, half_extents.y * 2.0)
    }

    /// Create a rectangle spanning two corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Top-left corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Extents as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// A rectangle with no area never intersects anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle, edges included.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Check if a point is strictly inside the rectangle, edges excluded.
    #[must_use]
    pub fn contains_point_strict(&self, point: Vec2) -> bool {
        point.x > self.x && point.x < self.right() && point.y > self.y && point.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if two rectangles share interior area.
    #[must_use]
    pub fn intersects_rect(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Minimal translation that moves `self` out of `other`.
    ///
    /// Returns `None` when the rectangles do not overlap. Otherwise the vector
    /// points along the axis of least penetration, away from `other`'s center.
    #[must_use]
    pub fn penetration(&self, other: &Rect) -> Option<Vec2> {
        if !self.intersects_rect(other) {
            return None;
        }

        let overlap_x = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_y = self.bottom().min(other.bottom()) - self.y.max(other.y);
        let delta = self.center() - other.center();

        if overlap_x < overlap_y {
            let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(overlap_x * sign, 0.0))
        } else {
            let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(0.0, overlap_y * sign))
        }
    }

    /// Closest point of the rectangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    /// Check if a circle overlaps this rectangle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        center.distance_squared(self.closest_point(center)) < radius * radius
    }

    /// Grow the rectangle by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Clamp a point into the rectangle.
    #[must_use]
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        self.closest_point(point)
    }
}
