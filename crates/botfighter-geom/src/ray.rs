//! Rays and exact ray-rectangle intersection.
//!
//! The laser sensor is a ray cast against every wall; the nearest hit within
//! range wins. Intersection uses the slab method, so results are analytic and
//! reproducible rather than sampled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::angle::heading_vector;
use crate::{Rect, EPSILON};

/// Half-line starting at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point
    pub origin: Vec2,
    /// Unit direction, or zero for a degenerate ray
    pub direction: Vec2,
}

impl Ray {
    /// Create a ray. The direction is normalized; a zero or non-finite
    /// direction yields a degenerate ray that never hits anything.
    #[must_use]
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Create a ray pointing along `angle` radians.
    #[must_use]
    pub fn from_angle(origin: Vec2, angle: f32) -> Self {
        Self::new(origin, heading_vector(angle))
    }

    /// Whether this ray has no usable direction.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec2::ZERO
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec2 {
        self.origin + self.direction * t
    }

    /// Distance to the first point of `rect` along the ray.
    ///
    /// Returns `Some(0.0)` when the origin is already inside the rectangle and
    /// `None` when the ray misses or is degenerate.
    #[must_use]
    pub fn cast_rect(&self, rect: &Rect) -> Option<f32> {
        if self.is_degenerate() || rect.is_empty() {
            return None;
        }

        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        let slabs = [
            (self.origin.x, self.direction.x, rect.x, rect.right()),
            (self.origin.y, self.direction.y, rect.y, rect.bottom()),
        ];

        for (origin, dir, lo, hi) in slabs {
            if dir.abs() <= EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let t1 = (lo - origin) / dir;
            let t2 = (hi - origin) / dir;
            let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Nearest hit among `rects` no further than `max_distance`.
    pub fn cast_nearest<'a, I>(&self, rects: I, max_distance: f32) -> Option<f32>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        rects
            .into_iter()
            .filter_map(|rect| self.cast_rect(rect))
            .filter(|t| *t <= max_distance)
            .min_by(f32::total_cmp)
    }
}
