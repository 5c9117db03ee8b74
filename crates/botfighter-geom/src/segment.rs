//! Finite line segments.
//!
//! Segments answer the line-of-sight question for the radar and the swept
//! bullet-vs-wall test. Rectangle tests use Liang–Barsky clipping, which is
//! exact and treats the rectangle as a closed set: a segment grazing a wall
//! edge is considered blocked.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Rect, EPSILON};

/// Line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint
    pub start: Vec2,
    /// Second endpoint
    pub end: Vec2,
}

impl Segment {
    /// Create a segment.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Vector from `start` to `end`.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.end - self.start
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.delta().length()
    }

    /// Point at parameter `t` (`0` is `start`, `1` is `end`).
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.start + self.delta() * t
    }

    /// Clip the segment against a rectangle.
    ///
    /// Returns the parameter interval `(t_enter, t_exit)` within `[0, 1]` of the
    /// part of the segment inside `rect`, or `None` if they do not meet.
    #[must_use]
    pub fn clip_rect(&self, rect: &Rect) -> Option<(f32, f32)> {
        if rect.is_empty() {
            return None;
        }

        let d = self.delta();
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        // (p, q) per boundary: the segment is inside where p * t <= q
        let boundaries = [
            (-d.x, self.start.x - rect.x),
            (d.x, rect.right() - self.start.x),
            (-d.y, self.start.y - rect.y),
            (d.y, rect.bottom() - self.start.y),
        ];

        for (p, q) in boundaries {
            if p.abs() <= EPSILON {
                // Parallel to this boundary
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t_exit {
                    return None;
                }
                t_enter = t_enter.max(r);
            } else {
                if r < t_enter {
                    return None;
                }
                t_exit = t_exit.min(r);
            }
        }

        Some((t_enter, t_exit))
    }

    /// Check if the segment touches a rectangle, edges included.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.clip_rect(rect).is_some()
    }

    /// Parameter of the first contact with a rectangle.
    #[must_use]
    pub fn first_contact(&self, rect: &Rect) -> Option<f32> {
        self.clip_rect(rect).map(|(t_enter, _)| t_enter)
    }

    /// Check if two segments intersect, collinear overlap included.
    #[must_use]
    pub fn intersects_segment(&self, other: &Segment) -> bool {
        let d1 = orientation(other.start, other.end, self.start);
        let d2 = orientation(other.start, other.end, self.end);
        let d3 = orientation(self.start, self.end, other.start);
        let d4 = orientation(self.start, self.end, other.end);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        (d1 == 0.0 && on_segment(other.start, other.end, self.start))
            || (d2 == 0.0 && on_segment(other.start, other.end, self.end))
            || (d3 == 0.0 && on_segment(self.start, self.end, other.start))
            || (d4 == 0.0 && on_segment(self.start, self.end, other.end))
    }
}

/// Cross product sign of `(b - a) x (c - a)`.
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Whether a point known to be collinear with `a..b` lies within its extent.
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
