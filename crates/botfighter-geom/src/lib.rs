//! # BotFighter Geom
//!
//! Planar geometry primitives shared by every part of the BotFighter arena
//! simulation.
//!
//! The arena is a flat 2D plane in screen coordinates: `x` grows to the right,
//! `y` grows downward, and an angle of `0` points along `+x`. Positive angle
//! deltas therefore rotate clockwise on screen.
//!
//! - **[`Rect`]**: axis-aligned rectangles (walls, ship bounding boxes)
//! - **[`Segment`]**: finite line segments (line of sight, swept bullets)
//! - **[`Ray`]**: half-lines with exact slab intersection (laser sensor)
//! - **[`angle`]**: heading wrapping and signed bearings
//!
//! ## Quick Start
//!
//! ```
//! use botfighter_geom::{Ray, Rect};
//! use glam::Vec2;
//!
//! let wall = Rect::new(150.0, 90.0, 50.0, 20.0);
//! let ray = Ray::from_angle(Vec2::new(100.0, 100.0), 0.0);
//!
//! assert_eq!(ray.cast_rect(&wall), Some(50.0));
//! ```
//!
//! All queries are pure. Degenerate input (zero-length rays, empty
//! rectangles) is reported as "no intersection" instead of panicking.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod angle;
pub mod ray;
pub mod rect;
pub mod segment;

// Re-exports for convenience
pub use angle::{bearing_to, heading_vector, signed_angle, wrap_angle};
pub use ray::Ray;
pub use rect::Rect;
pub use segment::Segment;

use glam::Vec2;

/// Tolerance used when a direction component is treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Check whether two circles overlap.
///
/// Touching circles (distance exactly equal to the radius sum) do not overlap.
#[must_use]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Check whether a point lies strictly inside a circle.
#[must_use]
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) < radius * radius
}
