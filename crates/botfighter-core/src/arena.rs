//! The static playing field.
//!
//! An [`Arena`] is the rectangle `[0, W] x [0, H]` plus its walls. It is built
//! once from [`ArenaConfig`] and never changes afterwards; the wall list is
//! shared by reference with every published snapshot.
//!
//! # Example
//!
//! ```
//! use botfighter_core::arena::Arena;
//! use botfighter_core::config::ArenaConfig;
//! use botfighter_geom::Rect;
//! use glam::Vec2;
//!
//! let arena = Arena::new(&ArenaConfig {
//!     width: 400.0,
//!     height: 400.0,
//!     walls: vec![Rect::new(100.0, 0.0, 20.0, 200.0)],
//! });
//!
//! assert!(arena.contains(Vec2::new(10.0, 10.0)));
//! assert!(!arena.line_of_sight(Vec2::new(50.0, 50.0), Vec2::new(200.0, 50.0)));
//! ```

use std::sync::Arc;

use botfighter_geom::Rect;
use glam::Vec2;

use crate::config::ArenaConfig;

/// Arena bounds and walls.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    bounds: Rect,
    walls: Arc<[Rect]>,
}

impl Arena {
    /// Build the arena described by `config`.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            bounds: config.bounds(),
            walls: config.walls.iter().copied().collect(),
        }
    }

    /// Arena rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Wall rectangles.
    #[must_use]
    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Shared handle to the wall list.
    #[must_use]
    pub fn walls_shared(&self) -> Arc<[Rect]> {
        Arc::clone(&self.walls)
    }

    /// Whether a point lies inside the arena, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.bounds.contains_point(point)
    }

    /// Clamp a position into the arena, zeroing velocity that points outward
    /// on each clamped axis.
    #[must_use]
    pub fn clamp(&self, position: Vec2, velocity: Vec2) -> (Vec2, Vec2) {
        let clamped = self.bounds.clamp_point(position);
        let mut velocity = velocity;
        if clamped.x < position.x && velocity.x > 0.0 || clamped.x > position.x && velocity.x < 0.0
        {
            velocity.x = 0.0;
        }
        if clamped.y < position.y && velocity.y > 0.0 || clamped.y > position.y && velocity.y < 0.0
        {
            velocity.y = 0.0;
        }
        (clamped, velocity)
    }

    /// Whether a rectangle overlaps any wall.
    #[must_use]
    pub fn rect_blocked(&self, rect: &Rect) -> bool {
        self.walls.iter().any(|wall| wall.intersects_rect(rect))
    }

    /// Whether a circle overlaps any wall.
    #[must_use]
    pub fn circle_blocked(&self, center: Vec2, radius: f32) -> bool {
        self.walls
            .iter()
            .any(|wall| wall.intersects_circle(center, radius))
    }

    /// Whether the straight segment between two points touches no wall.
    #[must_use]
    pub fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        crate::sensor::line_of_sight(from, to, &self.walls)
    }
}
