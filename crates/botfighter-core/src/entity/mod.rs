//! Entity types for the arena.
//!
//! This module provides the identifiers and classification shared by every
//! simulated object:
//! - [`EntityId`]: Unique identifier, allocated monotonically per world
//! - [`EntityKind`]: What an identifier refers to
//! - [`Team`]: Allegiance of a ship
//!
//! Concrete state lives in [`components`]: [`Ship`], [`Bullet`] and [`Coin`].
//! Walls are plain [`botfighter_geom::Rect`]s owned by the arena and never get
//! an identifier.
//!
//! # Example
//!
//! ```
//! use botfighter_core::entity::{EntityId, Ship, Team};
//! use glam::Vec2;
//!
//! let ship = Ship::new(EntityId::new(1), Team::Player, Vec2::new(100.0, 100.0), 0.0);
//!
//! assert_eq!(ship.id.as_u64(), 1);
//! assert_eq!(ship.health, 100);
//! assert!(ship.alive);
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{Bullet, Coin, Ship, BULLET_DAMAGE, COIN_VALUE, MAX_HEALTH};

/// Unique identifier for an entity.
///
/// Identifiers are allocated from a single counter per world, so ships,
/// bullets and coins never share one. Ordering by identifier is the canonical
/// iteration order everywhere in the simulation.
///
/// ```
/// use botfighter_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// What kind of object an [`EntityId`] refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A controllable ship
    Ship,
    /// An in-flight projectile
    Bullet,
    /// A collectible pickup
    Coin,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ship => write!(f, "Ship"),
            Self::Bullet => write!(f, "Bullet"),
            Self::Coin => write!(f, "Coin"),
        }
    }
}

/// Ship allegiance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Human or agent controlled side; collects coins and scores
    Player,
    /// Built-in opponents
    Enemy,
}

impl Team {
    /// The other side.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}
