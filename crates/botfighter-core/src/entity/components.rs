//! Per-entity state.
//!
//! Each entity kind is a plain struct with public fields. Mutation happens
//! only inside the tick loop; outside it these values are read from a
//! [`Snapshot`](crate::snapshot::Snapshot).

use botfighter_geom::{heading_vector, wrap_angle, Rect};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{EntityId, Team};

/// Full ship health.
pub const MAX_HEALTH: u32 = 100;

/// Damage dealt by every bullet.
pub const BULLET_DAMAGE: u32 = 10;

/// Score value of a coin.
pub const COIN_VALUE: u32 = 1;

// =============================================================================
// Ship
// =============================================================================

/// A controllable ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Identifier
    pub id: EntityId,
    /// Allegiance
    pub team: Team,
    /// Center position
    pub position: Vec2,
    /// Position at the start of the current tick
    pub previous_position: Vec2,
    /// Velocity (px/s)
    pub velocity: Vec2,
    /// Nose direction in `[0, 2π)`
    pub heading: f32,
    /// Rotation applied during the last tick (rad/s)
    pub angular_velocity: f32,
    /// Remaining health in `[0, MAX_HEALTH]`
    pub health: u32,
    /// False once health reaches zero
    pub alive: bool,
    /// Tick of the most recent shot
    pub last_fire_tick: Option<u64>,
    /// Tick in which the ship was destroyed
    pub destroyed_tick: Option<u64>,
}

impl Ship {
    /// Create a full-health ship at rest.
    #[must_use]
    pub fn new(id: EntityId, team: Team, position: Vec2, heading: f32) -> Self {
        Self {
            id,
            team,
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            heading: wrap_angle(heading),
            angular_velocity: 0.0,
            health: MAX_HEALTH,
            alive: true,
            last_fire_tick: None,
            destroyed_tick: None,
        }
    }

    /// Unit vector along the heading.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        heading_vector(self.heading)
    }

    /// Square hitbox used against walls.
    #[must_use]
    pub fn bounding_box(&self, radius: f32) -> Rect {
        Rect::from_center(self.position, Vec2::splat(radius))
    }

    /// Whether the weapon is ready at `tick`.
    #[must_use]
    pub fn can_fire(&self, tick: u64, cooldown_ticks: u64) -> bool {
        self.alive
            && self
                .last_fire_tick
                .map_or(true, |last| tick.saturating_sub(last) >= cooldown_ticks)
    }

    /// Subtract `amount` health, saturating at zero.
    ///
    /// Returns `true` if this hit destroyed the ship.
    pub fn apply_damage(&mut self, amount: u32, tick: u64) -> bool {
        if !self.alive {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
            self.destroyed_tick = Some(tick);
            self.velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            return true;
        }
        false
    }
}

// =============================================================================
// Bullet
// =============================================================================

/// An in-flight projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Identifier
    pub id: EntityId,
    /// Ship that fired it; may have since been destroyed
    pub owner_id: EntityId,
    /// Team of the owner at firing time
    pub owner_team: Team,
    /// Current position
    pub position: Vec2,
    /// Position at the start of the current tick, for swept wall tests
    pub previous_position: Vec2,
    /// Constant velocity (px/s)
    pub velocity: Vec2,
    /// Damage on hit, always [`BULLET_DAMAGE`]
    pub damage: u32,
    /// Ticks left before the bullet expires
    pub ticks_remaining: u32,
    /// False once consumed or expired
    pub alive: bool,
}

impl Bullet {
    /// Create a bullet fired by `owner` from `origin` to `position`.
    #[must_use]
    pub fn new(
        id: EntityId,
        owner: &Ship,
        origin: Vec2,
        position: Vec2,
        velocity: Vec2,
        lifetime_ticks: u32,
    ) -> Self {
        Self {
            id,
            owner_id: owner.id,
            owner_team: owner.team,
            position,
            previous_position: origin,
            velocity,
            damage: BULLET_DAMAGE,
            ticks_remaining: lifetime_ticks,
            alive: lifetime_ticks > 0,
        }
    }
}

// =============================================================================
// Coin
// =============================================================================

/// A collectible pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Identifier
    pub id: EntityId,
    /// Center position
    pub position: Vec2,
    /// Score awarded on pickup
    pub value: u32,
    /// False once collected
    pub alive: bool,
}

impl Coin {
    /// Create a coin worth [`COIN_VALUE`].
    #[must_use]
    pub fn new(id: EntityId, position: Vec2) -> Self {
        Self {
            id,
            position,
            value: COIN_VALUE,
            alive: true,
        }
    }
}
