//! Laser and radar queries over a published snapshot.
//!
//! Sensors are pure functions of a [`Snapshot`]: they never mutate anything
//! and return identical results no matter how often they are called. Both the
//! built-in controllers and external decision sources use them.
//!
//! - **Laser**: exact ray cast from the ship center along `heading + offset`,
//!   returning the distance to the nearest wall or the maximum range.
//! - **Radar**: every other living ship and every live coin within a radius
//!   whose connecting segment touches no wall. Occluded entities are omitted.
//!
//! # Example
//!
//! ```
//! use botfighter_core::config::{ArenaConfig, SimConfig};
//! use botfighter_core::entity::Team;
//! use botfighter_core::sensor::laser;
//! use botfighter_core::snapshot::Snapshot;
//! use botfighter_core::world::World;
//! use botfighter_geom::Rect;
//! use glam::Vec2;
//!
//! let mut config = SimConfig::default();
//! config.arena = ArenaConfig {
//!     width: 400.0,
//!     height: 400.0,
//!     walls: vec![Rect::new(150.0, 90.0, 50.0, 20.0)],
//! };
//! let mut world = World::new(&config);
//! let ship = world.spawn_ship(Team::Player, Vec2::new(100.0, 100.0), 0.0);
//! let snapshot = Snapshot::capture(&world, Vec::new());
//!
//! assert_eq!(laser(&snapshot, ship, 0.0, 600.0).unwrap(), 50.0);
//! ```

use std::cmp::Ordering;

use botfighter_geom::{bearing_to, Ray, Rect, Segment};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::SensorConfig;
use crate::entity::{EntityId, Ship, Team};
use crate::error::{SimError, SimResult};
use crate::snapshot::Snapshot;

/// What a radar contact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionKind {
    /// Another ship
    Ship {
        /// Detected ship
        id: EntityId,
        /// Its team
        team: Team,
    },
    /// A coin
    Coin {
        /// Detected coin
        id: EntityId,
    },
}

impl DetectionKind {
    /// ID of the detected entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        match *self {
            Self::Ship { id, .. } | Self::Coin { id } => id,
        }
    }

    /// Team of a detected ship; `None` for coins.
    #[must_use]
    pub fn team(&self) -> Option<Team> {
        match *self {
            Self::Ship { team, .. } => Some(team),
            Self::Coin { .. } => None,
        }
    }
}

/// One radar contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// What was detected
    pub kind: DetectionKind,
    /// Center to center distance
    pub distance: f32,
    /// Signed angle from the querying ship's heading, clockwise positive
    pub bearing: f32,
}

/// Laser and radar readings bundled for one ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Forward laser distance
    pub laser: f32,
    /// Whether the forward laser hit a wall within range
    pub laser_hit: bool,
    /// Radar contacts, nearest first
    pub detections: Vec<Detection>,
}

impl SensorReading {
    /// Nearest ship contact of the given team.
    #[must_use]
    pub fn nearest_ship(&self, team: Team) -> Option<&Detection> {
        self.detections
            .iter()
            .find(|d| d.kind.team() == Some(team))
    }

    /// Nearest coin contact.
    #[must_use]
    pub fn nearest_coin(&self) -> Option<&Detection> {
        self.detections
            .iter()
            .find(|d| matches!(d.kind, DetectionKind::Coin { .. }))
    }
}

fn querying_ship(snapshot: &Snapshot, id: EntityId) -> SimResult<&Ship> {
    let ship = snapshot.ship(id).ok_or(SimError::UnknownEntity(id))?;
    if !ship.alive {
        return Err(SimError::ShipDestroyed(id));
    }
    Ok(ship)
}

/// Distance along a ray to the nearest wall, capped at `max_range`.
///
/// A ray starting inside a wall reads 0.
#[must_use]
pub fn laser_from(origin: Vec2, angle: f32, walls: &[Rect], max_range: f32) -> f32 {
    Ray::from_angle(origin, angle)
        .cast_nearest(walls, max_range)
        .unwrap_or(max_range)
}

/// Whether the segment between two points touches no wall.
#[must_use]
pub fn line_of_sight(from: Vec2, to: Vec2, walls: &[Rect]) -> bool {
    let segment = Segment::new(from, to);
    !walls.iter().any(|wall| segment.intersects_rect(wall))
}

/// Cast a laser from `ship` along its heading plus `angle_offset`.
///
/// # Errors
///
/// [`SimError::UnknownEntity`] if the ship is not in the snapshot and
/// [`SimError::ShipDestroyed`] if it is no longer alive.
pub fn laser(snapshot: &Snapshot, ship: EntityId, angle_offset: f32, max_range: f32) -> SimResult<f32> {
    let ship = querying_ship(snapshot, ship)?;
    Ok(laser_from(
        ship.position,
        ship.heading + angle_offset,
        &snapshot.walls,
        max_range,
    ))
}

/// Every unobstructed ship and coin within `radius` of `ship`.
///
/// Contacts are sorted by distance, ties broken by ID.
///
/// # Errors
///
/// As [`laser`].
pub fn radar(snapshot: &Snapshot, ship: EntityId, radius: f32) -> SimResult<Vec<Detection>> {
    let me = querying_ship(snapshot, ship)?;
    let origin = me.position;
    let walls: &[Rect] = &snapshot.walls;

    let ships = snapshot
        .live_ships()
        .filter(|other| other.id != me.id)
        .map(|other| {
            let kind = DetectionKind::Ship {
                id: other.id,
                team: other.team,
            };
            (kind, other.position)
        });
    let coins = snapshot
        .coins
        .iter()
        .map(|coin| (DetectionKind::Coin { id: coin.id }, coin.position));

    let mut detections: Vec<Detection> = ships
        .chain(coins)
        .filter_map(|(kind, position)| {
            let distance = origin.distance(position);
            (distance <= radius && line_of_sight(origin, position, walls)).then(|| Detection {
                kind,
                distance,
                bearing: bearing_to(origin, me.heading, position),
            })
        })
        .collect();

    detections.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
        Ordering::Equal => a.kind.id().cmp(&b.kind.id()),
        other => other,
    });
    Ok(detections)
}

/// Forward laser plus radar, using the configured ranges.
///
/// # Errors
///
/// As [`laser`].
pub fn scan(snapshot: &Snapshot, ship: EntityId, config: &SensorConfig) -> SimResult<SensorReading> {
    let distance = laser(snapshot, ship, 0.0, config.laser_range)?;
    let detections = radar(snapshot, ship, config.radar_range)?;
    Ok(SensorReading {
        laser: distance,
        laser_hit: distance < config.laser_range,
        detections,
    })
}
