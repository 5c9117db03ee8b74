//! Static simulation configuration.
//!
//! A [`SimConfig`] fully determines a run together with the inputs fed to it:
//! arena layout, ship dynamics, sensor ranges, enemy behavior tuning, spawn
//! policy and the master seed. Every section is `#[serde(default)]`, so a
//! JSON file only needs to name the values it overrides.
//!
//! ```
//! use botfighter_core::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "seed": 7, "spawn": { "coin_count": 5 } }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.spawn.coin_count, 5);
//! assert_eq!(config.spawn.initial_enemies, 1);
//! ```

use std::f32::consts::PI;
use std::path::Path;

use botfighter_geom::Rect;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for [`SimConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but describes an impossible arena.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Arena dimensions and wall layout
    pub arena: ArenaConfig,
    /// Ship and bullet dynamics
    pub physics: PhysicsConfig,
    /// Sensor ranges
    pub sensors: SensorConfig,
    /// Enemy state machine tuning
    pub behavior: BehaviorConfig,
    /// Enemy and coin spawning
    pub spawn: SpawnConfig,
    /// Master seed for every random decision in the run
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            physics: PhysicsConfig::default(),
            sensors: SensorConfig::default(),
            behavior: BehaviorConfig::default(),
            spawn: SpawnConfig::default(),
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SimConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builder-style seed override.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.physics.dt()
    }

    /// Check the configuration for values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if !(arena.width > 0.0 && arena.height > 0.0) {
            return Err(invalid(format!(
                "arena must have positive size, got {}x{}",
                arena.width, arena.height
            )));
        }
        let bounds = arena.bounds();
        for (index, wall) in arena.walls.iter().enumerate() {
            if wall.is_empty() || !bounds.contains_rect(wall) {
                return Err(invalid(format!("wall {index} is empty or outside the arena")));
            }
        }

        let physics = &self.physics;
        if physics.tick_rate_hz == 0 {
            return Err(invalid("tick_rate_hz must be non-zero".into()));
        }
        if physics.ship_radius <= 0.0 || physics.bullet_hit_radius <= 0.0 {
            return Err(invalid("ship and bullet radii must be positive".into()));
        }
        for (name, dynamics) in [("player", &physics.player), ("enemy", &physics.enemy)] {
            if dynamics.max_speed <= 0.0 || !(0.0..=1.0).contains(&dynamics.drag_per_second) {
                return Err(invalid(format!(
                    "{name} dynamics need a positive max_speed and drag in [0, 1]"
                )));
            }
        }

        if self.sensors.laser_range <= 0.0 || self.sensors.radar_range <= 0.0 {
            return Err(invalid("sensor ranges must be positive".into()));
        }

        let spawn = &self.spawn;
        if spawn.margin * 2.0 >= arena.width.min(arena.height) {
            return Err(invalid(format!(
                "spawn margin {} leaves no room inside a {}x{} arena",
                spawn.margin, arena.width, arena.height
            )));
        }
        if spawn.fallback_positions.is_empty() {
            return Err(invalid("at least one fallback spawn position is required".into()));
        }
        let reach = Vec2::splat(physics.ship_radius.max(spawn.coin_radius));
        for (index, position) in spawn.fallback_positions.iter().enumerate() {
            let body = Rect::from_center(*position, reach);
            if arena.walls.iter().any(|wall| wall.intersects_rect(&body)) {
                return Err(invalid(format!(
                    "fallback spawn position {index} at ({}, {}) overlaps a wall",
                    position.x, position.y
                )));
            }
        }
        if spawn.max_enemies < spawn.initial_enemies {
            return Err(invalid(format!(
                "max_enemies {} is below initial_enemies {}",
                spawn.max_enemies, spawn.initial_enemies
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Arena bounds and static walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Arena width in pixels
    pub width: f32,
    /// Arena height in pixels
    pub height: f32,
    /// Static wall rectangles
    pub walls: Vec<Rect>,
}

impl ArenaConfig {
    /// Arena rectangle `[0, width] x [0, height]`.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// An arena of the given size with no walls.
    #[must_use]
    pub fn open(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            walls: Vec::new(),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 2000.0,
            height: 2000.0,
            walls: default_walls(),
        }
    }
}

/// The stock labyrinth: a boundary ring, inner corridors and three dead ends.
#[must_use]
pub fn default_walls() -> Vec<Rect> {
    vec![
        // Boundary ring
        Rect::new(50.0, 50.0, 1900.0, 20.0),
        Rect::new(50.0, 50.0, 20.0, 1900.0),
        Rect::new(50.0, 1930.0, 1900.0, 20.0),
        Rect::new(1930.0, 50.0, 20.0, 1900.0),
        // Corridors
        Rect::new(200.0, 200.0, 20.0, 400.0),
        Rect::new(200.0, 600.0, 400.0, 20.0),
        Rect::new(600.0, 200.0, 20.0, 400.0),
        Rect::new(600.0, 600.0, 400.0, 20.0),
        Rect::new(1000.0, 200.0, 20.0, 800.0),
        Rect::new(200.0, 1000.0, 800.0, 20.0),
        Rect::new(1200.0, 200.0, 20.0, 800.0),
        Rect::new(1200.0, 1000.0, 400.0, 20.0),
        Rect::new(1600.0, 200.0, 20.0, 800.0),
        Rect::new(200.0, 1400.0, 400.0, 20.0),
        Rect::new(600.0, 1400.0, 20.0, 400.0),
        Rect::new(600.0, 1800.0, 400.0, 20.0),
        Rect::new(1000.0, 1400.0, 20.0, 400.0),
        Rect::new(1200.0, 1400.0, 400.0, 20.0),
        Rect::new(1600.0, 1400.0, 20.0, 400.0),
        // Dead ends
        Rect::new(300.0, 300.0, 100.0, 20.0),
        Rect::new(1500.0, 1500.0, 100.0, 20.0),
        Rect::new(800.0, 800.0, 20.0, 100.0),
    ]
}

/// Per-team ship handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipDynamics {
    /// Acceleration along the heading while thrusting (px/s²)
    pub thrust_accel: f32,
    /// Rotation speed at full rotation input (rad/s)
    pub turn_rate: f32,
    /// Fraction of velocity retained after one second without thrust
    pub drag_per_second: f32,
    /// Speed cap (px/s)
    pub max_speed: f32,
}

impl ShipDynamics {
    /// Player handling: fast and agile.
    #[must_use]
    pub fn player() -> Self {
        Self {
            thrust_accel: 600.0,
            turn_rate: PI * 1.25,
            drag_per_second: 0.55,
            max_speed: 480.0,
        }
    }

    /// Enemy handling: slower top speed and turning.
    #[must_use]
    pub fn enemy() -> Self {
        Self {
            thrust_accel: 360.0,
            turn_rate: PI * 0.75,
            drag_per_second: 0.55,
            max_speed: 180.0,
        }
    }
}

/// Ship, weapon and bullet physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed simulation rate
    pub tick_rate_hz: u32,
    /// Player team handling
    pub player: ShipDynamics,
    /// Enemy team handling
    pub enemy: ShipDynamics,
    /// Ship bounding radius; the wall hitbox is the square of this half size
    pub ship_radius: f32,
    /// Minimum ticks between two shots of the same ship
    pub fire_cooldown_ticks: u64,
    /// Bullet speed (px/s)
    pub bullet_speed: f32,
    /// Bullet lifetime in ticks
    pub bullet_lifetime_ticks: u32,
    /// Distance ahead of the ship center where bullets appear
    pub muzzle_offset: f32,
    /// Bullet to ship-center distance that counts as a hit
    pub bullet_hit_radius: f32,
    /// Whether enemy bullets damage other enemies
    pub friendly_fire: bool,
}

impl PhysicsConfig {
    /// Fixed timestep in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// Dynamics for the given team.
    #[must_use]
    pub fn dynamics(&self, team: crate::entity::Team) -> &ShipDynamics {
        match team {
            crate::entity::Team::Player => &self.player,
            crate::entity::Team::Enemy => &self.enemy,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            player: ShipDynamics::player(),
            enemy: ShipDynamics::enemy(),
            ship_radius: 10.0,
            fire_cooldown_ticks: 10,
            bullet_speed: 900.0,
            bullet_lifetime_ticks: 60,
            muzzle_offset: 20.0,
            bullet_hit_radius: 15.0,
            friendly_fire: true,
        }
    }
}

/// Sensor ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Maximum laser distance, returned when nothing is hit
    pub laser_range: f32,
    /// Radar detection radius
    pub radar_range: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            laser_range: 600.0,
            radar_range: 800.0,
        }
    }
}

/// Enemy state machine thresholds and timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Front laser distance that triggers avoidance
    pub near_wall_distance: f32,
    /// Avoidance ends once the front laser reads this multiple of the threshold
    pub clear_factor: f32,
    /// Avoidance that lasts this long turns into a full about-face
    pub avoidance_max_ticks: u32,
    /// Radar radius used to look for targets
    pub combat_radius: f32,
    /// Half-angle of the cone in which a target is acquired (rad)
    pub acquire_half_angle: f32,
    /// Bearing below which the ship stops correcting its aim (rad)
    pub aim_deadband: f32,
    /// Bearing tolerance for firing (rad)
    pub fire_tolerance: f32,
    /// Ticks without a radar contact before a target is dropped
    pub lose_target_ticks: u32,
    /// Distance combat tries to close to before holding
    pub preferred_range: f32,
    /// Length of each closing or circling phase in combat
    pub strafe_period_ticks: u32,
    /// Heading offset from the target while circling (rad)
    pub strafe_angle: f32,
    /// Minimum forward patrol before a course change is considered
    pub patrol_forward_ticks: u32,
    /// Per-tick chance of starting a course change once eligible
    pub patrol_turn_chance: f64,
    /// Course change range (rad)
    pub patrol_turn_min: f32,
    /// Course change range (rad)
    pub patrol_turn_max: f32,
    /// Turning that takes longer than this is abandoned
    pub patrol_turn_max_ticks: u32,
    /// Ticks between small random course jitters while patrolling
    pub jitter_interval_ticks: u32,
    /// Largest random jitter (rad)
    pub jitter_max: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            near_wall_distance: 80.0,
            clear_factor: 1.5,
            avoidance_max_ticks: 90,
            combat_radius: 500.0,
            acquire_half_angle: PI / 3.0,
            aim_deadband: 0.03,
            fire_tolerance: 0.1,
            lose_target_ticks: 90,
            preferred_range: 220.0,
            strafe_period_ticks: 45,
            strafe_angle: PI / 4.0,
            patrol_forward_ticks: 180,
            patrol_turn_chance: 0.01,
            patrol_turn_min: 70f32.to_radians(),
            patrol_turn_max: 110f32.to_radians(),
            patrol_turn_max_ticks: 120,
            jitter_interval_ticks: 60,
            jitter_max: 0.2,
        }
    }
}

/// Spawning policy for ships and coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Player ships created at start and on restart
    pub player_ships: u32,
    /// Enemy ships created at start and on restart
    pub initial_enemies: u32,
    /// Enemies spawned per enemy destroyed
    pub enemies_per_kill: u32,
    /// Ceiling on live enemies
    pub max_enemies: u32,
    /// Coins kept in the arena
    pub coin_count: u32,
    /// Coin pickup radius
    pub coin_radius: f32,
    /// Distance from the arena edge that random spawns keep
    pub margin: f32,
    /// Minimum distance between a new spawn and any existing ship or coin
    pub clearance: f32,
    /// Random placement attempts before falling back
    pub max_attempts: u32,
    /// Safe positions used when random placement fails
    pub fallback_positions: Vec<Vec2>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            player_ships: 1,
            initial_enemies: 1,
            enemies_per_kill: 2,
            max_enemies: 24,
            coin_count: 20,
            coin_radius: 10.0,
            margin: 100.0,
            clearance: 40.0,
            max_attempts: 100,
            fallback_positions: vec![
                Vec2::new(400.0, 400.0),
                Vec2::new(1700.0, 1700.0),
                Vec2::new(400.0, 1600.0),
                Vec2::new(1700.0, 400.0),
            ],
        }
    }
}
