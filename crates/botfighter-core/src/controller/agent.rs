//! Sensor-driven autopilot for player ships.
//!
//! The agent sees the world only through [`scan`]: the forward laser and the
//! radar contact list. Each tick it picks the first rule that applies:
//!
//! 1. Escape manoeuvre while recovering from being stuck
//! 2. Wall close ahead: turn away, cutting thrust when very close
//! 3. Enemy visible: back off, circle or approach depending on range, firing
//!    when roughly lined up
//! 4. Coin visible: steer toward the nearest one
//! 5. Recently seen target: keep heading toward where it was
//! 6. Explore with seeded random turns

use std::sync::Arc;

use botfighter_geom::signed_angle;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::command::Command;
use crate::config::{SensorConfig, SimConfig};
use crate::entity::EntityId;
use crate::sensor::{scan, Detection};
use crate::snapshot::Snapshot;

use super::Controller;

const WALL_CLOSE: f32 = 50.0;
const WALL_CRITICAL: f32 = 20.0;
const CLOSE_COMBAT: f32 = 50.0;
const CIRCLE_RANGE: f32 = 100.0;
const SHOOT_RANGE: f32 = 300.0;

const STUCK_CHECK_TICKS: u64 = 60;
const STUCK_DISTANCE: f32 = 5.0;
const STUCK_LIMIT: u32 = 3;
const ESCAPE_TICKS: u64 = 30;
const MEMORY_TICKS: u64 = 120;
const EXPLORE_INTERVAL_TICKS: u64 = 180;

#[derive(Debug, Clone, Copy)]
struct Memory {
    /// Absolute direction toward the target when last seen
    direction: f32,
    seen_tick: u64,
}

#[derive(Debug, Clone, Default)]
struct StuckTracker {
    anchor: Option<(Vec2, u64)>,
    strikes: u32,
    escape_until: Option<u64>,
    attempts: u32,
}

/// Laser and radar driven controller.
#[derive(Debug, Clone)]
pub struct SensorAgent {
    sensors: SensorConfig,
    deadband: f32,
    fire_cooldown: u64,
    rng: ChaCha8Rng,
    memory: Option<Memory>,
    stuck: StuckTracker,
    escape_dir: i8,
    explore_rotation: i8,
    next_explore_change: u64,
    last_rotation: i8,
}

fn toward(bearing: f32, deadband: f32) -> i8 {
    if bearing.abs() <= deadband {
        0
    } else if bearing > 0.0 {
        1
    } else {
        -1
    }
}

impl SensorAgent {
    /// Creates an agent with its own seeded random source.
    #[must_use]
    pub fn new(config: &SimConfig, seed: u64) -> Self {
        Self {
            sensors: config.sensors.clone(),
            deadband: config.physics.player.turn_rate * config.dt() * 0.5,
            fire_cooldown: config.physics.fire_cooldown_ticks,
            rng: ChaCha8Rng::seed_from_u64(seed),
            memory: None,
            stuck: StuckTracker::default(),
            escape_dir: 1,
            explore_rotation: 0,
            next_explore_change: 0,
            last_rotation: 0,
        }
    }

    /// Whether the agent is currently running its escape manoeuvre.
    #[must_use]
    pub fn is_escaping(&self) -> bool {
        self.stuck.escape_until.is_some()
    }

    fn update_stuck(&mut self, ship: EntityId, position: Vec2, tick: u64) {
        if let Some(until) = self.stuck.escape_until {
            if tick >= until {
                self.stuck.escape_until = None;
            }
        }

        let Some((anchor, checked)) = self.stuck.anchor else {
            self.stuck.anchor = Some((position, tick));
            return;
        };
        if tick < checked + STUCK_CHECK_TICKS {
            return;
        }

        if position.distance(anchor) < STUCK_DISTANCE {
            self.stuck.strikes += 1;
        } else {
            self.stuck.strikes = 0;
        }
        self.stuck.anchor = Some((position, tick));

        if self.stuck.strikes >= STUCK_LIMIT {
            self.stuck.strikes = 0;
            self.stuck.attempts += 1;
            self.stuck.escape_until = Some(tick + ESCAPE_TICKS);
            self.escape_dir = -self.escape_dir;
            debug!(ship = %ship, attempt = self.stuck.attempts, "agent stuck, escaping");
        }
    }

    fn engage(&self, enemy: &Detection, can_fire: bool) -> Command {
        let bearing = enemy.bearing;
        let lined_up = |degrees: f32| can_fire && bearing.abs() < degrees.to_radians();

        if enemy.distance < CLOSE_COMBAT {
            // Too close: stop pushing in and keep shooting
            Command::new(false, toward(bearing, self.deadband), lined_up(15.0))
        } else if enemy.distance < CIRCLE_RANGE {
            let circle = if bearing > 0.0 { 1 } else { -1 };
            Command::new(true, circle, lined_up(10.0))
        } else {
            Command::new(
                bearing.abs() < 30f32.to_radians(),
                toward(bearing, self.deadband),
                lined_up(5.0) && enemy.distance < SHOOT_RANGE,
            )
        }
    }

    fn explore(&mut self, tick: u64) -> Command {
        if tick >= self.next_explore_change {
            self.explore_rotation = self.rng.gen_range(-1..=1);
            self.next_explore_change = tick + EXPLORE_INTERVAL_TICKS;
        }
        Command::new(true, self.explore_rotation, false)
    }
}

impl Controller for SensorAgent {
    fn name(&self) -> &str {
        "sensor_agent"
    }

    fn decide(&mut self, ship: EntityId, snapshot: &Arc<Snapshot>) -> Option<Command> {
        let me = snapshot.ship(ship).filter(|me| me.alive)?;
        let reading = scan(snapshot, ship, &self.sensors).ok()?;
        let tick = snapshot.tick;
        self.update_stuck(ship, me.position, tick);

        let command = if self.is_escaping() {
            // Alternate between turning in place and turning under thrust
            Command::new(self.stuck.attempts % 2 == 1, self.escape_dir, false)
        } else if reading.laser_hit && reading.laser < WALL_CLOSE {
            let direction = if self.last_rotation >= 0 { 1 } else { -1 };
            Command::new(reading.laser >= WALL_CRITICAL, direction, false)
        } else if let Some(enemy) = reading.nearest_ship(me.team.opponent()) {
            self.memory = Some(Memory {
                direction: me.heading + enemy.bearing,
                seen_tick: tick,
            });
            self.engage(enemy, me.can_fire(tick + 1, self.fire_cooldown))
        } else if let Some(coin) = reading.nearest_coin() {
            self.memory = Some(Memory {
                direction: me.heading + coin.bearing,
                seen_tick: tick,
            });
            Command::new(true, toward(coin.bearing, self.deadband), false)
        } else if let Some(memory) = self
            .memory
            .filter(|memory| tick.saturating_sub(memory.seen_tick) < MEMORY_TICKS)
        {
            let bearing = signed_angle(memory.direction - me.heading);
            Command::new(true, toward(bearing, self.deadband), false)
        } else {
            self.explore(tick)
        };

        self.last_rotation = command.rotation;
        Some(command)
    }
}
