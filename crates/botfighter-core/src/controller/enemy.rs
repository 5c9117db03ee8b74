//! Built-in enemy state machine.
//!
//! ```text
//!                 front laser < near_wall
//!   ┌──────────────────────────────────────────────┐
//!   │                                              ▼
//! PatrolForward ◄──── turn done ──── PatrolTurning   Avoidance
//!   │  ▲  │                              ▲   ▲          │
//!   │  │  └── interval + chance ─────────┘   └─ too long ┤
//!   │  └──────────────── clearance restored ─────────────┘
//!   │
//!   └── opponent in cone ──► Combat ── lost for grace period ──► PatrolForward
//! ```
//!
//! Avoidance pre-empts every other state except the about-face it triggers
//! itself. Combat is only entered from patrol. All randomness comes from the
//! brain's own seeded generator, so a brain replays identically from the same
//! seed and the same snapshots.

use std::f32::consts::{FRAC_PI_4, PI};
use std::sync::Arc;

use botfighter_geom::signed_angle;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::command::Command;
use crate::config::{BehaviorConfig, SimConfig};
use crate::entity::{EntityId, Ship};
use crate::sensor::{laser, radar};
use crate::snapshot::Snapshot;

use super::Controller;

/// Current mode of an [`EnemyBrain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyState {
    /// Cruise ahead with small random course jitter
    PatrolForward,
    /// Turn in place or while cruising until `remaining` radians are used up
    PatrolTurning {
        /// Signed angle still to turn
        remaining: f32,
        /// About-face out of a dead end; not interrupted by avoidance
        escape: bool,
    },
    /// Steer away from the wall ahead
    Avoidance,
    /// Track, fire at and circle a target
    Combat {
        /// Tracked ship
        target: EntityId,
        /// Tick of the last radar contact
        last_seen: u64,
    },
}

/// Patrol, avoidance and combat controller for enemy ships.
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    behavior: BehaviorConfig,
    laser_range: f32,
    turn_step: f32,
    fire_cooldown: u64,
    rng: ChaCha8Rng,
    state: EnemyState,
    state_ticks: u32,
    turn_bias: f32,
    duty: f32,
    jitter: f32,
    strafe_dir: f32,
}

fn steer(error: f32, deadband: f32) -> i8 {
    if error.abs() <= deadband {
        0
    } else if error > 0.0 {
        1
    } else {
        -1
    }
}

impl EnemyBrain {
    /// Creates a brain in [`EnemyState::PatrolForward`].
    #[must_use]
    pub fn new(config: &SimConfig, seed: u64) -> Self {
        Self {
            behavior: config.behavior.clone(),
            laser_range: config.sensors.laser_range,
            turn_step: config.physics.enemy.turn_rate * config.dt(),
            fire_cooldown: config.physics.fire_cooldown_ticks,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: EnemyState::PatrolForward,
            state_ticks: 0,
            turn_bias: 1.0,
            duty: 0.0,
            jitter: 0.0,
            strafe_dir: 1.0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.state
    }

    fn transition(&mut self, ship: EntityId, next: EnemyState) {
        debug!(ship = %ship, from = ?self.state, to = ?next, "enemy state change");
        self.state = next;
        self.state_ticks = 0;
    }

    fn avoid(&mut self, snapshot: &Snapshot, ship: EntityId, front: f32) -> Command {
        if self.state_ticks > self.behavior.avoidance_max_ticks {
            let remaining = PI * self.turn_bias;
            self.transition(
                ship,
                EnemyState::PatrolTurning {
                    remaining,
                    escape: true,
                },
            );
            return self.turn(ship, remaining, true);
        }

        let left = laser(snapshot, ship, -FRAC_PI_4, self.laser_range).unwrap_or(0.0);
        let right = laser(snapshot, ship, FRAC_PI_4, self.laser_range).unwrap_or(0.0);
        let direction = if right > left {
            1
        } else if left > right {
            -1
        } else {
            steer(self.turn_bias, 0.0)
        };

        // Turn on a duty cycle that approaches every tick as the wall closes in
        let near = self.behavior.near_wall_distance;
        let proximity = (1.0 - front / near).clamp(0.0, 1.0);
        self.duty += 0.5 + 0.5 * proximity;
        let rotation = if self.duty >= 1.0 {
            self.duty -= 1.0;
            direction
        } else {
            0
        };
        Command::new(front > near * 0.5, rotation, false)
    }

    fn turn(&mut self, ship: EntityId, remaining: f32, escape: bool) -> Command {
        let timed_out = self.state_ticks > self.behavior.patrol_turn_max_ticks;
        if remaining.abs() <= self.turn_step * 0.5 || timed_out {
            self.transition(ship, EnemyState::PatrolForward);
            return Command::new(!escape, 0, false);
        }
        let direction = remaining.signum();
        self.state = EnemyState::PatrolTurning {
            remaining: remaining - direction * self.turn_step,
            escape,
        };
        Command::new(!escape, steer(direction, 0.0), false)
    }

    fn patrol(&mut self, ship: EntityId) -> Command {
        let eligible = self.state_ticks >= self.behavior.patrol_forward_ticks;
        let chance = self.behavior.patrol_turn_chance.clamp(0.0, 1.0);
        if eligible && self.rng.gen_bool(chance) {
            let (low, high) = (self.behavior.patrol_turn_min, self.behavior.patrol_turn_max);
            let magnitude = if high > low {
                self.rng.gen_range(low..=high)
            } else {
                low
            };
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let remaining = magnitude * sign;
            self.transition(
                ship,
                EnemyState::PatrolTurning {
                    remaining,
                    escape: false,
                },
            );
            return self.turn(ship, remaining, false);
        }

        let interval = self.behavior.jitter_interval_ticks;
        if interval > 0 && self.state_ticks % interval == 0 {
            let max = self.behavior.jitter_max.abs();
            self.jitter = self.rng.gen_range(-max..=max);
        }
        let rotation = if self.jitter.abs() >= self.turn_step * 0.5 {
            let direction = self.jitter.signum();
            self.jitter -= direction * self.turn_step;
            steer(direction, 0.0)
        } else {
            0
        };
        Command::new(true, rotation, false)
    }

    fn acquire(&self, snapshot: &Snapshot, me: &Ship) -> Option<EntityId> {
        let opponent = me.team.opponent();
        radar(snapshot, me.id, self.behavior.combat_radius)
            .ok()?
            .into_iter()
            .find(|contact| {
                contact.kind.team() == Some(opponent)
                    && contact.bearing.abs() <= self.behavior.acquire_half_angle
            })
            .map(|contact| contact.kind.id())
    }

    fn combat(&mut self, snapshot: &Snapshot, me: &Ship, target: EntityId, last_seen: u64) -> Command {
        let target_alive = snapshot.ship(target).is_some_and(|ship| ship.alive);
        let contact = if target_alive {
            radar(snapshot, me.id, self.behavior.combat_radius)
                .ok()
                .and_then(|contacts| contacts.into_iter().find(|c| c.kind.id() == target))
        } else {
            None
        };

        let Some(contact) = contact else {
            let grace = u64::from(self.behavior.lose_target_ticks);
            if !target_alive || snapshot.tick.saturating_sub(last_seen) > grace {
                self.transition(me.id, EnemyState::PatrolForward);
            }
            return Command::new(true, 0, false);
        };

        self.state = EnemyState::Combat {
            target,
            last_seen: snapshot.tick,
        };

        // Alternate between closing in and circling
        let period = self.behavior.strafe_period_ticks.max(1);
        let closing = (self.state_ticks / period) % 2 == 0;
        let error = if closing {
            contact.bearing
        } else {
            signed_angle(contact.bearing - self.strafe_dir * self.behavior.strafe_angle)
        };

        let thrust = !closing || contact.distance > self.behavior.preferred_range;
        let fire = contact.bearing.abs() <= self.behavior.fire_tolerance
            && me.can_fire(snapshot.tick + 1, self.fire_cooldown);
        Command::new(thrust, steer(error, self.behavior.aim_deadband), fire)
    }
}

impl Controller for EnemyBrain {
    fn name(&self) -> &str {
        "enemy_brain"
    }

    fn decide(&mut self, ship: EntityId, snapshot: &Arc<Snapshot>) -> Option<Command> {
        let me = snapshot.ship(ship).filter(|me| me.alive)?;
        let front = laser(snapshot, ship, 0.0, self.laser_range).ok()?;
        self.state_ticks = self.state_ticks.saturating_add(1);

        let escaping = matches!(self.state, EnemyState::PatrolTurning { escape: true, .. });
        if front < self.behavior.near_wall_distance && !escaping {
            if self.state != EnemyState::Avoidance {
                self.transition(ship, EnemyState::Avoidance);
                self.duty = 1.0;
            }
            return Some(self.avoid(snapshot, ship, front));
        }

        if self.state == EnemyState::Avoidance {
            if front >= self.behavior.near_wall_distance * self.behavior.clear_factor {
                self.turn_bias = -self.turn_bias;
                self.transition(ship, EnemyState::PatrolForward);
            } else {
                return Some(self.avoid(snapshot, ship, front));
            }
        }

        if matches!(
            self.state,
            EnemyState::PatrolForward | EnemyState::PatrolTurning { escape: false, .. }
        ) {
            if let Some(target) = self.acquire(snapshot, me) {
                self.strafe_dir = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                self.transition(
                    ship,
                    EnemyState::Combat {
                        target,
                        last_seen: snapshot.tick,
                    },
                );
            }
        }

        let command = match self.state {
            EnemyState::Combat { target, last_seen } => self.combat(snapshot, me, target, last_seen),
            EnemyState::PatrolTurning { remaining, escape } => self.turn(ship, remaining, escape),
            EnemyState::PatrolForward | EnemyState::Avoidance => self.patrol(ship),
        };
        Some(command)
    }
}
