//! Physics integration for ships and bullets.
//!
//! Per tick, in order:
//! 1. Existing bullets move in a straight line and age by one tick
//! 2. Each living ship, in ID order, fires if asked and ready, then integrates
//!    rotation, thrust or drag, the speed cap and position
//!
//! Bullets fired this tick appear at the muzzle and start moving next tick.
//!
//! # Fixed Timestep
//!
//! `dt` comes from the configured tick rate (1/60 s by default), never from
//! wall-clock time.

use botfighter_geom::wrap_angle;
use tracing::trace;

use crate::arena::Arena;
use crate::command::Command;
use crate::config::{PhysicsConfig, ShipDynamics};
use crate::entity::{Bullet, EntityId, Ship};
use crate::snapshot::GameEvent;
use crate::world::World;

use super::{Resolver, TickContext};

/// Integrate one ship for one tick.
///
/// Rotation is applied first, then thrust along the new heading (or drag when
/// not thrusting), then the speed cap, then `position += velocity * dt`.
/// The result is clamped to the arena with outward velocity zeroed.
pub fn integrate_ship(
    ship: &mut Ship,
    command: Command,
    dynamics: &ShipDynamics,
    dt: f32,
    arena: &Arena,
) {
    let command = command.sanitized();
    ship.previous_position = ship.position;

    ship.angular_velocity = f32::from(command.rotation) * dynamics.turn_rate;
    ship.heading = wrap_angle(ship.heading + ship.angular_velocity * dt);

    if command.thrust {
        ship.velocity += ship.forward() * dynamics.thrust_accel * dt;
    } else {
        ship.velocity *= dynamics.drag_per_second.powf(dt);
    }
    ship.velocity = ship.velocity.clamp_length_max(dynamics.max_speed);

    let (position, velocity) = arena.clamp(ship.position + ship.velocity * dt, ship.velocity);
    ship.position = position;
    ship.velocity = velocity;
}

/// Move a bullet for one tick and expire it if its lifetime ran out or it
/// left the arena.
pub fn integrate_bullet(bullet: &mut Bullet, dt: f32, arena: &Arena) {
    if !bullet.alive {
        return;
    }
    bullet.previous_position = bullet.position;
    bullet.position += bullet.velocity * dt;
    bullet.ticks_remaining = bullet.ticks_remaining.saturating_sub(1);
    if bullet.ticks_remaining == 0 || !arena.contains(bullet.position) {
        bullet.alive = false;
    }
}

/// Resolver for motion and firing.
#[derive(Debug, Clone)]
pub struct PhysicsResolver {
    physics: PhysicsConfig,
    dt: f32,
}

impl PhysicsResolver {
    /// Creates a physics resolver using the configured tick rate.
    #[must_use]
    pub fn new(physics: PhysicsConfig) -> Self {
        let dt = physics.dt();
        Self { physics, dt }
    }

    /// Returns the timestep used for integration.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Fire from `ship` if its weapon is ready.
    fn try_fire(
        &self,
        world: &mut World,
        ship_id: EntityId,
        tick: u64,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(ship) = world.ship(ship_id) else {
            return;
        };
        if !ship.can_fire(tick, self.physics.fire_cooldown_ticks) {
            return;
        }

        let origin = ship.position;
        let forward = ship.forward();
        let muzzle = origin + forward * self.physics.muzzle_offset;
        let velocity = forward * self.physics.bullet_speed;

        if let Ok(bullet) = world.spawn_bullet(
            ship_id,
            origin,
            muzzle,
            velocity,
            self.physics.bullet_lifetime_ticks,
        ) {
            if let Some(ship) = world.ship_mut(ship_id) {
                ship.last_fire_tick = Some(tick);
            }
            trace!(ship = %ship_id, bullet = %bullet, "shot fired");
            events.push(GameEvent::ShotFired {
                ship: ship_id,
                bullet,
            });
        }
    }
}

impl Resolver for PhysicsResolver {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn resolve(&self, ctx: &TickContext<'_>, world: &mut World, events: &mut Vec<GameEvent>) {
        let arena = world.arena().clone();

        for bullet in world.bullets_mut() {
            integrate_bullet(bullet, self.dt, &arena);
        }

        let ship_ids: Vec<EntityId> = world
            .ships()
            .filter(|ship| ship.alive)
            .map(|ship| ship.id)
            .collect();

        for id in ship_ids {
            let command = ctx.commands.command_for(id);
            if command.fire {
                self.try_fire(world, id, ctx.tick, events);
            }
            if let Some(ship) = world.ship_mut(id) {
                let dynamics = self.physics.dynamics(ship.team);
                integrate_ship(ship, command, dynamics, self.dt, &arena);
            }
        }
    }
}
