//! Test helper functions for setting up simulations and entities.

use glam::Vec2;

use crate::config::{ArenaConfig, SimConfig};
use crate::entity::{EntityId, Team};
use crate::hash::hash_snapshot;
use crate::simulation::Simulation;

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Configurations
// =============================================================================

/// Open 1000x1000 arena with one player and nothing else.
pub fn open_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.arena = ArenaConfig::open(1000.0, 1000.0);
    config.spawn.initial_enemies = 0;
    config.spawn.coin_count = 0;
    config
}

/// Default arena with no initial population at all.
pub fn empty_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.spawn.player_ships = 0;
    config.spawn.initial_enemies = 0;
    config.spawn.coin_count = 0;
    config
}

// =============================================================================
// Setup
// =============================================================================

/// Build a simulation, panicking on invalid test configuration.
pub fn simulation(config: SimConfig) -> Simulation {
    init_tracing();
    Simulation::new(config).expect("test config is valid")
}

/// First ship of `team` in the current world.
pub fn first_of(sim: &Simulation, team: Team) -> EntityId {
    sim.world()
        .ships()
        .find(|ship| ship.team == team)
        .map(|ship| ship.id)
        .expect("team has a ship")
}

/// Spawn an enemy with no controller.
pub fn spawn_enemy(sim: &mut Simulation, position: Vec2) -> EntityId {
    sim.world_mut().spawn_ship(Team::Enemy, position, 0.0)
}

/// Place a motionless bullet owned by `shooter` on top of `target`.
///
/// It hits `target` during the next step unless a lower-ID ship also
/// overlaps that spot.
pub fn bullet_on(sim: &mut Simulation, shooter: EntityId, target: EntityId) -> EntityId {
    let position = sim.world().ship(target).expect("target exists").position;
    sim.world_mut()
        .spawn_bullet(shooter, position, position, Vec2::ZERO, 5)
        .expect("shooter exists")
}

/// Step `ticks` times, collecting the hash of every published snapshot.
pub fn run_hashes(sim: &mut Simulation, ticks: usize) -> Vec<u64> {
    (0..ticks).map(|_| hash_snapshot(&sim.step())).collect()
}
