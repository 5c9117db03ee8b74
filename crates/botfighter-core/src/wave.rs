//! Spawn placement and wave escalation.
//!
//! The [`WaveManager`] populates a fresh world, replaces every destroyed enemy
//! with `enemies_per_kill` new ones (never exceeding `max_enemies` alive), and
//! keeps the coin count constant by respawning collected coins. All placement
//! draws from the world's seeded random source.
//!
//! # Placement
//!
//! A candidate point is drawn inside the arena margin. It is accepted when the
//! square hitbox around it touches no wall and it keeps `clearance` from every
//! ship and coin. After `max_attempts` rejections a fallback position is used
//! instead: the list is scanned from a randomly drawn index, wrapping around,
//! and the first entry clear of walls wins. Configuration validation rejects
//! fallbacks that touch a wall, so placement never fails outright.

use std::f32::consts::TAU;

use botfighter_geom::Rect;
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::arena::Arena;
use crate::config::{SimConfig, SpawnConfig};
use crate::entity::{EntityId, Team};
use crate::error::{SimError, SimResult};
use crate::snapshot::GameEvent;
use crate::world::World;

/// Where a spawn ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Chosen position
    pub position: Vec2,
    /// Whether random placement failed and a fallback position was used
    pub fallback: bool,
}

/// Look for a random spawn point clear of walls and occupied positions.
///
/// # Errors
///
/// [`SimError::SpawnPlacementFailure`] when no candidate is accepted within
/// `spawn.max_attempts` draws.
pub fn find_spawn_position(
    arena: &Arena,
    occupied: &[Vec2],
    rng: &mut ChaCha8Rng,
    spawn: &SpawnConfig,
    radius: f32,
) -> SimResult<Vec2> {
    let bounds = arena.bounds();
    let (min, max) = (
        bounds.min() + Vec2::splat(spawn.margin),
        bounds.max() - Vec2::splat(spawn.margin),
    );
    if min.x > max.x || min.y > max.y {
        return Err(SimError::SpawnPlacementFailure { attempts: 0 });
    }

    for _ in 0..spawn.max_attempts {
        let candidate = Vec2::new(rng.gen_range(min.x..=max.x), rng.gen_range(min.y..=max.y));
        let clear_of_walls = !arena.rect_blocked(&Rect::from_center(candidate, Vec2::splat(radius)));
        let clear_of_others = occupied
            .iter()
            .all(|other| other.distance(candidate) >= spawn.clearance);
        if clear_of_walls && clear_of_others {
            return Ok(candidate);
        }
    }
    Err(SimError::SpawnPlacementFailure {
        attempts: spawn.max_attempts,
    })
}

/// First wall-free fallback position, scanning from a random start index.
///
/// Falls back to the randomly drawn entry only when every candidate is
/// blocked, which a validated configuration rules out.
#[must_use]
pub fn fallback_position(arena: &Arena, rng: &mut ChaCha8Rng, spawn: &SpawnConfig, radius: f32) -> Vec2 {
    let candidates = &spawn.fallback_positions;
    if candidates.is_empty() {
        return arena.bounds().center();
    }
    let start = rng.gen_range(0..candidates.len());
    (0..candidates.len())
        .map(|offset| candidates[(start + offset) % candidates.len()])
        .find(|position| !arena.rect_blocked(&Rect::from_center(*position, Vec2::splat(radius))))
        .unwrap_or(candidates[start])
}

/// Random placement with fallback; never fails.
pub fn place(world: &mut World, spawn: &SpawnConfig, radius: f32) -> Placement {
    let occupied = world.occupied_positions();
    let (arena, rng) = world.arena_and_rng();
    match find_spawn_position(arena, &occupied, rng, spawn, radius) {
        Ok(position) => Placement {
            position,
            fallback: false,
        },
        Err(err) => {
            let position = fallback_position(arena, rng, spawn, radius);
            warn!(%err, x = position.x, y = position.y, "using fallback spawn position");
            Placement {
                position,
                fallback: true,
            }
        }
    }
}

/// Initial population, enemy escalation and coin respawn.
#[derive(Debug, Clone)]
pub struct WaveManager {
    spawn: SpawnConfig,
    ship_radius: f32,
    coin_radius: f32,
}

impl WaveManager {
    /// Creates a wave manager from the spawn section of `config`.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            spawn: config.spawn.clone(),
            ship_radius: config.physics.ship_radius,
            coin_radius: config.spawn.coin_radius,
        }
    }

    /// Spawn the starting layout: players, initial enemies, then coins.
    ///
    /// Returns the new enemy IDs.
    pub fn populate(&self, world: &mut World, events: &mut Vec<GameEvent>) -> Vec<EntityId> {
        for _ in 0..self.spawn.player_ships {
            let placement = place(world, &self.spawn, self.ship_radius);
            world.spawn_ship(Team::Player, placement.position, 0.0);
        }
        let enemies = (0..self.spawn.initial_enemies)
            .map(|_| self.spawn_enemy(world, events))
            .collect();
        for _ in 0..self.spawn.coin_count {
            self.spawn_coin(world, events);
        }
        enemies
    }

    /// Advance the wave after `deaths` enemies were destroyed in one tick.
    ///
    /// Returns the IDs of the enemies spawned in response.
    pub fn on_enemy_deaths(&self, world: &mut World, deaths: u32, events: &mut Vec<GameEvent>) -> Vec<EntityId> {
        if deaths == 0 {
            return Vec::new();
        }
        let wave = world.scoreboard_mut().advance_wave();
        let live = u32::try_from(world.live_count(Team::Enemy)).unwrap_or(u32::MAX);
        let room = self.spawn.max_enemies.saturating_sub(live);
        let count = self.spawn.enemies_per_kill.saturating_mul(deaths).min(room);

        let spawned: Vec<EntityId> = (0..count).map(|_| self.spawn_enemy(world, events)).collect();
        info!(wave, destroyed = deaths, spawned = count, live = live + count, "wave advanced");
        events.push(GameEvent::WaveAdvanced {
            wave,
            destroyed: deaths,
            spawned: count,
        });
        spawned
    }

    /// Spawn one replacement per collected coin.
    pub fn respawn_coins(&self, world: &mut World, collected: usize, events: &mut Vec<GameEvent>) {
        for _ in 0..collected {
            self.spawn_coin(world, events);
        }
    }

    fn spawn_enemy(&self, world: &mut World, events: &mut Vec<GameEvent>) -> EntityId {
        let placement = place(world, &self.spawn, self.ship_radius);
        let heading = world.rng_mut().gen_range(0.0..TAU);
        let ship = world.spawn_ship(Team::Enemy, placement.position, heading);
        events.push(GameEvent::EnemySpawned {
            ship,
            fallback: placement.fallback,
        });
        ship
    }

    fn spawn_coin(&self, world: &mut World, events: &mut Vec<GameEvent>) -> EntityId {
        let placement = place(world, &self.spawn, self.coin_radius);
        let coin = world.spawn_coin(placement.position);
        events.push(GameEvent::CoinSpawned { coin });
        coin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use rand::SeedableRng;

    fn arena(walls: Vec<Rect>) -> Arena {
        Arena::new(&ArenaConfig {
            width: 1000.0,
            height: 1000.0,
            walls,
        })
    }

    mod placement {
        use super::*;

        #[test]
        fn random_spot_respects_walls_and_clearance() {
            let arena = arena(vec![Rect::new(300.0, 300.0, 400.0, 400.0)]);
            let occupied = vec![Vec2::new(200.0, 200.0)];
            let spawn = SpawnConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(5);

            for _ in 0..50 {
                let position = find_spawn_position(&arena, &occupied, &mut rng, &spawn, 10.0).unwrap();
                assert!(!arena.rect_blocked(&Rect::from_center(position, Vec2::splat(10.0))));
                assert!(position.distance(occupied[0]) >= spawn.clearance);
                assert!(position.x >= 100.0 && position.x <= 900.0);
            }
        }

        #[test]
        fn fully_walled_arena_reports_failure() {
            let arena = arena(vec![Rect::new(0.0, 0.0, 1000.0, 1000.0)]);
            let spawn = SpawnConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            let err = find_spawn_position(&arena, &[], &mut rng, &spawn, 10.0).unwrap_err();
            assert!(matches!(err, SimError::SpawnPlacementFailure { attempts: 100 }));
        }

        #[test]
        fn fallback_skips_blocked_candidates() {
            let arena = arena(vec![Rect::new(350.0, 350.0, 100.0, 100.0)]);
            let spawn = SpawnConfig {
                fallback_positions: vec![Vec2::new(400.0, 400.0), Vec2::new(600.0, 600.0)],
                ..SpawnConfig::default()
            };
            for seed in 0..8 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                assert_eq!(fallback_position(&arena, &mut rng, &spawn, 10.0), Vec2::new(600.0, 600.0));
            }
        }
    }

    mod fallback_path {
        use super::*;

        /// Random candidates all land inside the wall; the fallbacks sit in
        /// the gap along the edge.
        fn walled_config() -> SimConfig {
            let mut config = SimConfig::default();
            config.arena = ArenaConfig {
                width: 1000.0,
                height: 1000.0,
                walls: vec![Rect::new(50.0, 50.0, 900.0, 900.0)],
            };
            config.spawn.fallback_positions = vec![Vec2::new(25.0, 25.0), Vec2::new(975.0, 975.0)];
            config
        }

        #[test]
        fn place_uses_clear_fallback() {
            let config = walled_config();
            config.validate().unwrap();
            let mut world = World::new(&config);

            for _ in 0..4 {
                let placement = place(&mut world, &config.spawn, config.physics.ship_radius);
                assert!(placement.fallback);
                assert!(config.spawn.fallback_positions.contains(&placement.position));
                let body = Rect::from_center(placement.position, Vec2::splat(config.physics.ship_radius));
                assert!(!world.arena().rect_blocked(&body));
            }
        }

        #[test]
        fn fallback_enemies_are_flagged() {
            let config = walled_config();
            let mut world = World::new(&config);
            let mut events = Vec::new();
            let enemies = WaveManager::new(&config).populate(&mut world, &mut events);

            assert!(events.contains(&GameEvent::EnemySpawned {
                ship: enemies[0],
                fallback: true
            }));
            for ship in world.ships() {
                assert!(!world.arena().rect_blocked(&ship.bounding_box(config.physics.ship_radius)));
            }
        }
    }

    mod waves {
        use super::*;

        fn open_config() -> SimConfig {
            let mut config = SimConfig::default();
            config.arena = ArenaConfig::open(1000.0, 1000.0);
            config
        }

        #[test]
        fn populate_spawns_configured_layout() {
            let config = open_config();
            let mut world = World::new(&config);
            let mut events = Vec::new();
            let enemies = WaveManager::new(&config).populate(&mut world, &mut events);

            assert_eq!(enemies.len(), 1);
            assert_eq!(world.live_count(Team::Player), 1);
            assert_eq!(world.live_count(Team::Enemy), 1);
            assert_eq!(world.coins().count(), 20);
            assert!(events.contains(&GameEvent::EnemySpawned {
                ship: enemies[0],
                fallback: false
            }));
        }

        #[test]
        fn each_death_spawns_two_and_advances_once() {
            let config = open_config();
            let mut world = World::new(&config);
            let manager = WaveManager::new(&config);
            let mut events = Vec::new();

            let spawned = manager.on_enemy_deaths(&mut world, 3, &mut events);
            assert_eq!(spawned.len(), 6);
            assert_eq!(world.scoreboard().wave(), 2);
            assert_eq!(
                events.last(),
                Some(&GameEvent::WaveAdvanced {
                    wave: 2,
                    destroyed: 3,
                    spawned: 6
                })
            );
        }

        #[test]
        fn escalation_is_capped() {
            let mut config = open_config();
            config.spawn.max_enemies = 5;
            let mut world = World::new(&config);
            for i in 0..4 {
                world.spawn_ship(Team::Enemy, Vec2::new(200.0 + 100.0 * i as f32, 500.0), 0.0);
            }
            let manager = WaveManager::new(&config);
            let spawned = manager.on_enemy_deaths(&mut world, 2, &mut Vec::new());
            assert_eq!(spawned.len(), 1);
            assert_eq!(world.live_count(Team::Enemy), 5);
        }

        #[test]
        fn no_deaths_no_wave() {
            let config = open_config();
            let mut world = World::new(&config);
            let mut events = Vec::new();
            assert!(WaveManager::new(&config)
                .on_enemy_deaths(&mut world, 0, &mut events)
                .is_empty());
            assert_eq!(world.scoreboard().wave(), 1);
            assert!(events.is_empty());
        }

        #[test]
        fn same_seed_same_layout() {
            let config = SimConfig::default();
            let manager = WaveManager::new(&config);
            let mut a = World::new(&config);
            let mut b = World::new(&config);
            manager.populate(&mut a, &mut Vec::new());
            manager.populate(&mut b, &mut Vec::new());
            assert_eq!(a.occupied_positions(), b.occupied_positions());
        }
    }
}
