//! The single mutable world state.
//!
//! [`World`] is the container for everything that changes during a run:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity lifecycle management (spawn/despawn/prune)
//! - The tick counter, scoreboard and the seeded random source
//!
//! Entity IDs are allocated from one monotonically increasing counter, so
//! iterating any of the maps yields creation order, identically on every
//! platform. The simulation loop owns the only `World`; everything else sees
//! immutable snapshots of it.
//!
//! # Example
//!
//! ```
//! use botfighter_core::config::SimConfig;
//! use botfighter_core::entity::Team;
//! use botfighter_core::world::World;
//! use glam::Vec2;
//!
//! let mut world = World::new(&SimConfig::default());
//! let ship = world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
//! let coin = world.spawn_coin(Vec2::new(320.0, 300.0));
//!
//! assert!(ship < coin);
//! assert_eq!(world.ship(ship).map(|s| s.health), Some(100));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::{Bullet, Coin, EntityId, EntityKind, Ship, Team};
use crate::error::{SimError, SimResult};
use crate::scoreboard::Scoreboard;

/// Entity storage plus run-wide counters.
#[derive(Clone)]
pub struct World {
    arena: Arena,
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Current simulation tick.
    tick: u64,
    ships: BTreeMap<EntityId, Ship>,
    bullets: BTreeMap<EntityId, Bullet>,
    coins: BTreeMap<EntityId, Coin>,
    scoreboard: Scoreboard,
    rng: ChaCha8Rng,
    seed: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("next_id", &self.next_id)
            .field("ships", &self.ships.len())
            .field("bullets", &self.bullets.len())
            .field("coins", &self.coins.len())
            .field("scoreboard", &self.scoreboard)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create an empty world at tick 0 with the configured arena and seed.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            arena: Arena::new(&config.arena),
            next_id: 1,
            tick: 0,
            ships: BTreeMap::new(),
            bullets: BTreeMap::new(),
            coins: BTreeMap::new(),
            scoreboard: Scoreboard::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            seed: config.seed,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Spawn a full-health ship and return its ID.
    pub fn spawn_ship(&mut self, team: Team, position: Vec2, heading: f32) -> EntityId {
        let id = self.allocate_id();
        self.ships.insert(id, Ship::new(id, team, position, heading));
        id
    }

    /// Spawn a bullet owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownEntity`] if `owner` is not a ship in this
    /// world.
    pub fn spawn_bullet(
        &mut self,
        owner: EntityId,
        origin: Vec2,
        position: Vec2,
        velocity: Vec2,
        lifetime_ticks: u32,
    ) -> SimResult<EntityId> {
        if !self.ships.contains_key(&owner) {
            return Err(SimError::UnknownEntity(owner));
        }
        let id = self.allocate_id();
        let owner = &self.ships[&owner];
        let bullet = Bullet::new(id, owner, origin, position, velocity, lifetime_ticks);
        self.bullets.insert(id, bullet);
        Ok(id)
    }

    /// Spawn a coin and return its ID.
    pub fn spawn_coin(&mut self, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        self.coins.insert(id, Coin::new(id, position));
        id
    }

    /// Remove any entity. Returns what kind it was, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityKind> {
        if self.ships.remove(&id).is_some() {
            Some(EntityKind::Ship)
        } else if self.bullets.remove(&id).is_some() {
            Some(EntityKind::Bullet)
        } else if self.coins.remove(&id).is_some() {
            Some(EntityKind::Coin)
        } else {
            None
        }
    }

    /// Drop consumed bullets and collected coins.
    pub fn remove_dead_projectiles_and_coins(&mut self) {
        self.bullets.retain(|_, bullet| bullet.alive);
        self.coins.retain(|_, coin| coin.alive);
    }

    /// Remove ships destroyed before `tick`, returning their IDs in order.
    ///
    /// A ship destroyed during `tick` itself stays for one more snapshot.
    pub fn prune_destroyed_ships(&mut self, tick: u64) -> Vec<EntityId> {
        let expired: Vec<EntityId> = self
            .ships
            .values()
            .filter(|ship| ship.destroyed_tick.is_some_and(|t| t < tick))
            .map(|ship| ship.id)
            .collect();
        for id in &expired {
            self.ships.remove(id);
        }
        expired
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    /// Look up a ship.
    #[must_use]
    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Look up a ship mutably.
    pub fn ship_mut(&mut self, id: EntityId) -> Option<&mut Ship> {
        self.ships.get_mut(&id)
    }

    /// Look up a bullet.
    #[must_use]
    pub fn bullet(&self, id: EntityId) -> Option<&Bullet> {
        self.bullets.get(&id)
    }

    /// Look up a coin.
    #[must_use]
    pub fn coin(&self, id: EntityId) -> Option<&Coin> {
        self.coins.get(&id)
    }

    /// Ships in ID order.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> + '_ {
        self.ships.values()
    }

    /// Ships in ID order, mutably.
    pub fn ships_mut(&mut self) -> impl Iterator<Item = &mut Ship> + '_ {
        self.ships.values_mut()
    }

    /// Bullets in ID order.
    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> + '_ {
        self.bullets.values()
    }

    /// Bullets in ID order, mutably.
    pub fn bullets_mut(&mut self) -> impl Iterator<Item = &mut Bullet> + '_ {
        self.bullets.values_mut()
    }

    /// Coins in ID order.
    pub fn coins(&self) -> impl Iterator<Item = &Coin> + '_ {
        self.coins.values()
    }

    /// Coins in ID order, mutably.
    pub fn coins_mut(&mut self) -> impl Iterator<Item = &mut Coin> + '_ {
        self.coins.values_mut()
    }

    /// Split borrow of the ship and bullet maps for collision passes.
    pub(crate) fn ships_and_bullets_mut(
        &mut self,
    ) -> (
        &mut BTreeMap<EntityId, Ship>,
        &mut BTreeMap<EntityId, Bullet>,
    ) {
        (&mut self.ships, &mut self.bullets)
    }

    /// Split borrow of the ship and coin maps for pickup passes.
    pub(crate) fn ships_and_coins_mut(
        &mut self,
    ) -> (&BTreeMap<EntityId, Ship>, &mut BTreeMap<EntityId, Coin>) {
        (&self.ships, &mut self.coins)
    }

    /// Number of living ships on `team`.
    #[must_use]
    pub fn live_count(&self, team: Team) -> usize {
        self.ships
            .values()
            .filter(|ship| ship.alive && ship.team == team)
            .count()
    }

    /// Positions of every ship and coin, used to keep spawns apart.
    #[must_use]
    pub fn occupied_positions(&self) -> Vec<Vec2> {
        self.ships
            .values()
            .map(|ship| ship.position)
            .chain(self.coins.values().map(|coin| coin.position))
            .collect()
    }

    /// Static arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Arena plus the random source, borrowed together for placement.
    pub fn arena_and_rng(&mut self) -> (&Arena, &mut ChaCha8Rng) {
        (&self.arena, &mut self.rng)
    }

    /// Seeded random source.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Counters.
    #[must_use]
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Counters, mutably.
    pub fn scoreboard_mut(&mut self) -> &mut Scoreboard {
        &mut self.scoreboard
    }

    /// Current tick. Starts at 0; the first step produces tick 1.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the tick counter by one.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Seed this world was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
