//! Immutable per-tick state published by the simulation.
//!
//! A [`Snapshot`] is built once at the end of each tick and never mutated
//! afterwards. It is handed out as `Arc<Snapshot>`, so renderers, remote
//! viewers, sensor queries and decision sources read it concurrently without
//! copying. Walls are shared with the arena instead of being cloned per tick.
//!
//! Ships destroyed during the tick stay in the snapshot with `alive = false`
//! for that one tick. Consumed bullets and collected coins are already gone.

use std::sync::{Arc, PoisonError, RwLock};

use bitflags::bitflags;
use botfighter_geom::Rect;
use serde::{Deserialize, Serialize};

use crate::entity::{Bullet, Coin, EntityId, Ship, Team};
use crate::scoreboard::GamePhase;
use crate::world::World;

bitflags! {
    /// Summary of what happened during a tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TickEvents: u32 {
        /// At least one bullet was fired
        const SHOT_FIRED = 1 << 0;
        /// At least one ship took damage
        const SHIP_HIT = 1 << 1;
        /// At least one ship was destroyed
        const SHIP_DESTROYED = 1 << 2;
        /// At least one coin was collected
        const COIN_COLLECTED = 1 << 3;
        /// The wave counter advanced
        const WAVE_ADVANCED = 1 << 4;
        /// The run ended
        const GAME_OVER = 1 << 5;
        /// The world was rebuilt
        const RESTARTED = 1 << 6;
        /// A spawn fell back to a fixed safe position
        const SPAWN_FALLBACK = 1 << 7;
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A ship fired.
    ShotFired {
        /// Firing ship
        ship: EntityId,
        /// New bullet
        bullet: EntityId,
    },
    /// A bullet hit a ship.
    ShipHit {
        /// Damaged ship
        ship: EntityId,
        /// Consumed bullet
        bullet: EntityId,
        /// Ship that fired the bullet
        owner: EntityId,
        /// Health after the hit
        health: u32,
    },
    /// A ship's health reached zero.
    ShipDestroyed {
        /// Destroyed ship
        ship: EntityId,
        /// Its team
        team: Team,
        /// Owner of the killing bullet
        killer: EntityId,
    },
    /// A coin was picked up.
    CoinCollected {
        /// Collected coin
        coin: EntityId,
        /// Collector
        ship: EntityId,
        /// Score awarded
        value: u32,
    },
    /// A coin appeared.
    CoinSpawned {
        /// New coin
        coin: EntityId,
    },
    /// An enemy appeared.
    EnemySpawned {
        /// New ship
        ship: EntityId,
        /// Whether placement used a fallback position
        fallback: bool,
    },
    /// The wave counter advanced.
    WaveAdvanced {
        /// New wave number
        wave: u32,
        /// Enemies destroyed this tick
        destroyed: u32,
        /// Enemies spawned in response
        spawned: u32,
    },
    /// Every player ship is gone.
    GameOver {
        /// Final score
        score: u64,
    },
    /// The world was rebuilt from configuration.
    Restarted,
}

impl GameEvent {
    /// The summary flag for this event.
    #[must_use]
    pub fn flag(&self) -> TickEvents {
        match self {
            Self::ShotFired { .. } => TickEvents::SHOT_FIRED,
            Self::ShipHit { .. } => TickEvents::SHIP_HIT,
            Self::ShipDestroyed { .. } => TickEvents::SHIP_DESTROYED,
            Self::CoinCollected { .. } => TickEvents::COIN_COLLECTED,
            Self::EnemySpawned { fallback: true, .. } => TickEvents::SPAWN_FALLBACK,
            Self::CoinSpawned { .. } | Self::EnemySpawned { .. } => TickEvents::empty(),
            Self::WaveAdvanced { .. } => TickEvents::WAVE_ADVANCED,
            Self::GameOver { .. } => TickEvents::GAME_OVER,
            Self::Restarted => TickEvents::RESTARTED,
        }
    }
}

/// Read-only view of the world after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick this snapshot was taken at
    pub tick: u64,
    /// Run phase
    pub phase: GamePhase,
    /// Coin score
    pub score: u64,
    /// Enemies destroyed by player bullets
    pub kills: u32,
    /// Current wave
    pub wave: u32,
    /// Arena rectangle
    pub bounds: Rect,
    /// Static walls, shared across snapshots
    pub walls: Arc<[Rect]>,
    /// Ships in ID order, including ones destroyed this tick
    pub ships: Vec<Ship>,
    /// Live bullets in ID order
    pub bullets: Vec<Bullet>,
    /// Live coins in ID order
    pub coins: Vec<Coin>,
    /// Events of this tick in the order they happened
    pub events: Vec<GameEvent>,
    /// Union of the event flags
    pub flags: TickEvents,
}

impl Snapshot {
    /// Capture the current state of `world` together with the tick's events.
    #[must_use]
    pub fn capture(world: &World, events: Vec<GameEvent>) -> Self {
        let flags = events
            .iter()
            .fold(TickEvents::empty(), |acc, event| acc | event.flag());
        let board = world.scoreboard();
        Self {
            tick: world.tick(),
            phase: board.phase(),
            score: board.score(),
            kills: board.kills(),
            wave: board.wave(),
            bounds: world.arena().bounds(),
            walls: world.arena().walls_shared(),
            ships: world.ships().cloned().collect(),
            bullets: world.bullets().filter(|b| b.alive).cloned().collect(),
            coins: world.coins().filter(|c| c.alive).cloned().collect(),
            events,
            flags,
        }
    }

    /// Look up a ship by ID.
    #[must_use]
    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships
            .binary_search_by_key(&id, |ship| ship.id)
            .ok()
            .map(|index| &self.ships[index])
    }

    /// Look up a coin by ID.
    #[must_use]
    pub fn coin(&self, id: EntityId) -> Option<&Coin> {
        self.coins
            .binary_search_by_key(&id, |coin| coin.id)
            .ok()
            .map(|index| &self.coins[index])
    }

    /// Living ships in ID order.
    pub fn live_ships(&self) -> impl Iterator<Item = &Ship> + '_ {
        self.ships.iter().filter(|ship| ship.alive)
    }

    /// Living ships of one team in ID order.
    pub fn team(&self, team: Team) -> impl Iterator<Item = &Ship> + '_ {
        self.live_ships().filter(move |ship| ship.team == team)
    }

    /// Health of the first player ship, living or just destroyed.
    #[must_use]
    pub fn player_health(&self) -> Option<u32> {
        self.ships
            .iter()
            .find(|ship| ship.team == Team::Player)
            .map(|ship| ship.health)
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Serialize for a transport layer.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Cloneable handle that always yields the latest published snapshot.
///
/// The lock only guards swapping the `Arc`; readers hold the snapshot itself
/// without any lock.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotReader {
    pub(crate) fn new(initial: Arc<Snapshot>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(initial)),
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn latest(&self) -> Arc<Snapshot> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub(crate) fn publish(&self, snapshot: Arc<Snapshot>) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }
}
