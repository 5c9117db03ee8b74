//! The fixed-tick simulation loop.
//!
//! [`Simulation`] owns the only mutable [`World`] and advances it one tick at
//! a time:
//!
//! 1. **INGEST**: Drain queued inputs into the command buffer. A queued
//!    restart rebuilds the world instead and consumes the tick.
//! 2. **COMMIT**: Buffered commands become active atomically; ships without a
//!    fresh command keep their previous one.
//! 3. **RESOLVE**: Physics, then collisions, mutate the world in ID order.
//! 4. **BOOKKEEPING**: Wave escalation, coin respawn, game over, pruning.
//! 5. **PUBLISH**: An immutable [`Snapshot`] is built and swapped into the
//!    shared slot.
//! 6. **DECIDE**: Controllers read the published snapshot in parallel; their
//!    commands are buffered for the next tick.
//!
//! Nothing inside a tick blocks except remote controllers, which are bounded
//! by their own timeout. Once every player ship is gone the phase becomes
//! [`GamePhase::GameOver`] and the world freezes (only the tick counter moves)
//! until a restart.
//!
//! # Example
//!
//! ```
//! use botfighter_core::config::SimConfig;
//! use botfighter_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimConfig::default().with_seed(7)).unwrap();
//! for _ in 0..10 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert_eq!(sim.snapshot().tick, 10);
//! ```

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use tracing::{info, trace, warn};

use crate::command::{input_channel, Command, CommandBuffer, Input, InputQueue, InputSender};
use crate::config::{ConfigError, SimConfig};
use crate::controller::{Controller, ControllerOrigin, ControllerRegistry, EnemyBrain};
use crate::entity::{EntityId, Team};
use crate::error::{SimError, SimResult};
use crate::resolver::{CollisionResolver, PhysicsResolver, Resolver, TickContext};
use crate::scoreboard::GamePhase;
use crate::snapshot::{GameEvent, Snapshot, SnapshotReader};
use crate::wave::WaveManager;
use crate::world::World;

// =============================================================================
// Simulation
// =============================================================================

/// The tick loop and everything it owns.
pub struct Simulation {
    config: Arc<SimConfig>,
    world: World,
    /// Run in order every tick.
    resolvers: Vec<Box<dyn Resolver>>,
    waves: WaveManager,
    controllers: ControllerRegistry,
    commands: CommandBuffer,
    inputs: InputQueue,
    sender: InputSender,
    reader: SnapshotReader,
    latest: Arc<Snapshot>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .field("controllers", &self.controllers)
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}

/// Give every new enemy its own brain, seeded from the world's random source.
///
/// A seed is drawn for every ID even when an external controller already
/// drives that ship, so the random stream does not depend on attachments.
fn attach_brains(
    config: &SimConfig,
    world: &mut World,
    controllers: &mut ControllerRegistry,
    enemies: &[EntityId],
) {
    for &ship in enemies {
        let seed = world.rng_mut().gen::<u64>();
        if !controllers.contains(ship) {
            let brain = EnemyBrain::new(config, seed);
            controllers.attach(ship, Box::new(brain), ControllerOrigin::Builtin);
        }
    }
}

impl Simulation {
    /// Validate `config`, populate the arena and publish tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);

        let mut world = World::new(&config);
        let waves = WaveManager::new(&config);
        let mut controllers = ControllerRegistry::new();
        let mut events = Vec::new();
        let enemies = waves.populate(&mut world, &mut events);
        attach_brains(&config, &mut world, &mut controllers, &enemies);

        let latest = Arc::new(Snapshot::capture(&world, events));
        let (sender, inputs) = input_channel();
        let resolvers: Vec<Box<dyn Resolver>> = vec![
            Box::new(PhysicsResolver::new(config.physics.clone())),
            Box::new(CollisionResolver::new(&config)),
        ];

        info!(
            seed = config.seed,
            ships = world.ships().count(),
            coins = world.coins().count(),
            "simulation started"
        );

        let mut sim = Self {
            config,
            world,
            resolvers,
            waves,
            controllers,
            commands: CommandBuffer::new(),
            inputs,
            sender,
            reader: SnapshotReader::new(Arc::clone(&latest)),
            latest,
        };
        sim.run_controllers();
        Ok(sim)
    }

    /// Default configuration with another seed.
    ///
    /// # Errors
    ///
    /// As [`Simulation::new`].
    pub fn from_seed(seed: u64) -> Result<Self, ConfigError> {
        Self::new(SimConfig::default().with_seed(seed))
    }

    // -------------------------------------------------------------------------
    // Tick loop
    // -------------------------------------------------------------------------

    /// Advance one tick and return the snapshot it published.
    pub fn step(&mut self) -> Arc<Snapshot> {
        if self.ingest_inputs() {
            return self.snapshot();
        }

        self.commands.commit();
        self.world.advance_tick();
        let tick = self.world.tick();

        if self.world.scoreboard().is_game_over() {
            self.publish(Vec::new());
            return self.snapshot();
        }

        let mut events = Vec::new();
        let ctx = TickContext {
            tick,
            commands: &self.commands,
        };
        for resolver in &self.resolvers {
            trace!(resolver = resolver.name(), tick, "resolving");
            resolver.resolve(&ctx, &mut self.world, &mut events);
        }

        self.bookkeeping(tick, &mut events);
        self.publish(events);
        self.run_controllers();
        self.snapshot()
    }

    /// Step `ticks` times and return the last snapshot.
    pub fn run(&mut self, ticks: u64) -> Arc<Snapshot> {
        for _ in 0..ticks {
            self.step();
        }
        self.snapshot()
    }

    /// Rebuild the world from configuration, exactly as a fresh start.
    ///
    /// Pending commands and built-in controllers are dropped. Externally
    /// attached controllers stay attached if their ship ID exists again.
    pub fn restart(&mut self) {
        self.world = World::new(&self.config);
        self.commands.clear();
        self.controllers
            .retain(|_, origin| origin == ControllerOrigin::External);

        let mut events = vec![GameEvent::Restarted];
        let enemies = self.waves.populate(&mut self.world, &mut events);
        let world = &self.world;
        self.controllers.retain(|ship, _| world.ship(ship).is_some());
        attach_brains(&self.config, &mut self.world, &mut self.controllers, &enemies);

        info!(seed = self.config.seed, "simulation restarted");
        self.publish(events);
        self.run_controllers();
    }

    /// Returns true if a restart consumed this tick.
    fn ingest_inputs(&mut self) -> bool {
        let inputs = self.inputs.drain();
        let last_restart = inputs.iter().rposition(|input| matches!(input, Input::Restart));
        let controls = match last_restart {
            Some(index) => {
                self.restart();
                &inputs[index + 1..]
            }
            None => &inputs[..],
        };

        for input in controls {
            if let Input::Control { ship, command } = *input {
                if let Err(err) = self.submit(ship, command) {
                    warn!(%err, "dropping queued command");
                }
            }
        }
        last_restart.is_some()
    }

    fn bookkeeping(&mut self, tick: u64, events: &mut Vec<GameEvent>) {
        let mut enemy_deaths = 0u32;
        let mut player_died = false;
        let mut coins_collected = 0usize;
        for event in events.iter() {
            match event {
                GameEvent::ShipDestroyed {
                    team: Team::Enemy, ..
                } => enemy_deaths += 1,
                GameEvent::ShipDestroyed {
                    team: Team::Player, ..
                } => player_died = true,
                GameEvent::CoinCollected { .. } => coins_collected += 1,
                _ => {}
            }
        }

        let spawned = self.waves.on_enemy_deaths(&mut self.world, enemy_deaths, events);
        attach_brains(&self.config, &mut self.world, &mut self.controllers, &spawned);
        self.waves.respawn_coins(&mut self.world, coins_collected, events);

        if player_died && self.world.live_count(Team::Player) == 0 {
            let board = self.world.scoreboard_mut();
            board.end_game();
            info!(
                tick,
                score = board.score(),
                kills = board.kills(),
                wave = board.wave(),
                "game over"
            );
            events.push(GameEvent::GameOver {
                score: board.score(),
            });
        }

        for ship in self.world.prune_destroyed_ships(tick) {
            self.controllers.detach(ship);
            self.commands.remove(ship);
        }
        self.world.remove_dead_projectiles_and_coins();
    }

    fn publish(&mut self, events: Vec<GameEvent>) {
        let snapshot = Arc::new(Snapshot::capture(&self.world, events));
        self.reader.publish(Arc::clone(&snapshot));
        self.latest = snapshot;
    }

    fn run_controllers(&mut self) {
        if self.world.scoreboard().is_game_over() {
            return;
        }
        for (ship, command) in self.controllers.decide_all(&self.latest) {
            self.commands.submit(ship, command);
        }
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    /// Buffer a command for `ship`, taking effect at the next tick.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] if there is no such ship and
    /// [`SimError::ShipDestroyed`] if it is no longer alive.
    pub fn submit(&mut self, ship: EntityId, command: Command) -> SimResult<()> {
        match self.world.ship(ship) {
            None => Err(SimError::UnknownEntity(ship)),
            Some(target) if !target.alive => Err(SimError::ShipDestroyed(ship)),
            Some(_) => {
                self.commands.submit(ship, command);
                Ok(())
            }
        }
    }

    /// Let `controller` drive `ship` from the next decision phase on.
    ///
    /// Returns the controller it replaces.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] if there is no such ship.
    pub fn attach_controller(
        &mut self,
        ship: EntityId,
        controller: Box<dyn Controller>,
    ) -> SimResult<Option<Box<dyn Controller>>> {
        if self.world.ship(ship).is_none() {
            return Err(SimError::UnknownEntity(ship));
        }
        Ok(self
            .controllers
            .attach(ship, controller, ControllerOrigin::External))
    }

    /// Stop driving `ship` automatically. Its last command stays active.
    pub fn detach_controller(&mut self, ship: EntityId) -> Option<Box<dyn Controller>> {
        self.controllers.detach(ship)
    }

    /// Cloneable, thread-safe handle for queueing inputs.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.sender.clone()
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest)
    }

    /// Handle that other threads use to read the latest snapshot.
    #[must_use]
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Current world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for tools and tests.
    ///
    /// Changes show up in the snapshot published by the next step.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Attached controllers.
    #[must_use]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Buffered and active commands.
    #[must_use]
    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Configuration this simulation was built from.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.world.tick()
    }

    /// Master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Run phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.world.scoreboard().phase()
    }
}
