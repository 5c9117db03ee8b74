//! # Botfighter Core
//!
//! Deterministic 2D arena combat simulation.
//!
//! Ships fly under thrust and rotation physics, fire bullets, collide with
//! static walls and collect coins. Each ship is driven by submitted commands
//! or by a pluggable [`Controller`](controller::Controller): the built-in enemy
//! state machine, a sensor-driven autopilot, or a remote agent. Enemies
//! multiply as they are destroyed.
//!
//! ## Architecture
//!
//! - **World**: The single mutable state, owned by the tick loop
//! - **Resolvers**: Physics and collision stages that mutate the world
//! - **Snapshots**: Immutable per-tick state shared as `Arc<Snapshot>`
//! - **Sensors**: Laser and radar queries over a snapshot
//! - **Controllers**: Decision sources run in parallel on the latest snapshot
//!
//! ## Usage
//!
//! ```
//! use botfighter_core::command::Command;
//! use botfighter_core::entity::Team;
//! use botfighter_core::sensor::laser;
//! use botfighter_core::simulation::Simulation;
//!
//! let mut sim = Simulation::from_seed(42).unwrap();
//! let player = sim.snapshot().team(Team::Player).next().unwrap().id;
//!
//! sim.submit(player, Command::new(true, 0, false)).unwrap();
//! let snapshot = sim.step();
//!
//! let distance = laser(&snapshot, player, 0.0, 600.0).unwrap();
//! assert!(distance <= 600.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export geometry for callers building arenas
pub use botfighter_geom;

pub mod arena;
pub mod command;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod hash;
pub mod resolver;
pub mod scoreboard;
pub mod sensor;
pub mod simulation;
pub mod snapshot;
pub mod wave;
pub mod world;

#[cfg(test)]
mod tests;

pub use command::{Command, Input, InputSender};
pub use config::{ConfigError, SimConfig};
pub use entity::{EntityId, Team};
pub use error::{SimError, SimResult};
pub use simulation::Simulation;
pub use snapshot::{GameEvent, Snapshot, SnapshotReader, TickEvents};
