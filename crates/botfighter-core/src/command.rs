//! Per-ship control input and its ingestion path.
//!
//! A [`Command`] is the only way anything outside the tick loop influences a
//! ship. Commands reach the loop two ways:
//!
//! - [`Simulation::submit`](crate::simulation::Simulation::submit) between
//!   ticks, from the thread that owns the simulation
//! - an [`InputSender`] from any thread; queued [`Input`]s are drained at the
//!   start of the next tick
//!
//! Either way the value lands in the [`CommandBuffer`] and takes effect
//! atomically when the next tick begins. A ship with no fresh command keeps
//! executing its previous one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{SimError, SimResult};

/// Control input for one ship for one tick.
///
/// `rotation` is `-1` (counter-clockwise on screen), `0` or `1` (clockwise).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Command {
    /// Accelerate along the heading
    pub thrust: bool,
    /// Turn direction
    pub rotation: i8,
    /// Fire if the weapon is ready
    pub fire: bool,
}

impl Command {
    /// Do nothing.
    pub const IDLE: Self = Self {
        thrust: false,
        rotation: 0,
        fire: false,
    };

    /// Create a command, clamping `rotation` into `{-1, 0, 1}`.
    #[must_use]
    pub fn new(thrust: bool, rotation: i8, fire: bool) -> Self {
        Self {
            thrust,
            rotation,
            fire,
        }
        .sanitized()
    }

    /// Strict check of the control values.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidCommand`] when `rotation` is outside
    /// `{-1, 0, 1}`.
    pub fn validate(self) -> SimResult<Self> {
        if (-1..=1).contains(&self.rotation) {
            Ok(self)
        } else {
            Err(SimError::InvalidCommand {
                field: "rotation",
                value: i64::from(self.rotation),
            })
        }
    }

    /// Lenient form used by the tick loop: out-of-range rotation is clamped.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            rotation: self.rotation.signum(),
            ..self
        }
    }
}

/// Something queued for the tick loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// New command for a ship
    Control {
        /// Target ship
        ship: EntityId,
        /// Command to apply from the next tick on
        command: Command,
    },
    /// Replace the whole world with a fresh one
    Restart,
}

/// Thread-safe producer side of the input queue.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::Sender<Input>,
}

impl InputSender {
    /// Queue an input.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ChannelClosed`] once the simulation is dropped.
    pub fn send(&self, input: Input) -> SimResult<()> {
        self.tx
            .send(input)
            .map_err(|_| SimError::ChannelClosed("input queue"))
    }

    /// Queue a command for `ship`.
    ///
    /// # Errors
    ///
    /// As [`InputSender::send`].
    pub fn send_command(&self, ship: EntityId, command: Command) -> SimResult<()> {
        self.send(Input::Control { ship, command })
    }

    /// Queue a restart.
    ///
    /// # Errors
    ///
    /// As [`InputSender::send`].
    pub fn send_restart(&self) -> SimResult<()> {
        self.send(Input::Restart)
    }
}

/// Consumer side of the input queue, owned by the simulation.
#[derive(Debug)]
pub struct InputQueue {
    rx: mpsc::Receiver<Input>,
}

impl InputQueue {
    /// Take everything queued so far without blocking.
    pub fn drain(&self) -> Vec<Input> {
        self.rx.try_iter().collect()
    }
}

/// Create a connected sender and queue.
#[must_use]
pub fn input_channel() -> (InputSender, InputQueue) {
    let (tx, rx) = mpsc::channel();
    (InputSender { tx }, InputQueue { rx })
}

/// Commands waiting for the next tick plus the last command of every ship.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    pending: BTreeMap<EntityId, Command>,
    active: BTreeMap<EntityId, Command>,
    fresh: BTreeSet<EntityId>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a command for the next tick. A later submission for the same
    /// ship before the tick starts replaces this one.
    pub fn submit(&mut self, ship: EntityId, command: Command) {
        self.pending.insert(ship, command.sanitized());
    }

    /// Make buffered commands active. Called once at the start of a tick.
    pub fn commit(&mut self) {
        self.fresh.clear();
        for (ship, command) in std::mem::take(&mut self.pending) {
            self.active.insert(ship, command);
            self.fresh.insert(ship);
        }
    }

    /// Command in effect for `ship` this tick; the idle command if it never
    /// received one.
    #[must_use]
    pub fn command_for(&self, ship: EntityId) -> Command {
        self.active.get(&ship).copied().unwrap_or(Command::IDLE)
    }

    /// Whether `ship` received a new command for this tick rather than
    /// reusing its previous one.
    #[must_use]
    pub fn is_fresh(&self, ship: EntityId) -> bool {
        self.fresh.contains(&ship)
    }

    /// Forget everything about `ship`.
    pub fn remove(&mut self, ship: EntityId) {
        self.pending.remove(&ship);
        self.active.remove(&ship);
        self.fresh.remove(&ship);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
        self.fresh.clear();
    }
}
