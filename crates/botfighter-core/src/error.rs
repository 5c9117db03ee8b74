//! Error types for the simulation core.
//!
//! None of these are fatal to a running simulation. The tick loop recovers
//! from each one locally (clamping, dropping, or falling back) and the public
//! API returns them so callers can react.

use thiserror::Error;

use crate::config::ConfigError;
use crate::entity::EntityId;

/// Errors reported by the simulation API.
#[derive(Debug, Error)]
pub enum SimError {
    /// A command or sensor query named a ship that is not in the world.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// A sensor query was issued for a ship that has been destroyed.
    #[error("ship {0} is destroyed")]
    ShipDestroyed(EntityId),

    /// A control value was outside its allowed range.
    #[error("invalid command: {field} = {value}")]
    InvalidCommand {
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// No collision-free spawn position was found within the retry budget.
    #[error("no free spawn position after {attempts} attempts")]
    SpawnPlacementFailure {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The receiving side of an input or decision channel is gone.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results carrying a [`SimError`].
pub type SimResult<T> = Result<T, SimError>;
