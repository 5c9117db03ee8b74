//! Resolvers mutate the world once per tick.
//!
//! Resolvers are the write phase of the tick loop. They run in a fixed order
//! against the single mutable [`World`], read the commands that became active
//! at the start of the tick, and report what happened as [`GameEvent`]s.
//!
//! # Invariants
//!
//! - Resolvers MUST iterate entities in ID order
//! - Resolvers MUST be deterministic given the same world and commands
//! - Resolvers never block
//!
//! # Available Resolvers
//!
//! - [`PhysicsResolver`]: Bullet motion, firing, ship integration
//! - [`CollisionResolver`]: Ship-wall, bullet-wall, bullet-ship and ship-coin

mod collision;
mod physics;

pub use collision::{push_out, CollisionResolver};
pub use physics::{integrate_bullet, integrate_ship, PhysicsResolver};

use crate::command::CommandBuffer;
use crate::snapshot::GameEvent;
use crate::world::World;

/// Per-tick inputs shared by every resolver.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Tick being resolved
    pub tick: u64,
    /// Commands active for this tick
    pub commands: &'a CommandBuffer,
}

/// A stage of world mutation.
///
/// ```
/// use botfighter_core::resolver::{Resolver, TickContext};
/// use botfighter_core::snapshot::GameEvent;
/// use botfighter_core::world::World;
///
/// struct Idle;
///
/// impl Resolver for Idle {
///     fn name(&self) -> &'static str {
///         "idle"
///     }
///
///     fn resolve(&self, _ctx: &TickContext<'_>, _world: &mut World, _events: &mut Vec<GameEvent>) {}
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Apply this stage to `world`, appending events in the order they occur.
    fn resolve(&self, ctx: &TickContext<'_>, world: &mut World, events: &mut Vec<GameEvent>);
}
