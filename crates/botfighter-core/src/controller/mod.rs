//! Pluggable decision sources.
//!
//! A [`Controller`] produces the next [`Command`] for one ship from the latest
//! published [`Snapshot`]. The tick loop does not care what sits behind it:
//! the built-in enemy state machine, a sensor-driven autopilot, or a remote
//! agent reached over a channel. Ships without a controller are driven purely
//! by commands submitted from outside.
//!
//! # Decision phase
//!
//! Controllers only read the immutable snapshot, so the registry runs them in
//! parallel with rayon. Results are sorted by ship ID before they reach the
//! command buffer, which keeps runs reproducible regardless of scheduling.
//!
//! # Available Controllers
//!
//! - [`EnemyBrain`]: Patrol, avoidance and combat state machine for enemies
//! - [`SensorAgent`]: Laser and radar driven autopilot for player ships
//! - [`RemoteController`]: Forwards decisions to an external source with a timeout

mod agent;
mod enemy;
mod remote;

pub use agent::SensorAgent;
pub use enemy::{EnemyBrain, EnemyState};
pub use remote::{remote_pair, DecisionReply, DecisionRequest, RemoteController, RemoteEndpoint};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::command::Command;
use crate::entity::EntityId;
use crate::snapshot::Snapshot;

/// Strategy that decides what one ship does next.
///
/// ```
/// use std::sync::Arc;
/// use botfighter_core::command::Command;
/// use botfighter_core::controller::Controller;
/// use botfighter_core::entity::EntityId;
/// use botfighter_core::snapshot::Snapshot;
///
/// struct Spinner;
///
/// impl Controller for Spinner {
///     fn name(&self) -> &str {
///         "spinner"
///     }
///
///     fn decide(&mut self, _ship: EntityId, _snapshot: &Arc<Snapshot>) -> Option<Command> {
///         Some(Command::new(false, 1, false))
///     }
/// }
/// ```
pub trait Controller: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Next command for `ship`, or `None` to keep its previous command.
    fn decide(&mut self, ship: EntityId, snapshot: &Arc<Snapshot>) -> Option<Command>;
}

/// Who attached a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerOrigin {
    /// Attached by the simulation itself, e.g. enemy brains from the wave
    /// manager. Dropped on restart.
    Builtin,
    /// Attached by the embedding application. Survives restart while its
    /// ship still exists.
    External,
}

struct Slot {
    controller: Box<dyn Controller>,
    origin: ControllerOrigin,
}

/// Controllers keyed by the ship they drive.
#[derive(Default)]
pub struct ControllerRegistry {
    slots: BTreeMap<EntityId, Slot>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .map(|(id, slot)| (id, slot.controller.name())),
            )
            .finish()
    }
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a controller to `ship`, returning the one it replaces.
    pub fn attach(
        &mut self,
        ship: EntityId,
        controller: Box<dyn Controller>,
        origin: ControllerOrigin,
    ) -> Option<Box<dyn Controller>> {
        self.slots
            .insert(ship, Slot { controller, origin })
            .map(|slot| slot.controller)
    }

    /// Detach and return the controller of `ship`.
    pub fn detach(&mut self, ship: EntityId) -> Option<Box<dyn Controller>> {
        self.slots.remove(&ship).map(|slot| slot.controller)
    }

    /// Whether `ship` has a controller.
    #[must_use]
    pub fn contains(&self, ship: EntityId) -> bool {
        self.slots.contains_key(&ship)
    }

    /// Name of the controller driving `ship`.
    #[must_use]
    pub fn name_of(&self, ship: EntityId) -> Option<&str> {
        self.slots.get(&ship).map(|slot| slot.controller.name())
    }

    /// Origin of the controller driving `ship`.
    #[must_use]
    pub fn origin_of(&self, ship: EntityId) -> Option<ControllerOrigin> {
        self.slots.get(&ship).map(|slot| slot.origin)
    }

    /// Number of attached controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no controller is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keep only the controllers for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId, ControllerOrigin) -> bool) {
        self.slots.retain(|id, slot| keep(*id, slot.origin));
    }

    /// Run every controller whose ship is alive in `snapshot`.
    ///
    /// Returns sanitized commands sorted by ship ID. Controllers that return
    /// `None` are left out.
    pub fn decide_all(&mut self, snapshot: &Arc<Snapshot>) -> Vec<(EntityId, Command)> {
        let active: Vec<(EntityId, &mut Slot)> = self
            .slots
            .iter_mut()
            .filter(|(id, _)| snapshot.ship(**id).is_some_and(|ship| ship.alive))
            .map(|(id, slot)| (*id, slot))
            .collect();

        let mut decisions: Vec<(EntityId, Command)> = active
            .into_par_iter()
            .filter_map(|(id, slot)| {
                slot.controller
                    .decide(id, snapshot)
                    .map(|command| (id, command.sanitized()))
            })
            .collect();

        decisions.sort_by_key(|(id, _)| *id);
        decisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::Team;
    use crate::world::World;
    use glam::Vec2;

    struct Fixed(Command);

    impl Controller for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn decide(&mut self, _ship: EntityId, _snapshot: &Arc<Snapshot>) -> Option<Command> {
            Some(self.0)
        }
    }

    struct Silent;

    impl Controller for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn decide(&mut self, _ship: EntityId, _snapshot: &Arc<Snapshot>) -> Option<Command> {
            None
        }
    }

    fn snapshot_with_ships(count: usize) -> (Arc<Snapshot>, Vec<EntityId>) {
        let mut world = World::new(&SimConfig::default());
        #[allow(clippy::cast_precision_loss)]
        let ids = (0..count)
            .map(|i| world.spawn_ship(Team::Enemy, Vec2::new(300.0 + i as f32 * 50.0, 300.0), 0.0))
            .collect();
        (Arc::new(Snapshot::capture(&world, Vec::new())), ids)
    }

    #[test]
    fn decisions_are_sorted_by_ship() {
        let (snapshot, ids) = snapshot_with_ships(16);
        let mut registry = ControllerRegistry::new();
        for id in ids.iter().rev() {
            registry.attach(*id, Box::new(Fixed(Command::new(true, 1, false))), ControllerOrigin::Builtin);
        }
        let decisions = registry.decide_all(&snapshot);
        let decided: Vec<EntityId> = decisions.iter().map(|(id, _)| *id).collect();
        assert_eq!(decided, ids);
    }

    #[test]
    fn none_keeps_previous_command() {
        let (snapshot, ids) = snapshot_with_ships(2);
        let mut registry = ControllerRegistry::new();
        registry.attach(ids[0], Box::new(Silent), ControllerOrigin::External);
        registry.attach(ids[1], Box::new(Fixed(Command::IDLE)), ControllerOrigin::External);
        assert_eq!(registry.decide_all(&snapshot), vec![(ids[1], Command::IDLE)]);
    }

    #[test]
    fn missing_ships_are_skipped() {
        let (snapshot, _) = snapshot_with_ships(1);
        let mut registry = ControllerRegistry::new();
        registry.attach(EntityId::new(999), Box::new(Fixed(Command::IDLE)), ControllerOrigin::Builtin);
        assert!(registry.decide_all(&snapshot).is_empty());
    }

    #[test]
    fn out_of_range_rotation_is_sanitized() {
        let (snapshot, ids) = snapshot_with_ships(1);
        let mut registry = ControllerRegistry::new();
        let wild = Command {
            thrust: false,
            rotation: 9,
            fire: false,
        };
        registry.attach(ids[0], Box::new(Fixed(wild)), ControllerOrigin::Builtin);
        assert_eq!(registry.decide_all(&snapshot)[0].1.rotation, 1);
    }

    #[test]
    fn retain_by_origin() {
        let mut registry = ControllerRegistry::new();
        registry.attach(EntityId::new(1), Box::new(Silent), ControllerOrigin::Builtin);
        registry.attach(EntityId::new(2), Box::new(Silent), ControllerOrigin::External);
        registry.retain(|_, origin| origin == ControllerOrigin::External);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.name_of(EntityId::new(2)), Some("silent"));
        assert!(registry.detach(EntityId::new(2)).is_some());
        assert!(registry.is_empty());
    }
}
