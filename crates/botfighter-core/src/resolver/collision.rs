//! Collision resolution.
//!
//! Runs after integration, pairwise over all entities, in a fixed order:
//!
//! 1. **Ship vs wall and ship**: push the ship's square hitbox out along the
//!    axis of least penetration and cancel the velocity component into the
//!    obstacle, so ships slide along walls. Other live ships count as
//!    obstacles too, taken at their already resolved positions in ID order.
//!    Corners may need several passes; if the ship is still inside a wall
//!    afterwards it returns to where it started the tick.
//! 2. **Bullet vs wall**: the segment a bullet swept this tick is tested
//!    against every wall, so fast bullets cannot tunnel through thin walls.
//! 3. **Bullet vs ship**: a bullet within the hit radius of a ship center
//!    damages the first such ship in ID order, never its owner.
//! 4. **Ship vs coin**: the first player ship in ID order overlapping a coin
//!    collects it.
//!
//! Entity counts are small, so there is no broad phase.

use botfighter_geom::{circles_overlap, point_in_circle, Rect, Segment};
use glam::Vec2;
use tracing::debug;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::{EntityId, Ship, Team};
use crate::snapshot::GameEvent;
use crate::world::World;

use super::{Resolver, TickContext};

/// Passes allowed for separating a ship from overlapping obstacles.
const MAX_PUSH_PASSES: usize = 4;

/// Extra distance added to each push so float rounding cannot leave a
/// residual overlap.
const SEPARATION_SKIN: f32 = 0.01;

/// Separate a ship from every wall and every rect in `ships` it overlaps.
///
/// Only walls are hard: returns `false` if the ship is still inside a wall
/// after separation, in which case it goes back to its position from the
/// start of the tick with zero velocity.
pub fn push_out(ship: &mut Ship, arena: &Arena, ships: &[Rect], radius: f32) -> bool {
    for _ in 0..MAX_PUSH_PASSES {
        let mut moved = false;
        for obstacle in arena.walls().iter().chain(ships) {
            let Some(push) = ship.bounding_box(radius).penetration(obstacle) else {
                continue;
            };
            let normal = push.normalize_or_zero();
            ship.position += push + normal * SEPARATION_SKIN;
            let inward = ship.velocity.dot(normal);
            if inward < 0.0 {
                ship.velocity -= normal * inward;
            }
            moved = true;
        }
        if !moved {
            break;
        }
    }

    let (position, velocity) = arena.clamp(ship.position, ship.velocity);
    ship.position = position;
    ship.velocity = velocity;

    if arena.rect_blocked(&ship.bounding_box(radius)) {
        debug!(ship = %ship.id, "wedged between walls, reverting move");
        ship.position = ship.previous_position;
        ship.velocity = Vec2::ZERO;
        return false;
    }
    true
}

/// Resolver for all contact between entities and walls.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    ship_radius: f32,
    bullet_hit_radius: f32,
    coin_radius: f32,
    friendly_fire: bool,
}

impl CollisionResolver {
    /// Creates a collision resolver from the physics and spawn settings.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            ship_radius: config.physics.ship_radius,
            bullet_hit_radius: config.physics.bullet_hit_radius,
            coin_radius: config.spawn.coin_radius,
            friendly_fire: config.physics.friendly_fire,
        }
    }

    fn resolve_ship_contacts(&self, world: &mut World) {
        let arena = world.arena().clone();
        let live: Vec<EntityId> = world.ships().filter(|ship| ship.alive).map(|ship| ship.id).collect();
        for id in live {
            let others: Vec<Rect> = world
                .ships()
                .filter(|other| other.alive && other.id != id)
                .map(|other| other.bounding_box(self.ship_radius))
                .collect();
            if let Some(ship) = world.ship_mut(id) {
                push_out(ship, &arena, &others, self.ship_radius);
            }
        }
    }

    fn resolve_bullet_walls(world: &mut World) {
        let arena = world.arena().clone();
        for bullet in world.bullets_mut().filter(|bullet| bullet.alive) {
            let swept = Segment::new(bullet.previous_position, bullet.position);
            if arena.walls().iter().any(|wall| swept.intersects_rect(wall)) {
                bullet.alive = false;
            }
        }
    }

    fn resolve_bullet_hits(&self, tick: u64, world: &mut World, events: &mut Vec<GameEvent>) {
        let mut player_kills = 0;
        let (ships, bullets) = world.ships_and_bullets_mut();

        for bullet in bullets.values_mut().filter(|bullet| bullet.alive) {
            let target = ships.values_mut().find(|ship| {
                ship.alive
                    && ship.id != bullet.owner_id
                    && (self.friendly_fire || ship.team != bullet.owner_team)
                    && point_in_circle(bullet.position, ship.position, self.bullet_hit_radius)
            });
            let Some(ship) = target else {
                continue;
            };

            bullet.alive = false;
            let destroyed = ship.apply_damage(bullet.damage, tick);
            debug!(ship = %ship.id, bullet = %bullet.id, health = ship.health, "ship hit");
            events.push(GameEvent::ShipHit {
                ship: ship.id,
                bullet: bullet.id,
                owner: bullet.owner_id,
                health: ship.health,
            });

            if destroyed {
                debug!(ship = %ship.id, team = %ship.team, killer = %bullet.owner_id, "ship destroyed");
                events.push(GameEvent::ShipDestroyed {
                    ship: ship.id,
                    team: ship.team,
                    killer: bullet.owner_id,
                });
                if ship.team == Team::Enemy && bullet.owner_team == Team::Player {
                    player_kills += 1;
                }
            }
        }

        for _ in 0..player_kills {
            world.scoreboard_mut().record_kill();
        }
    }

    fn resolve_coin_pickups(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        let mut collected = Vec::new();
        let (ships, coins) = world.ships_and_coins_mut();

        for coin in coins.values_mut().filter(|coin| coin.alive) {
            let collector = ships.values().find(|ship| {
                ship.alive
                    && ship.team == Team::Player
                    && circles_overlap(ship.position, self.ship_radius, coin.position, self.coin_radius)
            });
            if let Some(ship) = collector {
                coin.alive = false;
                debug!(coin = %coin.id, ship = %ship.id, "coin collected");
                events.push(GameEvent::CoinCollected {
                    coin: coin.id,
                    ship: ship.id,
                    value: coin.value,
                });
                collected.push(coin.value);
            }
        }

        for value in collected {
            world.scoreboard_mut().collect_coin(value);
        }
    }
}

impl Resolver for CollisionResolver {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn resolve(&self, ctx: &TickContext<'_>, world: &mut World, events: &mut Vec<GameEvent>) {
        self.resolve_ship_contacts(world);
        Self::resolve_bullet_walls(world);
        self.resolve_bullet_hits(ctx.tick, world, events);
        self.resolve_coin_pickups(world, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuffer;
    use crate::config::ArenaConfig;
    use crate::entity::BULLET_DAMAGE;
    use botfighter_geom::Rect;

    fn config_with_walls(walls: Vec<Rect>) -> SimConfig {
        let mut config = SimConfig::default();
        config.arena = ArenaConfig {
            width: 1000.0,
            height: 1000.0,
            walls,
        };
        config
    }

    fn run(resolver: &CollisionResolver, world: &mut World, tick: u64) -> Vec<GameEvent> {
        let commands = CommandBuffer::new();
        let mut events = Vec::new();
        resolver.resolve(&TickContext { tick, commands: &commands }, world, &mut events);
        events
    }

    mod ship_walls {
        use super::*;

        #[test]
        fn ship_slides_along_wall() {
            let wall = Rect::new(500.0, 0.0, 20.0, 1000.0);
            let config = config_with_walls(vec![wall]);
            let mut world = World::new(&config);
            let id = world.spawn_ship(Team::Player, Vec2::new(495.0, 300.0), 0.0);
            {
                let ship = world.ship_mut(id).unwrap();
                ship.previous_position = Vec2::new(488.0, 297.0);
                ship.velocity = Vec2::new(120.0, 60.0);
            }
            run(&CollisionResolver::new(&config), &mut world, 1);

            let ship = world.ship(id).unwrap();
            assert!(ship.position.x <= 490.0);
            assert_eq!(ship.position.y, 300.0);
            assert_eq!(ship.velocity.x, 0.0);
            assert_eq!(ship.velocity.y, 60.0);
            assert!(!ship.bounding_box(10.0).intersects_rect(&wall));
        }

        #[test]
        fn velocity_away_from_wall_is_kept() {
            let wall = Rect::new(500.0, 0.0, 20.0, 1000.0);
            let config = config_with_walls(vec![wall]);
            let mut world = World::new(&config);
            let id = world.spawn_ship(Team::Player, Vec2::new(495.0, 300.0), 0.0);
            world.ship_mut(id).unwrap().velocity = Vec2::new(-50.0, 0.0);
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(id).unwrap().velocity.x, -50.0);
        }

        #[test]
        fn corner_resolves_both_axes() {
            let walls = vec![
                Rect::new(500.0, 0.0, 20.0, 520.0),
                Rect::new(0.0, 500.0, 520.0, 20.0),
            ];
            let config = config_with_walls(walls.clone());
            let mut world = World::new(&config);
            let id = world.spawn_ship(Team::Player, Vec2::new(494.0, 494.0), 0.0);
            world.ship_mut(id).unwrap().previous_position = Vec2::new(480.0, 480.0);
            run(&CollisionResolver::new(&config), &mut world, 1);

            let bbox = world.ship(id).unwrap().bounding_box(10.0);
            assert!(walls.iter().all(|w| !bbox.intersects_rect(w)));
        }

        #[test]
        fn wedged_ship_reverts() {
            // Gap narrower than the hitbox
            let walls = vec![
                Rect::new(480.0, 0.0, 15.0, 1000.0),
                Rect::new(505.0, 0.0, 15.0, 1000.0),
            ];
            let config = config_with_walls(walls);
            let mut world = World::new(&config);
            let id = world.spawn_ship(Team::Player, Vec2::new(500.0, 300.0), 0.0);
            {
                let ship = world.ship_mut(id).unwrap();
                ship.previous_position = Vec2::new(300.0, 300.0);
                ship.velocity = Vec2::new(100.0, 0.0);
            }
            run(&CollisionResolver::new(&config), &mut world, 1);

            let ship = world.ship(id).unwrap();
            assert_eq!(ship.position, Vec2::new(300.0, 300.0));
            assert_eq!(ship.velocity, Vec2::ZERO);
        }
    }

    mod ship_contacts {
        use super::*;

        #[test]
        fn overlapping_ships_are_pushed_apart() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let mover = world.spawn_ship(Team::Player, Vec2::new(488.0, 300.0), 0.0);
            let idle = world.spawn_ship(Team::Enemy, Vec2::new(500.0, 300.0), 0.0);
            {
                let ship = world.ship_mut(mover).unwrap();
                ship.previous_position = Vec2::new(480.0, 300.0);
                ship.velocity = Vec2::new(120.0, 30.0);
            }
            run(&CollisionResolver::new(&config), &mut world, 1);

            let (a, b) = (world.ship(mover).unwrap(), world.ship(idle).unwrap());
            assert!(!a.bounding_box(10.0).intersects_rect(&b.bounding_box(10.0)));
            assert_eq!(b.position, Vec2::new(500.0, 300.0));
            assert_eq!(a.velocity, Vec2::new(0.0, 30.0));
        }

        #[test]
        fn stacked_ships_separate() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let ids: Vec<_> = (0..3)
                .map(|_| world.spawn_ship(Team::Enemy, Vec2::new(500.0, 500.0), 0.0))
                .collect();
            run(&CollisionResolver::new(&config), &mut world, 1);

            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    let a = world.ship(*a).unwrap().bounding_box(10.0);
                    let b = world.ship(*b).unwrap().bounding_box(10.0);
                    assert!(!a.intersects_rect(&b));
                }
            }
        }

        #[test]
        fn ship_contact_never_pushes_into_wall() {
            let wall = Rect::new(500.0, 0.0, 20.0, 1000.0);
            let config = config_with_walls(vec![wall]);
            let mut world = World::new(&config);
            let pinned = world.spawn_ship(Team::Player, Vec2::new(489.0, 300.0), 0.0);
            world.ship_mut(pinned).unwrap().previous_position = Vec2::new(470.0, 300.0);
            world.spawn_ship(Team::Enemy, Vec2::new(475.0, 300.0), 0.0);
            run(&CollisionResolver::new(&config), &mut world, 1);

            for ship in world.ships() {
                assert!(!ship.bounding_box(10.0).intersects_rect(&wall));
            }
        }

        #[test]
        fn dead_ships_are_not_obstacles() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let live = world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
            let dead = world.spawn_ship(Team::Enemy, Vec2::new(305.0, 300.0), 0.0);
            world.ship_mut(dead).unwrap().apply_damage(100, 0);
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(live).unwrap().position, Vec2::new(300.0, 300.0));
        }
    }

    mod bullets {
        use super::*;

        #[test]
        fn swept_bullet_stops_at_thin_wall() {
            let config = config_with_walls(vec![Rect::new(500.0, 0.0, 2.0, 1000.0)]);
            let mut world = World::new(&config);
            let owner = world.spawn_ship(Team::Player, Vec2::new(100.0, 100.0), 0.0);
            let bullet = world
                .spawn_bullet(owner, Vec2::new(490.0, 300.0), Vec2::new(510.0, 300.0), Vec2::X, 10)
                .unwrap();
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert!(!world.bullet(bullet).unwrap().alive);
        }

        #[test]
        fn bullet_damages_ship_by_exactly_ten() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let shooter = world.spawn_ship(Team::Enemy, Vec2::new(100.0, 100.0), 0.0);
            let target = world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
            let bullet = world
                .spawn_bullet(shooter, Vec2::new(290.0, 300.0), Vec2::new(295.0, 300.0), Vec2::X, 10)
                .unwrap();

            let events = run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(target).unwrap().health, 100 - BULLET_DAMAGE);
            assert!(!world.bullet(bullet).unwrap().alive);
            assert_eq!(
                events,
                vec![GameEvent::ShipHit {
                    ship: target,
                    bullet,
                    owner: shooter,
                    health: 90
                }]
            );
        }

        #[test]
        fn owner_is_never_hit() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let shooter = world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
            let bullet = world
                .spawn_bullet(shooter, Vec2::new(300.0, 300.0), Vec2::new(305.0, 300.0), Vec2::X, 10)
                .unwrap();
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(shooter).unwrap().health, 100);
            assert!(world.bullet(bullet).unwrap().alive);
        }

        #[test]
        fn one_bullet_hits_only_first_ship_in_id_order() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let shooter = world.spawn_ship(Team::Player, Vec2::new(100.0, 100.0), 0.0);
            let first = world.spawn_ship(Team::Enemy, Vec2::new(300.0, 300.0), 0.0);
            let second = world.spawn_ship(Team::Enemy, Vec2::new(320.0, 300.0), 0.0);
            world
                .spawn_bullet(shooter, Vec2::new(308.0, 300.0), Vec2::new(310.0, 300.0), Vec2::X, 10)
                .unwrap();
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(first).unwrap().health, 90);
            assert_eq!(world.ship(second).unwrap().health, 100);
        }

        #[test]
        fn friendly_fire_can_be_disabled() {
            let mut config = config_with_walls(Vec::new());
            config.physics.friendly_fire = false;
            let mut world = World::new(&config);
            let shooter = world.spawn_ship(Team::Enemy, Vec2::new(100.0, 100.0), 0.0);
            let ally = world.spawn_ship(Team::Enemy, Vec2::new(300.0, 300.0), 0.0);
            world
                .spawn_bullet(shooter, Vec2::new(300.0, 300.0), Vec2::new(300.0, 300.0), Vec2::X, 10)
                .unwrap();
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.ship(ally).unwrap().health, 100);
        }

        #[test]
        fn lethal_hit_marks_destroyed_and_counts_kill() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let shooter = world.spawn_ship(Team::Player, Vec2::new(100.0, 100.0), 0.0);
            let enemy = world.spawn_ship(Team::Enemy, Vec2::new(300.0, 300.0), 0.0);
            world.ship_mut(enemy).unwrap().health = 10;
            world
                .spawn_bullet(shooter, Vec2::new(300.0, 300.0), Vec2::new(300.0, 300.0), Vec2::X, 10)
                .unwrap();

            let events = run(&CollisionResolver::new(&config), &mut world, 7);
            let ship = world.ship(enemy).unwrap();
            assert!(!ship.alive);
            assert_eq!(ship.health, 0);
            assert_eq!(ship.destroyed_tick, Some(7));
            assert_eq!(world.scoreboard().kills(), 1);
            assert!(events.contains(&GameEvent::ShipDestroyed {
                ship: enemy,
                team: Team::Enemy,
                killer: shooter
            }));
        }
    }

    mod coins {
        use super::*;

        #[test]
        fn first_player_ship_collects_once() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            let first = world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
            let _second = world.spawn_ship(Team::Player, Vec2::new(320.0, 300.0), 0.0);
            let coin = world.spawn_coin(Vec2::new(310.0, 300.0));

            let events = run(&CollisionResolver::new(&config), &mut world, 1);
            assert_eq!(world.scoreboard().score(), 1);
            assert!(!world.coin(coin).unwrap().alive);
            assert_eq!(
                events,
                vec![GameEvent::CoinCollected {
                    coin,
                    ship: first,
                    value: 1
                }]
            );
        }

        #[test]
        fn enemies_do_not_collect() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            world.spawn_ship(Team::Enemy, Vec2::new(300.0, 300.0), 0.0);
            let coin = world.spawn_coin(Vec2::new(300.0, 300.0));
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert!(world.coin(coin).unwrap().alive);
            assert_eq!(world.scoreboard().score(), 0);
        }

        #[test]
        fn distant_coin_is_untouched() {
            let config = config_with_walls(Vec::new());
            let mut world = World::new(&config);
            world.spawn_ship(Team::Player, Vec2::new(300.0, 300.0), 0.0);
            let coin = world.spawn_coin(Vec2::new(321.0, 300.0));
            run(&CollisionResolver::new(&config), &mut world, 1);
            assert!(world.coin(coin).unwrap().alive);
        }
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let config = config_with_walls(Vec::new());
        let mut world = World::new(&config);
        assert!(world.ship(EntityId::new(5)).is_none());
        assert!(run(&CollisionResolver::new(&config), &mut world, 1).is_empty());
    }
}
