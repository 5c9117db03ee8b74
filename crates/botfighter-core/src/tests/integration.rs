//! End-to-end scenarios driven through the public tick loop.

use std::thread;
use std::time::Duration;

use botfighter_geom::Rect;
use glam::Vec2;

use crate::command::Command;
use crate::config::{ArenaConfig, SimConfig};
use crate::controller::remote_pair;
use crate::entity::{EntityId, Team};
use crate::hash::hash_snapshot;
use crate::scoreboard::GamePhase;
use crate::sensor::{laser, radar};
use crate::simulation::Simulation;
use crate::snapshot::{GameEvent, TickEvents};

use super::helpers::{bullet_on, empty_config, first_of, open_config, run_hashes, simulation, spawn_enemy};

/// Move a ship without giving it any velocity.
fn place(sim: &mut Simulation, ship: EntityId, position: Vec2) {
    let ship = sim.world_mut().ship_mut(ship).expect("ship exists");
    ship.position = position;
    ship.previous_position = position;
    ship.velocity = Vec2::ZERO;
}

// =============================================================================
// Sensors
// =============================================================================

#[test]
fn laser_measures_distance_to_wall() {
    let mut config = empty_config();
    config.arena = ArenaConfig {
        walls: vec![Rect::new(150.0, 90.0, 50.0, 20.0)],
        ..ArenaConfig::open(1000.0, 1000.0)
    };
    let mut sim = simulation(config);
    let ship = sim
        .world_mut()
        .spawn_ship(Team::Player, Vec2::new(100.0, 100.0), 0.0);

    let snapshot = sim.step();
    let distance = laser(&snapshot, ship, 0.0, 600.0).unwrap();
    assert!((distance - 50.0).abs() < 1e-3, "laser read {distance}");

    // Facing away there is no wall, so the reading saturates.
    let behind = laser(&snapshot, ship, std::f32::consts::PI, 600.0).unwrap();
    assert!((behind - 600.0).abs() < 1e-3, "laser read {behind}");
}

#[test]
fn radar_is_blocked_by_walls() {
    let mut config = empty_config();
    config.arena = ArenaConfig {
        walls: vec![Rect::new(290.0, 0.0, 20.0, 600.0)],
        ..ArenaConfig::open(1000.0, 1000.0)
    };
    let mut sim = simulation(config);
    let player = sim
        .world_mut()
        .spawn_ship(Team::Player, Vec2::new(200.0, 300.0), 0.0);
    let hidden = spawn_enemy(&mut sim, Vec2::new(400.0, 300.0));
    let visible = spawn_enemy(&mut sim, Vec2::new(200.0, 700.0));

    let snapshot = sim.step();
    let contacts = radar(&snapshot, player, 600.0).unwrap();
    let ids: Vec<EntityId> = contacts.iter().map(|c| c.kind.id()).collect();
    assert_eq!(ids, vec![visible]);
    assert!(!ids.contains(&hidden));
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn successive_hits_reduce_health_by_ten() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    let enemy = spawn_enemy(&mut sim, Vec2::new(900.0, 900.0));
    place(&mut sim, player, Vec2::new(300.0, 300.0));

    for expected in [90, 80, 70] {
        bullet_on(&mut sim, enemy, player);
        let snapshot = sim.step();
        assert_eq!(snapshot.ship(player).unwrap().health, expected);
        assert!(snapshot.flags.contains(TickEvents::SHIP_HIT));
        assert!(snapshot.bullets.is_empty());
    }
    assert_eq!(sim.phase(), GamePhase::Running);
}

#[test]
fn firing_publishes_bullet_and_respects_cooldown() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(500.0, 500.0));
    sim.submit(player, Command::new(false, 0, true)).unwrap();

    let first = sim.step();
    assert!(first.flags.contains(TickEvents::SHOT_FIRED));
    assert_eq!(first.bullets.len(), 1);
    assert_eq!(first.bullets[0].owner_id, player);

    // The fire command persists but the cooldown holds the next shot back.
    let second = sim.step();
    assert!(!second.flags.contains(TickEvents::SHOT_FIRED));
    assert_eq!(second.bullets.len(), 1);
}

#[test]
fn enemy_kill_doubles_the_wave() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(200.0, 200.0));
    let enemy = spawn_enemy(&mut sim, Vec2::new(800.0, 800.0));
    sim.world_mut().ship_mut(enemy).unwrap().health = 10;
    bullet_on(&mut sim, player, enemy);

    let snapshot = sim.step();
    assert!(snapshot.events.contains(&GameEvent::WaveAdvanced {
        wave: 2,
        destroyed: 1,
        spawned: 2,
    }));
    assert_eq!(snapshot.kills, 1);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.wave, 2);
    assert!(!snapshot.ship(enemy).unwrap().alive);

    let fresh: Vec<EntityId> = snapshot.team(Team::Enemy).map(|ship| ship.id).collect();
    assert_eq!(fresh.len(), 2);
    for id in &fresh {
        assert_eq!(sim.controllers().name_of(*id), Some("enemy_brain"));
    }

    let next = sim.step();
    assert!(next.ship(enemy).is_none());
    assert!(sim.submit(enemy, Command::IDLE).is_err());
}

#[test]
fn enemy_count_respects_cap() {
    let mut config = open_config();
    config.spawn.max_enemies = 3;
    let mut sim = simulation(config);
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(200.0, 200.0));
    let enemy = spawn_enemy(&mut sim, Vec2::new(800.0, 800.0));
    sim.world_mut().ship_mut(enemy).unwrap().health = 10;
    bullet_on(&mut sim, player, enemy);
    sim.step();

    // Two live enemies; the next kill may only add two more to reach three.
    let target = sim.snapshot().team(Team::Enemy).next().unwrap().id;
    sim.detach_controller(target);
    sim.world_mut().ship_mut(target).unwrap().health = 10;
    bullet_on(&mut sim, player, target);

    let snapshot = sim.step();
    assert_eq!(snapshot.wave, 3);
    assert_eq!(snapshot.team(Team::Enemy).count(), 3);
}

#[test]
fn thrusting_ship_cannot_pass_through_another() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(300.0, 500.0));
    let enemy = spawn_enemy(&mut sim, Vec2::new(500.0, 500.0));
    sim.submit(player, Command::new(true, 0, false)).unwrap();

    let contact = 2.0 * sim.config().physics.ship_radius;
    let mut closest = f32::MAX;
    for _ in 0..120 {
        let snapshot = sim.step();
        let (a, b) = (snapshot.ship(player).unwrap(), snapshot.ship(enemy).unwrap());
        closest = closest.min(a.position.distance(b.position));
    }
    assert!(closest >= contact, "ships came within {closest}");
    assert!(closest < contact + 1.0, "ships never touched, closest {closest}");
}

// =============================================================================
// Coins
// =============================================================================

#[test]
fn overlapping_coin_collected_and_relocated() {
    let mut sim = simulation(empty_config());
    let player = sim.world_mut().spawn_ship(Team::Player, Vec2::ZERO, 0.0);
    let coin = sim.world_mut().spawn_coin(Vec2::ZERO);

    let snapshot = sim.step();
    assert_eq!(snapshot.score, 1);
    assert!(snapshot.coin(coin).is_none());
    assert_eq!(snapshot.coins.len(), 1);

    let reach = sim.config().physics.ship_radius + sim.config().spawn.coin_radius;
    let position = snapshot.ship(player).unwrap().position;
    assert!(snapshot.coins[0].position.distance(position) > reach);
    assert!(snapshot.flags.contains(TickEvents::COIN_COLLECTED));
}

#[test]
fn enemies_do_not_collect_coins() {
    let mut sim = simulation(empty_config());
    spawn_enemy(&mut sim, Vec2::new(500.0, 500.0));
    let coin = sim.world_mut().spawn_coin(Vec2::new(500.0, 500.0));

    let snapshot = sim.step();
    assert_eq!(snapshot.score, 0);
    assert!(snapshot.coin(coin).is_some());
}

// =============================================================================
// Game over and restart
// =============================================================================

#[test]
fn restart_after_game_over_matches_fresh_start() {
    let config = SimConfig::default().with_seed(9);
    let mut sim = simulation(config.clone());
    sim.run(30);

    let player = first_of(&sim, Team::Player);
    let shooter = first_of(&sim, Team::Enemy);
    sim.world_mut().ship_mut(player).unwrap().health = 10;
    bullet_on(&mut sim, shooter, player);
    let over = sim.step();
    assert!(over.is_game_over());
    assert!(over.flags.contains(TickEvents::GAME_OVER));

    sim.restart();
    let restarted = sim.snapshot();
    assert_eq!(restarted.tick, 0);
    assert_eq!(restarted.score, 0);
    assert_eq!(restarted.kills, 0);
    assert_eq!(restarted.wave, 1);
    assert_eq!(restarted.phase, GamePhase::Running);
    assert_eq!(restarted.player_health(), Some(100));
    assert!(restarted.events.contains(&GameEvent::Restarted));

    let mut fresh = simulation(config);
    assert_eq!(hash_snapshot(&restarted), hash_snapshot(&fresh.snapshot()));
    assert_eq!(run_hashes(&mut sim, 100), run_hashes(&mut fresh, 100));
}

#[test]
fn restart_through_input_channel() {
    let config = SimConfig::default().with_seed(4);
    let mut sim = simulation(config.clone());
    sim.run(12);

    let sender = sim.input_sender();
    sender.send_restart().unwrap();
    let snapshot = sim.step();

    let fresh = simulation(config);
    assert_eq!(hash_snapshot(&snapshot), hash_snapshot(&fresh.snapshot()));
}

// =============================================================================
// Controllers and input
// =============================================================================

#[test]
fn commands_from_another_thread_apply_next_tick() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    let sender = sim.input_sender();

    let producer = thread::spawn(move || {
        sender.send_command(player, Command::new(true, 1, false)).unwrap();
    });
    producer.join().unwrap();

    let before = sim.world().ship(player).unwrap().heading;
    sim.step();
    let ship = sim.world().ship(player).unwrap();
    assert!(ship.heading > before);
    assert!(ship.velocity.length() > 0.0);
}

#[test]
fn silent_remote_keeps_previous_command() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(500.0, 500.0));
    let (controller, endpoint) = remote_pair("silent", Duration::from_millis(10));
    sim.attach_controller(player, Box::new(controller)).unwrap();
    sim.submit(player, Command::new(true, 0, false)).unwrap();

    sim.step();
    let first = sim.world().ship(player).unwrap().velocity.length();
    sim.step();
    let second = sim.world().ship(player).unwrap().velocity.length();

    assert!(first > 0.0);
    assert!(second > first);
    assert!(endpoint.latest_request().is_some());
}

#[test]
fn remote_agent_drives_ship() {
    let mut sim = simulation(open_config());
    let player = first_of(&sim, Team::Player);
    place(&mut sim, player, Vec2::new(500.0, 500.0));
    let (controller, endpoint) = remote_pair("agent", Duration::from_secs(2));

    let agent = thread::spawn(move || {
        let mut answered = 0u32;
        while let Ok(Some(request)) = endpoint.next_request(Duration::from_secs(2)) {
            if endpoint.reply(request.tick, Command::new(false, 1, false)).is_err() {
                break;
            }
            answered += 1;
        }
        answered
    });

    sim.attach_controller(player, Box::new(controller)).unwrap();
    sim.step();
    assert!(sim.world().ship(player).unwrap().heading.abs() < f32::EPSILON);
    sim.step();
    assert!(sim.world().ship(player).unwrap().heading > 0.0);

    drop(sim);
    assert!(agent.join().unwrap() >= 2);
}
