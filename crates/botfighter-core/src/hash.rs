//! State hashing for determinism verification.
//!
//! Two simulations built from the same configuration and fed the same inputs
//! must publish snapshots with identical hashes. Floats are hashed by bit
//! pattern so the comparison is exact. Events and summary flags are not part
//! of the hash: they describe how a state was reached, not the state itself.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use botfighter_geom::Rect;
use glam::Vec2;

use crate::entity::{Bullet, Coin, Ship};
use crate::snapshot::Snapshot;

/// Compute a deterministic hash of a snapshot's state.
///
/// This hash includes:
/// - Tick, phase, score, kills and wave
/// - Arena bounds and walls
/// - Every ship, bullet and coin field
#[must_use]
pub fn hash_snapshot(snapshot: &Snapshot) -> u64 {
    let mut hasher = DefaultHasher::new();

    snapshot.tick.hash(&mut hasher);
    snapshot.phase.hash(&mut hasher);
    snapshot.score.hash(&mut hasher);
    snapshot.kills.hash(&mut hasher);
    snapshot.wave.hash(&mut hasher);

    hash_rect(&snapshot.bounds, &mut hasher);
    snapshot.walls.len().hash(&mut hasher);
    for wall in snapshot.walls.iter() {
        hash_rect(wall, &mut hasher);
    }

    snapshot.ships.len().hash(&mut hasher);
    for ship in &snapshot.ships {
        hash_ship(ship, &mut hasher);
    }
    snapshot.bullets.len().hash(&mut hasher);
    for bullet in &snapshot.bullets {
        hash_bullet(bullet, &mut hasher);
    }
    snapshot.coins.len().hash(&mut hasher);
    for coin in &snapshot.coins {
        hash_coin(coin, &mut hasher);
    }

    hasher.finish()
}

fn hash_vec2<H: Hasher>(v: Vec2, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_rect<H: Hasher>(rect: &Rect, hasher: &mut H) {
    rect.x.to_bits().hash(hasher);
    rect.y.to_bits().hash(hasher);
    rect.width.to_bits().hash(hasher);
    rect.height.to_bits().hash(hasher);
}

fn hash_ship<H: Hasher>(ship: &Ship, hasher: &mut H) {
    ship.id.hash(hasher);
    ship.team.hash(hasher);
    hash_vec2(ship.position, hasher);
    hash_vec2(ship.previous_position, hasher);
    hash_vec2(ship.velocity, hasher);
    ship.heading.to_bits().hash(hasher);
    ship.angular_velocity.to_bits().hash(hasher);
    ship.health.hash(hasher);
    ship.alive.hash(hasher);
    ship.last_fire_tick.hash(hasher);
    ship.destroyed_tick.hash(hasher);
}

fn hash_bullet<H: Hasher>(bullet: &Bullet, hasher: &mut H) {
    bullet.id.hash(hasher);
    bullet.owner_id.hash(hasher);
    bullet.owner_team.hash(hasher);
    hash_vec2(bullet.position, hasher);
    hash_vec2(bullet.previous_position, hasher);
    hash_vec2(bullet.velocity, hasher);
    bullet.damage.hash(hasher);
    bullet.ticks_remaining.hash(hasher);
    bullet.alive.hash(hasher);
}

fn hash_coin<H: Hasher>(coin: &Coin, hasher: &mut H) {
    coin.id.hash(hasher);
    hash_vec2(coin.position, hasher);
    coin.value.hash(hasher);
    coin.alive.hash(hasher);
}
