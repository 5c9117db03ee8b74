//! Angle helpers.
//!
//! Headings are absolute angles wrapped to `[0, 2π)`. Bearings are relative
//! angles in `(-π, π]`: `0` is dead ahead, positive values are clockwise on
//! screen (toward `+y` when facing `+x`).

use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Wrap an angle into `[0, 2π)`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Normalize an angle into `(-π, π]`.
#[must_use]
pub fn signed_angle(angle: f32) -> f32 {
    let wrapped = wrap_angle(angle);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Unit vector pointing along `angle`.
#[must_use]
pub fn heading_vector(angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos, sin)
}

/// Bearing of `target` as seen from `origin` facing `heading`.
///
/// Returns `0.0` when the points coincide.
#[must_use]
pub fn bearing_to(origin: Vec2, heading: f32, target: Vec2) -> f32 {
    let delta = target - origin;
    if delta == Vec2::ZERO {
        return 0.0;
    }
    signed_angle(delta.y.atan2(delta.x) - heading)
}
