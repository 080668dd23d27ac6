//! Scalar and vector helpers used by the movement state machine.
//!
//! These reproduce the rate-limited approaches the controller relies on for its
//! "feel": a linear approach that never overshoots its target, and a
//! critically-damped smoothing used when snapping onto a ladder.

use bevy::prelude::*;

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Vector form of [`move_towards`]: moves along the straight line to `target`.
#[inline]
pub fn move_towards_vec(current: Vec2, target: Vec2, max_distance: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_distance || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_distance
    }
}

/// Loose float equality, tolerant of accumulated integration error.
#[inline]
pub fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < f32::max(1e-6 * f32::max(a.abs(), b.abs()), f32::EPSILON * 8.0)
}

/// Sign that treats zero as positive.
///
/// Used for wall-press detection, where a body at rest counts as facing right.
#[inline]
pub fn sign_or_positive(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Critically-damped smoothing of `current` toward `target`.
///
/// `velocity` carries the damping state between calls and is updated in place.
/// `smooth_time` is roughly the time needed to reach the target. The result never
/// overshoots the target.
pub fn smooth_damp(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f32,
    delta_time: f32,
) -> Vec2 {
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * delta_time;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * delta_time;
    *velocity = (*velocity - temp * omega) * exp;
    let output = target + (change + temp) * exp;

    // Clamp to the target if we would pass it
    if (target - current).dot(output - target) > 0.0 {
        *velocity = Vec2::ZERO;
        return target;
    }

    output
}
