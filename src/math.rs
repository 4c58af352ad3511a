//! Small numeric helpers shared by the controllers and the camera.
//!
//! These mirror the behavior the gameplay tuning was authored against:
//! `sign` treats zero as positive, and [`smooth_damp`] is the critically
//! damped spring approximation with overshoot protection.

use glam::Vec2;

/// Sign of `value` where zero counts as positive.
#[inline]
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Angle in degrees between `normal` and the world up axis.
pub fn angle_from_up(normal: Vec2) -> f32 {
    let n = normal.normalize_or_zero();
    if n == Vec2::ZERO {
        return 0.0;
    }
    n.dot(Vec2::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Gradually moves `current` towards `target`.
///
/// `velocity` carries the spring state between calls and must be stored by
/// the caller. A non-positive `delta` leaves everything untouched.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, delta: f32) -> f32 {
    if delta <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;

    let x = omega * delta;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let goal = target;
    let target = current - change;

    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Never overshoot the target.
    if (goal - current > 0.0) == (output > goal) {
        output = goal;
        *velocity = (output - goal) / delta;
    }

    output
}

/// Velocity needed to cover `distance` in `time` under constant acceleration.
///
/// The vertical component is always made positive.
pub fn required_velocity(direction: Vec2, distance: f32, time: f32) -> Vec2 {
    if time <= 0.0 {
        return Vec2::ZERO;
    }
    let acceleration = 2.0 * distance / (time * time);
    let mut velocity = direction * (acceleration * time);
    velocity.y = velocity.y.abs();
    velocity
}
