//! Body orientation.
//!
//! Sprites face +Y, so a heading vector `d` maps to a Z rotation of `atan2(d.y, d.x) - π/2`.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::prelude::*;

use super::Player;

/// Eased turn toward a heading, restarted whenever the desired heading changes.
#[derive(Component, Debug, Default, Clone)]
pub struct FacingTween {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
    active: bool,
}

impl FacingTween {
    /// Start turning from `current` to `target` (radians) over `duration` seconds.
    ///
    /// Re-issuing the heading already being tweened keeps the running tween.
    pub fn look_toward(&mut self, current: f32, target: f32, duration: f32) {
        if self.active && angle_delta(self.to, target).abs() < 1e-3 {
            return;
        }
        self.from = current;
        self.to = target;
        self.elapsed = 0.0;
        self.duration = duration;
        self.active = true;
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Step the tween, returning the new angle while it runs.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        if !self.active {
            return None;
        }

        self.elapsed += dt;
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        if t >= 1.0 {
            self.active = false;
        }

        Some(self.from + angle_delta(self.from, self.to) * ease_out_quad(t))
    }
}

#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Signed shortest rotation from `from` to `to`, in `[-π, π)`.
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

#[inline]
pub fn heading_angle(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x) - FRAC_PI_2
}

#[inline]
pub fn heading_rotation(direction: Vec2) -> Quat {
    Quat::from_rotation_z(heading_angle(direction))
}

/// Z angle of a planar rotation.
#[inline]
pub fn rotation_angle(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::XYZ).2
}

pub(crate) fn apply_facing(
    time: Res<Time>,
    mut q: Query<(&mut FacingTween, &mut Transform), With<Player>>,
) {
    let dt = time.delta_secs();
    for (mut tween, mut tf) in &mut q {
        if let Some(angle) = tween.advance(dt) {
            tf.rotation = Quat::from_rotation_z(angle);
        }
    }
}
