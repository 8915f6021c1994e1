use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::kinds::AmmoType;
use crate::common::layers::player_shot_mask;
use crate::common::tunables::AmmoProfile;

/// Marker for entities owned by the projectile pool.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledProjectile;

/// Pool lifecycle.
///
/// - Inactive: parked in the pool (hidden, still, collides with nothing)
/// - Active: in flight
/// - PendingReturn: expired or hit; the commit system hands it back to the pool
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub ammo: AmmoType,
    pub damage: i32,
    pub hit_mask: LayerMask,
    pub elapsed: f32,
    pub life_time: f32,
}

impl Projectile {
    /// Fresh instance of an ammo type, elapsed reset to zero.
    pub fn from_profile(ammo: AmmoType, profile: &AmmoProfile) -> Self {
        Self {
            ammo,
            damage: profile.damage,
            hit_mask: player_shot_mask(),
            elapsed: 0.0,
            life_time: profile.life_time,
        }
    }

    /// Advance the flight timer, returning whether the projectile has expired.
    #[inline]
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.is_expired()
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.life_time
    }
}

/// Something a projectile can hurt.
pub trait DamageReceiver {
    fn take_damage(&mut self, amount: i32);
}
