//! Return commit: recycle finished projectiles into their pool.
//!
//! The pool owns the inactive invariants (hidden, velocity 0, empty filters); this system
//! only decides *when* a projectile goes back.

use bevy::prelude::*;

use super::components::{PooledProjectile, Projectile, ProjectileState};
use super::pool::ProjectilePool;

pub fn return_to_pool_commit(
    mut commands: Commands,
    mut pool: ResMut<ProjectilePool>,
    mut q: Query<(Entity, &Projectile, &mut ProjectileState), With<PooledProjectile>>,
) {
    for (e, projectile, mut state) in &mut q {
        if *state != ProjectileState::PendingReturn {
            continue;
        }

        *state = ProjectileState::Inactive;
        pool.despawn(&mut commands, projectile.ammo, e);
    }
}
