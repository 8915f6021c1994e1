//! Flight timer: expired projectiles are marked for return.

use bevy::prelude::*;

use super::components::{PooledProjectile, Projectile, ProjectileState};

pub fn tick_projectile_lifetime(
    time: Res<Time>,
    mut q: Query<(&mut Projectile, &mut ProjectileState), With<PooledProjectile>>,
) {
    let dt = time.delta_secs();

    for (mut projectile, mut state) in &mut q {
        if *state != ProjectileState::Active {
            continue;
        }
        if projectile.tick(dt) {
            *state = ProjectileState::PendingReturn;
        }
    }
}
