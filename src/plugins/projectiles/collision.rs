use avian2d::prelude::*;
use bevy::ecs::component::Mutable;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{DamageReceiver, PooledProjectile, Projectile, ProjectileState};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn matches_mask(layers: &CollisionLayers, mask: LayerMask) -> bool {
    (layers.memberships & mask) != LayerMask::NONE
}

/// Resolve projectile overlaps.
///
/// The first overlap with anything in the hit mask ends the flight. Damage goes to the
/// hit entity's `R` when it has one; otherwise the obstacle just absorbs the shot.
pub fn process_projectile_collisions<R>(
    mut started: MessageReader<CollisionStart>,
    // Fast "is this a pooled projectile?" check
    q_is_projectile: Query<(), With<PooledProjectile>>,
    mut q_projectiles: Query<(&Projectile, &mut ProjectileState), With<PooledProjectile>>,
    q_layers: Query<&CollisionLayers, Without<PooledProjectile>>,
    mut q_receivers: Query<&mut R, Without<PooledProjectile>>,
    // Per-frame dedupe
    mut seen: Local<HashSet<Entity>>,
) where
    R: Component<Mutability = Mutable> + DamageReceiver,
{
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_projectile.contains(t1.collider);
        let p2 = q_is_projectile.contains(t2.collider);
        if !(p1 ^ p2) {
            continue; // exactly one side must be a projectile
        }
        let (projectile_side, other_side) = if p1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(projectile_side.collider) {
            continue;
        }

        let Ok((projectile, mut state)) = q_projectiles.get_mut(projectile_side.collider) else {
            continue;
        };
        if *state != ProjectileState::Active {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };
        if !matches_mask(other_layers, projectile.hit_mask) {
            continue;
        }

        if let Ok(mut receiver) = q_receivers.get_mut(other_side.gameplay_owner()) {
            receiver.take_damage(projectile.damage);
        }

        *state = ProjectileState::PendingReturn;
    }
}
