//! Per-ammo projectile pools.
//!
//! Pooled entities are never structurally toggled. Deactivation rewrites component values:
//! hidden, zero velocity, empty collision filters. Ownership is tracked per entry, so an
//! entity is either available or in flight in exactly one pool.

use std::collections::{HashMap, HashSet};

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{PooledProjectile, Projectile, ProjectileState};
use crate::common::kinds::AmmoType;
use crate::common::layers::{Layer, player_shot_mask};
use crate::common::tunables::{AmmoProfile, Tunables};

const PROJECTILE_Z: f32 = 2.0;

#[inline]
pub fn active_projectile_layers(hit_mask: LayerMask) -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, hit_mask)
}

/// Empty filters: an inactive projectile collides with nothing.
#[inline]
pub fn inactive_projectile_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [] as [Layer; 0])
}

#[derive(Debug)]
pub struct PoolEntry {
    profile: AmmoProfile,
    available: Vec<Entity>,
    in_flight: HashSet<Entity>,
    capacity: usize,
}

impl PoolEntry {
    fn new(profile: AmmoProfile) -> Self {
        let capacity = profile.pool_size;
        Self {
            profile,
            available: Vec::with_capacity(capacity),
            in_flight: HashSet::new(),
            capacity,
        }
    }

    pub fn profile(&self) -> &AmmoProfile {
        &self.profile
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn total_count(&self) -> usize {
        self.available.len() + self.in_flight.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn owns(&self, entity: Entity) -> bool {
        self.in_flight.contains(&entity) || self.available.contains(&entity)
    }

    fn forget(&mut self, entity: Entity) {
        self.in_flight.remove(&entity);
        self.available.retain(|e| *e != entity);
    }
}

/// What `ProjectilePool::despawn` did with the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DespawnOutcome {
    Recycled,
    /// Already back in its pool; nothing changed.
    AlreadyAvailable,
    /// Not returnable to the named pool; the entity was destroyed.
    Discarded,
}

#[derive(Resource, Debug, Default)]
pub struct ProjectilePool {
    entries: HashMap<AmmoType, PoolEntry>,
}

impl ProjectilePool {
    pub fn from_profiles(profiles: &HashMap<AmmoType, AmmoProfile>) -> Self {
        let mut pool = Self::default();
        for (ammo, profile) in profiles {
            pool.register(*ammo, profile.clone());
        }
        pool
    }

    /// Register (or re-template) the pool for `ammo`.
    pub fn register(&mut self, ammo: AmmoType, profile: AmmoProfile) {
        match self.entries.get_mut(&ammo) {
            Some(entry) => {
                entry.capacity = profile.pool_size;
                entry.profile = profile;
            }
            None => {
                self.entries.insert(ammo, PoolEntry::new(profile));
            }
        }
    }

    pub fn entry(&self, ammo: AmmoType) -> Option<&PoolEntry> {
        self.entries.get(&ammo)
    }

    pub fn profile(&self, ammo: AmmoType) -> Option<&AmmoProfile> {
        self.entries.get(&ammo).map(PoolEntry::profile)
    }

    pub fn available_count(&self, ammo: AmmoType) -> usize {
        self.entry(ammo).map_or(0, PoolEntry::available_count)
    }

    pub fn total_count(&self, ammo: AmmoType) -> usize {
        self.entry(ammo).map_or(0, PoolEntry::total_count)
    }

    pub fn capacity(&self, ammo: AmmoType) -> usize {
        self.entry(ammo).map_or(0, PoolEntry::capacity)
    }

    /// Fill every pool up to its configured capacity with inactive instances.
    pub fn prewarm(&mut self, commands: &mut Commands) {
        for (ammo, entry) in self.entries.iter_mut() {
            while entry.total_count() < entry.capacity {
                let e = spawn_inactive(commands, *ammo, &entry.profile);
                entry.available.push(e);
            }
            debug!("pre-warmed {} {ammo:?} projectiles", entry.capacity);
        }
    }

    /// Hand out an instance of `ammo`, placed and activated.
    ///
    /// An empty pool grows by one. Returns `None` only when `ammo` has no pool.
    pub fn spawn(
        &mut self,
        commands: &mut Commands,
        ammo: AmmoType,
        position: Vec2,
        rotation: Quat,
    ) -> Option<Entity> {
        let Some(entry) = self.entries.get_mut(&ammo) else {
            warn!("no projectile pool registered for {ammo:?}");
            return None;
        };

        let e = match entry.available.pop() {
            Some(e) => e,
            None => {
                let e = spawn_inactive(commands, ammo, &entry.profile);
                if entry.total_count() >= entry.capacity {
                    debug!(
                        "{ammo:?} pool grew past capacity {} (now {})",
                        entry.capacity,
                        entry.total_count() + 1
                    );
                }
                e
            }
        };
        entry.in_flight.insert(e);

        commands.entity(e).insert((
            ProjectileState::Active,
            Projectile::from_profile(ammo, &entry.profile),
            Transform::from_translation(position.extend(PROJECTILE_Z)).with_rotation(rotation),
            Visibility::Visible,
            active_projectile_layers(player_shot_mask()),
        ));

        Some(e)
    }

    /// Return `entity` to the `ammo` pool.
    ///
    /// Returning what is already available is ignored. An entity the `ammo` pool does not
    /// own, or an `ammo` with no pool, is destroyed and forgotten everywhere.
    pub fn despawn(
        &mut self,
        commands: &mut Commands,
        ammo: AmmoType,
        entity: Entity,
    ) -> DespawnOutcome {
        if let Some(entry) = self.entries.get_mut(&ammo) {
            if entry.in_flight.remove(&entity) {
                entry.available.push(entity);
                commands.entity(entity).insert((
                    ProjectileState::Inactive,
                    Visibility::Hidden,
                    LinearVelocity::ZERO,
                    inactive_projectile_layers(),
                ));
                return DespawnOutcome::Recycled;
            }
            if entry.available.contains(&entity) {
                debug!("{entity:?} returned to the {ammo:?} pool twice; ignoring");
                return DespawnOutcome::AlreadyAvailable;
            }
            warn!("{entity:?} returned as {ammo:?} but belongs to another pool; discarding");
        } else {
            warn!("no projectile pool registered for {ammo:?}; discarding {entity:?}");
        }

        for entry in self.entries.values_mut().filter(|e| e.owns(entity)) {
            entry.forget(entity);
        }
        commands.entity(entity).despawn();
        DespawnOutcome::Discarded
    }
}

/// Per-shot overrides applied right after `ProjectilePool::spawn`.
#[derive(Clone, Copy, Debug)]
pub struct ShotConfig {
    pub ammo: AmmoType,
    pub damage: i32,
    pub hit_mask: LayerMask,
    pub velocity: Vec2,
    pub life_time: f32,
}

pub fn configure_shot(commands: &mut Commands, projectile: Entity, shot: ShotConfig) {
    commands.entity(projectile).insert((
        Projectile {
            ammo: shot.ammo,
            damage: shot.damage,
            hit_mask: shot.hit_mask,
            elapsed: 0.0,
            life_time: shot.life_time,
        },
        LinearVelocity(shot.velocity),
        active_projectile_layers(shot.hit_mask),
    ));
}

fn spawn_inactive(commands: &mut Commands, ammo: AmmoType, profile: &AmmoProfile) -> Entity {
    let [r, g, b] = profile.color;
    commands
        .spawn((
            Name::new(format!("Projectile({ammo:?})")),
            PooledProjectile,
            ProjectileState::Inactive,
            Projectile::from_profile(ammo, profile),
            Sprite {
                color: Color::srgb(r, g, b),
                custom_size: Some(Vec2::splat(profile.radius * 2.0)),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, PROJECTILE_Z),
            Visibility::Hidden,
            (
                RigidBody::Dynamic,
                Collider::circle(profile.radius),
                Sensor,
                Mass(1.0),
                LockedAxes::ROTATION_LOCKED,
                inactive_projectile_layers(),
                LinearVelocity::ZERO,
                // Inactive projectiles have empty filters, so this never fires for them.
                CollisionEventsEnabled,
            ),
        ))
        .id()
}

/// Build the pools from tunables and pre-spawn every configured instance.
pub fn init_projectile_pool(mut commands: Commands, tunables: Res<Tunables>) {
    let mut pool = ProjectilePool::from_profiles(&tunables.ammo);
    pool.prewarm(&mut commands);
    commands.insert_resource(pool);
}
