//! Targeting plugin: nearest visible hostile + aim rotation.
//!
//! ```text
//! FixedUpdate / CombatSystems::Targeting
//!   scan_targets   TargetTracker::update over PhysicsOracle + Hostiles -> TargetEvent
//!   aim_at_target  slerp the actor toward the held target
//! ```
//!
//! The pure selection logic lives in `tracker` and `visibility` behind the
//! `SpatialOracle` / `TargetRegistry` traits. This module only adapts Avian and the ECS
//! to those traits.

pub mod tracker;
pub mod visibility;

use avian2d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::common::{sets::CombatSystems, state::GameState, tunables::Tunables};
use crate::plugins::enemies::{Enemy, Health, PendingDespawn};
use crate::plugins::player::Player;
use crate::plugins::player::facing::{FacingTween, heading_rotation};

use tracker::{CandidateProbe, ScanSettings, TargetChange, TargetRegistry, TargetTracker};
use visibility::{RayContact, SpatialOracle};

/// Target acquisition stream. For one actor and tick, `Lost` is written before `Acquired`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetEvent {
    Acquired { actor: Entity, target: Entity },
    Lost { actor: Entity, target: Entity },
}

impl TargetEvent {
    pub fn from_change(actor: Entity, change: TargetChange) -> Self {
        match change {
            TargetChange::Acquired(target) => TargetEvent::Acquired { actor, target },
            TargetChange::Lost(target) => TargetEvent::Lost { actor, target },
        }
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<TargetEvent>();
    app.add_systems(
        FixedUpdate,
        (scan_targets, aim_at_target)
            .chain()
            .in_set(CombatSystems::Targeting)
            .run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Collaborator adapters
// -----------------------------------------------------------------------------

/// `SpatialOracle` over Avian's spatial queries.
///
/// Colliders are reported as their owning body, so child colliders of one hostile count
/// as one candidate.
#[derive(SystemParam)]
pub struct PhysicsOracle<'w, 's> {
    spatial: SpatialQuery<'w, 's>,
    colliders: Query<'w, 's, &'static ColliderOf>,
    parents: Query<'w, 's, &'static ChildOf>,
}

impl PhysicsOracle<'_, '_> {
    #[inline]
    fn body_of(&self, collider: Entity) -> Entity {
        self.colliders
            .get(collider)
            .map(|c| c.body)
            .unwrap_or(collider)
    }
}

impl SpatialOracle for PhysicsOracle<'_, '_> {
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<Entity> {
        let filter = SpatialQueryFilter::from_mask(mask);
        let hits = self
            .spatial
            .shape_intersections(&Collider::circle(radius), center, 0.0, &filter);

        let mut bodies: Vec<Entity> = Vec::with_capacity(hits.len());
        for body in hits.into_iter().map(|c| self.body_of(c)) {
            if !bodies.contains(&body) {
                bodies.push(body);
            }
        }
        bodies
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayContact> {
        let filter = SpatialQueryFilter::from_mask(mask);
        self.spatial
            .cast_ray(origin, direction, max_distance, true, &filter)
            .map(|hit| RayContact {
                entity: hit.entity,
                point: origin + *direction * hit.distance,
            })
    }

    fn parent_of(&self, entity: Entity) -> Option<Entity> {
        if let Ok(child_of) = self.parents.get(entity) {
            return Some(child_of.parent());
        }
        self.colliders
            .get(entity)
            .ok()
            .map(|c| c.body)
            .filter(|body| *body != entity)
    }
}

type HostileData = (
    &'static Transform,
    Option<&'static ColliderAabb>,
    &'static Health,
    Option<&'static Visibility>,
    Has<PendingDespawn>,
);

/// `TargetRegistry` over the hostile entities.
#[derive(SystemParam)]
pub struct Hostiles<'w, 's> {
    query: Query<'w, 's, HostileData, (With<Enemy>, Without<Player>)>,
}

impl TargetRegistry for Hostiles<'_, '_> {
    fn probe(&self, entity: Entity) -> Option<CandidateProbe> {
        let (tf, aabb, health, visibility, pending_despawn) = self.query.get(entity).ok()?;
        let position = tf.translation.truncate();

        Some(CandidateProbe {
            position,
            bounds_center: aabb.map_or(position, |b| (b.min + b.max) * 0.5),
            is_active: !pending_despawn && visibility.is_none_or(|v| *v != Visibility::Hidden),
            is_dead: health.is_dead(),
        })
    }
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

pub(crate) fn scan_targets(
    time: Res<Time>,
    tunables: Res<Tunables>,
    oracle: PhysicsOracle,
    hostiles: Hostiles,
    mut q_actor: Query<(Entity, &Transform, &mut TargetTracker), With<Player>>,
    mut events: MessageWriter<TargetEvent>,
) {
    let now = time.elapsed_secs();
    let settings = ScanSettings::from_tunables(&tunables.targeting);

    for (actor, tf, mut tracker) in &mut q_actor {
        let update = tracker.update(now, tf.translation.truncate(), &settings, &oracle, &hostiles);
        for change in update.changes() {
            debug!("{actor:?} target change: {change:?}");
            events.write(TargetEvent::from_change(actor, change));
        }
    }
}

/// Rotate the actor toward its held target. Holds priority over movement facing.
pub(crate) fn aim_at_target(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut q_actor: Query<(&TargetTracker, &mut Transform, &mut FacingTween), With<Player>>,
    q_targets: Query<&Transform, (With<Enemy>, Without<Player>)>,
) {
    let t = (time.delta_secs() * tunables.targeting.aim_turn_rate).clamp(0.0, 1.0);

    for (tracker, mut tf, mut tween) in &mut q_actor {
        let Some(target) = tracker.current() else {
            continue;
        };
        let Ok(target_tf) = q_targets.get(target) else {
            continue;
        };

        let to_target = (target_tf.translation - tf.translation).truncate();
        if to_target.length_squared() <= f32::EPSILON {
            continue;
        }

        tween.cancel();
        tf.rotation = tf.rotation.slerp(heading_rotation(to_target), t);
    }
}

#[cfg(test)]
mod tests;
