//! Line-of-sight resolution.
//!
//! A ray that reaches nothing is *not* a clear line: nothing on the target's layer was
//! confirmed. The obstruction mask therefore always includes the hostile layer, otherwise
//! no target is ever seen.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;

/// Bound on parent hops when matching a ray hit against a target hierarchy.
const MAX_HIERARCHY_DEPTH: usize = 32;

/// First thing a ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayContact {
    pub entity: Entity,
    pub point: Vec2,
}

/// Spatial collaborator used by targeting.
pub trait SpatialOracle {
    /// Gameplay entities whose colliders overlap the circle, in scan order, each once.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<Entity>;

    /// Nearest hit along `direction` within `max_distance`.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayContact>;

    fn parent_of(&self, entity: Entity) -> Option<Entity>;
}

/// `entity` is `ancestor` or sits somewhere below it.
pub fn is_same_or_descendant<S: SpatialOracle + ?Sized>(
    oracle: &S,
    entity: Entity,
    ancestor: Entity,
) -> bool {
    let mut current = entity;
    for _ in 0..MAX_HIERARCHY_DEPTH {
        if current == ancestor {
            return true;
        }
        match oracle.parent_of(current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// Whether `target` can be seen from `eye` when looking at `target_center`.
pub fn is_visible<S: SpatialOracle + ?Sized>(
    oracle: &S,
    eye: Vec2,
    target: Entity,
    target_center: Vec2,
    mask: LayerMask,
) -> bool {
    let offset = target_center - eye;
    let Ok(direction) = Dir2::new(offset) else {
        return false;
    };

    oracle
        .raycast(eye, direction, offset.length(), mask)
        .is_some_and(|hit| is_same_or_descendant(oracle, hit.entity, target))
}
