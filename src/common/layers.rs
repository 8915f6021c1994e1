//! Physics layers shared by every plugin.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
    PlayerBullet,
}

/// Layers the target scan overlaps against.
#[inline]
pub fn hostile_mask() -> LayerMask {
    LayerMask::from(Layer::Enemy)
}

/// Layers that block line of sight.
///
/// Must contain the hostile layer: a ray that reaches nothing counts as "not visible".
#[inline]
pub fn sight_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::Enemy])
}

/// Layers a player projectile resolves a hit against.
#[inline]
pub fn player_shot_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::Enemy])
}
