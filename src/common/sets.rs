//! Fixed-step ordering for the combat loop.

use bevy::prelude::*;

/// Per-tick combat phases, chained in declaration order inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSystems {
    Targeting,
    State,
    Attack,
    Projectiles,
}
