//! Projectiles plugin: pooled shots, flight lifetime, impact resolution.
//!
//! # Data flow
//! ```text
//! Startup
//!   init_projectile_pool      build one pool per ammo type, pre-spawn inactive instances
//!
//! FixedUpdate / CombatSystems::Attack (attack plugin)
//!   ProjectilePool::spawn     pop or grow, activate, place
//!   configure_shot            damage, hit mask, velocity
//!
//! FixedUpdate / CombatSystems::Projectiles
//!   tick_projectile_lifetime  elapsed += dt; expired -> PendingReturn
//!
//! FixedPostUpdate (after Avian emits CollisionStart)
//!   process_projectile_collisions::<Health>   first qualifying hit -> damage, PendingReturn
//!   return_to_pool_commit                     PendingReturn -> ProjectilePool::despawn
//! ```
//!
//! The pool is the only writer of its collections. Producers get an entity back from
//! `spawn` and never touch the free lists.
//!
//! # Lifecycle
//! `ProjectileState` is an explicit enum (Inactive / Active / PendingReturn). Collisions
//! and expiry only ever move Active -> PendingReturn; the commit is the single place a
//! projectile becomes Inactive again.

pub mod collision;
pub mod commit;
pub mod components;
pub mod lifetime;
pub mod pool;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::{sets::CombatSystems, state::GameState};
use crate::plugins::enemies::Health;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<pool::ProjectilePool>()
            .add_systems(Startup, pool::init_projectile_pool);

        app.add_systems(
            FixedUpdate,
            lifetime::tick_projectile_lifetime
                .in_set(CombatSystems::Projectiles)
                .run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedPostUpdate,
            collision::process_projectile_collisions::<Health>
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            commit::return_to_pool_commit
                .after(collision::process_projectile_collisions::<Health>)
                .run_if(in_state(GameState::InGame)),
        );
    }
}
