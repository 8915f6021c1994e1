//! Core plugin: shared resources, global settings and the combat tick order.

use bevy::prelude::*;

use crate::common::sets::CombatSystems;
use crate::common::tunables::{TUNABLES_PATH, Tunables};

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::load_or_default(TUNABLES_PATH));
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));

    app.configure_sets(
        FixedUpdate,
        (
            CombatSystems::Targeting,
            CombatSystems::State,
            CombatSystems::Attack,
            CombatSystems::Projectiles,
        )
            .chain(),
    );
}

#[cfg(test)]
mod tests;
