mod common;

use archer_arena::common::kinds::AmmoType;
use archer_arena::common::state::GameState;
use archer_arena::plugins::enemies::{Enemy, Health};
use archer_arena::plugins::player::Player;
use archer_arena::plugins::player::state::{CombatState, CombatStateMachine};
use archer_arena::plugins::projectiles::pool::ProjectilePool;
use archer_arena::plugins::targeting::tracker::TargetTracker;
use avian2d::prelude::TranslationInterpolation;
use bevy::prelude::*;

fn app_in_game() -> App {
    let mut app = common::app_headless();
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();
    app
}

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }
}

#[test]
fn player_interpolation_pipeline_is_wired() {
    let mut app = app_in_game();

    // Just tick a few frames; should not panic.
    for _ in 0..5 {
        app.update();
    }

    let ok = app
        .world_mut()
        .query::<(&Player, &TranslationInterpolation)>()
        .iter(app.world())
        .next()
        .is_some();

    assert!(
        ok,
        "Player should opt in to smoothing via TranslationInterpolation"
    );
}

#[test]
fn arena_spawns_a_combat_ready_player_and_hostiles() {
    let mut app = app_in_game();
    app.update();

    let world = app.world_mut();

    let machine = world
        .query_filtered::<&CombatStateMachine, (With<Player>, With<TargetTracker>)>()
        .single(world)
        .expect("exactly one player");
    assert_ne!(machine.state(), CombatState::Dead);

    let hostiles = world
        .query_filtered::<&Health, With<Enemy>>()
        .iter(world)
        .filter(|h| !h.is_dead())
        .count();
    assert!(hostiles > 0);

    let pool = world.resource::<ProjectilePool>();
    assert!(pool.total_count(AmmoType::Pistol) >= pool.capacity(AmmoType::Pistol));
}
