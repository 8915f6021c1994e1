//! Test helpers.
//!
//! Systems that use `Commands` only enqueue structural changes, so the helper flushes the
//! world after running to make them visible to assertions.

use std::time::Duration;

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A generic `Time` whose clock reads `elapsed` seconds after a step of `delta` seconds.
pub fn time_at(elapsed: f32, delta: f32) -> Time {
    let mut time = Time::<()>::default();
    time.advance_to(Duration::from_secs_f32((elapsed - delta).max(0.0)));
    time.advance_by(Duration::from_secs_f32(delta));
    time
}

/// Replace the world's generic `Time` with one reading `elapsed` after a `delta` step.
pub fn set_time(world: &mut World, elapsed: f32, delta: f32) {
    world.insert_resource(time_at(elapsed, delta));
}
