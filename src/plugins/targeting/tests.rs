//! Targeting tests.
//!
//! The pure tracker runs against `ScriptedWorld`, a hand-written spatial collaborator: it
//! reports a fixed overlap list and answers rays by their end point, so occlusion can be
//! switched on and off without a physics step.
//!
//! The adapters (`PhysicsOracle`, `Hostiles`) run against real Avian colliders in a small
//! headless app stepped for a few fixed ticks.

use std::time::Duration;

use avian2d::prelude::{Collider, Gravity, LayerMask, PhysicsPlugins, RigidBody};
use bevy::asset::AssetPlugin;
use bevy::mesh::MeshPlugin;
use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::time::TimeUpdateStrategy;

use super::tracker::{
    CandidateProbe, ScanSettings, TargetChange, TargetRegistry, TargetTracker, TargetUpdate,
};
use super::visibility::{RayContact, SpatialOracle, is_visible};
use super::tracker::select_nearest;
use super::{Hostiles, PhysicsOracle, TargetEvent, aim_at_target};
use crate::common::layers::{hostile_mask, sight_mask};
use crate::common::test_utils::{run_system_once, set_time};
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{
    Enemy, Health, PendingDespawn, enemy_layers, non_interacting_enemy_layers,
};
use crate::plugins::player::Player;
use crate::plugins::player::facing::{FacingTween, heading_angle};
use crate::plugins::world::world_layers;

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

fn key(p: Vec2) -> (i32, i32) {
    ((p.x * 100.0).round() as i32, (p.y * 100.0).round() as i32)
}

#[derive(Default)]
struct ScriptedWorld {
    hostiles: Vec<(Entity, CandidateProbe)>,
    /// Ray end point -> entity hit first instead of the hostile sitting there.
    blockers: HashMap<(i32, i32), Entity>,
    /// Ray end points that hit nothing at all.
    empty_rays: HashSet<(i32, i32)>,
    parents: HashMap<Entity, Entity>,
}

impl ScriptedWorld {
    fn add_hostile(&mut self, entity: Entity, position: Vec2) {
        self.hostiles.push((
            entity,
            CandidateProbe {
                position,
                bounds_center: position,
                is_active: true,
                is_dead: false,
            },
        ));
    }

    fn probe_mut(&mut self, entity: Entity) -> &mut CandidateProbe {
        &mut self
            .hostiles
            .iter_mut()
            .find(|(e, _)| *e == entity)
            .expect("unknown hostile")
            .1
    }

    fn occlude(&mut self, at: Vec2, blocker: Entity) {
        self.blockers.insert(key(at), blocker);
    }

    fn clear_occlusion(&mut self, at: Vec2) {
        self.blockers.remove(&key(at));
    }
}

impl SpatialOracle for ScriptedWorld {
    fn overlap_circle(&self, center: Vec2, radius: f32, _mask: LayerMask) -> Vec<Entity> {
        self.hostiles
            .iter()
            .filter(|(_, p)| p.position.distance(center) <= radius)
            .map(|(e, _)| *e)
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        _mask: LayerMask,
    ) -> Option<RayContact> {
        let end = origin + *direction * max_distance;
        let k = key(end);
        if self.empty_rays.contains(&k) {
            return None;
        }
        if let Some(blocker) = self.blockers.get(&k) {
            return Some(RayContact {
                entity: *blocker,
                point: end,
            });
        }
        self.hostiles
            .iter()
            .find(|(_, p)| key(p.bounds_center) == k)
            .map(|(e, p)| RayContact {
                entity: *e,
                point: p.bounds_center,
            })
    }

    fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.parents.get(&entity).copied()
    }
}

impl TargetRegistry for ScriptedWorld {
    fn probe(&self, entity: Entity) -> Option<CandidateProbe> {
        self.hostiles
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, p)| *p)
    }
}

fn settings() -> ScanSettings {
    ScanSettings {
        search_radius: 10.0,
        update_interval: 0.2,
        eye_offset: Vec2::ZERO,
        hostile_mask: hostile_mask(),
        sight_mask: sight_mask(),
    }
}

fn entities<const N: usize>() -> [Entity; N] {
    let mut world = World::new();
    std::array::from_fn(|_| world.spawn_empty().id())
}

// --------------------------------------------------------------------------------------
// Visibility
// --------------------------------------------------------------------------------------

#[test]
fn clear_ray_to_target_is_visible() {
    let [target] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(target, Vec2::new(5.0, 0.0));

    assert!(is_visible(&w, Vec2::ZERO, target, Vec2::new(5.0, 0.0), sight_mask()));
}

#[test]
fn ray_that_hits_nothing_is_not_visible() {
    let [target] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(target, Vec2::new(5.0, 0.0));
    w.empty_rays.insert(key(Vec2::new(5.0, 0.0)));

    assert!(!is_visible(&w, Vec2::ZERO, target, Vec2::new(5.0, 0.0), sight_mask()));
}

#[test]
fn hit_on_a_descendant_counts_as_the_target() {
    let [target, hitbox, wall] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(target, Vec2::new(5.0, 0.0));
    w.occlude(Vec2::new(5.0, 0.0), hitbox);
    w.parents.insert(hitbox, target);

    assert!(is_visible(&w, Vec2::ZERO, target, Vec2::new(5.0, 0.0), sight_mask()));

    w.occlude(Vec2::new(5.0, 0.0), wall);
    assert!(!is_visible(&w, Vec2::ZERO, target, Vec2::new(5.0, 0.0), sight_mask()));
}

#[test]
fn eye_inside_target_center_is_not_visible() {
    let [target] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(target, Vec2::new(5.0, 0.0));

    let eye = Vec2::new(5.0, 0.0);
    assert!(!is_visible(&w, eye, target, Vec2::new(5.0, 0.0), sight_mask()));
}

// --------------------------------------------------------------------------------------
// Tracker
// --------------------------------------------------------------------------------------

#[test]
fn occluding_the_nearest_switches_to_the_far_one_in_one_update() {
    let [near, far, wall] = entities();
    let near_pos = Vec2::new(3.0, 0.0);
    let far_pos = Vec2::new(0.0, 7.0);

    let mut w = ScriptedWorld::default();
    w.add_hostile(far, far_pos);
    w.add_hostile(near, near_pos);

    let mut tracker = TargetTracker::default();
    let first = tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(first, TargetUpdate { lost: None, acquired: Some(near) });
    assert_eq!(tracker.current(), Some(near));

    w.occlude(near_pos, wall);
    let second = tracker.update(0.2, Vec2::ZERO, &settings(), &w, &w);
    let changes: Vec<_> = second.changes().collect();
    assert_eq!(changes, vec![TargetChange::Lost(near), TargetChange::Acquired(far)]);
    assert_eq!(tracker.current(), Some(far));
}

#[test]
fn unchanged_target_emits_nothing() {
    let [a] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(a, Vec2::new(2.0, 0.0));

    let mut tracker = TargetTracker::default();
    tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);
    assert!(tracker.update(0.5, Vec2::ZERO, &settings(), &w, &w).is_empty());
}

#[test]
fn rescans_wait_for_the_interval() {
    let [far, near] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(far, Vec2::new(8.0, 0.0));

    let mut tracker = TargetTracker::default();
    tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(tracker.current(), Some(far));

    w.add_hostile(near, Vec2::new(1.0, 0.0));
    assert!(tracker.update(0.1, Vec2::ZERO, &settings(), &w, &w).is_empty());
    assert_eq!(tracker.current(), Some(far));

    let update = tracker.update(0.2, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(update, TargetUpdate { lost: Some(far), acquired: Some(near) });
}

#[test]
fn held_target_that_dies_is_dropped_between_scans() {
    let [a] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(a, Vec2::new(2.0, 0.0));

    let mut tracker = TargetTracker::default();
    tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);

    w.probe_mut(a).is_dead = true;
    let update = tracker.update(0.05, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(update, TargetUpdate { lost: Some(a), acquired: None });
    assert_eq!(tracker.current(), None);
}

#[test]
fn dead_and_inactive_candidates_are_skipped() {
    let [dead, hidden, alive] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(dead, Vec2::new(1.0, 0.0));
    w.add_hostile(hidden, Vec2::new(0.0, 1.5));
    w.add_hostile(alive, Vec2::new(-6.0, 0.0));
    w.probe_mut(dead).is_dead = true;
    w.probe_mut(hidden).is_active = false;

    let mut tracker = TargetTracker::default();
    tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(tracker.current(), Some(alive));
}

#[test]
fn equal_distances_keep_the_first_scanned() {
    let [first, second] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(first, Vec2::new(4.0, 0.0));
    w.add_hostile(second, Vec2::new(-4.0, 0.0));

    let mut tracker = TargetTracker::default();
    tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(tracker.current(), Some(first));
}

#[test]
fn out_of_radius_candidates_are_ignored_and_target_is_lost() {
    let [a, wall] = entities();
    let mut w = ScriptedWorld::default();
    w.add_hostile(a, Vec2::new(12.0, 0.0));

    let mut tracker = TargetTracker::default();
    assert!(tracker.update(0.0, Vec2::ZERO, &settings(), &w, &w).is_empty());

    w.probe_mut(a).position = Vec2::new(2.0, 0.0);
    w.probe_mut(a).bounds_center = Vec2::new(2.0, 0.0);
    tracker.update(1.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(tracker.current(), Some(a));

    w.occlude(Vec2::new(2.0, 0.0), wall);
    let update = tracker.update(2.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(update, TargetUpdate { lost: Some(a), acquired: None });

    w.clear_occlusion(Vec2::new(2.0, 0.0));
    let update = tracker.update(3.0, Vec2::ZERO, &settings(), &w, &w);
    assert_eq!(update, TargetUpdate { lost: None, acquired: Some(a) });
}

#[test]
fn events_follow_change_order() {
    let [actor, old, new] = entities();
    let update = TargetUpdate { lost: Some(old), acquired: Some(new) };
    let events: Vec<_> = update
        .changes()
        .map(|c| TargetEvent::from_change(actor, c))
        .collect();

    assert_eq!(
        events,
        vec![
            TargetEvent::Lost { actor, target: old },
            TargetEvent::Acquired { actor, target: new },
        ]
    );
}

// --------------------------------------------------------------------------------------
// ECS
// --------------------------------------------------------------------------------------

#[test]
fn aim_turns_toward_held_target_and_cancels_facing_tween() {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    set_time(&mut world, 1.0, 1.0);

    let target = world
        .spawn((Enemy, Transform::from_xyz(100.0, 0.0, 1.0)))
        .id();

    let mut tracker = TargetTracker::default();
    let mut w = ScriptedWorld::default();
    w.add_hostile(target, Vec2::new(100.0, 0.0));
    let wide = ScanSettings { search_radius: 200.0, ..settings() };
    tracker.update(0.0, Vec2::ZERO, &wide, &w, &w);

    let mut tween = FacingTween::default();
    tween.look_toward(0.0, 1.0, 0.15);

    let actor = world
        .spawn((Player, tracker, tween, Transform::default()))
        .id();

    run_system_once(&mut world, aim_at_target);

    let tf = world.get::<Transform>(actor).unwrap();
    let (_, _, angle) = tf.rotation.to_euler(EulerRot::XYZ);
    assert!((angle - heading_angle(Vec2::X)).abs() < 1e-3);
    assert!(!world.get::<FacingTween>(actor).unwrap().is_active());
}

// --------------------------------------------------------------------------------------
// Physics-backed adapters
// --------------------------------------------------------------------------------------

const TIMESTEP: f32 = 1.0 / 64.0;

fn physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        PhysicsPlugins::default(),
        TransformPlugin,
        AssetPlugin::default(),
        ScenePlugin,
        MeshPlugin,
    ));
    app.insert_resource(Gravity(Vec2::ZERO));
    app.insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f32(TIMESTEP)));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        TIMESTEP,
    )));
    app.finish();
    app
}

/// Step enough fixed ticks for colliders, AABBs and the spatial query data to exist.
fn settle(app: &mut App) {
    for _ in 0..6 {
        app.update();
    }
}

fn spawn_hostile(app: &mut App, at: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Enemy,
            Health::new(30),
            Transform::from_translation(at.extend(1.0)),
            RigidBody::Static,
            Collider::circle(16.0),
            enemy_layers(),
        ))
        .id()
}

fn nearest_from_origin(oracle: PhysicsOracle, hostiles: Hostiles) -> Option<Entity> {
    let settings = ScanSettings::from_tunables(&Tunables::default().targeting);
    select_nearest(Vec2::ZERO, &settings, &oracle, &hostiles)
}

fn overlaps_around_origin(oracle: PhysicsOracle) -> Vec<Entity> {
    oracle.overlap_circle(Vec2::ZERO, 420.0, hostile_mask())
}

#[test]
fn physics_scan_picks_the_nearest_engageable_hostile() {
    let mut app = physics_app();
    let near = spawn_hostile(&mut app, Vec2::new(0.0, 100.0));
    let _far = spawn_hostile(&mut app, Vec2::new(0.0, 220.0));

    let hidden = spawn_hostile(&mut app, Vec2::new(-60.0, 0.0));
    app.world_mut().entity_mut(hidden).insert(Visibility::Hidden);
    let despawning = spawn_hostile(&mut app, Vec2::new(60.0, 0.0));
    app.world_mut().entity_mut(despawning).insert(PendingDespawn);

    settle(&mut app);

    assert_eq!(run_system_once(app.world_mut(), nearest_from_origin), Some(near));
}

#[test]
fn physics_scan_skips_a_hostile_behind_a_pillar() {
    let mut app = physics_app();
    let _behind = spawn_hostile(&mut app, Vec2::new(0.0, 120.0));
    let open = spawn_hostile(&mut app, Vec2::new(250.0, 0.0));
    app.world_mut().spawn((
        Transform::from_xyz(0.0, 60.0, 0.0),
        RigidBody::Static,
        Collider::rectangle(80.0, 20.0),
        world_layers(),
    ));

    settle(&mut app);

    assert_eq!(run_system_once(app.world_mut(), nearest_from_origin), Some(open));
}

#[test]
fn child_colliders_resolve_to_their_body() {
    let mut app = physics_app();
    let body = app
        .world_mut()
        .spawn((
            Enemy,
            Health::new(30),
            Transform::from_xyz(0.0, 150.0, 1.0),
            RigidBody::Static,
        ))
        .id();
    for x in [-10.0, 10.0] {
        app.world_mut().spawn((
            Transform::from_xyz(x, 0.0, 0.0),
            Collider::circle(12.0),
            enemy_layers(),
            ChildOf(body),
        ));
    }

    settle(&mut app);

    assert_eq!(run_system_once(app.world_mut(), overlaps_around_origin), vec![body]);
    assert_eq!(run_system_once(app.world_mut(), nearest_from_origin), Some(body));
}

#[test]
fn a_fresh_corpse_does_not_block_sight() {
    let mut app = physics_app();
    let corpse = spawn_hostile(&mut app, Vec2::new(0.0, 100.0));
    app.world_mut()
        .entity_mut(corpse)
        .insert((Health { hp: 0, max_hp: 30 }, non_interacting_enemy_layers()));
    let live = spawn_hostile(&mut app, Vec2::new(0.0, 200.0));

    settle(&mut app);

    assert_eq!(run_system_once(app.world_mut(), nearest_from_origin), Some(live));
}
