//! Enemies plugin: hostiles with health, a short death state, and a chase behaviour.
//!
//! Facts live in components (`Health`, `EnemyLifeState`); rules mutate them at fixed
//! points:
//! - projectile collisions (elsewhere) lower `Health`
//! - `enemy_death_trigger` turns a depleted `Health` into `Dying`
//! - `enemy_death_progress` fades the body and marks `PendingDespawn`
//! - `despawn_marked_enemies` removes it in PostUpdate, outside the physics step
//!
//! Chasing runs in FixedUpdate ahead of targeting so the scan sees this tick's velocity
//! decisions.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{
    layers::Layer, sets::CombatSystems, state::GameState, tunables::EnemyTunables,
    tunables::Tunables,
};
use crate::plugins::player::Player;
use crate::plugins::player::facing::heading_rotation;
use crate::plugins::projectiles::collision::process_projectile_collisions;
use crate::plugins::projectiles::components::DamageReceiver;

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

#[derive(Component, Debug, Clone)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
}

impl Health {
    pub fn new(max_hp: i32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

impl DamageReceiver for Health {
    fn take_damage(&mut self, amount: i32) {
        if self.is_dead() {
            return;
        }
        self.hp = (self.hp - amount).max(0);
    }
}

/// Enemy lifecycle state machine.
///
/// - Alive: normal gameplay.
/// - Dying: collisions off, fading out.
/// - Dead: terminal marker to stop further state transitions.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

/// Marker: enemy should be removed from the world.
///
/// We don't despawn inside the fixed step; we mark and despawn later.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// What a chasing enemy does this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChaseAction {
    /// Player out of sight range.
    Idle,
    Approach { velocity: Vec2 },
    /// In range: stand and turn toward `toward`.
    Hold { toward: Vec2 },
}

pub fn chase_action(enemy: Vec2, player: Vec2, t: &EnemyTunables) -> ChaseAction {
    let offset = player - enemy;
    let distance = offset.length();

    if distance > t.detection_radius {
        return ChaseAction::Idle;
    }
    if distance <= t.stop_distance + t.stop_tolerance {
        return ChaseAction::Hold { toward: offset };
    }
    ChaseAction::Approach {
        velocity: offset / distance * t.move_speed,
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_enemies);

    app.add_systems(
        FixedUpdate,
        chase_player
            .before(CombatSystems::Targeting)
            .run_if(in_state(GameState::InGame)),
    );

    // Death trigger runs after collision resolution so it sees updated Health.
    app.add_systems(
        FixedPostUpdate,
        (enemy_death_trigger, enemy_death_progress)
            .chain()
            .after(process_projectile_collisions::<Health>)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(
        PostUpdate,
        despawn_marked_enemies.run_if(in_state(GameState::InGame)),
    );
}

#[inline]
pub(crate) fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::Enemy, Layer::PlayerBullet],
    )
}

/// No membership and no filters: a dying body drops out of contacts, target scans and
/// line-of-sight rays without a structural change.
#[inline]
pub(crate) fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::NONE
}

const SPAWN_POINTS: [Vec2; 5] = [
    Vec2::new(-360.0, 260.0),
    Vec2::new(0.0, 340.0),
    Vec2::new(360.0, 260.0),
    Vec2::new(-520.0, -40.0),
    Vec2::new(520.0, -40.0),
];

fn spawn_enemies(mut commands: Commands, tunables: Res<Tunables>) {
    for (i, pos) in SPAWN_POINTS.into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Enemy{i}")),
            Enemy,
            Health::new(tunables.enemies.max_hp),
            EnemyLifeState::Alive,
            Sprite {
                color: Color::srgb(0.9, 0.25, 0.25),
                custom_size: Some(Vec2::splat(32.0)),
                ..default()
            },
            Transform::from_translation(pos.extend(1.0)),
            RigidBody::Dynamic,
            Collider::circle(16.0),
            LockedAxes::ROTATION_LOCKED,
            enemy_layers(),
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

fn chase_player(
    time: Res<Time>,
    tunables: Res<Tunables>,
    q_player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut q: Query<
        (&EnemyLifeState, &mut Transform, &mut LinearVelocity),
        (With<Enemy>, Without<Player>),
    >,
) {
    let Ok(player_tf) = q_player.single() else {
        return;
    };
    let player = player_tf.translation.truncate();
    let turn = (tunables.enemies.turn_rate * time.delta_secs()).clamp(0.0, 1.0);

    for (life, mut tf, mut velocity) in &mut q {
        if !matches!(life, EnemyLifeState::Alive) {
            velocity.0 = Vec2::ZERO;
            continue;
        }

        match chase_action(tf.translation.truncate(), player, &tunables.enemies) {
            ChaseAction::Idle => velocity.0 = Vec2::ZERO,
            ChaseAction::Approach { velocity: v } => {
                velocity.0 = v;
                tf.rotation = heading_rotation(v);
            }
            ChaseAction::Hold { toward } => {
                velocity.0 = Vec2::ZERO;
                if toward.length_squared() > f32::EPSILON {
                    tf.rotation = tf.rotation.slerp(heading_rotation(toward), turn);
                }
            }
        }
    }
}

/// Transition Alive -> Dying when HP drops to 0.
///
/// This system does not despawn. It only enforces the dying invariants.
fn enemy_death_trigger(
    tunables: Res<Tunables>,
    mut q: Query<
        (
            &Health,
            &mut EnemyLifeState,
            &mut CollisionLayers,
            &mut LinearVelocity,
            &mut Sprite,
        ),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (hp, mut life, mut layers, mut velocity, mut sprite) in &mut q {
        if !matches!(*life, EnemyLifeState::Alive) || !hp.is_dead() {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(tunables.enemies.despawn_delay, TimerMode::Once),
        };
        *layers = non_interacting_enemy_layers();
        velocity.0 = Vec2::ZERO;
        sprite.color = Color::srgba(0.8, 0.8, 0.8, 1.0);
    }
}

/// Fade the Dying body and mark PendingDespawn once the timer is done.
fn enemy_death_progress(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<
        (Entity, &mut EnemyLifeState, &mut Sprite),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (e, mut life, mut sprite) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);
        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
