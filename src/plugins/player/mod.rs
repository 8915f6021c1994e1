//! Player plugin: the controlled actor and its combat state.
//!
//! Pipeline:
//! - Update: sample keyboard into `MoveInput`, apply `SetArsenal` requests
//! - FixedUpdate / CombatSystems::State: resolve death requests, pick the combat state,
//!   drive the kinematic body and its facing tween
//! - PostUpdate: hand animation triggers to the animator

pub mod animation;
pub mod arsenal;
pub mod facing;
pub mod state;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{
    layers::Layer, sets::CombatSystems, state::GameState, tunables::Tunables,
};
use crate::plugins::attack::sequencer::AttackSequencer;
use crate::plugins::targeting::tracker::TargetTracker;

use animation::AnimationParams;
use arsenal::{Arsenal, EquippedAmmo, SetArsenal, WeaponChanged};
use facing::{FacingTween, heading_angle, rotation_angle};
use state::{CombatState, CombatStateMachine, MovementSettings, Motion, StateInputs};

#[derive(Component)]
pub struct Player;

/// Movement intent in `[-1, 1]` per axis.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct MoveInput {
    axis: Vec2,
}

impl MoveInput {
    pub fn new(axis: Vec2) -> Self {
        Self {
            axis: axis.clamp(Vec2::NEG_ONE, Vec2::ONE),
        }
    }

    pub fn axis(&self) -> Vec2 {
        self.axis
    }
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatStateChanged {
    pub actor: Entity,
    pub from: CombatState,
    pub to: CombatState,
}

/// Kill the actor. Cancels any attack in flight; the actor then stays `Dead`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeathRequest {
    pub actor: Entity,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(MoveInput::default())
        .add_message::<CombatStateChanged>()
        .add_message::<DeathRequest>()
        .add_message::<SetArsenal>()
        .add_message::<WeaponChanged>()
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            Update,
            (
                gather_input,
                (arsenal::apply_set_arsenal, arsenal::sync_equipped_ammo).chain(),
            ),
        )
        .add_systems(
            FixedUpdate,
            (handle_death_requests, drive_combat_state, facing::apply_facing)
                .chain()
                .in_set(CombatSystems::State)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(PostUpdate, animation::drain_animation_triggers);
}

fn spawn(mut commands: Commands, tunables: Res<Tunables>) {
    let layers = CollisionLayers::new(Layer::Player, [Layer::World, Layer::Enemy]);
    let arsenal = Arsenal::from_tunables(&tunables.arsenal);
    let ammo = EquippedAmmo(arsenal.equipped().ammo());

    commands.spawn((
        Name::new("Player"),
        Player,
        (
            CombatStateMachine::default(),
            AttackSequencer::default(),
            TargetTracker::default(),
            arsenal,
            ammo,
            AnimationParams::default(),
            FacingTween::default(),
        ),
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::new(22.0, 30.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -320.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        LinearVelocity::ZERO,
        TranslationInterpolation,
        DespawnOnExit(GameState::InGame),
    ));
}

fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<MoveInput>) {
    let Some(keys) = keys else {
        return;
    };

    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    *input = MoveInput::new(axis);
}

pub(crate) fn handle_death_requests(
    mut requests: MessageReader<DeathRequest>,
    mut q: Query<(
        &mut CombatStateMachine,
        &mut AttackSequencer,
        &mut LinearVelocity,
        &mut AnimationParams,
    )>,
    mut changes: MessageWriter<CombatStateChanged>,
) {
    for req in requests.read() {
        let Ok((mut machine, mut sequencer, mut velocity, mut anim)) = q.get_mut(req.actor) else {
            continue;
        };

        if let Some(cancelled) = sequencer.cancel() {
            debug!("{:?} died mid-attack on {:?}", req.actor, cancelled.target);
        }
        velocity.0 = Vec2::ZERO;

        if let Some(t) = machine.die(&mut *anim) {
            changes.write(CombatStateChanged {
                actor: req.actor,
                from: t.from,
                to: t.to,
            });
        }
    }
}

pub(crate) fn drive_combat_state(
    tunables: Res<Tunables>,
    input: Res<MoveInput>,
    mut q: Query<
        (
            Entity,
            &Transform,
            &TargetTracker,
            &AttackSequencer,
            &mut CombatStateMachine,
            &mut LinearVelocity,
            &mut FacingTween,
            &mut AnimationParams,
        ),
        With<Player>,
    >,
    mut changes: MessageWriter<CombatStateChanged>,
) {
    let settings = MovementSettings::from_tunables(&tunables.movement);

    for (actor, tf, tracker, sequencer, mut machine, mut velocity, mut tween, mut anim) in &mut q {
        let inputs = StateInputs {
            move_axis: input.axis(),
            has_target: tracker.current().is_some(),
            attack_in_progress: sequencer.is_in_flight(),
        };

        let step = machine.evaluate(inputs, &settings, &mut *anim);
        if let Some(t) = step.transition {
            changes.write(CombatStateChanged {
                actor,
                from: t.from,
                to: t.to,
            });
        }

        match step.motion {
            Motion::Halt => velocity.0 = Vec2::ZERO,
            Motion::Move {
                velocity: v,
                facing,
            } => {
                velocity.0 = v;
                if let Some(direction) = facing {
                    tween.look_toward(
                        rotation_angle(tf.rotation),
                        heading_angle(direction),
                        tunables.movement.rotation_duration,
                    );
                }
            }
        }
    }
}
