//! Attack plugin: auto-fire at the held target.
//!
//! ```text
//! FixedUpdate / CombatSystems::Attack
//!   handle_cancel_requests  CancelAttack -> drop sequence, back to Idle
//!   advance_attacks         resume due sequences: fire from the pool or abort
//!   auto_attack             start a sequence when the gates allow it
//! ```
//!
//! Advancing runs before starting, so a sequence never starts and fires in the same tick
//! unless the aim delay is zero.

pub mod sequencer;

use bevy::prelude::*;

use crate::common::kinds::AmmoType;
use crate::common::layers::player_shot_mask;
use crate::common::{sets::CombatSystems, state::GameState, tunables::Tunables};
use crate::plugins::player::animation::{ATTACK, AnimationParams, AnimationSink};
use crate::plugins::player::arsenal::EquippedAmmo;
use crate::plugins::player::facing::heading_rotation;
use crate::plugins::player::state::{CombatState, CombatStateMachine, StateTransition};
use crate::plugins::player::{CombatStateChanged, Player};
use crate::plugins::projectiles::pool::{ProjectilePool, ShotConfig, configure_shot};
use crate::plugins::targeting::Hostiles;
use crate::plugins::targeting::tracker::{TargetRegistry, TargetTracker};

use avian2d::prelude::LinearVelocity;
use sequencer::{AttackGate, AttackSequencer, AttackSettings, SequenceStep};

/// A shot left the muzzle. `projectile` is `None` when no pool serves the ammo type.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct ShotFired {
    pub shooter: Entity,
    pub target: Entity,
    pub projectile: Option<Entity>,
    pub ammo: AmmoType,
    pub origin: Vec2,
    pub direction: Vec2,
}

/// Abort `actor`'s attack in flight without firing.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelAttack {
    pub actor: Entity,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotGeometry {
    pub origin: Vec2,
    pub direction: Vec2,
}

pub fn plugin(app: &mut App) {
    app.add_message::<ShotFired>();
    app.add_message::<CancelAttack>();
    app.add_systems(
        FixedUpdate,
        (handle_cancel_requests, advance_attacks, auto_attack)
            .chain()
            .in_set(CombatSystems::Attack)
            .run_if(in_state(GameState::InGame)),
    );
}

/// Muzzle position and travel direction for a shot at `target_position`.
pub fn aim_shot(
    actor_position: Vec2,
    target_position: Vec2,
    eye_offset: Vec2,
    aim_offset: Vec2,
    muzzle_distance: f32,
) -> ShotGeometry {
    let base = actor_position + eye_offset;
    let direction = (target_position + aim_offset - base)
        .try_normalize()
        .unwrap_or(Vec2::Y);

    ShotGeometry {
        origin: base + direction * muzzle_distance,
        direction,
    }
}

/// Cancel the in-flight sequence, if any, and return the actor to `Idle`.
///
/// A dead actor stays `Dead`.
pub fn cancel_attack(
    sequencer: &mut AttackSequencer,
    machine: &mut CombatStateMachine,
    anim: &mut impl AnimationSink,
) -> Option<StateTransition> {
    sequencer.cancel();
    machine.set_state(CombatState::Idle, anim)
}

fn fire(
    commands: &mut Commands,
    pool: &mut ProjectilePool,
    ammo: AmmoType,
    shot: ShotGeometry,
) -> Option<Entity> {
    let projectile = pool.spawn(commands, ammo, shot.origin, heading_rotation(shot.direction))?;
    let profile = pool.profile(ammo)?;

    configure_shot(
        commands,
        projectile,
        ShotConfig {
            ammo,
            damage: profile.damage,
            hit_mask: player_shot_mask(),
            velocity: shot.direction * profile.speed,
            life_time: profile.life_time,
        },
    );
    Some(projectile)
}

fn handle_cancel_requests(
    mut requests: MessageReader<CancelAttack>,
    mut q: Query<(&mut AttackSequencer, &mut CombatStateMachine, &mut AnimationParams)>,
    mut state_changes: MessageWriter<CombatStateChanged>,
) {
    for req in requests.read() {
        let Ok((mut sequencer, mut machine, mut anim)) = q.get_mut(req.actor) else {
            continue;
        };
        if let Some(t) = cancel_attack(&mut sequencer, &mut machine, &mut *anim) {
            state_changes.write(CombatStateChanged {
                actor: req.actor,
                from: t.from,
                to: t.to,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn advance_attacks(
    mut commands: Commands,
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut pool: ResMut<ProjectilePool>,
    hostiles: Hostiles,
    mut q_actor: Query<
        (
            Entity,
            &Transform,
            &EquippedAmmo,
            &mut AttackSequencer,
            &mut CombatStateMachine,
            &mut AnimationParams,
        ),
        With<Player>,
    >,
    mut state_changes: MessageWriter<CombatStateChanged>,
    mut shots: MessageWriter<ShotFired>,
) {
    let now = time.elapsed_secs();
    let settings = AttackSettings::from_tunables(&tunables.attack);

    for (actor, tf, ammo, mut sequencer, mut machine, mut anim) in &mut q_actor {
        let step = sequencer.advance(now, &settings, |target| {
            hostiles.probe(target).is_some_and(|p| p.is_engageable())
        });

        match step {
            SequenceStep::Idle | SequenceStep::Waiting => continue,
            SequenceStep::Aborted(seq) => {
                debug!("{actor:?} attack on {:?} aborted: target gone", seq.target);
            }
            SequenceStep::Fired(seq) => {
                if let Some(probe) = hostiles.probe(seq.target) {
                    let shot = aim_shot(
                        tf.translation.truncate(),
                        probe.position,
                        tunables.targeting.eye_offset(),
                        tunables.attack.aim_offset(),
                        tunables.attack.muzzle_distance,
                    );

                    anim.set_trigger(ATTACK);
                    let projectile = fire(&mut commands, &mut pool, ammo.0, shot);
                    shots.write(ShotFired {
                        shooter: actor,
                        target: seq.target,
                        projectile,
                        ammo: ammo.0,
                        origin: shot.origin,
                        direction: shot.direction,
                    });
                }
            }
        }

        if let Some(t) = machine.set_state(CombatState::Idle, &mut *anim) {
            state_changes.write(CombatStateChanged {
                actor,
                from: t.from,
                to: t.to,
            });
        }
    }
}

pub(crate) fn auto_attack(
    time: Res<Time>,
    tunables: Res<Tunables>,
    hostiles: Hostiles,
    mut q_actor: Query<
        (
            Entity,
            &Transform,
            &TargetTracker,
            &mut AttackSequencer,
            &mut CombatStateMachine,
            &mut LinearVelocity,
            &mut AnimationParams,
        ),
        With<Player>,
    >,
    mut state_changes: MessageWriter<CombatStateChanged>,
) {
    let now = time.elapsed_secs();
    let settings = AttackSettings::from_tunables(&tunables.attack);

    for (actor, tf, tracker, mut sequencer, mut machine, mut velocity, mut anim) in &mut q_actor {
        if sequencer.is_in_flight() {
            continue;
        }
        let Some(target) = tracker.current() else {
            continue;
        };
        let Some(probe) = hostiles.probe(target) else {
            continue;
        };

        let gate = AttackGate {
            distance: tf.translation.truncate().distance(probe.position),
            is_moving: machine.is_moving(),
            is_dead: machine.is_dead(),
        };
        if !sequencer.try_start(Some(target), gate, now, &settings) {
            continue;
        }

        velocity.0 = Vec2::ZERO;
        if let Some(t) = machine.set_state(CombatState::Attacking, &mut *anim) {
            state_changes.write(CombatStateChanged {
                actor,
                from: t.from,
                to: t.to,
            });
        }
    }
}
