//! Timed aim-then-fire sequence with a fire-rate cooldown.
//!
//! The aim delay is an explicit resume time advanced by the tick, so cancelling is just
//! dropping the stored sequence.

use bevy::prelude::*;

use crate::common::tunables::AttackTunables;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackPhase {
    AimPreparing,
    Fired,
    /// Finished without firing.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackSequence {
    pub target: Entity,
    pub phase: AttackPhase,
    pub started_at: f32,
    pub resume_at: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackSettings {
    pub attack_range: f32,
    pub fire_rate: f32,
    pub aim_prepare_duration: f32,
}

impl AttackSettings {
    pub fn from_tunables(t: &AttackTunables) -> Self {
        Self {
            attack_range: t.attack_range,
            fire_rate: t.fire_rate,
            aim_prepare_duration: t.aim_prepare_duration,
        }
    }

    #[inline]
    pub fn cooldown(&self) -> f32 {
        1.0 / self.fire_rate
    }
}

/// Actor facts checked before a sequence may start.
#[derive(Clone, Copy, Debug)]
pub struct AttackGate {
    pub distance: f32,
    pub is_moving: bool,
    pub is_dead: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SequenceStep {
    Idle,
    Waiting,
    Fired(AttackSequence),
    /// The target was no longer valid at resume time.
    Aborted(AttackSequence),
}

#[derive(Component, Debug, Default, Clone)]
pub struct AttackSequencer {
    in_flight: Option<AttackSequence>,
    next_fire_allowed_at: f32,
}

impl AttackSequencer {
    pub fn in_flight(&self) -> Option<&AttackSequence> {
        self.in_flight.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn next_fire_allowed_at(&self) -> f32 {
        self.next_fire_allowed_at
    }

    pub fn can_attack(&self, now: f32) -> bool {
        self.in_flight.is_none() && now >= self.next_fire_allowed_at
    }

    /// Begin aiming at `target`. Returns false, changing nothing, when a gate fails.
    ///
    /// A successful start replaces any sequence already in flight.
    pub fn try_start(
        &mut self,
        target: Option<Entity>,
        gate: AttackGate,
        now: f32,
        settings: &AttackSettings,
    ) -> bool {
        let Some(target) = target else {
            return false;
        };
        if gate.is_dead
            || gate.is_moving
            || gate.distance > settings.attack_range
            || now < self.next_fire_allowed_at
        {
            return false;
        }

        if let Some(previous) = self.in_flight.take() {
            debug!("attack on {:?} superseded by {target:?}", previous.target);
        }

        self.in_flight = Some(AttackSequence {
            target,
            phase: AttackPhase::AimPreparing,
            started_at: now,
            resume_at: now + settings.aim_prepare_duration,
        });
        true
    }

    /// Resume the sequence once its aim delay has elapsed.
    ///
    /// `is_target_valid` is asked only at resume time. Firing arms the cooldown; an abort
    /// leaves it untouched.
    pub fn advance(
        &mut self,
        now: f32,
        settings: &AttackSettings,
        is_target_valid: impl FnOnce(Entity) -> bool,
    ) -> SequenceStep {
        let Some(seq) = self.in_flight else {
            return SequenceStep::Idle;
        };
        if now < seq.resume_at {
            return SequenceStep::Waiting;
        }

        self.in_flight = None;
        if !is_target_valid(seq.target) {
            return SequenceStep::Aborted(AttackSequence {
                phase: AttackPhase::Done,
                ..seq
            });
        }

        self.next_fire_allowed_at = now + settings.cooldown();
        SequenceStep::Fired(AttackSequence {
            phase: AttackPhase::Fired,
            ..seq
        })
    }

    /// Drop the in-flight sequence without firing or touching the cooldown.
    pub fn cancel(&mut self) -> Option<AttackSequence> {
        self.in_flight.take()
    }
}
