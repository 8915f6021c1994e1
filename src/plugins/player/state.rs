//! Combat state machine.
//!
//! One state is active at a time. Movement and combat exclude each other: the actor only
//! moves in `Moving`, every other state halts it.

use bevy::prelude::*;

use super::animation::{AIMING, AnimationSink, DEAD, RUN, SPEED};
use crate::common::tunables::MovementTunables;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CombatState {
    #[default]
    Idle,
    Moving,
    Aiming,
    Attacking,
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateTransition {
    pub from: CombatState,
    pub to: CombatState,
}

/// What the state machine reads each tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateInputs {
    pub move_axis: Vec2,
    pub has_target: bool,
    pub attack_in_progress: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Halt,
    /// `facing` is `None` when the targeting aim owns the orientation.
    Move { velocity: Vec2, facing: Option<Vec2> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateStep {
    pub transition: Option<StateTransition>,
    pub motion: Motion,
}

#[derive(Clone, Copy, Debug)]
pub struct MovementSettings {
    pub move_speed: f32,
    pub input_epsilon_sq: f32,
    pub walk_threshold: f32,
}

impl MovementSettings {
    pub fn from_tunables(t: &MovementTunables) -> Self {
        Self {
            move_speed: t.move_speed,
            input_epsilon_sq: t.input_epsilon_sq,
            walk_threshold: t.walk_threshold,
        }
    }
}

#[derive(Component, Debug, Default, Clone)]
pub struct CombatStateMachine {
    state: CombatState,
    marked_dead: bool,
}

impl CombatStateMachine {
    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == CombatState::Moving
    }

    pub fn is_aiming(&self) -> bool {
        self.state == CombatState::Aiming
    }

    pub fn is_attacking(&self) -> bool {
        self.state == CombatState::Attacking
    }

    pub fn is_dead(&self) -> bool {
        self.marked_dead || self.state == CombatState::Dead
    }

    /// Enter `next`, applying its entry effects once.
    ///
    /// Re-entering the current state does nothing. `Dead` is terminal.
    pub fn set_state(
        &mut self,
        next: CombatState,
        anim: &mut impl AnimationSink,
    ) -> Option<StateTransition> {
        if self.state == next {
            return None;
        }
        if self.state == CombatState::Dead {
            debug!("ignoring transition to {next:?}: actor is dead");
            return None;
        }

        let from = self.state;
        self.state = next;
        apply_entry_effects(next, anim);
        debug!("combat state {from:?} -> {next:?}");

        Some(StateTransition { from, to: next })
    }

    pub fn die(&mut self, anim: &mut impl AnimationSink) -> Option<StateTransition> {
        self.marked_dead = true;
        self.set_state(CombatState::Dead, anim)
    }

    /// Pick this tick's state and motion, highest priority first:
    /// dead, attack in progress, standing still, moving.
    pub fn evaluate(
        &mut self,
        inputs: StateInputs,
        settings: &MovementSettings,
        anim: &mut impl AnimationSink,
    ) -> StateStep {
        let halt = |transition| StateStep {
            transition,
            motion: Motion::Halt,
        };

        if self.marked_dead {
            return halt(self.set_state(CombatState::Dead, anim));
        }
        if inputs.attack_in_progress {
            return halt(self.set_state(CombatState::Attacking, anim));
        }
        if inputs.move_axis.length_squared() < settings.input_epsilon_sq {
            let next = if inputs.has_target {
                CombatState::Aiming
            } else {
                CombatState::Idle
            };
            return halt(self.set_state(next, anim));
        }

        let transition = self.set_state(CombatState::Moving, anim);

        let magnitude = inputs.move_axis.length().min(1.0);
        anim.set_float(SPEED, magnitude);
        anim.set_bool(RUN, magnitude >= settings.walk_threshold);

        let direction = inputs.move_axis.normalize_or_zero();
        StateStep {
            transition,
            motion: Motion::Move {
                velocity: direction * settings.move_speed,
                facing: (!inputs.has_target).then_some(direction),
            },
        }
    }
}

fn apply_entry_effects(state: CombatState, anim: &mut impl AnimationSink) {
    match state {
        CombatState::Idle => {
            anim.set_float(SPEED, 0.0);
            anim.set_bool(RUN, false);
            anim.set_bool(AIMING, false);
            anim.set_bool(DEAD, false);
        }
        CombatState::Aiming | CombatState::Attacking => {
            anim.set_float(SPEED, 0.0);
            anim.set_bool(RUN, false);
            anim.set_bool(AIMING, true);
        }
        CombatState::Moving => {
            anim.set_bool(AIMING, false);
        }
        CombatState::Dead => {
            anim.set_float(SPEED, 0.0);
            anim.set_bool(RUN, false);
            anim.set_bool(AIMING, false);
            anim.set_bool(DEAD, true);
        }
    }
}
