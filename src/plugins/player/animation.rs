//! Animation parameter sink.
//!
//! The combat core never talks to an animator directly. It writes named parameters into
//! `AnimationParams`, which the presentation side reads and drains each frame.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

pub const SPEED: &str = "Speed";
pub const AIMING: &str = "Aiming";
pub const RUN: &str = "Run";
pub const DEAD: &str = "Dead";
pub const ATTACK: &str = "Attack";

pub trait AnimationSink {
    fn set_float(&mut self, name: &'static str, value: f32);
    fn set_bool(&mut self, name: &'static str, value: bool);
    fn set_trigger(&mut self, name: &'static str);
}

#[derive(Component, Debug, Default, Clone)]
pub struct AnimationParams {
    floats: HashMap<&'static str, f32>,
    bools: HashMap<&'static str, bool>,
    triggers: Vec<&'static str>,
}

impl AnimationParams {
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    /// Unset flags read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn pending_triggers(&self) -> &[&'static str] {
        &self.triggers
    }

    pub fn drain_triggers(&mut self) -> impl Iterator<Item = &'static str> + '_ {
        self.triggers.drain(..)
    }
}

impl AnimationSink for AnimationParams {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    fn set_bool(&mut self, name: &'static str, value: bool) {
        self.bools.insert(name, value);
    }

    fn set_trigger(&mut self, name: &'static str) {
        self.triggers.push(name);
    }
}

/// Hand fired triggers over to the animator. Triggers are one-shot.
pub(crate) fn drain_animation_triggers(mut q: Query<(Entity, &mut AnimationParams)>) {
    for (e, mut params) in &mut q {
        if params.triggers.is_empty() {
            continue;
        }
        for trigger in params.drain_triggers() {
            trace!("{e:?} animation trigger {trigger}");
        }
    }
}
