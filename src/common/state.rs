//! Session state. Arena entities are scoped to `InGame` and every combat system is gated
//! on it.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    /// The arena is loaded and the combat tick runs.
    #[default]
    InGame,
}
