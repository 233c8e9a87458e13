//! Global state machine.
//!
//! A scene change is a hop `InGame -> Loading -> InGame`; everything spawned
//! for a level is scoped to `InGame` and despawned on the way out.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    InGame,
    /// Level data was malformed; scene entry was aborted.
    LoadFailed,
}
