//! Tunable gameplay constants.
//!
//! Durations of timed waits are not here: they are compile-time constants in
//! the modules that schedule them.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub gravity: f32,
    pub player_speed: f32,
    pub jump_speed: f32,
    pub player_max_health: u32,
    /// A player below this world-space height has fallen out of the level.
    pub fall_limit_y: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 64.0,
            gravity: 2100.0,
            player_speed: 300.0,
            jump_speed: 820.0,
            player_max_health: 3,
            fall_limit_y: -2000.0,
        }
    }
}
