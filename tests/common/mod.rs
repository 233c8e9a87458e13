//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `spooky_platformer::game::configure_headless` to install gameplay plugins.
//!
//! Time is stepped manually by exactly one fixed timestep per `app.update()`, so
//! every frame runs `FixedUpdate` / `FixedPostUpdate` once.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use spooky_platformer::common::state::GameState;
use spooky_platformer::plugins::player::Player;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    let step = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));

    spooky_platformer::game::configure_headless(&mut app);
    // `App::run` would do this; manual `update()` loops must finish plugins themselves.
    app.finish();
    app.cleanup();
    app
}

/// Tick until a live player exists in `InGame`, or give up.
pub fn enter_level(app: &mut App) -> Entity {
    for _ in 0..30 {
        app.update();
        let in_game = *app.world().resource::<State<GameState>>().get() == GameState::InGame;
        if in_game {
            if let Some(p) = player(app) {
                return p;
            }
        }
    }
    panic!("never entered a level");
}

pub fn player(app: &mut App) -> Option<Entity> {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .next()
}

pub fn run(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}
