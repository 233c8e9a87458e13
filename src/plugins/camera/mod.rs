//! Camera plugin (render-only).
//!
//! The camera eases towards the player and is clamped to the level so the
//! void around the map stays off screen where the level is big enough.
//!
//! Aliasing: a system cannot hold `Query<&Transform>` and `Query<&mut Transform>`
//! unless Bevy can prove them disjoint, hence the `Without<...>` filters.
//!
//! ```text
//! OnEnter(InGame): spawn MainCamera at the level center
//! PostUpdate:      follow_player (before transform propagation)
//! ```

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::level::{TileGrid, load_level};
use crate::plugins::player::Player;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera.after(load_level))
        .add_systems(
            PostUpdate,
            follow_player
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_camera(mut commands: Commands, grid: Option<Res<TileGrid>>) {
    let start = grid.map(|g| level_center(&g)).unwrap_or_default();

    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: 5.0 },
        FireflyConfig::default(),
        Transform::from_translation(start.extend(999.0)),
        DespawnOnExit(GameState::InGame),
    ));
}

fn level_center(grid: &TileGrid) -> Vec2 {
    let size = Vec2::new(grid.width() as f32, grid.height() as f32) * grid.tile_size();
    Vec2::new(size.x * 0.5, -size.y * 0.5)
}

fn follow_player(
    time: Res<Time>,
    grid: Option<Res<TileGrid>>,
    q_player: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    cam: Option<Single<(&mut Transform, &MainCamera), Without<Player>>>,
) {
    let (Some(cam), Ok(tf_player)) = (cam, q_player.single()) else {
        return;
    };
    let (mut tf_cam, main_cam) = cam.into_inner();

    let dt = time.delta_secs();
    let alpha = 1.0 - (-main_cam.responsiveness * dt).exp();

    let mut target = tf_player.translation.truncate();
    // Keep the target inside the level horizontally.
    if let Some(grid) = grid {
        let width = grid.width() as f32 * grid.tile_size();
        target.x = target.x.clamp(0.0, width.max(0.0));
    }

    let current = tf_cam.translation.truncate();
    let next = current + (target - current) * alpha;
    tf_cam.translation.x = next.x;
    tf_cam.translation.y = next.y;
}
