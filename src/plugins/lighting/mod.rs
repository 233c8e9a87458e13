//! Lighting plugin (Firefly) (render-only).
//!
//! A soft light follows the player; enemies cast shadows.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::enemies::{BODY_SIZE, Enemy};
use crate::plugins::player::Player;

#[derive(Component)]
pub struct PlayerLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(OnEnter(GameState::InGame), setup)
        .add_systems(
            Update,
            (follow_player_light, add_enemy_occluders).run_if(in_state(GameState::InGame)),
        );
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: Color::srgb(0.75, 0.85, 1.0),
            radius: 450.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::InGame),
    ));
}

fn follow_player_light(
    q_player: Query<&Transform, (With<Player>, Without<PlayerLight>)>,
    mut q_light: Query<&mut Transform, (With<PlayerLight>, Without<Player>)>,
) {
    let Ok(tf_player) = q_player.single() else {
        return;
    };
    let Ok(mut tf_light) = q_light.single_mut() else {
        return;
    };

    tf_light.translation.x = tf_player.translation.x;
    tf_light.translation.y = tf_player.translation.y;
}

fn add_enemy_occluders(mut commands: Commands, q: Query<Entity, Added<Enemy>>) {
    for e in &q {
        commands.entity(e).try_insert(Occluder2d::circle(BODY_SIZE * 0.5));
    }
}
