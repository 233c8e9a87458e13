mod common;

use bevy::prelude::*;
use spooky_platformer::common::state::GameState;
use spooky_platformer::plugins::combat::CombatController;
use spooky_platformer::plugins::enemies::{Enemy, PatrolState};
use spooky_platformer::plugins::level::{ActiveLevel, CurrentScene, TileGrid};

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }
}

#[test]
fn first_level_is_entered_with_player_and_enemies() {
    let mut app = common::app_headless();
    let player = common::enter_level(&mut app);

    assert_eq!(app.world().resource::<CurrentScene>().0, "level-1");
    assert_eq!(*app.world().resource::<State<GameState>>().get(), GameState::InGame);
    assert!(app.world().get_resource::<TileGrid>().is_some());
    assert!(app.world().get::<CombatController>(player).is_some());

    let expected = app
        .world()
        .resource::<ActiveLevel>()
        .data
        .spawns("guy")
        .unwrap()
        .len();
    let enemies = app
        .world_mut()
        .query_filtered::<Entity, With<Enemy>>()
        .iter(app.world())
        .count();
    assert_eq!(enemies, expected);
}

#[test]
fn enemies_start_patrolling_after_the_idle_delay() {
    let mut app = common::app_headless();
    common::enter_level(&mut app);

    // Well past the one second idle delay at 64 ticks per second.
    common::run(&mut app, 90);

    let walking = app
        .world_mut()
        .query_filtered::<&PatrolState, With<Enemy>>()
        .iter(app.world())
        .filter(|s| **s != PatrolState::Idle)
        .count();
    assert!(walking > 0, "no enemy left the idle state");
}
