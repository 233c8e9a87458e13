//! Level session: parse the current level, publish its `TileGrid`, spawn static
//! geometry, and carry out scene transitions.
//!
//! ```text
//! OnEnter(Loading): clear pending request          -> NextState(InGame)
//! OnEnter(InGame):  load_level (parse + validate)  -> TileGrid, ActiveLevel
//!                   spawn_level_geometry           (tiles, exit, spikes)
//!                   player / enemy spawners        (run after load_level)
//! FixedPostUpdate:  detect_exit_contact            -> GoToScene
//! Update:           apply_scene_requests           -> CurrentScene, NextState(Loading)
//! ```
//!
//! A malformed level never reaches `InGame` gameplay: `load_level` logs the
//! error and moves to `GameState::LoadFailed`, and the spawners skip because
//! `ActiveLevel` is absent.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::lifecycle::PendingDespawn;
use crate::common::state::GameState;
use crate::plugins::player::Player;

pub mod data;
pub mod error;
pub mod grid;

pub use data::{ColliderDef, ColliderKind, LevelCatalog, LevelData, SpawnPoint};
pub use error::LevelFormatError;
pub use grid::TileGrid;

/// Scene-transition sink: ask for the named level to be (re)entered.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct GoToScene {
    pub scene: String,
}

/// Name of the level to enter on the next `InGame`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct CurrentScene(pub String);

/// First scene request of the running level. Later ones are ignored.
#[derive(Resource, Debug, Default)]
struct PendingScene(Option<String>);

/// The level being played.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLevel {
    pub data: LevelData,
}

impl ActiveLevel {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn failure_scene(&self) -> &str {
        &self.data.failure_scene
    }

    pub fn exit_scene(&self) -> Option<&str> {
        self.data.exit_scene.as_deref()
    }
}

/// Static floor/wall tile.
#[derive(Component, Debug)]
pub struct Platform;

/// Level exit trigger.
#[derive(Component, Debug)]
pub struct Exit;

/// Touching this hurts the player.
#[derive(Component, Debug)]
pub struct Hazard;

/// Level files here replace the embedded copies of the same name.
pub const LEVEL_DIR: &str = "assets/levels";

pub fn plugin(app: &mut App) {
    let catalog = LevelCatalog::builtin().with_override_dir(LEVEL_DIR);
    let first = catalog.first().unwrap_or_default().to_string();

    app.insert_resource(catalog)
        .insert_resource(CurrentScene(first))
        .init_resource::<PendingScene>()
        .add_message::<GoToScene>()
        .add_systems(OnEnter(GameState::Loading), enter_requested_level)
        .add_systems(OnEnter(GameState::InGame), load_level)
        .add_systems(
            OnEnter(GameState::InGame),
            spawn_level_geometry
                .after(load_level)
                .run_if(resource_exists::<ActiveLevel>),
        )
        .add_systems(OnExit(GameState::InGame), unload_level)
        .add_systems(
            FixedPostUpdate,
            detect_exit_contact
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            Update,
            apply_scene_requests.run_if(in_state(GameState::InGame)),
        );
}

fn enter_requested_level(
    mut pending: ResMut<PendingScene>,
    mut next: ResMut<NextState<GameState>>,
) {
    pending.0 = None;
    next.set(GameState::InGame);
}

/// Parse and validate the current level, then publish it.
pub fn load_level(
    mut commands: Commands,
    catalog: Res<LevelCatalog>,
    scene: Res<CurrentScene>,
    mut next: ResMut<NextState<GameState>>,
) {
    let loaded = catalog
        .load(&scene.0)
        .and_then(|data| data.validate().map(|grid| (data, grid)));

    match loaded {
        Ok((data, grid)) => {
            info!(
                "Entering level '{}' ({}x{} tiles)",
                data.name,
                grid.width(),
                grid.height()
            );
            commands.insert_resource(grid);
            commands.insert_resource(ActiveLevel { data });
        }
        Err(err) => {
            error!("Could not enter scene '{}': {err}", scene.0);
            next.set(GameState::LoadFailed);
        }
    }
}

fn unload_level(mut commands: Commands) {
    commands.remove_resource::<ActiveLevel>();
    commands.remove_resource::<TileGrid>();
}

/// Spawn one static collider per solid tile plus the exit trigger and spikes.
///
/// Sprites are plain colored quads; textured tiles are the renderer's business.
pub fn spawn_level_geometry(mut commands: Commands, grid: Res<TileGrid>, level: Res<ActiveLevel>) {
    let tile = grid.tile_size();
    let platform_layers = CollisionLayers::new(Layer::World, [Layer::Player]);

    grid.solid_cells().for_each(|cell| {
        commands.spawn((
            Name::new(format!("Platform({},{})", cell.x, cell.y)),
            Platform,
            Sprite::from_color(Color::srgb(0.31, 0.22, 0.38), Vec2::splat(tile)),
            Transform::from_translation(grid.cell_center(cell).extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(tile, tile),
            platform_layers,
            DespawnOnExit(GameState::InGame),
        ));
    });

    for def in &level.data.colliders {
        let size = def.size();
        let (name, membership, color) = match def.kind {
            ColliderKind::Exit => ("Exit", Layer::Exit, Color::srgba(0.95, 0.85, 0.4, 0.35)),
            ColliderKind::Spikes => ("Spikes", Layer::Hazard, Color::srgb(0.55, 0.55, 0.6)),
        };

        let mut e = commands.spawn((
            Name::new(name),
            Sprite::from_color(color, size),
            Transform::from_translation(def.world_center().extend(0.5)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            CollisionLayers::new(membership, [Layer::Player]),
            DespawnOnExit(GameState::InGame),
        ));
        // The exit is walked into; spikes are floor the player lands on.
        match def.kind {
            ColliderKind::Exit => e.insert((Exit, Sensor)),
            ColliderKind::Spikes => e.insert(Hazard),
        };
    }
}

/// Player touching the exit asks for the level's exit scene.
pub fn detect_exit_contact(
    mut started: MessageReader<CollisionStart>,
    level: Option<Res<ActiveLevel>>,
    q_player: Query<(), (With<Player>, Without<PendingDespawn>)>,
    q_exit: Query<(), With<Exit>>,
    mut scenes: MessageWriter<GoToScene>,
) {
    let Some(level) = level else {
        return;
    };

    for ev in started.read() {
        let (a, b) = (ev.collider1, ev.collider2);
        let touches_exit = (q_player.contains(a) && q_exit.contains(b))
            || (q_player.contains(b) && q_exit.contains(a));
        if !touches_exit {
            continue;
        }

        match level.exit_scene() {
            Some(scene) => {
                scenes.write(GoToScene {
                    scene: scene.to_string(),
                });
            }
            None => debug!("Level '{}' exit reached, no exit scene", level.name()),
        }
    }
}

/// Carry out the first scene request of the running level.
pub fn apply_scene_requests(
    mut requests: MessageReader<GoToScene>,
    catalog: Res<LevelCatalog>,
    mut scene: ResMut<CurrentScene>,
    mut pending: ResMut<PendingScene>,
    mut next: ResMut<NextState<GameState>>,
) {
    for req in requests.read() {
        if let Some(already) = &pending.0 {
            debug!("Ignoring scene request '{}', '{already}' already pending", req.scene);
            continue;
        }
        pending.0 = Some(req.scene.clone());

        if !catalog.contains(&req.scene) {
            error!("{}", LevelFormatError::UnknownScene(req.scene.clone()));
            next.set(GameState::LoadFailed);
            continue;
        }

        info!("Scene transition: '{}' -> '{}'", scene.0, req.scene);
        scene.0 = req.scene.clone();
        next.set(GameState::Loading);
    }
}
