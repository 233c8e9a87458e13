//! Enemies plugin: patrolling guys driven by a timed state machine.
//!
//! ---------------------------
//! STATE MACHINE
//! ---------------------------
//! ```text
//!            1.0 s                    plan_walk(left)
//!   Idle ─────────────▶ WalkingLeft ─────────────────▶ WalkingRight
//!                            ▲                               │
//!                            └────────── plan_walk(right) ───┘
//! ```
//!
//! Transitions are never polled. Entering a walking state plans the walk and
//! schedules the next `EnterPatrol` continuation on the patrol channel, so each
//! enemy has exactly one transition in flight. The duration is recomputed on
//! every entry because the enemy has moved since the last plan.
//!
//! ---------------------------
//! LIFECYCLE
//! ---------------------------
//! - Spawned on `OnEnter(InGame)` from the level's `guy` spawn points.
//! - Destroyed enemies get `PendingDespawn` and collide with nothing from then
//!   on. The despawn itself happens in `PostUpdate`.
//! - A continuation that comes due for a destroyed enemy finds no match in the
//!   patrol query and is dropped.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::facing::Facing;
use crate::common::layers::Layer;
use crate::common::lifecycle::PendingDespawn;
use crate::common::state::GameState;
use crate::plugins::level::data::ENEMY_SPAWN;
use crate::plugins::level::{ActiveLevel, TileGrid, load_level};
use crate::plugins::scheduler::{Continuation, ContinuationDue, Continuations, advance_continuations};

pub mod patrol;

pub use patrol::{LedgeBias, plan_walk, walk_speed};

pub const BODY_SIZE: f32 = 40.0;

#[derive(Component, Debug, Default)]
pub struct Enemy;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatrolState {
    #[default]
    Idle,
    WalkingLeft,
    WalkingRight,
}

impl PatrolState {
    pub fn walking(facing: Facing) -> Self {
        match facing {
            Facing::Left => PatrolState::WalkingLeft,
            Facing::Right => PatrolState::WalkingRight,
        }
    }

    /// Direction of travel, `None` while idle.
    #[inline]
    pub fn heading(self) -> Option<Facing> {
        match self {
            PatrolState::Idle => None,
            PatrolState::WalkingLeft => Some(Facing::Left),
            PatrolState::WalkingRight => Some(Facing::Right),
        }
    }

    pub fn clip(self) -> &'static str {
        match self {
            PatrolState::Idle => "guyIdle",
            PatrolState::WalkingLeft | PatrolState::WalkingRight => "guyWalk",
        }
    }
}

/// World units per second while walking.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WalkSpeed(pub f32);

/// True while the enemy overlaps the player's attack zone.
///
/// Only overlap begin/end events write this.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shootable(pub bool);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillCause {
    /// Caught in the attack zone during an attack.
    Zone,
    /// Touched the player while the attack was spent.
    Contact,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyDestroyed {
    pub enemy: Entity,
    pub cause: KillCause,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<LedgeBias>()
        .add_message::<EnemyDestroyed>()
        .add_systems(
            OnEnter(GameState::InGame),
            spawn_enemies
                .after(load_level)
                .run_if(resource_exists::<ActiveLevel>),
        )
        .add_systems(
            FixedUpdate,
            (apply_patrol_transitions, patrol_movement)
                .chain()
                .after(advance_continuations)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Collision layers for an enemy that should no longer interact with anything.
///
/// Membership stays "Enemy", filters are cleared.
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

/// Take an enemy out of play. It is despawned at the end of the frame.
pub fn destroy_enemy(
    commands: &mut Commands,
    destroyed: &mut MessageWriter<EnemyDestroyed>,
    enemy: Entity,
    cause: KillCause,
) {
    commands
        .entity(enemy)
        .insert((PendingDespawn, non_interacting_enemy_layers()));
    destroyed.write(EnemyDestroyed { enemy, cause });
    debug!("Enemy {enemy:?} destroyed ({cause:?})");
}

/// One idle enemy per `guy` spawn point, each with its first transition queued.
pub fn spawn_enemies(
    mut commands: Commands,
    level: Res<ActiveLevel>,
    grid: Res<TileGrid>,
    mut continuations: ResMut<Continuations>,
) {
    let spawns = match level.data.spawns(ENEMY_SPAWN) {
        Ok(s) => s,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let speed = patrol::walk_speed(&grid);

    // Enemies only meet the player and the attack zone. No gravity, no pushes.
    let layers = CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::AttackZone]);

    for (i, point) in spawns.iter().enumerate() {
        let e = commands
            .spawn((
                Name::new(format!("Guy{i}")),
                Enemy,
                PatrolState::Idle,
                Facing::Left,
                WalkSpeed(speed),
                Shootable::default(),
                Sprite {
                    color: Color::srgb(0.9, 0.25, 0.25),
                    custom_size: Some(Vec2::splat(BODY_SIZE)),
                    ..default()
                },
                Transform::from_translation(point.world().extend(1.0)),
                RigidBody::Kinematic,
                Collider::rectangle(BODY_SIZE, BODY_SIZE),
                layers,
                CollisionEventsEnabled,
                DespawnOnExit(GameState::InGame),
            ))
            .id();

        continuations.schedule(e, patrol::IDLE_SECS, Continuation::EnterPatrol(Facing::Left));
    }

    info!("Spawned {} patrolling enemies", spawns.len());
}

/// Enter the walking state a due `EnterPatrol` names and queue the turnaround.
pub fn apply_patrol_transitions(
    mut due: MessageReader<ContinuationDue>,
    grid: Option<Res<TileGrid>>,
    bias: Res<LedgeBias>,
    mut continuations: ResMut<Continuations>,
    mut q: Query<(&Transform, &mut PatrolState, &mut Facing), (With<Enemy>, Without<PendingDespawn>)>,
) {
    let Some(grid) = grid else {
        return;
    };

    for c in due.read() {
        let Continuation::EnterPatrol(heading) = c.continuation else {
            continue;
        };
        let Ok((tf, mut state, mut facing)) = q.get_mut(c.owner) else {
            trace!("patrol continuation for gone enemy {:?}", c.owner);
            continue;
        };

        *state = PatrolState::walking(heading);
        *facing = heading;

        let secs = plan_walk(tf.translation.truncate(), heading, &grid, *bias);
        continuations.schedule(c.owner, secs, Continuation::EnterPatrol(heading.opposite()));
        debug!("Enemy {:?} -> {:?} for {secs:.2}s", c.owner, *state);
    }
}

/// Walk in the patrol heading. Idle enemies stay put.
pub fn patrol_movement(
    time: Res<Time<Fixed>>,
    mut q: Query<(&PatrolState, &WalkSpeed, &mut Transform), (With<Enemy>, Without<PendingDespawn>)>,
) {
    let dt = time.delta_secs();
    for (state, speed, mut tf) in &mut q {
        if let Some(heading) = state.heading() {
            tf.translation.x += heading.sign() * speed.0 * dt;
        }
    }
}

#[cfg(test)]
mod tests;
