//! Unit tests for the patrol planner and the enemy state machine.
//!
//! Submodule tests so private helpers stay private.

use bevy::prelude::*;

use crate::common::facing::Facing;
use crate::common::lifecycle::PendingDespawn;
use crate::common::test_utils::{
    drain_messages, ensure_messages, fixed_time_with_delta, run_system_once,
};
use crate::plugins::level::{ActiveLevel, LevelCatalog, TileGrid};
use crate::plugins::scheduler::{Channel, Continuation, ContinuationDue, Continuations};

use super::patrol::*;
use super::*;

// -----------------------------------------------------------------------------
// Test utilities
// -----------------------------------------------------------------------------

const TILE: f32 = 64.0;

/// Tiny deterministic PRNG for property-style tests (xorshift64*).
#[derive(Clone, Copy)]
struct TestRng(u64);

impl TestRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    #[inline]
    fn chance(&mut self, percent: u64) -> bool {
        self.below(100) < percent
    }
}

/// 20 columns x 4 rows, floor on row 2 for the given columns only.
fn floor_grid(solid_cols: impl IntoIterator<Item = usize>) -> TileGrid {
    let mut rows = vec![vec![0u32; 20]; 4];
    for c in solid_cols {
        rows[2][c] = 1;
    }
    TileGrid::from_rows(&rows, TILE).unwrap()
}

fn standing_on(grid: &TileGrid, col: i32) -> Vec2 {
    grid.cell_center(IVec2::new(col, 1))
}

// -----------------------------------------------------------------------------
// PatrolPlanner
// -----------------------------------------------------------------------------

#[test]
fn floor_to_the_gap_is_two_seconds() {
    // Enemy on column 10, floor through column 13, gap at 14.
    let grid = floor_grid(0..14);
    let at = standing_on(&grid, 10);

    assert_eq!(floor_ahead(&grid, grid.cell_at(at), Facing::Right), 4);
    let d = plan_walk(at, Facing::Right, &grid, LedgeBias::Symmetric);
    assert!((d - 2.0).abs() < 1e-6, "got {d}");
}

#[test]
fn gap_ahead_shortens_the_walk() {
    let grid = floor_grid(0..12);
    let at = standing_on(&grid, 10);

    assert_eq!(floor_ahead(&grid, grid.cell_at(at), Facing::Right), 2);
    assert!((plan_walk(at, Facing::Right, &grid, LedgeBias::Symmetric) - 1.0).abs() < 1e-6);

    // Plenty of floor to the left: capped.
    assert!((plan_walk(at, Facing::Left, &grid, LedgeBias::Symmetric) - MAX_WALK_SECS).abs() < 1e-6);
}

#[test]
fn no_floor_still_makes_progress() {
    let grid = floor_grid([]);
    let at = standing_on(&grid, 5);
    assert_eq!(plan_walk(at, Facing::Left, &grid, LedgeBias::Symmetric), MIN_WALK_SECS);
    assert_eq!(plan_walk(at, Facing::Right, &grid, LedgeBias::LegacyLeft), MIN_WALK_SECS);
}

#[test]
fn off_map_positions_plan_the_minimum() {
    let grid = floor_grid(0..20);
    for at in [Vec2::new(-500.0, -96.0), Vec2::new(5000.0, -96.0), Vec2::new(64.0, 900.0)] {
        assert_eq!(plan_walk(at, Facing::Right, &grid, LedgeBias::Symmetric), MIN_WALK_SECS);
    }
}

#[test]
fn legacy_bias_only_shortens_left_walks() {
    let grid = floor_grid(0..20);
    let at = standing_on(&grid, 10);

    let right = plan_walk(at, Facing::Right, &grid, LedgeBias::LegacyLeft);
    let left = plan_walk(at, Facing::Left, &grid, LedgeBias::LegacyLeft);
    assert!((right - MAX_WALK_SECS).abs() < 1e-6);
    assert!((left - (MAX_WALK_SECS - LEGACY_LEFT_MARGIN)).abs() < 1e-6);

    // Symmetric planning mirrors exactly.
    let sym_left = plan_walk(at, Facing::Left, &grid, LedgeBias::Symmetric);
    assert_eq!(sym_left, right);
}

#[test]
fn plan_is_bounded_and_deterministic_on_random_floors() {
    let mut rng = TestRng::new(0xC0FFEE_1234_5678);

    for _case in 0..5_000 {
        let solid: Vec<usize> = (0..20).filter(|_| rng.chance(70)).collect();
        let grid = floor_grid(solid);
        let col = rng.below(20) as i32;
        let at = standing_on(&grid, col) + Vec2::new(rng.below(60) as f32 - 30.0, 0.0);
        let facing = if rng.chance(50) { Facing::Left } else { Facing::Right };
        let bias = if rng.chance(50) { LedgeBias::Symmetric } else { LedgeBias::LegacyLeft };

        let d = plan_walk(at, facing, &grid, bias);
        assert!(d > 0.0 && d <= MAX_WALK_SECS, "{d} out of range");
        assert_eq!(d, plan_walk(at, facing, &grid, bias));

        // Proportional to the floor run under the symmetric rule.
        let tiles = floor_ahead(&grid, grid.cell_at(at), facing);
        if bias == LedgeBias::Symmetric && tiles > 0 {
            assert!((d - tiles as f32 / TILES_PER_SECOND).abs() < 1e-6);
        }
    }
}

// -----------------------------------------------------------------------------
// PatrolStateMachine
// -----------------------------------------------------------------------------

fn patrol_world(grid: TileGrid) -> World {
    let mut world = World::new();
    world.insert_resource(grid);
    world.init_resource::<LedgeBias>();
    world.init_resource::<Continuations>();
    ensure_messages::<ContinuationDue>(&mut world);
    world
}

fn spawn_guy(world: &mut World, at: Vec2) -> Entity {
    world
        .spawn((
            Enemy,
            PatrolState::Idle,
            Facing::Right,
            WalkSpeed(128.0),
            Transform::from_translation(at.extend(1.0)),
        ))
        .id()
}

/// Advance the scheduler by `dt` and hand due continuations to the patrol system.
fn tick(world: &mut World, dt: f32) {
    let due = world.resource_mut::<Continuations>().advance(dt);
    drain_messages::<ContinuationDue>(world);
    for d in due {
        world.write_message(d);
    }
    run_system_once(world, apply_patrol_transitions);
}

#[test]
fn idle_waits_one_second_then_walks_left() {
    let grid = floor_grid(0..14);
    let at = standing_on(&grid, 10);
    let mut world = patrol_world(grid);
    let e = spawn_guy(&mut world, at);
    world
        .resource_mut::<Continuations>()
        .schedule(e, IDLE_SECS, Continuation::EnterPatrol(Facing::Left));

    tick(&mut world, 0.9);
    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::Idle);

    tick(&mut world, 0.2);
    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::WalkingLeft);
    assert_eq!(*world.get::<Facing>(e).unwrap(), Facing::Left);

    // Exactly one transition in flight, heading back right.
    let c = world.resource::<Continuations>();
    assert_eq!(c.len(), 1);
    assert!(c.is_pending(e, Channel::Patrol));
    assert!((c.remaining(e, Channel::Patrol).unwrap() - MAX_WALK_SECS).abs() < 1e-5);
}

#[test]
fn planned_walk_covers_the_scanned_floor_for_any_tile_size() {
    // Floor under columns 0..=13, gap at 14, enemy on column 10.
    for tile in [32.0, TILE, 96.0] {
        let rows: Vec<Vec<u32>> = (0..4)
            .map(|r| (0..20).map(|c| u32::from(r == 2 && c < 14)).collect())
            .collect();
        let grid = TileGrid::from_rows(&rows, tile).unwrap();
        let at = standing_on(&grid, 10);
        let speed = walk_speed(&grid);
        assert_eq!(speed, tile * TILES_PER_SECOND);

        let tiles = floor_ahead(&grid, grid.cell_at(at), Facing::Right);
        let secs = plan_walk(at, Facing::Right, &grid, LedgeBias::Symmetric);
        let walked = speed * secs;
        assert!((walked - tiles as f32 * tile).abs() < 1e-3, "tile {tile}: walked {walked}");
    }
}

#[test]
fn walking_right_to_the_gap_then_turns_left() {
    // Scenario: column 10, floor through 13, gap at 14.
    let grid = floor_grid(0..14);
    let at = standing_on(&grid, 10);
    let mut world = patrol_world(grid);
    world.insert_resource(fixed_time_with_delta(0.05));
    let e = spawn_guy(&mut world, at);
    world
        .resource_mut::<Continuations>()
        .schedule(e, 0.0, Continuation::EnterPatrol(Facing::Right));

    tick(&mut world, 0.0);
    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::WalkingRight);
    let planned = world
        .resource::<Continuations>()
        .remaining(e, Channel::Patrol)
        .unwrap();
    assert!((planned - 2.0).abs() < 1e-5);

    // 40 ticks of 0.05 s = 2.0 s of walking.
    for _ in 0..40 {
        run_system_once(&mut world, patrol_movement);
        tick(&mut world, 0.05);
    }

    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::WalkingLeft);
    let x = world.get::<Transform>(e).unwrap().translation.x;
    assert!((x - (at.x + 128.0 * 2.0)).abs() < 0.5, "x = {x}");
}

#[test]
fn idle_enemy_does_not_move() {
    let grid = floor_grid(0..20);
    let at = standing_on(&grid, 3);
    let mut world = patrol_world(grid);
    world.insert_resource(fixed_time_with_delta(0.25));
    let e = spawn_guy(&mut world, at);

    for _ in 0..10 {
        run_system_once(&mut world, patrol_movement);
    }
    assert_eq!(world.get::<Transform>(e).unwrap().translation.truncate(), at);
}

#[test]
fn walking_moves_by_speed_times_dt() {
    let grid = floor_grid(0..20);
    let at = standing_on(&grid, 3);
    let mut world = patrol_world(grid);
    world.insert_resource(fixed_time_with_delta(0.5));
    let e = spawn_guy(&mut world, at);
    *world.get_mut::<PatrolState>(e).unwrap() = PatrolState::WalkingLeft;

    run_system_once(&mut world, patrol_movement);

    let tf = world.get::<Transform>(e).unwrap();
    assert!((tf.translation.x - (at.x - 64.0)).abs() < 1e-4);
    assert_eq!(tf.translation.y, at.y);
}

#[test]
fn continuation_for_destroyed_enemy_is_a_no_op() {
    let grid = floor_grid(0..20);
    let at = standing_on(&grid, 3);
    let mut world = patrol_world(grid);
    let e = spawn_guy(&mut world, at);
    let gone = spawn_guy(&mut world, at);
    world.entity_mut(e).insert(PendingDespawn);
    world.despawn(gone);

    {
        let mut c = world.resource_mut::<Continuations>();
        c.schedule(e, 0.1, Continuation::EnterPatrol(Facing::Left));
        c.schedule(gone, 0.1, Continuation::EnterPatrol(Facing::Left));
    }
    tick(&mut world, 0.2);

    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::Idle);
    assert!(world.resource::<Continuations>().is_empty());
}

#[test]
fn other_continuations_are_ignored() {
    let grid = floor_grid(0..20);
    let at = standing_on(&grid, 3);
    let mut world = patrol_world(grid);
    let e = spawn_guy(&mut world, at);
    world
        .resource_mut::<Continuations>()
        .schedule(e, 0.0, Continuation::Recharge);

    tick(&mut world, 0.1);
    assert_eq!(*world.get::<PatrolState>(e).unwrap(), PatrolState::Idle);
}

#[test]
fn never_more_than_one_pending_transition() {
    let grid = floor_grid(2..18);
    let at = standing_on(&grid, 9);
    let mut world = patrol_world(grid);
    world.insert_resource(fixed_time_with_delta(1.0 / 64.0));
    let e = spawn_guy(&mut world, at);
    world
        .resource_mut::<Continuations>()
        .schedule(e, IDLE_SECS, Continuation::EnterPatrol(Facing::Left));

    let mut seen = std::collections::HashSet::new();
    for _ in 0..1_000 {
        run_system_once(&mut world, patrol_movement);
        tick(&mut world, 1.0 / 64.0);
        assert_eq!(world.resource::<Continuations>().len(), 1);
        seen.insert(*world.get::<PatrolState>(e).unwrap());
    }
    assert!(seen.contains(&PatrolState::WalkingLeft));
    assert!(seen.contains(&PatrolState::WalkingRight));
}

// -----------------------------------------------------------------------------
// Spawning / destruction
// -----------------------------------------------------------------------------

#[test]
fn spawn_enemies_creates_one_guy_per_spawn_point() {
    let mut world = World::new();
    world.init_resource::<Continuations>();
    let data = LevelCatalog::builtin().load("level-1").unwrap();
    let expected = data.spawns(crate::plugins::level::data::ENEMY_SPAWN).unwrap().len();
    let grid = data.tile_grid().unwrap();
    let speed = grid.tile_size() * TILES_PER_SECOND;
    world.insert_resource(grid);
    world.insert_resource(ActiveLevel { data });

    run_system_once(&mut world, spawn_enemies);

    for ws in world.query_filtered::<&WalkSpeed, With<Enemy>>().iter(&world) {
        assert_eq!(ws.0, speed);
    }

    let guys: Vec<(Entity, PatrolState)> = world
        .query_filtered::<(Entity, &PatrolState), With<Enemy>>()
        .iter(&world)
        .map(|(e, s)| (e, *s))
        .collect();
    assert_eq!(guys.len(), expected);

    let c = world.resource::<Continuations>();
    for (e, state) in guys {
        assert_eq!(state, PatrolState::Idle);
        assert_eq!(c.remaining(e, Channel::Patrol), Some(IDLE_SECS));
    }
}

#[test]
fn destroy_enemy_marks_and_reports() {
    let mut world = World::new();
    ensure_messages::<EnemyDestroyed>(&mut world);
    let e = world.spawn(Enemy).id();

    run_system_once(
        &mut world,
        move |mut commands: Commands, mut w: MessageWriter<EnemyDestroyed>| {
            destroy_enemy(&mut commands, &mut w, e, KillCause::Zone);
        },
    );

    assert!(world.get::<PendingDespawn>(e).is_some());
    let layers = world.get::<avian2d::prelude::CollisionLayers>(e).unwrap();
    assert_eq!(layers.filters, avian2d::prelude::LayerMask::NONE);
    assert_eq!(
        drain_messages::<EnemyDestroyed>(&mut world),
        vec![EnemyDestroyed { enemy: e, cause: KillCause::Zone }]
    );
}
