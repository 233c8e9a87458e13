//! Floor lookahead for patrolling enemies.
//!
//! An enemy about to walk scans the row under its feet, starting at its own
//! column, for at most `LOOKAHEAD_TILES` columns. The run of solid floor it
//! finds becomes a walk duration at `TILES_PER_SECOND`.
//!
//! ```text
//!   row r      . E . . . .        E = enemy at (c, r)
//!   row r + 1  # # # # . #        scan c, c+1, ... stop at the first gap
//!                ^^^^^^^           4 tiles -> 2.0 s
//! ```

use bevy::prelude::*;

use crate::common::facing::Facing;
use crate::plugins::level::TileGrid;

/// Delay before a freshly spawned enemy starts walking.
pub const IDLE_SECS: f32 = 1.0;
/// Columns scanned ahead before giving up and using the cap.
pub const LOOKAHEAD_TILES: i32 = 4;
/// Patrol pace. Walk speed and walk durations both derive from it.
pub const TILES_PER_SECOND: f32 = 2.0;
/// Longest walk a single plan can produce.
pub const MAX_WALK_SECS: f32 = LOOKAHEAD_TILES as f32 / TILES_PER_SECOND;
/// Shortest walk. A scan that finds no floor still has to make progress.
pub const MIN_WALK_SECS: f32 = 0.25;
/// Extra margin taken off left walks under `LedgeBias::LegacyLeft`.
pub const LEGACY_LEFT_MARGIN: f32 = 0.1;

/// How left and right walk plans relate.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgeBias {
    /// Both directions use the same conversion.
    #[default]
    Symmetric,
    /// Left walks end `LEGACY_LEFT_MARGIN` seconds early.
    LegacyLeft,
}

/// World units per second that cover `TILES_PER_SECOND` tiles of this grid, so
/// a planned walk ends where the scanned floor does.
#[inline]
pub fn walk_speed(grid: &TileGrid) -> f32 {
    grid.tile_size() * TILES_PER_SECOND
}

/// Number of solid floor tiles under and ahead of `cell`, up to the cap.
pub fn floor_ahead(grid: &TileGrid, cell: IVec2, facing: Facing) -> i32 {
    let below = cell.y.saturating_add(1);
    (0..LOOKAHEAD_TILES)
        .map(|i| cell.x.saturating_add(i * facing.step()))
        .take_while(|&col| grid.is_solid(col, below))
        .count() as i32
}

/// Seconds to walk from `position` towards `facing` before turning around.
///
/// Always in `MIN_WALK_SECS..=MAX_WALK_SECS`.
pub fn plan_walk(position: Vec2, facing: Facing, grid: &TileGrid, bias: LedgeBias) -> f32 {
    let tiles = floor_ahead(grid, grid.cell_at(position), facing);
    let mut secs = tiles as f32 / TILES_PER_SECOND;
    if bias == LedgeBias::LegacyLeft && facing == Facing::Left {
        secs -= LEGACY_LEFT_MARGIN;
    }
    secs.clamp(MIN_WALK_SECS, MAX_WALK_SECS)
}
