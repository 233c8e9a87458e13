//! Read-only spatial index over static level collision data.
//!
//! The grid's top-left corner sits at the world origin. Columns grow to the
//! right (+x), rows grow downward (-y), matching the map editor's layout where
//! row 0 is the top of the level.

use bevy::prelude::*;

use super::error::LevelFormatError;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    solid: Vec<bool>,
}

impl TileGrid {
    /// Build from a table of rows, 0 = empty, anything else = solid.
    /// Every row must be as long as the first.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R], tile_size: f32) -> Result<Self, LevelFormatError> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());

        let mut solid = Vec::with_capacity(width * rows.len());
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != width {
                return Err(LevelFormatError::NonRectangular {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            solid.extend(cells.iter().map(|&c| c != 0));
        }

        Ok(Self {
            width,
            height: rows.len(),
            tile_size,
            solid,
        })
    }

    /// Build from a flat row-major layer of `width * height` cells.
    pub fn from_flat(
        cells: &[u32],
        width: usize,
        height: usize,
        tile_size: f32,
    ) -> Result<Self, LevelFormatError> {
        if cells.len() != width * height {
            return Err(LevelFormatError::GridMismatch {
                expected_width: width,
                expected_height: height,
                actual: cells.len(),
            });
        }

        Ok(Self {
            width,
            height,
            tile_size,
            solid: cells.iter().map(|&c| c != 0).collect(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Whether the tile at (column, row) is solid. Out of range is empty.
    pub fn is_solid(&self, column: i32, row: i32) -> bool {
        if column < 0 || row < 0 {
            return false;
        }
        let (c, r) = (column as usize, row as usize);
        if c >= self.width || r >= self.height {
            return false;
        }
        self.solid[r * self.width + c]
    }

    /// The (column, row) cell enclosing a world position.
    pub fn cell_at(&self, pos: Vec2) -> IVec2 {
        IVec2::new(
            (pos.x / self.tile_size).floor() as i32,
            (-pos.y / self.tile_size).floor() as i32,
        )
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, cell: IVec2) -> Vec2 {
        Vec2::new(
            (cell.x as f32 + 0.5) * self.tile_size,
            -(cell.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// All solid cells, row by row.
    pub fn solid_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.solid
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| IVec2::new((i % self.width) as i32, (i / self.width) as i32))
    }
}
