//! Level data structures and RON loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::Deserialize;

use super::error::LevelFormatError;
use super::grid::TileGrid;

/// Spawn category of the player. Exactly the first point is used.
pub const PLAYER_SPAWN: &str = "player";
/// Spawn category of patrolling enemies.
pub const ENEMY_SPAWN: &str = "guy";

const REQUIRED_SPAWNS: [&str; 2] = [PLAYER_SPAWN, ENEMY_SPAWN];

/// Map position in editor pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

impl SpawnPoint {
    /// Position in world space.
    #[inline]
    pub fn world(self) -> Vec2 {
        map_to_world(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ColliderKind {
    /// Touching it finishes the level.
    Exit,
    /// Touching it hurts.
    Spikes,
}

/// Axis-aligned exit or spike area, top-left corner in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColliderDef {
    pub kind: ColliderKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ColliderDef {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// World-space center of the area.
    pub fn world_center(&self) -> Vec2 {
        map_to_world(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// One level as authored.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub tile_size: f32,
    pub width: usize,
    pub height: usize,
    /// Row-major occupancy, `width * height` cells, 0 = empty.
    pub platform: Vec<u32>,
    #[serde(default)]
    pub colliders: Vec<ColliderDef>,
    pub spawn_points: HashMap<String, Vec<SpawnPoint>>,
    /// Scene entered when the player is killed.
    pub failure_scene: String,
    /// Scene entered through the exit, if the level has one.
    #[serde(default)]
    pub exit_scene: Option<String>,
}

impl LevelData {
    /// Parse a level from RON source. `origin` names the source in errors.
    pub fn from_ron(origin: &str, source: &str) -> Result<Self, LevelFormatError> {
        ron::from_str(source).map_err(|e| LevelFormatError::ParseError {
            level: origin.to_string(),
            details: e.to_string(),
        })
    }

    /// Read and parse a level file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelFormatError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| LevelFormatError::ReadError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron(&path.display().to_string(), &source)
    }

    /// Build the static collision index for this level.
    pub fn tile_grid(&self) -> Result<TileGrid, LevelFormatError> {
        TileGrid::from_flat(&self.platform, self.width, self.height, self.tile_size)
    }

    /// Spawn points of one category.
    pub fn spawns(&self, category: &str) -> Result<&[SpawnPoint], LevelFormatError> {
        self.spawn_points
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| LevelFormatError::MissingSpawnCategory {
                level: self.name.clone(),
                category: category.to_string(),
            })
    }

    /// Where the player enters the level.
    pub fn player_spawn(&self) -> Result<SpawnPoint, LevelFormatError> {
        self.spawns(PLAYER_SPAWN)?
            .first()
            .copied()
            .ok_or_else(|| LevelFormatError::MissingSpawnCategory {
                level: self.name.clone(),
                category: PLAYER_SPAWN.to_string(),
            })
    }

    /// Check everything scene entry relies on, returning the grid on success.
    pub fn validate(&self) -> Result<TileGrid, LevelFormatError> {
        let grid = self.tile_grid()?;
        for category in REQUIRED_SPAWNS {
            self.spawns(category)?;
        }
        self.player_spawn()?;
        Ok(grid)
    }
}

/// Map pixels (y down) to world space (y up).
#[inline]
pub fn map_to_world(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, -y)
}

/// Named level sources available to scene transitions.
///
/// Sources are kept unparsed: a malformed level only fails when it is entered.
/// With an override directory set, `<dir>/<name>.ron` on disk wins over the
/// embedded copy.
#[derive(Resource, Debug, Clone)]
pub struct LevelCatalog {
    entries: Vec<(String, String)>,
    override_dir: Option<PathBuf>,
}

impl LevelCatalog {
    /// Levels shipped inside the binary.
    pub fn builtin() -> Self {
        Self::from_sources([
            ("level-1", include_str!("../../../assets/levels/level-1.ron")),
            ("level-2", include_str!("../../../assets/levels/level-2.ron")),
        ])
    }

    pub fn from_sources<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: sources
                .into_iter()
                .map(|(name, src)| (name.to_string(), src.to_string()))
                .collect(),
            override_dir: None,
        }
    }

    /// Look in `dir` first when loading a level.
    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    /// Name of the level a new game starts in.
    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name) || self.on_disk(name).is_some()
    }

    /// Parse the named level.
    pub fn load(&self, name: &str) -> Result<LevelData, LevelFormatError> {
        if let Some(path) = self.on_disk(name) {
            debug!("Loading level '{name}' from {}", path.display());
            return LevelData::load(path);
        }
        let (_, source) = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| LevelFormatError::UnknownScene(name.to_string()))?;
        LevelData::from_ron(name, source)
    }

    fn on_disk(&self, name: &str) -> Option<PathBuf> {
        let path = self.override_dir.as_ref()?.join(format!("{name}.ron"));
        path.is_file().then_some(path)
    }
}
