//! Error types for level data loading.

use thiserror::Error;

/// Malformed tile or collision data. Fatal at level load: scene entry is
/// aborted and the message is logged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LevelFormatError {
    /// File could not be read.
    #[error("Failed to read level file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in level '{level}': {details}")]
    ParseError { level: String, details: String },

    /// A row of the occupancy table has a different length than the first one.
    #[error("Occupancy table is not rectangular: row {row} has {actual} cells, expected {expected}")]
    NonRectangular {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Flat platform layer does not match the declared dimensions.
    #[error("Grid mismatch: expected {expected_width}x{expected_height} cells, got {actual}")]
    GridMismatch {
        expected_width: usize,
        expected_height: usize,
        actual: usize,
    },

    /// A spawn category the level cannot start without is absent.
    #[error("Level '{level}' has no spawn points for required category '{category}'")]
    MissingSpawnCategory { level: String, category: String },

    /// A scene transition named a level that is not in the catalog.
    #[error("Unknown scene: {0}")]
    UnknownScene(String),
}
