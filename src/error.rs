//! Error types for the agent crate.

use std::path::PathBuf;

/// Errors raised by board generation, cell operations and the play loop.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("board dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("{bombs} mines do not fit on a board of {cells} cells (need at least one safe cell)")]
    TooManyMines { bombs: usize, cells: usize },

    #[error("cell ({x}, {y}) is outside the {width}x{height} board")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("cell ({x}, {y}) is already revealed")]
    AlreadyRevealed { x: usize, y: usize },

    #[error("episode is already over")]
    EpisodeOver,

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("failed to open sample store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write sample: {0}")]
    Csv(#[from] csv::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
