/// Error types raised while loading maps, levels and configuration.
///
/// Only map loading is fatal to the simulation. Everything that happens
/// inside a tick (blocked moves, out-of-range tile queries) is a normal
/// outcome and never surfaces here.

use thiserror::Error;

/// Malformed or incomplete map text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapFormatError {
    #[error("map contains no rows")]
    Empty,

    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    #[error("map has no player spawn")]
    MissingPlayerSpawn,

    #[error("map has {count} player spawns, expected exactly one")]
    MultiplePlayerSpawns { count: usize },
}

/// Problems with `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure to obtain a playable level from a map source.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Map(#[from] MapFormatError),
}
