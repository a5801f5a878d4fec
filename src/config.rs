/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::geometry::{TileFrame, WorldPos};
use crate::error::ConfigError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub geometry: GeometryConfig,
    pub speed: SpeedConfig,
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub lives: u32,
    pub map_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GeometryConfig {
    pub tile_size: f32,
    pub origin_x: f32, // screen-space offset of column 0
    pub origin_y: f32, // screen-space offset of row 0
}

impl GeometryConfig {
    pub fn frame(&self) -> TileFrame {
        TileFrame::new(self.tile_size, WorldPos::new(self.origin_x, self.origin_y))
    }
}

/// Speeds are world units per tick.
#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_speed: f32,
    pub pursuer_speed: f32,
    pub return_speed: f32,
}

/// Durations, all in ticks.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub level_start_ticks: u64, // shields drop + pursuers released
    pub respawn_ticks: u64,     // defeat -> maze rebuild
    pub frightened_ticks: u64,
    pub patrol_ticks: u64,
    pub chase_ticks: u64,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub pellet: u32,
    pub bonus: u32,
    pub capture: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    geometry: TomlGeometry,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGeometry {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default = "default_origin_x")]
    origin_x: f32,
    #[serde(default = "default_origin_y")]
    origin_y: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_pursuer_speed")]
    pursuer_speed: f32,
    #[serde(default = "default_return_speed")]
    return_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_level_start")]
    level_start_ticks: u64,
    #[serde(default = "default_respawn")]
    respawn_ticks: u64,
    #[serde(default = "default_frightened")]
    frightened_ticks: u64,
    #[serde(default = "default_patrol")]
    patrol_ticks: u64,
    #[serde(default = "default_chase")]
    chase_ticks: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_pellet_value")]
    pellet: u32,
    #[serde(default = "default_bonus_value")]
    bonus: u32,
    #[serde(default = "default_capture_value")]
    capture: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_map_file")]
    map_file: String,
}

// ── Defaults ──

fn default_tile_size() -> f32 { 10.0 }
fn default_origin_x() -> f32 { 160.0 }   // 800 px screen / 5
fn default_origin_y() -> f32 { 50.0 }    // 600 px screen / 12
fn default_tick_rate() -> u64 { 16 }     // ~60 ticks per second
fn default_player_speed() -> f32 { 5.0 }
fn default_pursuer_speed() -> f32 { 2.5 }
fn default_return_speed() -> f32 { 5.0 }
fn default_level_start() -> u64 { 300 }  // 5s
fn default_respawn() -> u64 { 240 }      // 4s
fn default_frightened() -> u64 { 480 }   // 8s
fn default_patrol() -> u64 { 420 }
fn default_chase() -> u64 { 1200 }
fn default_pellet_value() -> u32 { 10 }
fn default_bonus_value() -> u32 { 50 }
fn default_capture_value() -> u32 { 200 }
fn default_lives() -> u32 { 3 }
fn default_map_file() -> String { "maze_map.txt".into() }

impl Default for TomlGeometry {
    fn default() -> Self {
        TomlGeometry {
            tile_size: default_tile_size(),
            origin_x: default_origin_x(),
            origin_y: default_origin_y(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
            pursuer_speed: default_pursuer_speed(),
            return_speed: default_return_speed(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            level_start_ticks: default_level_start(),
            respawn_ticks: default_respawn(),
            frightened_ticks: default_frightened(),
            patrol_ticks: default_patrol(),
            chase_ticks: default_chase(),
        }
    }
}

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring {
            pellet: default_pellet_value(),
            bonus: default_bonus_value(),
            capture: default_capture_value(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            lives: default_lives(),
            map_file: default_map_file(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file, missing keys or bad values fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        let config = GameConfig::from_toml(toml_cfg, &search_dirs);
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("{e}; using default settings");
                GameConfig::default()
            }
        }
    }

    /// Parse and validate a config document. Relative map paths are kept as-is.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        let config = GameConfig::from_toml(toml_cfg, &[]);
        config.validate()?;
        Ok(config)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve the map file against the candidate dirs, like any data file
        let map_str = &toml_cfg.general.map_file;
        let map_file = if PathBuf::from(map_str).is_absolute() {
            PathBuf::from(map_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(map_str))
                .find(|p| p.is_file())
                .unwrap_or_else(|| PathBuf::from(map_str))
        };

        GameConfig {
            geometry: GeometryConfig {
                tile_size: toml_cfg.geometry.tile_size,
                origin_x: toml_cfg.geometry.origin_x,
                origin_y: toml_cfg.geometry.origin_y,
            },
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms,
                player_speed: toml_cfg.speed.player_speed,
                pursuer_speed: toml_cfg.speed.pursuer_speed,
                return_speed: toml_cfg.speed.return_speed,
            },
            timing: TimingConfig {
                level_start_ticks: toml_cfg.timing.level_start_ticks,
                respawn_ticks: toml_cfg.timing.respawn_ticks,
                frightened_ticks: toml_cfg.timing.frightened_ticks,
                patrol_ticks: toml_cfg.timing.patrol_ticks,
                chase_ticks: toml_cfg.timing.chase_ticks,
            },
            scoring: ScoringConfig {
                pellet: toml_cfg.scoring.pellet,
                bonus: toml_cfg.scoring.bonus,
                capture: toml_cfg.scoring.capture,
            },
            lives: toml_cfg.general.lives,
            map_file,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("geometry.tile_size", self.geometry.tile_size),
            ("speed.player_speed", self.speed.player_speed),
            ("speed.pursuer_speed", self.speed.pursuer_speed),
            ("speed.return_speed", self.speed.return_speed),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        // Two agents closing at a full tile each per tick would jump past
        // each other between encounter checks.
        let tile = self.geometry.tile_size;
        let speeds = [
            ("speed.player_speed", self.speed.player_speed),
            ("speed.pursuer_speed", self.speed.pursuer_speed),
            ("speed.return_speed", self.speed.return_speed),
        ];
        for (key, value) in speeds {
            if value >= tile {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be less than geometry.tile_size ({tile}), got {value}"),
                });
            }
        }
        if self.timing.patrol_ticks + self.timing.chase_ticks == 0 {
            return Err(ConfigError::Invalid {
                key: "timing.patrol_ticks",
                reason: "patrol and chase durations cannot both be zero".into(),
            });
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        tracing::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    tracing::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
