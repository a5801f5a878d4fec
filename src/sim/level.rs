/// Level loader: map text from a file, or the embedded default maze.
///
/// ## Sources (priority order):
///   1. `map_file` from config, if it exists
///   2. Built-in embedded maze
///
/// ## Map file format (`.txt`):
///   Optional: `# Maze Name` (lines starting with `#` are header lines;
///             the first one names the maze)
///   Lines: map rows, one character per tile
///
/// ## Tile legend:
///   'x' = Wall                   's' = Shield (dropped at level start)
///   '.' = Pellet                 'p' = Bonus (power item)
///   'o' = Player spawn           'g' = Pursuer spawn
///   ' ' = Empty

use std::path::Path;

use crate::domain::geometry::TileFrame;
use crate::domain::maze::MazeGrid;
use crate::error::LevelError;

/// Map text plus its display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapSource {
    pub name: String,
    pub rows: String,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Read the configured map file; fall back to the embedded maze when it
/// does not exist. A file that exists but cannot be read is an error.
pub fn load_map_source(path: &Path) -> Result<MapSource, LevelError> {
    if !path.is_file() {
        tracing::info!(path = %path.display(), "map file not found; using built-in maze");
        return Ok(embedded_maze());
    }
    let content = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_map_file(&content))
}

/// Parse a map file's content into name + rows. Rows are not validated
/// here; `MazeGrid::load` does that.
pub fn parse_map_file(content: &str) -> MapSource {
    let mut name = String::new();
    let mut rows = Vec::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix('#') {
            if name.is_empty() {
                name = header.trim().to_string();
            }
        } else {
            rows.push(line);
        }
    }

    if name.is_empty() {
        name = "Unnamed Maze".to_string();
    }

    MapSource { name, rows: rows.join("\n") }
}

/// Build a grid from a map source. Map format errors propagate unchanged.
pub fn build_maze(source: &MapSource, frame: TileFrame) -> Result<MazeGrid, LevelError> {
    let maze = MazeGrid::load(&source.rows, frame)?;
    tracing::info!(name = %source.name, "level loaded");
    Ok(maze)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback maze
// ══════════════════════════════════════════════════════════════

const DEFAULT_MAZE: &[&str] = &[
    "xxxxxxxxxxxxxxxxxxxxx",
    "xp........x........px",
    "x.xxx.xxx.x.xxx.xxx.x",
    "x...................x",
    "x.xxx.x.xxxxx.x.xxx.x",
    "x.....x...x...x.....x",
    "xxxxx.xxx.x.xxx.xxxxx",
    "xxxxx.x       x.xxxxx",
    "xxxxx.x xxsxx x.xxxxx",
    "xxxxx.x xg gx x.xxxxx",
    "xxxxx.x xg gx x.xxxxx",
    "xxxxx.x xxxxx x.xxxxx",
    "xxxxx.x       x.xxxxx",
    "x.........x.........x",
    "x.xxx.xxx.x.xxx.xxx.x",
    "xp.......o.........px",
    "xxxxxxxxxxxxxxxxxxxxx",
];

pub fn embedded_maze() -> MapSource {
    MapSource {
        name: "Classic".to_string(),
        rows: DEFAULT_MAZE.join("\n"),
    }
}
