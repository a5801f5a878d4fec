/// MazeGrid: the parsed tile grid and its static geometry.
///
/// ## Tile layers
///
/// Two layers, like any reloadable level:
///   - `base_tiles`: the map as parsed. **Never mutated** after load.
///   - `tiles`     : effective tiles (consumed collectibles and dropped
///                    shields read back as `Empty`).
///
/// `rebuild()` resets `tiles = base_tiles.clone()` and re-derives geometry,
/// which restores every collectible and every shield. Geometry itself
/// (walls, spawns) never changes for the lifetime of a grid.
///
/// ## Geometry
///
/// Derived once per build from the tile layer, in world space:
///   - walls:   full-tile rectangles
///   - shields: full-width, half-height bars on the top half of the tile
///   - pellets: centered squares, tile/5 wide
///   - bonuses: centered squares, tile/2 wide
///
/// Spawns are kept in load order (row-major), which is also the order
/// pursuers are assigned to them.

use std::collections::BTreeMap;

use super::geometry::{Rect, TileCoord, TileFrame, WorldPos};
use super::tile::{Collectible, TileKind};
use crate::error::MapFormatError;

const PELLET_FRACTION: f32 = 0.2;
const BONUS_FRACTION: f32 = 0.5;

/// A spawn point in both coordinate spaces.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Spawn {
    pub tile: TileCoord,
    pub pos: WorldPos,
}

/// An active (not yet consumed) collectible.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CollectibleSite {
    pub kind: Collectible,
    pub rect: Rect,
}

#[derive(Clone, Debug)]
pub struct MazeGrid {
    base_tiles: Vec<Vec<TileKind>>,
    tiles: Vec<Vec<TileKind>>,
    rows: usize,
    cols: usize,
    frame: TileFrame,

    walls: Vec<Rect>,
    shields: Vec<Rect>,
    collectibles: BTreeMap<TileCoord, CollectibleSite>,

    player_spawn: Spawn,
    pursuer_spawns: Vec<Spawn>,
}

impl MazeGrid {
    /// Parse map text. One character per tile; every row must have the
    /// same length. A trailing `\r` and trailing blank lines are ignored.
    pub fn load(text: &str, frame: TileFrame) -> Result<MazeGrid, MapFormatError> {
        let mut lines: Vec<&str> = text.lines()
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        while lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(MapFormatError::Empty);
        }

        let cols = lines[0].chars().count();
        if cols == 0 {
            return Err(MapFormatError::Empty);
        }

        let mut base_tiles = Vec::with_capacity(lines.len());
        let mut player_tiles = vec![];
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(MapFormatError::RaggedRow { row, expected: cols, found });
            }
            let mut tile_row = Vec::with_capacity(cols);
            for (col, symbol) in line.chars().enumerate() {
                let kind = TileKind::from_symbol(symbol)
                    .ok_or(MapFormatError::UnknownSymbol { symbol, row, col })?;
                if kind == TileKind::PlayerSpawn {
                    player_tiles.push(TileCoord::new(row as i32, col as i32));
                }
                tile_row.push(kind);
            }
            base_tiles.push(tile_row);
        }

        let player_tile = match player_tiles.as_slice() {
            [] => return Err(MapFormatError::MissingPlayerSpawn),
            [only] => *only,
            many => return Err(MapFormatError::MultiplePlayerSpawns { count: many.len() }),
        };

        let mut grid = MazeGrid {
            tiles: base_tiles.clone(),
            base_tiles,
            rows: lines.len(),
            cols,
            frame,
            walls: vec![],
            shields: vec![],
            collectibles: BTreeMap::new(),
            player_spawn: Spawn { tile: player_tile, pos: frame.to_world(player_tile) },
            pursuer_spawns: vec![],
        };
        grid.build();
        tracing::info!(
            rows = grid.rows,
            cols = grid.cols,
            walls = grid.walls.len(),
            collectibles = grid.collectibles.len(),
            pursuers = grid.pursuer_spawns.len(),
            "maze loaded"
        );
        Ok(grid)
    }

    /// Derive world-space geometry and spawn lists from the tile layer.
    fn build(&mut self) {
        self.walls.clear();
        self.shields.clear();
        self.collectibles.clear();
        self.pursuer_spawns.clear();

        let frame = self.frame;
        let ts = frame.tile_size;
        for (r, row) in self.tiles.iter().enumerate() {
            for (c, &kind) in row.iter().enumerate() {
                let tile = TileCoord::new(r as i32, c as i32);
                match kind {
                    TileKind::Wall => self.walls.push(frame.tile_rect(tile)),
                    TileKind::Shield => {
                        let p = frame.to_world(tile);
                        self.shields.push(Rect::new(p.x, p.y, ts, ts / 2.0));
                    }
                    TileKind::Pellet => {
                        let rect = frame.inset_rect(tile, PELLET_FRACTION);
                        self.collectibles.insert(tile, CollectibleSite { kind: Collectible::Pellet, rect });
                    }
                    TileKind::Bonus => {
                        let rect = frame.inset_rect(tile, BONUS_FRACTION);
                        self.collectibles.insert(tile, CollectibleSite { kind: Collectible::Bonus, rect });
                    }
                    TileKind::PursuerSpawn => {
                        self.pursuer_spawns.push(Spawn { tile, pos: frame.to_world(tile) });
                    }
                    TileKind::PlayerSpawn | TileKind::Empty => {}
                }
            }
        }
    }

    /// Restore collectibles and shields. Geometry is unchanged.
    pub fn rebuild(&mut self) {
        self.tiles = self.base_tiles.clone();
        self.build();
        tracing::debug!(collectibles = self.collectibles.len(), "maze rebuilt");
    }

    // ── Tile queries ──

    /// Effective tile at (row, col). Out of range reads as wall.
    #[inline]
    pub fn tile_at(&self, row: i32, col: i32) -> TileKind {
        if row < 0 || col < 0 {
            return TileKind::Wall;
        }
        let (r, c) = (row as usize, col as usize);
        if r < self.rows && c < self.cols {
            self.tiles[r][c]
        } else {
            TileKind::Wall
        }
    }

    #[inline]
    pub fn kind_at(&self, tile: TileCoord) -> TileKind {
        self.tile_at(tile.row, tile.col)
    }

    /// Number of orthogonal neighbours that are not walls.
    pub fn open_neighbors(&self, tile: TileCoord) -> usize {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .iter()
            .filter(|&&(dr, dc)| !self.tile_at(tile.row + dr, tile.col + dc).is_wall())
            .count()
    }

    /// More than two non-wall neighbours: a real choice, not a corridor.
    pub fn is_intersection(&self, tile: TileCoord) -> bool {
        self.open_neighbors(tile) > 2
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.row >= 0 && tile.col >= 0
            && (tile.row as usize) < self.rows
            && (tile.col as usize) < self.cols
    }

    // ── Shields ──

    /// Clear all shield geometry. Returns whether anything was dropped.
    pub fn drop_shields(&mut self) -> bool {
        if self.shields.is_empty() {
            return false;
        }
        self.shields.clear();
        for row in self.tiles.iter_mut() {
            for kind in row.iter_mut().filter(|k| **k == TileKind::Shield) {
                *kind = TileKind::Empty;
            }
        }
        tracing::debug!("shields dropped");
        true
    }

    pub fn shields_present(&self) -> bool {
        !self.shields.is_empty()
    }

    // ── Collectibles ──

    /// Remove a collectible from the active set. Returns its kind the
    /// first time only.
    pub fn consume(&mut self, tile: TileCoord) -> Option<Collectible> {
        let site = self.collectibles.remove(&tile)?;
        self.tiles[tile.row as usize][tile.col as usize] = TileKind::Empty;
        Some(site.kind)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles.len()
    }

    pub fn collectibles(&self) -> impl Iterator<Item = (TileCoord, &CollectibleSite)> + '_ {
        self.collectibles.iter().map(|(t, s)| (*t, s))
    }

    // ── Geometry accessors ──

    pub fn walls(&self) -> &[Rect] { &self.walls }
    pub fn shields(&self) -> &[Rect] { &self.shields }
    pub fn player_spawn(&self) -> Spawn { self.player_spawn }
    pub fn pursuer_spawns(&self) -> &[Spawn] { &self.pursuer_spawns }
    pub fn frame(&self) -> TileFrame { self.frame }
    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    /// World-space rectangle covering the whole grid.
    pub fn bounds(&self) -> Rect {
        let o = self.frame.origin;
        let ts = self.frame.tile_size;
        Rect::new(o.x, o.y, self.cols as f32 * ts, self.rows as f32 * ts)
    }
}
