/// CollisionField: "is this candidate shape blocked?"
///
/// Pure queries over a borrowed `MazeGrid`, no side effects. Barriers are
/// walls plus shields while they are present. Collectibles never block;
/// they are found with `collectibles_hit`, a separate overlap query.
///
/// Shapes are tested against every barrier rectangle. Maze scale is tens
/// to a few hundred rectangles, so a linear scan is exact and deterministic.

use super::geometry::{Shape, TileCoord};
use super::maze::{CollectibleSite, MazeGrid};

/// Immutable view of the maze for collision queries.
#[derive(Clone, Copy)]
pub struct CollisionField<'a> {
    maze: &'a MazeGrid,
}

impl<'a> CollisionField<'a> {
    pub fn new(maze: &'a MazeGrid) -> Self {
        CollisionField { maze }
    }

    pub fn maze(&self) -> &'a MazeGrid {
        self.maze
    }

    /// True iff the shape intersects a wall or a present shield.
    pub fn would_collide(&self, shape: &Shape) -> bool {
        self.maze.walls().iter().any(|w| shape.intersects_rect(w))
            || self.maze.shields().iter().any(|s| shape.intersects_rect(s))
    }

    /// Is the shape's bounding box inside the grid?
    pub fn within_bounds(&self, shape: &Shape) -> bool {
        self.maze.bounds().contains(&shape.bounds())
    }

    /// A committed position must pass this: no barrier hit, never off-grid.
    pub fn permits(&self, shape: &Shape) -> bool {
        self.within_bounds(shape) && !self.would_collide(shape)
    }

    /// Active collectibles overlapping the shape, in tile order.
    pub fn collectibles_hit(&self, shape: &Shape) -> Vec<(TileCoord, CollectibleSite)> {
        self.maze
            .collectibles()
            .filter(|(_, site)| shape.intersects_rect(&site.rect))
            .map(|(tile, site)| (tile, *site))
            .collect()
    }
}
