/// Tile-space and world-space coordinates, headings, and collision shapes.
///
/// Tile space is integer (row, col). World space is continuous (x, y),
/// with the grid placed at a screen-space origin. A `TileFrame` converts
/// between the two: tile -> world yields the top-left corner of the tile,
/// world -> tile floors, so the pair round-trips for tile-aligned points.
///
/// Shape overlap is strict: two shapes that merely touch do not intersect.
/// A one-tile agent therefore fits a one-tile corridor exactly.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub row: i32,
    pub col: i32,
}

impl TileCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        TileCoord { row, col }
    }

    /// Neighbour one step along `heading` (itself for `Heading::None`).
    pub fn step(self, heading: Heading) -> Self {
        let (dx, dy) = heading.delta();
        TileCoord { row: self.row + dy, col: self.col + dx }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        WorldPos { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        WorldPos { x: self.x + dx, y: self.y + dy }
    }
}

/// Facing / movement direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Heading {
    /// Fixed fallback order used by direction selection.
    pub const PRIORITY: [Heading; 4] = [Heading::Up, Heading::Left, Heading::Down, Heading::Right];

    /// Unit step as (dx, dy); y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
            Heading::None => (0, 0),
        }
    }

    pub fn reverse(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
            Heading::None => Heading::None,
        }
    }
}

/// Axis-aligned rectangle; (x, y) is the top-left corner.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }

    /// Strict-interior overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Is `other` entirely inside (edges may coincide)?
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Circle {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
}

impl Circle {
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        let nx = self.cx.clamp(rect.x, rect.right());
        let ny = self.cy.clamp(rect.y, rect.bottom());
        let (dx, dy) = (self.cx - nx, self.cy - ny);
        dx * dx + dy * dy < self.r * self.r
    }

    pub fn intersects_circle(&self, other: &Circle) -> bool {
        let (dx, dy) = (self.cx - other.cx, self.cy - other.cy);
        let reach = self.r + other.r;
        dx * dx + dy * dy < reach * reach
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.cx - self.r, self.cy - self.r, self.r * 2.0, self.r * 2.0)
    }
}

/// Collision shape attached to an agent. Only ever used for queries.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Shape {
    Rect(Rect),
    Circle(Circle),
}

impl Shape {
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            Shape::Rect(r) => r.intersects(rect),
            Shape::Circle(c) => c.intersects_rect(rect),
        }
    }

    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Rect(a), Shape::Rect(b)) => a.intersects(b),
            (Shape::Rect(r), Shape::Circle(c)) | (Shape::Circle(c), Shape::Rect(r)) => {
                c.intersects_rect(r)
            }
            (Shape::Circle(a), Shape::Circle(b)) => a.intersects_circle(b),
        }
    }

    /// Axis-aligned bounding box.
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect(r) => *r,
            Shape::Circle(c) => c.bounds(),
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Shape {
        match *self {
            Shape::Rect(r) => Shape::Rect(Rect { x: r.x + dx, y: r.y + dy, ..r }),
            Shape::Circle(c) => Shape::Circle(Circle { cx: c.cx + dx, cy: c.cy + dy, ..c }),
        }
    }
}

/// Placement of the tile grid in world space.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TileFrame {
    pub tile_size: f32,
    pub origin: WorldPos,
}

impl TileFrame {
    pub const fn new(tile_size: f32, origin: WorldPos) -> Self {
        TileFrame { tile_size, origin }
    }

    /// Top-left corner of the tile.
    pub fn to_world(&self, tile: TileCoord) -> WorldPos {
        WorldPos {
            x: self.origin.x + tile.col as f32 * self.tile_size,
            y: self.origin.y + tile.row as f32 * self.tile_size,
        }
    }

    pub fn to_tile(&self, pos: WorldPos) -> TileCoord {
        TileCoord {
            row: ((pos.y - self.origin.y) / self.tile_size).floor() as i32,
            col: ((pos.x - self.origin.x) / self.tile_size).floor() as i32,
        }
    }

    pub fn tile_rect(&self, tile: TileCoord) -> Rect {
        let p = self.to_world(tile);
        Rect::new(p.x, p.y, self.tile_size, self.tile_size)
    }

    /// Centered square of side `tile_size * fraction` inside the tile.
    pub fn inset_rect(&self, tile: TileCoord, fraction: f32) -> Rect {
        let p = self.to_world(tile);
        let side = self.tile_size * fraction;
        let pad = (self.tile_size - side) / 2.0;
        Rect::new(p.x + pad, p.y + pad, side, side)
    }

    pub fn is_aligned(&self, pos: WorldPos) -> bool {
        self.to_world(self.to_tile(pos)) == pos
    }

    /// Distance from `pos` to the next tile line ahead along `heading`.
    /// A point already on a line reports a full tile.
    pub fn distance_to_boundary(&self, pos: WorldPos, heading: Heading) -> f32 {
        let ts = self.tile_size;
        let ox = (pos.x - self.origin.x).rem_euclid(ts);
        let oy = (pos.y - self.origin.y).rem_euclid(ts);
        let ahead = |offset: f32, forward: bool| {
            if offset == 0.0 {
                ts
            } else if forward {
                ts - offset
            } else {
                offset
            }
        };
        match heading {
            Heading::Right => ahead(ox, true),
            Heading::Left => ahead(ox, false),
            Heading::Down => ahead(oy, true),
            Heading::Up => ahead(oy, false),
            Heading::None => 0.0,
        }
    }
}
