/// Agents: the shared motion primitive for the player and the pursuers.
///
/// An agent owns a continuous world position (authoritative, the top-left
/// corner of its one-tile bounding square) and a cached tile coordinate that
/// is refreshed on every committed move. Moves are proposed as shapes,
/// checked against the `CollisionField` by the owning controller, and only
/// then committed.
///
/// A single move never crosses a tile line: the per-tick distance is
/// clamped to the next boundary ahead, so agents always land exactly on
/// tile-aligned positions whatever their speed.

use super::collision::CollisionField;
use super::geometry::{Circle, Heading, Rect, Shape, TileCoord, TileFrame, WorldPos};
use super::maze::Spawn;

/// Collision body; both kinds span exactly one tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Body {
    Box,   // pursuers
    Round, // the player
}

#[derive(Clone, Debug)]
pub struct Agent {
    pos: WorldPos,
    tile: TileCoord,
    heading: Heading,
    speed: f32,
    body: Body,
    frame: TileFrame,
}

impl Agent {
    pub fn new(spawn: Spawn, frame: TileFrame, body: Body, speed: f32) -> Self {
        Agent {
            pos: spawn.pos,
            tile: frame.to_tile(spawn.pos),
            heading: Heading::None,
            speed,
            body,
            frame,
        }
    }

    pub fn position(&self) -> WorldPos { self.pos }
    pub fn tile(&self) -> TileCoord { self.tile }
    pub fn heading(&self) -> Heading { self.heading }
    pub fn speed(&self) -> f32 { self.speed }

    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Exactly on a tile's top-left corner?
    pub fn is_aligned(&self) -> bool {
        self.frame.is_aligned(self.pos)
    }

    pub fn shape(&self) -> Shape {
        self.shape_at(self.pos)
    }

    fn shape_at(&self, pos: WorldPos) -> Shape {
        let ts = self.frame.tile_size;
        match self.body {
            Body::Box => Shape::Rect(Rect::new(pos.x, pos.y, ts, ts)),
            Body::Round => Shape::Circle(Circle {
                cx: pos.x + ts / 2.0,
                cy: pos.y + ts / 2.0,
                r: ts / 2.0,
            }),
        }
    }

    /// Distance this agent covers in one tick along `heading`.
    pub fn step_distance(&self, heading: Heading) -> f32 {
        self.speed.min(self.frame.distance_to_boundary(self.pos, heading))
    }

    /// Hypothetical shape after moving `distance` along `heading`.
    /// Does not mutate.
    pub fn propose_move(&self, heading: Heading, distance: f32) -> Shape {
        let (dx, dy) = heading.delta();
        self.shape_at(self.pos.offset(dx as f32 * distance, dy as f32 * distance))
    }

    /// Adopt a shape previously returned by `propose_move`. The caller is
    /// responsible for having checked it against the collision field.
    pub fn commit(&mut self, shape: Shape) {
        let b = shape.bounds();
        self.pos = WorldPos::new(b.x, b.y);
        self.tile = self.frame.to_tile(self.pos);
    }

    /// Would a one-tick move along `heading` be legal?
    pub fn can_advance(&self, heading: Heading, field: &CollisionField) -> bool {
        if heading == Heading::None {
            return false;
        }
        field.permits(&self.propose_move(heading, self.step_distance(heading)))
    }

    /// Propose, check and commit a one-tick move. Updates the heading on
    /// success; leaves everything untouched when blocked.
    pub fn try_advance(&mut self, heading: Heading, field: &CollisionField) -> bool {
        if heading == Heading::None {
            return false;
        }
        let candidate = self.propose_move(heading, self.step_distance(heading));
        if !field.permits(&candidate) {
            return false;
        }
        self.commit(candidate);
        self.heading = heading;
        true
    }

    /// Put the agent back on a spawn point (level rebuild).
    pub fn reposition(&mut self, spawn: Spawn) {
        self.pos = spawn.pos;
        self.tile = self.frame.to_tile(spawn.pos);
        self.heading = Heading::None;
    }
}

/// Player controller: a round agent steered by a buffered desired heading.
///
/// Each tick the desired heading is tried first; if it is blocked the
/// player keeps its current heading, so a turn pressed early is taken at
/// the first opening. A cleared desired heading stops the player.
#[derive(Clone, Debug)]
pub struct Player {
    pub agent: Agent,
    desired: Heading,
    pub alive: bool,
}

impl Player {
    pub fn new(spawn: Spawn, frame: TileFrame, speed: f32) -> Self {
        Player {
            agent: Agent::new(spawn, frame, Body::Round, speed),
            desired: Heading::None,
            alive: true,
        }
    }

    /// Input boundary: set or clear (`Heading::None`) the desired heading.
    pub fn set_desired_heading(&mut self, heading: Heading) {
        self.desired = heading;
    }

    pub fn desired_heading(&self) -> Heading {
        self.desired
    }

    /// Consume the desired heading for this tick. Returns whether it moved.
    pub fn update(&mut self, field: &CollisionField) -> bool {
        if !self.alive || self.desired == Heading::None {
            return false;
        }
        if self.agent.try_advance(self.desired, field) {
            return true;
        }
        let current = self.agent.heading();
        current != self.desired && self.agent.try_advance(current, field)
    }

    pub fn reset(&mut self, spawn: Spawn) {
        self.agent.reposition(spawn);
        self.desired = Heading::None;
        self.alive = true;
    }
}
