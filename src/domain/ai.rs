/// Pursuer AI: behavior state machine + greedy direction selection.
///
/// States:
///   Idle ──Enable──▶ Patrol/Chase ──PowerItem──▶ Frightened ──Capture──▶ Captured
///   Captured ──(next update)──▶ Returning ──ReachedHome──▶ Patrol/Chase
///   Frightened ──FrightenedExpired──▶ Patrol/Chase
///   any ──Disable──▶ Idle
///
/// Patrol vs Chase follows the level-wide roam schedule (`RoamChanged`).
/// Every (state, signal) pair not listed above is a no-op.
///
/// Direction selection is one algorithm parameterized by target strategy:
///   - Chase      → close on the player
///   - Patrol     → close on the pursuer's patrol corner
///   - Frightened → flee the player
///   - Returning  → close on the home tile
///
/// It is a local greedy heuristic, not a path search: the axis with the
/// larger displacement wins, and a blocked preference falls back to the
/// first open direction in {up, left, down, right}. Poor choices at one
/// intersection are corrected at the next one.

use super::agent::{Agent, Body};
use super::collision::CollisionField;
use super::geometry::{Heading, TileCoord, TileFrame, WorldPos};
use super::maze::Spawn;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuerState {
    Idle,
    Patrol,
    Chase,
    Frightened,
    Captured,
    Returning,
}

/// Scheduled roaming behavior outside of frightened/returning episodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Roam {
    Patrol,
    Chase,
}

impl Roam {
    fn state(self) -> PursuerState {
        match self {
            Roam::Patrol => PursuerState::Patrol,
            Roam::Chase => PursuerState::Chase,
        }
    }
}

/// Inputs to the state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signal {
    Enable,
    /// A power item was consumed; frightened until tick `until`.
    PowerItem { until: u64 },
    Capture,
    /// Automatic follow-up of `Capture`, applied on the next update.
    CaptureSettled,
    ReachedHome,
    FrightenedExpired,
    RoamChanged(Roam),
    Disable,
}

/// Per-tick context for movement decisions.
pub struct NavContext<'a> {
    pub field: CollisionField<'a>,
    pub now: u64,
    pub player: WorldPos,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Strategy {
    Approach,
    Flee,
}

#[derive(Clone, Debug)]
pub struct PursuerAI {
    pub id: usize,
    pub agent: Agent,
    state: PursuerState,
    roam: Roam,
    home: Spawn,
    patrol_target: WorldPos,
    frightened_until: u64,
    roam_speed: f32,
    return_speed: f32,
    /// Intersection tile already decided on during the current visit.
    decided_at: Option<TileCoord>,
}

impl PursuerAI {
    pub fn new(
        id: usize,
        home: Spawn,
        patrol_target: WorldPos,
        frame: TileFrame,
        roam_speed: f32,
        return_speed: f32,
    ) -> Self {
        PursuerAI {
            id,
            agent: Agent::new(home, frame, Body::Box, roam_speed),
            state: PursuerState::Idle,
            roam: Roam::Patrol,
            home,
            patrol_target,
            frightened_until: 0,
            roam_speed,
            return_speed,
            decided_at: None,
        }
    }

    pub fn state(&self) -> PursuerState { self.state }
    pub fn frightened_until(&self) -> u64 { self.frightened_until }

    /// Capturable right now?
    pub fn is_frightened(&self) -> bool {
        self.state == PursuerState::Frightened
    }

    /// Harmless to the player: Captured or Returning.
    pub fn is_retreating(&self) -> bool {
        matches!(self.state, PursuerState::Captured | PursuerState::Returning)
    }

    // ══════════════════════════════════════════════════════════
    // State machine
    // ══════════════════════════════════════════════════════════

    /// Apply a signal. Returns the new state if it changed.
    pub fn handle(&mut self, signal: Signal) -> Option<PursuerState> {
        use PursuerState as S;

        let next = match (self.state, signal) {
            (_, Signal::Disable) => S::Idle,
            (S::Idle, Signal::Enable) => self.roam.state(),

            (S::Patrol | S::Chase | S::Frightened, Signal::PowerItem { until }) => {
                self.frightened_until = until;
                S::Frightened
            }

            (S::Frightened, Signal::Capture) => S::Captured,
            (S::Captured, Signal::CaptureSettled) => {
                self.agent.set_speed(self.return_speed);
                S::Returning
            }
            (S::Returning, Signal::ReachedHome) => {
                self.agent.set_speed(self.roam_speed);
                self.roam.state()
            }
            (S::Frightened, Signal::FrightenedExpired) => self.roam.state(),

            (state, Signal::RoamChanged(roam)) => {
                self.roam = roam;
                match state {
                    S::Patrol | S::Chase => roam.state(),
                    other => other,
                }
            }

            (state, _) => state,
        };

        if next == self.state {
            return None;
        }
        tracing::debug!(pursuer = self.id, from = ?self.state, to = ?next, ?signal, "pursuer transition");
        if next == S::Idle {
            self.agent.set_speed(self.roam_speed);
            self.frightened_until = 0;
        }
        self.state = next;
        Some(next)
    }

    /// Back to the home tile, inert (level rebuild). Never reconstructs.
    pub fn reset(&mut self) {
        self.agent.reposition(self.home);
        self.agent.set_speed(self.roam_speed);
        self.state = PursuerState::Idle;
        self.roam = Roam::Patrol;
        self.frightened_until = 0;
        self.decided_at = None;
    }

    // ══════════════════════════════════════════════════════════
    // Per-tick update
    // ══════════════════════════════════════════════════════════

    /// Advance one tick: settle automatic transitions, pick a heading at
    /// decision points, then move if the heading is open.
    pub fn update(&mut self, ctx: &NavContext) {
        match self.state {
            PursuerState::Idle => return,
            PursuerState::Captured => {
                self.handle(Signal::CaptureSettled);
            }
            PursuerState::Frightened if ctx.now >= self.frightened_until => {
                self.handle(Signal::FrightenedExpired);
            }
            _ => {}
        }

        let open = self.open_directions(&ctx.field);
        let heading = self.agent.heading();
        let tile = self.agent.tile();

        if self.decided_at != Some(tile) {
            self.decided_at = None;
        }

        let blocked = heading == Heading::None || !open.contains(&heading);
        let at_fresh_intersection = self.agent.is_aligned()
            && self.decided_at.is_none()
            && ctx.field.maze().is_intersection(tile);

        if blocked || at_fresh_intersection {
            if let Some(choice) = self.choose_direction(&open, ctx.player) {
                self.agent.set_heading(choice);
            }
            if at_fresh_intersection {
                self.decided_at = Some(tile);
            }
        }

        let heading = self.agent.heading();
        if open.contains(&heading) {
            self.agent.try_advance(heading, &ctx.field);
        }

        if self.state == PursuerState::Returning && self.agent.tile() == self.home.tile {
            self.handle(Signal::ReachedHome);
        }
    }

    /// Directions a one-tick move can take without collision, in priority
    /// order. The reverse of the current heading is excluded unless it is
    /// the only option (dead end).
    pub fn open_directions(&self, field: &CollisionField) -> Vec<Heading> {
        let all: Vec<Heading> = Heading::PRIORITY
            .iter()
            .copied()
            .filter(|&h| self.agent.can_advance(h, field))
            .collect();
        let back = self.agent.heading().reverse();
        if all.len() > 1 && back != Heading::None {
            all.into_iter().filter(|&h| h != back).collect()
        } else {
            all
        }
    }

    /// Target and strategy for the current state.
    fn objective(&self, player: WorldPos) -> (WorldPos, Strategy) {
        match self.state {
            PursuerState::Frightened => (player, Strategy::Flee),
            PursuerState::Returning | PursuerState::Captured => (self.home.pos, Strategy::Approach),
            PursuerState::Patrol => (self.patrol_target, Strategy::Approach),
            PursuerState::Chase | PursuerState::Idle => (player, Strategy::Approach),
        }
    }

    fn choose_direction(&self, open: &[Heading], player: WorldPos) -> Option<Heading> {
        let (target, strategy) = self.objective(player);
        select_heading(self.agent.position(), target, strategy == Strategy::Flee, open)
    }
}

/// Greedy axis-priority choice.
///
/// Close (or, when `flee`, open up) the axis with the larger absolute
/// displacement; ties go to the horizontal axis. If that direction is not
/// open, take the first open direction in {up, left, down, right}.
pub fn select_heading(from: WorldPos, target: WorldPos, flee: bool, open: &[Heading]) -> Option<Heading> {
    let dx = target.x - from.x;
    let dy = target.y - from.y;

    let toward = if dx.abs() >= dy.abs() {
        if dx > 0.0 { Heading::Right } else if dx < 0.0 { Heading::Left } else { Heading::None }
    } else if dy > 0.0 {
        Heading::Down
    } else {
        Heading::Up
    };
    let preferred = if flee { toward.reverse() } else { toward };

    if preferred != Heading::None && open.contains(&preferred) {
        return Some(preferred);
    }
    Heading::PRIORITY.iter().copied().find(|h| open.contains(h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::maze::MazeGrid;

    const ALL: [Heading; 4] = [Heading::Up, Heading::Left, Heading::Down, Heading::Right];

    fn frame() -> TileFrame {
        TileFrame::new(10.0, WorldPos::new(0.0, 0.0))
    }

    fn maze(rows: &[&str]) -> MazeGrid {
        MazeGrid::load(&rows.join("\n"), frame()).unwrap()
    }

    fn pursuer(m: &MazeGrid) -> PursuerAI {
        PursuerAI::new(0, m.pursuer_spawns()[0], WorldPos::new(0.0, 0.0), frame(), 2.5, 5.0)
    }

    fn at(col: f32, row: f32) -> WorldPos {
        WorldPos::new(col * 10.0, row * 10.0)
    }

    // ── Tie-break ──

    #[test]
    fn chase_prefers_larger_horizontal_displacement() {
        let from = at(5.0, 5.0);
        let target = from.offset(5.0, 2.0);
        assert_eq!(select_heading(from, target, false, &ALL), Some(Heading::Right));
    }

    #[test]
    fn chase_prefers_larger_vertical_displacement() {
        let from = at(5.0, 5.0);
        assert_eq!(select_heading(from, from.offset(1.0, -4.0), false, &ALL), Some(Heading::Up));
        assert_eq!(select_heading(from, from.offset(-1.0, 4.0), false, &ALL), Some(Heading::Down));
    }

    #[test]
    fn equal_displacement_goes_horizontal() {
        let from = at(5.0, 5.0);
        assert_eq!(select_heading(from, from.offset(-3.0, 3.0), false, &ALL), Some(Heading::Left));
    }

    #[test]
    fn blocked_preference_falls_back_in_priority_order() {
        let from = at(5.0, 5.0);
        let target = from.offset(5.0, 2.0);
        let open = [Heading::Left, Heading::Down];
        assert_eq!(select_heading(from, target, false, &open), Some(Heading::Left));
        let open = [Heading::Down];
        assert_eq!(select_heading(from, target, false, &open), Some(Heading::Down));
        assert_eq!(select_heading(from, target, false, &[]), None);
    }

    #[test]
    fn zero_displacement_uses_fallback() {
        let from = at(5.0, 5.0);
        let open = [Heading::Down, Heading::Right];
        assert_eq!(select_heading(from, from, false, &open), Some(Heading::Down));
    }

    #[test]
    fn flee_inverts_preference() {
        let from = at(5.0, 5.0);
        let target = from.offset(5.0, 2.0);
        assert_eq!(select_heading(from, target, true, &ALL), Some(Heading::Left));
        let target = from.offset(1.0, 6.0);
        assert_eq!(select_heading(from, target, true, &ALL), Some(Heading::Up));
    }

    // ── State machine ──

    #[test]
    fn idle_until_enabled() {
        let m = maze(&["og "]);
        let mut g = pursuer(&m);
        assert_eq!(g.state(), PursuerState::Idle);
        assert_eq!(g.handle(Signal::PowerItem { until: 10 }), None);
        assert_eq!(g.handle(Signal::Capture), None);
        assert_eq!(g.handle(Signal::Enable), Some(PursuerState::Patrol));
        assert_eq!(g.handle(Signal::Enable), None);
    }

    #[test]
    fn full_capture_cycle() {
        let m = maze(&["og "]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::RoamChanged(Roam::Chase));
        assert_eq!(g.state(), PursuerState::Chase);

        assert_eq!(g.handle(Signal::PowerItem { until: 50 }), Some(PursuerState::Frightened));
        // Re-trigger refreshes the deadline only
        assert_eq!(g.handle(Signal::PowerItem { until: 90 }), None);
        assert_eq!(g.frightened_until(), 90);

        assert_eq!(g.handle(Signal::Capture), Some(PursuerState::Captured));
        assert!(g.is_retreating());
        assert_eq!(g.handle(Signal::PowerItem { until: 120 }), None);
        assert_eq!(g.handle(Signal::CaptureSettled), Some(PursuerState::Returning));
        assert_eq!(g.agent.speed(), 5.0);
        assert_eq!(g.handle(Signal::Capture), None);
        assert_eq!(g.handle(Signal::ReachedHome), Some(PursuerState::Chase));
        assert_eq!(g.agent.speed(), 2.5);
    }

    #[test]
    fn capture_only_from_frightened() {
        let m = maze(&["og "]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        assert_eq!(g.handle(Signal::Capture), None);
        assert_eq!(g.state(), PursuerState::Patrol);
    }

    #[test]
    fn roam_change_is_remembered_while_frightened() {
        let m = maze(&["og "]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::PowerItem { until: 5 });
        assert_eq!(g.handle(Signal::RoamChanged(Roam::Chase)), None);
        assert_eq!(g.state(), PursuerState::Frightened);
        assert_eq!(g.handle(Signal::FrightenedExpired), Some(PursuerState::Chase));
    }

    #[test]
    fn disable_from_anywhere() {
        let m = maze(&["og "]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::PowerItem { until: 5 });
        assert_eq!(g.handle(Signal::Disable), Some(PursuerState::Idle));
        assert_eq!(g.frightened_until(), 0);
    }

    // ── Movement ──

    fn ctx<'a>(m: &'a MazeGrid, now: u64, player: WorldPos) -> NavContext<'a> {
        NavContext { field: CollisionField::new(m), now, player }
    }

    #[test]
    fn idle_pursuer_does_not_move() {
        let m = maze(&["og  "]);
        let mut g = pursuer(&m);
        g.update(&ctx(&m, 1, at(0.0, 0.0)));
        assert_eq!(g.agent.position(), at(1.0, 0.0));
    }

    #[test]
    fn reverse_excluded_except_at_dead_end() {
        let m = maze(&[
            "xxxxxx",
            "xo g x",
            "xxxxxx",
        ]);
        let mut g = pursuer(&m);
        let field = CollisionField::new(&m);
        g.agent.set_heading(Heading::Right);
        assert_eq!(g.open_directions(&field), vec![Heading::Right]);
        // Walk to the dead end at column 4
        g.agent.try_advance(Heading::Right, &field);
        g.agent.try_advance(Heading::Right, &field);
        g.agent.try_advance(Heading::Right, &field);
        g.agent.try_advance(Heading::Right, &field);
        assert_eq!(g.agent.tile(), TileCoord::new(1, 4));
        assert_eq!(g.open_directions(&field), vec![Heading::Left]);
    }

    #[test]
    fn corridor_keeps_heading_away_from_target() {
        // Player is behind it; no intersection, so no re-evaluation.
        let m = maze(&[
            "xxxxxxx",
            "xo g  x",
            "xxxxxxx",
        ]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::RoamChanged(Roam::Chase));
        g.agent.set_heading(Heading::Right);
        for tick in 0..4 {
            g.update(&ctx(&m, tick, at(1.0, 1.0)));
        }
        assert_eq!(g.agent.tile(), TileCoord::new(1, 4));
        assert_eq!(g.agent.heading(), Heading::Right);
    }

    #[test]
    fn chooses_toward_player_at_intersection() {
        let m = maze(&[
            "xxxxxxx",
            "xxx xxx",
            "x  g  x",
            "xxx xxx",
            "xxx xxx",
            "xxxoxxx",
            "xxxxxxx",
        ]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::RoamChanged(Roam::Chase));
        let player = m.player_spawn().pos;
        g.update(&ctx(&m, 1, player));
        assert_eq!(g.agent.heading(), Heading::Down);
        assert_eq!(g.agent.position(), at(3.0, 2.25));
    }

    #[test]
    fn frightened_flees_then_expires() {
        let m = maze(&[
            "xxxxxxx",
            "xxx xxx",
            "x  g  x",
            "xxx xxx",
            "xxx xxx",
            "xxxoxxx",
            "xxxxxxx",
        ]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::PowerItem { until: 3 });
        let player = m.player_spawn().pos;
        g.update(&ctx(&m, 1, player));
        assert_eq!(g.agent.heading(), Heading::Up);
        g.update(&ctx(&m, 3, player));
        assert_eq!(g.state(), PursuerState::Patrol);
    }

    #[test]
    fn returning_reaches_home_and_resumes() {
        let m = maze(&[
            "xxxxxx",
            "xog  x",
            "xxxxxx",
        ]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.handle(Signal::PowerItem { until: 100 });
        // Pretend it was chased off to the far end before capture
        let field = CollisionField::new(&m);
        g.agent.try_advance(Heading::Right, &field);
        for _ in 0..7 {
            g.agent.try_advance(Heading::Right, &field);
        }
        assert_eq!(g.agent.tile(), TileCoord::new(1, 4));
        g.handle(Signal::Capture);

        let player = m.player_spawn().pos;
        let mut tick = 0;
        while g.state() != PursuerState::Patrol && tick < 20 {
            g.update(&ctx(&m, tick, player));
            tick += 1;
        }
        assert_eq!(g.state(), PursuerState::Patrol);
        assert_eq!(g.agent.tile(), TileCoord::new(1, 2));
        assert_eq!(g.agent.speed(), 2.5);
    }

    #[test]
    fn reset_restores_home_and_idle() {
        let m = maze(&["og  "]);
        let mut g = pursuer(&m);
        g.handle(Signal::Enable);
        g.agent.try_advance(Heading::Right, &CollisionField::new(&m));
        g.reset();
        assert_eq!(g.state(), PursuerState::Idle);
        assert_eq!(g.agent.tile(), TileCoord::new(0, 1));
        assert!(g.agent.is_aligned());
    }
}
