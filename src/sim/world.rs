/// WorldState: the complete state of a running session.
///
/// ## Ownership
///
/// The session owns the `MazeGrid` and lends it read-only to the
/// collision field each tick. Agents hold value copies of their spawn
/// data. Only event application (`apply`) and the rebuild/advance paths
/// mutate the maze.
///
/// ## Timers
///
/// Every delay is a deadline tick compared against `tick`, never a sleep:
///   - `level_start`: drop shields, release the remaining pursuers
///   - `rebuild`    : after a defeat: rebuild the maze or end the game
/// Frightened deadlines live on each pursuer. Defeat, rebuild and game
/// over cancel everything pending, so nothing fires against a reset maze.
///
/// ## Roam schedule
///
/// Level-wide Patrol/Chase alternation, restarted whenever the level is
/// (re)built.

use crate::config::{GameConfig, ScoringConfig, SpeedConfig, TimingConfig};
use crate::domain::agent::{Agent, Player};
use crate::domain::ai::{PursuerAI, PursuerState, Roam, Signal};
use crate::domain::geometry::{Heading, TileCoord, WorldPos};
use crate::domain::maze::MazeGrid;
use crate::domain::tile::Collectible;
use crate::error::LevelError;
use super::event::GameEvent;
use super::level::{self, MapSource};
use super::score::ScoreKeeper;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Dying,
    GameOver,
}

// ── Timers ──

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub level_start: Option<u64>,
    pub rebuild: Option<u64>,
}

impl Timers {
    pub fn cancel_all(&mut self) {
        *self = Timers::default();
    }

    /// Fire (and clear) the level-start deadline if it is due.
    pub fn take_level_start(&mut self, now: u64) -> bool {
        take_due(&mut self.level_start, now)
    }

    pub fn take_rebuild(&mut self, now: u64) -> bool {
        take_due(&mut self.rebuild, now)
    }
}

fn take_due(slot: &mut Option<u64>, now: u64) -> bool {
    match *slot {
        Some(deadline) if now >= deadline => {
            *slot = None;
            true
        }
        _ => false,
    }
}

// ── Roam schedule ──

#[derive(Clone, Debug)]
pub struct RoamSchedule {
    patrol_ticks: u64,
    chase_ticks: u64,
    current: Roam,
    switch_at: u64,
}

impl RoamSchedule {
    pub fn new(patrol_ticks: u64, chase_ticks: u64) -> Self {
        RoamSchedule { patrol_ticks, chase_ticks, current: Roam::Patrol, switch_at: patrol_ticks }
    }

    pub fn current(&self) -> Roam {
        self.current
    }

    /// Start over in Patrol at tick `now`.
    pub fn restart(&mut self, now: u64) {
        self.current = Roam::Patrol;
        self.switch_at = now + self.patrol_ticks;
    }

    fn duration(&self, roam: Roam) -> u64 {
        match roam {
            Roam::Patrol => self.patrol_ticks,
            Roam::Chase => self.chase_ticks,
        }
    }

    /// Advance to `now`. Returns the new mode if it changed.
    /// A zero-length phase is skipped over.
    pub fn update(&mut self, now: u64) -> Option<Roam> {
        let before = self.current;
        // Both durations zero would never settle; config rejects that.
        for _ in 0..2 {
            if now < self.switch_at {
                break;
            }
            self.current = match self.current {
                Roam::Patrol => Roam::Chase,
                Roam::Chase => Roam::Patrol,
            };
            self.switch_at += self.duration(self.current);
        }
        (self.current != before).then_some(self.current)
    }
}

// ── Read-only snapshot for the rendering boundary ──

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentView {
    pub pos: WorldPos,
    pub tile: TileCoord,
    pub heading: Heading,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PursuerView {
    pub id: usize,
    pub agent: AgentView,
    pub state: PursuerState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub player: AgentView,
    pub player_alive: bool,
    pub pursuers: Vec<PursuerView>,
    pub collectibles: Vec<(TileCoord, Collectible)>,
    pub shields_present: bool,
    pub score: u32,
    pub bonus_items: u32,
    pub lives: u32,
    pub level: u32,
}

// ── World state ──

pub struct WorldState {
    pub maze: MazeGrid,
    pub level_name: String,

    // ── Agents ──
    pub player: Player,
    pub pursuers: Vec<PursuerAI>,

    // ── Session ──
    pub phase: Phase,
    pub tick: u64,
    pub score: ScoreKeeper,
    pub timers: Timers,
    pub roam: RoamSchedule,

    // ── Config ──
    pub speed: SpeedConfig,
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
}

impl WorldState {
    /// Build a session around a loaded maze. Pursuers are assigned to
    /// spawns in load order; the first one (the leader) is enabled at once.
    pub fn new(maze: MazeGrid, level_name: &str, config: &GameConfig) -> Self {
        let frame = maze.frame();
        let player = Player::new(maze.player_spawn(), frame, config.speed.player_speed);
        let pursuers = maze
            .pursuer_spawns()
            .iter()
            .enumerate()
            .map(|(id, &spawn)| {
                PursuerAI::new(
                    id,
                    spawn,
                    patrol_corner(&maze, id),
                    frame,
                    config.speed.pursuer_speed,
                    config.speed.return_speed,
                )
            })
            .collect();

        let mut world = WorldState {
            maze,
            level_name: level_name.to_string(),
            player,
            pursuers,
            phase: Phase::Playing,
            tick: 0,
            score: ScoreKeeper::new(config.lives),
            timers: Timers::default(),
            roam: RoamSchedule::new(config.timing.patrol_ticks, config.timing.chase_ticks),
            speed: config.speed.clone(),
            timing: config.timing.clone(),
            scoring: config.scoring.clone(),
        };
        world.start_level();
        world
    }

    pub fn from_source(source: &MapSource, config: &GameConfig) -> Result<Self, LevelError> {
        let maze = level::build_maze(source, config.geometry.frame())?;
        Ok(WorldState::new(maze, &source.name, config))
    }

    /// Input boundary: set or clear (`Heading::None`) the desired heading.
    pub fn set_desired_heading(&mut self, heading: Heading) {
        self.player.set_desired_heading(heading);
    }

    /// Agents to spawn, leader enabled, level-start and roam schedule armed.
    fn start_level(&mut self) {
        self.player.reset(self.maze.player_spawn());
        for p in self.pursuers.iter_mut() {
            p.reset();
        }
        self.timers.cancel_all();
        self.timers.level_start = Some(self.tick + self.timing.level_start_ticks);
        self.roam.restart(self.tick);
        if let Some(leader) = self.pursuers.first_mut() {
            leader.handle(Signal::Enable);
        }
        self.phase = Phase::Playing;
    }

    /// Restore collectibles and shields, reposition every agent.
    pub fn rebuild(&mut self) {
        self.maze.rebuild();
        self.start_level();
        tracing::info!(tick = self.tick, lives = self.score.lives, "maze rebuilt");
    }

    /// Level-start deadline: shields down, every pursuer released.
    pub fn release_pursuers(&mut self, events: &mut Vec<GameEvent>) {
        if self.maze.drop_shields() {
            events.push(GameEvent::ShieldsDropped);
        }
        for p in self.pursuers.iter_mut() {
            p.handle(Signal::Enable);
        }
        events.push(GameEvent::PursuersReleased);
        tracing::info!(tick = self.tick, "pursuers released");
    }

    pub fn game_over(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
        tracing::info!(score = self.score.score, level = self.score.level, "game over");
    }

    /// Apply one event's side effects. Follow-up events (level advance) are
    /// appended to `events`.
    pub fn apply(&mut self, event: &GameEvent, events: &mut Vec<GameEvent>) {
        self.score.record(event);
        match *event {
            GameEvent::PelletEaten { tile, .. } | GameEvent::BonusEaten { tile, .. } => {
                self.maze.consume(tile);
            }
            GameEvent::PowerItem { until } => {
                for p in self.pursuers.iter_mut() {
                    p.handle(Signal::PowerItem { until });
                }
            }
            GameEvent::PursuerCaptured { id, .. } => {
                if let Some(p) = self.pursuers.iter_mut().find(|p| p.id == id) {
                    p.handle(Signal::Capture);
                }
            }
            GameEvent::PlayerDefeated { by } => {
                self.player.alive = false;
                for p in self.pursuers.iter_mut() {
                    p.handle(Signal::Disable);
                }
                self.timers.cancel_all();
                self.timers.rebuild = Some(self.tick + self.timing.respawn_ticks);
                self.phase = Phase::Dying;
                tracing::info!(tick = self.tick, by, lives = self.score.lives, "player defeated");
            }
            GameEvent::LevelCleared => {
                let level = self.score.level + 1;
                let advanced = GameEvent::LevelAdvanced { level };
                self.score.record(&advanced);
                self.rebuild();
                events.push(advanced);
                tracing::info!(level, "level advanced");
            }
            GameEvent::RoamChanged { roam } => {
                for p in self.pursuers.iter_mut() {
                    p.handle(Signal::RoamChanged(roam));
                }
            }
            GameEvent::ShieldsDropped
            | GameEvent::PursuersReleased
            | GameEvent::MazeRebuilt
            | GameEvent::LevelAdvanced { .. }
            | GameEvent::GameOver => {}
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let view = |a: &Agent| AgentView {
            pos: a.position(),
            tile: a.tile(),
            heading: a.heading(),
        };
        Snapshot {
            tick: self.tick,
            phase: self.phase,
            player: view(&self.player.agent),
            player_alive: self.player.alive,
            pursuers: self
                .pursuers
                .iter()
                .map(|p| PursuerView { id: p.id, agent: view(&p.agent), state: p.state() })
                .collect(),
            collectibles: self.maze.collectibles().map(|(t, s)| (t, s.kind)).collect(),
            shields_present: self.maze.shields_present(),
            score: self.score.score,
            bonus_items: self.score.bonus_items,
            lives: self.score.lives,
            level: self.score.level,
        }
    }
}

/// Patrol corners, round-robin by pursuer id:
/// top-right, top-left, bottom-right, bottom-left.
fn patrol_corner(maze: &MazeGrid, id: usize) -> WorldPos {
    let last_row = maze.rows() as i32 - 1;
    let last_col = maze.cols() as i32 - 1;
    let tile = match id % 4 {
        0 => TileCoord::new(0, last_col),
        1 => TileCoord::new(0, 0),
        2 => TileCoord::new(last_row, last_col),
        _ => TileCoord::new(last_row, 0),
    };
    maze.frame().to_world(tile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(rows: &[&str]) -> WorldState {
        let config = GameConfig::default();
        let maze = MazeGrid::load(&rows.join("\n"), config.geometry.frame()).unwrap();
        WorldState::new(maze, "test", &config)
    }

    #[test]
    fn timers_fire_once_when_due() {
        let mut t = Timers { level_start: Some(5), rebuild: None };
        assert!(!t.take_level_start(4));
        assert!(t.take_level_start(5));
        assert!(!t.take_level_start(6));
        t.rebuild = Some(9);
        t.cancel_all();
        assert!(!t.take_rebuild(100));
    }

    #[test]
    fn roam_schedule_alternates() {
        let mut r = RoamSchedule::new(3, 2);
        r.restart(10);
        assert_eq!(r.update(12), None);
        assert_eq!(r.update(13), Some(Roam::Chase));
        assert_eq!(r.update(14), None);
        assert_eq!(r.update(15), Some(Roam::Patrol));
        assert_eq!(r.update(18), Some(Roam::Chase));
    }

    #[test]
    fn zero_length_chase_is_skipped() {
        let mut r = RoamSchedule::new(3, 0);
        r.restart(0);
        assert_eq!(r.update(3), None);
        assert_eq!(r.current(), Roam::Patrol);
    }

    #[test]
    fn new_session_enables_only_the_leader() {
        let w = world(&["o  sgg"]);
        assert_eq!(w.pursuers[0].state(), PursuerState::Patrol);
        assert_eq!(w.pursuers[1].state(), PursuerState::Idle);
        assert_eq!(w.timers.level_start, Some(300));
        assert_eq!(w.phase, Phase::Playing);
        assert!(w.maze.shields_present());
    }

    #[test]
    fn patrol_corners_are_round_robin() {
        let w = world(&["o  ", "   ", "ggg", "ggg"]);
        let frame = w.maze.frame();
        let corners: Vec<WorldPos> = w.pursuers.iter().map(|p| patrol_corner(&w.maze, p.id)).collect();
        assert_eq!(corners[0], frame.to_world(TileCoord::new(0, 2)));
        assert_eq!(corners[1], frame.to_world(TileCoord::new(0, 0)));
        assert_eq!(corners[2], frame.to_world(TileCoord::new(3, 2)));
        assert_eq!(corners[3], frame.to_world(TileCoord::new(3, 0)));
        assert_eq!(corners[4], corners[0]);
    }

    #[test]
    fn defeat_cancels_pending_timers() {
        let mut w = world(&["o g"]);
        w.tick = 7;
        let mut events = vec![];
        w.apply(&GameEvent::PlayerDefeated { by: 0 }, &mut events);
        assert_eq!(w.timers.level_start, None);
        assert_eq!(w.timers.rebuild, Some(7 + 240));
        assert_eq!(w.phase, Phase::Dying);
        assert_eq!(w.score.lives, 2);
        assert!(!w.player.alive);
        assert!(w.pursuers.iter().all(|p| p.state() == PursuerState::Idle));
    }

    #[test]
    fn level_clear_advances_and_restores() {
        let mut w = world(&["o.p"]);
        w.maze.consume(TileCoord::new(0, 1));
        let mut events = vec![];
        w.apply(&GameEvent::LevelCleared, &mut events);
        assert_eq!(events, vec![GameEvent::LevelAdvanced { level: 2 }]);
        assert_eq!(w.score.level, 2);
        assert_eq!(w.maze.remaining_collectibles(), 2);
    }

    #[test]
    fn snapshot_reflects_state() {
        let w = world(&["o.pg"]);
        let snap = w.snapshot();
        assert_eq!(snap.player.tile, TileCoord::new(0, 0));
        assert_eq!(snap.player.pos, WorldPos::new(160.0, 50.0));
        assert_eq!(snap.pursuers.len(), 1);
        assert_eq!(snap.pursuers[0].state, PursuerState::Patrol);
        assert_eq!(snap.collectibles, vec![
            (TileCoord::new(0, 1), Collectible::Pellet),
            (TileCoord::new(0, 2), Collectible::Bonus),
        ]);
        assert_eq!(snap.lives, 3);
        assert_eq!(snap.level, 1);
        assert!(snap.player_alive);
    }
}
