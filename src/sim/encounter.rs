/// EncounterResolver: post-move overlap queries turned into events.
///
/// Runs once per tick after every agent has moved. It reads the maze, the
/// player and the pursuers but mutates nothing; the caller applies the
/// returned events in order.
///
/// Priority within a tick:
///   1. Collectibles under the player (tile order). A bonus also emits
///      `PowerItem`, and roaming pursuers count as frightened from here on.
///   2. Captures: every overlapping frightened pursuer.
///   3. Defeat: the first overlapping pursuer (by id) that is neither
///      frightened nor retreating. At most one per tick.
///   4. Level clear: only in the tick the last collectible goes, and never
///      in a tick that also defeats the player.

use crate::config::ScoringConfig;
use crate::domain::agent::Player;
use crate::domain::ai::{PursuerAI, PursuerState};
use crate::domain::collision::CollisionField;
use crate::domain::tile::Collectible;
use super::event::GameEvent;

pub struct EncounterResolver<'a> {
    field: CollisionField<'a>,
    scoring: &'a ScoringConfig,
    frightened_ticks: u64,
}

impl<'a> EncounterResolver<'a> {
    pub fn new(field: CollisionField<'a>, scoring: &'a ScoringConfig, frightened_ticks: u64) -> Self {
        EncounterResolver { field, scoring, frightened_ticks }
    }

    pub fn resolve(&self, now: u64, player: &Player, pursuers: &[PursuerAI]) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !player.alive {
            return events;
        }
        let shape = player.agent.shape();

        // ── Collectibles ──
        let hits = self.field.collectibles_hit(&shape);
        let mut power = false;
        for (tile, site) in &hits {
            match site.kind {
                Collectible::Pellet => {
                    events.push(GameEvent::PelletEaten { tile: *tile, points: self.scoring.pellet });
                }
                Collectible::Bonus => {
                    power = true;
                    events.push(GameEvent::BonusEaten { tile: *tile, points: self.scoring.bonus });
                }
            }
        }
        if power {
            events.push(GameEvent::PowerItem { until: now + self.frightened_ticks });
        }

        // ── Pursuers ──
        let mut defeated_by = None;
        for p in pursuers {
            if !shape.intersects(&p.agent.shape()) {
                continue;
            }
            let frightened = p.is_frightened()
                || (power && matches!(p.state(), PursuerState::Patrol | PursuerState::Chase));
            if frightened {
                events.push(GameEvent::PursuerCaptured { id: p.id, points: self.scoring.capture });
            } else if !p.is_retreating() && defeated_by.is_none() {
                defeated_by = Some(p.id);
            }
        }
        if let Some(by) = defeated_by {
            events.push(GameEvent::PlayerDefeated { by });
            return events;
        }

        // ── Level clear ──
        let remaining = self.field.maze().remaining_collectibles();
        if !hits.is_empty() && remaining == hits.len() {
            events.push(GameEvent::LevelCleared);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai::Signal;
    use crate::domain::geometry::{Heading, TileCoord, TileFrame, WorldPos};
    use crate::domain::maze::MazeGrid;

    fn frame() -> TileFrame {
        TileFrame::new(10.0, WorldPos::new(0.0, 0.0))
    }

    fn scoring() -> ScoringConfig {
        ScoringConfig { pellet: 10, bonus: 50, capture: 200 }
    }

    fn maze(rows: &[&str]) -> MazeGrid {
        MazeGrid::load(&rows.join("\n"), frame()).unwrap()
    }

    fn pursuers(m: &MazeGrid) -> Vec<PursuerAI> {
        m.pursuer_spawns()
            .iter()
            .enumerate()
            .map(|(id, &spawn)| PursuerAI::new(id, spawn, WorldPos::default(), frame(), 2.5, 5.0))
            .collect()
    }

    /// Apply the consumption side of the events, as the session does.
    fn consume(m: &mut MazeGrid, events: &[GameEvent]) {
        for e in events {
            match *e {
                GameEvent::PelletEaten { tile, .. } | GameEvent::BonusEaten { tile, .. } => {
                    m.consume(tile);
                }
                _ => {}
            }
        }
    }

    fn resolve(m: &MazeGrid, now: u64, player: &Player, ps: &[PursuerAI]) -> Vec<GameEvent> {
        let scoring = scoring();
        EncounterResolver::new(CollisionField::new(m), &scoring, 480).resolve(now, player, ps)
    }

    #[test]
    fn frightened_overlap_captures_never_defeats() {
        let m = maze(&["og "]);
        let mut ps = pursuers(&m);
        ps[0].handle(Signal::Enable);
        ps[0].handle(Signal::PowerItem { until: 100 });
        let mut player = Player::new(m.player_spawn(), frame(), 2.5);
        player.agent.try_advance(Heading::Right, &CollisionField::new(&m));

        let events = resolve(&m, 1, &player, &ps);
        assert_eq!(events, vec![GameEvent::PursuerCaptured { id: 0, points: 200 }]);
    }

    #[test]
    fn roaming_overlap_defeats() {
        let m = maze(&["og "]);
        let mut ps = pursuers(&m);
        ps[0].handle(Signal::Enable);
        let mut player = Player::new(m.player_spawn(), frame(), 2.5);
        player.agent.try_advance(Heading::Right, &CollisionField::new(&m));

        let events = resolve(&m, 1, &player, &ps);
        assert_eq!(events, vec![GameEvent::PlayerDefeated { by: 0 }]);
    }

    #[test]
    fn touching_is_not_an_encounter() {
        let m = maze(&["og "]);
        let mut ps = pursuers(&m);
        ps[0].handle(Signal::Enable);
        let player = Player::new(m.player_spawn(), frame(), 2.5);
        assert!(resolve(&m, 1, &player, &ps).is_empty());
    }

    #[test]
    fn retreating_pursuer_is_harmless() {
        let m = maze(&["og "]);
        let mut ps = pursuers(&m);
        ps[0].handle(Signal::Enable);
        ps[0].handle(Signal::PowerItem { until: 100 });
        ps[0].handle(Signal::Capture);
        let mut player = Player::new(m.player_spawn(), frame(), 2.5);
        player.agent.try_advance(Heading::Right, &CollisionField::new(&m));
        assert!(resolve(&m, 1, &player, &ps).is_empty());

        ps[0].handle(Signal::CaptureSettled);
        assert!(resolve(&m, 2, &player, &ps).is_empty());
    }

    #[test]
    fn at_most_one_defeat_first_by_id() {
        let m = maze(&["gog"]);
        let mut ps = pursuers(&m);
        let field = CollisionField::new(&m);
        for p in ps.iter_mut() {
            p.handle(Signal::Enable);
        }
        ps[0].agent.try_advance(Heading::Right, &field);
        ps[1].agent.try_advance(Heading::Left, &field);
        let player = Player::new(m.player_spawn(), frame(), 2.5);

        let events = resolve(&m, 1, &player, &ps);
        assert_eq!(events, vec![GameEvent::PlayerDefeated { by: 0 }]);
    }

    #[test]
    fn capture_is_reported_before_defeat() {
        let m = maze(&["gog"]);
        let mut ps = pursuers(&m);
        let field = CollisionField::new(&m);
        for p in ps.iter_mut() {
            p.handle(Signal::Enable);
        }
        ps[0].handle(Signal::PowerItem { until: 100 });
        ps[0].agent.try_advance(Heading::Right, &field);
        ps[1].agent.try_advance(Heading::Left, &field);
        let player = Player::new(m.player_spawn(), frame(), 2.5);

        let events = resolve(&m, 1, &player, &ps);
        assert_eq!(events, vec![
            GameEvent::PursuerCaptured { id: 0, points: 200 },
            GameEvent::PlayerDefeated { by: 1 },
        ]);
    }

    #[test]
    fn bonus_frightens_in_the_same_tick() {
        let m = maze(&["opg"]);
        let mut ps = pursuers(&m);
        let field = CollisionField::new(&m);
        ps[0].handle(Signal::Enable);
        ps[0].agent.try_advance(Heading::Left, &field);
        let mut player = Player::new(m.player_spawn(), frame(), 10.0);
        player.agent.try_advance(Heading::Right, &field);

        let events = resolve(&m, 7, &player, &ps);
        assert_eq!(events, vec![
            GameEvent::BonusEaten { tile: TileCoord::new(0, 1), points: 50 },
            GameEvent::PowerItem { until: 487 },
            GameEvent::PursuerCaptured { id: 0, points: 200 },
            GameEvent::LevelCleared,
        ]);
    }

    #[test]
    fn defeat_suppresses_level_clear() {
        let m = maze(&["o.g"]);
        let mut ps = pursuers(&m);
        let field = CollisionField::new(&m);
        ps[0].handle(Signal::Enable);
        for _ in 0..3 {
            ps[0].agent.try_advance(Heading::Left, &field);
        }
        let mut player = Player::new(m.player_spawn(), frame(), 5.0);
        player.agent.try_advance(Heading::Right, &field);

        let events = resolve(&m, 1, &player, &ps);
        assert!(events.contains(&GameEvent::PlayerDefeated { by: 0 }));
        assert!(!events.contains(&GameEvent::LevelCleared));
    }

    #[test]
    fn consumed_pellet_never_rescores() {
        let mut m = maze(&["o. "]);
        let mut player = Player::new(m.player_spawn(), frame(), 5.0);
        player.agent.try_advance(Heading::Right, &CollisionField::new(&m));
        let first = resolve(&m, 1, &player, &[]);
        assert_eq!(first.len(), 2); // pellet + level clear
        consume(&mut m, &first);
        assert!(resolve(&m, 2, &player, &[]).is_empty());
        assert_eq!(m.remaining_collectibles(), 0);
    }

    #[test]
    fn clears_reference_map_exactly_once() {
        let mut m = maze(&["xxxxx", "xo..x", "x.g.x", "xxxxx"]);
        let ps = pursuers(&m);
        let mut player = Player::new(m.player_spawn(), frame(), 5.0);
        assert_eq!(m.remaining_collectibles(), 4);

        // Around the pursuer's tile, never onto it
        let route = [
            (Heading::Right, 4),
            (Heading::Down, 2),
            (Heading::Up, 2),
            (Heading::Left, 4),
            (Heading::Down, 2),
        ];
        let mut all = vec![];
        let mut now = 0;
        for (heading, ticks) in route {
            for _ in 0..ticks {
                now += 1;
                assert!(player.agent.try_advance(heading, &CollisionField::new(&m)));
                let events = resolve(&m, now, &player, &ps);
                consume(&mut m, &events);
                all.extend(events);
            }
        }

        assert_eq!(m.remaining_collectibles(), 0);
        let pellets = all.iter().filter(|e| matches!(e, GameEvent::PelletEaten { .. })).count();
        let clears = all.iter().filter(|e| **e == GameEvent::LevelCleared).count();
        assert_eq!(pellets, 4);
        assert_eq!(clears, 1);
        assert!(!all.iter().any(|e| matches!(e, GameEvent::PlayerDefeated { .. })));
        assert_eq!(all.last(), Some(&GameEvent::LevelCleared));
    }
}
