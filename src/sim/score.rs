/// Score keeper: total score, bonus items eaten, level and lives.
///
/// An external consumer of `GameEvent`s. The simulation never reads the
/// score back to make decisions, apart from the lives count at the
/// rebuild deadline.

use super::event::GameEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreKeeper {
    pub score: u32,
    pub bonus_items: u32,
    pub level: u32,
    pub lives: u32,
}

impl ScoreKeeper {
    pub fn new(lives: u32) -> Self {
        ScoreKeeper { score: 0, bonus_items: 0, level: 1, lives }
    }

    pub fn record(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::PelletEaten { points, .. } => self.score += points,
            GameEvent::BonusEaten { points, .. } => {
                self.score += points;
                self.bonus_items += 1;
            }
            GameEvent::PursuerCaptured { points, .. } => self.score += points,
            GameEvent::PlayerDefeated { .. } => self.lives = self.lives.saturating_sub(1),
            GameEvent::LevelAdvanced { level } => self.level = level,
            _ => {}
        }
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::TileCoord;

    #[test]
    fn tallies_scoring_events() {
        let mut s = ScoreKeeper::new(3);
        let t = TileCoord::new(1, 1);
        s.record(&GameEvent::PelletEaten { tile: t, points: 10 });
        s.record(&GameEvent::BonusEaten { tile: t, points: 50 });
        s.record(&GameEvent::PowerItem { until: 100 });
        s.record(&GameEvent::PursuerCaptured { id: 0, points: 200 });
        assert_eq!(s.score, 260);
        assert_eq!(s.bonus_items, 1);
    }

    #[test]
    fn lives_never_underflow() {
        let mut s = ScoreKeeper::new(1);
        s.record(&GameEvent::PlayerDefeated { by: 0 });
        assert!(s.is_out_of_lives());
        s.record(&GameEvent::PlayerDefeated { by: 0 });
        assert_eq!(s.lives, 0);
    }

    #[test]
    fn level_follows_advance() {
        let mut s = ScoreKeeper::new(3);
        assert_eq!(s.level, 1);
        s.record(&GameEvent::LevelAdvanced { level: 2 });
        assert_eq!(s.level, 2);
    }
}
