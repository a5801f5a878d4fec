/// Tile kinds and the map symbol alphabet.
/// Walls block everything, shields block until dropped, pellets and
/// bonuses are collectibles; spawns read as open floor.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileKind {
    #[default]
    Empty,
    Wall,
    Shield,       // Partial-height barrier, dropped at level start
    Pellet,
    Bonus,        // Power item: frightens the pursuers
    PlayerSpawn,
    PursuerSpawn,
}

impl TileKind {
    /// Map symbol -> kind. `None` for anything outside the alphabet.
    pub fn from_symbol(ch: char) -> Option<TileKind> {
        match ch {
            'x' => Some(TileKind::Wall),
            's' => Some(TileKind::Shield),
            '.' => Some(TileKind::Pellet),
            'p' => Some(TileKind::Bonus),
            'o' => Some(TileKind::PlayerSpawn),
            'g' => Some(TileKind::PursuerSpawn),
            ' ' => Some(TileKind::Empty),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            TileKind::Empty => ' ',
            TileKind::Wall => 'x',
            TileKind::Shield => 's',
            TileKind::Pellet => '.',
            TileKind::Bonus => 'p',
            TileKind::PlayerSpawn => 'o',
            TileKind::PursuerSpawn => 'g',
        }
    }

    /// Walls are the only kind that counts against intersection topology.
    pub fn is_wall(self) -> bool {
        matches!(self, TileKind::Wall)
    }

    /// Does this tile carry a collision barrier (while present)?
    pub fn is_barrier(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Shield)
    }

    pub fn collectible(self) -> Option<Collectible> {
        match self {
            TileKind::Pellet => Some(Collectible::Pellet),
            TileKind::Bonus => Some(Collectible::Bonus),
            _ => None,
        }
    }
}

/// Item the player can consume.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collectible {
    Pellet,
    Bonus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for ch in ['x', 's', '.', 'p', 'o', 'g', ' '] {
            let kind = TileKind::from_symbol(ch).unwrap();
            assert_eq!(kind.symbol(), ch);
        }
        assert_eq!(TileKind::from_symbol('#'), None);
        assert_eq!(TileKind::from_symbol('X'), None);
    }

    #[test]
    fn only_pellets_and_bonuses_are_collectible() {
        assert_eq!(TileKind::Pellet.collectible(), Some(Collectible::Pellet));
        assert_eq!(TileKind::Bonus.collectible(), Some(Collectible::Bonus));
        assert_eq!(TileKind::Shield.collectible(), None);
        assert!(TileKind::Shield.is_barrier());
        assert!(!TileKind::Shield.is_wall());
    }
}
