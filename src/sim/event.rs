/// Events emitted during a simulation step.
/// Pure data: scoring, lives and the presentation layer consume these;
/// nothing in the core queries them back.

use crate::domain::ai::Roam;
use crate::domain::geometry::TileCoord;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PelletEaten { tile: TileCoord, points: u32 },
    BonusEaten { tile: TileCoord, points: u32 },
    /// A bonus was eaten: pursuers are frightened until tick `until`.
    PowerItem { until: u64 },
    PursuerCaptured { id: usize, points: u32 },
    PlayerDefeated { by: usize },
    LevelCleared,
    ShieldsDropped,
    PursuersReleased,
    RoamChanged { roam: Roam },
    MazeRebuilt,
    LevelAdvanced { level: u32 },
    GameOver,
}
