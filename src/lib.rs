/// Maze Chase: a tile-maze pursuit engine.
///
/// `domain` holds the maze, agents and pursuer behavior, `sim` drives them
/// one tick at a time, `ui` is the terminal front end.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod ui;
