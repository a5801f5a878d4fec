pub mod agent;
pub mod ai;
pub mod collision;
pub mod geometry;
pub mod maze;
pub mod tile;
