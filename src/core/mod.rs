pub mod board;
pub mod piece;
pub mod types;

pub use board::{Board, SQUARES};
pub use piece::Disk;
pub use types::{Color, Player};
