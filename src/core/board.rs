use super::piece::Disk;
use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of playable (dark) squares.
pub const SQUARES: usize = 32;
/// Playable squares per row of the 8x8 board.
pub const SQUARES_PER_ROW: usize = 4;

/// The 32 dark squares, numbered row by row from red's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [Disk; SQUARES],
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: [Disk::Empty; SQUARES],
        }
    }

    /// Opening layout: red men on 0-11, white men on 20-31.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for sq in 0..12 {
            board.squares[sq] = Disk::RedMan;
        }
        for sq in 20..SQUARES {
            board.squares[sq] = Disk::WhiteMan;
        }
        board
    }

    pub fn get(&self, sq: usize) -> Result<Disk, BoardError> {
        self.squares
            .get(sq)
            .copied()
            .ok_or(BoardError::OutOfRange(sq))
    }

    pub fn set(&mut self, sq: usize, disk: Disk) -> Result<(), BoardError> {
        let slot = self
            .squares
            .get_mut(sq)
            .ok_or(BoardError::OutOfRange(sq))?;
        *slot = disk;
        Ok(())
    }

    pub fn squares(&self) -> &[Disk; SQUARES] {
        &self.squares
    }

    pub fn count(&self, disk: Disk) -> usize {
        self.squares.iter().filter(|d| **d == disk).count()
    }
}

/// Row/column of a square on the full 8x8 grid.
pub fn coords(sq: usize) -> (usize, usize) {
    let row = sq / SQUARES_PER_ROW;
    let k = sq % SQUARES_PER_ROW;
    let col = if row % 2 == 0 { 2 * k + 1 } else { 2 * k };
    (row, col)
}

/// Inverse of [`coords`]; `None` for light squares and off-board cells.
pub fn square_at(row: i32, col: i32) -> Option<usize> {
    if !(0..8).contains(&row) || !(0..8).contains(&col) {
        return None;
    }
    if (row + col) % 2 == 0 {
        return None;
    }
    Some(row as usize * SQUARES_PER_ROW + col as usize / 2)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // white's side on top
        for row in (0..8).rev() {
            for col in 0..8 {
                let c = match square_at(row, col) {
                    Some(sq) => self.squares[sq].display_char(),
                    None => ' ',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
