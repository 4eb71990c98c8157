use crate::core::board::{coords, square_at};
use crate::core::SQUARES;
use once_cell::sync::Lazy;

// Diagonal directions as (row, col) steps, ordered so neighbor lists come out ascending.
const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Geometry of the 32-square board, independent of what occupies it.
struct TopologyTable {
    adjacent: [Vec<usize>; SQUARES],
    jumps: [Vec<usize>; SQUARES],
}

static TOPOLOGY: Lazy<TopologyTable> = Lazy::new(TopologyTable::build);

impl TopologyTable {
    fn build() -> Self {
        let mut adjacent: [Vec<usize>; SQUARES] = std::array::from_fn(|_| Vec::new());
        let mut jumps: [Vec<usize>; SQUARES] = std::array::from_fn(|_| Vec::new());

        for sq in 0..SQUARES {
            let (row, col) = coords(sq);
            let (row, col) = (row as i32, col as i32);
            for (dr, dc) in DIAGONALS {
                if let Some(adj) = square_at(row + dr, col + dc) {
                    adjacent[sq].push(adj);
                }
                if let Some(dst) = square_at(row + 2 * dr, col + 2 * dc) {
                    jumps[sq].push(dst);
                }
            }
        }

        TopologyTable { adjacent, jumps }
    }
}

/// Diagonal neighbors of `src`, ascending. Empty for off-board squares.
pub fn adjacent_squares(src: usize) -> &'static [usize] {
    TOPOLOGY
        .adjacent
        .get(src)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Landing squares two diagonal steps from `src`, ascending.
pub fn jump_squares(src: usize) -> &'static [usize] {
    TOPOLOGY
        .jumps
        .get(src)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// The square a jump from `src` to `dst` passes over, or `None` if the pair is not a jump.
pub fn jumped_square(src: usize, dst: usize) -> Option<usize> {
    if !jump_squares(src).contains(&dst) {
        return None;
    }
    let (sr, sc) = coords(src);
    let (dr, dc) = coords(dst);
    square_at(((sr + dr) / 2) as i32, ((sc + dc) / 2) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_squares() {
        assert_eq!(adjacent_squares(0), &[4, 5]);
        assert_eq!(jump_squares(0), &[9]);
        assert_eq!(adjacent_squares(3), &[7]);
        assert_eq!(jump_squares(3), &[10]);
        assert_eq!(adjacent_squares(28), &[24]);
        assert_eq!(jump_squares(28), &[21]);
        assert_eq!(adjacent_squares(31), &[26, 27]);
        assert_eq!(jump_squares(31), &[22]);
    }

    #[test]
    fn interior_square_has_four_of_each() {
        assert_eq!(adjacent_squares(13), &[8, 9, 16, 17]);
        assert_eq!(jump_squares(13), &[4, 6, 20, 22]);
    }

    #[test]
    fn off_board_has_no_neighbors() {
        assert!(adjacent_squares(32).is_empty());
        assert!(jump_squares(100).is_empty());
        assert_eq!(jumped_square(32, 9), None);
    }

    #[test]
    fn adjacency_is_symmetric() {
        for src in 0..SQUARES {
            for &dst in adjacent_squares(src) {
                assert!(adjacent_squares(dst).contains(&src), "{} <-> {}", src, dst);
            }
            for &dst in jump_squares(src) {
                assert!(jump_squares(dst).contains(&src), "{} <=> {}", src, dst);
            }
        }
    }

    #[test]
    fn jumped_square_lies_between() {
        assert_eq!(jumped_square(0, 9), Some(5));
        assert_eq!(jumped_square(9, 0), Some(5));
        assert_eq!(jumped_square(1, 8), Some(5));
        assert_eq!(jumped_square(13, 22), Some(17));
        assert_eq!(jumped_square(0, 4), None);
        assert_eq!(jumped_square(0, 10), None);

        for src in 0..SQUARES {
            for &dst in jump_squares(src) {
                let mid = jumped_square(src, dst).unwrap();
                assert!(adjacent_squares(src).contains(&mid));
                assert!(adjacent_squares(dst).contains(&mid));
            }
        }
    }
}
