pub mod topology;

use crate::core::{Color, Disk};

pub use topology::{adjacent_squares, jump_squares, jumped_square};

/// Red's promotion row starts here.
pub const RED_BACK_RANK: usize = 28;
/// White's promotion row ends here.
pub const WHITE_BACK_RANK: usize = 3;

/// Kind of relocation a (src, dst) pair describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Adjacent,
    Jump { captured: usize },
}

/// `dst` is one diagonal step from `src`. Geometry only.
pub fn legal_adj(src: usize, dst: usize) -> bool {
    adjacent_squares(src).contains(&dst)
}

/// `dst` is a two-step diagonal landing square from `src`. Geometry only.
pub fn legal_jmp(src: usize, dst: usize) -> bool {
    jump_squares(src).contains(&dst)
}

/// Classify a geometric move, or `None` if `dst` is not reachable from `src` in one step or jump.
pub fn classify(src: usize, dst: usize) -> Option<MoveKind> {
    if legal_adj(src, dst) {
        Some(MoveKind::Adjacent)
    } else {
        jumped_square(src, dst).map(|captured| MoveKind::Jump { captured })
    }
}

/// Whether `disk` may travel from `src` to `dst` given its direction rights.
/// Men go toward the opponent (red up, white down); kings go either way.
pub fn direction_allowed(disk: Disk, src: usize, dst: usize) -> bool {
    if disk.is_king() {
        return true;
    }
    match disk.color() {
        Some(Color::Red) => dst > src,
        Some(Color::White) => dst < src,
        None => false,
    }
}

/// `dst` lies on the promotion row for `color`.
pub fn is_back_rank(color: Color, dst: usize) -> bool {
    match color {
        Color::Red => dst >= RED_BACK_RANK,
        Color::White => dst <= WHITE_BACK_RANK,
    }
}

/// Disk as it stands after arriving on `dst`.
pub fn landed(disk: Disk, dst: usize) -> Disk {
    match disk.color() {
        Some(color) if is_back_rank(color, dst) => disk.promoted(),
        _ => disk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_moves() {
        assert_eq!(classify(0, 4), Some(MoveKind::Adjacent));
        assert_eq!(classify(0, 9), Some(MoveKind::Jump { captured: 5 }));
        assert_eq!(classify(0, 1), None);
        assert_eq!(classify(0, 31), None);
        assert_eq!(classify(40, 44), None);
    }

    #[test]
    fn men_only_move_forward() {
        assert!(direction_allowed(Disk::RedMan, 5, 9));
        assert!(!direction_allowed(Disk::RedMan, 9, 5));
        assert!(direction_allowed(Disk::WhiteMan, 9, 5));
        assert!(!direction_allowed(Disk::WhiteMan, 5, 9));
        assert!(direction_allowed(Disk::RedKing, 9, 5));
        assert!(direction_allowed(Disk::WhiteKing, 5, 9));
        assert!(!direction_allowed(Disk::Empty, 5, 9));
    }

    #[test]
    fn promotion_rows() {
        assert_eq!(landed(Disk::RedMan, 28), Disk::RedKing);
        assert_eq!(landed(Disk::RedMan, 27), Disk::RedMan);
        assert_eq!(landed(Disk::WhiteMan, 3), Disk::WhiteKing);
        assert_eq!(landed(Disk::WhiteMan, 4), Disk::WhiteMan);
        // a king on the opposite row stays what it was
        assert_eq!(landed(Disk::WhiteKing, 30), Disk::WhiteKing);
        assert_eq!(landed(Disk::RedKing, 31), Disk::RedKing);
    }
}
