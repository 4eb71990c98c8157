use super::types::Color;
use serde::{Deserialize, Serialize};

/// Contents of one square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Disk {
    #[default]
    Empty,
    RedMan,
    RedKing,
    WhiteMan,
    WhiteKing,
}

impl Disk {
    pub fn color(&self) -> Option<Color> {
        match self {
            Disk::Empty => None,
            Disk::RedMan | Disk::RedKing => Some(Color::Red),
            Disk::WhiteMan | Disk::WhiteKing => Some(Color::White),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Disk::Empty
    }

    pub fn is_king(&self) -> bool {
        matches!(self, Disk::RedKing | Disk::WhiteKing)
    }

    /// Man -> king of the same color. Kings and empty squares are unchanged.
    pub fn promoted(&self) -> Disk {
        match self {
            Disk::RedMan => Disk::RedKing,
            Disk::WhiteMan => Disk::WhiteKing,
            other => *other,
        }
    }

    /// Same rank, other color.
    pub fn inverse(&self) -> Disk {
        match self {
            Disk::Empty => Disk::Empty,
            Disk::RedMan => Disk::WhiteMan,
            Disk::RedKing => Disk::WhiteKing,
            Disk::WhiteMan => Disk::RedMan,
            Disk::WhiteKing => Disk::RedKing,
        }
    }

    pub fn display_char(&self) -> char {
        match self {
            Disk::Empty => '.',
            Disk::RedMan => 'r',
            Disk::RedKing => 'R',
            Disk::WhiteMan => 'w',
            Disk::WhiteKing => 'W',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_is_one_way() {
        assert_eq!(Disk::RedMan.promoted(), Disk::RedKing);
        assert_eq!(Disk::WhiteMan.promoted(), Disk::WhiteKing);
        assert_eq!(Disk::RedKing.promoted(), Disk::RedKing);
        assert_eq!(Disk::Empty.promoted(), Disk::Empty);
    }

    #[test]
    fn inverse_keeps_rank() {
        assert_eq!(Disk::RedMan.inverse(), Disk::WhiteMan);
        assert_eq!(Disk::WhiteKing.inverse(), Disk::RedKing);
        assert!(Disk::RedKing.inverse().is_king());
        assert_eq!(Disk::Empty.inverse(), Disk::Empty);
    }

    #[test]
    fn colors() {
        assert_eq!(Disk::Empty.color(), None);
        assert_eq!(Disk::RedKing.color(), Some(Color::Red));
        assert_eq!(Disk::WhiteMan.color(), Some(Color::White));
    }
}
