use crate::core::{Board, Color, Disk, Player};
use crate::error::BoardError;
use crate::logic::{self, MoveKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One checkers match: its players, position and side to move.
///
/// The board and turn only change through [`Game::move_disk`]. A game without
/// a second player is public and can be joined by any opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    name: String,
    player_one: Player,
    player_two: Option<Player>,
    board: Board,
    turn: Color,
}

impl Game {
    /// Public game owned by `owner`, who plays red.
    pub fn new(name: &str, owner: &str) -> Self {
        Game::from_parts(
            name,
            Player::new(owner, Color::Red),
            None,
            Board::standard(),
            Color::Red,
        )
    }

    /// Private game between `owner` (red) and `opponent` (white).
    pub fn with_opponent(name: &str, owner: &str, opponent: &str) -> Self {
        Game::from_parts(
            name,
            Player::new(owner, Color::Red),
            Some(Player::new(opponent, Color::White)),
            Board::standard(),
            Color::Red,
        )
    }

    pub fn from_parts(
        name: &str,
        player_one: Player,
        player_two: Option<Player>,
        board: Board,
        turn: Color,
    ) -> Self {
        Game {
            name: name.to_string(),
            player_one,
            player_two,
            board,
            turn,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player_one(&self) -> &Player {
        &self.player_one
    }

    pub fn player_two(&self) -> Option<&Player> {
        self.player_two.as_ref()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn is_public_game(&self) -> bool {
        self.player_two.is_none()
    }

    pub fn get_square(&self, sq: usize) -> Result<Disk, BoardError> {
        self.board.get(sq)
    }

    pub fn legal_adj(src: usize, dst: usize) -> bool {
        logic::legal_adj(src, dst)
    }

    pub fn legal_jmp(src: usize, dst: usize) -> bool {
        logic::legal_jmp(src, dst)
    }

    pub fn jumped_square(src: usize, dst: usize) -> Option<usize> {
        logic::jumped_square(src, dst)
    }

    /// Color played by `username` in this game, if they take part.
    pub fn player_color(&self, username: &str) -> Option<Color> {
        std::iter::once(&self.player_one)
            .chain(self.player_two.iter())
            .find(|p| p.name() == username)
            .map(Player::color)
    }

    /// Seat `username` as white in a public game. Fails for private games and for the owner.
    pub fn join(&mut self, username: &str) -> bool {
        if !self.is_public_game() || self.player_one.name() == username {
            return false;
        }
        let opponent = Player::new(username, self.player_one.color().opponent());
        debug!(game = %self.name, player = %opponent, "player joined");
        self.player_two = Some(opponent);
        true
    }

    /// Move the disk on `src` to `dst`, capturing on a jump.
    ///
    /// Returns `false` and leaves the game untouched unless the disk on `src`
    /// belongs to the side to move, `dst` is empty, the step or jump is
    /// geometrically legal and forward for a man, and a jump passes over an
    /// opposing disk. On success the disk is promoted on its back rank and
    /// the turn passes.
    pub fn move_disk(&mut self, src: usize, dst: usize) -> bool {
        let Some(kind) = self.check_move(src, dst) else {
            return false;
        };

        self.apply(src, dst, kind).is_ok()
    }

    fn apply(&mut self, src: usize, dst: usize, kind: MoveKind) -> Result<(), BoardError> {
        let disk = self.board.get(src)?;
        let mut next = self.board;
        next.set(src, Disk::Empty)?;
        next.set(dst, logic::landed(disk, dst))?;
        if let MoveKind::Jump { captured } = kind {
            next.set(captured, Disk::Empty)?;
        }

        debug!(game = %self.name, src, dst, ?kind, "move applied");
        self.board = next;
        self.turn = self.turn.opponent();
        Ok(())
    }

    fn check_move(&self, src: usize, dst: usize) -> Option<MoveKind> {
        let disk = self.board.get(src).ok()?;
        if disk.color() != Some(self.turn) {
            return None;
        }
        if !self.board.get(dst).ok()?.is_empty() {
            return None;
        }
        if !logic::direction_allowed(disk, src, dst) {
            return None;
        }
        let kind = logic::classify(src, dst)?;
        if let MoveKind::Jump { captured } = kind {
            let victim = self.board.get(captured).ok()?;
            if victim.color() != Some(self.turn.opponent()) {
                return None;
            }
        }
        Some(kind)
    }
}
