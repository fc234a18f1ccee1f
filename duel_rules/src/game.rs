// A game in progress: the current board plus the repetition history needed
// for threefold detection, and the status queries the relay reacts to.
//
// `Game::play` is the single mutation entry point. It resolves the request
// against the legal move list before touching anything, so a rejected move
// leaves the game exactly as it was.

use crate::board::Board;
use crate::error::RulesError;
use crate::moves::{Move, in_check, legal_moves, make_move};
use crate::notation::san;
use crate::types::{Color, PieceKind, Square};

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_PLIES: u32 = 100;

/// An accepted move, described for broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayedMove {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub san: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    /// Repetition keys of every position reached, oldest first, including
    /// the current one.
    history: Vec<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::starting())
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        Board::from_fen(fen).map(Self::from_board)
    }

    fn from_board(board: Board) -> Self {
        let history = vec![board.repetition_key()];
        Self { board, history }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn turn(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    /// Play the move `from` → `to`. A pawn reaching the last rank promotes
    /// to `promotion`, or to a queen when none is given; `promotion` is
    /// ignored for every other move.
    pub fn play(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Result<PlayedMove, RulesError> {
        let from_sq: Square = from.parse()?;
        let to_sq: Square = to.parse()?;

        let us = self.board.side_to_move();
        if self.board.piece_at(from_sq).is_none_or(|p| p.color != us) {
            return Err(RulesError::NoPieceToMove(from_sq.to_string()));
        }

        let candidates: Vec<Move> = self
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from_sq && mv.to == to_sq)
            .collect();
        let illegal = || RulesError::IllegalMove {
            from: from_sq.to_string(),
            to: to_sq.to_string(),
        };
        let first = *candidates.first().ok_or_else(illegal)?;

        let chosen = if first.promotion.is_some() {
            let wanted = match promotion {
                None => PieceKind::Queen,
                Some(letter) => PieceKind::from_letter(letter)
                    .filter(|kind| PieceKind::PROMOTIONS.contains(kind))
                    .ok_or_else(|| RulesError::InvalidPromotion(letter.to_string()))?,
            };
            candidates
                .into_iter()
                .find(|mv| mv.promotion == Some(wanted))
                .ok_or_else(illegal)?
        } else {
            first
        };

        let after = make_move(&self.board, &chosen);
        let notation = san(&self.board, &chosen, &after);
        self.board = after;
        self.history.push(self.board.repetition_key());

        Ok(PlayedMove {
            color: us,
            from: chosen.from,
            to: chosen.to,
            piece: chosen.piece,
            captured: chosen.captured,
            promotion: chosen.promotion,
            san: notation,
        })
    }

    /// True if the side to move is in check.
    pub fn in_check(&self) -> bool {
        in_check(&self.board, self.turn())
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check() && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && self.legal_moves().is_empty()
    }

    /// Neither side can possibly mate: bare kings, a single minor piece, or
    /// only bishops that all stand on squares of one color.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (square, piece) in self.board.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((square, piece.kind)),
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            }
        }
        match minors.as_slice() {
            [] | [_] => true,
            [(first, _), ..] => minors
                .iter()
                .all(|(sq, kind)| *kind == PieceKind::Bishop && sq.is_dark() == first.is_dark()),
        }
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.history.last().is_some_and(|current| {
            self.history.iter().filter(|key| *key == current).count() >= 3
        })
    }

    pub fn is_fifty_move_rule(&self) -> bool {
        self.board.halfmove_clock() >= FIFTY_MOVE_PLIES
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_rule()
            || self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_threefold_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_move_flips_turn() {
        let mut game = Game::new();
        let played = game.play("e2", "e4", None).unwrap();
        assert_eq!(played.san, "e4");
        assert_eq!(played.color, Color::White);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn rejected_moves_leave_game_untouched() {
        let mut game = Game::new();
        let before = game.clone();
        assert!(matches!(
            game.play("e2", "e5", None),
            Err(RulesError::IllegalMove { .. })
        ));
        assert!(matches!(
            game.play("e7", "e5", None),
            Err(RulesError::NoPieceToMove(_))
        ));
        assert!(matches!(
            game.play("e3", "e4", None),
            Err(RulesError::NoPieceToMove(_))
        ));
        assert!(matches!(
            game.play("z2", "e4", None),
            Err(RulesError::MalformedSquare(_))
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn fools_mate() {
        let mut game = Game::new();
        game.play("f2", "f3", None).unwrap();
        game.play("e7", "e5", None).unwrap();
        game.play("g2", "g4", None).unwrap();
        assert!(!game.is_game_over());
        let mate = game.play("d8", "h4", None).unwrap();
        assert_eq!(mate.san, "Qh4#");
        assert!(game.in_check());
        assert!(game.is_checkmate());
        assert!(!game.is_draw());
        assert!(game.is_game_over());
    }

    #[test]
    fn stalemate_is_a_draw() {
        let mut game = Game::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        game.play("f1", "f7", None).unwrap();
        assert!(game.is_stalemate());
        assert!(!game.is_checkmate());
        assert!(game.is_draw());
        assert!(game.is_game_over());
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = Game::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let played = game.play("a7", "a8", None).unwrap();
        assert_eq!(played.promotion, Some(PieceKind::Queen));
        assert_eq!(played.san, "a8=Q");
    }

    #[test]
    fn promotion_letter_is_honored_and_validated() {
        let mut game = Game::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            game.play("a7", "a8", Some('k')),
            Err(RulesError::InvalidPromotion("k".into()))
        );
        let played = game.play("a7", "a8", Some('R')).unwrap();
        assert_eq!(played.promotion, Some(PieceKind::Rook));
    }

    #[test]
    fn promotion_ignored_for_ordinary_moves() {
        let mut game = Game::new();
        let played = game.play("g1", "f3", Some('q')).unwrap();
        assert_eq!(played.promotion, None);
    }

    #[test]
    fn insufficient_material_cases() {
        let cases = [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/4KN2 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1", false),
            ("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/3NKN2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false),
        ];
        for (fen, expected) in cases {
            let game = Game::from_fen(fen).unwrap();
            assert_eq!(game.is_insufficient_material(), expected, "{fen}");
        }
    }

    #[test]
    fn threefold_repetition_by_knight_shuffle() {
        let mut game = Game::new();
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        for (from, to) in shuffle {
            game.play(from, to, None).unwrap();
        }
        assert!(!game.is_threefold_repetition());
        for (from, to) in shuffle {
            game.play(from, to, None).unwrap();
        }
        assert!(game.is_threefold_repetition());
        assert!(game.is_draw());
    }

    #[test]
    fn fifty_move_rule_from_clock() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert!(game.is_fifty_move_rule());
        assert!(game.is_draw());
    }
}
