// Board state and FEN conversion.
//
// `Board` is a plain 64-square mailbox plus the side to move, castling
// rights, en-passant target, and the two move clocks: exactly the six FEN
// fields. It knows nothing about legality; `moves.rs` generates and applies
// moves against it, and `game.rs` layers repetition history and game status
// on top.
//
// `to_fen` is the serialized position clients see; `from_fen` exists for
// tests and for starting from arbitrary positions.

use std::fmt::Write as _;

use crate::error::RulesError;
use crate::types::{Color, Piece, PieceKind, Square};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub fn king_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_king_side,
            Color::Black => self.black_king_side,
        }
    }

    pub fn queen_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queen_side,
            Color::Black => self.black_queen_side,
        }
    }

    pub(crate) fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Drop whichever right depends on a rook standing on `square`.
    pub(crate) fn clear_rook_corner(&mut self, square: Square) {
        match (square.file(), square.rank()) {
            (0, 0) => self.white_queen_side = false,
            (7, 0) => self.white_king_side = false,
            (0, 7) => self.black_queen_side = false,
            (7, 7) => self.black_king_side = false,
            _ => {}
        }
    }

    fn to_fen(self) -> String {
        let mut out = String::new();
        for (flag, c) in [
            (self.white_king_side, 'K'),
            (self.white_queen_side, 'Q'),
            (self.black_king_side, 'k'),
            (self.black_queen_side, 'q'),
        ] {
            if flag {
                out.push(c);
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

impl Board {
    /// The standard starting position.
    pub fn starting() -> Self {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut squares = [None; 64];
        for (file, kind) in back_rank.into_iter().enumerate() {
            squares[file] = Some(Piece::new(Color::White, kind));
            squares[8 + file] = Some(Piece::new(Color::White, Pawn));
            squares[48 + file] = Some(Piece::new(Color::Black, Pawn));
            squares[56 + file] = Some(Piece::new(Color::Black, kind));
        }
        Self {
            squares,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parse a FEN string. The two clock fields are optional and default to
    /// `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let malformed = |reason| RulesError::MalformedFen {
            fen: fen.to_string(),
            reason,
        };
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(malformed("expected 4 or 6 fields"));
        }

        let mut squares = [None; 64];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(malformed("expected 8 ranks"));
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(malformed("bad empty-square count"));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(|| malformed("bad piece"))?;
                    let square = Square::new(file, rank).ok_or_else(|| malformed("rank too long"))?;
                    squares[square.index()] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(malformed("rank too long"));
                }
            }
            if file != 8 {
                return Err(malformed("rank too short"));
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(malformed("bad side to move")),
        };

        let mut castling = CastlingRights::default();
        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => castling.white_king_side = true,
                    'Q' => castling.white_queen_side = true,
                    'k' => castling.black_king_side = true,
                    'q' => castling.black_queen_side = true,
                    _ => return Err(malformed("bad castling rights")),
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            text => Some(
                text.parse::<Square>()
                    .map_err(|_| malformed("bad en-passant square"))?,
            ),
        };

        let (halfmove_clock, fullmove_number) = if fields.len() == 6 {
            (
                fields[4].parse::<u32>().map_err(|_| malformed("bad halfmove clock"))?,
                fields[5].parse::<u32>().map_err(|_| malformed("bad fullmove number"))?,
            )
        } else {
            (0, 1)
        };

        let board = Self {
            squares,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        };
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces()
                .filter(|(_, p)| *p == Piece::new(color, PieceKind::King))
                .count();
            if kings != 1 {
                return Err(malformed("each side needs exactly one king"));
            }
        }
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut out = self.placement_fen();
        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        let _ = write!(
            out,
            " {side} {} {en_passant} {} {}",
            self.castling.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        );
        out
    }

    fn placement_fen(&self) -> String {
        let mut out = String::with_capacity(64);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match Square::new(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            let _ = write!(out, "{empty}");
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                let _ = write!(out, "{empty}");
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    /// Identity of the position for repetition counting: placement, side to
    /// move, castling rights, and the en-passant square only when a capture
    /// onto it is actually available.
    pub(crate) fn repetition_key(&self) -> String {
        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let en_passant = self
            .en_passant
            .filter(|target| self.en_passant_capturable(*target))
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        format!(
            "{} {side} {} {en_passant}",
            self.placement_fen(),
            self.castling.to_fen()
        )
    }

    fn en_passant_capturable(&self, target: Square) -> bool {
        let us = self.side_to_move;
        let capturer = Piece::new(us, PieceKind::Pawn);
        [-1, 1].into_iter().any(|df| {
            target
                .offset(df, -us.forward())
                .is_some_and(|sq| self.piece_at(sq) == Some(capturer))
        })
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    pub(crate) fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// All occupied squares with their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| *p == Piece::new(color, PieceKind::King))
            .map(|(sq, _)| sq)
    }
}
