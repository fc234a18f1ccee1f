// Standard algebraic notation (SAN) for moves.
//
// SAN depends on the position before the move (for disambiguation against
// other legal moves of the same piece kind to the same square) and after it
// (for the `+` / `#` suffix), so `san` takes both boards.

use crate::board::Board;
use crate::moves::{Move, MoveKind, in_check, legal_moves};
use crate::types::PieceKind;

/// Render `mv`, played from `before` and resulting in `after`.
pub fn san(before: &Board, mv: &Move, after: &Board) -> String {
    let mut out = match mv.kind {
        MoveKind::CastleKingSide => "O-O".to_string(),
        MoveKind::CastleQueenSide => "O-O-O".to_string(),
        _ => body(before, mv),
    };

    let defender = after.side_to_move();
    if in_check(after, defender) {
        out.push(if legal_moves(after).is_empty() { '#' } else { '+' });
    }
    out
}

fn body(before: &Board, mv: &Move) -> String {
    let mut out = String::with_capacity(8);
    if mv.piece == PieceKind::Pawn {
        if mv.is_capture() {
            out.push(mv.from.file_char());
        }
    } else {
        out.push(mv.piece.letter().to_ascii_uppercase());
        let rivals: Vec<Move> = legal_moves(before)
            .into_iter()
            .filter(|other| other.piece == mv.piece && other.to == mv.to && other.from != mv.from)
            .collect();
        if !rivals.is_empty() {
            let shares_file = rivals.iter().any(|r| r.from.file() == mv.from.file());
            let shares_rank = rivals.iter().any(|r| r.from.rank() == mv.from.rank());
            if !shares_file {
                out.push(mv.from.file_char());
            } else if !shares_rank {
                out.push(mv.from.rank_char());
            } else {
                out.push(mv.from.file_char());
                out.push(mv.from.rank_char());
            }
        }
    }
    if mv.is_capture() {
        out.push('x');
    }
    out.push_str(&mv.to.to_string());
    if let Some(promotion) = mv.promotion {
        out.push('=');
        out.push(promotion.letter().to_ascii_uppercase());
    }
    out
}
