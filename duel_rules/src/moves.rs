// Move representation, attack detection, legal move generation, and move
// application.
//
// Generation is two-phase: `pseudo_legal_moves` follows piece movement rules
// (including castling preconditions that depend on attacks), then
// `legal_moves` plays each candidate on a copy of the board and drops those
// that leave the mover's own king attacked. Positions are small and the
// relay validates one move per request, so clarity wins over bitboards here.
//
// See also: `board.rs` for the state being mutated, `notation.rs` for SAN.

use crate::board::Board;
use crate::types::{Color, Piece, PieceKind, Square};

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    DoublePush,
    EnPassant,
    CastleKingSide,
    CastleQueenSide,
}

/// A fully described move in a specific position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
}

impl Move {
    fn normal(from: Square, to: Square, piece: PieceKind, captured: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            piece,
            captured,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_castle(&self) -> bool {
        matches!(
            self.kind,
            MoveKind::CastleKingSide | MoveKind::CastleQueenSide
        )
    }
}

/// True if any piece of color `by` attacks `target`.
pub fn is_square_attacked(board: &Board, target: Square, by: Color) -> bool {
    let holds = |sq: Option<Square>, kinds: &[PieceKind]| {
        sq.and_then(|sq| board.piece_at(sq))
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    // A pawn of `by` attacks diagonally forward, so look one rank behind.
    if [-1, 1]
        .into_iter()
        .any(|df| holds(target.offset(df, -by.forward()), &[PieceKind::Pawn]))
    {
        return true;
    }
    if KNIGHT_STEPS
        .iter()
        .any(|&(df, dr)| holds(target.offset(df, dr), &[PieceKind::Knight]))
    {
        return true;
    }
    if KING_STEPS
        .iter()
        .any(|&(df, dr)| holds(target.offset(df, dr), &[PieceKind::King]))
    {
        return true;
    }

    let slider_hits = |directions: &[(i8, i8)], kinds: &[PieceKind]| {
        directions.iter().any(|&(df, dr)| {
            let mut current = target.offset(df, dr);
            while let Some(sq) = current {
                if let Some(piece) = board.piece_at(sq) {
                    return piece.color == by && kinds.contains(&piece.kind);
                }
                current = sq.offset(df, dr);
            }
            false
        })
    };
    slider_hits(&ROOK_DIRECTIONS, &[PieceKind::Rook, PieceKind::Queen])
        || slider_hits(&BISHOP_DIRECTIONS, &[PieceKind::Bishop, PieceKind::Queen])
}

/// True if `color`'s king is attacked.
pub fn in_check(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .is_some_and(|king| is_square_attacked(board, king, color.opponent()))
}

/// All legal moves for the side to move.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let us = board.side_to_move();
    pseudo_legal_moves(board)
        .into_iter()
        .filter(|mv| !in_check(&make_move(board, mv), us))
        .collect()
}

fn pseudo_legal_moves(board: &Board) -> Vec<Move> {
    let us = board.side_to_move();
    let mut moves = Vec::with_capacity(48);
    for (from, piece) in board.pieces().filter(|(_, p)| p.color == us) {
        match piece.kind {
            PieceKind::Pawn => pawn_moves(board, from, us, &mut moves),
            PieceKind::Knight => step_moves(board, from, piece, &KNIGHT_STEPS, &mut moves),
            PieceKind::Bishop => slide_moves(board, from, piece, &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Rook => slide_moves(board, from, piece, &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Queen => {
                slide_moves(board, from, piece, &ROOK_DIRECTIONS, &mut moves);
                slide_moves(board, from, piece, &BISHOP_DIRECTIONS, &mut moves);
            }
            PieceKind::King => {
                step_moves(board, from, piece, &KING_STEPS, &mut moves);
                castling_moves(board, from, us, &mut moves);
            }
        }
    }
    moves
}

fn push_pawn_move(from: Square, to: Square, captured: Option<PieceKind>, moves: &mut Vec<Move>) {
    let last_rank = to.rank() == 0 || to.rank() == 7;
    if last_rank {
        for promotion in PieceKind::PROMOTIONS {
            moves.push(Move {
                promotion: Some(promotion),
                ..Move::normal(from, to, PieceKind::Pawn, captured)
            });
        }
    } else {
        moves.push(Move::normal(from, to, PieceKind::Pawn, captured));
    }
}

fn pawn_moves(board: &Board, from: Square, us: Color, moves: &mut Vec<Move>) {
    let forward = us.forward();

    if let Some(one) = from.offset(0, forward).filter(|sq| board.piece_at(*sq).is_none()) {
        push_pawn_move(from, one, None, moves);
        let start_rank = if us == Color::White { 1 } else { 6 };
        if from.rank() == start_rank {
            if let Some(two) = one.offset(0, forward).filter(|sq| board.piece_at(*sq).is_none()) {
                moves.push(Move {
                    kind: MoveKind::DoublePush,
                    ..Move::normal(from, two, PieceKind::Pawn, None)
                });
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };
        match board.piece_at(to) {
            Some(target) if target.color != us => {
                push_pawn_move(from, to, Some(target.kind), moves);
            }
            None if board.en_passant() == Some(to) => {
                moves.push(Move {
                    kind: MoveKind::EnPassant,
                    ..Move::normal(from, to, PieceKind::Pawn, Some(PieceKind::Pawn))
                });
            }
            _ => {}
        }
    }
}

fn step_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    steps: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in steps {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match board.piece_at(to) {
            None => moves.push(Move::normal(from, to, piece.kind, None)),
            Some(target) if target.color != piece.color => {
                moves.push(Move::normal(from, to, piece.kind, Some(target.kind)));
            }
            Some(_) => {}
        }
    }
}

fn slide_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in directions {
        let mut current = from.offset(df, dr);
        while let Some(to) = current {
            match board.piece_at(to) {
                None => moves.push(Move::normal(from, to, piece.kind, None)),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(Move::normal(from, to, piece.kind, Some(target.kind)));
                    }
                    break;
                }
            }
            current = to.offset(df, dr);
        }
    }
}

fn castling_moves(board: &Board, from: Square, us: Color, moves: &mut Vec<Move>) {
    let home = us.home_rank();
    if Square::new(4, home) != Some(from) {
        return;
    }
    let them = us.opponent();
    if is_square_attacked(board, from, them) {
        return;
    }
    let rook = Some(Piece::new(us, PieceKind::Rook));
    let empty = |files: &[u8]| {
        files
            .iter()
            .filter_map(|&f| Square::new(f, home))
            .all(|sq| board.piece_at(sq).is_none())
    };
    let safe = |files: &[u8]| {
        files
            .iter()
            .filter_map(|&f| Square::new(f, home))
            .all(|sq| !is_square_attacked(board, sq, them))
    };

    let castling = board.castling();
    if castling.king_side(us)
        && Square::new(7, home).and_then(|sq| board.piece_at(sq)) == rook
        && empty(&[5, 6])
        && safe(&[5, 6])
    {
        if let Some(to) = Square::new(6, home) {
            moves.push(Move {
                kind: MoveKind::CastleKingSide,
                ..Move::normal(from, to, PieceKind::King, None)
            });
        }
    }
    if castling.queen_side(us)
        && Square::new(0, home).and_then(|sq| board.piece_at(sq)) == rook
        && empty(&[1, 2, 3])
        && safe(&[2, 3])
    {
        if let Some(to) = Square::new(2, home) {
            moves.push(Move {
                kind: MoveKind::CastleQueenSide,
                ..Move::normal(from, to, PieceKind::King, None)
            });
        }
    }
}

/// Return the position after `mv`. The move is assumed to come from
/// `pseudo_legal_moves` for this board.
pub fn make_move(board: &Board, mv: &Move) -> Board {
    let mut next = board.clone();
    let us = board.side_to_move();

    next.set(mv.from, None);
    if mv.kind == MoveKind::EnPassant {
        if let Some(victim) = Square::new(mv.to.file(), mv.from.rank()) {
            next.set(victim, None);
        }
    }
    let placed = Piece::new(us, mv.promotion.unwrap_or(mv.piece));
    next.set(mv.to, Some(placed));

    let home = us.home_rank();
    let rook_hop = match mv.kind {
        MoveKind::CastleKingSide => Some((7, 5)),
        MoveKind::CastleQueenSide => Some((0, 3)),
        _ => None,
    };
    if let Some((rook_from, rook_to)) = rook_hop {
        if let (Some(src), Some(dst)) = (Square::new(rook_from, home), Square::new(rook_to, home)) {
            let rook = next.piece_at(src);
            next.set(src, None);
            next.set(dst, rook);
        }
    }

    if mv.piece == PieceKind::King {
        next.castling.clear(us);
    }
    next.castling.clear_rook_corner(mv.from);
    next.castling.clear_rook_corner(mv.to);

    next.en_passant = if mv.kind == MoveKind::DoublePush {
        mv.from.offset(0, us.forward())
    } else {
        None
    };

    if mv.piece == PieceKind::Pawn || mv.is_capture() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock += 1;
    }
    if us == Color::Black {
        next.fullmove_number += 1;
    }
    next.side_to_move = us.opponent();
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    /// Count leaf nodes of the legal move tree to `depth`.
    fn perft(board: &Board, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        legal_moves(board)
            .iter()
            .map(|mv| perft(&make_move(board, mv), depth - 1))
            .sum()
    }

    #[test]
    fn starting_position_perft() {
        let board = Board::starting();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8_902);
    }

    #[test]
    fn kiwipete_perft() {
        // Exercises castling, en passant, promotion, and pins.
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&board, 1), 48);
        assert_eq!(perft(&board, 2), 2_039);
    }

    #[test]
    fn en_passant_perft_position() {
        let board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&board, 1), 14);
        assert_eq!(perft(&board, 2), 191);
        assert_eq!(perft(&board, 3), 2_812);
    }

    #[test]
    fn castling_blocked_through_check() {
        // Black bishop on c4 covers f1, so White may not castle king side.
        let board = Board::from_fen("4k3/8/8/8/2b5/8/8/4K2R w K - 0 1").unwrap();
        assert!(
            !legal_moves(&board)
                .iter()
                .any(|mv| mv.kind == MoveKind::CastleKingSide)
        );
    }

    #[test]
    fn castling_moves_the_rook() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castle = legal_moves(&board)
            .into_iter()
            .find(|mv| mv.kind == MoveKind::CastleQueenSide)
            .unwrap();
        let after = make_move(&board, &castle);
        assert_eq!(after.piece_at(sq("c1")), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(after.piece_at(sq("d1")), Some(Piece::new(Color::White, PieceKind::Rook)));
        assert_eq!(after.piece_at(sq("a1")), None);
        assert!(!after.castling().king_side(Color::White));
        assert!(after.castling().king_side(Color::Black));
    }

    #[test]
    fn en_passant_removes_captured_pawn() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let capture = legal_moves(&board)
            .into_iter()
            .find(|mv| mv.kind == MoveKind::EnPassant)
            .unwrap();
        assert_eq!(capture.to, sq("f6"));
        let after = make_move(&board, &capture);
        assert_eq!(after.piece_at(sq("f5")), None);
        assert_eq!(after.piece_at(sq("f6")), Some(Piece::new(Color::White, PieceKind::Pawn)));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // The e2 knight is pinned against the e1 king by the e8 rook.
        let board = Board::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(legal_moves(&board).iter().all(|mv| mv.from != sq("e2")));
    }

    #[test]
    fn pawn_promotion_generates_four_choices() {
        let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let promotions: Vec<_> = legal_moves(&board)
            .into_iter()
            .filter(|mv| mv.from == sq("a7"))
            .collect();
        assert_eq!(promotions.len(), 4);
        assert!(promotions.iter().all(|mv| mv.promotion.is_some()));
    }

    #[test]
    fn clocks_advance() {
        let board = Board::starting();
        let knight = legal_moves(&board)
            .into_iter()
            .find(|mv| mv.from == sq("g1") && mv.to == sq("f3"))
            .unwrap();
        let after = make_move(&board, &knight);
        assert_eq!(after.halfmove_clock(), 1);
        assert_eq!(after.fullmove_number(), 1);
        assert_eq!(after.side_to_move(), Color::Black);
    }
}
