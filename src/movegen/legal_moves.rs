use crate::board::bitboard::{self, Bitboard, ALL_SQUARES, EMPTY, RANK_1, RANK_4, RANK_5, RANK_8};
use crate::board::piece::{Color, PieceKind};
use crate::board::position::Board;
use crate::board::square::Square;
use crate::movegen::magic;
use crate::movegen::moves::{Move, MoveFlag, MoveList};
use crate::movegen::tables::{self, ALL_DIRECTIONS};

/// Per-generation state threaded through the piece generators: pin lines,
/// sliding checkers and the check-resolution mask from one pass over the
/// king rays, plus the king-danger squares.
pub struct GenerationContext {
    side: Color,
    king_sq: Square,
    in_check: bool,
    pinned: Bitboard,
    pin_lines: [Bitboard; 64],
    sliding_checkers: Bitboard,
    check_resolutions: Bitboard,
    king_danger: Bitboard,
}

impl GenerationContext {
    pub fn build(board: &Board) -> GenerationContext {
        let side = board.side_to_move;
        let enemy = side.opposite();
        let king_sq = board.king_square(side);
        let king_bb = bitboard::with_square(king_sq);
        let in_check = board.attacking_squares(enemy) & king_bb != 0;

        let mut ctx = GenerationContext {
            side,
            king_sq,
            in_check,
            pinned: EMPTY,
            pin_lines: [ALL_SQUARES; 64],
            sliding_checkers: EMPTY,
            check_resolutions: ALL_SQUARES,
            king_danger: attacks_with_king_removed(board, enemy),
        };

        // One pass over the eight king rays finds both the pins and the
        // sliding checkers.
        let rook_like = board.pieces_of(PieceKind::Rook, enemy)
            | board.pieces_of(PieceKind::Queen, enemy);
        let bishop_like = board.pieces_of(PieceKind::Bishop, enemy)
            | board.pieces_of(PieceKind::Queen, enemy);

        let mut slide_resolution = EMPTY;
        for (i, &direction) in ALL_DIRECTIONS.iter().enumerate() {
            let threats = if direction.is_orthogonal() {
                rook_like
            } else {
                bishop_like
            };
            if threats & tables::RAYS[king_sq as usize][i] == 0 {
                continue;
            }

            let mut own_blocker: Option<Square> = None;
            let mut target = king_sq as i8;
            for _ in 0..tables::edge_distance(king_sq, direction) {
                target += direction.delta();
                let square = target as Square;
                let piece = board.piece_at(square);
                if piece.is_none() {
                    continue;
                }

                if piece.color() == side {
                    if own_blocker.is_some() {
                        // Two own pieces shield the king; neither is pinned.
                        break;
                    }
                    own_blocker = Some(square);
                    continue;
                }

                let attacks_along = piece.kind() == PieceKind::Queen
                    || (piece.kind() == PieceKind::Rook && direction.is_orthogonal())
                    || (piece.kind() == PieceKind::Bishop && !direction.is_orthogonal());
                if attacks_along {
                    let line =
                        tables::squares_between(king_sq, square) | bitboard::with_square(square);
                    match own_blocker {
                        None => {
                            ctx.sliding_checkers |= bitboard::with_square(square);
                            slide_resolution |= line;
                        }
                        Some(own_sq) => {
                            ctx.pinned |= bitboard::with_square(own_sq);
                            ctx.pin_lines[own_sq as usize] = line;
                        }
                    }
                }
                break;
            }
        }

        let pawn_checkers =
            tables::pawn_attacks(king_sq, side) & board.pieces_of(PieceKind::Pawn, enemy);
        let knight_checkers =
            tables::knight_attacks(king_sq) & board.pieces_of(PieceKind::Knight, enemy);
        let leaper_checkers = pawn_checkers | knight_checkers;

        ctx.check_resolutions = if !in_check {
            ALL_SQUARES
        } else if bitboard::popcount(ctx.sliding_checkers) > 1 {
            // Double check: nothing blocks or captures both attackers.
            EMPTY
        } else if ctx.sliding_checkers != 0 && leaper_checkers != 0 {
            // Discovered double check.
            EMPTY
        } else if ctx.sliding_checkers != 0 {
            slide_resolution
        } else {
            leaper_checkers
        };

        ctx
    }

    #[inline(always)]
    fn pin_line(&self, square: Square) -> Bitboard {
        self.pin_lines[square as usize]
    }

    #[inline(always)]
    pub fn pinned_pieces(&self) -> Bitboard {
        self.pinned
    }

    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.sliding_checkers
    }
}

/// Enemy attack squares with the defending king lifted off the board, so
/// sliders re-attack through the king square and the square directly behind
/// a checking ray stays forbidden.
fn attacks_with_king_removed(board: &Board, attacker: Color) -> Bitboard {
    let occupancy =
        board.all_pieces() & !board.pieces_of(PieceKind::King, attacker.opposite());

    let mut attacks =
        tables::pawn_attacking_squares(board.pieces_of(PieceKind::Pawn, attacker), attacker);
    for sq in bitboard::squares_of(board.pieces_of(PieceKind::Knight, attacker)) {
        attacks |= tables::knight_attacks(sq);
    }
    for sq in bitboard::squares_of(board.pieces_of(PieceKind::Bishop, attacker)) {
        attacks |= magic::bishop_attacks(sq, occupancy);
    }
    for sq in bitboard::squares_of(board.pieces_of(PieceKind::Rook, attacker)) {
        attacks |= magic::rook_attacks(sq, occupancy);
    }
    for sq in bitboard::squares_of(board.pieces_of(PieceKind::Queen, attacker)) {
        attacks |= magic::queen_attacks(sq, occupancy);
    }
    attacks |= tables::king_attacks(board.king_square(attacker));

    attacks
}

pub fn generate_legal_moves(board: &Board) -> MoveList {
    let ctx = GenerationContext::build(board);
    let mut moves = MoveList::new();

    generate_pawn_moves(board, &ctx, &mut moves);
    generate_knight_moves(board, &ctx, &mut moves);
    generate_slider_moves(board, &ctx, PieceKind::Bishop, &mut moves);
    generate_slider_moves(board, &ctx, PieceKind::Rook, &mut moves);
    generate_slider_moves(board, &ctx, PieceKind::Queen, &mut moves);
    generate_king_moves(board, &ctx, &mut moves);

    moves
}

const PROMOTION_FLAGS: [MoveFlag; 4] = [
    MoveFlag::PromotionQueen,
    MoveFlag::PromotionRook,
    MoveFlag::PromotionBishop,
    MoveFlag::PromotionKnight,
];

fn emit_pawn_moves(
    targets: Bitboard,
    start_offset: i8,
    promotions: bool,
    ctx: &GenerationContext,
    moves: &mut MoveList,
) {
    let mut bb = targets;
    while bb != 0 {
        let end = bitboard::pop_msb(&mut bb);
        let start = (end as i8 + start_offset) as Square;
        let target_bb = bitboard::with_square(end);
        if ctx.check_resolutions & target_bb == 0 || ctx.pin_line(start) & target_bb == 0 {
            continue;
        }
        if promotions {
            for &flag in &PROMOTION_FLAGS {
                moves.emplace(start, end, flag);
            }
        } else {
            moves.emplace(start, end, MoveFlag::None);
        }
    }
}

fn generate_pawn_moves(board: &Board, ctx: &GenerationContext, moves: &mut MoveList) {
    let side = ctx.side;
    let pawns = board.pieces_of(PieceKind::Pawn, side);
    let empty = !board.all_pieces();
    let enemy_pieces = board.pieces(side.opposite());

    // Single/double pushes and the two capture diagonals come straight off
    // the pawn front; start squares are recovered from the target offset.
    let (singles, doubles, lefts, rights, promotion_rank) = match side {
        Color::White => {
            let singles = bitboard::shift_up(pawns) & empty;
            (
                singles,
                bitboard::shift_up(singles) & empty & RANK_4,
                bitboard::shift_up_left(pawns) & enemy_pieces,
                bitboard::shift_up_right(pawns) & enemy_pieces,
                RANK_8,
            )
        }
        Color::Black => {
            let singles = bitboard::shift_down(pawns) & empty;
            (
                singles,
                bitboard::shift_down(singles) & empty & RANK_5,
                bitboard::shift_down_left(pawns) & enemy_pieces,
                bitboard::shift_down_right(pawns) & enemy_pieces,
                RANK_1,
            )
        }
    };

    let (single_off, double_off, left_off, right_off) = match side {
        Color::White => (8, 16, 9, 7),
        Color::Black => (-8, -16, -7, -9),
    };

    emit_pawn_moves(singles & !promotion_rank, single_off, false, ctx, moves);
    emit_pawn_moves(doubles, double_off, false, ctx, moves);
    emit_pawn_moves(lefts & !promotion_rank, left_off, false, ctx, moves);
    emit_pawn_moves(rights & !promotion_rank, right_off, false, ctx, moves);

    emit_pawn_moves(singles & promotion_rank, single_off, true, ctx, moves);
    emit_pawn_moves(lefts & promotion_rank, left_off, true, ctx, moves);
    emit_pawn_moves(rights & promotion_rank, right_off, true, ctx, moves);

    // En passant is rare enough to verify by playing it out; that also
    // covers the horizontal pin through both pawns that the pin pass
    // cannot see.
    if let Some(ep) = board.en_passant_target() {
        let candidates = tables::pawn_attacks(ep, side.opposite()) & pawns;
        for start in bitboard::squares_of(candidates) {
            let mv = Move::new(start, ep, MoveFlag::EnPassant);
            if is_en_passant_legal(board, mv, side) {
                moves.push(mv);
            }
        }
    }
}

fn is_en_passant_legal(board: &Board, mv: Move, side: Color) -> bool {
    let mut probe = board.probe_clone();
    probe.make_move(mv);
    !probe.is_side_in_check(side)
}

fn generate_knight_moves(board: &Board, ctx: &GenerationContext, moves: &mut MoveList) {
    let own = board.pieces(ctx.side);
    for start in bitboard::squares_of(board.pieces_of(PieceKind::Knight, ctx.side)) {
        let targets = tables::knight_attacks(start)
            & !own
            & ctx.pin_line(start)
            & ctx.check_resolutions;
        for end in bitboard::squares_of(targets) {
            moves.emplace(start, end, MoveFlag::None);
        }
    }
}

fn generate_slider_moves(
    board: &Board,
    ctx: &GenerationContext,
    kind: PieceKind,
    moves: &mut MoveList,
) {
    let own = board.pieces(ctx.side);
    let occupancy = board.all_pieces();
    for start in bitboard::squares_of(board.pieces_of(kind, ctx.side)) {
        let attacks = match kind {
            PieceKind::Bishop => magic::bishop_attacks(start, occupancy),
            PieceKind::Rook => magic::rook_attacks(start, occupancy),
            _ => magic::queen_attacks(start, occupancy),
        };
        let targets = attacks & !own & ctx.pin_line(start) & ctx.check_resolutions;
        for end in bitboard::squares_of(targets) {
            moves.emplace(start, end, MoveFlag::None);
        }
    }
}

fn generate_king_moves(board: &Board, ctx: &GenerationContext, moves: &mut MoveList) {
    let side = ctx.side;
    let start = ctx.king_sq;
    let own = board.pieces(side);

    let targets = tables::king_attacks(start) & !own & !ctx.king_danger;
    for end in bitboard::squares_of(targets) {
        moves.emplace(start, end, MoveFlag::None);
    }

    if ctx.in_check {
        return;
    }

    let enemy_attacks = board.attacking_squares(side.opposite());
    // Castling squares by color: white f1/g1 and b1/c1/d1, black f8/g8 and
    // b8/c8/d8; the king's two transit squares must be unattacked.
    let (f, g, b, c, d) = match side {
        Color::White => (61, 62, 57, 58, 59),
        Color::Black => (5, 6, 1, 2, 3),
    };

    if board.can_castle_short(side)
        && board.is_square_empty(f)
        && board.is_square_empty(g)
        && enemy_attacks & (bitboard::with_square(f) | bitboard::with_square(g)) == 0
    {
        moves.emplace(start, g, MoveFlag::ShortCastling);
    }

    if board.can_castle_long(side)
        && board.is_square_empty(b)
        && board.is_square_empty(c)
        && board.is_square_empty(d)
        && enemy_attacks & (bitboard::with_square(c) | bitboard::with_square(d)) == 0
    {
        moves.emplace(start, c, MoveFlag::LongCastling);
    }
}
