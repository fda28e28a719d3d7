use crate::board::square::Square;

// Opening piece-square bonuses from White's point of view, laid out in
// square-index order (a8 first). The evaluator scales them by the opening
// weight, so the raw values stay small.

#[rustfmt::skip]
pub const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     8,  8,  8,  8,  8,  8,  8,  8,
     2,  2,  4,  6,  6,  4,  2,  2,
     1,  1,  2,  5,  5,  2,  1,  1,
     0,  0,  0,  4,  4,  0,  0,  0,
     1, -1, -2,  0,  0, -2, -1,  1,
     1,  2,  2, -4, -4,  2,  2,  1,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
pub const KNIGHT_PST: [i32; 64] = [
    -8, -6, -4, -4, -4, -4, -6, -8,
    -6, -3,  0,  0,  0,  0, -3, -6,
    -4,  0,  2,  3,  3,  2,  0, -4,
    -4,  1,  3,  4,  4,  3,  1, -4,
    -4,  0,  3,  4,  4,  3,  0, -4,
    -4,  1,  2,  3,  3,  2,  1, -4,
    -6, -3,  0,  1,  1,  0, -3, -6,
    -8, -6, -4, -4, -4, -4, -6, -8,
];

#[rustfmt::skip]
pub const KING_PST: [i32; 64] = [
    -6, -8, -8, -9, -9, -8, -8, -6,
    -6, -8, -8, -9, -9, -8, -8, -6,
    -6, -8, -8, -9, -9, -8, -8, -6,
    -6, -8, -8, -9, -9, -8, -8, -6,
    -4, -6, -6, -8, -8, -6, -6, -4,
    -2, -4, -4, -4, -4, -4, -4, -2,
     4,  4,  0,  0,  0,  0,  4,  4,
     4,  6,  2,  0,  0,  2,  6,  4,
];

// Centipawn bonus per square of the bare king, from the attacker's point of
// view: the farther toward an edge or corner the defending king is driven,
// the better. Not opening-weighted.
#[rustfmt::skip]
pub const KING_ENDGAME_EDGE: [i32; 64] = [
    45, 42, 40, 40, 40, 40, 42, 45,
    42, 30, 25, 25, 25, 25, 30, 42,
    40, 25, 10, 10, 10, 10, 25, 40,
    40, 25, 10,  0,  0, 10, 25, 40,
    40, 25, 10,  0,  0, 10, 25, 40,
    40, 25, 10, 10, 10, 10, 25, 40,
    42, 30, 25, 25, 25, 25, 30, 42,
    45, 42, 40, 40, 40, 40, 42, 45,
];

/// Mirrors a square across the horizontal midline, turning a White table
/// lookup into the Black one.
#[inline(always)]
pub const fn flip_vertical(square: Square) -> Square {
    (7 - square / 8) * 8 + square % 8
}
