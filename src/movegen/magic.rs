use once_cell::sync::Lazy;

use crate::board::bitboard::{self, Bitboard, EMPTY};
use crate::board::square::Square;
use crate::movegen::tables::{
    edge_distance, ray_attacking_squares, Direction, DIAGONAL_DIRECTIONS, ORTHOGONAL_DIRECTIONS,
};

// Fixed magic multipliers and shifts shipped with the engine. The attack
// arrays are rebuilt from them at startup; the multipliers themselves were
// found offline.
const ROOK_MAGICS: [u64; 64] = [
    0xb7c8ffffbdf8ed79, 0x7cccb4acac99a09a, 0x277f8a1f457fa352, 0x7e7d01513baf5767,
    0xea6fff8a18fecce7, 0x05d24e354a272711, 0xcb734ff54bfdceab, 0xc796020f8482c023,
    0xcd8c8f85cd8c7798, 0xeaa063aac121fd78, 0xdc1e46605b34c09c, 0xcbacc491fc4f54bc,
    0x8036e0e6d8f8d7b8, 0xd3b647d77960e7d8, 0x9b20d4fa1bc46876, 0x44c4264f0b18de1e,
    0x8855b001ac251d80, 0x9625d5292d2e3c8e, 0xdbda6f4a66e590a7, 0x829058c99069906d,
    0xc9c0b0ea9c5521fb, 0x4177cd4386a64fab, 0x324a8dbe2ff95405, 0x55cd15e172a8d76f,
    0xfb64a8f2415d7821, 0xe7e48fdaafbff944, 0xbbb74318d41d9980, 0x11ab8facd32cad62,
    0x10fcc8bc23373750, 0x528b8b07f650b407, 0x0e2ec3ddbe240271, 0x658d05b962e98275,
    0xf70541a9e66a28a3, 0x79336c523e22a894, 0xe0543017e7f2ea61, 0x626d5cde515429f3,
    0xda285c3eb049a381, 0xb33e026abed080c8, 0x4fd05955da71f2bd, 0x6f5e84d217ad0bd7,
    0x96cd81400f2a7f68, 0x815be01fdbcb6d01, 0x66d6a657bfde74ac, 0xed07915ff915e160,
    0x4267b33c3ccf4512, 0xb945f45e60bc88c0, 0x6f25882bfdacac61, 0xc16006db41b8fc7e,
    0x327dfffdbe7ae3aa, 0x7cf6fa0a0d05f415, 0xc480c82b51c4a8df, 0x0f43028053a4e4b4,
    0x5475cff715cffbd0, 0xdea9695deb61b438, 0xac8aea22a7dbf996, 0x73aecf15f4cd6390,
    0xd6f50be59bf640b1, 0xa587df828f4368ab, 0x3581646cb6083d6b, 0xe4ded3bf94deb829,
    0x1878781a0a5f7d3a, 0x7a1ca6b38e4a76a1, 0x3322c373d920ddc6, 0x62ca191005858111,
];

const ROOK_SHIFTS: [u8; 64] = [
    50, 50, 50, 50, 51, 50, 50, 49, 51, 52, 51, 51, 51, 52, 52, 51, 51, 52, 52, 52, 51, 51, 52,
    50, 51, 52, 51, 51, 52, 51, 52, 50, 51, 52, 52, 51, 51, 51, 52, 51, 51, 52, 51, 52, 51, 51,
    52, 51, 51, 52, 51, 51, 52, 52, 52, 50, 49, 50, 50, 50, 50, 50, 50, 49,
];

const BISHOP_MAGICS: [u64; 64] = [
    0xb8d001f098f81e00, 0x0608526004064090, 0x584f1948600c9c91, 0xe2333ab7e2602083,
    0xbb8eb4dc10882089, 0x9aa25ead2c633000, 0x6e1bbba2880e8d21, 0xe361039861b637db,
    0x464ecb40f41fe041, 0xe0c0f80f83c7830c, 0x27e4caa0650d407f, 0x421b379212440abe,
    0x23bcf95910410bce, 0xca7e6ba3a5100445, 0x869e968d7420139d, 0x0ee4020cc9082543,
    0x9b790e4c8a02b092, 0xd1eb1b0b0709a40b, 0x399de3efefb62600, 0x098ee6e703b6d575,
    0xe96c65008088e041, 0x399928d647fdeffb, 0xfe5924841912a45c, 0xfe14f07af8e50e04,
    0x50349f0231d66c00, 0xcf50a44c8eccf800, 0x320f04daf0528793, 0x16f2bedbffd3bddc,
    0xb0987fefca7fbfd2, 0x5e244b495bad4658, 0xcbfe038e2de72e2a, 0x1a1887c884c4e03b,
    0xaf91c17679c0e63f, 0x37aa2398eb380684, 0x459c2357a2543de8, 0x538185e1d430c2fa,
    0x935571681f6fdbf7, 0xc25f97052e844918, 0x51a3a00c9757160b, 0x1f84963ba6f603c4,
    0x07fcb81d3861900f, 0x3e9c82fc08908805, 0x39938dcad7a938e1, 0xd0692149024012d8,
    0x81e0cf3e5f758447, 0xf763b7f04f3b4f05, 0xe96010e61600ce68, 0x28d424ea68102500,
    0x3632c7bfbbff7760, 0x18ef575d72945d9d, 0x15994bdf7befd422, 0xfcef1e05ee55acd1,
    0xd7a4e6066ac05c8e, 0x81589a1a23410129, 0x8640b904cc7c8083, 0xe774703dd07f8f7a,
    0x6b02be82acde54f5, 0xbdf88210810427d1, 0x7de5c389dc68f251, 0xb1d8820280d514d7,
    0xf348042a41ee4af1, 0x019c01e38b70e474, 0x47632631826a015f, 0xe226625000cede4c,
];

const BISHOP_SHIFTS: [u8; 64] = [
    57, 58, 58, 58, 58, 58, 58, 56, 58, 58, 58, 58, 58, 58, 58, 58, 58, 58, 55, 55, 56, 55, 58,
    58, 58, 58, 55, 52, 53, 55, 58, 58, 58, 58, 55, 53, 53, 55, 58, 58, 58, 58, 55, 56, 55, 55,
    58, 58, 58, 58, 58, 58, 58, 58, 58, 58, 56, 58, 58, 58, 58, 58, 58, 56,
];

/// Every subset of `blocker_mask`, including the empty one.
pub fn possible_blocker_positions(blocker_mask: Bitboard) -> Vec<Bitboard> {
    let squares: Vec<Square> = bitboard::squares_of(blocker_mask).collect();
    let count = 1usize << squares.len();

    let mut configurations = Vec::with_capacity(count);
    for config in 0..count {
        let mut blockers = EMPTY;
        for (i, &square) in squares.iter().enumerate() {
            if config >> i & 1 != 0 {
                blockers |= bitboard::with_square(square);
            }
        }
        configurations.push(blockers);
    }

    configurations
}

/// Blocker mask: the rays from `square`, with the edge terminus of each ray
/// left out (a blocker on the edge can never shorten the attack).
fn blocker_mask(square: Square, directions: &[Direction]) -> Bitboard {
    let mut mask = EMPTY;
    for &direction in directions {
        let mut target = square as i8;
        let distance = edge_distance(square, direction);
        for _ in 1..distance {
            target += direction.delta();
            mask |= bitboard::with_square(target as Square);
        }
    }
    mask
}

struct MagicTable {
    masks: [Bitboard; 64],
    magics: &'static [u64; 64],
    shifts: &'static [u8; 64],
    attacks: Vec<Vec<Bitboard>>,
}

impl MagicTable {
    fn build(
        magics: &'static [u64; 64],
        shifts: &'static [u8; 64],
        directions: &'static [Direction; 4],
    ) -> MagicTable {
        let mut masks = [EMPTY; 64];
        let mut attacks = Vec::with_capacity(64);

        for square in 0..64u8 {
            masks[square as usize] = blocker_mask(square, directions);
            let blocker_sets = possible_blocker_positions(masks[square as usize]);

            // The per-square array covers the largest index any subset maps to.
            let mut length = 0usize;
            for &blockers in &blocker_sets {
                let index =
                    (blockers.wrapping_mul(magics[square as usize]) >> shifts[square as usize])
                        as usize;
                length = length.max(index);
            }
            length += 1;

            let mut table = vec![EMPTY; length];
            for &blockers in &blocker_sets {
                let index =
                    (blockers.wrapping_mul(magics[square as usize]) >> shifts[square as usize])
                        as usize;
                table[index] = ray_attacking_squares(blockers, square, directions);
            }
            attacks.push(table);
        }

        MagicTable {
            masks,
            magics,
            shifts,
            attacks,
        }
    }

    #[inline(always)]
    fn lookup(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        let square = square as usize;
        let blockers = occupancy & self.masks[square];
        let index = (blockers.wrapping_mul(self.magics[square]) >> self.shifts[square]) as usize;
        self.attacks[square][index]
    }
}

static ROOK_TABLE: Lazy<MagicTable> =
    Lazy::new(|| MagicTable::build(&ROOK_MAGICS, &ROOK_SHIFTS, &ORTHOGONAL_DIRECTIONS));

static BISHOP_TABLE: Lazy<MagicTable> =
    Lazy::new(|| MagicTable::build(&BISHOP_MAGICS, &BISHOP_SHIFTS, &DIAGONAL_DIRECTIONS));

/// Forces construction of both magic tables. Called once at startup so the
/// first search does not pay the build cost.
pub fn init_magics() {
    Lazy::force(&ROOK_TABLE);
    Lazy::force(&BISHOP_TABLE);
}

#[inline(always)]
pub fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ROOK_TABLE.lookup(square, occupancy)
}

#[inline(always)]
pub fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    BISHOP_TABLE.lookup(square, occupancy)
}

#[inline(always)]
pub fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}
