use cobalt_chess::board::zobrist;
use cobalt_chess::movegen::{magic, tables};
use cobalt_chess::uci::protocol;

use once_cell::sync::Lazy;

fn main() {
    // Warm the lazily built tables so the first search pays nothing.
    Lazy::force(&zobrist::ZOBRIST);
    Lazy::force(&tables::RAYS);
    Lazy::force(&tables::SQUARES_BETWEEN);
    Lazy::force(&tables::KNIGHT_ATTACKS);
    Lazy::force(&tables::KING_ATTACKS);
    Lazy::force(&tables::PAWN_ATTACKS);
    magic::init_magics();

    let code = protocol::run_uci();
    std::process::exit(code);
}
