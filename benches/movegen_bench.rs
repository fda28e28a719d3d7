use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cobalt_chess::board::position::Board;
use cobalt_chess::movegen::legal_moves::generate_legal_moves;
use cobalt_chess::movegen::magic;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn movegen_bench(c: &mut Criterion) {
    magic::init_magics();

    let startpos = Board::startpos();
    c.bench_function("legal_moves_startpos", |b| {
        b.iter(|| {
            let moves = generate_legal_moves(black_box(&startpos));
            black_box(moves.len());
        });
    });

    let kiwipete = Board::from_fen(KIWIPETE).unwrap();
    c.bench_function("legal_moves_kiwipete", |b| {
        b.iter(|| {
            let moves = generate_legal_moves(black_box(&kiwipete));
            black_box(moves.len());
        });
    });

    c.bench_function("make_unmake_e2e4", |b| {
        let mv = startpos.parse_move("e2e4").unwrap();
        let mut board = startpos.clone();
        b.iter(|| {
            board.make_move(black_box(mv));
            board.unmake_move();
        });
    });
}

criterion_group!(
    name = movegen_benches;
    config = Criterion::default();
    targets = movegen_bench,
);
criterion_main!(movegen_benches);
