use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dhouse::board::{legal_moves, Position};
use dhouse::perft::perft;

fn bench_perft(c: &mut Criterion) {
    let start = Position::startpos();
    c.bench_function("perft_4_startpos", |ben| ben.iter(|| black_box(perft(black_box(&start), 4))));

    let kiwipete = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
    c.bench_function("perft_3_kiwipete", |ben| ben.iter(|| black_box(perft(black_box(&kiwipete), 3))));
    c.bench_function("legal_moves_kiwipete", |ben| ben.iter(|| black_box(legal_moves(black_box(&kiwipete)).len())));
}

criterion_group!(benches, bench_perft);
criterion_main!(benches);
