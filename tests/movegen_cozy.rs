// Cross-check move generation against an independent generator.

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "8/8/8/2k5/3pP3/8/8/4K3 b - e3 0 1",
    "8/8/8/8/k2Pp2Q/8/8/3K4 b - d3 0 1",
    "4k3/1P6/8/8/8/8/6p1/4K3 w - - 0 1",
];

fn cozy_perft(board: &cozy_chess::Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0u64;
    board.generate_moves(|moves| {
        for m in moves {
            let mut child = board.clone();
            child.play(m);
            nodes += cozy_perft(&child, depth - 1);
        }
        false
    });
    nodes
}

#[test]
fn perft_matches_reference_generator() {
    use dhouse::board::Position;
    use dhouse::perft::perft;

    for fen in POSITIONS {
        let ours = Position::from_fen(fen).unwrap();
        let reference = cozy_chess::Board::from_fen(fen, false).unwrap();
        for depth in 1..=3 {
            let a = perft(&ours, depth);
            let b = cozy_perft(&reference, depth);
            assert_eq!(a, b, "perft({depth}) mismatch for {fen}: ours {a}, reference {b}");
        }
    }
}

#[test]
fn keys_survive_every_move() {
    use dhouse::board::{legal_moves, Position};

    for fen in POSITIONS {
        let pos = Position::from_fen(fen).unwrap();
        for &mv in legal_moves(&pos).iter() {
            let child = pos.do_move(mv);
            assert_eq!(child.key(), child.compute_key(), "key drift after {mv} in {fen}");
            assert_eq!(child.material_key(), child.compute_material_key(), "material key drift after {mv} in {fen}");
        }
    }
}
