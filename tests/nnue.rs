use dhouse::board::{legal_moves, Position, Square};
use dhouse::eval::evaluate;
use dhouse::eval::nnue::{loader, network, Accumulator, Network};

const FENS: &[&str] = &[
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
];

fn refreshed(pos: &Position) -> Accumulator {
    let placed = Square::all().filter_map(|sq| pos.piece_at(sq).map(|p| (p, sq)));
    Accumulator::refresh(network(), placed)
}

#[test]
fn incremental_accumulator_matches_refresh() {
    for fen in FENS {
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(*pos.accumulator(), refreshed(&pos));
        for &mv in legal_moves(&pos).iter() {
            let child = pos.do_move(mv);
            assert_eq!(*child.accumulator(), refreshed(&child), "accumulator drift after {mv} in {fen}");
            for &reply in legal_moves(&child).iter() {
                let grandchild = child.do_move(reply);
                assert_eq!(*grandchild.accumulator(), refreshed(&grandchild), "accumulator drift after {mv} {reply} in {fen}");
            }
        }
    }
}

#[test]
fn evaluation_is_side_relative() {
    assert_eq!(evaluate(&Position::startpos()), 0);
    let white = Position::from_fen("4k3/8/8/8/8/8/3QP3/4K3 w - - 0 1").unwrap();
    let black = Position::from_fen("4k3/3qp3/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert!(evaluate(&white) > 900, "queen and pawn up should score high: {}", evaluate(&white));
    assert_eq!(evaluate(&white), evaluate(&black), "mirrored positions should score the same");
    let flipped = Position::from_fen("4k3/8/8/8/8/8/3QP3/4K3 b - - 0 1").unwrap();
    assert_eq!(evaluate(&flipped), -evaluate(&white));
}

#[test]
fn dead_draws_score_zero() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4KB2 w - - 0 1").unwrap();
    assert_eq!(evaluate(&pos), 0);
}

#[test]
fn weights_round_trip_through_a_file() {
    let path = std::env::temp_dir().join(format!("dhouse-net-{}.bin", std::process::id()));
    let net = Network::material();
    loader::save(&net, &path).unwrap();
    let loaded = loader::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, net);
}

#[test]
fn missing_weight_file_is_an_error() {
    let err = loader::load("/definitely/not/here.bin").unwrap_err();
    assert!(format!("{err:#}").contains("open network file"), "unexpected error: {err:#}");
}

#[test]
fn piece_square_bonuses_follow_the_owner() {
    let advanced = Position::from_fen("k7/4P3/8/8/8/8/8/7K w - - 0 1").unwrap();
    let home = Position::from_fen("k7/8/8/8/8/8/4P3/7K w - - 0 1").unwrap();
    assert!(evaluate(&advanced) > evaluate(&home), "e7 {} vs e2 {}", evaluate(&advanced), evaluate(&home));

    // Same pawns, black king sheltered on g8 or exposed on g1.
    let sheltered = Position::from_fen("6k1/p7/8/8/8/8/P7/K7 w - - 0 1").unwrap();
    let exposed = Position::from_fen("8/p7/8/8/8/8/P7/K5k1 w - - 0 1").unwrap();
    assert!(evaluate(&sheltered) < evaluate(&exposed), "g8 {} vs g1 {}", evaluate(&sheltered), evaluate(&exposed));

    let mirrored = Position::from_fen("6k1/p7/8/8/8/8/P7/6K1 w - - 0 1").unwrap();
    assert_eq!(evaluate(&mirrored), 0);
}
