use dhouse::board::Position;
use dhouse::uci::apply_moves;

#[test]
fn knight_shuffle_repeats() {
    let start = Position::startpos();
    let pos = apply_moves(start.clone(), ["g1f3", "g8f6", "f3g1"]).unwrap();
    assert!(!pos.is_repetition());
    let pos = apply_moves(pos, ["f6g8"]).unwrap();
    assert_eq!(pos.key(), start.key());
    assert!(pos.is_repetition(), "returning to the start should be a repetition");
    assert!(pos.is_draw());
}

#[test]
fn pawn_move_clears_history_and_ep_state_counts() {
    let pos = apply_moves(Position::startpos(), ["g1f3", "g8f6", "f3g1", "f6g8", "e2e4"]).unwrap();
    assert_eq!(pos.halfmove_clock(), 0);
    let shuffle = ["g8f6", "g1f3", "f6g8", "f3g1"];
    let once = apply_moves(pos.clone(), shuffle).unwrap();
    // Same placement as right after e2e4, but the en-passant square is gone.
    assert_ne!(once.key(), pos.key());
    assert!(!once.is_repetition());
    assert_eq!(once.halfmove_clock(), 4);
    let twice = apply_moves(once.clone(), shuffle).unwrap();
    assert_eq!(twice.key(), once.key());
    assert!(twice.is_repetition());
}

#[test]
fn capture_clears_history() {
    let pos = Position::from_fen("4k3/8/8/3p4/8/8/8/R3K2N w - - 10 1").unwrap();
    assert_eq!(pos.halfmove_clock(), 10);
    let pos = apply_moves(pos, ["a1a2", "e8d8", "a2a1", "d8e8"]).unwrap();
    assert!(pos.is_repetition());
    let pos = apply_moves(pos, ["h1f2", "e8d7", "f2d3", "d7e6", "d3f4", "e6e5", "f4d5"]).unwrap();
    assert_eq!(pos.halfmove_clock(), 0);
    assert!(!pos.is_repetition());
}

#[test]
fn fifty_move_rule() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
    assert!(!pos.is_fifty_move_draw());
    let pos = apply_moves(pos, ["a1a2"]).unwrap();
    assert!(pos.is_fifty_move_draw());
    assert!(pos.is_draw());
}

#[test]
fn insufficient_material() {
    for fen in ["4k3/8/8/8/8/8/8/4K3 w - - 0 1", "4k3/8/8/8/8/8/8/4KN2 w - - 0 1", "4kb2/8/8/8/8/8/8/4KN2 w - - 0 1"] {
        let pos = Position::from_fen(fen).unwrap();
        assert!(pos.is_material_draw(), "{fen} should be a dead draw");
    }
    for fen in ["4k3/8/8/8/8/8/8/4KNN1 w - - 0 1", "4k3/8/8/8/8/8/P7/4K3 w - - 0 1"] {
        let pos = Position::from_fen(fen).unwrap();
        assert!(!pos.is_material_draw(), "{fen} still has mating material");
    }
}
