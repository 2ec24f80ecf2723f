use std::collections::HashSet;

use dhouse::board::{is_legal, legal_moves, Move, MoveFlag, Piece, Position, Square};

const FENS: &[&str] = &[
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

fn subtree(root: &Position, depth: u32, out: &mut Vec<Position>) {
    out.push(root.clone());
    if depth == 0 {
        return;
    }
    for &mv in legal_moves(root).iter() {
        subtree(&root.do_move(mv), depth - 1, out);
    }
}

fn pos(fen: &str) -> Position { Position::from_fen(fen).unwrap() }

fn accepts(pos: &Position, mv: Move) -> bool { is_legal(pos, &pos.masks(), mv) }

#[test]
fn cached_moves_from_anywhere_in_the_tree() {
    for fen in FENS {
        let mut positions = Vec::new();
        subtree(&pos(fen), 2, &mut positions);
        // Every move seen anywhere in the subtree, as a hash or killer slot might hold it.
        let pool: HashSet<Move> = positions.iter().flat_map(|p| legal_moves(p).iter().copied().collect::<Vec<_>>()).collect();

        for p in &positions {
            let masks = p.masks();
            let legal: HashSet<Move> = legal_moves(p).iter().copied().collect();
            for &mv in &pool {
                assert_eq!(is_legal(p, &masks, mv), legal.contains(&mv), "{mv} in {}", p.to_fen());
            }
        }
    }
}

#[test]
fn pinned_piece_stays_on_its_line() {
    let p = pos("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1");
    assert!(!accepts(&p, Move::new(Square::E2, Square::C3, Piece::WhiteKnight, false, MoveFlag::None)));

    let p = pos("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1");
    assert!(accepts(&p, Move::new(Square::E2, Square::E7, Piece::WhiteRook, true, MoveFlag::None)));
    assert!(!accepts(&p, Move::new(Square::E2, Square::D2, Piece::WhiteRook, false, MoveFlag::None)));
}

#[test]
fn king_avoids_attacked_squares() {
    let p = pos("4k3/8/8/8/8/8/r7/4K3 w - - 0 1");
    assert!(!accepts(&p, Move::new(Square::E1, Square::E2, Piece::WhiteKing, false, MoveFlag::None)));
    assert!(accepts(&p, Move::new(Square::E1, Square::F1, Piece::WhiteKing, false, MoveFlag::None)));

    // Stepping back along the checking ray is still in check.
    let p = pos("4k3/4r3/8/8/8/8/4K3/8 w - - 0 1");
    assert!(!accepts(&p, Move::new(Square::E2, Square::E1, Piece::WhiteKing, false, MoveFlag::None)));
}

#[test]
fn no_castling_through_attacked_squares() {
    let castle = Move::new(Square::E1, Square::G1, Piece::WhiteKing, false, MoveFlag::Castle);
    assert!(accepts(&pos("4k3/8/8/8/8/8/8/4K2R w K - 0 1"), castle));
    assert!(!accepts(&pos("4k3/8/8/8/8/8/5r2/4K2R w K - 0 1"), castle));
    // In check.
    assert!(!accepts(&pos("4k3/4r3/8/8/8/8/8/4K2R w K - 0 1"), castle));
}

#[test]
fn stale_en_passant_and_killers_are_rejected() {
    let with_ep = pos("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
    let ep = with_ep.parse_move("e5d6").unwrap();
    assert_eq!(ep.flag(), MoveFlag::EnPassant);
    assert!(accepts(&with_ep, ep));
    let without_ep = pos("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
    assert!(!accepts(&without_ep, ep));

    // Bf1-c4 after 1.e4 e5 is blocked after 1.d4 d5.
    let open = Position::startpos().do_move_str("e2e4").do_move_str("e7e5");
    let killer = open.parse_move("f1c4").unwrap();
    let closed = Position::startpos().do_move_str("d2d4").do_move_str("d7d5");
    assert!(!accepts(&closed, killer));
    assert!(!accepts(&closed, Move::NULL));
}

trait PlayStr {
    fn do_move_str(&self, text: &str) -> Position;
}

impl PlayStr for Position {
    fn do_move_str(&self, text: &str) -> Position { self.do_move(self.parse_move(text).unwrap()) }
}
