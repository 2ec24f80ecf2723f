use dhouse::board::{legal_moves, Position};
use dhouse::search::{Score, SearchParams, Searcher, CHECKMATE};

fn search(fen: &str, depth: i32) -> dhouse::search::SearchResult {
    let pos = Position::from_fen(fen).unwrap();
    let mut s = Searcher::new(1, 4).unwrap();
    s.search_with_params(&pos, &SearchParams::depth(depth))
}

#[test]
fn finds_back_rank_mate() {
    let res = search("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 4);
    assert_eq!(res.bestmove.map(|m| m.to_string()).as_deref(), Some("a1a8"));
    assert_eq!(Score::from_value(res.score), Score::Mate(1), "score {}", res.score);
}

#[test]
fn takes_the_hanging_queen() {
    let res = search("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 5);
    assert_eq!(res.bestmove.map(|m| m.to_string()).as_deref(), Some("d2d5"));
    assert!(res.score > 300, "expected a winning score, got {}", res.score);
}

#[test]
fn no_move_when_mated_or_stalemated() {
    let mated = search("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", 3);
    assert!(mated.bestmove.is_none());
    assert_eq!(mated.score, -CHECKMATE);

    let stalemate = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
    assert!(stalemate.bestmove.is_none());
    assert_eq!(stalemate.score, 0);
}

#[test]
fn reaches_requested_depth_with_legal_pv() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let res = search(fen, 5);
    assert_eq!(res.depth, 5);
    assert!(!res.pv.is_empty());
    assert_eq!(res.pv.first().copied(), res.bestmove);

    let mut pos = Position::from_fen(fen).unwrap();
    for &mv in &res.pv {
        assert!(legal_moves(&pos).contains(&mv), "illegal pv move {mv} in {pos:?}");
        pos = pos.do_move(mv);
    }
}

#[test]
fn single_thread_search_is_deterministic() {
    let fen = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";
    let a = search(fen, 6);
    let b = search(fen, 6);
    assert_eq!(a.bestmove, b.bestmove);
    assert_eq!(a.score, b.score);
    assert_eq!(a.nodes, b.nodes, "node counts differ between identical searches");
}

#[test]
fn node_limit_stops_search() {
    let pos = Position::startpos();
    let mut s = Searcher::new(1, 4).unwrap();
    let params = SearchParams { max_nodes: Some(20_000), ..Default::default() };
    let res = s.search_with_params(&pos, &params);
    assert!(res.bestmove.is_some());
    assert!(res.nodes <= 20_000 + 1024, "searched {} nodes", res.nodes);
    assert!(res.depth >= 1);
}

#[test]
fn new_game_forgets_the_table() {
    let pos = Position::startpos();
    let mut s = Searcher::new(1, 4).unwrap();
    s.search_with_params(&pos, &SearchParams::depth(4));
    assert!(s.tt().probe(pos.key()).is_some());
    s.new_game();
    assert!(s.tt().probe(pos.key()).is_none());
}
