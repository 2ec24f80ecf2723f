use dhouse::board::{legal_moves, Position};
use dhouse::search::{SearchParams, Searcher};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn threads_are_clamped() {
    let mut s = Searcher::new(0, 1).unwrap();
    assert_eq!(s.get_threads(), 1);
    s.set_threads(4).unwrap();
    assert_eq!(s.get_threads(), 4, "threads param did not propagate to searcher");
    s.set_threads(1000).unwrap();
    assert_eq!(s.get_threads(), 64);
}

#[test]
fn parallel_search_returns_legal_move() {
    let pos = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
    let mut s = Searcher::new(4, 8).unwrap();
    let res = s.search_with_params(&pos, &SearchParams::depth(6));
    let best = res.bestmove.expect("no bestmove");
    assert!(legal_moves(&pos).contains(&best), "illegal bestmove {best}");
    assert_eq!(res.depth, 6);
    assert!(res.nodes > 0);
}

#[test]
fn parallel_search_still_finds_mate() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mut s = Searcher::new(3, 4).unwrap();
    let res = s.search_with_params(&pos, &SearchParams::depth(5));
    assert_eq!(res.bestmove.map(|m| m.to_string()).as_deref(), Some("a1a8"));
}

#[test]
fn stop_handle_ends_infinite_search() {
    let pos = Position::startpos();
    let mut s = Searcher::new(2, 4).unwrap();
    let stop = s.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        stop.store(true, Ordering::Relaxed);
    });
    let t0 = Instant::now();
    let params = SearchParams { infinite: true, ..Default::default() };
    let res = s.search_with_params(&pos, &params);
    stopper.join().unwrap();
    assert!(res.bestmove.is_some());
    assert!(t0.elapsed() < Duration::from_secs(10), "stop was not honoured");
}
