use dhouse::board::{Move, Position};
use dhouse::search::history::Histories;
use dhouse::search::movepick::MovePicker;
use dhouse::search::stack::SearchStack;
use dhouse::search::{Score, SearchParams, Searcher};

#[test]
fn cutoff_rewards_best_quiet_and_sets_killer() {
    let pos = Position::startpos();
    let mut h = Histories::new();
    let mut stack = SearchStack::new();
    let prev = pos.parse_move("e2e4").unwrap();
    let child = pos.do_move(prev);
    stack.at_mut(0).mv = prev;

    let best = child.parse_move("g8f6").unwrap();
    let tried = [child.parse_move("a7a6").unwrap(), child.parse_move("b8c6").unwrap(), best];
    h.update(&child, &mut stack, 1, best, 5, &[], &tried);

    let side = child.side_to_move();
    assert!(h.quiet_score(side, &stack, 1, best) > 0, "cutoff move was not rewarded");
    assert!(h.quiet_score(side, &stack, 1, tried[0]) < 0, "failed quiet was not penalised");
    assert_eq!(stack.at(1).killers[0], best);
    assert_eq!(h.counter_move(prev), best);

    h.clear();
    assert_eq!(h.quiet_score(side, &stack, 1, best), 0);
    assert_eq!(h.counter_move(prev), Move::NULL);
}

#[test]
fn most_valuable_victim_comes_first() {
    // b4 can take the queen on c5 or the pawn on a5.
    let pos = Position::from_fen("4k3/8/8/p1q5/1P6/8/8/4K3 w - - 0 1").unwrap();
    let masks = pos.masks();
    let h = Histories::new();
    let stack = SearchStack::new();
    let mut picker = MovePicker::new(&pos, &masks, Move::NULL, [Move::NULL; 2], Move::NULL);
    let first = picker.next(&h, &stack, 0).unwrap();
    assert_eq!(first.to_string(), "b4c5");
    let second = picker.next(&h, &stack, 0).unwrap();
    assert_eq!(second.to_string(), "b4a5");
}

#[test]
fn killer_comes_before_other_quiets() {
    let pos = Position::startpos();
    let masks = pos.masks();
    let h = Histories::new();
    let stack = SearchStack::new();
    let killer = pos.parse_move("h2h3").unwrap();
    let mut picker = MovePicker::new(&pos, &masks, Move::NULL, [killer, Move::NULL], Move::NULL);
    assert_eq!(picker.next(&h, &stack, 0), Some(killer));
    let rest: Vec<Move> = std::iter::from_fn(|| picker.next(&h, &stack, 0)).collect();
    assert_eq!(rest.len(), 19);
    assert!(!rest.contains(&killer), "killer handed out twice");
}

#[test]
fn mate_in_two_with_rooks() {
    let pos = Position::from_fen("7k/8/8/8/8/8/R7/1R4K1 w - - 0 1").unwrap();
    let mut s = Searcher::new(1, 4).unwrap();
    let res = s.search_with_params(&pos, &SearchParams::depth(6));
    assert_eq!(Score::from_value(res.score), Score::Mate(2), "score {}", res.score);
}
