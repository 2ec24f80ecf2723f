use dhouse::board::Color;
use dhouse::config::EngineConfig;
use dhouse::uci::{parse_go, parse_position, UciEngine};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn apply_startpos_moves_sequence() {
    let pos = parse_position("startpos moves e2e4 e7e5 g1f3").expect("legal move sequence");
    assert_eq!(pos.side_to_move(), Color::Black, "expected black to move after 3 plies");
    assert_eq!(pos.to_fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2");
}

#[test]
fn fen_position_with_moves_and_promotion() {
    let pos = parse_position("fen 4k3/1P6/8/8/8/8/8/4K3 w - - 0 1 moves b7b8q e8d7").unwrap();
    assert_eq!(pos.to_fen(), "1Q6/3k4/8/8/8/8/8/4K3 w - - 1 2");
}

#[test]
fn rejects_bad_input() {
    assert!(parse_position("startpos moves e2e5").is_err(), "illegal move accepted");
    assert!(parse_position("startpos moves e2").is_err(), "truncated move accepted");
    assert!(parse_position("fen 8/8/8/8 w - - 0 1").is_err(), "broken fen accepted");
    assert!(parse_position("somewhere").is_err());
}

#[test]
fn go_picks_the_side_to_move_clock() {
    let go = parse_go("wtime 60000 btime 30000 winc 1000 binc 500 movestogo 20", Color::Black);
    assert_eq!(go.params.time_left, Some(Duration::from_millis(30000)));
    assert_eq!(go.params.increment, Duration::from_millis(500));
    assert_eq!(go.params.movestogo, Some(20));

    let go = parse_go("depth 7 nodes 5000", Color::White);
    assert_eq!(go.params.depth, Some(7));
    assert_eq!(go.params.max_nodes, Some(5000));
    assert!(parse_go("infinite", Color::White).params.infinite);
    assert_eq!(parse_go("perft 3", Color::White).perft, Some(3));
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

impl Captured {
    fn text(&self) -> String { String::from_utf8(self.0.lock().unwrap().clone()).unwrap() }
}

#[test]
fn protocol_session() {
    let captured = Captured::default();
    let out = Arc::new(Mutex::new(captured.clone()));
    let mut engine = UciEngine::with_output(EngineConfig::default(), out).unwrap();

    assert!(engine.handle_line("uci"));
    assert!(engine.handle_line("isready"));
    assert!(engine.handle_line("setoption name Hash value 2"));
    assert!(engine.handle_line("setoption name Threads value 2"));
    assert!(engine.handle_line("position startpos moves e2e4 e7e5"));
    assert!(engine.handle_line("go depth 4"));
    engine.wait();
    assert!(engine.handle_line("position fen 6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"));
    assert!(engine.handle_line("go depth 3"));
    engine.wait();
    assert!(engine.handle_line("go perft 2"));
    assert!(!engine.handle_line("quit"));

    let text = captured.text();
    assert!(text.contains("uciok"), "missing uciok:\n{text}");
    assert!(text.contains("readyok"));
    assert!(text.contains("info depth 4"), "missing info line:\n{text}");
    assert!(text.contains("score mate 1"), "mate not reported:\n{text}");
    assert!(text.contains("bestmove a1a8"), "wrong bestmove:\n{text}");
    assert!(text.contains("Nodes searched: "), "perft missing:\n{text}");
}

#[test]
fn stop_interrupts_infinite_search() {
    let captured = Captured::default();
    let out = Arc::new(Mutex::new(captured.clone()));
    let mut engine = UciEngine::with_output(EngineConfig::default(), out).unwrap();
    assert!(engine.handle_line("position startpos"));
    assert!(engine.handle_line("go infinite"));
    std::thread::sleep(Duration::from_millis(100));
    assert!(!captured.text().contains("bestmove"), "infinite search answered before stop");
    assert!(engine.handle_line("stop"));
    assert!(captured.text().contains("bestmove"), "no bestmove after stop");
}

#[test]
fn new_commands_end_an_infinite_search() {
    let captured = Captured::default();
    let out = Arc::new(Mutex::new(captured.clone()));
    let mut engine = UciEngine::with_output(EngineConfig::default(), out).unwrap();
    assert!(engine.handle_line("go infinite"));
    std::thread::sleep(Duration::from_millis(100));

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        engine.handle_line("position startpos moves e2e4");
        let _ = tx.send(engine);
    });
    let engine = rx.recv_timeout(Duration::from_secs(10)).expect("position command blocked behind go infinite");

    assert_eq!(engine.position().side_to_move(), Color::Black);
    assert_eq!(captured.text().matches("bestmove").count(), 1);
}
