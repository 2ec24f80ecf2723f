// Bitboard chess engine: move generation, incremental evaluation, lazy SMP search, UCI front end.
pub mod board;
pub mod config;
pub mod error;
pub mod eval;
pub mod perft;
pub mod search;
pub mod uci;
