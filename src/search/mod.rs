pub mod alphabeta;
pub mod history;
pub mod movepick;
pub mod score;
pub mod see;
pub mod stack;
pub mod tables;
pub mod threads;
pub mod time;
pub mod tt;

pub use alphabeta::{SearchInfo, SearchParams, SearchResult, ThreadData};
pub use score::{Score, CHECKMATE, MATE_BOUND, MAX_DEPTH, MAX_PLY};
pub use threads::Searcher;
pub use time::TimeManager;
pub use tt::{Bound, Tt};
