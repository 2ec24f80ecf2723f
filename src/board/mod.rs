pub mod attacks;
pub mod bitboard;
pub mod fen;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod types;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use fen::STARTPOS_FEN;
pub use movegen::{is_legal, legal_moves};
pub use moves::{Move, MoveFlag, MoveList};
pub use position::{MoveMasks, Position};
pub use types::{Color, Piece, PieceType, Square};
