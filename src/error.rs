//! Error types for position import, move parsing and network installation.

/// Errors produced while parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("FEN must have at least 4 fields, got {0}")]
    MissingFields(usize),

    #[error("invalid piece placement: {0}")]
    Placement(String),

    #[error("invalid side to move: {0:?}")]
    SideToMove(String),

    #[error("invalid castling field: {0:?}")]
    Castling(String),

    #[error("invalid en passant square: {0:?}")]
    EnPassant(String),

    #[error("invalid move counter: {0:?}")]
    Counter(String),

    #[error("each side needs exactly one king")]
    KingCount,

    #[error("pawn on first or last rank")]
    PawnOnBackRank,

    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// Errors produced when a textual move does not name a legal move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    #[error("malformed move text: {0:?}")]
    Syntax(String),

    #[error("illegal move in this position: {0}")]
    Illegal(String),
}

/// Errors related to the evaluation network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("an evaluation network is already installed")]
    AlreadyInstalled,

    #[error("bad network magic")]
    BadMagic,

    #[error("network hidden size {found} does not match engine size {expected}")]
    HiddenSize { expected: usize, found: usize },

    #[error("network output scale must be non-zero")]
    ZeroScale,

    #[error("network io: {0}")]
    Io(#[from] std::io::Error),
}
