use std::fmt::Write as _;

use super::bitboard::Bitboard;
use super::movegen::legal_moves;
use super::moves::Move;
use super::position::{Position, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE};
use super::types::{Color, Piece, PieceType, Square};
use crate::error::{FenError, MoveParseError};

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const CASTLE_CHARS: [(char, u8, Square, Square); 4] = [
    ('K', WHITE_KINGSIDE, Square::E1, Square::H1),
    ('Q', WHITE_QUEENSIDE, Square::E1, Square::A1),
    ('k', BLACK_KINGSIDE, Square::E8, Square::H8),
    ('q', BLACK_QUEENSIDE, Square::E8, Square::A8),
];

impl Position {
    /// Parse a FEN string. The move counters are optional.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::MissingFields(fields.len()));
        }

        let mut pos = Position::empty();

        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != 8 {
            return Err(FenError::Placement(format!("expected 8 ranks, got {}", rows.len())));
        }
        for (i, row) in rows.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::Placement(format!("bad empty count {c:?}")));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_char(c).ok_or_else(|| FenError::Placement(format!("unknown piece {c:?}")))?;
                    if file >= 8 {
                        return Err(FenError::Placement(format!("rank {} overflows", rank + 1)));
                    }
                    pos.put_piece(piece, Square::new(file, rank));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::Placement(format!("rank {} overflows", rank + 1)));
                }
            }
            if file != 8 {
                return Err(FenError::Placement(format!("rank {} has {} files", rank + 1, file)));
            }
        }

        for color in Color::ALL {
            if pos.pieces_of(color, PieceType::King).popcount() != 1 {
                return Err(FenError::KingCount);
            }
        }
        let back_ranks = Bitboard::RANK_1 | Bitboard::RANK_8;
        if !(pos.kind_bb(PieceType::Pawn) & back_ranks).is_empty() {
            return Err(FenError::PawnOnBackRank);
        }

        match fields[1] {
            "w" => pos.set_side(Color::White),
            "b" => pos.set_side(Color::Black),
            other => return Err(FenError::SideToMove(other.to_string())),
        }

        let mut rights = 0u8;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                let &(_, right, king_sq, rook_sq) = CASTLE_CHARS
                    .iter()
                    .find(|(ch, ..)| *ch == c)
                    .ok_or_else(|| FenError::Castling(fields[2].to_string()))?;
                let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                // Rights without the king and rook at home are dropped.
                if pos.piece_at(king_sq) == Some(Piece::new(color, PieceType::King))
                    && pos.piece_at(rook_sq) == Some(Piece::new(color, PieceType::Rook))
                {
                    rights |= right;
                }
            }
        }
        pos.set_castling(rights);

        if fields[3] != "-" {
            let ep: Square = fields[3].parse().map_err(|_| FenError::EnPassant(fields[3].to_string()))?;
            let expected_rank = match pos.side_to_move() {
                Color::White => 5,
                Color::Black => 2,
            };
            if ep.rank() != expected_rank {
                return Err(FenError::EnPassant(fields[3].to_string()));
            }
            // A target with no pawn that could just have double-pushed is ignored.
            let pushed = ep.offset(-pos.side_to_move().forward());
            let mover = Piece::new(!pos.side_to_move(), PieceType::Pawn);
            if pos.piece_at(pushed) == Some(mover) && pos.piece_at(ep).is_none() {
                pos.set_ep_square(Some(ep));
            }
        }

        let halfmove = match fields.get(4) {
            Some(s) => s.parse::<u32>().map_err(|_| FenError::Counter(s.to_string()))?,
            None => 0,
        };
        let fullmove = match fields.get(5) {
            Some(s) => s.parse::<u32>().map_err(|_| FenError::Counter(s.to_string()))?,
            None => 1,
        };
        pos.set_clocks(halfmove, fullmove);

        let them = !pos.side_to_move();
        let their_king = pos.king_square(them);
        if !(pos.attackers_to(their_king, pos.occupied()) & pos.colors(pos.side_to_move())).is_empty() {
            return Err(FenError::OpponentInCheck);
        }

        pos.refresh_accumulator();
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some(p) => {
                        if empty > 0 {
                            let _ = write!(out, "{empty}");
                            empty = 0;
                        }
                        out.push(p.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                let _ = write!(out, "{empty}");
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(if self.side_to_move() == Color::White { 'w' } else { 'b' });
        out.push(' ');
        let rights = self.castling_rights();
        if rights == 0 {
            out.push('-');
        } else {
            for (c, right, ..) in CASTLE_CHARS {
                if rights & right != 0 {
                    out.push(c);
                }
            }
        }
        match self.ep_square() {
            Some(ep) => {
                let _ = write!(out, " {ep}");
            }
            None => out.push_str(" -"),
        }
        let _ = write!(out, " {} {}", self.halfmove_clock(), self.fullmove_number());
        out
    }

    /// Resolve coordinate notation (`e2e4`, `e7e8q`) against the legal moves.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveParseError> {
        let bytes = text.as_bytes();
        if !text.is_ascii() || !(4..=5).contains(&bytes.len()) {
            return Err(MoveParseError::Syntax(text.to_string()));
        }
        let from: Square = text[0..2].parse().map_err(|_| MoveParseError::Syntax(text.to_string()))?;
        let to: Square = text[2..4].parse().map_err(|_| MoveParseError::Syntax(text.to_string()))?;
        let promotion = match bytes.get(4) {
            Some(&c) => match PieceType::from_char(c as char) {
                Some(kind) if !matches!(kind, PieceType::Pawn | PieceType::King) => Some(kind),
                _ => return Err(MoveParseError::Syntax(text.to_string())),
            },
            None => None,
        };
        legal_moves(self)
            .iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
            .ok_or_else(|| MoveParseError::Illegal(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn startpos_roundtrip() {
        let pos = Position::from_fen(STARTPOS_FEN).unwrap();
        assert_eq!(pos.to_fen(), STARTPOS_FEN);
        assert_eq!(pos.key(), Position::startpos().key());
    }

    #[test]
    fn counters_are_optional() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - -").unwrap();
        assert_eq!(pos.to_fen(), "8/8/8/4k3/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn rejects_broken_fens() {
        assert!(matches!(Position::from_fen("8/8/8/8 w - -"), Err(FenError::Placement(_))));
        assert!(matches!(Position::from_fen("8/8/8/8/8/8/8/8 w - -"), Err(FenError::KingCount)));
        assert!(matches!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - -"), Err(FenError::SideToMove(_))));
        assert!(matches!(Position::from_fen("4k3/8/8/8/8/8/8/4K2R w Z -"), Err(FenError::Castling(_))));
        assert!(matches!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - e4"), Err(FenError::EnPassant(_))));
        assert!(matches!(Position::from_fen("P3k3/8/8/8/8/8/8/4K3 w - -"), Err(FenError::PawnOnBackRank)));
        assert!(matches!(Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 x"), Err(FenError::Counter(_))));
        assert!(matches!(Position::from_fen("4k2R/8/8/8/8/8/8/4K3 w - -"), Err(FenError::OpponentInCheck)));
    }

    #[test]
    fn parses_moves() {
        let pos = Position::startpos();
        let mv = pos.parse_move("g1f3").unwrap();
        assert_eq!(mv.to_string(), "g1f3");
        assert!(matches!(pos.parse_move("e2e5"), Err(MoveParseError::Illegal(_))));
        assert!(matches!(pos.parse_move("e2"), Err(MoveParseError::Syntax(_))));
        assert!(matches!(pos.parse_move("e7e8k"), Err(MoveParseError::Syntax(_))));
    }
}
