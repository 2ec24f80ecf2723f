use crate::board::attacks::{bishop_attacks, rook_attacks};
use crate::board::{Bitboard, Move, MoveFlag, PieceType, Position, Square};

/// Static exchange evaluation: material balance for the side to move after
/// the best sequence of recaptures on `mv`'s destination, each side free to
/// stop when continuing would lose more.
pub fn see(pos: &Position, mv: Move) -> i32 {
    let from = mv.from();
    let to = mv.to();
    let mut gain = [0i32; 32];

    let first_victim = match mv.flag() {
        MoveFlag::EnPassant => PieceType::Pawn.value(),
        _ => pos.piece_at(to).map_or(0, |p| p.kind().value()),
    };
    gain[0] = first_victim;
    // Value of the piece that now stands on the target.
    let mut on_target = match mv.promotion() {
        Some(kind) => {
            gain[0] += kind.value() - PieceType::Pawn.value();
            kind.value()
        }
        None => mv.piece().kind().value(),
    };

    let mut occupied = pos.occupied().without(from);
    if mv.flag() == MoveFlag::EnPassant {
        occupied = occupied.without(to.offset(-pos.side_to_move().forward()));
    }
    let diagonal = pos.kind_bb(PieceType::Bishop) | pos.kind_bb(PieceType::Queen);
    let straight = pos.kind_bb(PieceType::Rook) | pos.kind_bb(PieceType::Queen);

    let mut attackers = pos.attackers_to(to, occupied) & occupied;
    let mut side = !pos.side_to_move();
    let mut depth = 0usize;

    loop {
        let ours = attackers & pos.colors(side);
        if ours.is_empty() {
            break;
        }
        let Some((kind, sq)) = least_valuable(pos, ours) else { break };

        if depth + 1 >= gain.len() {
            break;
        }
        depth += 1;
        // Balance for the capturing side if this capture goes unanswered.
        gain[depth] = on_target - gain[depth - 1];

        occupied = occupied.without(sq);
        on_target = kind.value();
        // Still ahead even if this capturer is lost: the rest cannot change the sign.
        if gain[depth] - on_target > 0 {
            break;
        }
        // Lifting a piece can reveal a slider behind it.
        if matches!(kind, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
            attackers |= bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(kind, PieceType::Rook | PieceType::Queen) {
            attackers |= rook_attacks(to, occupied) & straight;
        }
        attackers &= occupied;
        side = !side;
    }

    while depth > 0 {
        gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
        depth -= 1;
    }
    gain[0]
}

fn least_valuable(pos: &Position, candidates: Bitboard) -> Option<(PieceType, Square)> {
    PieceType::ALL.into_iter().find_map(|kind| {
        let set = candidates & pos.kind_bb(kind);
        (!set.is_empty()).then(|| (kind, set.lsb()))
    })
}
