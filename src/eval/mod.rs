pub mod mop_up;
pub mod nnue;

use crate::board::Position;
use crate::search::score::MATE_BOUND;

/// Static evaluation in centipawns from the side to move's point of view.
/// Dead-drawn material scores exactly zero; everything else stays strictly
/// inside the mate band.
pub fn evaluate(pos: &Position) -> i32 {
    if pos.is_material_draw() {
        return 0;
    }
    let raw = match mop_up::evaluate(pos) {
        Some(v) => v,
        None => nnue::network().evaluate(pos.accumulator(), pos.side_to_move()),
    };
    raw.clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
}
