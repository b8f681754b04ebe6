//! Static evaluation: material plus a passed-pawn term
//!
//! Scores are in centipawns from the point of view of the side to move,
//! which is what negamax expects at the leaves.

use crate::position::Position;
use crate::square::{Color, PieceKind};

// ============================================================================
// WEIGHTS (centipawns)
// ============================================================================

/// Flat bonus for any passed pawn.
const PASSED_PAWN_BASE: i32 = 10;

/// Extra bonus per rank advanced past the pawn's starting rank.
const PASSED_PAWN_PER_RANK: i32 = 5;

/// Kinds that count towards material. The king is never traded, so counting
/// it would only add the same constant to both sides.
const MATERIAL_KINDS: [PieceKind; 5] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

/// Material of one side, king excluded.
pub fn material(pos: &Position, color: Color) -> i32 {
    let side = pos.side(color);
    MATERIAL_KINDS
        .iter()
        .map(|&kind| side.pieces(kind).count() as i32 * kind.value())
        .sum()
}

fn passed_pawn_bonus(pos: &Position, color: Color) -> i32 {
    pos.passed_pawns(color)
        .iter()
        .map(|sq| {
            let advanced = match color {
                Color::White => sq.rank() as i32 - 1,
                Color::Black => 6 - sq.rank() as i32,
            };
            PASSED_PAWN_BASE + PASSED_PAWN_PER_RANK * advanced
        })
        .sum()
}

/// Score of `color` minus score of its opponent.
fn score_for(pos: &Position, color: Color) -> i32 {
    let mine = material(pos, color) + passed_pawn_bonus(pos, color);
    let theirs = material(pos, !color) + passed_pawn_bonus(pos, !color);
    mine - theirs
}

/// Static score of `pos` for the side to move.
pub fn evaluate(pos: &Position) -> i32 {
    score_for(pos, pos.side_to_move())
}
