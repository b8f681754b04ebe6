//! Perft: exhaustive leaf counts used to validate the move generator

use crate::position::Position;

/// Number of leaf positions `depth` plies below `pos`.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let (moves, _) = pos.legal_moves();
    // Bulk count at the frontier
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        pos.push(mv);
        nodes += perft(pos, depth - 1);
        pos.pop();
    }
    nodes
}

/// Per-root-move leaf counts, each keyed by the move in long algebraic form.
pub fn perft_divide(pos: &mut Position, depth: u8) -> Vec<(String, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let (moves, _) = pos.legal_moves();
    let mut counts: Vec<(String, u64)> = moves
        .into_iter()
        .map(|mv| {
            pos.push(mv);
            let nodes = perft(pos, depth - 1);
            pos.pop();
            (mv.to_string(), nodes)
        })
        .collect();
    counts.sort();
    counts
}
