//! Main search engine implementation
//!
//! Iterative deepening over a negamax alpha-beta search, with a transposition
//! table and a quiescence extension along forcing moves. The search plays
//! moves in place on the caller's [`Position`] and always leaves it exactly
//! as it found it.

use std::cmp::Reverse;

use super::params::SearchParams;
use super::stats::SearchStats;
use super::tt::{score_from_tt, score_to_tt, NodeType, TranspositionTable};
use crate::eval;
use crate::moves::Move;
use crate::position::Position;

/// Larger than any reachable score
pub const INFINITE: i32 = 1_000_000;
/// Score of delivering mate at the root; mate `n` plies away scores `MATE - n`
pub const MATE: i32 = 100_000;
/// Scores at or above this (in absolute value) are mate scores
pub const MATE_THRESHOLD: i32 = MATE - 1_000;

// Ordering bands. Each band outranks everything below it.
const ORDER_CHECK: i32 = 4_000_000;
const ORDER_CAPTURE: i32 = 2_000_000;
const ORDER_PROMOTION: i32 = 1_000_000;

/// Outcome of a completed search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// Centipawns for the side to move, or a `MATE`-relative score
    pub score: i32,
    /// Expected line starting with `best_move`
    pub principal_variation: Vec<Move>,
    pub nodes: u64,
    /// Deepest iteration completed
    pub depth: u8,
}

impl SearchResult {
    /// Plies to mate when the score is a forced mate for either side.
    pub fn mate_in_plies(&self) -> Option<i32> {
        if self.score >= MATE_THRESHOLD {
            Some(MATE - self.score)
        } else if self.score <= -MATE_THRESHOLD {
            Some(-(MATE + self.score))
        } else {
            None
        }
    }
}

/// Main search engine
pub struct Search {
    /// Transposition table for caching
    tt: TranspositionTable,

    /// Search parameters
    params: SearchParams,

    /// Search statistics
    stats: SearchStats,

    /// Triangular principal-variation table, one line per ply
    pv: Vec<Vec<Move>>,
}

impl Search {
    pub fn new(params: SearchParams) -> Self {
        Self {
            tt: TranspositionTable::new(params.tt_size_mb),
            params,
            stats: SearchStats::new(),
            pv: Vec::new(),
        }
    }

    /// Default parameters with the given depth
    pub fn with_depth(depth: u8) -> Self {
        Self::new(SearchParams::new().max_depth(depth))
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Forget everything learned in earlier searches
    pub fn clear(&mut self) {
        self.tt.clear();
    }

    /// Best move for the side to move in `pos`.
    ///
    /// Panics if `pos` has no legal moves; use [`Search::try_best_move`] when
    /// that is possible.
    pub fn best_move(&mut self, pos: &mut Position) -> SearchResult {
        match self.try_best_move(pos) {
            Some(result) => result,
            None => panic!("best move requested for a position with no legal moves: {}", pos.to_fen()),
        }
    }

    /// Best move for the side to move, or `None` on checkmate or stalemate.
    pub fn try_best_move(&mut self, pos: &mut Position) -> Option<SearchResult> {
        let (root_moves, _) = pos.legal_moves();
        if root_moves.is_empty() {
            return None;
        }

        let max_depth = self.params.max_depth.max(1);
        let first_depth = if self.params.iterative_deepening { 1 } else { max_depth };
        let max_ply = max_depth as usize + self.params.qsearch_depth as usize + 2;

        self.stats.reset();
        self.stats.start_timing();
        self.tt.new_search();
        self.pv = vec![Vec::new(); max_ply];

        let mut best: Option<(Vec<Move>, i32, u8)> = None;

        for depth in first_depth..=max_depth {
            let previous = best.as_ref().map(|(line, _, _)| line[0]);
            let score = self.root(pos, &root_moves, depth, previous);
            let line = self.pv[0].clone();
            log::debug!(
                "depth {} score {} nodes {} pv {}",
                depth,
                score,
                self.stats.nodes,
                line.iter().map(Move::to_string).collect::<Vec<_>>().join(" ")
            );
            best = Some((line, score, depth));

            // A mate within the full-width horizon cannot be beaten by a deeper search
            if score >= MATE_THRESHOLD && MATE - score <= depth as i32 {
                break;
            }
        }

        self.stats.update_timing();
        log::info!("search finished: {}", self.stats.summary());
        if self.params.use_tt && log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "transposition table {:.1}% of {} entries in use",
                self.tt.fill_percentage(),
                self.tt.size()
            );
        }

        let (principal_variation, score, depth) = best?;
        Some(SearchResult {
            best_move: principal_variation[0],
            score,
            principal_variation,
            nodes: self.stats.nodes,
            depth,
        })
    }

    /// One full-window iteration at the root. Leaves the line in `pv[0]`.
    fn root(&mut self, pos: &mut Position, root_moves: &[Move], depth: u8, previous: Option<Move>) -> i32 {
        self.stats.inc_node();
        self.pv[0].clear();

        let mut moves = root_moves.to_vec();
        let hint = previous.or_else(|| self.tt_move(pos.hash()));
        self.order_moves(pos, &mut moves, hint);

        let mut alpha = -INFINITE;
        let beta = INFINITE;
        let mut best_move = moves[0];

        for mv in moves {
            pos.push(mv);
            let score = -self.negamax(pos, depth - 1, -beta, -alpha, 1);
            pos.pop();

            if score > alpha {
                alpha = score;
                best_move = mv;
                self.update_pv(0, mv);
            }
        }

        // Every root move failing at -INFINITE is impossible, but keep the line non-empty
        if self.pv[0].is_empty() {
            self.pv[0].push(best_move);
        }
        if self.params.use_tt {
            self.tt.store(pos.hash(), alpha, depth, NodeType::Exact, Some(best_move));
        }
        alpha
    }

    /// Alpha-beta search (fail-soft)
    fn negamax(&mut self, pos: &mut Position, depth: u8, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.pv[ply].clear();

        if pos.is_draw_by_threefold_repetition() || pos.is_draw_by_fifty_moves() {
            self.stats.inc_node();
            return 0;
        }

        if depth == 0 {
            return self.quiescence(pos, alpha, beta, ply, self.params.qsearch_depth);
        }
        self.stats.inc_node();

        let key = pos.hash();
        let mut tt_move = None;
        if self.params.use_tt {
            if let Some(entry) = self.tt.probe(key) {
                self.stats.inc_tt_hit();
                tt_move = entry.best_move;
                if entry.depth >= depth {
                    let score = score_from_tt(entry.score, ply);
                    let usable = match entry.node_type {
                        NodeType::Exact => true,
                        NodeType::LowerBound => score >= beta,
                        NodeType::UpperBound => score <= alpha,
                    };
                    if usable {
                        self.stats.inc_tt_cutoff();
                        return score;
                    }
                }
            }
        }

        let (mut moves, in_check) = pos.legal_moves();
        if moves.is_empty() {
            return if in_check { -(MATE - ply as i32) } else { 0 };
        }
        self.order_moves(pos, &mut moves, tt_move);

        let alpha_orig = alpha;
        let mut best = -INFINITE;
        let mut best_move = None;

        for mv in moves {
            pos.push(mv);
            let score = -self.negamax(pos, depth - 1, -beta, -alpha, ply + 1);
            pos.pop();

            if score > best {
                best = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                    self.update_pv(ply, mv);
                    if alpha >= beta {
                        self.stats.inc_cutoff();
                        break;
                    }
                }
            }
        }

        if self.params.use_tt {
            let node_type = if best <= alpha_orig {
                NodeType::UpperBound
            } else if best >= beta {
                NodeType::LowerBound
            } else {
                NodeType::Exact
            };
            self.tt.store(key, score_to_tt(best, ply), depth, node_type, best_move);
        }

        best
    }

    /// Expands forcing moves past the horizon, or every evasion when in
    /// check, for at most `depth_left` more plies.
    fn quiescence(&mut self, pos: &mut Position, mut alpha: i32, beta: i32, ply: usize, depth_left: u8) -> i32 {
        self.stats.inc_qsearch_node();
        self.pv[ply].clear();

        if pos.is_draw_by_threefold_repetition() || pos.is_draw_by_fifty_moves() {
            return 0;
        }

        let (moves, in_check) = pos.legal_moves();
        if moves.is_empty() {
            return if in_check { -(MATE - ply as i32) } else { 0 };
        }

        let stand_pat = eval::evaluate(pos);
        if depth_left == 0 {
            return stand_pat;
        }

        let mut best = -INFINITE;
        if !in_check {
            if stand_pat >= beta {
                return stand_pat;
            }
            best = stand_pat;
            alpha = alpha.max(stand_pat);
        }

        let mut moves: Vec<Move> = if in_check {
            moves
        } else {
            moves.into_iter().filter(Move::is_forcing).collect()
        };
        self.order_moves(pos, &mut moves, None);

        for mv in moves {
            pos.push(mv);
            let score = -self.quiescence(pos, -beta, -alpha, ply + 1, depth_left - 1);
            pos.pop();

            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        self.stats.inc_cutoff();
                        break;
                    }
                }
            }
        }

        best
    }

    fn tt_move(&self, key: u64) -> Option<Move> {
        if !self.params.use_tt {
            return None;
        }
        self.tt.probe(key).and_then(|entry| entry.best_move)
    }

    /// Hint move first, then checks, then captures by cheapest attacker,
    /// then promotions, then the positional nudge.
    fn order_moves(&self, pos: &Position, moves: &mut [Move], hint: Option<Move>) {
        let mover = pos.side_to_move();
        let fullmove = pos.fullmove_number();
        moves.sort_by_cached_key(|mv| {
            if Some(*mv) == hint {
                return Reverse(i32::MAX);
            }
            let mut key = mv.positional_nudge(mover, fullmove);
            if mv.is_check() {
                key += ORDER_CHECK;
            }
            if mv.is_capture() {
                key += ORDER_CAPTURE - mv.piece().value();
            }
            if let Some(kind) = mv.promotion() {
                key += ORDER_PROMOTION + kind.value();
            }
            Reverse(key)
        });
    }

    /// `pv[ply]` becomes `mv` followed by the child's line.
    fn update_pv(&mut self, ply: usize, mv: Move) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        if let Some(child) = tail.first() {
            line.extend_from_slice(child);
        }
    }
}

/// Searches a private copy of `pos` to `depth` plies.
///
/// Panics if `pos` has no legal moves.
pub fn best_move(pos: &Position, depth: u8) -> Move {
    let mut scratch = pos.clone();
    Search::with_depth(depth).best_move(&mut scratch).best_move
}

/// Like [`best_move`], returning `None` on checkmate or stalemate.
pub fn try_best_move(pos: &Position, depth: u8) -> Option<Move> {
    let mut scratch = pos.clone();
    Search::with_depth(depth)
        .try_best_move(&mut scratch)
        .map(|result| result.best_move)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(fen: &str, depth: u8) -> Option<SearchResult> {
        let mut pos = Position::from_fen(fen).unwrap();
        let before = pos.clone();
        let result = Search::with_depth(depth).try_best_move(&mut pos);
        assert_eq!(pos, before, "search must restore the position");
        result
    }

    #[test]
    fn test_search_creation() {
        let search = Search::new(SearchParams::new().max_depth(6));
        assert_eq!(search.params().max_depth, 6);
        assert_eq!(search.stats().nodes, 0);
    }

    #[test]
    fn test_terminal_positions_have_no_best_move() {
        // Fool's mate
        assert!(search("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", 3).is_none());
        // Stalemate
        assert!(search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3).is_none());
    }

    #[test]
    #[should_panic(expected = "no legal moves")]
    fn test_best_move_panics_when_terminal() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        best_move(&pos, 2);
    }

    #[test]
    fn test_mate_in_one_scores_as_mate() {
        let result = search("r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4", 2).unwrap();
        assert_eq!(result.best_move.to_string(), "h5f7");
        assert_eq!(result.score, MATE - 1);
        assert_eq!(result.mate_in_plies(), Some(1));
    }

    #[test]
    fn test_takes_free_queen() {
        let result = search("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", 2).unwrap();
        assert_eq!(result.best_move.to_string(), "d1d5");
        assert!(result.score > 400);
    }

    #[test]
    fn test_quiescence_sees_recapture() {
        // Rxd5 loses the rook to exd5 a ply past the nominal horizon
        let result = search("4k3/8/4p3/3q4/8/8/3R4/3RK3 w - - 0 1", 1).unwrap();
        assert_eq!(result.best_move.to_string(), "d2d5");
        let guarded = search("4k3/8/4p3/3n4/8/8/8/3RK3 w - - 0 1", 1).unwrap();
        assert_ne!(guarded.best_move.to_string(), "d1d5");
    }

    #[test]
    fn test_pv_starts_with_best_move() {
        let result = search("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3", 3).unwrap();
        assert_eq!(result.principal_variation[0], result.best_move);
        assert!(result.nodes > 0);
        assert_eq!(result.depth, 3);
    }

    #[test]
    fn test_same_answer_without_tt() {
        let fen = "4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        let with_tt = Search::new(SearchParams::new().max_depth(3)).best_move(&mut pos);
        let without = Search::new(SearchParams::new().max_depth(3).use_tt(false)).best_move(&mut pos);
        assert_eq!(with_tt.best_move, without.best_move);
    }

    #[test]
    fn test_captures_ordered_by_cheapest_attacker() {
        // Pawn and queen can both take the knight on d5
        let pos = Position::from_fen("4k3/8/8/3n4/4P3/8/3Q4/4K3 w - - 0 1").unwrap();
        let (mut moves, _) = pos.legal_moves();
        Search::with_depth(1).order_moves(&pos, &mut moves, None);
        assert_eq!(moves[0].to_string(), "e4d5");
        assert_eq!(moves[1].to_string(), "d2d5");
    }

    #[test]
    fn test_hint_move_goes_first() {
        let pos = Position::starting();
        let (mut moves, _) = pos.legal_moves();
        let hint = pos.parse_uci("a2a3").unwrap();
        Search::with_depth(1).order_moves(&pos, &mut moves, Some(hint));
        assert_eq!(moves[0], hint);
    }
}
