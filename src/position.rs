//! Position: both sides, the move counters and the undo stack
//!
//! A position is only ever changed through [`Position::push`] and
//! [`Position::pop`] / [`Position::undo`]. The stack is strict LIFO; popping
//! out of order means the caller lost track of its own search and is
//! treated as a bug.

use std::fmt;
use std::sync::Arc;

use crate::bitboard::{Bitboard, DARK_SQUARES};
use crate::error::Result;
use crate::movegen;
use crate::moves::{Move, Undo};
use crate::side::SideState;
use crate::square::{Color, PieceKind, Square};
use crate::zobrist::ZobristKeys;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Proof of a push, redeemed by [`Position::undo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoHandle {
    depth: usize,
    hash: u64,
}

#[derive(Clone)]
pub struct Position {
    white: SideState,
    black: SideState,
    side_to_move: Color,
    halfmove: u32,
    fullmove: u32,
    stack: Vec<(Move, Undo)>,
    /// Hash of every position along the current line, the current one last.
    history: Vec<u64>,
    keys: Arc<ZobristKeys>,
}

impl Position {
    /// Standard starting position with the default key table.
    pub fn starting() -> Self {
        Position::starting_with_keys(Arc::new(ZobristKeys::default()))
    }

    pub fn starting_with_keys(keys: Arc<ZobristKeys>) -> Self {
        Position::from_parts(
            SideState::starting(Color::White, keys.clone()),
            SideState::starting(Color::Black, keys.clone()),
            Color::White,
            0,
            1,
            keys,
        )
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        Position::from_fen_with_keys(fen, Arc::new(ZobristKeys::default()))
    }

    pub fn from_fen_with_keys(fen: &str, keys: Arc<ZobristKeys>) -> Result<Self> {
        crate::fen::parse(fen, keys)
    }

    pub fn to_fen(&self) -> String {
        crate::fen::serialize(self)
    }

    /// Assembles a position from already-validated parts.
    pub(crate) fn from_parts(
        white: SideState,
        black: SideState,
        side_to_move: Color,
        halfmove: u32,
        fullmove: u32,
        keys: Arc<ZobristKeys>,
    ) -> Self {
        assert!(
            (white.occupied() & black.occupied()).is_empty(),
            "both sides claim the same square"
        );
        let mut pos = Position {
            white,
            black,
            side_to_move,
            halfmove,
            fullmove,
            stack: Vec::new(),
            history: Vec::new(),
            keys,
        };
        let hash = pos.hash();
        pos.history.push(hash);
        pos
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove
    }

    #[inline]
    pub fn side(&self, color: Color) -> &SideState {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// The side to move.
    #[inline]
    pub fn own(&self) -> &SideState {
        self.side(self.side_to_move)
    }

    /// The side that just moved.
    #[inline]
    pub fn enemy(&self) -> &SideState {
        self.side(!self.side_to_move)
    }

    fn sides_mut(&mut self) -> (&mut SideState, &mut SideState) {
        match self.side_to_move {
            Color::White => (&mut self.white, &mut self.black),
            Color::Black => (&mut self.black, &mut self.white),
        }
    }

    pub fn keys(&self) -> &Arc<ZobristKeys> {
        &self.keys
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.white.occupied() | self.black.occupied()
    }

    pub fn piece_at(&self, sq: Square) -> Option<(PieceKind, Color)> {
        Color::BOTH
            .into_iter()
            .find_map(|color| self.side(color).piece_at(sq).map(|kind| (kind, color)))
    }

    /// Position hash: both sides' running keys plus the side-to-move key.
    #[inline]
    pub fn hash(&self) -> u64 {
        let hash = self.white.hash() ^ self.black.hash();
        match self.side_to_move {
            Color::White => hash,
            Color::Black => hash ^ self.keys.black_to_move(),
        }
    }

    /// Moves pushed since construction, oldest first.
    pub fn moves(&self) -> impl Iterator<Item = &Move> + '_ {
        self.stack.iter().map(|(mv, _)| mv)
    }

    pub fn ply(&self) -> usize {
        self.stack.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.stack.last().map(|(mv, _)| *mv)
    }

    // ------------------------------------------------------------------
    // Move generation queries
    // ------------------------------------------------------------------

    pub fn legal_moves(&self) -> (Vec<Move>, bool) {
        movegen::legal_moves(self.own(), self.enemy())
    }

    pub fn in_check(&self) -> bool {
        movegen::in_check(self.own(), self.enemy())
    }

    pub fn is_checkmate(&self) -> bool {
        let (moves, in_check) = self.legal_moves();
        moves.is_empty() && in_check
    }

    pub fn is_stalemate(&self) -> bool {
        let (moves, in_check) = self.legal_moves();
        moves.is_empty() && !in_check
    }

    // ------------------------------------------------------------------
    // Push / pop
    // ------------------------------------------------------------------

    /// Plays `mv`, which must be one of [`Position::legal_moves`].
    pub fn push(&mut self, mv: Move) -> UndoHandle {
        let prior_hash = self.hash();
        let halfmove = self.halfmove;
        let (own, enemy) = self.sides_mut();
        let undo = mv.apply(own, enemy, halfmove);

        self.halfmove = if mv.piece() == PieceKind::Pawn || undo.captured().is_some() {
            0
        } else {
            self.halfmove + 1
        };
        self.side_to_move = !self.side_to_move;
        if self.side_to_move == Color::White {
            self.fullmove += 1;
        }
        self.stack.push((mv, undo));
        let hash = self.hash();
        self.history.push(hash);

        UndoHandle {
            depth: self.stack.len(),
            hash: prior_hash,
        }
    }

    /// Takes back the most recent move, if any.
    pub fn pop(&mut self) -> Option<Move> {
        let (mv, undo) = self.stack.pop()?;

        self.history.pop();

        if self.side_to_move == Color::White {
            self.fullmove -= 1;
        }
        self.side_to_move = !self.side_to_move;
        let (own, enemy) = self.sides_mut();
        mv.undo(own, enemy, &undo);
        self.halfmove = undo.halfmove();
        Some(mv)
    }

    /// Takes back the move that produced `handle`.
    ///
    /// Panics unless `handle` belongs to the top of the stack, and if the
    /// restored hash differs from the one recorded at push time.
    pub fn undo(&mut self, handle: UndoHandle) -> Move {
        assert_eq!(
            handle.depth,
            self.stack.len(),
            "undo out of order: handle for ply {} but stack has {}",
            handle.depth,
            self.stack.len()
        );
        let mv = match self.pop() {
            Some(mv) => mv,
            None => panic!("undo on an empty stack"),
        };
        assert_eq!(self.hash(), handle.hash, "undo of {mv} did not restore the hash");
        mv
    }

    // ------------------------------------------------------------------
    // Draw rules
    // ------------------------------------------------------------------

    /// How often the current position has occurred along this line.
    ///
    /// Only positions since the last capture or pawn move can repeat, and
    /// only every second ply has the same side to move.
    pub fn repetition_count(&self) -> u32 {
        let hash = self.hash();
        let reversible = self.halfmove as usize + 1;
        self.history
            .iter()
            .rev()
            .take(reversible)
            .step_by(2)
            .filter(|&&h| h == hash)
            .count() as u32
    }

    pub fn is_draw_by_threefold_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.halfmove >= 100
    }

    /// Neither side can mate: bare kings, a lone minor piece, or one bishop
    /// each on the same colour squares.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = [PieceKind::Pawn, PieceKind::Rook, PieceKind::Queen];
        if Color::BOTH
            .into_iter()
            .any(|c| heavy.iter().any(|&k| self.side(c).pieces(k).any()))
        {
            return false;
        }
        let knights = self.white.pieces(PieceKind::Knight) | self.black.pieces(PieceKind::Knight);
        let bishops = self.white.pieces(PieceKind::Bishop) | self.black.pieces(PieceKind::Bishop);
        let minors = (knights | bishops).count();
        if minors <= 1 {
            return true;
        }
        minors == 2
            && knights.is_empty()
            && self.white.pieces(PieceKind::Bishop).is_single()
            && ((bishops & DARK_SQUARES).is_empty() || (bishops & !DARK_SQUARES).is_empty())
    }

    pub fn is_draw(&self) -> bool {
        self.is_draw_by_threefold_repetition()
            || self.is_draw_by_fifty_moves()
            || self.is_insufficient_material()
            || self.is_stalemate()
    }

    // ------------------------------------------------------------------
    // Pawn structure
    // ------------------------------------------------------------------

    /// Pawns of `color` with no enemy pawn ahead on their own or adjacent
    /// files.
    pub fn passed_pawns(&self, color: Color) -> Bitboard {
        let enemy_pawns = self.side(!color).pieces(PieceKind::Pawn);
        self.side(color)
            .pieces(PieceKind::Pawn)
            .iter()
            .filter(|&sq| {
                let file = sq.file();
                let mut files = Bitboard::file(file);
                if file > 0 {
                    files |= Bitboard::file(file - 1);
                }
                if file < 7 {
                    files |= Bitboard::file(file + 1);
                }
                (enemy_pawns & files & Bitboard::ahead_of_rank(color, sq.rank())).is_empty()
            })
            .collect()
    }
}

/// Two positions are equal when their placement, rights, en-passant state,
/// side to move and counters match. History is not compared.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.white == other.white
            && self.black == other.black
            && self.side_to_move == other.side_to_move
            && self.halfmove == other.halfmove
            && self.fullmove == other.fullmove
    }
}

impl Eq for Position {}

impl Default for Position {
    fn default() -> Self {
        Position::starting()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some((kind, color)) => write!(f, "{} ", kind.fen_char(color))?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")?;
        write!(f, "{}", self.to_fen())
    }
}
