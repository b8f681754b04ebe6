//! One side's half of a position
//!
//! A `SideState` owns a colour's six piece bitboards, its castling rights,
//! the en-passant target it created with its last double push, and the XOR
//! of the Zobrist keys for all of that. Every mutator toggles exactly the
//! keys that change, so `hash` never needs recomputing.

use std::sync::Arc;

use crate::bitboard::Bitboard;
use crate::square::{Color, PieceKind, Square};
use crate::zobrist::ZobristKeys;

#[derive(Clone)]
pub struct SideState {
    color: Color,
    pieces: [Bitboard; 6],
    castle_short: bool,
    castle_long: bool,
    ep: Option<Square>,
    hash: u64,
    keys: Arc<ZobristKeys>,
}

impl SideState {
    /// A side with no pieces and no rights.
    pub fn empty(color: Color, keys: Arc<ZobristKeys>) -> Self {
        SideState {
            color,
            pieces: [Bitboard::EMPTY; 6],
            castle_short: false,
            castle_long: false,
            ep: None,
            hash: 0,
            keys,
        }
    }

    /// The standard opening setup for `color`, both castling rights held.
    pub fn starting(color: Color, keys: Arc<ZobristKeys>) -> Self {
        let mut side = SideState::empty(color, keys);
        let home = color.home_rank();
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            side.add_piece(kind, Square::new(file as u8, home));
            side.add_piece(PieceKind::Pawn, Square::new(file as u8, color.pawn_start_rank()));
        }
        side.set_castling_rights(true, true);
        side
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.pieces
            .iter()
            .fold(Bitboard::EMPTY, |acc, &bb| acc | bb)
    }

    /// Rooks and queens.
    #[inline]
    pub fn orthogonal_sliders(&self) -> Bitboard {
        self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen)
    }

    /// Bishops and queens.
    #[inline]
    pub fn diagonal_sliders(&self) -> Bitboard {
        self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen)
    }

    #[inline]
    pub fn king_square(&self) -> Option<Square> {
        self.pieces(PieceKind::King).lsb()
    }

    pub fn piece_at(&self, sq: Square) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces[kind.index()].contains(sq))
    }

    #[inline]
    pub fn castle_short(&self) -> bool {
        self.castle_short
    }

    #[inline]
    pub fn castle_long(&self) -> bool {
        self.castle_long
    }

    #[inline]
    pub fn ep(&self) -> Option<Square> {
        self.ep
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn keys(&self) -> &Arc<ZobristKeys> {
        &self.keys
    }

    // ------------------------------------------------------------------
    // Hash-maintaining mutators
    // ------------------------------------------------------------------

    /// Places a piece. Panics if the square already holds one of ours.
    pub fn add_piece(&mut self, kind: PieceKind, sq: Square) {
        assert!(
            !self.occupied().contains(sq),
            "add_piece: {sq} already occupied by {:?}",
            self.color
        );
        self.pieces[kind.index()].set(sq);
        self.hash ^= self.keys.piece(self.color, kind, sq);
    }

    /// Removes a piece. Panics if `kind` is not on `sq`.
    pub fn remove_piece(&mut self, kind: PieceKind, sq: Square) {
        assert!(
            self.pieces(kind).contains(sq),
            "remove_piece: no {kind:?} on {sq}"
        );
        self.pieces[kind.index()].clear(sq);
        self.hash ^= self.keys.piece(self.color, kind, sq);
    }

    /// Moves bits and keys only; rights are left alone.
    pub fn relocate(&mut self, kind: PieceKind, from: Square, to: Square) {
        assert!(
            !self.occupied().contains(to),
            "relocate: {to} already occupied by {:?}",
            self.color
        );
        self.pieces[kind.index()].move_bit(from, to);
        self.hash ^= self.keys.piece(self.color, kind, from) ^ self.keys.piece(self.color, kind, to);
    }

    /// Moves a piece and drops any castling right the move forfeits.
    pub fn move_piece(&mut self, kind: PieceKind, from: Square, to: Square) {
        self.relocate(kind, from, to);
        match kind {
            PieceKind::King => self.set_castling_rights(false, false),
            PieceKind::Rook => self.forfeit_rook_right(from),
            _ => {}
        }
    }

    /// Removes whatever piece stands on `sq`, returning its kind. Losing a
    /// rook from its corner also loses that side's castling right.
    pub fn capture_at(&mut self, sq: Square) -> Option<PieceKind> {
        let kind = self.piece_at(sq)?;
        self.remove_piece(kind, sq);
        if kind == PieceKind::Rook {
            self.forfeit_rook_right(sq);
        }
        Some(kind)
    }

    fn forfeit_rook_right(&mut self, corner: Square) {
        let home = self.color.home_rank();
        if corner == Square::new(7, home) && self.castle_short {
            self.set_castling_rights(false, self.castle_long);
        } else if corner == Square::new(0, home) && self.castle_long {
            self.set_castling_rights(self.castle_short, false);
        }
    }

    pub fn set_castling_rights(&mut self, short: bool, long: bool) {
        if self.castle_short != short {
            self.hash ^= self.keys.castle_short(self.color);
            self.castle_short = short;
        }
        if self.castle_long != long {
            self.hash ^= self.keys.castle_long(self.color);
            self.castle_long = long;
        }
    }

    pub fn set_ep(&mut self, ep: Option<Square>) {
        if let Some(old) = self.ep {
            self.hash ^= self.keys.ep_file(old.file());
        }
        if let Some(new) = ep {
            self.hash ^= self.keys.ep_file(new.file());
        }
        self.ep = ep;
    }

    #[inline]
    pub fn clear_ep(&mut self) {
        self.set_ep(None);
    }

    /// Recomputes the hash from scratch. Used by debug assertions and tests.
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0;
        for kind in PieceKind::ALL {
            for sq in self.pieces(kind) {
                hash ^= self.keys.piece(self.color, kind, sq);
            }
        }
        if self.castle_short {
            hash ^= self.keys.castle_short(self.color);
        }
        if self.castle_long {
            hash ^= self.keys.castle_long(self.color);
        }
        if let Some(ep) = self.ep {
            hash ^= self.keys.ep_file(ep.file());
        }
        hash
    }
}

impl PartialEq for SideState {
    /// Keys are shared infrastructure, not state. The hashes are only
    /// comparable when both sides were built from the same table.
    fn eq(&self, other: &Self) -> bool {
        let same_keys = Arc::ptr_eq(&self.keys, &other.keys) || self.keys == other.keys;
        self.color == other.color
            && self.pieces == other.pieces
            && self.castle_short == other.castle_short
            && self.castle_long == other.castle_long
            && self.ep == other.ep
            && (!same_keys || self.hash == other.hash)
    }
}

impl Eq for SideState {}

impl std::fmt::Debug for SideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideState")
            .field("color", &self.color)
            .field("pieces", &self.pieces)
            .field("castle_short", &self.castle_short)
            .field("castle_long", &self.castle_long)
            .field("ep", &self.ep)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Arc<ZobristKeys> {
        Arc::new(ZobristKeys::new(11))
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_starting_side() {
        let white = SideState::starting(Color::White, keys());
        assert_eq!(white.occupied().count(), 16);
        assert_eq!(white.king_square(), Some(Square::E1));
        assert_eq!(white.piece_at(sq("d1")), Some(PieceKind::Queen));
        assert!(white.castle_short() && white.castle_long());
        assert_eq!(white.hash(), white.compute_hash());

        let black = SideState::starting(Color::Black, keys());
        assert_eq!(black.king_square(), Some(Square::E8));
        assert_eq!(black.pieces(PieceKind::Pawn), Bitboard::rank(6));
    }

    #[test]
    fn test_king_move_drops_both_rights() {
        let mut white = SideState::starting(Color::White, keys());
        white.remove_piece(PieceKind::Pawn, sq("e2"));
        white.move_piece(PieceKind::King, Square::E1, sq("e2"));
        assert!(!white.castle_short() && !white.castle_long());
        assert_eq!(white.hash(), white.compute_hash());
    }

    #[test]
    fn test_rook_move_drops_one_right() {
        let mut black = SideState::starting(Color::Black, keys());
        black.remove_piece(PieceKind::Pawn, sq("h7"));
        black.move_piece(PieceKind::Rook, Square::H8, sq("h6"));
        assert!(!black.castle_short());
        assert!(black.castle_long());
        // Rook coming back does not restore the right
        black.move_piece(PieceKind::Rook, sq("h6"), Square::H8);
        assert!(!black.castle_short());
        assert_eq!(black.hash(), black.compute_hash());
    }

    #[test]
    fn test_corner_capture_drops_right() {
        let mut white = SideState::starting(Color::White, keys());
        assert_eq!(white.capture_at(Square::A1), Some(PieceKind::Rook));
        assert!(!white.castle_long());
        assert!(white.castle_short());
        assert_eq!(white.capture_at(sq("e4")), None);
        assert_eq!(white.hash(), white.compute_hash());
    }

    #[test]
    fn test_ep_toggles_hash() {
        let mut white = SideState::starting(Color::White, keys());
        let before = white.hash();
        white.set_ep(Some(sq("e3")));
        assert_ne!(white.hash(), before);
        white.set_ep(Some(sq("d3")));
        assert_eq!(white.hash(), white.compute_hash());
        white.clear_ep();
        assert_eq!(white.hash(), before);
    }

    #[test]
    fn test_equality_across_key_tables() {
        let a = SideState::starting(Color::White, keys());
        let b = SideState::starting(Color::White, Arc::new(ZobristKeys::new(12)));
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a, b);

        let mut c = SideState::starting(Color::White, a.keys().clone());
        assert_eq!(a, c);
        c.set_ep(Some(sq("e3")));
        assert_ne!(a, c);
    }

    #[test]
    #[should_panic]
    fn test_add_onto_own_piece_panics() {
        let mut white = SideState::starting(Color::White, keys());
        white.add_piece(PieceKind::Queen, sq("e2"));
    }
}
