// Bitboard set type, static masks and pawn shift helpers

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};
use std::sync::OnceLock;

use crate::square::{Color, Square};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(pub u64);

// File masks (A is column 0, H column 7)
pub const FILE_A: Bitboard = Bitboard(0x0101010101010101);
pub const FILE_H: Bitboard = Bitboard(0x8080808080808080);
pub const NOT_FILE_A: Bitboard = Bitboard(!FILE_A.0);
pub const NOT_FILE_H: Bitboard = Bitboard(!FILE_H.0);

// Rank masks (A1 is square 0)
pub const RANK_1: Bitboard = Bitboard(0x00000000000000FF);
pub const RANK_8: Bitboard = Bitboard(0xFF00000000000000);

pub const DARK_SQUARES: Bitboard = Bitboard(0xAA55AA55AA55AA55);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const FULL: Bitboard = Bitboard(!0);

    #[inline]
    pub const fn from_square(sq: Square) -> Bitboard {
        Bitboard(1u64 << sq.index())
    }

    #[inline]
    pub const fn file(file: u8) -> Bitboard {
        Bitboard(FILE_A.0 << file)
    }

    #[inline]
    pub const fn rank(rank: u8) -> Bitboard {
        Bitboard(RANK_1.0 << (rank * 8))
    }

    /// Every square strictly ahead of `rank` from `color`'s point of view.
    pub const fn ahead_of_rank(color: Color, rank: u8) -> Bitboard {
        match color {
            Color::White if rank >= 7 => Bitboard::EMPTY,
            Color::White => Bitboard(!0u64 << ((rank + 1) * 8)),
            Color::Black if rank == 0 => Bitboard::EMPTY,
            Color::Black => Bitboard(!0u64 >> ((8 - rank) * 8)),
        }
    }

    /// Rectangle spanned by two squares, both corners included.
    pub const fn bounding_box(a: Square, b: Square) -> Bitboard {
        let (r_lo, r_hi) = min_max(a.rank(), b.rank());
        let (f_lo, f_hi) = min_max(a.file(), b.file());
        let rows = (!0u64 << (r_lo * 8)) & (!0u64 >> ((7 - r_hi) * 8));
        let cols = ((0xFFu8 << f_lo) & (0xFFu8 >> (7 - f_hi))) as u64 * FILE_A.0;
        Bitboard(rows & cols)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// True when exactly one square is set.
    #[inline]
    pub const fn is_single(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    #[inline]
    pub const fn more_than_one(self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    #[inline]
    pub fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::from_index(self.0.trailing_zeros() as u8))
        }
    }

    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        self.0 & (1u64 << sq.index()) != 0
    }

    #[inline]
    pub fn set(&mut self, sq: Square) {
        self.0 |= 1u64 << sq.index();
    }

    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.0 &= !(1u64 << sq.index());
    }

    #[inline]
    pub const fn with(self, sq: Square) -> Bitboard {
        Bitboard(self.0 | (1u64 << sq.index()))
    }

    #[inline]
    pub const fn without(self, sq: Square) -> Bitboard {
        Bitboard(self.0 & !(1u64 << sq.index()))
    }

    /// Moves a single bit. Panics if `from` is empty or `to` already set,
    /// both of which mean the caller's board bookkeeping is broken.
    #[inline]
    pub fn move_bit(&mut self, from: Square, to: Square) {
        assert!(self.contains(from), "move_bit: {from} is not set");
        assert!(!self.contains(to), "move_bit: {to} is already set");
        self.0 ^= (1u64 << from.index()) | (1u64 << to.index());
    }

    #[inline]
    pub fn iter(self) -> BitIter {
        BitIter(self.0)
    }

    // ------------------------------------------------------------------
    // Pawn shifts. The wrap-around file is masked off before shifting.
    // ------------------------------------------------------------------

    #[inline]
    pub const fn pawn_push(self, color: Color) -> Bitboard {
        match color {
            Color::White => Bitboard(self.0 << 8),
            Color::Black => Bitboard(self.0 >> 8),
        }
    }

    /// Captures toward the A file.
    #[inline]
    pub const fn pawn_capture_west(self, color: Color) -> Bitboard {
        let bb = self.0 & NOT_FILE_A.0;
        match color {
            Color::White => Bitboard(bb << 7),
            Color::Black => Bitboard(bb >> 9),
        }
    }

    /// Captures toward the H file.
    #[inline]
    pub const fn pawn_capture_east(self, color: Color) -> Bitboard {
        let bb = self.0 & NOT_FILE_H.0;
        match color {
            Color::White => Bitboard(bb << 9),
            Color::Black => Bitboard(bb >> 7),
        }
    }

    #[inline]
    pub const fn pawn_attacks(self, color: Color) -> Bitboard {
        Bitboard(self.pawn_capture_west(color).0 | self.pawn_capture_east(color).0)
    }
}

const fn min_max(a: u8, b: u8) -> (u8, u8) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct BitIter(u64);

impl Iterator for BitIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let sq = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(Square::from_index(sq))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitIter;

    #[inline]
    fn into_iter(self) -> BitIter {
        self.iter()
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Bitboard::EMPTY, |bb, sq| bb.with(sq))
    }
}

impl From<Square> for Bitboard {
    #[inline]
    fn from(sq: Square) -> Bitboard {
        Bitboard::from_square(sq)
    }
}

macro_rules! impl_bit_op {
    ($trait:ident, $method:ident, $assign:ident, $assign_method:ident, $op:tt) => {
        impl $trait for Bitboard {
            type Output = Bitboard;
            #[inline]
            fn $method(self, rhs: Bitboard) -> Bitboard {
                Bitboard(self.0 $op rhs.0)
            }
        }

        impl $assign for Bitboard {
            #[inline]
            fn $assign_method(&mut self, rhs: Bitboard) {
                self.0 = self.0 $op rhs.0;
            }
        }
    };
}

impl_bit_op!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
impl_bit_op!(BitOr, bitor, BitOrAssign, bitor_assign, |);
impl_bit_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

impl Not for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn not(self) -> Bitboard {
        Bitboard(!self.0)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitboard({:#018x})", self.0)
    }
}

/// Board diagram, rank 8 at the top.
impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = if self.contains(Square::new(file, rank)) { 'x' } else { '.' };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// LEAPER AND RAY TABLES
// ============================================================================

struct LeaperTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    rook_rays: [Bitboard; 64],
    bishop_rays: [Bitboard; 64],
}

static LEAPER_TABLES: OnceLock<LeaperTables> = OnceLock::new();

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn offset_mask(sq: Square, offsets: &[(i8, i8)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(df, dr) in offsets {
        let file = sq.file() as i8 + df;
        let rank = sq.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            mask.set(Square::new(file as u8, rank as u8));
        }
    }
    mask
}

/// Full empty-board rays, walked until the edge.
fn ray_mask(sq: Square, directions: &[(i8, i8)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(df, dr) in directions {
        let mut file = sq.file() as i8 + df;
        let mut rank = sq.rank() as i8 + dr;
        while (0..8).contains(&file) && (0..8).contains(&rank) {
            mask.set(Square::new(file as u8, rank as u8));
            file += df;
            rank += dr;
        }
    }
    mask
}

pub(crate) const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
pub(crate) const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

fn init_leaper_tables() -> LeaperTables {
    let mut tables = LeaperTables {
        knight: [Bitboard::EMPTY; 64],
        king: [Bitboard::EMPTY; 64],
        rook_rays: [Bitboard::EMPTY; 64],
        bishop_rays: [Bitboard::EMPTY; 64],
    };
    for sq in Square::all() {
        tables.knight[sq.index()] = offset_mask(sq, &KNIGHT_OFFSETS);
        tables.king[sq.index()] = offset_mask(sq, &KING_OFFSETS);
        tables.rook_rays[sq.index()] = ray_mask(sq, &ROOK_DIRECTIONS);
        tables.bishop_rays[sq.index()] = ray_mask(sq, &BISHOP_DIRECTIONS);
    }
    tables
}

#[inline]
fn tables() -> &'static LeaperTables {
    LEAPER_TABLES.get_or_init(init_leaper_tables)
}

#[inline]
pub fn knight_reach(sq: Square) -> Bitboard {
    tables().knight[sq.index()]
}

#[inline]
pub fn king_reach(sq: Square) -> Bitboard {
    tables().king[sq.index()]
}

/// Orthogonal lines through `sq` on an empty board, `sq` excluded.
#[inline]
pub fn rook_rays(sq: Square) -> Bitboard {
    tables().rook_rays[sq.index()]
}

/// Diagonal lines through `sq` on an empty board, `sq` excluded.
#[inline]
pub fn bishop_rays(sq: Square) -> Bitboard {
    tables().bishop_rays[sq.index()]
}

/// Squares strictly between two aligned squares; empty when they share no
/// rank, file or diagonal.
pub fn between(a: Square, b: Square) -> Bitboard {
    let bbox = Bitboard::bounding_box(a, b);
    if rook_rays(a).contains(b) {
        bbox & rook_rays(a) & rook_rays(b)
    } else if bishop_rays(a).contains(b) {
        bbox & bishop_rays(a) & bishop_rays(b)
    } else {
        Bitboard::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_knight_and_king_reach() {
        assert_eq!(knight_reach(sq("a1")).count(), 2);
        assert_eq!(knight_reach(sq("d4")).count(), 8);
        assert_eq!(king_reach(sq("a1")).count(), 3);
        assert_eq!(king_reach(sq("e4")).count(), 8);
        assert!(knight_reach(sq("g1")).contains(sq("f3")));
    }

    #[test]
    fn test_bounding_box() {
        let bbox = Bitboard::bounding_box(sq("b2"), sq("d5"));
        assert_eq!(bbox.count(), 3 * 4);
        assert!(bbox.contains(sq("c3")));
        assert!(bbox.contains(sq("d5")));
        assert!(!bbox.contains(sq("e5")));
        assert_eq!(Bitboard::bounding_box(sq("e4"), sq("e4")).count(), 1);
        assert_eq!(Bitboard::bounding_box(sq("a1"), sq("h8")), Bitboard::FULL);
    }

    #[test]
    fn test_between() {
        let b = between(sq("a1"), sq("a8"));
        assert_eq!(b.count(), 6);
        assert!(!b.contains(sq("a1")) && !b.contains(sq("a8")));
        assert_eq!(between(sq("c1"), sq("h6")).count(), 4);
        assert!(between(sq("a1"), sq("b3")).is_empty());
        assert!(between(sq("e4"), sq("e5")).is_empty());
    }

    #[test]
    fn test_ahead_of_rank() {
        assert_eq!(Bitboard::ahead_of_rank(Color::White, 6), Bitboard::rank(7));
        assert_eq!(Bitboard::ahead_of_rank(Color::Black, 1), Bitboard::rank(0));
        assert!(Bitboard::ahead_of_rank(Color::White, 7).is_empty());
        assert!(Bitboard::ahead_of_rank(Color::Black, 0).is_empty());
        assert_eq!(Bitboard::ahead_of_rank(Color::White, 3).count(), 32);
    }

    #[test]
    fn test_pawn_shifts_do_not_wrap() {
        let a_and_h = Bitboard::from(sq("a4")) | Bitboard::from(sq("h4"));
        let attacks = a_and_h.pawn_attacks(Color::White);
        assert_eq!(attacks.count(), 2);
        assert!(attacks.contains(sq("b5")));
        assert!(attacks.contains(sq("g5")));
        let attacks = a_and_h.pawn_attacks(Color::Black);
        assert!(attacks.contains(sq("b3")));
        assert!(attacks.contains(sq("g3")));
        assert_eq!(Bitboard::from(sq("e2")).pawn_push(Color::White), sq("e3").into());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let bb: Bitboard = [sq("a1"), sq("c3"), sq("h8")].into_iter().collect();
        let first: Vec<_> = bb.iter().collect();
        let second: Vec<_> = bb.into_iter().collect();
        assert_eq!(first, vec![sq("a1"), sq("c3"), sq("h8")]);
        assert_eq!(first, second);
        assert!(bb.more_than_one());
        assert!(Bitboard::from(sq("d4")).is_single());
    }

    #[test]
    fn test_move_bit() {
        let mut bb = Bitboard::from(sq("e2"));
        bb.move_bit(sq("e2"), sq("e4"));
        assert_eq!(bb, sq("e4").into());
    }

    #[test]
    #[should_panic]
    fn test_move_bit_from_empty_panics() {
        let mut bb = Bitboard::EMPTY;
        bb.move_bit(sq("e2"), sq("e4"));
    }
}
