//! Zobrist key table
//!
//! Keys are drawn once from a seeded generator and owned by whoever builds
//! them. Positions share one table through an `Arc`, so tests can run with
//! isolated, deterministic key sets.

use std::collections::HashSet;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::square::{Color, PieceKind, Square};

pub const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZobristKeys {
    seed: u64,
    pieces: [[[u64; 64]; 6]; 2],
    castle_short: [u64; 2],
    castle_long: [u64; 2],
    ep_file: [u64; 8],
    black_to_move: u64,
}

impl ZobristKeys {
    /// Builds a key table from `seed`.
    ///
    /// Panics if two keys collide or a key is zero; either would make
    /// distinct positions hash alike and is not worth retrying silently.
    pub fn new(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut keys = ZobristKeys {
            seed,
            pieces: [[[0; 64]; 6]; 2],
            castle_short: [0; 2],
            castle_long: [0; 2],
            ep_file: [0; 8],
            black_to_move: 0,
        };

        for side in keys.pieces.iter_mut() {
            for kind in side.iter_mut() {
                for key in kind.iter_mut() {
                    *key = rng.next_u64();
                }
            }
        }
        for key in keys
            .castle_short
            .iter_mut()
            .chain(keys.castle_long.iter_mut())
            .chain(keys.ep_file.iter_mut())
        {
            *key = rng.next_u64();
        }
        keys.black_to_move = rng.next_u64();

        let all = keys.all_keys();
        let distinct: HashSet<u64> = all.iter().copied().collect();
        assert!(
            distinct.len() == all.len() && !distinct.contains(&0),
            "zobrist seed {seed:#x} produced colliding keys"
        );
        log::trace!("generated {} zobrist keys from seed {seed:#x}", all.len());
        keys
    }

    fn all_keys(&self) -> Vec<u64> {
        self.pieces
            .iter()
            .flatten()
            .flatten()
            .chain(&self.castle_short)
            .chain(&self.castle_long)
            .chain(&self.ep_file)
            .chain(std::iter::once(&self.black_to_move))
            .copied()
            .collect()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn piece(&self, color: Color, kind: PieceKind, sq: Square) -> u64 {
        self.pieces[color.index()][kind.index()][sq.index()]
    }

    #[inline]
    pub fn castle_short(&self, color: Color) -> u64 {
        self.castle_short[color.index()]
    }

    #[inline]
    pub fn castle_long(&self, color: Color) -> u64 {
        self.castle_long[color.index()]
    }

    #[inline]
    pub fn ep_file(&self, file: u8) -> u64 {
        self.ep_file[file as usize]
    }

    #[inline]
    pub fn black_to_move(&self) -> u64 {
        self.black_to_move
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        ZobristKeys::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_keys() {
        let a = ZobristKeys::new(42);
        let b = ZobristKeys::new(42);
        assert_eq!(a, b);
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = ZobristKeys::new(1);
        let b = ZobristKeys::new(2);
        assert_ne!(a.black_to_move(), b.black_to_move());
        assert_ne!(
            a.piece(Color::White, PieceKind::Pawn, Square::E1),
            b.piece(Color::White, PieceKind::Pawn, Square::E1)
        );
    }

    #[test]
    fn test_key_count() {
        // 2 sides x 6 kinds x 64 squares, 4 castling, 8 ep files, side to move
        assert_eq!(ZobristKeys::default().all_keys().len(), 768 + 4 + 8 + 1);
    }
}
