//! Magic Bitboards for O(1) sliding piece attack generation
//!
//! For every square and slider family we keep a "relevant occupancy" mask
//! (the squares that can block a ray, board edges excluded) and a magic
//! multiplier such that `(occ & mask) * magic >> shift` is a perfect index
//! into that square's attack table.
//!
//! Magics are found at first use by a seeded search, so the tables are
//! reproducible from run to run. Every candidate is checked against a slow
//! ray-cast over all blocker subsets before it is accepted.

use std::sync::OnceLock;
use std::time::Instant;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::bitboard::{Bitboard, BISHOP_DIRECTIONS, ROOK_DIRECTIONS};
use crate::square::Square;

/// Seed for the magic search. Any value works; this one is kept fixed so
/// table construction takes the same path every run.
const MAGIC_SEED: u64 = 0x5CAC_C415_7A00_0001;

/// Candidates tried per square before the table is declared unbuildable.
const MAX_ATTEMPTS: usize = 100_000_000;

// ============================================================================
// ATTACK TABLES
// ============================================================================

/// Magic entry for a single square
#[derive(Clone, Copy, Default)]
struct MagicEntry {
    mask: u64,     // Relevant occupancy mask (excludes edges)
    magic: u64,    // Magic number
    shift: u32,    // Shift amount (64 - bits)
    offset: usize, // Offset into attack table
}

impl MagicEntry {
    #[inline]
    fn index(&self, occ: u64) -> usize {
        self.offset + (((occ & self.mask).wrapping_mul(self.magic)) >> self.shift) as usize
    }
}

/// Global magic tables
struct MagicTables {
    rook_entries: [MagicEntry; 64],
    bishop_entries: [MagicEntry; 64],
    rook_attacks: Vec<u64>,
    bishop_attacks: Vec<u64>,
}

static MAGIC_TABLES: OnceLock<MagicTables> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slider {
    Rook,
    Bishop,
}

impl Slider {
    fn directions(self) -> &'static [(i8, i8); 4] {
        match self {
            Slider::Rook => &ROOK_DIRECTIONS,
            Slider::Bishop => &BISHOP_DIRECTIONS,
        }
    }
}

// ============================================================================
// MASK AND SLOW ATTACK GENERATION (used to build tables)
// ============================================================================

/// Relevant blockers for a square: each ray minus its final edge square.
fn relevant_mask(slider: Slider, sq: Square) -> u64 {
    let mut mask = 0u64;
    for &(df, dr) in slider.directions() {
        let mut file = sq.file() as i8 + df;
        let mut rank = sq.rank() as i8 + dr;
        // A square only matters if the ray continues past it
        while (0..8).contains(&(file + df)) && (0..8).contains(&(rank + dr)) {
            mask |= 1u64 << (rank * 8 + file);
            file += df;
            rank += dr;
        }
    }
    mask
}

/// Ray-cast attacks for a given occupancy, stopping on the first blocker.
fn slow_attacks(slider: Slider, sq: Square, occ: u64) -> u64 {
    let mut attacks = 0u64;
    for &(df, dr) in slider.directions() {
        let mut file = sq.file() as i8 + df;
        let mut rank = sq.rank() as i8 + dr;
        while (0..8).contains(&file) && (0..8).contains(&rank) {
            let bit = 1u64 << (rank * 8 + file);
            attacks |= bit;
            if occ & bit != 0 {
                break;
            }
            file += df;
            rank += dr;
        }
    }
    attacks
}

/// Generate all blocker subsets for a given mask
fn enumerate_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

// ============================================================================
// MAGIC SEARCH
// ============================================================================

/// Finds a collision-free magic for one square and writes its table slice.
///
/// Two blocker subsets may share a slot only if they produce the same attack
/// set. Failing to find a magic within the attempt cap means the tables
/// cannot be trusted, so it panics.
fn find_magic(
    slider: Slider,
    sq: Square,
    rng: &mut Xoshiro256PlusPlus,
    offset: usize,
    table: &mut Vec<u64>,
) -> MagicEntry {
    let mask = relevant_mask(slider, sq);
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;

    let subsets = enumerate_subsets(mask);
    let reference: Vec<u64> = subsets
        .iter()
        .map(|&occ| slow_attacks(slider, sq, occ))
        .collect();

    table.resize(offset + size, 0);
    // Generation stamp per slot avoids clearing the slice between attempts
    let mut used = vec![0usize; size];

    for attempt in 1..=MAX_ATTEMPTS {
        // Sparse candidates hash far better; AND of three draws keeps ~1/8 bits
        let magic = rng.next_u64() & rng.next_u64() & rng.next_u64();
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        let mut ok = true;
        for (occ, &attacks) in subsets.iter().zip(&reference) {
            let idx = ((occ.wrapping_mul(magic)) >> shift) as usize;
            if used[idx] != attempt {
                used[idx] = attempt;
                table[offset + idx] = attacks;
            } else if table[offset + idx] != attacks {
                ok = false;
                break;
            }
        }

        if ok {
            return MagicEntry {
                mask,
                magic,
                shift,
                offset,
            };
        }
    }

    panic!("no magic found for {slider:?} on {sq} after {MAX_ATTEMPTS} attempts");
}

/// Initialize all magic tables
fn init_magic_tables() -> MagicTables {
    let started = Instant::now();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(MAGIC_SEED);

    let mut rook_entries = [MagicEntry::default(); 64];
    let mut bishop_entries = [MagicEntry::default(); 64];
    let mut rook_attacks = Vec::new();
    let mut bishop_attacks = Vec::new();

    for sq in Square::all() {
        let offset = rook_attacks.len();
        rook_entries[sq.index()] = find_magic(Slider::Rook, sq, &mut rng, offset, &mut rook_attacks);
        let offset = bishop_attacks.len();
        bishop_entries[sq.index()] =
            find_magic(Slider::Bishop, sq, &mut rng, offset, &mut bishop_attacks);
    }

    let tables = MagicTables {
        rook_entries,
        bishop_entries,
        rook_attacks,
        bishop_attacks,
    };
    validate(&tables);

    log::debug!(
        "magic tables built in {:?} ({} rook + {} bishop slots)",
        started.elapsed(),
        tables.rook_attacks.len(),
        tables.bishop_attacks.len()
    );
    tables
}

/// Re-checks every subset of every square against the slow ray-cast.
fn validate(tables: &MagicTables) {
    for sq in Square::all() {
        for (slider, entry, attacks) in [
            (Slider::Rook, &tables.rook_entries[sq.index()], &tables.rook_attacks),
            (Slider::Bishop, &tables.bishop_entries[sq.index()], &tables.bishop_attacks),
        ] {
            for occ in enumerate_subsets(entry.mask) {
                assert_eq!(
                    attacks[entry.index(occ)],
                    slow_attacks(slider, sq, occ),
                    "magic table for {slider:?} on {sq} failed validation"
                );
            }
        }
    }
}

#[inline]
fn tables() -> &'static MagicTables {
    MAGIC_TABLES.get_or_init(init_magic_tables)
}

/// Initialize magic tables (thread-safe, called once)
pub fn init() {
    tables();
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Rook attacks from `sq` given all occupied squares, own pieces masked out.
#[inline]
pub fn rook_attacks(sq: Square, all: Bitboard, own: Bitboard) -> Bitboard {
    let tables = tables();
    let entry = &tables.rook_entries[sq.index()];
    Bitboard(tables.rook_attacks[entry.index(all.0)] & !own.0)
}

/// Bishop attacks from `sq` given all occupied squares, own pieces masked out.
#[inline]
pub fn bishop_attacks(sq: Square, all: Bitboard, own: Bitboard) -> Bitboard {
    let tables = tables();
    let entry = &tables.bishop_entries[sq.index()];
    Bitboard(tables.bishop_attacks[entry.index(all.0)] & !own.0)
}

/// Get queen attacks (bishop + rook)
#[inline]
pub fn queen_attacks(sq: Square, all: Bitboard, own: Bitboard) -> Bitboard {
    rook_attacks(sq, all, own) | bishop_attacks(sq, all, own)
}

// ============================================================================
// TESTS
// ============================================================================
