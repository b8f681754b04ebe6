//! Transposition table keyed by position hash
//!
//! One entry per slot, indexed by the low bits of the hash and verified
//! against the full key. The search owns the table outright, so slots are
//! plain values rather than atomics.

use crate::moves::Move;

use super::search::MATE_THRESHOLD;

/// Node type for transposition table entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    LowerBound,
    UpperBound,
}

/// Single TT entry
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub key: u64,
    pub score: i32,
    pub depth: u8,
    pub node_type: NodeType,
    pub best_move: Option<Move>,
    pub age: u8,
}

/// Mate scores count plies from the root. Stored entries count from the
/// node itself so they stay valid wherever the position recurs.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply as i32
    } else if score <= -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`] for a probe made `ply` plies from the root.
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: u64,
    age: u8,
}

impl TranspositionTable {
    /// Create a TT with approximately `size_mb` megabytes
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let wanted = (size_mb * 1024 * 1024) / entry_size;
        let count = wanted.next_power_of_two().max(1024);
        Self {
            entries: vec![None; count],
            mask: (count - 1) as u64,
            age: 0,
        }
    }

    /// Entry stored for exactly this key, if it is still in its slot
    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        let index = (key & self.mask) as usize;
        self.entries[index].filter(|entry| entry.key == key)
    }

    /// Store an entry
    ///
    /// Replacement priorities:
    /// 1. Empty slots, and entries left over from two or more searches ago
    /// 2. Deeper results over shallower ones
    /// 3. Exact scores over bounds at equal depth
    pub fn store(&mut self, key: u64, score: i32, depth: u8, node_type: NodeType, best_move: Option<Move>) {
        let index = (key & self.mask) as usize;
        let replace = match &self.entries[index] {
            None => true,
            Some(existing) => {
                self.age.wrapping_sub(existing.age) >= 2
                    || depth > existing.depth
                    || (depth == existing.depth && node_type == NodeType::Exact)
                    || (existing.key == key && depth == existing.depth && existing.node_type != NodeType::Exact)
            }
        };

        if replace {
            self.entries[index] = Some(TTEntry {
                key,
                score,
                depth,
                node_type,
                best_move,
                age: self.age,
            });
        }
    }

    /// Increment search age (call at start of each new root search)
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    /// Share of slots in use. Walks the whole table.
    pub fn fill_percentage(&self) -> f64 {
        let filled = self.entries.iter().filter(|e| e.is_some()).count();
        (filled as f64 / self.entries.len() as f64) * 100.0
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.age = 0;
    }

    /// Number of slots
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}
