//! Bitboard chess core: legal move generation with magic slider lookup,
//! incremental Zobrist hashing, exact make/unmake and an alpha-beta search.

pub mod bitboard;
pub mod error;
pub mod eval;
pub mod fen;
pub mod magic;
pub mod movegen;
pub mod moves;
pub mod notation;
pub mod perft;
pub mod position;
pub mod search;
pub mod side;
pub mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use error::{ChessError, Result};
pub use moves::Move;
pub use perft::{perft, perft_divide};
pub use position::{Position, UndoHandle, STARTING_FEN};
pub use search::{Search, SearchParams, SearchResult};
pub use side::SideState;
pub use square::{Color, PieceKind, Square};
pub use zobrist::ZobristKeys;

/// Builds the slider attack tables up front. Optional: they are otherwise
/// built on first use.
pub fn init() {
    magic::init();
}
