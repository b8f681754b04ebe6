//! Search engine for the castellan chess core
//!
//! Single-threaded and bounded by depth alone. Searching in parallel means
//! giving each search its own clone of the position.

pub mod params;
pub mod search;
pub mod stats;
pub mod tt;

pub use self::params::SearchParams;
pub use self::search::{best_move, try_best_move, Search, SearchResult, INFINITE, MATE, MATE_THRESHOLD};
pub use self::stats::SearchStats;
pub use self::tt::TranspositionTable;
