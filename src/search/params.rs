//! Search parameters and configuration
//!
//! Depth is the only bound on a search; there is no clock.

/// Search parameters for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Maximum search depth in plies
    pub max_depth: u8,

    /// Maximum extra plies quiescence may add past the nominal depth
    pub qsearch_depth: u8,

    /// Transposition table size in megabytes
    pub tt_size_mb: usize,

    /// Probe and store the transposition table
    pub use_tt: bool,

    /// Search depths 1..=max_depth in turn, seeding each with the last best line
    pub iterative_deepening: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            qsearch_depth: 6,
            tt_size_mb: 16,
            use_tt: true,
            iterative_deepening: true,
        }
    }
}

impl SearchParams {
    /// Create new search params with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum depth in plies
    pub fn max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set quiescence search depth
    pub fn qsearch_depth(mut self, depth: u8) -> Self {
        self.qsearch_depth = depth;
        self
    }

    /// Set transposition table size in megabytes
    pub fn tt_size_mb(mut self, size_mb: usize) -> Self {
        self.tt_size_mb = size_mb;
        self
    }

    /// Enable or disable the transposition table
    pub fn use_tt(mut self, enable: bool) -> Self {
        self.use_tt = enable;
        self
    }

    /// Enable or disable iterative deepening
    pub fn iterative_deepening(mut self, enable: bool) -> Self {
        self.iterative_deepening = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let params = SearchParams::new().max_depth(7).qsearch_depth(2).use_tt(false);
        assert_eq!(params.max_depth, 7);
        assert_eq!(params.qsearch_depth, 2);
        assert!(!params.use_tt);
        assert_eq!(params.tt_size_mb, SearchParams::default().tt_size_mb);
    }
}
