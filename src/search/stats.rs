//! Search statistics
//!
//! Tracks nodes searched, cutoffs, transposition hits and timing.

use std::time::{Duration, Instant};

/// Search statistics
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    /// Total nodes searched, quiescence included
    pub nodes: u64,

    /// Quiescence nodes searched
    pub qsearch_nodes: u64,

    /// Transposition table probes that found the position
    pub tt_hits: u64,

    /// Transposition hits that ended the node without searching it
    pub tt_cutoffs: u64,

    /// Beta cutoffs
    pub cutoffs: u64,

    /// Search start time
    pub start_time: Option<Instant>,

    /// Time spent searching
    pub search_time: Duration,

    /// Nodes per second rate
    pub nps: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timing(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Update elapsed time and NPS
    pub fn update_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.search_time = start.elapsed();
            let elapsed_ms = self.search_time.as_millis() as u64;
            if elapsed_ms > 0 {
                self.nps = (self.nodes * 1000) / elapsed_ms;
            }
        }
    }

    pub fn inc_node(&mut self) {
        self.nodes += 1;
    }

    pub fn inc_qsearch_node(&mut self) {
        self.nodes += 1;
        self.qsearch_nodes += 1;
    }

    pub fn inc_tt_hit(&mut self) {
        self.tt_hits += 1;
    }

    pub fn inc_tt_cutoff(&mut self) {
        self.tt_cutoffs += 1;
    }

    pub fn inc_cutoff(&mut self) {
        self.cutoffs += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "nodes {} (qsearch {}), cutoffs {}, tt hits {} ({} cutoffs), {} ms, {} nps",
            self.nodes,
            self.qsearch_nodes,
            self.cutoffs,
            self.tt_hits,
            self.tt_cutoffs,
            self.search_time.as_millis(),
            self.nps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qsearch_nodes_count_as_nodes() {
        let mut stats = SearchStats::new();
        stats.inc_node();
        stats.inc_qsearch_node();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.qsearch_nodes, 1);
        stats.reset();
        assert_eq!(stats.nodes, 0);
    }
}
