//! Engine context: the caller-facing contract over the UCT search.
//!
//! Design Notes calls out that global mutable state (komi, pattern tables,
//! zobrist tables, logging) should be encapsulated in an explicit context
//! passed to search operations, with only the zobrist and pattern tables
//! shared immutably. `Engine` is that context: it owns a `SearchConfig`,
//! the loaded pattern stores, and a `TranspositionTable`, and exposes the
//! three caller-facing operations spec.md §6 names.

use crate::board::{CfgBoard, Color, Point};
use crate::config::SearchConfig;
use crate::constants::{BOARD_IMAX, BOARD_IMIN, PASS_MOVE};
use crate::patterns::{LargePatternStore, Pat3Store};
use crate::transposition::TranspositionTable;
use crate::uct;
use log::warn;
use std::time::Instant;

/// Per-position evaluation returned alongside the chosen move: how good
/// the search judged each candidate, which positions were actually
/// explored, and a quality for passing.
#[derive(Debug, Clone)]
pub struct OutBoard {
    /// `quality[p]` is the winrate-like estimate in `[0, 1]` for playing at
    /// `p`, indexed identically to `CfgBoard`'s padded array.
    pub quality: Vec<f64>,
    /// `tested[p]` is true for positions the search actually visited.
    pub tested: Vec<bool>,
    /// Estimated quality of passing.
    pub pass_quality: f64,
    /// The move the search recommends, or `None` if every option resigns.
    pub best_move: Option<Point>,
}

pub struct Engine {
    pub config: SearchConfig,
    pub pat3: Pat3Store,
    pub large_patterns: Option<LargePatternStore>,
    table: TranspositionTable,
}

impl Engine {
    pub fn new(config: SearchConfig) -> Engine {
        let table = TranspositionTable::new(config.max_allocated_states, config.expand_after_visits);
        Engine { config, pat3: Pat3Store::default(), large_patterns: None, table }
    }

    pub fn with_patterns(config: SearchConfig, pat3: Pat3Store, large_patterns: Option<LargePatternStore>) -> Engine {
        let table = TranspositionTable::new(config.max_allocated_states, config.expand_after_visits);
        Engine { config, pat3, large_patterns, table }
    }

    /// Run a search on `board` with `to_play` to move until `deadline`,
    /// returning a per-position quality map and the recommended move.
    /// `has_play` in the caller's terms is `out_board.best_move.is_some()`.
    pub fn evaluate_position(&self, board: &CfgBoard, to_play: Color, deadline: Instant) -> OutBoard {
        let mut board = board.clone();
        board.to_play = to_play;
        let outcome = uct::evaluate_position(&board, &self.table, &self.config, &self.pat3, self.large_patterns.as_ref(), deadline);

        let size = board.group_of.len();
        let mut quality = vec![0.0; size];
        let mut tested = vec![false; size];
        let mut pass_quality = 0.5;

        if let Some(root) = self.table.lookup_or_create(&board, true) {
            let state = root.lock();
            for edge in &state.plays {
                if edge.mv == PASS_MOVE {
                    pass_quality = edge.mc_q();
                    continue;
                }
                if edge.mv >= BOARD_IMIN && edge.mv < BOARD_IMAX {
                    quality[edge.mv] = edge.mc_q();
                    tested[edge.mv] = edge.mc_n > 0;
                }
            }
        }

        let best_move = if outcome.best_move == crate::constants::RESIGN_MOVE {
            None
        } else {
            Some(outcome.best_move)
        };

        OutBoard { quality, tested, pass_quality, best_move }
    }

    /// Prune the transposition table to the subtree reachable from
    /// `board`, discarding everything else. Called between moves within
    /// one game.
    pub fn opt_turn_maintenance(&self, board: &CfgBoard) {
        if let Some(root) = self.table.lookup_or_create(board, true) {
            self.table.prune_outside(&root);
        } else {
            warn!("opt_turn_maintenance: table is over capacity, skipping prune");
        }
    }

    /// Clear all search state. Called between games.
    pub fn new_match_maintenance(&self) {
        self.table.clear_all();
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quick_engine() -> Engine {
        let cfg = SearchConfig { batch_size: 32, worker_threads: 2, max_allocated_states: 4096, ..SearchConfig::default() };
        Engine::new(cfg)
    }

    #[test]
    fn evaluate_position_on_empty_board_recommends_a_play() {
        let engine = quick_engine();
        let board = CfgBoard::new();
        let deadline = Instant::now() + Duration::from_millis(200);
        let out = engine.evaluate_position(&board, Color::Black, deadline);
        assert!(out.best_move.is_some());
        assert!(out.pass_quality >= 0.0 && out.pass_quality <= 1.0);
    }

    #[test]
    fn opt_turn_maintenance_prunes_without_panicking() {
        let engine = quick_engine();
        let board = CfgBoard::new();
        let deadline = Instant::now() + Duration::from_millis(50);
        let _ = engine.evaluate_position(&board, Color::Black, deadline);
        engine.opt_turn_maintenance(&board);
        assert!(engine.table_len() <= 1);
    }

    #[test]
    fn new_match_maintenance_empties_the_table() {
        let engine = quick_engine();
        let board = CfgBoard::new();
        let deadline = Instant::now() + Duration::from_millis(50);
        let _ = engine.evaluate_position(&board, Color::Black, deadline);
        engine.new_match_maintenance();
        assert_eq!(engine.table_len(), 0);
    }
}
