//! Transposition-table node and play edge (§3, §4.6, §4.7).
//!
//! Grounded on the teacher's `TreeNode` in `mcts.rs` (pos/v/w/pv/pw/av/aw/
//! children), generalized from an owned-per-node `Vec<TreeNode>` of eagerly
//! materialized children to a transposition-shared node whose edges lazily
//! point at other nodes living in the opposite color's table (§4.6). The
//! per-node lock spec.md calls for is a plain `std::sync::Mutex` around the
//! mutable half of the node (edges + expansion delay); the immutable half
//! (hash, snapshot, last-move facts) needs no lock since it never changes
//! after the node is created.

use crate::board::{CfgBoard, Color, Point, Slot};
use crate::constants::PASS_MOVE;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

/// One legal continuation out of a tree node. `next_node` is filled in on
/// first descent into it and always belongs to the opposite color's
/// transposition table (§3's invariant).
pub struct PlayEdge {
    pub mv: Point,
    pub mc_n: u32,
    pub mc_w: f64,
    pub amaf_n: u32,
    pub amaf_w: f64,
    /// Running estimate of how often the point ends up owned by the
    /// eventual winner (pachi-style "owner" criticality input).
    pub owner_winning: f64,
    /// Running estimate of how often the point ends up owned by this
    /// edge's own color.
    pub color_owning: f64,
    pub next_node: Option<Arc<TreeNode>>,
    /// The move of another edge in this same node to try first next time,
    /// keyed by last-good-reply-1 (LGRF1) hinting.
    pub lgrf1_reply: Option<Point>,
}

impl PlayEdge {
    fn seeded(mv: Point, visits: u32, wins: u32) -> PlayEdge {
        PlayEdge {
            mv,
            mc_n: visits,
            mc_w: wins as f64,
            amaf_n: 0,
            amaf_w: 0.0,
            owner_winning: 0.5,
            color_owning: 0.5,
            next_node: None,
            lgrf1_reply: None,
        }
    }

    #[inline]
    pub fn mc_q(&self) -> f64 {
        if self.mc_n == 0 { 0.5 } else { self.mc_w / self.mc_n as f64 }
    }

    #[inline]
    pub fn amaf_q(&self) -> f64 {
        if self.amaf_n == 0 { 0.5 } else { self.amaf_w / self.amaf_n as f64 }
    }

    /// Apply a virtual loss: pretend this edge lost once, to discourage a
    /// second concurrent descent down the same path before real backprop
    /// lands (§5).
    pub fn apply_virtual_loss(&mut self) {
        self.mc_n += 1;
        self.mc_w -= 1.0 / self.mc_n as f64;
    }

    pub fn undo_virtual_loss(&mut self) {
        self.mc_w += 1.0 / self.mc_n as f64;
        self.mc_n -= 1;
    }

    pub fn record_mc(&mut self, won: bool) {
        self.mc_n += 1;
        if won {
            self.mc_w += 1.0;
        }
    }

    pub fn record_amaf(&mut self, won: bool) {
        self.amaf_n += 1;
        if won {
            self.amaf_w += 1.0;
        }
    }
}

/// The mutable half of a node: edges plus the expansion countdown. Always
/// accessed through [`TreeNode::lock`].
pub struct TreeNodeState {
    /// Counts down once per visit; expansion happens the visit it reaches
    /// -1 (§4.7 step 3).
    pub expansion_delay: i32,
    /// Sorted ascending by `mv` so lookups can binary-search (§3).
    pub plays: Vec<PlayEdge>,
}

impl TreeNodeState {
    pub fn is_expanded(&self) -> bool {
        !self.plays.is_empty()
    }

    pub fn edge_index(&self, mv: Point) -> Option<usize> {
        self.plays.binary_search_by_key(&mv, |e| e.mv).ok()
    }

    /// Populate `plays` from a priors computation. No-op if already
    /// expanded (transposition hits race to expand the same node; the
    /// first one through wins).
    pub fn expand(&mut self, priors: Vec<crate::priors::PriorMove>) {
        if self.is_expanded() {
            return;
        }
        self.plays = priors.into_iter().map(|p| PlayEdge::seeded(p.point, p.visits, p.wins)).collect();
        self.plays.sort_by_key(|e| e.mv);
    }
}

/// A transposition-table entry (§3). Immutable fields are set once at
/// creation; `state` is the only part touched during search.
pub struct TreeNode {
    pub zobrist_hash: u64,
    pub color_snapshot: Box<[Slot]>,
    pub to_play: Color,
    pub last_eaten: Option<Point>,
    pub last_was_pass: bool,
    /// Sweep-mark used by `prune_outside` (§4.6); not protected by `state`
    /// since it is only ever written under the owning bucket's lock.
    pub maintenance_mark: AtomicU64,
    state: Mutex<TreeNodeState>,
}

impl TreeNode {
    pub fn new(board: &CfgBoard, expand_after_visits: i32) -> TreeNode {
        TreeNode {
            zobrist_hash: board.zobrist_hash,
            color_snapshot: (0..board.group_of.len()).map(|p| board.slot(p)).collect(),
            to_play: board.to_play,
            last_eaten: board.last_eaten,
            last_was_pass: board.last_played == PASS_MOVE,
            maintenance_mark: AtomicU64::new(0),
            state: Mutex::new(TreeNodeState { expansion_delay: expand_after_visits, plays: Vec::new() }),
        }
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, TreeNodeState> {
        self.state.lock().expect("tree node lock poisoned")
    }

    /// Collision check (§4.6): zobrist plus exact board bitmap plus
    /// last-eaten plus last-was-pass must all agree before a bucket entry
    /// is treated as a hit.
    pub fn matches(&self, board: &CfgBoard) -> bool {
        self.zobrist_hash == board.zobrist_hash
            && self.to_play == board.to_play
            && self.last_eaten == board.last_eaten
            && self.last_was_pass == (board.last_played == PASS_MOVE)
            && self.color_snapshot.iter().enumerate().all(|(p, &s)| board.slot(p) == s)
    }

    pub fn mark_visited(&self) -> bool {
        let mut state = self.lock();
        if state.expansion_delay > -1 {
            state.expansion_delay -= 1;
        }
        state.expansion_delay == -1 && !state.is_expanded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::priors::compute_priors;

    #[test]
    fn fresh_node_is_not_expanded() {
        let board = CfgBoard::new();
        let node = TreeNode::new(&board, 8);
        assert!(!node.lock().is_expanded());
    }

    #[test]
    fn expand_populates_sorted_edges() {
        let board = CfgBoard::new();
        let node = TreeNode::new(&board, 8);
        let cfg = SearchConfig::default();
        let priors = compute_priors(&board, &cfg, None);
        node.lock().expand(priors);
        let state = node.lock();
        assert!(state.is_expanded());
        assert!(state.plays.windows(2).all(|w| w[0].mv < w[1].mv));
    }

    #[test]
    fn matches_detects_any_divergence() {
        let mut board = CfgBoard::new();
        let node = TreeNode::new(&board, 8);
        assert!(node.matches(&board));
        board.play(crate::coord::parse_coord("E5").unwrap(), Color::Black).unwrap();
        assert!(!node.matches(&board));
    }

    #[test]
    fn expansion_delay_reaches_trigger_exactly_once() {
        let board = CfgBoard::new();
        let node = TreeNode::new(&board, 1);
        assert!(!node.mark_visited()); // delay 1 -> 0
        assert!(node.mark_visited()); // delay 0 -> -1, fires
        let cfg = SearchConfig::default();
        node.lock().expand(compute_priors(&board, &cfg, None));
        assert!(!node.mark_visited()); // already expanded, won't fire again
    }
}
