//! Color-segregated transposition table (§4.6).
//!
//! No teacher counterpart exists — `mcts.rs`'s tree is a plain owned
//! `Vec<TreeNode>` per node, never shared. Built fresh in the teacher's
//! flat, struct-of-fields idiom; the concurrency shape (`Arc<Mutex<_>>`
//! per bucket, `Arc<TreeNode>` nodes shared across threads) is grounded on
//! `Chicoryn-dream-go/src/libdg_mcts/pool/pool.rs`'s `Pool`/`SharedContext`
//! split — the same crate family the UCT worker pool borrows from (§4.7).
//! spec.md's "singly linked list + manual free list of node memory" is
//! realized as `Mutex<Vec<Arc<TreeNode>>>` per bucket and ordinary
//! `Drop`-based reclamation: no raw pointers or hand-rolled intrusive free
//! list anywhere in this crate (see DESIGN.md).

use crate::board::{CfgBoard, Color};
use crate::tree::TreeNode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Smallest prime at or above `n`, used to size each color's bucket array
/// near `max_allocated_states / 2` (§4.6).
fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    loop {
        if is_prime(candidate) {
            return candidate;
        }
        candidate += 1;
    }
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

struct Bucket {
    nodes: Mutex<Vec<Arc<TreeNode>>>,
}

/// Two bucket arrays, one per color to move, each sized to a prime near
/// `max_allocated_states / 2`.
pub struct TranspositionTable {
    buckets: [Box<[Bucket]>; 2],
    bucket_count: usize,
    allocated: AtomicUsize,
    capacity: usize,
    expand_after_visits: i32,
    maintenance_mark: AtomicUsize,
}

impl TranspositionTable {
    pub fn new(max_allocated_states: usize, expand_after_visits: i32) -> TranspositionTable {
        let bucket_count = next_prime((max_allocated_states / 2).max(17));
        let make = || (0..bucket_count).map(|_| Bucket { nodes: Mutex::new(Vec::new()) }).collect::<Vec<_>>().into_boxed_slice();
        TranspositionTable {
            buckets: [make(), make()],
            bucket_count,
            allocated: AtomicUsize::new(0),
            capacity: max_allocated_states,
            expand_after_visits,
            maintenance_mark: AtomicUsize::new(0),
        }
    }

    fn table_index(color: Color) -> usize {
        match color {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    fn bucket_for(&self, color: Color, zobrist_hash: u64) -> &Bucket {
        let idx = (zobrist_hash as usize) % self.bucket_count;
        &self.buckets[Self::table_index(color)][idx]
    }

    /// §4.6's `lookup_or_create`. `at_root` controls the out-of-capacity
    /// behavior: the root of a search always gets a node back (logged as a
    /// memory-exhausted warning by the caller), a mid-descent miss returns
    /// `None` so the caller falls back to a cheap playout at that depth
    /// instead of growing the table further.
    pub fn lookup_or_create(&self, board: &CfgBoard, at_root: bool) -> Option<Arc<TreeNode>> {
        let bucket = self.bucket_for(board.to_play, board.zobrist_hash);
        let mut nodes = bucket.nodes.lock().expect("transposition bucket lock poisoned");
        if let Some(existing) = nodes.iter().find(|n| n.matches(board)) {
            return Some(existing.clone());
        }
        if self.allocated.load(Ordering::Relaxed) >= self.capacity && !at_root {
            return None;
        }
        let node = Arc::new(TreeNode::new(board, self.expand_after_visits));
        nodes.push(node.clone());
        self.allocated.fetch_add(1, Ordering::Relaxed);
        Some(node)
    }

    pub fn is_over_capacity(&self) -> bool {
        self.allocated.load(Ordering::Relaxed) >= self.capacity
    }

    /// Sweep-mark every node reachable from `root`'s subtree, following
    /// `next_node` links across both color tables, then drop everything
    /// else back to ordinary Rust deallocation.
    pub fn prune_outside(&self, root: &Arc<TreeNode>) {
        let mark = self.maintenance_mark.fetch_add(1, Ordering::Relaxed) as u64 + 1;
        mark_reachable(root, mark);

        for table in &self.buckets {
            for bucket in table.iter() {
                let mut nodes = bucket.nodes.lock().expect("transposition bucket lock poisoned");
                let before = nodes.len();
                nodes.retain(|n| n.maintenance_mark.load(Ordering::Relaxed) == mark);
                self.allocated.fetch_sub(before - nodes.len(), Ordering::Relaxed);
            }
        }
    }

    /// Drop every node, returning the table to empty.
    pub fn clear_all(&self) {
        for table in &self.buckets {
            for bucket in table.iter() {
                let mut nodes = bucket.nodes.lock().expect("transposition bucket lock poisoned");
                nodes.clear();
            }
        }
        self.allocated.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn mark_reachable(node: &Arc<TreeNode>, mark: u64) {
    if node.maintenance_mark.swap(mark, Ordering::Relaxed) == mark {
        return;
    }
    let state = node.lock();
    for edge in &state.plays {
        if let Some(next) = &edge.next_node {
            mark_reachable(next, mark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    #[test]
    fn lookup_or_create_returns_the_same_node_on_repeat_lookup() {
        let table = TranspositionTable::new(1024, 8);
        let board = CfgBoard::new();
        let a = table.lookup_or_create(&board, true).unwrap();
        let b = table.lookup_or_create(&board, true).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn black_and_white_to_move_share_no_bucket_array() {
        let table = TranspositionTable::new(1024, 8);
        let mut board = CfgBoard::new();
        let black_node = table.lookup_or_create(&board, true).unwrap();
        board.to_play = Color::White;
        let white_node = table.lookup_or_create(&board, true).unwrap();
        assert!(!Arc::ptr_eq(&black_node, &white_node));
    }

    #[test]
    fn out_of_capacity_mid_descent_returns_none() {
        let table = TranspositionTable::new(1, 8);
        let board = CfgBoard::new();
        table.lookup_or_create(&board, true).unwrap();
        let mut other = CfgBoard::new();
        other.play(crate::coord::parse_coord("E5").unwrap(), Color::Black).unwrap();
        assert!(table.lookup_or_create(&other, false).is_none());
    }

    #[test]
    fn clear_all_empties_the_table() {
        let table = TranspositionTable::new(1024, 8);
        let board = CfgBoard::new();
        table.lookup_or_create(&board, true).unwrap();
        table.clear_all();
        assert!(table.is_empty());
    }

    #[test]
    fn prune_outside_keeps_only_the_reachable_root() {
        let table = TranspositionTable::new(1024, 8);
        let board = CfgBoard::new();
        let root = table.lookup_or_create(&board, true).unwrap();
        let mut elsewhere = CfgBoard::new();
        elsewhere.play(crate::coord::parse_coord("E5").unwrap(), Color::Black).unwrap();
        elsewhere.to_play = Color::Black; // unrelated position, shares Black's table
        table.lookup_or_create(&elsewhere, true).unwrap();
        assert_eq!(table.len(), 2);
        table.prune_outside(&root);
        assert_eq!(table.len(), 1);
    }
}
