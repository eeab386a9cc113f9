//! Expansion priors: turns a leaf CFG board into a seeded list of candidate
//! play edges (§4.5).
//!
//! Grounded on `mcts.rs`'s `apply_priors`/`compute_cfg_distances`/
//! `empty_area`/`line_height`, restructured to emit a flat, ascending-order
//! list of `(point, wins, visits)` triples instead of eagerly building a
//! full child `Position` per candidate — the transposition table (§4.6)
//! turns these into `PlayEdge`s lazily, on first descent into each one.

use crate::board::{neighbors4, neighbors8, CfgBoard, Color, Point, Safety, Slot};
use crate::config::SearchConfig;
use crate::constants::{BOARDSIZE, BOARD_IMAX, BOARD_IMIN, N, PASS_MOVE, T, W};
use crate::patterns::{pat3_weight, LargePatternStore};
use crate::tactical;

/// A single candidate move seeded with prior statistics, ready to become a
/// `PlayEdge`. Emitted in ascending `point` order (`PASS_MOVE` sorts last)
/// so the tree module can binary-search the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorMove {
    pub point: Point,
    pub visits: u32,
    pub wins: u32,
}

/// Enumerate and seed every legal candidate move from `board`, per §4.5's
/// skip rules and heuristic weight table.
pub fn compute_priors(board: &CfgBoard, cfg: &SearchConfig, large: Option<&LargePatternStore>) -> Vec<PriorMove> {
    let to_play = board.to_play;
    let cfg_distances = if board.last_played != PASS_MOVE { Some(cfg_distance_map(board, board.last_played)) } else { None };

    let mut moves = Vec::new();
    for pt in BOARD_IMIN..BOARD_IMAX {
        if board.slot(pt) != Slot::Empty {
            continue;
        }
        if should_skip(board, pt, to_play) {
            continue;
        }

        let even = cfg.prior_even_visits;
        let mut visits = even;
        let mut wins = even / 2;

        add_nakade_save_capture(board, cfg, pt, to_play, &mut visits, &mut wins);
        add_selfatari(board, cfg, pt, to_play, &mut visits);
        add_pattern(board, cfg, large, pt, to_play, &mut visits, &mut wins);
        add_proximity(cfg, &cfg_distances, pt, &mut visits, &mut wins);
        add_empty_area(board, cfg, pt, &mut visits, &mut wins);

        moves.push(PriorMove { point: pt, visits, wins });
    }

    moves.sort_by_key(|m| m.point);

    let candidate_threshold = (T as f64 * cfg.prior_pass_candidate_fraction) as usize;
    if moves.len() < candidate_threshold.max(1) {
        let pass_visits = cfg.prior_even_visits;
        let pass_wins = (pass_visits as f64 * cfg.resign_threshold) as u32;
        moves.push(PriorMove { point: PASS_MOVE, visits: pass_visits, wins: pass_wins });
    }

    moves
}

/// §4.5's skip list: suicides, ko violations, own proper eyes, and
/// forced-continuation ladders (a move that only extends a group already
/// doomed by a reading search, contributing nothing a playout wouldn't
/// already find). Seki is not separately detected; see DESIGN.md.
fn should_skip(board: &CfgBoard, pt: Point, to_play: Color) -> bool {
    if !board.can_play(pt, to_play, true) {
        return true;
    }
    if tactical::is_eye(board, pt, to_play) {
        return true;
    }
    let (libs, _) = board.liberties_after_play(pt, to_play);
    if libs == 2 {
        let mut test = board.clone();
        if test.play(pt, to_play).is_ok() {
            if let Some(id) = test.group_of[pt] {
                if tactical::is_ladder(&test, id) {
                    return true;
                }
            }
        }
    }
    false
}

/// Nakade/saving/capturing: weight proportional to `group_size^alpha`,
/// added to both wins and visits.
fn add_nakade_save_capture(board: &CfgBoard, cfg: &SearchConfig, pt: Point, to_play: Color, visits: &mut u32, wins: &mut u32) {
    let nakade_size = tactical::is_nakade(board, pt);
    if nakade_size > 0 {
        bump(visits, wins, weighted(nakade_size, cfg.prior_group_size_alpha));
    }

    let captures = board.captures_after_play(pt, to_play);
    if !captures.is_empty() {
        bump(visits, wins, weighted(captures.len() as u32, cfg.prior_group_size_alpha));
    }

    for n in neighbors4(pt) {
        if let Some(id) = board.group_of[n] {
            let group = board.group(id).unwrap();
            if group.color == to_play && group.lib_count <= 2 && board.can_play(pt, to_play, true) {
                bump(visits, wins, weighted(group.stones.len() as u32, cfg.prior_group_size_alpha));
            }
        }
    }
}

fn weighted(size: u32, alpha: f64) -> u32 {
    (size as f64).powf(alpha).round() as u32
}

fn bump(visits: &mut u32, wins: &mut u32, amount: u32) {
    *visits += amount;
    *wins += amount;
}

/// Self-atari, non-throw-in: an anti-vote added to visits only, never wins
/// (§4.5 — lowers the resulting winrate without claiming the move is
/// never played).
fn add_selfatari(board: &CfgBoard, cfg: &SearchConfig, pt: Point, to_play: Color, visits: &mut u32) {
    if board.safe_to_play(pt, to_play) != Safety::SelfAtari {
        return;
    }
    let is_throw_in = board.captures_after_play(pt, to_play.opponent()).len() == 1 && board.liberties_after_play(pt, to_play).0 <= 1;
    if !is_throw_in {
        *visits += cfg.prior_selfatari_visits;
    }
}

/// 3x3 pattern match: adds to both wins and visits, scaled by the
/// compiled pattern's weight and, when available, the large-pattern
/// store's probability at this point.
fn add_pattern(board: &CfgBoard, cfg: &SearchConfig, large: Option<&LargePatternStore>, pt: Point, to_play: Color, visits: &mut u32, wins: &mut u32) {
    let w = pat3_weight(board, pt);
    if w > 0 {
        let amount = cfg.prior_pat3_weight * w as u32 / 16;
        bump(visits, wins, amount.max(1));
    }
    if let Some(store) = large {
        let p = store.probability(board, pt, to_play);
        if p > 0.0 {
            bump(visits, wins, (p.sqrt() * cfg.prior_pat3_weight as f64) as u32);
        }
    }
}

/// Proximity to the last move, via CFG distance (both wins and visits).
fn add_proximity(cfg: &SearchConfig, cfg_distances: &Option<Box<[i32]>>, pt: Point, visits: &mut u32, wins: &mut u32) {
    let Some(map) = cfg_distances else { return };
    let dist = map[pt];
    if dist >= 1 && (dist as usize) <= cfg.prior_cfg_distance.len() {
        bump(visits, wins, cfg.prior_cfg_distance[(dist - 1) as usize]);
    }
}

/// Empty-area / line-height bonus: isolated 1st/2nd line moves are
/// suspicious (visits only), 3rd line moves in an empty area are fine
/// (both wins and visits), per the teacher's `line_height`/`empty_area`.
fn add_empty_area(board: &CfgBoard, cfg: &SearchConfig, pt: Point, visits: &mut u32, wins: &mut u32) {
    let height = line_height(pt);
    if height > 2 {
        return;
    }
    if !is_empty_area(board, pt, 3) {
        return;
    }
    *visits += cfg.prior_empty_area;
    if height == 2 {
        *wins += cfg.prior_empty_area;
    }
    if is_corner_and_surrounded(board, pt) {
        *visits += cfg.prior_empty_area;
    }
}

/// 0-indexed distance from the nearest edge (0 = first line).
fn line_height(pt: Point) -> usize {
    let row = pt / W;
    let col = pt % W;
    let row_dist = row.min(N + 1 - row);
    let col_dist = col.min(N + 1 - col);
    row_dist.min(col_dist).saturating_sub(1)
}

fn is_corner_and_surrounded(board: &CfgBoard, pt: Point) -> bool {
    if line_height(pt) != 0 {
        return false;
    }
    let row = pt / W;
    let col = pt % W;
    let near_row_edge = row <= 3 || row >= N - 2;
    let near_col_edge = col <= 3 || col >= N - 2;
    near_row_edge && near_col_edge && (board.black_n8[pt] + board.white_n8[pt]) >= 2
}

/// No stones of either color within `dist` steps of `pt`, walking the full
/// 8-neighborhood (board.rs::neighbors8), matching the teacher's
/// `empty_area` (mcts.rs), which walks `all_neighbors`.
fn is_empty_area(board: &CfgBoard, pt: Point, dist: usize) -> bool {
    if dist == 0 {
        return true;
    }
    for n in neighbors8(pt) {
        match board.slot(n) {
            Slot::Stone(_) => return false,
            Slot::Empty if dist > 1 && !is_empty_area(board, n, dist - 1) => return false,
            _ => {}
        }
    }
    true
}

/// Breadth-first Common Fate Graph distance map from `start`: stepping onto
/// a stone of the same color as the point just left costs 0, anything else
/// costs 1. Mirrors `mcts.rs::compute_cfg_distances`, which walks the full
/// 8-neighborhood (`all_neighbors`), not just orthogonal neighbors.
fn cfg_distance_map(board: &CfgBoard, start: Point) -> Box<[i32]> {
    let mut dist = vec![-1i32; BOARDSIZE].into_boxed_slice();
    let mut queue = Vec::with_capacity(BOARDSIZE);
    dist[start] = 0;
    queue.push(start);
    let mut head = 0;
    while head < queue.len() {
        let pt = queue[head];
        head += 1;
        for n in neighbors8(pt) {
            if board.slot(n) == Slot::Out {
                continue;
            }
            let same_group = match (board.slot(pt), board.slot(n)) {
                (Slot::Stone(a), Slot::Stone(b)) => a == b,
                _ => false,
            };
            let new_dist = if same_group { dist[pt] } else { dist[pt] + 1 };
            if dist[n] < 0 || new_dist < dist[n] {
                dist[n] = new_dist;
                queue.push(n);
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_coord;

    #[test]
    fn empty_board_yields_every_non_eye_point_as_candidate() {
        let board = CfgBoard::new();
        let cfg = SearchConfig::default();
        let moves = compute_priors(&board, &cfg, None);
        assert_eq!(moves.len(), N * N);
        assert!(moves.windows(2).all(|w| w[0].point < w[1].point));
    }

    #[test]
    fn own_eye_is_never_a_candidate() {
        let mut board = CfgBoard::new();
        for n in ["D4", "F4", "E3", "E5"] {
            board.play(parse_coord(n).unwrap(), Color::Black).unwrap();
        }
        let cfg = SearchConfig::default();
        let moves = compute_priors(&board, &cfg, None);
        let e4 = parse_coord("E4").unwrap();
        assert!(moves.iter().all(|m| m.point != e4));
    }

    #[test]
    fn capturing_move_outweighs_the_even_baseline() {
        let mut board = CfgBoard::new();
        board.play(parse_coord("E5").unwrap(), Color::White).unwrap();
        board.play(parse_coord("D5").unwrap(), Color::Black).unwrap();
        board.play(parse_coord("F9").unwrap(), Color::White).unwrap(); // filler
        board.play(parse_coord("F5").unwrap(), Color::Black).unwrap();
        board.play(parse_coord("G9").unwrap(), Color::White).unwrap(); // filler
        board.play(parse_coord("E4").unwrap(), Color::Black).unwrap();
        let cfg = SearchConfig::default();
        let moves = compute_priors(&board, &cfg, None);
        let e6 = parse_coord("E6").unwrap();
        let capturing = moves.iter().find(|m| m.point == e6).unwrap();
        assert!(capturing.visits > cfg.prior_even_visits);
    }
}
