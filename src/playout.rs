//! Heavy playout policy: policy-driven random completion of a position to a
//! terminal score, with an AMAF trace and a precisely-invalidated legality
//! cache (§4.4).
//!
//! Grounded on `playout.rs`'s staged `choose_playout_move` (capture, then
//! pattern, then random, each gated by a skip probability) and its
//! `try_move_with_self_atari_check`/`choose_random_move` pair, generalized
//! to the full six-stage policy (save-group, nakade, capture, pattern,
//! random-legal, pass) and rebuilt on `fastrand` instead of the teacher's
//! `static mut` linear congruential generator, which is unsound once
//! playouts run on worker threads (§5).

use crate::board::{neighbors4, neighbors8, CfgBoard, Color, Point, Slot};
use crate::config::SearchConfig;
use crate::constants::{BOARD_IMAX, BOARD_IMIN, MAX_GAME_LEN};
use crate::patterns::Pat3Store;
use crate::scoring;
use crate::tactical;

const DIRTY: u8 = 1;
const LEGAL: u8 = 2;
const OPP_SAFE: u8 = 4;
const CAPTURES: u8 = 8;

/// Per-color legality cache (§4.4). One byte per position; `dirty` points
/// are recomputed lazily on next query and only the positions whose local
/// state actually changed are marked dirty on each play.
struct LegalityCache {
    bits: Box<[u8]>,
}

impl LegalityCache {
    fn new(size: usize) -> Self {
        LegalityCache { bits: vec![DIRTY; size].into_boxed_slice() }
    }

    fn refresh(&mut self, board: &CfgBoard, color: Color, pt: Point) -> u8 {
        if self.bits[pt] & DIRTY == 0 {
            return self.bits[pt];
        }
        let mut bits = 0u8;
        if board.can_play(pt, color, true) {
            bits |= LEGAL;
            let (_, captures) = board.liberties_after_play(pt, color);
            if !captures.is_empty() {
                bits |= CAPTURES;
            }
            if board.can_play(pt, color.opponent(), true) {
                bits |= OPP_SAFE;
            }
        }
        self.bits[pt] = bits;
        bits
    }

    /// Mark every point whose cached answer could have changed after a play
    /// at `pt` that captured `captured` as dirty: `pt` itself, its 8
    /// neighbors, the captured stones, their neighbors, and the liberties
    /// of the resulting group (§4.4).
    fn invalidate_after_play(&mut self, board: &CfgBoard, pt: Point, captured: &[Point]) {
        self.mark_dirty(pt);
        for n in neighbors8(pt) {
            self.mark_dirty(n);
        }
        for &c in captured {
            self.mark_dirty(c);
            for n in neighbors4(c) {
                self.mark_dirty(n);
            }
        }
        if let Some(gid) = board.group_of[pt] {
            if let Some(g) = board.group(gid) {
                for lib in g.liberties.iter() {
                    self.mark_dirty(lib);
                }
            }
        }
    }

    fn mark_dirty(&mut self, pt: Point) {
        self.bits[pt] |= DIRTY;
    }
}

/// Result of a Monte Carlo playout.
pub struct PlayoutResult {
    /// Terminal score in half-points, from the perspective of the color to
    /// play when the playout started.
    pub score_half_points: i32,
    /// AMAF trace: the color that first played at each position during the
    /// playout, if any.
    pub amaf: Box<[Option<Color>]>,
    /// The board at the point the playout stopped, for callers that need
    /// to sample final point ownership (e.g. criticality backprop).
    pub final_board: CfgBoard,
}

/// Run a playout to completion from `board` (consumed by value — callers
/// clone their CFG board before invoking this).
pub fn mcplayout(mut board: CfgBoard, cfg: &SearchConfig, patterns: &Pat3Store, rng: &mut fastrand::Rng) -> PlayoutResult {
    let start_to_play = board.to_play;
    let start_move = board.move_number;
    let mut amaf: Box<[Option<Color>]> = vec![None; board.group_of.len()].into_boxed_slice();
    let mut cache_black = LegalityCache::new(board.group_of.len());
    let mut cache_white = LegalityCache::new(board.group_of.len());
    let depth_cap = MAX_GAME_LEN.min(board.empty_positions.len() * 3 + board.move_number + rng.usize(0..8));

    while board.passes_in_a_row < 2 && board.move_number - start_move < depth_cap {
        let color = board.to_play;
        let cache = if color == Color::Black { &mut cache_black } else { &mut cache_white };
        let mv = choose_playout_move(&board, color, cfg, patterns, rng, cache);
        match mv {
            Some(pt) => {
                if amaf[pt].is_none() {
                    amaf[pt] = Some(color);
                }
                let outcome = board.play(pt, color).expect("playout chose a move it validated as legal");
                cache_black.invalidate_after_play(&board, pt, &outcome.captured);
                cache_white.invalidate_after_play(&board, pt, &outcome.captured);
                if mercy_triggered(&board, cfg) {
                    break;
                }
            }
            None => board.pass(),
        }
    }

    let black_relative_score = scoring::score_board(&board);
    let score_half_points = if start_to_play == Color::Black { black_relative_score } else { -black_relative_score };

    PlayoutResult { score_half_points, amaf, final_board: board }
}

fn mercy_triggered(board: &CfgBoard, cfg: &SearchConfig) -> bool {
    scoring::score_board(board).unsigned_abs() as i32 > cfg.mercy_threshold
}

fn choose_playout_move(
    board: &CfgBoard,
    color: Color,
    cfg: &SearchConfig,
    patterns: &Pat3Store,
    rng: &mut fastrand::Rng,
    cache: &mut LegalityCache,
) -> Option<Point> {
    if cfg.playout_prob_save_group.sample(rng) {
        if let Some(mv) = stage_save_group(board, color, rng, cache) {
            return Some(mv);
        }
    }
    if cfg.playout_prob_nakade.sample(rng) {
        if let Some(mv) = stage_nakade(board, color, rng, cache) {
            return Some(mv);
        }
    }
    if cfg.playout_prob_capture.sample(rng) {
        if let Some(mv) = stage_capture(board, color, rng, cache) {
            return Some(mv);
        }
    }
    if cfg.playout_prob_pattern.sample(rng) {
        if let Some(mv) = stage_pattern(board, color, patterns, rng, cache) {
            return Some(mv);
        }
    }
    stage_random_legal(board, color, cfg, rng, cache)
}

/// Points near the last two plies, teacher-style (`make_list_last_moves_neighbors`).
fn last_move_neighborhood(board: &CfgBoard) -> Vec<Point> {
    let mut points = Vec::with_capacity(20);
    for &last in &[board.last_played, board.last_played2] {
        if last == crate::constants::PASS_MOVE {
            continue;
        }
        if !points.contains(&last) {
            points.push(last);
        }
        for n in neighbors8(last) {
            if board.slot(n) != Slot::Out && !points.contains(&n) {
                points.push(n);
            }
        }
    }
    points
}

fn is_legal_and_not_selfatari(board: &CfgBoard, pt: Point, color: Color, reject_prob: crate::config::Prob128, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> bool {
    let bits = cache.refresh(board, color, pt);
    if bits & LEGAL == 0 {
        return false;
    }
    if reject_prob.sample(rng) {
        let (libs, captures) = board.liberties_after_play(pt, color);
        let is_throwin = !captures.is_empty();
        if libs <= 1 && !is_throwin {
            return false;
        }
    }
    true
}

fn stage_save_group(board: &CfgBoard, color: Color, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> Option<Point> {
    if board.last_played == crate::constants::PASS_MOVE {
        return None;
    }
    let mut candidates: Vec<(Point, u32)> = Vec::new();
    for n in neighbors4(board.last_played) {
        if let Some(gid) = board.group_of[n] {
            let g = board.group(gid).unwrap();
            if g.color == color && g.lib_count == 1 {
                if let Some(lib) = g.liberties.iter().next() {
                    if !is_legal_and_not_selfatari(board, lib, color, crate::config::Prob128::NEVER, rng, cache) {
                        continue;
                    }
                    let (_, captures) = board.liberties_after_play(lib, color);
                    let mut weight = g.stones.len() as u32 + g.lib_count;
                    if !captures.is_empty() {
                        // a capture that also puts an enemy group in atari counts double
                        weight *= 2;
                    }
                    if !candidates.iter().any(|&(p, _)| p == lib) {
                        candidates.push((lib, weight));
                    }
                }
            }
        }
    }
    weighted_choice(rng, &candidates)
}

fn stage_nakade(board: &CfgBoard, color: Color, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> Option<Point> {
    let mut candidates: Vec<(Point, u32)> = Vec::new();
    for pt in BOARD_IMIN..BOARD_IMAX {
        if board.slot(pt) != Slot::Empty {
            continue;
        }
        let size = tactical::is_nakade(board, pt);
        if size == 0 {
            continue;
        }
        if !is_legal_and_not_selfatari(board, pt, color, crate::config::Prob128::NEVER, rng, cache) {
            continue;
        }
        candidates.push((pt, size));
    }
    weighted_choice(rng, &candidates)
}

fn stage_capture(board: &CfgBoard, color: Color, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> Option<Point> {
    let mut candidates: Vec<Point> = Vec::new();
    for pt in last_move_neighborhood(board) {
        if board.slot(pt) != Slot::Empty {
            continue;
        }
        let bits = cache.refresh(board, color, pt);
        if bits & LEGAL == 0 || bits & CAPTURES == 0 {
            continue;
        }
        if !is_legal_and_not_selfatari(board, pt, color, crate::config::Prob128(64), rng, cache) {
            continue;
        }
        candidates.push(pt);
    }
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.usize(0..candidates.len())])
}

fn stage_pattern(board: &CfgBoard, color: Color, patterns: &Pat3Store, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> Option<Point> {
    let mut candidates: Vec<(Point, u32)> = Vec::new();
    for pt in last_move_neighborhood(board) {
        if board.slot(pt) != Slot::Empty {
            continue;
        }
        let weight = patterns.weight(board.hash3x3(pt));
        if weight == 0 {
            continue;
        }
        if !is_legal_and_not_selfatari(board, pt, color, crate::config::Prob128(115), rng, cache) {
            continue;
        }
        candidates.push((pt, weight as u32));
    }
    weighted_choice(rng, &candidates)
}

fn stage_random_legal(board: &CfgBoard, color: Color, cfg: &SearchConfig, rng: &mut fastrand::Rng, cache: &mut LegalityCache) -> Option<Point> {
    let empties = &board.empty_positions;
    if empties.is_empty() {
        return None;
    }
    let start = rng.usize(0..empties.len());
    for i in 0..empties.len() {
        let pt = empties[(start + i) % empties.len()];
        if tactical::is_eye(board, pt, color) {
            continue;
        }
        let bits = cache.refresh(board, color, pt);
        if bits & LEGAL == 0 {
            continue;
        }
        let (libs, captures) = board.liberties_after_play(pt, color);
        let is_throwin = !captures.is_empty();
        if libs <= 1 && !is_throwin {
            if cfg.playout_prob_reject_selfatari_random.sample(rng) {
                continue;
            }
        }
        return Some(pt);
    }
    None
}

fn weighted_choice(rng: &mut fastrand::Rng, candidates: &[(Point, u32)]) -> Option<Point> {
    let total: u32 = candidates.iter().map(|&(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut pick = rng.u32(0..total);
    for &(pt, w) in candidates {
        if pick < w {
            return Some(pt);
        }
        pick -= w;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_coord;

    #[test]
    fn playout_terminates_on_empty_board() {
        let board = CfgBoard::new();
        let cfg = SearchConfig::default();
        let patterns = Pat3Store::load_from_str("").unwrap();
        let mut rng = fastrand::Rng::with_seed(7);
        let result = mcplayout(board, &cfg, &patterns, &mut rng);
        assert!(result.score_half_points.abs() < 10_000);
    }

    #[test]
    fn amaf_trace_records_first_occupant() {
        let mut board = CfgBoard::new();
        let pt = parse_coord("E5").unwrap();
        board.play(pt, Color::Black).unwrap();
        let cfg = SearchConfig::default();
        let patterns = Pat3Store::load_from_str("").unwrap();
        let mut rng = fastrand::Rng::with_seed(11);
        let result = mcplayout(board, &cfg, &patterns, &mut rng);
        assert_eq!(result.amaf[pt], Some(Color::Black));
    }
}
