//! UCT search: outer loop, per-simulation descent/expansion/playout/
//! backprop (§4.7).
//!
//! Grounded on `mcts.rs`'s `tree_descend`/`rave_urgency`/`tree_update`/
//! `tree_search` for the shape of the descend-expand-playout-backprop loop
//! and the RAVE-beta formula, generalized from a single-threaded owned
//! tree to the transposition-table-backed, multi-worker design (§5). The
//! worker-pool idiom (persistent threads, an `AtomicBool` stop flag,
//! `crossbeam_utils::Backoff` in the idle loop) is grounded on
//! `Chicoryn-dream-go/src/libdg_mcts/pool/pool.rs`'s `Pool`/`Worker` split.

use crate::board::{CfgBoard, Color, Point};
use crate::config::SearchConfig;
use crate::constants::{MAX_GAME_LEN, PASS_MOVE, RESIGN_MOVE};
use crate::patterns::{LargePatternStore, Pat3Store};
use crate::playout;
use crate::priors::compute_priors;
use crate::scoring;
use crate::transposition::TranspositionTable;
use crate::tree::{PlayEdge, TreeNode};
use crossbeam_utils::Backoff;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// How many ancestor positions back superko checks against (§4.7).
const SUPERKO_HISTORY: usize = 6;

struct DescentStep {
    node: Arc<TreeNode>,
    edge_idx: usize,
    mover: Color,
    mv: Point,
}

/// A completed simulation: the final board (for owner/criticality
/// sampling), its Black-relative score, and the path walked for backprop.
struct Simulation {
    final_board: CfgBoard,
    score_half_points: i32,
    path: Vec<DescentStep>,
}

/// One simulation: clone, descend, (maybe) expand, playout.
fn simulate(root_board: &CfgBoard, table: &TranspositionTable, cfg: &SearchConfig, pat3: &Pat3Store, large: Option<&LargePatternStore>, rng: &mut fastrand::Rng) -> Option<Simulation> {
    let mut board = root_board.clone();
    let mut node = table.lookup_or_create(&board, true)?;
    let mut path = Vec::new();
    let mut ancestor_hashes = vec![board.zobrist_hash];
    let mut hint: Option<Point> = None;

    loop {
        if board.passes_in_a_row >= 2 || path.len() >= MAX_GAME_LEN {
            break;
        }

        let just_expanded = node.mark_visited();
        if just_expanded {
            let priors = compute_priors(&board, cfg, large);
            node.lock().expand(priors);
        }

        let parent_n: u32 = node.lock().plays.iter().map(|e| e.mc_n).sum();
        let mut state = node.lock();
        if state.plays.is_empty() {
            drop(state);
            break; // leaf still unexpanded: fall through to a playout
        }

        let chosen_idx = hint
            .and_then(|h| state.edge_index(h))
            .unwrap_or_else(|| select_edge(cfg, parent_n, &state.plays, rng));
        state.plays[chosen_idx].apply_virtual_loss();
        let mv = state.plays[chosen_idx].mv;
        hint = state.plays[chosen_idx].lgrf1_reply;
        drop(state);

        let mover = board.to_play;
        if mv == PASS_MOVE {
            board.pass();
        } else if board.play(mv, mover).is_err() {
            // Priors are not a perfect legality oracle under a stale
            // transposition hit; treat as a pass rather than panicking.
            board.pass();
        }

        if ancestor_hashes.len() > SUPERKO_HISTORY && ancestor_hashes[ancestor_hashes.len() - SUPERKO_HISTORY..].contains(&board.zobrist_hash) {
            path.push(DescentStep { node: node.clone(), edge_idx: chosen_idx, mover, mv });
            // Superko violation: the mover loses outright.
            let score = if mover == Color::Black { -1 } else { 1 };
            return Some(Simulation { final_board: board, score_half_points: score, path });
        }
        ancestor_hashes.push(board.zobrist_hash);

        path.push(DescentStep { node: node.clone(), edge_idx: chosen_idx, mover, mv });

        let at_root = false;
        match table.lookup_or_create(&board, at_root) {
            Some(next) => node = next,
            None => break, // table full mid-descent: fall back to a playout here
        }
    }

    if board.passes_in_a_row >= 2 {
        let score = scoring::score_board(&board);
        Some(Simulation { final_board: board, score_half_points: score, path })
    } else {
        let playout_start_to_play = board.to_play;
        let result = playout::mcplayout(board, cfg, pat3, rng);
        let black_relative = if playout_start_to_play == Color::Black { result.score_half_points } else { -result.score_half_points };
        Some(Simulation { final_board: result.final_board, score_half_points: black_relative, path })
    }
}

fn select_edge(cfg: &SearchConfig, parent_n: u32, plays: &[PlayEdge], rng: &mut fastrand::Rng) -> usize {
    let unvisited: Vec<usize> = plays.iter().enumerate().filter(|(_, e)| e.mc_n == 0).map(|(i, _)| i).collect();
    if !unvisited.is_empty() {
        return unvisited[rng.usize(..unvisited.len())];
    }
    let mut best_score = f64::NEG_INFINITY;
    let mut ties = Vec::new();
    for (i, e) in plays.iter().enumerate() {
        let score = edge_urgency(cfg, parent_n, e);
        if score > best_score {
            best_score = score;
            ties.clear();
            ties.push(i);
        } else if score == best_score {
            ties.push(i);
        }
    }
    ties[rng.usize(..ties.len())]
}

/// UCB1-TUNED + RAVE, criticality-adjusted, combined urgency (§4.7).
fn edge_urgency(cfg: &SearchConfig, parent_n: u32, edge: &PlayEdge) -> f64 {
    let mc_n = edge.mc_n as f64;
    let mc_q = edge.mc_q();
    let amaf_n = edge.amaf_n as f64;
    let beta = amaf_n / (mc_n + amaf_n + mc_n * amaf_n * 4.0 * cfg.amaf_b * cfg.amaf_b);

    let criticality = edge.owner_winning - (2.0 * edge.color_owning * mc_q - edge.color_owning - mc_q + 1.0);
    let amaf_q_adjusted = if edge.mc_n > cfg.criticality_mc_n_threshold { (edge.amaf_q() + criticality).clamp(0.0, 1.0) } else { edge.amaf_q() };

    let q_combined = (1.0 - beta) * mc_q + beta * amaf_q_adjusted;

    let parent_n = (parent_n.max(1)) as f64;
    let ln_parent = parent_n.ln().max(0.0);
    let variance_term = (ln_parent / mc_n).sqrt();
    let tuned = (0.25f64).min(mc_q - mc_q * mc_q + variance_term);
    let uct = cfg.uct_c * ((ln_parent / mc_n) * tuned).sqrt();

    q_combined + uct
}

/// Winner of a finished game given the Black-relative score, `None` for an
/// exact tie (scored as "no bonus" on either side during backprop).
fn winner_of(score_half_points: i32) -> Option<Color> {
    match score_half_points.cmp(&0) {
        std::cmp::Ordering::Greater => Some(Color::Black),
        std::cmp::Ordering::Less => Some(Color::White),
        std::cmp::Ordering::Equal => None,
    }
}

/// Backprop (§4.7 step 4): undo each edge's virtual loss, record the real
/// mc/amaf outcome, update the owner/color-owning running means every
/// sibling edge's criticality term reads, and refresh LGRF1 hints.
fn backprop(sim: &Simulation) {
    let winner = winner_of(sim.score_half_points);
    for step in &sim.path {
        let own_color = step.mover;
        let mut state = step.node.lock();
        {
            let edge = &mut state.plays[step.edge_idx];
            edge.undo_virtual_loss();
            edge.record_mc(winner == Some(step.mover));
        }
        for e in state.plays.iter_mut() {
            let credited = Some(own_color) == winner;
            e.record_amaf(credited);

            let owner = scoring::owner_at(&sim.final_board, e.mv);
            let owner_winning_sample = if owner == winner { 1.0 } else { 0.0 };
            let color_owning_sample = if owner == Some(own_color) { 1.0 } else { 0.0 };
            update_running_mean(&mut e.owner_winning, owner_winning_sample, e.amaf_n);
            update_running_mean(&mut e.color_owning, color_owning_sample, e.amaf_n);
        }
    }
    for i in 0..sim.path.len().saturating_sub(1) {
        let next_mover_won = winner == Some(sim.path[i + 1].mover);
        let mut state = sim.path[i].node.lock();
        let edge = &mut state.plays[sim.path[i].edge_idx];
        edge.lgrf1_reply = if next_mover_won { Some(sim.path[i + 1].mv) } else { None };
    }
}

fn update_running_mean(mean: &mut f64, sample: f64, count_after_update: u32) {
    let n = count_after_update.max(1) as f64;
    *mean += (sample - *mean) / n;
}

/// Outcome of a completed search: the chosen move and its empirical
/// quality, for §4.8's move-selection and resign reporting.
#[derive(Debug, Clone, Copy)]
pub struct SearchOutcome {
    pub best_move: Point,
    pub mc_q: f64,
    pub simulations: u64,
}

/// Run the outer loop (§4.7) until `deadline`, memory exhaustion, or a
/// clear win-rate outside `cfg.clear_winrate_band`, then select a move by
/// §4.8's `mc_q` quality with resign-threshold reporting.
pub fn evaluate_position(root_board: &CfgBoard, table: &TranspositionTable, cfg: &SearchConfig, pat3: &Pat3Store, large: Option<&LargePatternStore>, deadline: Instant) -> SearchOutcome {
    let root = table.lookup_or_create(root_board, true).unwrap();
    if !root.lock().is_expanded() {
        let priors = compute_priors(root_board, cfg, large);
        root.lock().expand(priors);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let simulations = Arc::new(AtomicU64::new(0));
    let worker_count = cfg.worker_threads.max(1);

    std::thread::scope(|scope| {
        for worker_seed in 0..worker_count {
            let stop = stop.clone();
            let simulations = simulations.clone();
            let root = root.clone();
            scope.spawn(move || {
                let mut rng = fastrand::Rng::with_seed(0xC0FFEE ^ worker_seed as u64);
                let backoff = Backoff::new();
                while !stop.load(Ordering::Relaxed) {
                    for _ in 0..cfg.batch_size / worker_count.max(1) {
                        if let Some(sim) = simulate(root_board, table, cfg, pat3, large, &mut rng) {
                            backprop(&sim);
                        }
                        simulations.fetch_add(1, Ordering::Relaxed);
                    }
                    if Instant::now() >= deadline || table.is_over_capacity() {
                        stop.store(true, Ordering::Relaxed);
                    } else if let Some(winrate) = root_winrate(&root) {
                        if winrate < cfg.clear_winrate_band.0 || winrate > cfg.clear_winrate_band.1 {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    backoff.spin();
                }
            });
        }
    });

    select_move(&root, cfg, simulations.load(Ordering::Relaxed))
}

fn root_winrate(root: &Arc<TreeNode>) -> Option<f64> {
    let state = root.lock();
    let best = state.plays.iter().max_by(|a, b| a.mc_n.cmp(&b.mc_n))?;
    if best.mc_n == 0 {
        None
    } else {
        Some(best.mc_q())
    }
}

/// §4.8: pick the edge with the highest `mc_q`, breaking ties at random;
/// report a resignation if its quality never cleared the threshold.
fn select_move(root: &Arc<TreeNode>, cfg: &SearchConfig, simulations: u64) -> SearchOutcome {
    let state = root.lock();
    let mut best_q = f64::NEG_INFINITY;
    let mut tied: Vec<&PlayEdge> = Vec::new();
    for edge in &state.plays {
        let q = edge.mc_q();
        if q > best_q {
            best_q = q;
            tied.clear();
            tied.push(edge);
        } else if q == best_q {
            tied.push(edge);
        }
    }
    let mut rng = fastrand::Rng::new();
    match tied.get(rng.usize(..tied.len().max(1))).or_else(|| tied.first()) {
        Some(best) if best.mc_q() >= cfg.resign_threshold => SearchOutcome { best_move: best.mv, mc_q: best.mc_q(), simulations },
        Some(best) => SearchOutcome { best_move: RESIGN_MOVE, mc_q: best.mc_q(), simulations },
        None => SearchOutcome { best_move: PASS_MOVE, mc_q: 0.5, simulations },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transposition::TranspositionTable;
    use std::time::Duration;

    fn quick_config() -> SearchConfig {
        SearchConfig {
            batch_size: 32,
            worker_threads: 2,
            max_allocated_states: 4096,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn evaluate_position_returns_a_board_point_on_an_empty_board() {
        let board = CfgBoard::new();
        let cfg = quick_config();
        let table = TranspositionTable::new(cfg.max_allocated_states, cfg.expand_after_visits);
        let pat3 = Pat3Store::default();
        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = evaluate_position(&board, &table, &cfg, &pat3, None, deadline);
        assert!(outcome.simulations > 0);
        assert_ne!(outcome.best_move, RESIGN_MOVE);
    }

    #[test]
    fn single_simulation_updates_root_statistics() {
        let board = CfgBoard::new();
        let cfg = quick_config();
        let table = TranspositionTable::new(cfg.max_allocated_states, cfg.expand_after_visits);
        let pat3 = Pat3Store::default();
        let root = table.lookup_or_create(&board, true).unwrap();
        root.lock().expand(compute_priors(&board, &cfg, None));
        let mut rng = fastrand::Rng::with_seed(3);
        let sim = simulate(&board, &table, &cfg, &pat3, None, &mut rng).unwrap();
        backprop(&sim);
        let total_visits: u32 = root.lock().plays.iter().map(|e| e.mc_n).sum();
        assert!(total_visits > 0);
    }
}
