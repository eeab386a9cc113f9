//! Tunable search and playout parameters.
//!
//! Design Notes call out that the reference engine's "variadic
//! initialization of tunable parameters by name/type pairs" should become a
//! plain configuration record with named fields. `SearchConfig` is that
//! record: every constant below is a parameter, not a tuned reference
//! value, and callers are expected to override fields rather than add new
//! globals.

/// A probability expressed as a numerator out of 128, per the playout
/// policy's "each skip probability is a configurable parameter expressed in
/// 128ths".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prob128(pub u8);

impl Prob128 {
    pub const ALWAYS: Prob128 = Prob128(128);
    pub const NEVER: Prob128 = Prob128(0);

    /// Sample against this probability using the given source of randomness.
    #[inline]
    pub fn sample(self, rng: &mut fastrand::Rng) -> bool {
        rng.u8(0..128) < self.0
    }
}

/// Named configuration for a search. Cloned cheaply and shared read-only
/// across worker threads via `Arc`.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Target number of simulations dispatched per parallel batch.
    pub batch_size: usize,
    /// RAVE equivalence parameter (visits at which RAVE and MC trust each
    /// other equally).
    pub rave_equiv: f64,
    /// `b` constant in the criticality-adjusted RAVE beta formula.
    pub amaf_b: f64,
    /// UCT exploration constant `C`.
    pub uct_c: f64,
    /// Node is expanded once `expansion_delay` (initialized to this value
    /// and decremented per-visit) reaches -1.
    pub expand_after_visits: i32,
    /// `alpha` exponent applied to group size in priors (nakade/save/
    /// capture weight proportional to `group_size^alpha`).
    pub prior_group_size_alpha: f64,
    /// Base "even" prior visits per empty point considered during
    /// expansion (`V = E`, `W = E/2`).
    pub prior_even_visits: u32,
    /// Prior weight for a 3x3 pattern match.
    pub prior_pat3_weight: u32,
    /// Prior weight for proximity to the last move (index 0 = CFG distance
    /// 1, etc).
    pub prior_cfg_distance: [u32; 3],
    /// Prior visit penalty (anti-vote) for a self-atari, non-throw-in move.
    pub prior_selfatari_visits: u32,
    /// Prior bonus for moves in an empty area on the 1st/2nd/3rd line.
    pub prior_empty_area: u32,
    /// Minimum retained-candidate fraction of T below which a pass edge is
    /// inserted during expansion.
    pub prior_pass_candidate_fraction: f64,
    /// Probability (1/128ths) of consulting each playout policy stage.
    pub playout_prob_save_group: Prob128,
    pub playout_prob_nakade: Prob128,
    pub playout_prob_capture: Prob128,
    pub playout_prob_pattern: Prob128,
    /// Probability of rejecting a self-atari move found during the
    /// structured (non-random-fallback) playout stages.
    pub playout_prob_reject_selfatari_structured: Prob128,
    /// Probability of rejecting a self-atari move found by the random-legal
    /// fallback stage.
    pub playout_prob_reject_selfatari_random: Prob128,
    /// Winrate threshold below which the engine reports "no play".
    pub resign_threshold: f64,
    /// Score-difference threshold (in half-points) above which a playout is
    /// cut short ("mercy rule").
    pub mercy_threshold: i32,
    /// Upper bound on simulations allowed to run before the early win-rate
    /// stop check begins evaluating (expressed as a fraction of the overall
    /// time budget, per §5's "roughly one-third of the think time").
    pub early_stop_fraction: f64,
    /// `[min, max]` win-rate band outside which the outer search loop may
    /// stop early even with time remaining.
    pub clear_winrate_band: (f64, f64),
    /// Maximum number of tree nodes the transposition table will allocate.
    pub max_allocated_states: usize,
    /// Depth cap for ladder/kill/save tactical search, as a multiple of N.
    pub tactical_depth_factor: usize,
    /// Minimum `mc_n` on an edge before its AMAF estimate is adjusted by
    /// the criticality term (avoids folding in a noisy owner/color-owning
    /// estimate while an edge is still barely sampled).
    pub criticality_mc_n_threshold: u32,
    /// Target number of worker threads dispatching simulation batches.
    pub worker_threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            batch_size: 960,
            rave_equiv: 3500.0,
            amaf_b: 0.015,
            uct_c: 0.05,
            expand_after_visits: 8,
            prior_group_size_alpha: 1.24,
            prior_even_visits: 10,
            prior_pat3_weight: 10,
            prior_cfg_distance: [24, 22, 8],
            prior_selfatari_visits: 10,
            prior_empty_area: 10,
            prior_pass_candidate_fraction: 1.0 / 8.0,
            playout_prob_save_group: Prob128(128),
            playout_prob_nakade: Prob128(128),
            playout_prob_capture: Prob128(115), // ~0.9
            playout_prob_pattern: Prob128(122), // ~0.95
            playout_prob_reject_selfatari_structured: Prob128(115), // ~0.9
            playout_prob_reject_selfatari_random: Prob128(64), // 0.5
            resign_threshold: 0.2,
            mercy_threshold: 25 * 2,
            early_stop_fraction: 1.0 / 3.0,
            clear_winrate_band: (0.05, 0.95),
            max_allocated_states: 1 << 20,
            tactical_depth_factor: 3,
            criticality_mc_n_threshold: 20,
            worker_threads: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prob128_bounds_are_honest() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(Prob128::ALWAYS.sample(&mut rng));
        assert!(!Prob128::NEVER.sample(&mut rng));
    }

    #[test]
    fn default_config_has_sane_ranges() {
        let cfg = SearchConfig::default();
        assert!(cfg.resign_threshold > 0.0 && cfg.resign_threshold < 1.0);
        assert!(cfg.clear_winrate_band.0 < cfg.clear_winrate_band.1);
    }
}
