//! Expectimax search policy for 2048.
//!
//! [`Expectimax`] alternates max nodes (the player's legal moves) with chance
//! nodes (a 2 or 4 spawning in any empty cell) down to a fixed depth, where
//! boards are scored by a corner-weighted heuristic. Heuristic values are
//! memoized per board for the lifetime of the searcher.
//!
//! [`Expectimax::choose_move`] searches 2 plies and re-searches at 3 plies
//! when the board is already valuable and the two best moves are too close
//! to call.
//!
//! Quick start
//! ```
//! use packed_2048::engine::Board;
//! use packed_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::initial(&mut rng);
//!
//! let mut ex = Expectimax::new();
//! let dir = ex.choose_move(b0);
//! assert!(b0.legal_moves().contains(&dir));
//! ```

use crate::engine::Move;

mod heuristic;
mod search;

pub use search::Expectimax;

/// Probability that a spawned tile is a 2 (exponent 1).
pub const TWO_PROBABILITY: f64 = 0.9;
/// Probability that a spawned tile is a 4 (exponent 2).
pub const FOUR_PROBABILITY: f64 = 0.1;

/// Configurable knobs for Expectimax. Defaults give the 2-ply search with
/// 3-ply escalation.
///
/// - `base_depth`: plies searched for every decision.
/// - `escalated_depth`: plies searched when the decision is ambiguous.
/// - `escalation_min_value`: the best 2-ply value must exceed this to escalate.
/// - `escalation_ratio`: escalate when the runner-up's gain over the current
///   heuristic is more than this fraction of the best move's gain.
/// - `cache_limit`: clear the heuristic cache once it holds this many boards
///   (`None` lets it grow without bound).
/// - `prob_cutoff`: chance nodes reached with a cumulative probability below
///   this are scored by the heuristic instead of being expanded. Off by default.
/// - `transposition`: reuse chance-node values within one decision, keyed by
///   afterstate and remaining depth. Off by default. Exact on its own; with a
///   `prob_cutoff` a reused value may have been computed along a more or less
///   likely path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectimaxConfig {
    pub base_depth: u32,
    pub escalated_depth: u32,
    pub escalation_min_value: f64,
    pub escalation_ratio: f64,
    pub cache_limit: Option<usize>,
    pub prob_cutoff: Option<f64>,
    pub transposition: bool,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            base_depth: 2,
            escalated_depth: 3,
            escalation_min_value: 2000.0,
            escalation_ratio: 0.75,
            cache_limit: None,
            prob_cutoff: None,
            transposition: false,
        }
    }
}

/// Expected value of one legal root move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
}

/// Result of searching one board to a fixed depth.
///
/// `best` is `None` at depth 0 (where `value` is the heuristic) and on
/// terminal boards (where `value` is 0). `branches` lists every legal move
/// in [`Move::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: Option<Move>,
    pub value: f64,
    pub branches: Vec<BranchEval>,
}

impl SearchOutcome {
    /// Second-highest branch value, if there are at least two legal moves.
    pub fn runner_up(&self) -> Option<f64> {
        let mut values: Vec<f64> = self.branches.iter().map(|branch| branch.ev).collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values.get(1).copied()
    }
}

/// Basic search stats for a single decision.
///
/// `peak_nodes` is kept across calls until [`Expectimax::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
    pub cache_hits: u64,
    /// Chance nodes cut off by `prob_cutoff`.
    pub pruned: u64,
    /// Chance nodes answered from the transposition table.
    pub table_hits: u64,
    pub escalated: bool,
}
