use std::collections::HashMap;

use log::{debug, trace};

use crate::engine::{self, Board, Move};

use super::heuristic::corner_score;
use super::{BranchEval, ExpectimaxConfig, SearchOutcome, SearchStats, FOUR_PROBABILITY, TWO_PROBABILITY};

/// Value of a board with no legal moves.
const TERMINAL_VALUE: f64 = 0.0;

/// Single-threaded Expectimax search with a memoized heuristic.
///
/// The heuristic cache is keyed by the exact board and lives as long as the
/// searcher, so reuse one `Expectimax` across the moves of a game. The
/// optional transposition table only lives for one decision.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    cache: HashMap<Board, u64>,
    table: HashMap<(Board, u32), f64>,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    /// Panics if `cfg.base_depth` is 0, since a 0-ply search recommends no move.
    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        assert!(cfg.base_depth > 0, "base search depth must be at least 1");
        engine::new();
        Self { cfg, cache: HashMap::new(), table: HashMap::new(), stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Memoized corner heuristic for `board`.
    pub fn heuristic(&mut self, board: Board) -> u64 {
        if let Some(&score) = self.cache.get(&board) {
            self.stats.cache_hits += 1;
            return score;
        }
        let score = corner_score(board);
        if self.cfg.cache_limit.is_some_and(|limit| self.cache.len() >= limit) {
            trace!("heuristic cache full at {} boards, clearing", self.cache.len());
            self.cache.clear();
        }
        self.cache.insert(board, score);
        score
    }

    /// Search `board` to `depth` plies and report the value of every legal move.
    ///
    /// ```
    /// use packed_2048::engine::{Board, Move};
    /// use packed_2048::expectimax::Expectimax;
    /// let b = Board::from_grid([[1, 1, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// let outcome = Expectimax::new().search(b, 1);
    /// assert!(outcome.branches.iter().all(|branch| branch.dir != Move::Up));
    /// assert_eq!(outcome.branches.len(), 3);
    /// assert!(outcome.best.is_some());
    /// ```
    pub fn search(&mut self, board: Board, depth: u32) -> SearchOutcome {
        self.begin();
        let outcome = self.search_root(board, depth);
        self.finish();
        outcome
    }

    /// Pick a move for `board`, deepening the search on close calls.
    ///
    /// Panics if `board` has no legal moves.
    pub fn choose_move(&mut self, board: Board) -> Move {
        self.begin();
        let current = self.heuristic(board) as f64;
        let shallow = self.search_root(board, self.cfg.base_depth);
        let Some(mut choice) = shallow.best else {
            panic!("choose_move called on terminal board {board:?}");
        };
        debug!("heuristic {current} at {board:?}, branches {:?}", shallow.branches);
        if shallow.branches.len() > 1 && self.should_escalate(current, &shallow) {
            self.stats.escalated = true;
            let deep = self.search_root(board, self.cfg.escalated_depth);
            debug!(
                "escalated to depth {}: {:?} -> {:?}",
                self.cfg.escalated_depth, shallow.best, deep.best
            );
            if let Some(dir) = deep.best {
                choice = dir;
            }
        }
        self.finish();
        choice
    }

    /// Statistics collected from the last call to [`Self::choose_move`] or
    /// [`Self::search`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    /// Number of boards in the heuristic cache.
    #[inline]
    pub fn cache_len(&self) -> usize { self.cache.len() }

    pub fn clear_cache(&mut self) { self.cache.clear(); }

    fn begin(&mut self) {
        self.table.clear();
        self.stats = SearchStats { peak_nodes: self.stats.peak_nodes, ..SearchStats::default() };
    }

    fn finish(&mut self) {
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.stats.nodes);
    }

    fn should_escalate(&self, current: f64, shallow: &SearchOutcome) -> bool {
        let Some(second) = shallow.runner_up() else { return false };
        let best_gain = (shallow.value - current).max(1.0);
        let second_gain = (second - current).max(1.0);
        shallow.value > self.cfg.escalation_min_value
            && second_gain / best_gain > self.cfg.escalation_ratio
    }

    fn search_root(&mut self, board: Board, depth: u32) -> SearchOutcome {
        self.stats.nodes += 1;
        if depth == 0 {
            let value = self.heuristic(board) as f64;
            return SearchOutcome { best: None, value, branches: Vec::new() };
        }
        let mut outcome = SearchOutcome { best: None, value: TERMINAL_VALUE, branches: Vec::with_capacity(4) };
        for (dir, afterstate) in board.legal_shifts() {
            let ev = self.evaluate_chance(afterstate, depth, 1.0);
            if outcome.best.is_none() || ev > outcome.value {
                outcome.best = Some(dir);
                outcome.value = ev;
            }
            outcome.branches.push(BranchEval { dir, ev });
        }
        outcome
    }

    fn evaluate_max(&mut self, board: Board, depth: u32, prob: f64) -> f64 {
        self.stats.nodes += 1;
        if depth == 0 {
            return self.heuristic(board) as f64;
        }
        let mut best: Option<f64> = None;
        for (_, afterstate) in board.legal_shifts() {
            let ev = self.evaluate_chance(afterstate, depth, prob);
            best = Some(best.map_or(ev, |b| b.max(ev)));
        }
        best.unwrap_or(TERMINAL_VALUE)
    }

    /// Average over empty cells of the 2/4-weighted values one ply down.
    ///
    /// `prob` is the chance of reaching `afterstate` from the root.
    fn evaluate_chance(&mut self, afterstate: Board, depth: u32, prob: f64) -> f64 {
        if self.cfg.prob_cutoff.is_some_and(|cutoff| prob < cutoff) {
            self.stats.pruned += 1;
            return self.heuristic(afterstate) as f64;
        }
        if self.cfg.transposition {
            if let Some(&score) = self.table.get(&(afterstate, depth)) {
                self.stats.table_hits += 1;
                return score;
            }
        }
        let empty = afterstate.count_empty();
        // A legal move always leaves an empty cell behind.
        debug_assert!(empty > 0, "afterstate {afterstate:?} has no empty cell");
        let cell_prob = prob / empty.max(1) as f64;
        let mut score = 0.0;
        for idx in afterstate.empty_cells() {
            score += TWO_PROBABILITY
                * self.evaluate_max(afterstate.with_cell(idx, 1), depth - 1, cell_prob * TWO_PROBABILITY);
            score += FOUR_PROBABILITY
                * self.evaluate_max(afterstate.with_cell(idx, 2), depth - 1, cell_prob * FOUR_PROBABILITY);
        }
        let score = score / empty.max(1) as f64;
        if self.cfg.transposition {
            self.table.insert((afterstate, depth), score);
        }
        score
    }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }
