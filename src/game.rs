//! Game loops on top of a [`Policy`]: one full game, or as many games as
//! fit in a time budget.

use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;

use crate::engine::{Board, Move};
use crate::policy::Policy;

/// Outcome of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameReport {
    pub final_board: Board,
    pub moves: u64,
    pub score: u64,
    pub highest_tile: u64,
}

/// Play one game from a fresh board until no move is legal or `max_moves`
/// is reached. `on_move` sees every move and the board after its spawn.
///
/// ```
/// use packed_2048::game::play_game;
/// use packed_2048::policy::RandomPolicy;
/// use rand::{rngs::StdRng, SeedableRng};
/// let mut policy = RandomPolicy::new(StdRng::seed_from_u64(1));
/// let mut rng = StdRng::seed_from_u64(2);
/// let report = play_game(&mut policy, &mut rng, None, |_, _| {});
/// assert!(report.final_board.is_terminal());
/// ```
pub fn play_game<P, R, F>(policy: &mut P, rng: &mut R, max_moves: Option<u64>, mut on_move: F) -> GameReport
where
    P: Policy + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(Move, Board),
{
    let mut board = Board::initial(rng);
    let mut moves = 0u64;
    while !board.is_terminal() {
        if max_moves.is_some_and(|limit| moves >= limit) {
            debug!("stopping {} game at move cap {moves}", policy.name());
            break;
        }
        let dir = policy.choose_move(board);
        board = board.make_move(dir, rng);
        moves += 1;
        on_move(dir, board);
    }
    GameReport { final_board: board, moves, score: board.score(), highest_tile: board.highest_tile() }
}

/// Totals over the games of one [`simulate_for`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationReport {
    pub games: u64,
    pub moves: u64,
    pub total_score: u64,
    pub best_score: u64,
    pub highest_tile: u64,
    pub elapsed: Duration,
}

impl SimulationReport {
    fn record(&mut self, game: &GameReport) {
        self.games += 1;
        self.moves += game.moves;
        self.total_score += game.score;
        self.best_score = self.best_score.max(game.score);
        self.highest_tile = self.highest_tile.max(game.highest_tile);
    }

    pub fn games_per_sec(&self) -> f64 { self.games as f64 / self.secs() }

    pub fn moves_per_sec(&self) -> f64 { self.moves as f64 / self.secs() }

    pub fn mean_score(&self) -> f64 {
        if self.games == 0 { 0.0 } else { self.total_score as f64 / self.games as f64 }
    }

    fn secs(&self) -> f64 { self.elapsed.as_secs_f64().max(1e-6) }
}

/// Start games back to back until `budget` has elapsed. A game in progress
/// when the budget runs out is played to the end.
pub fn simulate_for<P, R, F>(policy: &mut P, rng: &mut R, budget: Duration, mut on_game: F) -> SimulationReport
where
    P: Policy + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(&GameReport, &SimulationReport),
{
    let start = Instant::now();
    let mut report = SimulationReport::default();
    while start.elapsed() < budget {
        let game = play_game(policy, rng, None, |_, _| {});
        report.record(&game);
        report.elapsed = start.elapsed();
        on_game(&game, &report);
    }
    report.elapsed = start.elapsed();
    info!(
        "{} policy: {} games, {} moves in {:.2?}",
        policy.name(),
        report.games,
        report.moves,
        report.elapsed
    );
    report
}
