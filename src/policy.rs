//! Interchangeable move-choosing strategies.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Board, Move};
use crate::expectimax::Expectimax;

/// Something that picks the next move of a game.
pub trait Policy {
    /// Choose a legal move for `board`.
    ///
    /// Callers must not pass a terminal board; implementations panic on one.
    fn choose_move(&mut self, board: Board) -> Move;

    /// Short label for reports.
    fn name(&self) -> &'static str;
}

/// Uniformly random legal move. The baseline every search should beat.
pub struct RandomPolicy<R> {
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(rng: R) -> Self { Self { rng } }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn choose_move(&mut self, board: Board) -> Move {
        let moves = board.legal_moves();
        match moves.choose(&mut self.rng) {
            Some(&dir) => dir,
            None => panic!("choose_move called on terminal board {board:?}"),
        }
    }

    fn name(&self) -> &'static str { "random" }
}

impl Policy for Expectimax {
    fn choose_move(&mut self, board: Board) -> Move { Expectimax::choose_move(self, board) }

    fn name(&self) -> &'static str { "expectimax" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_policy_picks_legal_moves() {
        let mut policy = RandomPolicy::new(StdRng::seed_from_u64(1));
        let corner = Board::from_grid([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut seen = Vec::new();
        for _ in 0..100 {
            let dir = policy.choose_move(corner);
            assert!(matches!(dir, Move::Right | Move::Down));
            if !seen.contains(&dir) {
                seen.push(dir);
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    #[should_panic]
    fn random_policy_rejects_terminal_board() {
        let mut policy = RandomPolicy::new(StdRng::seed_from_u64(1));
        policy.choose_move(Board::from_grid([[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 1]]));
    }

    #[test]
    fn policies_are_interchangeable() {
        let board = Board::from_grid([[0, 0, 0, 0], [1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2]]);
        let mut policies: Vec<Box<dyn Policy>> = vec![
            Box::new(RandomPolicy::new(StdRng::seed_from_u64(3))),
            Box::new(Expectimax::new()),
        ];
        for policy in policies.iter_mut() {
            assert_eq!(policy.choose_move(board), Move::Up, "{}", policy.name());
        }
    }
}
