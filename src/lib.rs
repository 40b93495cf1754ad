//! packed-2048: a bit-packed 2048 engine + Expectimax policy
//!
//! This crate provides:
//! - A compact `Board` type (16 four-bit exponents in a `u64`) with pure
//!   methods (`shift`, `apply_move`, `legal_moves`, `score`, ...)
//! - An Expectimax AI (`expectimax` module) with a memoized corner heuristic
//!   and selective 2 -> 3 ply deepening
//! - A `Policy` trait with the expectimax and a uniform-random baseline
//! - Game loops for single games and time-bounded simulations (`game` module)
//!
//! Quick start:
//! ```
//! use packed_2048::engine::{Board, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::initial(&mut rng);
//! let b1 = b0.shift(Move::Left);
//! assert!(b1.score() >= b0.score());
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use packed_2048::engine::Board;
//! use packed_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut policy = Expectimax::new();
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut b = Board::initial(&mut rng);
//! let mut moves = 0u32;
//!
//! // Keep doctests fast: a handful of moves only
//! while !b.is_terminal() && moves < 4 {
//!     let dir = policy.choose_move(b);
//!     b = b.make_move(dir, &mut rng);
//!     moves += 1;
//! }
//! assert_eq!(moves, 4);
//! ```
//!
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod logging;
pub mod policy;
