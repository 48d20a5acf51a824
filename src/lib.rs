//! A depth-limited minimax agent for playing the board game 'Connect 4'
//!
//! The board is stored as a pair of bitboards, one per player, and moves
//! are chosen with a plain or alpha-beta pruned minimax search up to a
//! fixed depth.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_minimax::{bitboard::BitBoard, solver::{SearchConfig, SearchEngine}};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // Red has three in column 4 and Yellow has not blocked
//! let board = BitBoard::from_moves("414141")?;
//! let config = SearchConfig::alpha_beta(4);
//! let mut engine = SearchEngine::new(config);
//! let outcome = engine.best_move(&board, config.params(board.num_moves()));
//!
//! assert_eq!(outcome.best_move, Some(4));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod bitboard;

pub mod display;

pub mod history;

pub mod random;

pub mod solver;

pub mod tournament;

mod test;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
