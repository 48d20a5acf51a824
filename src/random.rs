//! Baseline agent picking uniformly among the legal columns

use rand::{prelude::IndexedRandom, rngs::StdRng, SeedableRng};

use crate::{bitboard::BitBoard, solver::Solver};

#[derive(Clone, Debug)]
pub struct RandomSolver {
    rng: StdRng,
}

impl RandomSolver {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for RandomSolver {
    fn name(&self) -> &str {
        "Random Connect Four Player"
    }

    fn solve(&mut self, board: &BitBoard, _move_number: usize) -> Option<usize> {
        let legal_moves: Vec<usize> = board.legal_moves().collect();
        legal_moves.choose(&mut self.rng).copied()
    }
}
