use std::fmt;

use crate::bitboard::{BitBoard, BoardError};

/// The columns played in a game, in order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<usize>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self { moves: Vec::new() }
    }

    pub fn add(&mut self, column: usize) {
        self.moves.push(column);
    }

    pub fn remove_last(&mut self) -> Option<usize> {
        self.moves.pop()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.moves
    }

    /// The history as a string of column digits, as accepted by [`BitBoard::from_moves`]
    pub fn to_move_string(&self) -> String {
        self.moves.iter().map(|column| column.to_string()).collect()
    }

    /// Replays the history on an empty board with Red moving first
    pub fn replay(&self) -> Result<BitBoard, BoardError> {
        BitBoard::from_moves(self.to_move_string())
    }
}

impl fmt::Display for MoveHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for column in &self.moves {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", column)?;
            first = false;
        }
        Ok(())
    }
}
