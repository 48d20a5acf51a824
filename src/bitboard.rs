use thiserror::Error;

use crate::{HEIGHT, WIDTH};

/// Bit distance between two horizontally adjacent cells
///
/// Every column owns `HEIGHT + 1` bits: the playable cells and one guard bit on top
pub const COLUMN_PITCH: usize = HEIGHT + 1;

/// Number of bits in the board encoding, including the guard row
pub const BOARD_BITS: usize = WIDTH * COLUMN_PITCH;

// vertical, horizontal and both diagonals
const DIRECTIONS: [usize; 4] = [1, COLUMN_PITCH, COLUMN_PITCH - 1, COLUMN_PITCH + 1];

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    // the guard bit above the top playable cell of each column
    pub const fn top_mask() -> u64 {
        bottom_mask() << HEIGHT
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// Returns the columns (1-based) ordered from the middle outwards, left before right,
/// as the middle columns are more often good moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + 1 + (1 - i % 2) * (i / 2) - (i % 2) * (i / 2 + 1);
        i += 1;
    }
    move_order
}

/// The column preference order used by every search routine
pub static MOVE_ORDER: [usize; WIDTH] = move_order();

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Player {
    Red,
    Yellow,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::Red => 0,
            Player::Yellow => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::Red => write!(f, "Red"),
            Player::Yellow => write!(f, "Yellow"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("could not parse '{0}' as a valid move")]
    InvalidCharacter(char),
    #[error("invalid move, column {column} out of range. Columns must be between 1 and {}", WIDTH)]
    ColumnOutOfRange { column: usize },
    #[error("invalid move, column {column} full")]
    ColumnFull { column: usize },
    #[error("invalid position, game is over")]
    GameOver,
}

/// Proof of a move applied to a [`BitBoard`]
///
/// Returned by [`BitBoard::apply_move`] and consumed by [`BitBoard::reverse_move`].
/// Tokens must be handed back in reverse order of creation for any single column.
#[must_use = "a move can only be reversed with the token returned when it was applied"]
#[derive(Debug, PartialEq, Eq)]
pub struct MoveToken {
    column: usize,
    player: Player,
}

impl MoveToken {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn player(&self) -> Player {
        self.player
    }
}

/// A Connect 4 position stored as one bitmask per player
///
/// Bits are laid out column by column from the bottom left:
/// ```text
///  6 13 20 27 34 41 48   <- guard row, never occupied
///  5 12 19 26 33 40 47
///  4 11 18 25 32 39 46
///  3 10 17 24 31 38 45
///  2  9 16 23 30 37 44
///  1  8 15 22 29 36 43
///  0  7 14 21 28 35 42
/// ```
/// Columns are numbered 1 to `WIDTH` in the public interface.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BitBoard {
    // tiles of each player, indexed by `Player::index`
    masks: [u64; 2],
    // bit index of the next free cell of each column
    heights: [u8; WIDTH],
    to_move: Player,
}

impl BitBoard {
    /// Creates an empty board with Red to move
    pub fn new() -> Self {
        Self::with_first_player(Player::Red)
    }

    pub fn with_first_player(player: Player) -> Self {
        let mut heights = [0; WIDTH];
        for (column, height) in heights.iter_mut().enumerate() {
            *height = (column * COLUMN_PITCH) as u8;
        }
        Self {
            masks: [0, 0],
            heights,
            to_move: player,
        }
    }

    /// Builds a position from a string of 1-based column digits, Red moving first
    ///
    /// Whitespace is ignored. Moves played after either side has four in a row are rejected.
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self, BoardError> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            if column_char.is_whitespace() {
                continue;
            }
            let column = match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) => column,
                None => return Err(BoardError::InvalidCharacter(column_char)),
            };
            if board.winner().is_some() {
                return Err(BoardError::GameOver);
            }
            let _ = board.try_apply_move(column)?;
        }
        Ok(board)
    }

    /// Overwrites this board with a copy of `other`
    pub fn copy_from(&mut self, other: &BitBoard) {
        self.masks = other.masks;
        self.heights = other.heights;
        self.to_move = other.to_move;
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn player_mask(&self, player: Player) -> u64 {
        self.masks[player.index()]
    }

    pub fn board_mask(&self) -> u64 {
        self.masks[0] | self.masks[1]
    }

    pub fn num_moves(&self) -> usize {
        self.board_mask().count_ones() as usize
    }

    /// Number of tiles in a column
    pub fn height(&self, column: usize) -> usize {
        self.heights[column - 1] as usize - (column - 1) * COLUMN_PITCH
    }

    /// The owner of a cell, `row` counting from 0 at the bottom
    pub fn cell(&self, column: usize, row: usize) -> Option<Player> {
        let bit: u64 = 1 << ((column - 1) * COLUMN_PITCH + row);
        if self.masks[0] & bit != 0 {
            Some(Player::Red)
        } else if self.masks[1] & bit != 0 {
            Some(Player::Yellow)
        } else {
            None
        }
    }

    pub fn is_legal_move(&self, column: usize) -> bool {
        (1..=WIDTH).contains(&column)
            && static_masks::top_mask() & (1 << self.heights[column - 1]) == 0
    }

    pub fn count_legal_moves(&self) -> usize {
        MOVE_ORDER
            .iter()
            .filter(|&&column| self.is_legal_move(column))
            .count()
    }

    pub fn has_no_legal_move(&self) -> bool {
        !MOVE_ORDER.iter().any(|&column| self.is_legal_move(column))
    }

    /// Legal columns in move order
    pub fn legal_moves(&self) -> impl Iterator<Item = usize> + '_ {
        MOVE_ORDER
            .iter()
            .copied()
            .filter(move |&column| self.is_legal_move(column))
    }

    /// Drops a tile for the side to move into `column`
    ///
    /// The caller must have checked the move with [`BitBoard::is_legal_move`];
    /// playing into a full column corrupts the neighbouring column.
    pub fn apply_move(&mut self, column: usize) -> MoveToken {
        debug_assert!(self.is_legal_move(column), "column {} is not playable", column);
        let player = self.to_move;
        let index = column - 1;

        self.masks[player.index()] ^= 1 << self.heights[index];
        self.heights[index] += 1;
        self.to_move = player.opponent();

        MoveToken { column, player }
    }

    /// Checked version of [`BitBoard::apply_move`]
    pub fn try_apply_move(&mut self, column: usize) -> Result<MoveToken, BoardError> {
        if !(1..=WIDTH).contains(&column) {
            return Err(BoardError::ColumnOutOfRange { column });
        }
        if !self.is_legal_move(column) {
            return Err(BoardError::ColumnFull { column });
        }
        Ok(self.apply_move(column))
    }

    /// Takes back the move described by `token`
    ///
    /// Only correct when `token` belongs to the most recent move still standing in its
    /// column, which holds whenever moves are reversed in the opposite order to how they
    /// were applied.
    pub fn reverse_move(&mut self, token: MoveToken) {
        let index = token.column - 1;
        self.heights[index] -= 1;
        let bit: u64 = 1 << self.heights[index];
        debug_assert!(
            self.masks[token.player.index()] & bit != 0,
            "top tile of column {} does not belong to {}",
            token.column,
            token.player
        );

        self.masks[token.player.index()] ^= bit;
        self.to_move = token.player;
    }

    /// Does `player` have four tiles in a row?
    pub fn is_win(&self, player: Player) -> bool {
        has_alignment(self.masks[player.index()])
    }

    /// The player with four in a row, if any
    pub fn winner(&self) -> Option<Player> {
        if self.is_win(Player::Red) {
            Some(Player::Red)
        } else if self.is_win(Player::Yellow) {
            Some(Player::Yellow)
        } else {
            None
        }
    }

    /// The first column in move order where a tile for `player` completes four in a row
    pub fn find_immediate_win(&self, player: Player) -> Option<usize> {
        let mask = self.masks[player.index()];
        MOVE_ORDER.iter().copied().find(|&column| {
            self.is_legal_move(column) && has_alignment(mask | 1 << self.heights[column - 1])
        })
    }

    /// Is every playable cell occupied?
    pub fn is_full(&self) -> bool {
        self.board_mask() == static_masks::full_board_mask()
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

// for each direction, mark every cell that starts a run of four
fn has_alignment(bits: u64) -> bool {
    DIRECTIONS
        .iter()
        .any(|&d| bits & (bits >> d) & (bits >> (2 * d)) & (bits >> (3 * d)) != 0)
}
