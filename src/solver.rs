//! Agents choosing moves in Connect 4 with a depth-limited game tree search

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, trace};

use crate::bitboard::{BitBoard, BOARD_BITS, MOVE_ORDER};

/// Bound on the magnitude of any position score, used as the initial search window
pub const MAX_SCORE: i32 = BOARD_BITS as i32;

/// The score of a drawn position, or of one where the search ran out of depth
pub const DRAW_SCORE: i32 = 0;

/// Score of a four-in-a-row completed when `move_number` tiles are on the board
///
/// Earlier wins are further from 0. The score is positive when the winner is the
/// maximizing side.
pub fn win_score(maximizing: bool, move_number: usize) -> i32 {
    let magnitude = (MAX_SCORE - move_number as i32) / 2;
    if maximizing {
        magnitude
    } else {
        -magnitude
    }
}

/// Something that can pick a column for the side to move
pub trait Solver {
    fn name(&self) -> &str;

    /// Returns a legal column for the side to move, or `None` if the board has no legal move
    ///
    /// `move_number` is the number of moves played so far in the game.
    fn solve(&mut self, board: &BitBoard, move_number: usize) -> Option<usize>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&mut self, board: &BitBoard, move_number: usize) -> Option<usize> {
        (**self).solve(board, move_number)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Algorithm {
    Minimax,
    AlphaBeta,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    /// Plies searched below each candidate move
    pub max_depth: u32,
    /// Randomly break ties between equally scored moves
    pub variety_of_play: bool,
    /// Nodes searched per call before remaining positions are scored as draws
    pub node_limit: Option<u64>,
}

impl SearchConfig {
    pub fn minimax(max_depth: u32) -> Self {
        Self {
            algorithm: Algorithm::Minimax,
            max_depth,
            variety_of_play: false,
            node_limit: None,
        }
    }

    pub fn alpha_beta(max_depth: u32) -> Self {
        Self {
            algorithm: Algorithm::AlphaBeta,
            ..Self::minimax(max_depth)
        }
    }

    pub fn with_variety_of_play(mut self, variety_of_play: bool) -> Self {
        self.variety_of_play = variety_of_play;
        self
    }

    pub fn with_node_limit(mut self, node_limit: Option<u64>) -> Self {
        self.node_limit = node_limit;
        self
    }

    /// Parameters for a search from the point of view of the side to move
    pub fn params(&self, move_number: usize) -> SearchParams {
        SearchParams {
            max_depth: self.max_depth,
            maximizing: true,
            move_number,
            variety_of_play: self.variety_of_play,
        }
    }
}

/// Inputs of a single call to [`SearchEngine::best_move`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchParams {
    pub max_depth: u32,
    /// Whether the side to move maximizes or minimizes the score
    pub maximizing: bool,
    /// Tiles on the board before the move is chosen
    pub move_number: usize,
    pub variety_of_play: bool,
}

/// Diagnostics of a single search
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SearchStats {
    /// Moves applied during the search
    pub nodes: u64,
    /// The move was found by the one-ply winning move check
    pub immediate_win: bool,
    /// The node limit cut the search short
    pub budget_exhausted: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchOutcome {
    /// `None` only when the board has no legal move
    pub best_move: Option<usize>,
    pub score: i32,
    pub stats: SearchStats,
}

/// A minimax agent, with or without alpha-beta pruning
///
/// # Position Scoring
/// A won position scores `(MAX_SCORE - n) / 2`, where `n` is the number of tiles on the
/// board once the winning tile is placed, so faster wins score further from 0. The sign
/// follows the framing of the winner: positive for the maximizing side. Draws and
/// positions beyond the search depth score 0.
#[derive(Clone, Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    rng: StdRng,
    node_count: u64,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_os_rng(),
            node_count: 0,
        }
    }

    /// Seeds the tie breaking used by variety of play
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The number of nodes searched by this engine so far (for diagnostics only)
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Chooses the best column for the side to move on `board`
    pub fn best_move(&mut self, board: &BitBoard, params: SearchParams) -> SearchOutcome {
        let mut search = Search {
            board: *board,
            algorithm: self.config.algorithm,
            node_limit: self.config.node_limit,
            stats: SearchStats::default(),
        };
        let outcome = self.top_level_search(&mut search, params);
        self.node_count += outcome.stats.nodes;

        debug!(
            best_move = ?outcome.best_move,
            score = outcome.score,
            nodes = outcome.stats.nodes,
            immediate_win = outcome.stats.immediate_win,
            "search finished"
        );
        outcome
    }

    fn top_level_search(&mut self, search: &mut Search, params: SearchParams) -> SearchOutcome {
        // a one-ply win needs no search
        let mover = search.board.to_move();
        if let Some(column) = search.board.find_immediate_win(mover) {
            search.stats.immediate_win = true;
            return SearchOutcome {
                best_move: Some(column),
                score: win_score(params.maximizing, params.move_number + 1),
                stats: search.stats,
            };
        }

        let mut best: Option<(usize, i32)> = None;
        for &column in MOVE_ORDER.iter() {
            if !search.board.is_legal_move(column) {
                continue;
            }
            search.stats.nodes += 1;

            let token = search.board.apply_move(column);
            let score = search.evaluate(
                params.max_depth,
                !params.maximizing,
                params.move_number + 1,
            );
            search.board.reverse_move(token);
            trace!(column, score, "candidate move");

            // the first legal move is always kept, later ones must be strictly better
            let better = match best {
                None => true,
                Some((_, best_score)) => {
                    let mut candidate = score as f64;
                    if params.variety_of_play && score == best_score {
                        candidate += self.rng.random_range(-1.0..=1.0);
                    }
                    if params.maximizing {
                        candidate > best_score as f64
                    } else {
                        candidate < best_score as f64
                    }
                }
            };
            if better {
                best = Some((column, score));
            }
        }

        match best {
            Some((column, score)) => SearchOutcome {
                best_move: Some(column),
                score,
                stats: search.stats,
            },
            None => SearchOutcome {
                best_move: None,
                score: DRAW_SCORE,
                stats: search.stats,
            },
        }
    }
}

impl Solver for SearchEngine {
    fn name(&self) -> &str {
        match self.config.algorithm {
            Algorithm::Minimax => "Minimax Connect Four Player",
            Algorithm::AlphaBeta => "Minimax Alpha-Beta Connect Four Player",
        }
    }

    fn solve(&mut self, board: &BitBoard, move_number: usize) -> Option<usize> {
        let params = self.config.params(move_number);
        self.best_move(board, params).best_move
    }
}

// scratch state of one search, the board is mutated and restored in place
struct Search {
    board: BitBoard,
    algorithm: Algorithm,
    node_limit: Option<u64>,
    stats: SearchStats,
}

impl Search {
    fn evaluate(&mut self, depth: u32, maximizing: bool, move_number: usize) -> i32 {
        match self.algorithm {
            Algorithm::Minimax => self.minimax(depth, maximizing, move_number),
            Algorithm::AlphaBeta => {
                self.alpha_beta(depth, -MAX_SCORE, MAX_SCORE, maximizing, move_number)
            }
        }
    }

    fn out_of_budget(&mut self) -> bool {
        match self.node_limit {
            Some(limit) if self.stats.nodes >= limit => {
                self.stats.budget_exhausted = true;
                true
            }
            _ => false,
        }
    }

    // `maximizing` is the framing of the side to move, so the player who just
    // moved (and may have won) has the opposite framing
    fn terminal_score(&mut self, depth: u32, maximizing: bool, move_number: usize) -> Option<i32> {
        let last_mover = self.board.to_move().opponent();
        if self.board.is_win(last_mover) {
            return Some(win_score(!maximizing, move_number));
        }
        if depth == 0 || self.board.has_no_legal_move() || self.out_of_budget() {
            return Some(DRAW_SCORE);
        }
        None
    }

    fn minimax(&mut self, depth: u32, maximizing: bool, move_number: usize) -> i32 {
        if let Some(score) = self.terminal_score(depth, maximizing, move_number) {
            return score;
        }

        let mut best = if maximizing { -MAX_SCORE } else { MAX_SCORE };
        for &column in MOVE_ORDER.iter() {
            if !self.board.is_legal_move(column) {
                continue;
            }
            self.stats.nodes += 1;

            let token = self.board.apply_move(column);
            let score = self.minimax(depth - 1, !maximizing, move_number + 1);
            self.board.reverse_move(token);

            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }

    fn alpha_beta(
        &mut self,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        move_number: usize,
    ) -> i32 {
        debug_assert!(alpha < beta, "empty search window [{}, {}]", alpha, beta);
        if let Some(score) = self.terminal_score(depth, maximizing, move_number) {
            return score;
        }

        let mut best = if maximizing { -MAX_SCORE } else { MAX_SCORE };
        for &column in MOVE_ORDER.iter() {
            if !self.board.is_legal_move(column) {
                continue;
            }
            self.stats.nodes += 1;

            let token = self.board.apply_move(column);
            let score = self.alpha_beta(depth - 1, alpha, beta, !maximizing, move_number + 1);
            self.board.reverse_move(token);

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            // the opponent will never allow this line
            if alpha >= beta {
                break;
            }
        }
        best
    }
}
