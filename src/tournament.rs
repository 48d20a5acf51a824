//! Games and matches between two solvers

use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use std::fmt;
use std::time::{Duration, Instant};

use crate::{
    bitboard::{BitBoard, BoardError, Player},
    history::MoveHistory,
    solver::Solver,
};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Win(Player),
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win(player) => write!(f, "{} wins", player),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("{solver} returned no move with {legal_moves} legal moves available")]
    NoMove { solver: String, legal_moves: usize },
    #[error("{solver} returned an illegal move: {source}")]
    IllegalMove {
        solver: String,
        #[source]
        source: BoardError,
    },
}

/// A finished game
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub outcome: Outcome,
    pub history: MoveHistory,
    pub board: BitBoard,
}

/// Plays one game, `red` moving first
pub fn play_game(
    red: &mut dyn Solver,
    yellow: &mut dyn Solver,
) -> Result<GameRecord, TournamentError> {
    run_game(|player, board, move_number| match player {
        Player::Red => ask(&mut *red, board, move_number),
        Player::Yellow => ask(&mut *yellow, board, move_number),
    })
}

/// Plays one game with `solver` choosing the moves of both sides
pub fn self_play(solver: &mut dyn Solver) -> Result<GameRecord, TournamentError> {
    run_game(|_, board, move_number| ask(&mut *solver, board, move_number))
}

// a solver must answer with a legal column whenever one exists
fn ask(
    solver: &mut dyn Solver,
    board: &BitBoard,
    move_number: usize,
) -> Result<usize, TournamentError> {
    let column = solver
        .solve(board, move_number)
        .ok_or_else(|| TournamentError::NoMove {
            solver: solver.name().to_string(),
            legal_moves: board.count_legal_moves(),
        })?;

    let mut probe = *board;
    match probe.try_apply_move(column) {
        Ok(_) => Ok(column),
        Err(source) => Err(TournamentError::IllegalMove {
            solver: solver.name().to_string(),
            source,
        }),
    }
}

fn run_game<F>(mut next_move: F) -> Result<GameRecord, TournamentError>
where
    F: FnMut(Player, &BitBoard, usize) -> Result<usize, TournamentError>,
{
    let mut board = BitBoard::new();
    let mut history = MoveHistory::new();

    let outcome = loop {
        if board.has_no_legal_move() {
            break Outcome::Draw;
        }

        let player = board.to_move();
        let column = next_move(player, &board, history.len())?;
        let _ = board.apply_move(column);
        history.add(column);
        debug!(%player, column, "move played");

        if board.is_win(player) {
            break Outcome::Win(player);
        }
    };

    info!(%outcome, moves = history.len(), history = %history, "game finished");
    Ok(GameRecord {
        outcome,
        history,
        board,
    })
}

/// Tallies of a series of games
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub games: u32,
    pub red_wins: u32,
    pub yellow_wins: u32,
    pub draws: u32,
    pub total_moves: u64,
    pub elapsed: Duration,
}

impl MatchStats {
    pub fn record(&mut self, game: &GameRecord) {
        self.games += 1;
        self.total_moves += game.history.len() as u64;
        match game.outcome {
            Outcome::Win(Player::Red) => self.red_wins += 1,
            Outcome::Win(Player::Yellow) => self.yellow_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn moves_per_millisecond(&self) -> f64 {
        let millis = self.elapsed.as_secs_f64() * 1000.0;
        if millis > 0.0 {
            self.total_moves as f64 / millis
        } else {
            0.0
        }
    }

    /// Share of all games, in percent
    pub fn percentage(&self, count: u32) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            count as f64 / self.games as f64 * 100.0
        }
    }
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of games: {}", self.games)?;
        writeln!(f, "Number of moves: {}", self.total_moves)?;
        writeln!(f, "Duration: {}", HumanDuration(self.elapsed))?;
        writeln!(f, "Moves per msec: {:.3}", self.moves_per_millisecond())?;
        writeln!(
            f,
            "Red wins: {} [{:.1}%]",
            self.red_wins,
            self.percentage(self.red_wins)
        )?;
        writeln!(
            f,
            "Yellow wins: {} [{:.1}%]",
            self.yellow_wins,
            self.percentage(self.yellow_wins)
        )?;
        write!(
            f,
            "Draws: {} [{:.1}%]",
            self.draws,
            self.percentage(self.draws)
        )
    }
}

fn progress_bar(games: u32, show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Playing games: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );
    progress
}

/// Plays `games` games between the same two solvers, `red` always moving first
pub fn play_match(
    red: &mut dyn Solver,
    yellow: &mut dyn Solver,
    games: u32,
    show_progress: bool,
) -> Result<MatchStats, TournamentError> {
    info!(red = red.name(), yellow = yellow.name(), games, "starting match");
    let progress = progress_bar(games, show_progress);
    let start = Instant::now();

    let mut stats = MatchStats::default();
    for _ in 0..games {
        let game = play_game(red, yellow)?;
        stats.record(&game);
        progress.inc(1);
    }
    stats.elapsed = start.elapsed();
    progress.finish();

    info!(
        red_wins = stats.red_wins,
        yellow_wins = stats.yellow_wins,
        draws = stats.draws,
        "match finished"
    );
    Ok(stats)
}

/// Plays `games` games of `solver` against itself
pub fn self_play_match(
    solver: &mut dyn Solver,
    games: u32,
    show_progress: bool,
) -> Result<MatchStats, TournamentError> {
    info!(solver = solver.name(), games, "starting self-play");
    let progress = progress_bar(games, show_progress);
    let start = Instant::now();

    let mut stats = MatchStats::default();
    for _ in 0..games {
        let game = self_play(solver)?;
        stats.record(&game);
        progress.inc(1);
    }
    stats.elapsed = start.elapsed();
    progress.finish();
    Ok(stats)
}

/// Plays `games` games in parallel
///
/// Every game builds its own solvers from the factories, given the game index, so no
/// search state is shared between threads.
pub fn play_match_parallel<R, Y, FR, FY>(
    make_red: FR,
    make_yellow: FY,
    games: u32,
    show_progress: bool,
) -> Result<MatchStats, TournamentError>
where
    R: Solver,
    Y: Solver,
    FR: Fn(u32) -> R + Sync,
    FY: Fn(u32) -> Y + Sync,
{
    info!(games, "starting parallel match");
    let progress = progress_bar(games, show_progress);
    let start = Instant::now();

    let records = (0..games)
        .into_par_iter()
        .map(|game| {
            let mut red = make_red(game);
            let mut yellow = make_yellow(game);
            let record = play_game(&mut red, &mut yellow);
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut stats = MatchStats::default();
    for record in records.iter() {
        stats.record(record);
    }
    stats.elapsed = start.elapsed();
    progress.finish();

    info!(
        red_wins = stats.red_wins,
        yellow_wins = stats.yellow_wins,
        draws = stats.draws,
        "match finished"
    );
    Ok(stats)
}
