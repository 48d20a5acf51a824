use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::io::{stdin, stdout, Write};

use connect4_minimax::{
    bitboard::BitBoard,
    display,
    history::MoveHistory,
    random::RandomSolver,
    solver::{SearchConfig, SearchEngine, Solver},
    tournament,
};

#[derive(Parser)]
#[command(name = "connect4", about = "Connect 4 played by depth-limited minimax agents")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a game in the terminal
    Play {
        #[arg(long, value_enum, default_value_t = PlayerKind::Human)]
        red: PlayerKind,
        #[arg(long, value_enum, default_value_t = PlayerKind::AlphaBeta)]
        yellow: PlayerKind,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Play a series of games between two solvers
    Match {
        #[arg(long, value_enum, default_value_t = SolverKind::AlphaBeta)]
        red: SolverKind,
        #[arg(long, value_enum, default_value_t = SolverKind::AlphaBeta)]
        yellow: SolverKind,
        /// Search depth of the red solver, defaults to --depth
        #[arg(long)]
        red_depth: Option<u32>,
        /// Search depth of the yellow solver, defaults to --depth
        #[arg(long)]
        yellow_depth: Option<u32>,
        #[arg(long, default_value_t = 100)]
        games: u32,
        /// Play the games on all cores
        #[arg(long)]
        parallel: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Play a series of games of one solver against itself
    SelfPlay {
        #[arg(long, value_enum, default_value_t = SolverKind::AlphaBeta)]
        solver: SolverKind,
        #[arg(long, default_value_t = 10)]
        games: u32,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the engine's choice for a position given as column digits, e.g. 4453
    Analyse {
        #[arg(default_value = "")]
        moves: String,
        #[arg(long, value_enum, default_value_t = SolverKind::AlphaBeta)]
        solver: SolverKind,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args, Clone, Copy)]
struct EngineArgs {
    /// Plies searched below each candidate move
    #[arg(long, default_value_t = 6)]
    depth: u32,
    /// Randomly break ties between equally good moves
    #[arg(long)]
    variety: bool,
    /// Nodes per search before remaining positions are scored as draws
    #[arg(long)]
    node_limit: Option<u64>,
    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    Random,
    Minimax,
    AlphaBeta,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PlayerKind {
    Human,
    Random,
    Minimax,
    AlphaBeta,
}

impl PlayerKind {
    fn solver(self) -> Option<SolverKind> {
        match self {
            PlayerKind::Human => None,
            PlayerKind::Random => Some(SolverKind::Random),
            PlayerKind::Minimax => Some(SolverKind::Minimax),
            PlayerKind::AlphaBeta => Some(SolverKind::AlphaBeta),
        }
    }
}

fn search_config(kind: SolverKind, depth: u32, engine: &EngineArgs) -> Option<SearchConfig> {
    let config = match kind {
        SolverKind::Random => return None,
        SolverKind::Minimax => SearchConfig::minimax(depth),
        SolverKind::AlphaBeta => SearchConfig::alpha_beta(depth),
    };
    Some(
        config
            .with_variety_of_play(engine.variety)
            .with_node_limit(engine.node_limit),
    )
}

fn build_solver(
    kind: SolverKind,
    depth: u32,
    engine: &EngineArgs,
    seed: Option<u64>,
) -> Box<dyn Solver + Send> {
    match search_config(kind, depth, engine) {
        None => match seed {
            Some(seed) => Box::new(RandomSolver::with_seed(seed)),
            None => Box::new(RandomSolver::new()),
        },
        Some(config) => {
            let solver = SearchEngine::new(config);
            match seed {
                Some(seed) => Box::new(solver.with_seed(seed)),
                None => Box::new(solver),
            }
        }
    }
}

// distinct, reproducible seeds for each side of each game
fn derive_seed(seed: Option<u64>, game: u32, side: u64) -> Option<u64> {
    seed.map(|seed| seed ^ ((game as u64) << 1 | side).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Play {
            red,
            yellow,
            engine,
        } => play(red, yellow, &engine),
        Command::Match {
            red,
            yellow,
            red_depth,
            yellow_depth,
            games,
            parallel,
            engine,
        } => {
            let red_depth = red_depth.unwrap_or(engine.depth);
            let yellow_depth = yellow_depth.unwrap_or(engine.depth);

            let stats = if parallel {
                tournament::play_match_parallel(
                    |game| build_solver(red, red_depth, &engine, derive_seed(engine.seed, game, 0)),
                    |game| {
                        build_solver(yellow, yellow_depth, &engine, derive_seed(engine.seed, game, 1))
                    },
                    games,
                    true,
                )?
            } else {
                let mut red = build_solver(red, red_depth, &engine, derive_seed(engine.seed, 0, 0));
                let mut yellow =
                    build_solver(yellow, yellow_depth, &engine, derive_seed(engine.seed, 0, 1));
                tournament::play_match(&mut *red, &mut *yellow, games, true)?
            };
            println!("{}", stats);
            Ok(())
        }
        Command::SelfPlay {
            solver,
            games,
            engine,
        } => {
            let mut solver = build_solver(solver, engine.depth, &engine, engine.seed);
            let stats = tournament::self_play_match(&mut *solver, games, true)?;
            println!("{}", stats);
            Ok(())
        }
        Command::Analyse {
            moves,
            solver,
            engine,
        } => analyse(&moves, solver, &engine),
    }
}

fn analyse(moves: &str, kind: SolverKind, engine: &EngineArgs) -> Result<()> {
    let board = BitBoard::from_moves(moves)?;
    println!("{}\n", board);

    if let Some(winner) = board.winner() {
        println!("{} has already won", winner);
        return Ok(());
    }

    match search_config(kind, engine.depth, engine) {
        Some(config) => {
            let mut solver = SearchEngine::new(config);
            if let Some(seed) = engine.seed {
                solver = solver.with_seed(seed);
            }
            let outcome = solver.best_move(&board, config.params(board.num_moves()));
            match outcome.best_move {
                Some(column) => println!("Best move: {}", column),
                None => println!("No legal move, the game is a draw"),
            }
            println!("Score: {}", outcome.score);
            println!("Nodes searched: {}", outcome.stats.nodes);
            if outcome.stats.immediate_win {
                println!("Immediate win found");
            }
            if outcome.stats.budget_exhausted {
                println!("Node limit reached, deeper lines were scored as draws");
            }
        }
        None => {
            let mut solver = build_solver(kind, engine.depth, engine, engine.seed);
            match solver.solve(&board, board.num_moves()) {
                Some(column) => println!("Random move: {}", column),
                None => println!("No legal move, the game is a draw"),
            }
        }
    }
    Ok(())
}

fn play(red: PlayerKind, yellow: PlayerKind, engine: &EngineArgs) -> Result<()> {
    let mut solvers = [
        red.solver()
            .map(|kind| build_solver(kind, engine.depth, engine, derive_seed(engine.seed, 0, 0))),
        yellow
            .solver()
            .map(|kind| build_solver(kind, engine.depth, engine, derive_seed(engine.seed, 0, 1))),
    ];
    let stdin = stdin();
    let mut board = BitBoard::new();
    let mut history = MoveHistory::new();

    println!("Welcome to Connect 4\n");

    // game loop
    loop {
        display::print_board(&board)?;

        if let Some(winner) = board.winner() {
            println!("{} wins!", winner);
            break;
        }
        if board.has_no_legal_move() {
            println!("Draw!");
            break;
        }

        let player = board.to_move();
        let next_move = match solvers[player.index()].as_mut() {
            // AI player
            Some(solver) => {
                println!("{} is thinking...", solver.name());
                stdout().flush()?;

                let column = solver
                    .solve(&board, history.len())
                    .ok_or_else(|| anyhow!("{} found no move", solver.name()))?;
                println!("Best move: {}", column);
                column
            }
            // human player
            None => {
                print!("{} move input > ", player);
                stdout().flush()?;
                let mut input_str = String::new();
                stdin.read_line(&mut input_str)?;

                match input_str.trim().parse::<usize>() {
                    Err(_) => {
                        println!("Invalid number: {}", input_str.trim());
                        continue;
                    }
                    Ok(column) => column,
                }
            }
        };

        if let Err(err) = board.try_apply_move(next_move) {
            println!("{}", err);
            // try the move again
            continue;
        }
        history.add(next_move);
        info!(%player, column = next_move, "move played");
    }

    println!("Move history: {}", history);
    Ok(())
}
