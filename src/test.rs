#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::bitboard::{move_order, BitBoard, BoardError, Player};
    use crate::history::MoveHistory;
    use crate::random::RandomSolver;
    use crate::solver::*;
    use crate::tournament::*;
    use crate::WIDTH;

    // 42 moves filling the board without four in a row for either side
    const DRAWN_GAME: &str = "211211143313332322444424556575565766677677";

    // plays random legal moves, stopping early if the game is decided
    fn random_position(rng: &mut StdRng, max_moves: usize) -> BitBoard {
        let mut board = BitBoard::new();
        for _ in 0..max_moves {
            let moves: Vec<usize> = board.legal_moves().collect();
            if moves.is_empty() || board.winner().is_some() {
                break;
            }
            let column = moves[rng.random_range(0..moves.len())];
            let _ = board.apply_move(column);
        }
        board
    }

    // random positions that are still undecided and have no one-move win for the side to move
    fn quiet_positions(seed: u64, count: usize) -> Vec<BitBoard> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::new();
        while positions.len() < count {
            let length = rng.random_range(6..16);
            let board = random_position(&mut rng, length);
            if board.winner().is_none()
                && !board.has_no_legal_move()
                && board.find_immediate_win(board.to_move()).is_none()
            {
                positions.push(board);
            }
        }
        positions
    }

    #[test]
    pub fn move_order_is_center_out() {
        assert_eq!(move_order(), [4, 3, 5, 2, 6, 1, 7]);
    }

    #[test]
    pub fn empty_board() {
        let board = BitBoard::new();
        assert_eq!(board.to_move(), Player::Red);
        assert_eq!(board.num_moves(), 0);
        assert_eq!(board.count_legal_moves(), WIDTH);
        assert!(!board.has_no_legal_move());
        assert_eq!(board.winner(), None);
        assert_eq!(board.legal_moves().collect::<Vec<_>>(), vec![4, 3, 5, 2, 6, 1, 7]);

        let board = BitBoard::with_first_player(Player::Yellow);
        assert_eq!(board.to_move(), Player::Yellow);
    }

    #[test]
    pub fn apply_move_fills_from_the_bottom() {
        let mut board = BitBoard::new();
        let token = board.apply_move(4);
        assert_eq!(token.column(), 4);
        assert_eq!(token.player(), Player::Red);
        let _ = board.apply_move(4);

        assert_eq!(board.cell(4, 0), Some(Player::Red));
        assert_eq!(board.cell(4, 1), Some(Player::Yellow));
        assert_eq!(board.cell(4, 2), None);
        assert_eq!(board.height(4), 2);
        assert_eq!(board.num_moves(), 2);
        assert_eq!(board.to_move(), Player::Red);
        assert_eq!(board.player_mask(Player::Red) & board.player_mask(Player::Yellow), 0);
    }

    #[test]
    pub fn apply_then_reverse_restores_position() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let length = rng.random_range(0..42);
            let mut board = random_position(&mut rng, length);
            let before = board;
            for column in move_order().iter().copied() {
                if !board.is_legal_move(column) {
                    continue;
                }
                let token = board.apply_move(column);
                assert_ne!(board, before);
                board.reverse_move(token);
                assert_eq!(board, before);
            }
        }
    }

    #[test]
    pub fn nested_moves_reverse_in_order() {
        let mut board = BitBoard::from_moves("4453").unwrap();
        let before = board;

        let first = board.apply_move(3);
        let second = board.apply_move(3);
        let third = board.apply_move(5);
        assert_eq!(board.height(3), 3);

        board.reverse_move(third);
        board.reverse_move(second);
        board.reverse_move(first);
        assert_eq!(board, before);
    }

    #[test]
    pub fn full_column_is_not_playable() -> Result<()> {
        let mut board = BitBoard::from_moves("333333")?;
        assert!(!board.is_legal_move(3));
        assert_eq!(board.count_legal_moves(), WIDTH - 1);
        assert_eq!(
            board.try_apply_move(3),
            Err(BoardError::ColumnFull { column: 3 })
        );
        assert!(!board.is_legal_move(0));
        assert!(!board.is_legal_move(WIDTH + 1));
        assert_eq!(
            board.try_apply_move(0),
            Err(BoardError::ColumnOutOfRange { column: 0 })
        );
        Ok(())
    }

    #[test]
    pub fn from_moves_rejects_invalid_input() {
        assert_eq!(
            BitBoard::from_moves("4x"),
            Err(BoardError::InvalidCharacter('x'))
        );
        assert_eq!(
            BitBoard::from_moves("48"),
            Err(BoardError::ColumnOutOfRange { column: 8 })
        );
        assert_eq!(
            BitBoard::from_moves("4444444"),
            Err(BoardError::ColumnFull { column: 4 })
        );
        // red completes column 1 on the seventh move
        assert_eq!(
            BitBoard::from_moves("12121217"),
            Err(BoardError::GameOver)
        );
        assert!(BitBoard::from_moves("4 4 5 3").is_ok());
    }

    #[test]
    pub fn horizontal_win() -> Result<()> {
        let board = BitBoard::from_moves("1122334")?;
        assert!(board.is_win(Player::Red));
        assert!(!board.is_win(Player::Yellow));
        assert_eq!(board.winner(), Some(Player::Red));
        Ok(())
    }

    #[test]
    pub fn vertical_win() -> Result<()> {
        let board = BitBoard::from_moves("1212121")?;
        assert!(board.is_win(Player::Red));
        assert!(!board.is_win(Player::Yellow));
        Ok(())
    }

    #[test]
    pub fn rising_diagonal_win() -> Result<()> {
        // red on (1,0) (2,1) (3,2) (4,3)
        let board = BitBoard::from_moves("12233434544")?;
        assert!(board.is_win(Player::Red));
        assert!(!board.is_win(Player::Yellow));
        Ok(())
    }

    #[test]
    pub fn falling_diagonal_win() -> Result<()> {
        // red on (7,0) (6,1) (5,2) (4,3)
        let board = BitBoard::from_moves("76655454344")?;
        assert!(board.is_win(Player::Red));
        assert!(!board.is_win(Player::Yellow));
        Ok(())
    }

    #[test]
    pub fn three_with_a_gap_is_not_a_win() -> Result<()> {
        // red on columns 1, 2 and 4 of the bottom row
        let board = BitBoard::from_moves("11224")?;
        assert!(!board.is_win(Player::Red));
        assert!(!board.is_win(Player::Yellow));
        Ok(())
    }

    #[test]
    pub fn no_alignment_through_the_guard_row() -> Result<()> {
        // red holds the top three cells of column 1 and the bottom cell of column 2
        let board = BitBoard::from_moves("21617116171")?;
        assert_eq!(board.cell(1, 5), Some(Player::Red));
        assert_eq!(board.cell(2, 0), Some(Player::Red));
        assert!(!board.is_legal_move(1));
        assert_eq!(board.winner(), None);
        Ok(())
    }

    #[test]
    pub fn immediate_win_is_found() -> Result<()> {
        let board = BitBoard::from_moves("414142")?;
        assert_eq!(board.find_immediate_win(Player::Red), Some(4));
        assert_eq!(board.find_immediate_win(Player::Yellow), None);

        let board = BitBoard::from_moves("414141")?;
        assert_eq!(board.find_immediate_win(Player::Red), Some(4));
        assert_eq!(board.find_immediate_win(Player::Yellow), Some(1));
        Ok(())
    }

    #[test]
    pub fn immediate_win_follows_move_order() -> Result<()> {
        // red can complete the bottom row on 3 or 7, 3 comes first in move order;
        // yellow's row above has no reachable cell yet
        let board = BitBoard::from_moves("445566")?;
        let before = board;
        assert_eq!(board.find_immediate_win(Player::Red), Some(3));
        assert_eq!(board.find_immediate_win(Player::Yellow), None);
        assert_eq!(board, before);
        Ok(())
    }

    #[test]
    pub fn filled_board_without_alignment() -> Result<()> {
        let board = BitBoard::from_moves(DRAWN_GAME)?;
        assert!(board.has_no_legal_move());
        assert!(board.is_full());
        assert_eq!(board.count_legal_moves(), 0);
        assert_eq!(board.num_moves(), 42);
        assert_eq!(board.winner(), None);
        assert_eq!(board.find_immediate_win(board.to_move()), None);
        Ok(())
    }

    #[test]
    pub fn copy_from_duplicates_everything() -> Result<()> {
        let source = BitBoard::from_moves("4453")?;
        let mut copy = BitBoard::with_first_player(Player::Yellow);
        copy.copy_from(&source);
        assert_eq!(copy, source);
        assert_eq!(copy.to_move(), Player::Red);
        Ok(())
    }

    #[test]
    pub fn board_renders_as_text() -> Result<()> {
        let board = BitBoard::from_moves("12")?;
        let expected = ".......\n".repeat(5) + "XO.....\n1234567";
        assert_eq!(board.to_string(), expected);

        let mut buffer = Vec::new();
        crate::display::draw(&mut buffer, &board)?;
        assert!(String::from_utf8(buffer)?.contains("1234567"));
        Ok(())
    }

    #[test]
    pub fn win_scores_favour_faster_wins() {
        assert_eq!(win_score(true, 7), 21);
        assert_eq!(win_score(false, 8), -20);
        assert!(win_score(true, 9) > win_score(true, 11));
        assert!(win_score(false, 9) < win_score(false, 11));
    }

    #[test]
    pub fn takes_immediate_win() -> Result<()> {
        // red holds rows 0 to 2 of column 4
        let board = BitBoard::from_moves("414142")?;
        for config in [SearchConfig::minimax(4), SearchConfig::alpha_beta(4)] {
            let mut engine = SearchEngine::new(config);
            let outcome = engine.best_move(&board, config.params(board.num_moves()));
            assert_eq!(outcome.best_move, Some(4));
            assert_eq!(outcome.score, win_score(true, board.num_moves() + 1));
            assert!(outcome.stats.immediate_win);
            assert_eq!(outcome.stats.nodes, 0);
        }
        Ok(())
    }

    #[test]
    pub fn blocks_horizontal_threat() -> Result<()> {
        // red threatens to complete the bottom row on column 4
        let board = BitBoard::from_moves("11223")?;
        for config in [SearchConfig::minimax(3), SearchConfig::alpha_beta(3)] {
            let mut engine = SearchEngine::new(config);
            let outcome = engine.best_move(&board, config.params(board.num_moves()));
            assert_eq!(outcome.best_move, Some(4));
            assert!(outcome.score >= DRAW_SCORE);
            assert!(!outcome.stats.immediate_win);
        }
        Ok(())
    }

    #[test]
    pub fn minimizing_framing_mirrors_scores() -> Result<()> {
        let board = BitBoard::from_moves("11223")?;
        let config = SearchConfig::alpha_beta(3);
        let mut engine = SearchEngine::new(config);

        let maximizing = engine.best_move(&board, config.params(board.num_moves()));
        let minimizing = engine.best_move(
            &board,
            SearchParams {
                maximizing: false,
                ..config.params(board.num_moves())
            },
        );
        assert_eq!(minimizing.best_move, maximizing.best_move);
        assert_eq!(minimizing.score, -maximizing.score);
        Ok(())
    }

    #[test]
    pub fn alpha_beta_agrees_with_minimax() {
        for board in quiet_positions(42, 12) {
            for &maximizing in [true, false].iter() {
                for depth in 0..=3 {
                    let params = SearchParams {
                        max_depth: depth,
                        maximizing,
                        move_number: board.num_moves(),
                        variety_of_play: false,
                    };
                    let plain = SearchEngine::new(SearchConfig::minimax(depth))
                        .best_move(&board, params);
                    let pruned = SearchEngine::new(SearchConfig::alpha_beta(depth))
                        .best_move(&board, params);

                    assert_eq!(plain.best_move, pruned.best_move, "position:\n{}", board);
                    assert_eq!(plain.score, pruned.score, "position:\n{}", board);
                    assert!(pruned.stats.nodes <= plain.stats.nodes);
                }
            }
        }
    }

    #[test]
    pub fn best_move_is_always_legal() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let length = rng.random_range(0..42);
            let board = random_position(&mut rng, length);
            for config in [SearchConfig::minimax(2), SearchConfig::alpha_beta(2)] {
                let outcome =
                    SearchEngine::new(config).best_move(&board, config.params(board.num_moves()));
                match outcome.best_move {
                    Some(column) => assert!(board.is_legal_move(column)),
                    None => assert!(board.has_no_legal_move()),
                }
                assert_eq!(outcome.best_move.is_none(), board.has_no_legal_move());
            }
        }
    }

    #[test]
    pub fn no_move_on_full_board() -> Result<()> {
        let board = BitBoard::from_moves(DRAWN_GAME)?;
        let config = SearchConfig::alpha_beta(4);
        let mut engine = SearchEngine::new(config);
        let outcome = engine.best_move(&board, config.params(42));
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.score, DRAW_SCORE);
        assert_eq!(engine.solve(&board, 42), None);
        assert_eq!(RandomSolver::with_seed(1).solve(&board, 42), None);
        Ok(())
    }

    #[test]
    pub fn search_is_deterministic_without_variety() -> Result<()> {
        let board = BitBoard::from_moves("4453")?;
        let config = SearchConfig::alpha_beta(5);
        let mut engine = SearchEngine::new(config);
        let first = engine.best_move(&board, config.params(board.num_moves()));
        for _ in 0..5 {
            assert_eq!(engine.best_move(&board, config.params(board.num_moves())), first);
        }
        assert_eq!(engine.node_count(), 6 * first.stats.nodes);
        Ok(())
    }

    #[test]
    pub fn variety_breaks_ties_randomly() {
        // at depth 0 every opening move scores a draw
        let board = BitBoard::new();
        let config = SearchConfig::minimax(0).with_variety_of_play(true);

        let mut chosen = Vec::new();
        for seed in 0..32 {
            let mut engine = SearchEngine::new(config).with_seed(seed);
            let outcome = engine.best_move(&board, config.params(0));
            assert_eq!(outcome.score, DRAW_SCORE);
            chosen.push(outcome.best_move);
        }
        assert!(chosen.iter().any(|&column| column != chosen[0]));

        let config = SearchConfig::minimax(0);
        let outcome = SearchEngine::new(config).best_move(&board, config.params(0));
        assert_eq!(outcome.best_move, Some(4));
    }

    #[test]
    pub fn variety_never_overrides_a_better_move() -> Result<()> {
        let board = BitBoard::from_moves("11223")?;
        let config = SearchConfig::alpha_beta(3).with_variety_of_play(true);
        for seed in 0..16 {
            let mut engine = SearchEngine::new(config).with_seed(seed);
            assert_eq!(engine.solve(&board, board.num_moves()), Some(4));
        }
        Ok(())
    }

    #[test]
    pub fn node_limit_cuts_search_short() {
        let board = BitBoard::new();
        let unlimited = SearchConfig::alpha_beta(6);
        let full = SearchEngine::new(unlimited).best_move(&board, unlimited.params(0));
        assert!(!full.stats.budget_exhausted);

        let limited = unlimited.with_node_limit(Some(100));
        let cut = SearchEngine::new(limited).best_move(&board, limited.params(0));
        assert!(cut.stats.budget_exhausted);
        assert!(cut.stats.nodes < full.stats.nodes);
        assert!(cut.best_move.is_some());
    }

    #[test]
    pub fn random_solver_plays_legal_moves() -> Result<()> {
        let board = BitBoard::from_moves("333333")?;
        let mut solver = RandomSolver::with_seed(3);
        for _ in 0..50 {
            let column = solver.solve(&board, board.num_moves());
            assert!(column.map_or(false, |column| board.is_legal_move(column)));
        }

        let mut first = RandomSolver::with_seed(9);
        let mut second = RandomSolver::with_seed(9);
        for _ in 0..10 {
            assert_eq!(first.solve(&board, 6), second.solve(&board, 6));
        }
        Ok(())
    }

    #[test]
    pub fn move_history() -> Result<()> {
        let mut history = MoveHistory::new();
        assert!(history.is_empty());
        for &column in [4, 4, 5, 3].iter() {
            history.add(column);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.to_string(), "4 4 5 3");
        assert_eq!(history.to_move_string(), "4453");
        assert_eq!(history.replay()?, BitBoard::from_moves("4453")?);

        assert_eq!(history.remove_last(), Some(3));
        assert_eq!(history.as_slice(), &[4, 4, 5]);
        history.clear();
        assert!(history.is_empty());
        Ok(())
    }

    #[test]
    pub fn game_record_matches_final_board() -> Result<()> {
        let mut red = SearchEngine::new(SearchConfig::alpha_beta(3));
        for seed in 0..5 {
            let mut yellow = RandomSolver::with_seed(seed);
            let game = play_game(&mut red, &mut yellow)?;

            assert_eq!(game.history.replay()?, game.board);
            assert_eq!(game.history.len(), game.board.num_moves());
            match game.outcome {
                Outcome::Win(player) => assert!(game.board.is_win(player)),
                Outcome::Draw => {
                    assert!(game.board.has_no_legal_move());
                    assert_eq!(game.board.winner(), None);
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn self_play_is_reproducible() -> Result<()> {
        let mut first = SearchEngine::new(SearchConfig::alpha_beta(3));
        let mut second = SearchEngine::new(SearchConfig::minimax(3));
        let a = self_play(&mut first)?;
        let b = self_play(&mut second)?;
        assert_eq!(a.history, b.history);
        assert_eq!(a.outcome, b.outcome);
        Ok(())
    }

    struct Resigning;

    impl Solver for Resigning {
        fn name(&self) -> &str {
            "Resigning"
        }

        fn solve(&mut self, _board: &BitBoard, _move_number: usize) -> Option<usize> {
            None
        }
    }

    struct Stubborn;

    impl Solver for Stubborn {
        fn name(&self) -> &str {
            "Stubborn"
        }

        fn solve(&mut self, _board: &BitBoard, _move_number: usize) -> Option<usize> {
            Some(1)
        }
    }

    #[test]
    pub fn solver_contract_violations_are_errors() {
        let mut random = RandomSolver::with_seed(5);
        match play_game(&mut Resigning, &mut random) {
            Err(TournamentError::NoMove { legal_moves, .. }) => assert_eq!(legal_moves, WIDTH),
            other => panic!("unexpected result {:?}", other.map(|game| game.outcome)),
        }

        // stubborn keeps playing column 1 until it overflows or someone wins
        let mut stubborn_yellow = Stubborn;
        match play_game(&mut Stubborn, &mut stubborn_yellow) {
            Err(TournamentError::IllegalMove { source, .. }) => {
                assert_eq!(source, BoardError::ColumnFull { column: 1 })
            }
            other => panic!("unexpected result {:?}", other.map(|game| game.outcome)),
        }
    }

    #[test]
    pub fn match_statistics_add_up() -> Result<()> {
        let mut red = SearchEngine::new(SearchConfig::alpha_beta(3));
        let mut yellow = RandomSolver::with_seed(21);
        let stats = play_match(&mut red, &mut yellow, 6, false)?;

        assert_eq!(stats.games, 6);
        assert_eq!(stats.red_wins + stats.yellow_wins + stats.draws, 6);
        assert!(stats.red_wins > stats.yellow_wins);
        assert!(stats.total_moves >= 6 * 7);
        let total = stats.percentage(stats.red_wins)
            + stats.percentage(stats.yellow_wins)
            + stats.percentage(stats.draws);
        assert!((total - 100.0).abs() < 1e-9);
        assert!(stats.to_string().contains("Number of games: 6"));
        Ok(())
    }

    #[test]
    pub fn parallel_match_uses_independent_solvers() -> Result<()> {
        let stats = play_match_parallel(
            |game| RandomSolver::with_seed(game as u64),
            |game| RandomSolver::with_seed(1000 + game as u64),
            16,
            false,
        )?;
        assert_eq!(stats.games, 16);
        assert_eq!(stats.red_wins + stats.yellow_wins + stats.draws, 16);

        let again = play_match_parallel(
            |game| RandomSolver::with_seed(game as u64),
            |game| RandomSolver::with_seed(1000 + game as u64),
            16,
            false,
        )?;
        assert_eq!(again.red_wins, stats.red_wins);
        assert_eq!(again.total_moves, stats.total_moves);
        Ok(())
    }

    #[test]
    pub fn self_play_match_counts_games() -> Result<()> {
        let mut solver = RandomSolver::with_seed(8);
        let stats = self_play_match(&mut solver, 4, false)?;
        assert_eq!(stats.games, 4);
        assert_eq!(stats.red_wins + stats.yellow_wins + stats.draws, 4);
        Ok(())
    }
}
