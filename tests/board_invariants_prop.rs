//! Property tests for the Tetris simulation.
//!
//! Random seeds, board sizes and action sequences drive sessions through
//! spawns, locks, line clears and top-outs while these invariants are checked:
//! - the board keeps its dimensions and holds only piece ids 0..=7;
//! - a live session's falling piece never overlaps locked cells;
//! - no full row survives a step;
//! - score only grows within a session, in multiples of 100;
//! - reward equals the score delta, minus the penalty on the ending step;
//! - a blocked rotation leaves the piece untouched.

use proptest::prelude::*;
use tetris_dqn::game::{
    Action, Board, Game, MoveOutcome, GAME_OVER_PENALTY, line_clear_score,
};

fn action_strategy() -> impl Strategy<Value = Action> {
    (0usize..4).prop_map(|i| Action::ALL[i])
}

fn assert_board_shape(game: &Game) {
    let board = game.board();
    assert_eq!(board.to_rows().len(), game.height());
    assert_eq!(board.cells().len(), game.width() * game.height());
    assert!(board.cells().iter().all(|&c| c <= 7));
}

fn assert_no_full_rows(board: &Board) {
    for row in 0..board.height() {
        assert!(!board.is_row_full(row), "row {row} should have been cleared");
    }
}

proptest! {
    #[test]
    fn rollout_respects_core_invariants(
        seed in any::<u64>(),
        width in 4usize..12,
        height in 4usize..22,
        actions in prop::collection::vec(action_strategy(), 1..300),
    ) {
        let mut game = Game::with_seed(width, height, seed);
        prop_assume!(!game.is_game_over());

        for action in actions {
            let before = game.score();
            let result = game.step(action);

            assert_board_shape(&game);
            assert_no_full_rows(game.board());
            prop_assert_eq!(result.state.len(), width * height);
            prop_assert_eq!(result.done, game.is_game_over());
            prop_assert!(game.score() >= before);
            prop_assert_eq!(game.score() % 100, 0);

            let gained = (game.score() - before) as f32;
            let expected = if result.done { gained - GAME_OVER_PENALTY } else { gained };
            prop_assert_eq!(result.reward, expected);

            if result.done {
                break;
            }
            let piece = game.piece();
            prop_assert!(game.is_valid_position(&piece.shape, piece.x, piece.y));
        }
    }

    #[test]
    fn terminal_session_ignores_further_steps(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..20),
    ) {
        // Dropping straight down on a narrow board tops out quickly.
        let mut game = Game::with_seed(4, 6, seed);
        let mut guard = 0;
        while !game.is_game_over() && guard < 1_000 {
            game.step(Action::Down);
            guard += 1;
        }
        prop_assert!(game.is_game_over());

        let snapshot = game.snapshot();
        for action in actions {
            let result = game.step(action);
            prop_assert!(result.done);
            prop_assert_eq!(result.reward, 0.0);
            prop_assert_eq!(&game.snapshot(), &snapshot);
        }
    }

    #[test]
    fn blocked_rotation_changes_nothing(
        seed in any::<u64>(),
        moves in prop::collection::vec(action_strategy(), 0..60),
    ) {
        let mut game = Game::with_seed(10, 20, seed);
        for action in moves {
            if game.is_game_over() {
                break;
            }
            let before = game.piece().clone();
            match game.move_piece(Action::Rotate) {
                MoveOutcome::Blocked => prop_assert_eq!(game.piece(), &before),
                MoveOutcome::Moved => {
                    prop_assert_eq!(game.piece().x, before.x);
                    prop_assert_eq!(game.piece().y, before.y);
                    prop_assert_eq!(&game.piece().shape, &before.shape.rotated_clockwise());
                }
                other => prop_assert!(false, "rotation cannot lock: {:?}", other),
            }
            game.step(action);
        }
    }

    #[test]
    fn clearing_rows_preserves_height_and_order(
        rows in prop::collection::vec(prop::collection::vec(0u8..=7, 6), 1..16),
    ) {
        let height = rows.len();
        let mut board = Board::new(6, height);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                board.set(r, c, v);
            }
        }
        let full = rows.iter().filter(|row| row.iter().all(|&c| c != 0)).count();
        let survivors: Vec<Vec<u8>> = rows
            .iter()
            .filter(|row| row.iter().any(|&c| c == 0))
            .cloned()
            .collect();

        let cleared = board.clear_full_rows();
        prop_assert_eq!(cleared as usize, full);
        prop_assert_eq!(board.height(), height);

        let after = board.to_rows();
        prop_assert_eq!(after.len(), height);
        prop_assert!(after[..full].iter().all(|row| row.iter().all(|&c| c == 0)));
        prop_assert_eq!(&after[full..], &survivors[..]);
    }

    #[test]
    fn line_clear_score_is_quadratic(lines in 0u32..=4) {
        prop_assert_eq!(line_clear_score(lines), lines * lines * 100);
    }
}
