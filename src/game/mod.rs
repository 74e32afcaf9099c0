//! Core Tetris simulation: board, tetromino catalog, actions and the session
//! state machine (spawn, move, lock, line clear, scoring).

mod action;
mod board;
mod piece;
mod state;

pub use action::{Action, ParseActionError, ACTION_COUNT};
pub use board::{Board, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use piece::{Piece, PieceKind, Shape};
pub use state::{
    line_clear_score, Game, GameSnapshot, MoveOutcome, PieceSnapshot, StepResult,
    GAME_OVER_PENALTY,
};
