use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Action, Board, Piece, PieceKind, Shape};

/// Reward subtracted on the step that ends the game.
pub const GAME_OVER_PENALTY: f32 = 100.0;

/// Points for clearing `lines` rows in a single lock.
pub fn line_clear_score(lines: u32) -> u32 {
    lines * lines * 100
}

/// What a single `move_piece` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The piece moved or rotated.
    Moved,
    /// The move was rejected; the piece is unchanged.
    Blocked,
    /// A rejected `Down` locked the piece and a new one spawned.
    Locked { lines_cleared: u32 },
    /// The lock ended the game.
    ToppedOut,
}

/// Result of one `step`: the next state projection, reward and terminal flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub state: Vec<u8>,
    pub reward: f32,
    pub done: bool,
}

/// Active piece as sent to observers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PieceSnapshot {
    pub shape: Vec<Vec<u8>>,
    pub x: i32,
    pub y: i32,
}

/// Read-only view of a session for observers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameSnapshot {
    pub board: Vec<Vec<u8>>,
    pub current_piece: PieceSnapshot,
    pub score: u32,
    pub game_over: bool,
}

/// One Tetris session: locked board, the falling piece, score and terminal flag.
///
/// A session is terminal once a newly spawned piece collides at its spawn
/// position, or a lock would place a cell above row 0. Terminal sessions
/// ignore moves until `reset`.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    piece: Piece,
    score: u32,
    previous_score: u32,
    game_over: bool,
    steps: usize,
    rng: StdRng,
}

impl Game {
    /// New session on an empty `width x height` board with OS-seeded spawns.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_board(Board::new(width, height), StdRng::from_os_rng())
    }

    /// New session whose piece sequence is fully determined by `seed`.
    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        Self::from_board(Board::new(width, height), StdRng::seed_from_u64(seed))
    }

    /// Session starting from a prepared board (e.g. garbage rows).
    pub fn with_board(board: Board, seed: u64) -> Self {
        Self::from_board(board, StdRng::seed_from_u64(seed))
    }

    fn from_board(board: Board, mut rng: StdRng) -> Self {
        let piece = spawn(&board, &mut rng);
        let game_over = !board.fits(&piece.shape, piece.x, piece.y);
        Game {
            board,
            piece,
            score: 0,
            previous_score: 0,
            game_over,
            steps: 0,
            rng,
        }
    }

    /// Clear the board, zero the score and spawn a fresh piece.
    pub fn reset(&mut self) {
        self.board.clear();
        self.piece = spawn(&self.board, &mut self.rng);
        self.score = 0;
        self.previous_score = 0;
        self.steps = 0;
        self.game_over = !self.board.fits(&self.piece.shape, self.piece.x, self.piece.y);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Steps played since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    /// Replace the falling piece. Marks the session terminal if it collides,
    /// mirroring what happens on a blocked spawn.
    pub fn set_active_piece(&mut self, piece: Piece) {
        self.game_over = !self.board.fits(&piece.shape, piece.x, piece.y);
        self.piece = piece;
    }

    /// See [`Board::fits`].
    pub fn is_valid_position(&self, shape: &Shape, x: i32, y: i32) -> bool {
        self.board.fits(shape, x, y)
    }

    /// Try to translate or rotate the falling piece by one unit.
    ///
    /// Rejected moves leave the piece untouched, except `Down`, which locks
    /// the piece in place and spawns the next one.
    pub fn move_piece(&mut self, action: Action) -> MoveOutcome {
        if self.game_over {
            return MoveOutcome::Blocked;
        }

        let Some((dx, dy)) = action.delta() else {
            let rotated = self.piece.shape.rotated_clockwise();
            if self.board.fits(&rotated, self.piece.x, self.piece.y) {
                self.piece.shape = rotated;
                return MoveOutcome::Moved;
            }
            return MoveOutcome::Blocked;
        };

        let (x, y) = (self.piece.x + dx, self.piece.y + dy);
        if self.board.fits(&self.piece.shape, x, y) {
            self.piece.x = x;
            self.piece.y = y;
            MoveOutcome::Moved
        } else if action == Action::Down {
            self.lock_piece()
        } else {
            MoveOutcome::Blocked
        }
    }

    fn lock_piece(&mut self) -> MoveOutcome {
        if self.piece.cells().any(|(row, _)| row < 0) {
            self.game_over = true;
            return MoveOutcome::ToppedOut;
        }

        self.board.stamp(&self.piece.shape, self.piece.x, self.piece.y);
        let lines_cleared = self.board.clear_full_rows();
        self.score += line_clear_score(lines_cleared);

        self.piece = spawn(&self.board, &mut self.rng);
        if !self.board.fits(&self.piece.shape, self.piece.x, self.piece.y) {
            self.game_over = true;
            return MoveOutcome::ToppedOut;
        }
        MoveOutcome::Locked { lines_cleared }
    }

    /// Apply `action`, then gravity. Reward is the score gained, minus
    /// [`GAME_OVER_PENALTY`] when this step ended the game. A terminal
    /// session returns zero reward and `done = true` without changing.
    pub fn step(&mut self, action: Action) -> StepResult {
        if self.game_over {
            return StepResult {
                state: self.state_projection(),
                reward: 0.0,
                done: true,
            };
        }

        self.steps += 1;
        self.move_piece(action);
        self.move_piece(Action::Down);

        let mut reward = (self.score - self.previous_score) as f32;
        self.previous_score = self.score;
        if self.game_over {
            reward -= GAME_OVER_PENALTY;
        }

        StepResult {
            state: self.state_projection(),
            reward,
            done: self.game_over,
        }
    }

    /// Board with the falling piece overlaid, flattened row-major.
    pub fn state_projection(&self) -> Vec<u8> {
        let mut state = self.board.cells().to_vec();
        let (w, h) = (self.width() as i32, self.height() as i32);
        for (r, c, v) in self.piece.shape.occupied() {
            let gy = self.piece.y + r as i32;
            let gx = self.piece.x + c as i32;
            if (0..h).contains(&gy) && (0..w).contains(&gx) {
                state[(gy * w + gx) as usize] = v;
            }
        }
        state
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.to_rows(),
            current_piece: PieceSnapshot {
                shape: self.piece.shape.to_rows(),
                x: self.piece.x,
                y: self.piece.y,
            },
            score: self.score,
            game_over: self.game_over,
        }
    }
}

/// Uniform kind, uniform column that keeps the mask on the board, row 0.
fn spawn(board: &Board, rng: &mut StdRng) -> Piece {
    let kind = PieceKind::ALL[rng.random_range(0..PieceKind::ALL.len())];
    let max_x = board.width().saturating_sub(kind.shape().cols());
    let x = rng.random_range(0..=max_x) as i32;
    Piece::new(kind, x, 0)
}
