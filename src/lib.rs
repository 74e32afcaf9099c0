//! # Tetris DQN
//!
//! A Tetris simulation with a Deep Q-Network agent that learns to play it.
//! Training runs on a background thread and streams game and training
//! snapshots to any number of subscribers.
//!
//! ## Modules
//!
//! - [`game`] — Board, tetromino catalog, actions and the session state machine
//! - [`ai`] — Q-network, state encoding and the DQN agent (via Burn)
//! - [`training`] — Training controller and loop, replay buffer, metrics, wire messages
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
