//! Training infrastructure: the background loop and its controller, replay
//! buffer, episode metrics, and the JSON messages exchanged with observers.

pub mod controller;
pub mod messages;
pub mod metrics;
pub mod replay_buffer;

pub use controller::{CancellationToken, TrainerConfig, TrainingController, TrainingSession};
pub use messages::{ControlMessage, ControlReply, StartOutcome, TrainingUpdate};
