mod agent;
pub mod backend;
pub mod dqn;
pub mod network;
pub mod state_encoding;

pub use agent::{Experience, TrainingInfo};
pub use dqn::{validate_hyperparameters, DqnAgent, DqnConfig};
pub use network::{QNetwork, QNetworkConfig};
