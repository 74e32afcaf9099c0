use crate::game::Action;

/// A single transition stored for replay.
#[derive(Debug, Clone)]
pub struct Experience {
    pub state: Vec<u8>,
    pub action: Action,
    pub reward: f32,
    pub next_state: Vec<u8>,
    pub done: bool,
}

/// Training progress as sent to observers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingInfo {
    pub episode: usize,
    pub total_episodes: usize,
    pub score: u32,
    pub loss: Option<f32>,
    pub epoch: usize,
    pub max_epochs: usize,
    pub learning_rate: f64,
    pub loss_rate: f32,
    pub epsilon: f32,
}
