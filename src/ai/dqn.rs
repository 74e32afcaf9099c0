use burn::backend::ndarray::NdArrayDevice;
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::ai::agent::{Experience, TrainingInfo};
use crate::ai::backend::{default_device, InferBackend, TrainBackend};
use crate::ai::network::{QNetwork, QNetworkConfig};
use crate::ai::state_encoding::{encode_state, encode_states_batch};
use crate::error::{ConfigError, TrainingError};
use crate::game::{Action, Game, StepResult, ACTION_COUNT};
use crate::training::replay_buffer::ReplayBuffer;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub target_sync_episodes: usize,
    pub max_epochs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
            batch_size: 320,
            replay_capacity: 10_000,
            target_sync_episodes: 10,
            max_epochs: 10_000,
            seed: None,
        }
    }
}

/// Check the hot-swappable hyperparameters.
pub fn validate_hyperparameters(
    learning_rate: f64,
    batch_size: usize,
    max_epochs: usize,
) -> Result<(), ConfigError> {
    if !(learning_rate > 0.0 && learning_rate.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "learning_rate must be > 0, got {learning_rate}"
        )));
    }
    if batch_size == 0 {
        return Err(ConfigError::Validation("batch_size must be > 0".into()));
    }
    if max_epochs == 0 {
        return Err(ConfigError::Validation("max_epochs must be > 0".into()));
    }
    Ok(())
}

type QOptimizer = OptimizerAdaptor<Adam, QNetwork<TrainBackend>, TrainBackend>;

/// DQN agent with online + target networks, replay buffer, and Adam optimizer.
pub struct DqnAgent {
    q_network: QNetwork<TrainBackend>,
    target_network: QNetwork<InferBackend>,
    optimizer: QOptimizer,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    device: NdArrayDevice,
    epsilon: f32,
    episode: usize,
    total_episodes: usize,
    epoch: usize,
    current_score: u32,
    current_loss: Option<f32>,
    total_loss: f32,
    loss_rate: f32,
    updates: usize, // gradient steps taken, never reset
    rng: StdRng,
}

impl DqnAgent {
    /// Build an agent for boards flattened to `input_size` cells.
    pub fn new(config: DqnConfig, input_size: usize) -> Self {
        let device = default_device();
        let net_config = QNetworkConfig::new(input_size);
        let q_network: QNetwork<TrainBackend> = net_config.init(&device);
        let target_network = q_network.valid();

        let (rng, replay_buffer) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                ReplayBuffer::with_seed(config.replay_capacity, seed.wrapping_add(1)),
            ),
            None => (
                StdRng::from_os_rng(),
                ReplayBuffer::new(config.replay_capacity),
            ),
        };

        DqnAgent {
            q_network,
            target_network,
            optimizer: AdamConfig::new().init(),
            replay_buffer,
            epsilon: config.epsilon_start,
            config,
            device,
            episode: 0,
            total_episodes: 0,
            epoch: 0,
            current_score: 0,
            current_loss: None,
            total_loss: 0.0,
            loss_rate: 0.0,
            updates: 0,
            rng,
        }
    }

    /// Epsilon-greedy action: random with probability epsilon, otherwise the
    /// action with the highest online Q-value (lowest index on ties).
    pub fn act(&mut self, state: &[u8]) -> Result<Action, TrainingError> {
        if self.rng.random::<f32>() < self.epsilon {
            let idx = self.rng.random_range(0..ACTION_COUNT);
            return Ok(Action::ALL[idx]);
        }
        let q_values = self.q_values(state)?;
        Ok(Action::ALL[argmax(&q_values)])
    }

    /// Online network output for a single state.
    pub fn q_values(&self, state: &[u8]) -> Result<Vec<f32>, TrainingError> {
        let input = encode_state::<InferBackend>(state, &self.device);
        tensor_to_vec(self.q_network.valid().forward(input))
    }

    fn target_q_values(&self, state: &[u8]) -> Result<Vec<f32>, TrainingError> {
        let input = encode_state::<InferBackend>(state, &self.device);
        tensor_to_vec(self.target_network.forward(input))
    }

    pub fn remember(
        &mut self,
        state: Vec<u8>,
        action: Action,
        reward: f32,
        next_state: Vec<u8>,
        done: bool,
    ) {
        self.replay_buffer.push(Experience {
            state,
            action,
            reward,
            next_state,
            done,
        });
    }

    /// One gradient step on a uniformly sampled minibatch.
    ///
    /// Returns `Ok(None)` without touching anything while the buffer holds
    /// fewer than `batch_size` experiences.
    pub fn replay(&mut self) -> Result<Option<f32>, TrainingError> {
        let batch_size = self.config.batch_size;
        if self.replay_buffer.len() < batch_size {
            return Ok(None);
        }

        let (state_tensors, next_state_tensors, actions, rewards, dones) = {
            let batch = self.replay_buffer.sample(batch_size);
            let states: Vec<&[u8]> = batch.iter().map(|e| e.state.as_slice()).collect();
            let next_states: Vec<&[u8]> = batch.iter().map(|e| e.next_state.as_slice()).collect();
            (
                encode_states_batch::<TrainBackend, _>(&states, &self.device),
                encode_states_batch::<InferBackend, _>(&next_states, &self.device),
                batch.iter().map(|e| e.action.index()).collect::<Vec<_>>(),
                batch.iter().map(|e| e.reward).collect::<Vec<_>>(),
                batch.iter().map(|e| e.done).collect::<Vec<_>>(),
            )
        };

        // Forward pass on current states: [B, 4]
        let q_all = self.q_network.forward(state_tensors);

        // One-hot mask so only the taken action's output receives gradient.
        let mut action_mask_data = vec![0.0f32; batch_size * ACTION_COUNT];
        for (i, &a) in actions.iter().enumerate() {
            action_mask_data[i * ACTION_COUNT + a] = 1.0;
        }
        let action_mask = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(action_mask_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, ACTION_COUNT as i32]);

        // Q(s, a) = sum(q_all * mask, dim=1) -> [B, 1]
        let q_taken = (q_all * action_mask).sum_dim(1);

        // Bootstrapped targets from the target network (no grad)
        let next_q = tensor_to_vec(self.target_network.forward(next_state_tensors))?;
        let target_data: Vec<f32> = (0..batch_size)
            .map(|i| {
                if dones[i] {
                    rewards[i]
                } else {
                    let row = &next_q[i * ACTION_COUNT..(i + 1) * ACTION_COUNT];
                    let max_q = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    rewards[i] + self.config.gamma * max_q
                }
            })
            .collect();
        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(target_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, 1]);

        // MSE loss
        let diff = q_taken - targets;
        let loss = (diff.clone() * diff).mean();
        let loss_val = tensor_to_vec(loss.clone())?
            .first()
            .copied()
            .ok_or_else(|| TrainingError::TensorData("empty loss tensor".into()))?;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.updates += 1;
        self.current_loss = Some(loss_val);
        self.total_loss += loss_val;
        if self.epsilon > self.config.epsilon_min {
            self.epsilon *= self.config.epsilon_decay;
        }

        Ok(Some(loss_val))
    }

    /// Play one action in `game`, learn from it, and roll over the episode
    /// when it ends. Returns whether the game just terminated.
    pub fn train_step(&mut self, game: &mut Game) -> Result<bool, TrainingError> {
        let state = game.state_projection();
        let action = self.act(&state)?;
        let StepResult {
            state: next_state,
            reward,
            done,
        } = game.step(action);
        self.remember(state, action, reward, next_state, done);
        self.current_score = game.score();
        self.epoch += 1;
        self.replay()?;

        if done {
            self.episode += 1;
            self.total_episodes += 1;
            game.reset();
            if self.episode % self.config.target_sync_episodes == 0 {
                self.sync_target();
                debug!(episode = self.episode, "synchronized target network");
            }
        }

        self.loss_rate = if self.episode > 0 {
            self.total_loss / self.episode as f32
        } else {
            0.0
        };

        Ok(done)
    }

    /// Copy online parameters into the target network.
    pub fn sync_target(&mut self) {
        self.target_network = self.q_network.valid();
    }

    /// Hot-swap learning rate, batch size and epoch ceiling.
    ///
    /// The optimizer state is rebuilt; exploration, replay memory and
    /// counters are kept.
    pub fn set_hyperparameters(
        &mut self,
        learning_rate: f64,
        batch_size: usize,
        max_epochs: usize,
    ) -> Result<(), ConfigError> {
        validate_hyperparameters(learning_rate, batch_size, max_epochs)?;
        if batch_size > self.config.replay_capacity {
            return Err(ConfigError::Validation(format!(
                "batch_size ({batch_size}) cannot exceed replay_capacity ({})",
                self.config.replay_capacity
            )));
        }

        self.config.learning_rate = learning_rate;
        self.config.batch_size = batch_size;
        self.config.max_epochs = max_epochs;
        self.optimizer = AdamConfig::new().init();
        info!(learning_rate, batch_size, max_epochs, "hyperparameters updated");
        Ok(())
    }

    /// Zero counters and forget replay memory. Learned parameters and
    /// epsilon survive.
    pub fn reset(&mut self) {
        self.episode = 0;
        self.epoch = 0;
        self.current_score = 0;
        self.current_loss = None;
        self.total_loss = 0.0;
        self.loss_rate = 0.0;
        self.replay_buffer.clear();
    }

    pub fn training_info(&self) -> TrainingInfo {
        TrainingInfo {
            episode: self.episode,
            total_episodes: self.total_episodes,
            score: self.current_score,
            loss: self.current_loss,
            epoch: self.epoch,
            max_epochs: self.config.max_epochs,
            learning_rate: self.config.learning_rate,
            loss_rate: self.loss_rate,
            epsilon: self.epsilon,
        }
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy play).
    pub fn set_epsilon(&mut self, eps: f32) {
        self.epsilon = eps;
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Number of gradient steps taken over the agent's lifetime.
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

fn tensor_to_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> Result<Vec<f32>, TrainingError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TrainingError::TensorData(format!("{e:?}")))
}

/// Index of the largest value; the first one wins on ties.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
