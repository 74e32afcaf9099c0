use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::game::ACTION_COUNT;

/// Q-value network for Tetris.
///
/// ```text
/// Input:  [batch, width * height]   (raw cell ids 0..=7)
/// FC1:    input -> 128, ReLU
/// FC2:    128 -> 64, ReLU
/// Out:    64 -> 4  (Q-values for left, right, down, rotate)
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    /// Flattened board size, `width * height`.
    pub input_size: usize,
}

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_size, 128).init(device),
            fc2: LinearConfig::new(128, 64).init(device),
            out: LinearConfig::new(64, ACTION_COUNT).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: input [batch, input_size] -> output [batch, 4] Q-values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.out.forward(x)
    }
}
