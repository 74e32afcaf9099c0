//! Burn backend aliases. Training runs on the autodiff-wrapped NdArray (CPU)
//! backend; the target network and greedy inference use the plain one.

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend without gradient tracking, used by the target network.
pub type InferBackend = NdArray<f32>;

/// Autodiff backend the online network is trained on.
pub type TrainBackend = Autodiff<InferBackend>;

pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
