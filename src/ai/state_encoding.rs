use burn::prelude::*;
use burn::tensor::TensorData;

/// Encode one state projection as a `[1, len]` tensor.
///
/// Cells are fed as raw ids (0 empty, 1..=7 piece type) in row-major order,
/// exactly as `Game::state_projection` lays them out.
pub fn encode_state<B: Backend>(state: &[u8], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = state.iter().map(|&c| c as f32).collect();
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device)
        .reshape([1, state.len() as i32])
}

/// Encode several projections of equal length as a `[batch, len]` tensor.
pub fn encode_states_batch<B: Backend, S: AsRef<[u8]>>(
    states: &[S],
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch_size = states.len();
    let len = states.first().map_or(0, |s| s.as_ref().len());
    let mut flat = Vec::with_capacity(batch_size * len);
    for state in states {
        debug_assert_eq!(state.as_ref().len(), len, "ragged state batch");
        flat.extend(state.as_ref().iter().map(|&c| c as f32));
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([batch_size as i32, len as i32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend::{default_device, InferBackend};
    use crate::game::{Game, Piece, PieceKind};

    #[test]
    fn test_encode_state_shape_and_order() {
        let mut game = Game::with_seed(10, 20, 1);
        game.set_active_piece(Piece::new(PieceKind::T, 0, 0));
        let state = game.state_projection();

        let device = default_device();
        let tensor = encode_state::<InferBackend>(&state, &device);
        assert_eq!(tensor.shape().dims, [1, 200]);

        let data: Vec<f32> = tensor.into_data().to_vec().unwrap();
        // Row-major: T's top row is cells 0..3, its stem is cell 11.
        assert_eq!(&data[0..4], &[3.0, 3.0, 3.0, 0.0]);
        assert_eq!(data[11], 3.0);
        assert_eq!(data[10], 0.0);
    }

    #[test]
    fn test_encode_batch() {
        let a = vec![0u8; 24];
        let mut b = vec![0u8; 24];
        b[23] = 7;
        let device = default_device();
        let batch = encode_states_batch::<InferBackend, _>(&[a, b], &device);
        assert_eq!(batch.shape().dims, [2, 24]);

        let data: Vec<f32> = batch.into_data().to_vec().unwrap();
        assert_eq!(data[47], 7.0);
        assert_eq!(data.iter().sum::<f32>(), 7.0);
    }
}
