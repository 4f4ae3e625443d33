// Tensor batches from a `TrainingSet`.
//
// A batch is a list of pair indices. Inputs become a [n, seq, 1] float
// tensor of normalized ids, targets a [n, vocab] one-hot tensor.

use burn::tensor::{Tensor, TensorData, backend::Backend};
use melodia_corpus::TrainingSet;

#[derive(Clone, Debug)]
pub struct SequenceBatch<B: Backend> {
    pub inputs: Tensor<B, 3>,
    pub targets: Tensor<B, 2>,
}

pub fn make_batch<B: Backend>(
    set: &TrainingSet,
    indices: &[usize],
    device: &B::Device,
) -> SequenceBatch<B> {
    let n = indices.len();
    let inputs = TensorData::new(set.normalized_batch(indices), [n, set.sequence_length(), 1]);
    let targets = TensorData::new(set.one_hot_batch(indices), [n, set.vocab_size()]);
    SequenceBatch {
        inputs: Tensor::from_data(inputs, device),
        targets: Tensor::from_data(targets, device),
    }
}
