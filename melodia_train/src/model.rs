// Next-symbol LSTM.
//
// Three stacked LSTM layers read a window of normalized symbol ids shaped
// [batch, sequence_length, 1]. The first two pass their whole output
// sequence on; the third contributes only its last time step. A dense
// layer and an output projection over the vocabulary follow. Dropout sits
// after each of the first two LSTMs and after the dense layer.
//
// `forward` returns raw logits. Softmax lives in
// `forward_probabilities`, and training uses `categorical_cross_entropy`,
// which applies log-softmax itself for numerical stability.

use burn::{
    config::Config,
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig},
    tensor::{
        Tensor,
        activation::{log_softmax, softmax},
        backend::Backend,
    },
};

#[derive(Config, Debug)]
pub struct ModelConfig {
    pub vocab_size: usize,

    #[config(default = 512)]
    pub lstm_units: usize,

    #[config(default = 256)]
    pub dense_units: usize,

    #[config(default = 0.3)]
    pub dropout: f64,
}

impl ModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MusicLstm<B> {
        let lstm = |d_input| LstmConfig::new(d_input, self.lstm_units, true).init(device);
        let dropout = || DropoutConfig::new(self.dropout).init();

        MusicLstm {
            lstm_1: lstm(1),
            dropout_1: dropout(),
            lstm_2: lstm(self.lstm_units),
            dropout_2: dropout(),
            lstm_3: lstm(self.lstm_units),
            dense: LinearConfig::new(self.lstm_units, self.dense_units).init(device),
            dropout_3: dropout(),
            output: LinearConfig::new(self.dense_units, self.vocab_size).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct MusicLstm<B: Backend> {
    lstm_1: Lstm<B>,
    dropout_1: Dropout,
    lstm_2: Lstm<B>,
    dropout_2: Dropout,
    lstm_3: Lstm<B>,
    dense: Linear<B>,
    dropout_3: Dropout,
    output: Linear<B>,
}

impl<B: Backend> MusicLstm<B> {
    /// [batch, seq, 1] -> logits [batch, vocab].
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let (x, _) = self.lstm_1.forward(inputs, None);
        let x = self.dropout_1.forward(x);
        let (x, _) = self.lstm_2.forward(x, None);
        let x = self.dropout_2.forward(x);
        let (x, _) = self.lstm_3.forward(x, None);

        let [batch, seq, hidden] = x.dims();
        let last = x
            .slice([0..batch, seq - 1..seq, 0..hidden])
            .reshape([batch, hidden]);

        let x = self.dense.forward(last);
        let x = self.dropout_3.forward(x);
        self.output.forward(x)
    }

    /// Softmax over the vocabulary, one row per window.
    pub fn forward_probabilities(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        softmax(self.forward(inputs), 1)
    }
}

/// Mean categorical cross-entropy of `logits` against one-hot `targets`.
pub fn categorical_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (targets * log_softmax(logits, 1))
        .sum_dim(1)
        .mean()
        .neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{ElementConversion, TensorData};

    type B = NdArray;

    fn tiny() -> ModelConfig {
        ModelConfig::new(5).with_lstm_units(6).with_dense_units(4)
    }

    #[test]
    fn output_is_one_row_per_window() {
        let device = Default::default();
        let model = tiny().init::<B>(&device);
        let inputs = Tensor::<B, 3>::zeros([3, 7, 1], &device);
        assert_eq!(model.forward(inputs).dims(), [3, 5]);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let device = Default::default();
        let model = tiny().init::<B>(&device);
        let inputs = Tensor::<B, 3>::ones([2, 4, 1], &device) * 0.5;
        let sums: Vec<f32> = model
            .forward_probabilities(inputs)
            .sum_dim(1)
            .into_data()
            .to_vec()
            .unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5, "row sums to {s}");
        }
    }

    #[test]
    fn cross_entropy_of_uniform_logits_is_log_vocab() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::zeros([2, 4], &device);
        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0], [2, 4]),
            &device,
        );
        let loss: f32 = categorical_cross_entropy(logits, targets)
            .into_scalar()
            .elem();
        assert!((loss - 4f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn confident_correct_logits_have_small_loss() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::from_data(
            TensorData::new(vec![10.0f32, -10.0, -10.0], [1, 3]),
            &device,
        );
        let targets =
            Tensor::<B, 2>::from_data(TensorData::new(vec![1.0f32, 0.0, 0.0], [1, 3]), &device);
        let loss: f32 = categorical_cross_entropy(logits, targets)
            .into_scalar()
            .elem();
        assert!(loss < 1e-3);
    }
}
