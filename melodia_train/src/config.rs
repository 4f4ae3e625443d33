// Training configuration.
//
// Every path and hyperparameter of a training run lives in `TrainingConfig`.
// Defaults reproduce the classic setup (window 100, 200 epochs, batch 64,
// RMSProp at 0.001, no validation split, keep every checkpoint). A JSON file
// may override any subset of fields; missing fields keep their defaults.
// CLI flags in main.rs override the file.

use crate::error::{Result, TrainError};
use crate::model::ModelConfig;
use melodia_charts::TRAINING_THRESHOLD;
use melodia_corpus::DEFAULT_SEQUENCE_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which improving checkpoints stay on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Never delete. Disk use grows with every improving epoch.
    KeepAll,
    /// Keep the N lowest-loss checkpoints.
    KeepBestN(usize),
    /// Keep the N most recent checkpoints.
    KeepLastN(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub midi_dir: PathBuf,
    pub pattern: String,
    pub corpus_path: PathBuf,
    pub vocabulary_path: PathBuf,
    pub model_config_path: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub loss_plot_path: PathBuf,
    pub loss_history_path: PathBuf,
    pub histogram_plot_path: PathBuf,
    /// Pitches need more than this many occurrences to get a histogram bar.
    pub histogram_threshold: u64,
    pub sequence_length: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Trailing fraction of training pairs held out for validation loss.
    pub validation_split: f64,
    pub retention: RetentionPolicy,
    pub seed: u64,
    pub lstm_units: usize,
    pub dense_units: usize,
    pub dropout: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            midi_dir: PathBuf::from("midi_songs"),
            pattern: "*.mid".to_string(),
            corpus_path: PathBuf::from("data/notes"),
            vocabulary_path: PathBuf::from("data/vocabulary.json"),
            model_config_path: PathBuf::from("data/model_config.json"),
            checkpoint_dir: PathBuf::from("."),
            loss_plot_path: PathBuf::from("loss.svg"),
            loss_history_path: PathBuf::from("data/loss_history.json"),
            histogram_plot_path: PathBuf::from("data/pitch_occurrences.svg"),
            histogram_threshold: TRAINING_THRESHOLD,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            epochs: 200,
            batch_size: 64,
            learning_rate: 0.001,
            validation_split: 0.0,
            retention: RetentionPolicy::KeepAll,
            seed: 0,
            lstm_units: 512,
            dense_units: 256,
            dropout: 0.3,
        }
    }
}

impl TrainingConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| TrainError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| TrainError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let problem = if self.epochs == 0 {
            Some("epochs must be at least 1".to_string())
        } else if self.batch_size == 0 {
            Some("batch_size must be at least 1".to_string())
        } else if self.sequence_length == 0 {
            Some("sequence_length must be at least 1".to_string())
        } else if !(self.learning_rate > 0.0) {
            Some(format!("learning_rate must be positive, got {}", self.learning_rate))
        } else if !(0.0..1.0).contains(&self.validation_split) {
            Some(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            ))
        } else if !(0.0..1.0).contains(&self.dropout) {
            Some(format!("dropout must be in [0, 1), got {}", self.dropout))
        } else if matches!(
            self.retention,
            RetentionPolicy::KeepBestN(0) | RetentionPolicy::KeepLastN(0)
        ) {
            Some("retention count must be at least 1".to_string())
        } else {
            None
        };
        match problem {
            Some(p) => Err(TrainError::InvalidConfig(p)),
            None => Ok(()),
        }
    }

    pub fn model_config(&self, vocab_size: usize) -> ModelConfig {
        ModelConfig::new(vocab_size)
            .with_lstm_units(self.lstm_units)
            .with_dense_units(self.dense_units)
            .with_dropout(self.dropout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sequence_length, 100);
        assert_eq!(config.epochs, 200);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.retention, RetentionPolicy::KeepAll);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"epochs": 5, "retention": {"keep_best_n": 3}}"#).unwrap();
        assert_eq!(config.epochs, 5);
        assert_eq!(config.retention, RetentionPolicy::KeepBestN(3));
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.corpus_path, PathBuf::from("data/notes"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad = [
            TrainingConfig { epochs: 0, ..Default::default() },
            TrainingConfig { batch_size: 0, ..Default::default() },
            TrainingConfig { validation_split: 1.0, ..Default::default() },
            TrainingConfig { learning_rate: f64::NAN, ..Default::default() },
            TrainingConfig { retention: RetentionPolicy::KeepLastN(0), ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(TrainError::InvalidConfig(_))));
        }
    }

    #[test]
    fn model_config_carries_sizes() {
        let config = TrainingConfig {
            lstm_units: 16,
            dense_units: 8,
            ..Default::default()
        };
        let model = config.model_config(42);
        assert_eq!(model.vocab_size, 42);
        assert_eq!(model.lstm_units, 16);
        assert_eq!(model.dense_units, 8);
    }
}
