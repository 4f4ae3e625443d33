// Training loop.
//
// Each epoch shuffles the pair order with the run's `TrainRng`, steps
// RMSProp over mini-batches, and averages the batch losses weighted by
// batch size. When a validation set is present its loss is measured with
// the inner (non-autodiff) model, which also disables dropout.
//
// After every epoch the loss history is appended, saved to JSON, and the
// loss chart redrawn, so an interrupted run still leaves a current chart.
// A checkpoint is saved only when the epoch loss strictly improves, and
// the retention policy may then delete older checkpoints.

use crate::batch::make_batch;
use crate::checkpoint::{Checkpoint, CheckpointTracker, checkpoint_path};
use crate::config::TrainingConfig;
use crate::error::{Result, TrainError};
use crate::model::{MusicLstm, categorical_cross_entropy};
use crate::pipeline::ensure_parent;
use burn::{
    module::{AutodiffModule, Module},
    optim::{GradientsParams, Optimizer, RmsPropConfig},
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::{ElementConversion, backend::{AutodiffBackend, Backend}},
};
use melodia_charts::{EpochLoss, LossHistory, render_loss_curve};
use melodia_corpus::TrainingSet;
use melodia_prng::TrainRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct TrainingReport<B: AutodiffBackend> {
    pub model: MusicLstm<B>,
    pub history: LossHistory,
    pub best_loss: Option<f32>,
    /// Checkpoints left on disk after retention, oldest first.
    pub checkpoints: Vec<PathBuf>,
}

pub fn train<B: AutodiffBackend>(
    mut model: MusicLstm<B>,
    train_set: &TrainingSet,
    validation: Option<&TrainingSet>,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingReport<B>> {
    config.validate()?;
    std::fs::create_dir_all(&config.checkpoint_dir).map_err(|source| TrainError::Io {
        path: config.checkpoint_dir.clone(),
        source,
    })?;
    ensure_parent(&config.loss_history_path)?;
    ensure_parent(&config.loss_plot_path)?;

    // rho 0.9, no momentum, epsilon 1e-7.
    let mut optim = RmsPropConfig::new()
        .with_alpha(0.9)
        .with_momentum(0.0)
        .with_epsilon(1e-7)
        .init();
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let mut rng = TrainRng::new(config.seed);
    let mut order: Vec<usize> = (0..train_set.len()).collect();
    let mut tracker = CheckpointTracker::new(config.retention);
    let mut history = LossHistory::default();

    info!(
        pairs = train_set.len(),
        validation_pairs = validation.map_or(0, TrainingSet::len),
        epochs = config.epochs,
        batch_size = config.batch_size,
        "training started"
    );

    for epoch in 1..=config.epochs {
        let started = Instant::now();
        rng.shuffle(&mut order);

        let mut weighted = 0.0f64;
        for chunk in order.chunks(config.batch_size) {
            let batch = make_batch::<B>(train_set, chunk, device);
            let loss = categorical_cross_entropy(model.forward(batch.inputs), batch.targets);
            let value: f32 = loss.clone().into_scalar().elem();
            weighted += f64::from(value) * chunk.len() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);
        }
        let loss = (weighted / train_set.len() as f64) as f32;

        let val_loss = validation
            .map(|set| evaluate::<B::InnerBackend>(&model.valid(), set, config.batch_size, device));

        info!(
            epoch,
            loss,
            val_loss,
            secs = started.elapsed().as_secs_f32(),
            "epoch finished"
        );

        if tracker.improves(loss) {
            let path = checkpoint_path(&config.checkpoint_dir, epoch, loss);
            model
                .clone()
                .save_file(path.clone(), &recorder)
                .map_err(|e| TrainError::Checkpoint {
                    path: path.clone(),
                    message: format!("{e:?}"),
                })?;
            info!(path = %path.display(), "checkpoint saved");

            for stale in tracker.record(Checkpoint { epoch, loss, path }) {
                match std::fs::remove_file(&stale) {
                    Ok(()) => debug!(path = %stale.display(), "checkpoint removed"),
                    Err(e) => warn!(path = %stale.display(), error = %e, "could not remove checkpoint"),
                }
            }
        }

        history.push(EpochLoss {
            epoch,
            loss,
            val_loss,
        });
        history.save(&config.loss_history_path)?;
        render_loss_curve(&history, &config.loss_plot_path)?;
    }

    Ok(TrainingReport {
        model,
        best_loss: tracker.best_loss(),
        checkpoints: tracker.kept().iter().map(|c| c.path.clone()).collect(),
        history,
    })
}

/// Mean loss over every pair of `set`, in order, without gradients.
pub fn evaluate<B: Backend>(
    model: &MusicLstm<B>,
    set: &TrainingSet,
    batch_size: usize,
    device: &B::Device,
) -> f32 {
    let order: Vec<usize> = (0..set.len()).collect();
    let mut weighted = 0.0f64;
    for chunk in order.chunks(batch_size.max(1)) {
        let batch = make_batch::<B>(set, chunk, device);
        let loss: f32 = categorical_cross_entropy(model.forward(batch.inputs), batch.targets)
            .into_scalar()
            .elem();
        weighted += f64::from(loss) * chunk.len() as f64;
    }
    (weighted / set.len().max(1) as f64) as f32
}
