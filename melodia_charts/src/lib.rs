// Melodia charts.
//
// - loss_curve.rs: per-epoch loss history (JSON) and its line chart
// - histogram.rs: pitch-occurrence bar chart with an occurrence threshold
//
// Charts are written as SVG through plotters' SVG backend. The
// `pitch_histogram` binary wraps histogram.rs as a standalone diagnostic.

pub mod error;
pub mod histogram;
pub mod loss_curve;

pub use error::{ChartError, Result};
pub use histogram::{DIAGNOSTIC_THRESHOLD, TRAINING_THRESHOLD, render_pitch_histogram};
pub use loss_curve::{EpochLoss, LossHistory, render_loss_curve};
