// Per-epoch loss history and its line chart.
//
// The trainer appends one `EpochLoss` per epoch and redraws the whole chart,
// overwriting the previous image. The validation series is only drawn when
// at least one epoch recorded a validation loss; with no validation split the
// chart has a single line rather than an empty second series.

use crate::error::{ChartError, Result};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochLoss {
    /// 1-based epoch number.
    pub epoch: usize,
    pub loss: f32,
    pub val_loss: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub epochs: Vec<EpochLoss>,
}

impl LossHistory {
    pub fn push(&mut self, entry: EpochLoss) {
        self.epochs.push(entry);
    }

    pub fn best_loss(&self) -> Option<f32> {
        self.epochs
            .iter()
            .map(|e| e.loss)
            .filter(|l| l.is_finite())
            .min_by(f32::total_cmp)
    }

    pub fn has_validation(&self) -> bool {
        self.epochs.iter().any(|e| e.val_loss.is_some())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Upper bound for the y axis: largest finite loss plus headroom.
    fn y_max(&self) -> f32 {
        let max = self
            .epochs
            .iter()
            .flat_map(|e| std::iter::once(e.loss).chain(e.val_loss))
            .filter(|l| l.is_finite())
            .fold(0.0f32, f32::max);
        if max > 0.0 { max * 1.1 } else { 1.0 }
    }
}

/// Draw the loss history to an SVG file, replacing any previous drawing.
pub fn render_loss_curve(history: &LossHistory, path: &Path) -> Result<()> {
    let last_epoch = history.epochs.last().map_or(1, |e| e.epoch.max(1));
    let root = SVGBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Training loss", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f32..(last_epoch as f32 + 1.0), 0f32..history.y_max())?;

    chart
        .configure_mesh()
        .x_desc("epoch")
        .y_desc("loss")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history
                .epochs
                .iter()
                .filter(|e| e.loss.is_finite())
                .map(|e| (e.epoch as f32, e.loss)),
            &BLUE,
        ))?
        .label("loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    if history.has_validation() {
        chart
            .draw_series(LineSeries::new(
                history
                    .epochs
                    .iter()
                    .filter_map(|e| Some((e.epoch as f32, e.val_loss?)))
                    .filter(|(_, l)| l.is_finite()),
                &RED,
            ))?
            .label("val_loss")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    debug!(epochs = history.epochs.len(), path = %path.display(), "loss curve written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(losses: &[(f32, Option<f32>)]) -> LossHistory {
        LossHistory {
            epochs: losses
                .iter()
                .enumerate()
                .map(|(i, &(loss, val_loss))| EpochLoss {
                    epoch: i + 1,
                    loss,
                    val_loss,
                })
                .collect(),
        }
    }

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("melodia_loss_{name}_{}.svg", std::process::id()))
    }

    #[test]
    fn best_loss_ignores_nan() {
        let h = history(&[(3.0, None), (f32::NAN, None), (2.5, None), (2.7, None)]);
        assert_eq!(h.best_loss(), Some(2.5));
        assert_eq!(LossHistory::default().best_loss(), None);
    }

    #[test]
    fn renders_without_validation_series() {
        let h = history(&[(4.2, None), (3.9, None), (3.1, None)]);
        assert!(!h.has_validation());
        let path = scratch("train_only");
        render_loss_curve(&h, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("val_loss"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn renders_validation_series_when_present() {
        let h = history(&[(4.2, Some(4.4)), (3.9, Some(4.0))]);
        let path = scratch("with_val");
        render_loss_curve(&h, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("val_loss"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_history_still_renders() {
        let path = scratch("empty");
        render_loss_curve(&LossHistory::default(), &path).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn history_json_round_trip() {
        let h = history(&[(1.5, None), (1.25, Some(1.75))]);
        let path = std::env::temp_dir().join(format!("melodia_history_{}.json", std::process::id()));
        h.save(&path).unwrap();
        assert_eq!(LossHistory::load(&path).unwrap(), h);
        std::fs::remove_file(&path).unwrap();
    }
}
