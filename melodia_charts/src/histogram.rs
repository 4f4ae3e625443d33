// Pitch-occurrence bar chart.
//
// Only pitches occurring strictly more than `threshold` times get a bar,
// which keeps the axis labels readable on large corpora. Bars are ordered
// by pitch height and coloured randomly from a seeded `TrainRng`, so the
// same corpus and seed always give the same picture. A legend maps each
// colour back to its pitch label.

use crate::error::Result;
use melodia_corpus::PitchHistogram;
use melodia_corpus::symbol::pitch_key;
use melodia_prng::TrainRng;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Occurrence threshold of the standalone diagnostic chart.
pub const DIAGNOSTIC_THRESHOLD: u64 = 150;

/// Occurrence threshold used for the training corpus chart.
pub const TRAINING_THRESHOLD: u64 = 20;

/// Bars that survive the threshold, lowest pitch first.
pub fn visible_bars(histogram: &PitchHistogram, threshold: u64) -> Vec<(String, u64)> {
    let mut bars: Vec<(String, u64)> = histogram
        .above(threshold)
        .into_iter()
        .map(|(symbol, count)| (symbol.to_string(), count))
        .collect();
    bars.sort_by_key(|(name, _)| (pitch_key(name).map_or(u16::MAX, u16::from), name.clone()));
    bars
}

/// Draw the chart to an SVG file. Returns the number of bars drawn.
pub fn render_pitch_histogram(
    histogram: &PitchHistogram,
    threshold: u64,
    path: &Path,
    rng: &mut TrainRng,
) -> Result<usize> {
    let bars = visible_bars(histogram, threshold);
    let slots = bars.len().max(1);
    let y_max = bars.iter().map(|&(_, c)| c).max().unwrap_or(1);

    let root = SVGBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!("Pitch occurrences (> {threshold})");
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..slots).into_segmented(), 0u64..(y_max + y_max / 10 + 1))?;

    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => bars.get(*i).map(|(name, _)| name.clone()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&label)
        .x_desc("pitch")
        .y_desc("occurrences")
        .draw()?;

    for (i, (name, count)) in bars.iter().enumerate() {
        let colour = RGBColor(rng.next_u8(), rng.next_u8(), rng.next_u8());
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), *count),
                ],
                colour.filled(),
            )))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], colour.filled()));
    }

    if !bars.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 10))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    info!(bars = bars.len(), threshold, path = %path.display(), "pitch histogram written");
    Ok(bars.len())
}
