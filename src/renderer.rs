//! # Tide Curve ASCII Rendering
//!
//! Renders a reconstructed tide curve to the terminal with the threshold line
//! and the boatable stretches highlighted. Meant for a quick look at a few
//! days; longer ranges are thinned to fit the terminal width.

use crate::curve::CurveSample;
use crate::scanner::ScanParams;

/// Chart height in text rows
const ROWS: usize = 16;

/// Space for Y-axis labels
const Y_AXIS_WIDTH: usize = 6;

/// Widest chart body before samples are thinned
const MAX_COLUMNS: usize = 192;

const CURVE: char = '•';
const BOATABLE: char = '█';
const THRESHOLD: char = '-';

fn is_boatable(sample: &CurveSample, params: &ScanParams) -> bool {
    sample.height >= params.threshold && params.daylight.contains(sample.at.time())
}

/// Keep every n-th sample so the chart fits in `MAX_COLUMNS`.
fn thin(samples: &[CurveSample]) -> Vec<CurveSample> {
    let stride = samples.len().div_ceil(MAX_COLUMNS).max(1);
    samples.iter().step_by(stride).copied().collect()
}

/// Render the curve as text. Returns an empty string for no samples.
pub fn render_ascii(samples: &[CurveSample], params: &ScanParams) -> String {
    let samples = thin(samples);
    if samples.is_empty() {
        return String::new();
    }

    let (min_height, max_height) = samples
        .iter()
        .map(|s| s.height)
        .chain(std::iter::once(params.threshold))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), h| {
            (min.min(h), max.max(h))
        });
    let range = max_height - min_height;

    let height_to_row = |height: f64| {
        if range <= f64::EPSILON {
            return ROWS / 2;
        }
        let normalized = (height - min_height) / range;
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let width = samples.len() + Y_AXIS_WIDTH;
    let mut grid = vec![vec![' '; width]; ROWS];

    // Y-axis labels every half meter (or whole meter for large ranges)
    let step = if range > 4.0 { 1.0 } else { 0.5 };
    let mut label_height = (min_height / step).ceil() * step;
    while label_height <= max_height {
        let row = height_to_row(label_height);
        let label = format!("{:>4.1}", label_height);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 2).enumerate() {
            grid[row][i] = ch;
        }
        label_height += step;
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    let threshold_row = height_to_row(params.threshold);
    for cell in grid[threshold_row].iter_mut().skip(Y_AXIS_WIDTH) {
        *cell = THRESHOLD;
    }

    for (column, sample) in samples.iter().enumerate() {
        let row = height_to_row(sample.height);
        grid[row][column + Y_AXIS_WIDTH] = if is_boatable(sample, params) {
            BOATABLE
        } else {
            CURVE
        };
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    // Day markers below the chart
    let mut markers = vec![' '; width];
    let mut labels = vec![' '; width];
    let mut previous_date = None;
    for (column, sample) in samples.iter().enumerate() {
        let date = sample.at.date();
        if previous_date != Some(date) {
            let x = column + Y_AXIS_WIDTH;
            markers[x] = '|';
            for (i, ch) in date.format("%d/%m").to_string().chars().enumerate() {
                if let Some(cell) = labels.get_mut(x + i) {
                    *cell = ch;
                }
            }
            previous_date = Some(date);
        }
    }
    out.push_str(markers.into_iter().collect::<String>().trim_end());
    out.push('\n');
    out.push_str(labels.into_iter().collect::<String>().trim_end());
    out.push('\n');

    out
}

/// Render tide curve to ASCII terminal.
pub fn draw_ascii(samples: &[CurveSample], params: &ScanParams, offline: bool) {
    if offline {
        println!("⚠ OFFLINE (approximate tides)\n");
    }
    print!("{}", render_ascii(samples, params));
    println!(
        "{} boatable (>= {:.1} m, {}-{})",
        BOATABLE,
        params.threshold,
        params.daylight.start.format("%H:%M"),
        params.daylight.end.format("%H:%M")
    );
}
