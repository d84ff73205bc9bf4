//! # Tide Curve Reconstruction
//!
//! Forecast services publish only the extrema of the tide. This module turns
//! any two adjacent extrema into a continuous height curve.
//!
//! ## Interpolation Model
//!
//! Between a high and a low (either direction) the height follows a
//! raised-cosine ease:
//!
//! ```text
//! w      = (1 - cos(π·p)) / 2
//! height = prev + (next - prev) · w
//! ```
//!
//! where `p` is the elapsed fraction of the span between the two extrema.
//! The slope is zero at both ends, matching slack water at every high and
//! low, which linear interpolation gets badly wrong near the turn of the tide.
//!
//! Two extrema of the same kind (usually a forecast with a missing entry) use a
//! sine ease-in, `w = sin(π·p / 2)`. It reaches `next` with a non-zero slope.
//! This asymmetry is kept as-is; there is no ground truth to pick a better
//! curve for a transition that should not exist.
//!
//! The blend is written as `prev·(1 - w) + next·w` so that both endpoints
//! reproduce the observed heights exactly.

use crate::TidePoint;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// One point of a reconstructed curve, used for charting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub at: NaiveDateTime,
    pub height: f64,
}

/// Elapsed fraction of the `prev → next` span at `instant`.
///
/// The span must be non-zero. A zero span yields NaN (or infinity), which is
/// passed on rather than hidden.
pub fn proportion(instant: NaiveDateTime, prev: &TidePoint, next: &TidePoint) -> f64 {
    let span = (next.timestamp - prev.timestamp).num_milliseconds() as f64;
    let elapsed = (instant - prev.timestamp).num_milliseconds() as f64;
    elapsed / span
}

/// Interpolated tide height at `instant` between two adjacent extrema.
///
/// Requires `prev.timestamp <= instant <= next.timestamp` and
/// `prev.timestamp < next.timestamp`; neither is checked.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_windows_lib::{curve::height_at, TideKind, TidePoint};
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let low = TidePoint::new(day.and_hms_opt(6, 0, 0).unwrap(), 0.5, TideKind::Low);
/// let high = TidePoint::new(day.and_hms_opt(12, 0, 0).unwrap(), 2.0, TideKind::High);
///
/// let mid = height_at(day.and_hms_opt(9, 0, 0).unwrap(), &low, &high);
/// assert!((mid - 1.25).abs() < 1e-12);
/// ```
pub fn height_at(instant: NaiveDateTime, prev: &TidePoint, next: &TidePoint) -> f64 {
    let p = proportion(instant, prev, next);

    let weight = if prev.kind != next.kind {
        (1.0 - (PI * p).cos()) / 2.0
    } else {
        (FRAC_PI_2 * p).sin()
    };

    prev.height * (1.0 - weight) + next.height * weight
}

/// Reconstruct the curve from `from` to `to` (inclusive) every `step`.
///
/// For each instant the surrounding pair is the last extremum at or before it
/// and the first one strictly after it. Instants outside the span of the data
/// have no such pair and are skipped, so the result may start late or end
/// early. `points` need not be sorted.
pub fn sample_curve(
    points: &[TidePoint],
    from: NaiveDateTime,
    to: NaiveDateTime,
    step: Duration,
) -> Vec<CurveSample> {
    if step <= Duration::zero() {
        return Vec::new();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let mut samples = Vec::new();
    let mut at = from;
    while at <= to {
        let idx = sorted.partition_point(|p| p.timestamp <= at);
        if idx > 0 && idx < sorted.len() {
            let prev = &sorted[idx - 1];
            let next = &sorted[idx];
            samples.push(CurveSample {
                at,
                height: height_at(at, prev, next),
            });
        }
        at += step;
    }

    samples
}
