//! # Tide Window Core Library
//!
//! This library answers one question for a boat ramp: on each calendar day,
//! when is the tide at or above a usable depth while it is still light out?
//!
//! Tide forecasts only publish the extrema (each high and low water with its
//! time and height), so the answer is built in two stages:
//!
//! 1. **Curve reconstruction** ([`curve`]): a raised-cosine ease between each
//!    pair of adjacent extrema gives a continuous height curve with zero slope
//!    at every high and low, which is how real tides behave.
//! 2. **Window scanning** ([`scanner`]): the curve is sampled every 15 minutes
//!    and a small state machine records the intervals that stay above the
//!    threshold inside the daylight window, grouped by date.
//!
//! ## Data Flow
//! 1. **Online**: Fetch WillyWeather extrema → cache → scan → export
//! 2. **Offline**: Generate approximate extrema from the lunar fallback model → mark as offline → scan
//! 3. **Presentation**: [`summary`] reducers, CSV rows ([`export`]) and an ASCII chart ([`renderer`])
//!
//! All timestamps are naive local wall-clock values. No timezone or DST
//! handling takes place anywhere in the pipeline.
//!
//! ## Core Types
//! - [`TidePoint`]: one observed high or low water
//! - [`Interval`]: one boatable window on a given date
//! - [`DayWindows`]: the scanner output, date → intervals
//! - [`TideSeries`]: a set of extrema plus an offline indicator

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Module declarations
pub mod config;
pub mod curve;
pub mod export;
pub mod fallback;
pub mod lunar;
pub mod renderer;
pub mod scanner;
pub mod summary;
pub mod tide_data;

/// Whether an extremum is a high or a low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

/// An observed tide extremum.
///
/// Heights are in meters above the local chart datum. Two points in the same
/// collection never share a timestamp; the scanner relies on that but does not
/// check it.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_windows_lib::{TideKind, TidePoint};
///
/// let at = NaiveDate::from_ymd_opt(2025, 3, 1)
///     .unwrap()
///     .and_hms_opt(6, 0, 0)
///     .unwrap();
/// let low = TidePoint::new(at, 0.5, TideKind::Low);
/// assert_eq!(low.kind, TideKind::Low);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidePoint {
    /// Local wall-clock time of the extremum
    pub timestamp: NaiveDateTime,
    /// Height in meters
    pub height: f64,
    /// High or low water
    pub kind: TideKind,
}

impl TidePoint {
    pub fn new(timestamp: NaiveDateTime, height: f64, kind: TideKind) -> Self {
        TidePoint {
            timestamp,
            height,
            kind,
        }
    }
}

/// A contiguous boatable window.
///
/// `date` is the grouping key the scanner filed the window under. It equals
/// `start.date()` for every window the scanner produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Boatable windows grouped by date.
///
/// Dates iterate in calendar order; the windows of each date are kept in the
/// order the scanner discovered them, which is chronological.
pub type DayWindows = BTreeMap<NaiveDate, Vec<Interval>>;

/// A collection of tide extrema with its provenance.
///
/// # Offline Behavior
/// When `offline = true` the points come from the mathematical fallback model
/// rather than a real forecast, and every presentation layer flags that.
///
/// # Example
/// ```
/// use tide_windows_lib::TideSeries;
///
/// let series = TideSeries { points: vec![], offline: true };
/// assert!(series.points.is_empty());
/// assert!(series.offline);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TideSeries {
    /// Extrema in the order the source produced them
    pub points: Vec<TidePoint>,
    /// True if using the fallback model instead of forecast data
    pub offline: bool,
}
