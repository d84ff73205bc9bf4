//! # Fallback Tide Model
//!
//! This module provides a lunar-phase-aware stand-in for the forecast when no
//! network data (and no cache) is available. Instead of a continuous curve it
//! produces what the forecast would have produced: a list of alternating high
//! and low waters, which then flows through the normal curve and scanner.
//!
//! ## Model Characteristics
//!
//! ### Semidiurnal Pattern
//! - **Period**: 12.42 hours (principal lunar M2 constituent), so one extremum
//!   every 6 h 12 m 36 s
//! - **Phase**: tied to the wall clock with a fixed lunitidal offset, so
//!   repeated runs for the same dates give the same extrema
//! - **Mean level**: 1.25 m above chart datum
//!
//! ### Spring–Neap Envelope
//! The tidal range grows toward new and full moon and shrinks at the quarters.
//! The half-range is the M2 amplitude plus the S2 amplitude scaled by the
//! spring–neap factor from [`crate::lunar`].
//!
//! ### Accuracy Trade-offs
//! - ✅ **Correct period** and spring–neap cycle
//! - ❌ **Not synchronized to the station**: times can be off by hours
//! - ❌ **No diurnal inequality**: both daily highs have the same height
//!
//! The returned series is always marked offline so that every output flags it.

use crate::lunar::moon_phase_at;
use crate::{TideKind, TidePoint, TideSeries};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// M2 period in seconds (12.42 h)
const M2_PERIOD_SECS: i64 = 44_712;

/// High-water interval after the M2 reference phase, in seconds (≈ 3 h 35 m)
const LUNITIDAL_OFFSET_SECS: i64 = 12_924;

/// Mean water level above chart datum, meters
const MEAN_LEVEL_M: f64 = 1.25;

/// M2 amplitude, meters
const A_M2: f64 = 0.85;

/// S2 amplitude, meters
const A_S2: f64 = 0.20;

/// Generate approximate extrema covering `days` days from midnight of `start`.
///
/// The first extremum is the first high water at or after midnight.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_windows_lib::fallback::approximate;
///
/// let series = approximate(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 2);
/// assert!(series.offline);
/// assert!(series.points.len() >= 7);
/// ```
pub fn approximate(start: NaiveDate, days: u32) -> TideSeries {
    let from = start.and_time(chrono::NaiveTime::MIN);
    let until = from + Duration::days(days as i64);

    let mut points = Vec::new();
    let mut kind = TideKind::High;
    let mut at = first_high_at_or_after(from);
    while at <= until {
        points.push(TidePoint::new(at, height_of(at, kind), kind));
        kind = match kind {
            TideKind::High => TideKind::Low,
            TideKind::Low => TideKind::High,
        };
        at += Duration::seconds(M2_PERIOD_SECS / 2);
    }

    TideSeries {
        points,
        offline: true,
    }
}

fn first_high_at_or_after(from: NaiveDateTime) -> NaiveDateTime {
    let secs = from.and_utc().timestamp();
    let phase = (secs + LUNITIDAL_OFFSET_SECS).rem_euclid(M2_PERIOD_SECS);
    let until_high = (M2_PERIOD_SECS / 4 - phase).rem_euclid(M2_PERIOD_SECS);
    from + Duration::seconds(until_high)
}

fn height_of(at: NaiveDateTime, kind: TideKind) -> f64 {
    let half_range = A_M2 + A_S2 * moon_phase_at(at).spring_neap();
    match kind {
        TideKind::High => MEAN_LEVEL_M + half_range,
        TideKind::Low => MEAN_LEVEL_M - half_range,
    }
}
