//! Moon phase (Schaefer 1985, low precision)
//!
//! Only the phase is needed here: it sets the spring–neap envelope of the
//! offline tide model. Accuracy is about ±1 day, which is far below the error
//! of the model it feeds.
//! Reference: Sky & Telescope, March 1985, "MOONFX.BAS".

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::f64::consts::TAU;

/// Mean synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Days from the algorithm's calendar origin to the 1900-01-00 12 UT new moon
const EPOCH_OFFSET_DAYS: f64 = 694_039.09;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonPhase {
    /// Days since new moon, in `[0, SYNODIC_MONTH_DAYS)`
    pub age_days: f64,
}

impl MoonPhase {
    /// Phase angle in radians; 0 at new moon, π at full moon.
    pub fn angle(&self) -> f64 {
        self.age_days / SYNODIC_MONTH_DAYS * TAU
    }

    /// Spring–neap factor: +1 at new and full moon (springs), −1 at the
    /// quarters (neaps).
    pub fn spring_neap(&self) -> f64 {
        (2.0 * self.angle()).cos()
    }
}

/// Moon phase for a proleptic-Gregorian date; `day` may be fractional.
pub fn moon_phase(year: i32, month: u32, day: f64) -> MoonPhase {
    // Jan/Feb count as months 13/14 of the previous year, then shift so
    // March = 4; this keeps leap days at the end of the year
    let (mut y, mut m) = (year, month as i32);
    if m < 3 {
        y -= 1;
        m += 12;
    }
    m += 1;

    let days = (365.25 * y as f64).floor() + (30.6 * m as f64).floor() + day - EPOCH_OFFSET_DAYS;

    let cycles = days / SYNODIC_MONTH_DAYS;
    let fraction = cycles - cycles.floor();

    MoonPhase {
        age_days: fraction * SYNODIC_MONTH_DAYS,
    }
}

/// Moon phase at a wall-clock instant.
pub fn moon_phase_at(at: NaiveDateTime) -> MoonPhase {
    let day_fraction =
        (at.hour() as f64 + at.minute() as f64 / 60.0 + at.second() as f64 / 3600.0) / 24.0;
    moon_phase(at.year(), at.month(), at.day() as f64 + day_fraction)
}
