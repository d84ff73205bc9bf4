//! # Boatable Window Scanner
//!
//! Walks every adjacent pair of tide extrema in time order, samples the
//! reconstructed curve at a fixed tick across the pair, and records the
//! intervals where the height stays at or above the threshold during daylight.
//!
//! ## State Machine
//!
//! The scan carries exactly two pieces of state between ticks, held in
//! [`ScanState`]: the start of the currently open window (if any) and the date
//! of the previous tick. Each tick is processed by [`ScanState::step`] in three
//! tiers, and the order matters:
//!
//! 1. **Day-boundary flush**: a tick on a new date closes any open window at
//!    the daylight end of the window's *own* date, filed under that date.
//! 2. **Daylight gate**: outside `[daylight.start, daylight.end]` the curve is
//!    not evaluated and an open window is closed at the daylight end.
//! 3. **Threshold**: inside daylight the window opens on the first tick at or
//!    above the threshold and closes on the first tick below it.
//!
//! Whatever is still open when the data runs out is closed at the daylight
//! end of its start date.
//!
//! ## Resolution
//!
//! Ticks start at each pair's first extremum and advance by `params.tick`
//! (15 minutes by default) up to and including the second extremum, so every
//! window boundary is either an extremum time plus a whole number of ticks or
//! the daylight end. The shared extremum between two pairs is visited twice.

use crate::curve::height_at;
use crate::{DayWindows, Interval, TidePoint};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

/// Minimum boatable height in meters used when nothing else is configured
pub const DEFAULT_THRESHOLD: f64 = 1.6;

/// Sampling resolution of the scan in minutes
pub const DEFAULT_TICK_MINUTES: i64 = 15;

/// Local wall-clock hours during which a window may be open.
///
/// Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Daylight {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for Daylight {
    fn default() -> Self {
        Daylight {
            start: NaiveTime::from_hms_opt(6, 0, 0).expect("06:00 is a valid time"),
            end: NaiveTime::from_hms_opt(17, 30, 0).expect("17:30 is a valid time"),
        }
    }
}

impl Daylight {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    /// The instant daylight ends on `date`.
    pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.end)
    }
}

/// Parameters of a single scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanParams {
    /// Minimum height in meters, inclusive
    pub threshold: f64,
    pub daylight: Daylight,
    /// Sampling step; must be positive
    pub tick: Duration,
}

impl Default for ScanParams {
    fn default() -> Self {
        ScanParams {
            threshold: DEFAULT_THRESHOLD,
            daylight: Daylight::default(),
            tick: Duration::minutes(DEFAULT_TICK_MINUTES),
        }
    }
}

impl ScanParams {
    pub fn with_threshold(threshold: f64) -> Self {
        ScanParams {
            threshold,
            ..Self::default()
        }
    }
}

/// What a tick (or the final flush) produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A window was closed
    Window(Interval),
    /// A window was closed at a daylight end that precedes its own start and
    /// was therefore not recorded
    Dropped(NaiveDateTime),
}

/// Scanner state carried from one tick to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Start of the currently open window
    pub open_start: Option<NaiveDateTime>,
    /// Date of the last processed tick
    pub previous_date: Option<NaiveDate>,
}

impl ScanState {
    /// Process one tick.
    ///
    /// `height` is only evaluated for ticks inside daylight. At most one
    /// outcome is produced per tick: a day-boundary flush leaves nothing open,
    /// so the later tiers can at most open a new window.
    pub fn step<F>(
        self,
        tick: NaiveDateTime,
        height: F,
        params: &ScanParams,
    ) -> (Self, Option<Outcome>)
    where
        F: FnOnce() -> f64,
    {
        let date = tick.date();
        let mut open_start = self.open_start;
        let mut outcome = None;

        if let (Some(previous), Some(start)) = (self.previous_date, open_start) {
            if date != previous {
                let own_date = start.date();
                outcome = Some(Outcome::Window(Interval {
                    date: own_date,
                    start,
                    end: params.daylight.end_on(own_date),
                }));
                open_start = None;
            }
        }

        if params.daylight.contains(tick.time()) {
            let h = height();
            match open_start {
                None if h >= params.threshold => open_start = Some(tick),
                Some(start) if h < params.threshold => {
                    outcome = Some(Outcome::Window(Interval {
                        date,
                        start,
                        end: tick,
                    }));
                    open_start = None;
                }
                _ => {}
            }
        } else if let Some(start) = open_start.take() {
            outcome = Some(clamp_to_daylight(date, start, params));
        }

        let next = ScanState {
            open_start,
            previous_date: Some(date),
        };
        (next, outcome)
    }

    /// Close whatever is still open once the data runs out.
    pub fn finish(self, params: &ScanParams) -> Option<Outcome> {
        let start = self.open_start?;
        let date = self.previous_date.unwrap_or_else(|| start.date());
        let end = params.daylight.end_on(start.date());
        if start <= end {
            Some(Outcome::Window(Interval { date, start, end }))
        } else {
            Some(Outcome::Dropped(start))
        }
    }
}

fn clamp_to_daylight(date: NaiveDate, start: NaiveDateTime, params: &ScanParams) -> Outcome {
    let end = params.daylight.end_on(date);
    if start <= end {
        Outcome::Window(Interval { date, start, end })
    } else {
        Outcome::Dropped(start)
    }
}

/// Find every boatable window in `points`.
///
/// `points` need not be sorted; fewer than two points (or a non-positive tick)
/// give an empty result. Duplicate timestamps are not supported.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_windows_lib::scanner::{scan, ScanParams};
/// use tide_windows_lib::{TideKind, TidePoint};
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let points = vec![
///     TidePoint::new(day.and_hms_opt(7, 0, 0).unwrap(), 2.2, TideKind::High),
///     TidePoint::new(day.and_hms_opt(13, 0, 0).unwrap(), 0.3, TideKind::Low),
/// ];
///
/// let windows = scan(&points, &ScanParams::with_threshold(1.6));
/// let first = windows[&day][0];
/// assert_eq!(first.start, day.and_hms_opt(7, 0, 0).unwrap());
/// ```
pub fn scan(points: &[TidePoint], params: &ScanParams) -> DayWindows {
    let mut windows = DayWindows::new();
    if points.len() < 2 || params.tick <= Duration::zero() {
        return windows;
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let mut state = ScanState::default();
    for pair in sorted.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let mut tick = prev.timestamp;
        while tick <= next.timestamp {
            let (advanced, outcome) = state.step(tick, || height_at(tick, prev, next), params);
            state = advanced;
            if let Some(outcome) = outcome {
                record(&mut windows, outcome);
            }
            tick += params.tick;
        }
    }

    if let Some(outcome) = state.finish(params) {
        record(&mut windows, outcome);
    }

    debug!(
        points = sorted.len(),
        days = windows.len(),
        threshold = params.threshold,
        "scan complete"
    );
    windows
}

fn record(windows: &mut DayWindows, outcome: Outcome) {
    match outcome {
        Outcome::Window(interval) => windows.entry(interval.date).or_default().push(interval),
        Outcome::Dropped(start) => {
            warn!(%start, "dropping window that opened after daylight ended");
        }
    }
}
