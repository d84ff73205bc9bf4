//! # Window Summaries
//!
//! Pure reducers over a finished [`DayWindows`] map. Nothing here takes part
//! in the scan itself; callers run these afterwards for reporting.

use crate::{DayWindows, Interval, TidePoint};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Totals for one date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Sum of window durations
    pub total: Duration,
    pub earliest_start: NaiveDateTime,
    pub latest_end: NaiveDateTime,
    pub window_count: usize,
}

impl DaySummary {
    pub fn total_minutes(&self) -> i64 {
        self.total.num_minutes()
    }
}

/// Totals across every date of a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub days: Vec<DaySummary>,
    pub total: Duration,
    /// Mean over the dates that have at least one window
    pub average_per_day: Duration,
    /// Date with the largest total; the earliest wins a tie
    pub best_day: Option<DaySummary>,
}

/// Height statistics over the raw extrema.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtremaStats {
    pub count: usize,
    pub max_height: f64,
    pub min_height: f64,
}

/// Summarize the windows of a single date. `None` if there are none.
pub fn summarize_day(date: NaiveDate, windows: &[Interval]) -> Option<DaySummary> {
    let earliest_start = windows.iter().map(|w| w.start).min()?;
    let latest_end = windows.iter().map(|w| w.end).max()?;
    let total = windows
        .iter()
        .fold(Duration::zero(), |acc, w| acc + w.duration());

    Some(DaySummary {
        date,
        total,
        earliest_start,
        latest_end,
        window_count: windows.len(),
    })
}

/// Summarize a whole scan.
///
/// # Example
/// ```
/// use tide_windows_lib::{summary::summarize, DayWindows};
///
/// let summary = summarize(&DayWindows::new());
/// assert!(summary.days.is_empty());
/// assert!(summary.best_day.is_none());
/// ```
pub fn summarize(windows: &DayWindows) -> Summary {
    let days: Vec<DaySummary> = windows
        .iter()
        .filter_map(|(date, intervals)| summarize_day(*date, intervals))
        .collect();

    let total = days.iter().fold(Duration::zero(), |acc, d| acc + d.total);
    let average_per_day = if days.is_empty() {
        Duration::zero()
    } else {
        total / days.len() as i32
    };

    let mut best_day: Option<DaySummary> = None;
    let mut best_total = Duration::zero();
    for day in &days {
        if day.total > best_total {
            best_total = day.total;
            best_day = Some(*day);
        }
    }

    Summary {
        days,
        total,
        average_per_day,
        best_day,
    }
}

/// Count and height range of the extrema. `None` for an empty slice.
pub fn extrema_stats(points: &[TidePoint]) -> Option<ExtremaStats> {
    if points.is_empty() {
        return None;
    }

    let (min_height, max_height) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p.height), max.max(p.height))
        });

    Some(ExtremaStats {
        count: points.len(),
        max_height,
        min_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn window(d: u32, from: (u32, u32), to: (u32, u32)) -> Interval {
        Interval {
            date: day(d),
            start: day(d).and_hms_opt(from.0, from.1, 0).unwrap(),
            end: day(d).and_hms_opt(to.0, to.1, 0).unwrap(),
        }
    }

    fn sample_windows() -> DayWindows {
        let mut windows = DayWindows::new();
        windows.insert(
            day(1),
            vec![window(1, (7, 0), (8, 30)), window(1, (15, 0), (17, 30))],
        );
        windows.insert(day(2), vec![window(2, (8, 0), (12, 0))]);
        windows.insert(day(3), vec![window(3, (9, 0), (10, 0))]);
        windows
    }

    #[test]
    fn test_summarize_day() {
        let windows = sample_windows();
        let summary = summarize_day(day(1), &windows[&day(1)]).unwrap();

        assert_eq!(summary.total_minutes(), 90 + 150);
        assert_eq!(summary.earliest_start, day(1).and_hms_opt(7, 0, 0).unwrap());
        assert_eq!(summary.latest_end, day(1).and_hms_opt(17, 30, 0).unwrap());
        assert_eq!(summary.window_count, 2);

        assert!(summarize_day(day(4), &[]).is_none());
    }

    #[test]
    fn test_summarize_totals_and_average() {
        let summary = summarize(&sample_windows());

        assert_eq!(summary.days.len(), 3);
        assert_eq!(summary.total, Duration::minutes(240 + 240 + 60));
        assert_eq!(summary.average_per_day, Duration::minutes(180));
    }

    #[test]
    fn test_best_day_tie_goes_to_earliest() {
        let summary = summarize(&sample_windows());
        // Days 1 and 2 both total four hours
        assert_eq!(summary.best_day.map(|d| d.date), Some(day(1)));
    }

    #[test]
    fn test_best_day_requires_positive_total() {
        let mut windows = DayWindows::new();
        windows.insert(day(1), vec![window(1, (17, 30), (17, 30))]);

        let summary = summarize(&windows);
        assert_eq!(summary.days.len(), 1);
        assert!(summary.best_day.is_none());
    }

    #[test]
    fn test_extrema_stats() {
        let t = day(1).and_hms_opt(0, 0, 0).unwrap();
        let points = [
            TidePoint::new(t, 0.4, TideKind::Low),
            TidePoint::new(t + Duration::hours(6), 2.3, TideKind::High),
            TidePoint::new(t + Duration::hours(12), 0.2, TideKind::Low),
        ];

        let stats = extrema_stats(&points).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max_height, 2.3);
        assert_eq!(stats.min_height, 0.2);
        assert!(extrema_stats(&[]).is_none());
    }
}
